use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokenizers::{Tokenizer, TruncationParams};
use ort::session::Session;
use log::{info, error};

use super::error::ClassifierError;
use super::inference::TextInference;
use super::model::EmotionClassifier;
use crate::model_manager::read_labels;
use crate::{BuiltinModel, ModelCharacteristics, runtime::{RuntimeConfig, create_session_builder}, ModelManager};

/// Sequence length assumed for custom models that do not state one (BERT-family limit)
const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 512;

/// A builder for constructing an EmotionClassifier with a fluent interface.
#[derive(Default, Debug)]
pub struct ClassifierBuilder {
    model_path: Option<String>,
    tokenizer_path: Option<String>,
    tokenizer: Option<Tokenizer>,
    session: Option<Session>,
    labels: Option<Vec<String>>,
    model_characteristics: Option<ModelCharacteristics>,
    runtime_config: RuntimeConfig,
}

impl TextInference for ClassifierBuilder {
    fn tokenizer(&self) -> Option<&Tokenizer> {
        self.tokenizer.as_ref()
    }

    fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn max_sequence_length(&self) -> Option<usize> {
        self.model_characteristics.as_ref().map(|c| c.max_sequence_length)
    }
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder instance with default configuration
    ///
    /// # Example
    /// ```
    /// use emotive::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution.
    ///
    /// Must be called before the model is loaded to take effect.
    ///
    /// # Example
    /// ```
    /// use emotive::{ClassifierBuilder, RuntimeConfig};
    ///
    /// let builder = ClassifierBuilder::new()
    ///     .with_runtime_config(RuntimeConfig::with_intra_threads(2));
    /// ```
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Loads a built-in model from the default model cache.
    ///
    /// # Errors
    /// `BuildError` if the model is not downloaded, its files fail to load, or a model
    /// is already set. `ModelError` if the model does not have the expected structure.
    pub fn with_model(self, model: BuiltinModel) -> Result<Self, ClassifierError> {
        let manager = ModelManager::new_default()
            .map_err(|e| ClassifierError::BuildError(format!("Failed to create model manager: {}", e)))?;
        self.with_model_from(&manager, model)
    }

    /// Loads a built-in model from the cache managed by `manager`.
    ///
    /// Labels come from the model's `config.json` unless `with_labels` was called first.
    pub fn with_model_from(mut self, manager: &ModelManager, model: BuiltinModel) -> Result<Self, ClassifierError> {
        if self.model_path.is_some() || self.tokenizer_path.is_some() {
            return Err(ClassifierError::BuildError("Model and tokenizer paths already set".to_string()));
        }

        if !manager.is_model_downloaded(model) {
            return Err(ClassifierError::BuildError(format!(
                "Model '{:?}' is not downloaded. Please download it first using ModelManager::download_model()",
                model
            )));
        }

        let model_path = manager.get_model_path(model);
        let tokenizer_path = manager.get_tokenizer_path(model);
        let characteristics = model.characteristics();

        let tokenizer = Self::load_tokenizer(&tokenizer_path, characteristics.max_sequence_length)?;
        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(&model_path)?;
        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        if self.labels.is_none() {
            self.labels = Some(manager.load_labels(model)?);
        }

        self.model_characteristics = Some(characteristics);
        self.model_path = Some(model_path.to_string_lossy().to_string());
        self.tokenizer_path = Some(tokenizer_path.to_string_lossy().to_string());
        self.tokenizer = Some(tokenizer);
        self.session = Some(session);
        Ok(self)
    }

    /// Sets a custom model and tokenizer for the classifier
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX sequence-classification model
    /// * `tokenizer_path` - Path to the `tokenizer.json` file
    /// * `config_path` - Optional `config.json` to read `id2label` from
    /// * `max_sequence_length` - Optional truncation length, defaults to 512 tokens
    ///
    /// # Example
    /// ```
    /// use emotive::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new()
    ///     .with_custom_model(
    ///         "path/to/model.onnx",
    ///         "path/to/tokenizer.json",
    ///         Some("path/to/config.json"),
    ///         None,
    ///     );
    /// assert!(builder.is_err());
    /// ```
    pub fn with_custom_model(
        mut self,
        model_path: &str,
        tokenizer_path: &str,
        config_path: Option<&str>,
        max_sequence_length: Option<usize>,
    ) -> Result<Self, ClassifierError> {
        if model_path.is_empty() || tokenizer_path.is_empty() {
            return Err(ClassifierError::BuildError("Model and tokenizer paths cannot be empty".to_string()));
        }
        if self.model_path.is_some() || self.tokenizer_path.is_some() {
            return Err(ClassifierError::BuildError("Model and tokenizer paths already set".to_string()));
        }

        for path in [Some(model_path), Some(tokenizer_path), config_path].into_iter().flatten() {
            if !Path::new(path).exists() {
                return Err(ClassifierError::BuildError(format!("File not found: {}", path)));
            }
        }

        let max_sequence_length = max_sequence_length.unwrap_or(DEFAULT_MAX_SEQUENCE_LENGTH);
        let tokenizer = Self::load_tokenizer(Path::new(tokenizer_path), max_sequence_length)?;
        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(model_path)?;
        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        if self.labels.is_none() {
            if let Some(config_path) = config_path {
                self.labels = Some(read_labels(Path::new(config_path))?);
            }
        }

        self.tokenizer = Some(tokenizer);
        self.session = Some(session);

        // Label count is only known after a sample run
        self.model_characteristics = Some(ModelCharacteristics {
            max_sequence_length,
            num_labels: 0,
            model_size_mb: 0, // Not critical for functionality
        });
        let num_labels = self.probabilities("Test input to infer label count")?.len();
        info!("Inferred label count from model: {}", num_labels);
        if let Some(characteristics) = self.model_characteristics.as_mut() {
            characteristics.num_labels = num_labels;
        }

        self.model_path = Some(model_path.to_string());
        self.tokenizer_path = Some(tokenizer_path.to_string());
        Ok(self)
    }

    /// Overrides the label vocabulary, in logit order.
    ///
    /// # Errors
    /// `ValidationError` if the list is empty or contains empty or duplicate labels.
    pub fn with_labels(mut self, labels: Vec<impl Into<String>>) -> Result<Self, ClassifierError> {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        Self::validate_labels(&labels)?;
        self.labels = Some(labels);
        Ok(self)
    }

    fn validate_labels(labels: &[String]) -> Result<(), ClassifierError> {
        if labels.is_empty() {
            return Err(ClassifierError::ValidationError("At least one label is required".into()));
        }
        if let Some(pos) = labels.iter().position(|l| l.trim().is_empty()) {
            return Err(ClassifierError::ValidationError(format!("Label {} cannot be empty", pos + 1)));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = labels.iter().find(|l| !seen.insert(l.as_str())) {
            return Err(ClassifierError::ValidationError(format!("Duplicate label '{}'", duplicate)));
        }
        Ok(())
    }

    /// Builds and returns the final EmotionClassifier instance
    ///
    /// # Errors
    /// `BuildError` if no model is loaded or no labels are known, `ValidationError` for
    /// a bad label set, and `PredictionError` if the model's output width does not match
    /// the number of labels.
    pub fn build(mut self) -> Result<EmotionClassifier, ClassifierError> {
        if self.model_path.is_none() || self.tokenizer_path.is_none() {
            return Err(ClassifierError::BuildError("Model and tokenizer paths must be set".to_string()));
        }

        let labels = self.labels.take()
            .ok_or_else(|| ClassifierError::BuildError("No labels known for this model".to_string()))?;
        Self::validate_labels(&labels)?;

        let sample = self.probabilities("Test input to check the label count")?;
        if sample.len() != labels.len() {
            error!("Model produces {} logits but {} labels are configured", sample.len(), labels.len());
            return Err(ClassifierError::PredictionError(format!(
                "Model produces {} logits but {} labels are configured",
                sample.len(),
                labels.len()
            )));
        }

        let mut model_characteristics = self.model_characteristics.take()
            .ok_or_else(|| ClassifierError::BuildError("Model characteristics not set".to_string()))?;
        model_characteristics.num_labels = labels.len();

        let tokenizer = Arc::new(self.tokenizer.take()
            .ok_or_else(|| ClassifierError::BuildError("No tokenizer loaded".into()))?);
        let session = Arc::new(self.session.take()
            .ok_or_else(|| ClassifierError::BuildError("No ONNX model loaded".into()))?);
        let model_path = self.model_path.take()
            .ok_or_else(|| ClassifierError::BuildError("Model path not set".into()))?;
        let tokenizer_path = self.tokenizer_path.take()
            .ok_or_else(|| ClassifierError::BuildError("Tokenizer path not set".into()))?;

        info!("Emotion classifier ready with labels {:?}", labels);

        Ok(EmotionClassifier {
            model_path,
            tokenizer_path,
            tokenizer,
            session,
            labels: Arc::new(labels),
            model_characteristics,
        })
    }

    /// Loads a tokenizer that adds no padding and truncates to `max_length` tokens
    fn load_tokenizer(path: &Path, max_length: usize) -> Result<Tokenizer, ClassifierError> {
        let mut tokenizer = Tokenizer::from_file(path)
            .map_err(|e| {
                error!("Failed to load tokenizer: {}", e);
                ClassifierError::BuildError(format!("Failed to load tokenizer: {}", e))
            })?;

        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| ClassifierError::TokenizerError(format!("Failed to configure truncation: {}", e)))?;

        info!("Tokenizer loaded successfully");
        Ok(tokenizer)
    }

    /// Validates that the model has the expected input/output structure
    ///
    /// # Returns
    /// * `Result<(), ClassifierError>` - Ok if validation passes, or an error if:
    ///   - The model doesn't have the required input tensors
    ///   - The model doesn't have any output tensors
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        let inputs = &session.inputs;
        if inputs.len() < 2 {
            return Err(ClassifierError::ModelError(
                format!("Model must have at least 2 inputs (input_ids and attention_mask), found {}", inputs.len())
            ));
        }

        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 output for logits".to_string()
            ));
        }

        Ok(())
    }
}
