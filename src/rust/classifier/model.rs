use std::sync::Arc;
use ort::session::Session;
use tokenizers::Tokenizer;

use super::error::ClassifierError;
use super::inference::TextInference;
use super::{ClassifierInfo, ScoreResult};
use crate::scorer::EmotionModel;
use crate::ModelCharacteristics;

/// A thread-safe emotion classifier running a sequence-classification ONNX model.
///
/// # Thread Safety
///
/// This type is automatically `Send + Sync` because all of its fields are thread-safe:
/// - `String`, `Vec<String>` and `ModelCharacteristics` are `Send + Sync`
/// - `Tokenizer` and `Session` are wrapped in `Arc`
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use emotive::{EmotionClassifier, BuiltinModel};
///
/// let classifier = EmotionClassifier::builder()
///     .with_model(BuiltinModel::DistilBertEmotion)?
///     .build()?;
///
/// for score in classifier.classify("I am so happy today!")? {
///     println!("{}: {:.2}", score.label, score.score);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct EmotionClassifier {
    pub model_path: String,
    pub tokenizer_path: String,
    pub tokenizer: Arc<Tokenizer>,
    pub session: Arc<Session>,
    pub labels: Arc<Vec<String>>,
    pub model_characteristics: ModelCharacteristics,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<EmotionClassifier>();
    }
};

impl TextInference for EmotionClassifier {
    fn tokenizer(&self) -> Option<&Tokenizer> {
        Some(&self.tokenizer)
    }

    fn session(&self) -> Option<&Session> {
        Some(&self.session)
    }

    fn max_sequence_length(&self) -> Option<usize> {
        Some(self.model_characteristics.max_sequence_length)
    }
}

impl EmotionClassifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            model_path: self.model_path.clone(),
            tokenizer_path: self.tokenizer_path.clone(),
            num_labels: self.labels.len(),
            labels: self.labels.as_ref().clone(),
            max_sequence_length: self.model_characteristics.max_sequence_length,
        }
    }

    /// Number of tokens the model sees for `text` after truncation
    pub fn count_tokens(&self, text: &str) -> Result<usize, ClassifierError> {
        TextInference::count_tokens(self, text)
    }

    /// Scores `text` against every label of the model.
    ///
    /// # Returns
    /// One `ScoreResult` per label, in the model's label order. Scores are softmax
    /// probabilities and sum to approximately 1.0.
    ///
    /// # Errors
    /// - `ValidationError` if `text` is empty
    /// - `TokenizerError` / `ModelError` if tokenization or inference fails
    /// - `PredictionError` if the model returns a different number of logits than labels
    pub fn classify(&self, text: &str) -> Result<Vec<ScoreResult>, ClassifierError> {
        if text.is_empty() {
            return Err(ClassifierError::ValidationError("Input text cannot be empty".into()));
        }

        let probabilities = self.probabilities(text)?;
        if probabilities.len() != self.labels.len() {
            return Err(ClassifierError::PredictionError(format!(
                "Model produced {} scores for {} labels",
                probabilities.len(),
                self.labels.len()
            )));
        }

        Ok(self.labels.iter()
            .zip(probabilities)
            .map(|(label, score)| ScoreResult::new(label.clone(), score))
            .collect())
    }
}

impl EmotionModel for EmotionClassifier {
    fn classify(&self, text: &str) -> Result<Vec<ScoreResult>, ClassifierError> {
        EmotionClassifier::classify(self, text)
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }
}
