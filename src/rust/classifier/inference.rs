use tokenizers::Tokenizer;
use ort::session::Session;
use ndarray::Array2;
use ort::value::Tensor;
use std::collections::HashMap;

use super::error::ClassifierError;
use super::utils::softmax;

/// Runs a sequence-classification ONNX model over text.
///
/// The pipeline is:
/// 1. Tokenization of input text (special tokens added, truncated to the model limit)
/// 2. Running the ONNX model to produce one logit per label
/// 3. Softmax over the logits
///
/// The ONNX model is expected to:
/// - Accept `input_ids` and `attention_mask` (both i64, shape [batch_size, sequence_length])
/// - Output logits of shape [batch_size, num_labels]
pub(crate) trait TextInference {
    /// Returns the initialized tokenizer if available
    fn tokenizer(&self) -> Option<&Tokenizer>;

    /// Returns the initialized ONNX session if available
    fn session(&self) -> Option<&Session>;

    /// Returns the maximum sequence length the model can handle
    fn max_sequence_length(&self) -> Option<usize>;

    /// Counts the tokens the model will see for `text`, special tokens included.
    ///
    /// # Errors
    /// - `TokenizerError` if the tokenizer is not initialized
    /// - `TokenizerError` if the text cannot be encoded
    fn count_tokens(&self, text: &str) -> Result<usize, ClassifierError> {
        let tokenizer = self.tokenizer()
            .ok_or_else(|| ClassifierError::TokenizerError("Tokenizer not initialized".into()))?;

        tokenizer.encode(text, true)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))
            .map(|encoding| encoding.get_ids().len())
    }

    /// Converts text into token IDs and the matching attention mask.
    ///
    /// # Errors
    /// - `TokenizerError` if the tokenizer is not initialized or the text cannot be encoded
    /// - `ValidationError` if the encoding is longer than `max_sequence_length`,
    ///   which means the tokenizer was loaded without truncation
    fn encode(&self, text: &str) -> Result<(Vec<i64>, Vec<i64>), ClassifierError> {
        let tokenizer = self.tokenizer()
            .ok_or_else(|| ClassifierError::TokenizerError("Tokenizer not initialized".into()))?;
        let max_length = self.max_sequence_length()
            .ok_or_else(|| ClassifierError::TokenizerError("Max sequence length not set".into()))?;

        let encoding = tokenizer.encode(text, true)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))?;
        let token_ids = encoding.get_ids();

        if token_ids.len() > max_length {
            return Err(ClassifierError::ValidationError(
                format!(
                    "Input text too long: {} tokens (max: {})",
                    token_ids.len(), max_length
                )
            ));
        }

        let ids = token_ids.iter().map(|&id| i64::from(id)).collect();
        let mask = encoding.get_attention_mask().iter().map(|&m| i64::from(m)).collect();
        Ok((ids, mask))
    }

    /// Runs the model and returns the raw logits of the first batch row.
    ///
    /// # Errors
    /// - `ModelError` if the session is not initialized
    /// - `ModelError` if tensor creation, model execution or output extraction fails
    /// - `PredictionError` if the output is not shaped [1, num_labels]
    fn logits(&self, ids: Vec<i64>, mask: Vec<i64>) -> Result<Vec<f32>, ClassifierError> {
        let session = self.session()
            .ok_or_else(|| ClassifierError::ModelError("Session not initialized".into()))?;

        let len = ids.len();
        let input_array = Array2::from_shape_vec((1, len), ids)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create input array: {}", e)))?;
        let mask_array = Array2::from_shape_vec((1, len), mask)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create mask array: {}", e)))?;

        let mut input_tensors = HashMap::new();
        input_tensors.insert("input_ids", Tensor::from_array(input_array)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create input tensor: {}", e)))?);
        input_tensors.insert("attention_mask", Tensor::from_array(mask_array)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create mask tensor: {}", e)))?);

        let outputs = session.run(input_tensors)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::ModelError(format!("Failed to extract output tensor: {}", e)))?;

        let shape = output_tensor.shape();
        if shape.len() != 2 || shape[0] != 1 {
            return Err(ClassifierError::PredictionError(
                format!("Expected logits shaped [1, num_labels], got {:?}", shape)
            ));
        }

        Ok(output_tensor.iter().copied().collect())
    }

    /// Tokenizes `text`, runs the model and returns softmax probabilities in logit order.
    fn probabilities(&self, text: &str) -> Result<Vec<f32>, ClassifierError> {
        let (ids, mask) = self.encode(text)?;
        let logits = self.logits(ids, mask)?;
        Ok(softmax(&logits))
    }
}
