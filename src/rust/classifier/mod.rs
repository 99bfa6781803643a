use serde::{Deserialize, Serialize};

mod error;
mod inference;
mod model;
pub mod builder;
mod utils;

pub use error::ClassifierError;
pub use model::EmotionClassifier;
pub use builder::ClassifierBuilder;

/// Confidence of one emotion label for one input text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub label: String,
    /// Softmax probability in [0, 1]
    pub score: f32,
}

impl ScoreResult {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the ONNX model file
    pub model_path: String,
    /// Path to the tokenizer file
    pub tokenizer_path: String,
    /// Number of labels the model scores
    pub num_labels: usize,
    /// Labels in logit order
    pub labels: Vec<String>,
    /// Inputs longer than this many tokens are truncated
    pub max_sequence_length: usize,
}
