//! Emotion detection for short texts using an ONNX sequence-classification model.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use emotive::{EmotionClassifier, EmotionScorer, BuiltinModel};
//!
//! let classifier = EmotionClassifier::builder()
//!     .with_model(BuiltinModel::DistilBertEmotion)?
//!     .build()?;
//!
//! let scorer = EmotionScorer::new(classifier);
//! let analysis = scorer.analyze("I am so happy today!")?;
//! println!("Dominant emotion: {} ({:.2})", analysis.dominant.label, analysis.dominant.score);
//! for score in &analysis.scores {
//!     println!("{}: {:.2}", score.label, score.score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Downloading the model
//!
//! Built-in models are fetched into a local cache before first use:
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use emotive::{ModelManager, BuiltinModel};
//!
//! let manager = ModelManager::new_default()?;
//! manager.ensure_model_downloaded(BuiltinModel::DistilBertEmotion).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! `EmotionClassifier` is `Send + Sync`, so one instance can serve every request
//! of a process behind an `Arc`. See [`scorer::global`] for the process-wide handle.

pub mod classifier;
pub mod config;
mod runtime;
pub mod model_manager;
pub mod models;
pub mod scorer;
pub mod web;

pub use classifier::{EmotionClassifier, ClassifierBuilder, ClassifierError, ClassifierInfo, ScoreResult};
pub use config::{Args, AppConfig};
pub use runtime::{RuntimeConfig, create_session_builder};
pub use model_manager::{ModelManager, ModelError};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo};
pub use scorer::{Analysis, EmotionModel, EmotionScorer, ScoreError, dominant_emotion};

pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
