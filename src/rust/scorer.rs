//! Turns raw per-label scores into what the UI shows: the dominant emotion plus
//! the full breakdown for charting.

use serde::{Deserialize, Serialize};

use crate::classifier::{ClassifierError, ScoreResult};

/// An emotion classification capability with a fixed label vocabulary.
///
/// Implementations must return exactly one `ScoreResult` per label.
pub trait EmotionModel: Send + Sync {
    fn classify(&self, text: &str) -> Result<Vec<ScoreResult>, ClassifierError>;

    fn labels(&self) -> &[String];
}

#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    #[error("Please enter some text before analyzing.")]
    EmptyInput,
    #[error("The classifier returned no scores")]
    NoScores,
    #[error("The classifier returned no usable scores (every score is NaN)")]
    NoUsableScores,
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

/// Result of one analysis call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub dominant: ScoreResult,
    /// One entry per label, in the model's label order
    pub scores: Vec<ScoreResult>,
}

impl Analysis {
    /// Scores sorted by descending confidence; equal scores keep label order.
    ///
    /// NaN scores sort last.
    pub fn ranked(&self) -> Vec<ScoreResult> {
        let mut ranked = self.scores.clone();
        ranked.sort_by(|a, b| rank_key(b.score).total_cmp(&rank_key(a.score)));
        ranked
    }

    /// Plain-text report: the dominant emotion, then every label by descending score.
    pub fn report(&self) -> String {
        let mut out = format!("Dominant emotion: {} ({:.2})\n", self.dominant.label, self.dominant.score);
        out.push_str("Confidence scores (sorted):\n");
        for result in self.ranked() {
            out.push_str(&format!("  {}: {:.1}%\n", result.label, result.score * 100.0));
        }
        out
    }
}

// `total_cmp` alone would put positive NaN above every real score
fn rank_key(score: f32) -> f32 {
    if score.is_nan() { f32::NEG_INFINITY } else { score }
}

/// Returns the first entry holding the maximum score.
///
/// NaN scores never win. Returns `None` for an empty slice or when every score is NaN.
pub fn dominant_emotion(scores: &[ScoreResult]) -> Option<&ScoreResult> {
    let mut best: Option<&ScoreResult> = None;
    for candidate in scores {
        match best {
            Some(current) if !(candidate.score > current.score) => {}
            _ if candidate.score.is_nan() => {}
            _ => best = Some(candidate),
        }
    }
    best
}

pub struct EmotionScorer<M: EmotionModel> {
    model: M,
}

impl<M: EmotionModel> EmotionScorer<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn labels(&self) -> &[String] {
        self.model.labels()
    }

    /// Classifies `text` and picks the dominant emotion.
    ///
    /// Whitespace-only input is rejected with `ScoreError::EmptyInput` before the
    /// model is called. The model receives the text as typed.
    pub fn analyze(&self, text: &str) -> Result<Analysis, ScoreError> {
        if text.trim().is_empty() {
            return Err(ScoreError::EmptyInput);
        }

        let scores = self.model.classify(text)?;
        if scores.is_empty() {
            return Err(ScoreError::NoScores);
        }
        let dominant = dominant_emotion(&scores)
            .cloned()
            .ok_or(ScoreError::NoUsableScores)?;

        log::debug!("Dominant emotion {} ({:.2}) over {} labels", dominant.label, dominant.score, scores.len());
        Ok(Analysis { dominant, scores })
    }
}

/// Process-wide scorer, set once at startup and never replaced.
pub mod global {
    use std::sync::{Arc, RwLock};

    use lazy_static::lazy_static;

    use super::{EmotionModel, EmotionScorer};

    pub type SharedScorer = Arc<EmotionScorer<Box<dyn EmotionModel>>>;

    lazy_static! {
        static ref SCORER: RwLock<Option<SharedScorer>> = RwLock::new(None);
    }

    #[derive(Debug, thiserror::Error)]
    pub enum InitError {
        #[error("The global scorer is already initialized")]
        AlreadyInitialized,
    }

    impl EmotionModel for Box<dyn EmotionModel> {
        fn classify(&self, text: &str) -> Result<Vec<super::ScoreResult>, super::ClassifierError> {
            (**self).classify(text)
        }

        fn labels(&self) -> &[String] {
            (**self).labels()
        }
    }

    /// Installs the process-wide scorer. Fails if one is already installed.
    pub fn init(model: Box<dyn EmotionModel>) -> Result<SharedScorer, InitError> {
        let mut slot = SCORER.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.is_some() {
            return Err(InitError::AlreadyInitialized);
        }
        let scorer = Arc::new(EmotionScorer::new(model));
        *slot = Some(Arc::clone(&scorer));
        log::info!("Global emotion scorer initialized");
        Ok(scorer)
    }

    /// The process-wide scorer, if `init` has run.
    pub fn get() -> Option<SharedScorer> {
        SCORER.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }
}
