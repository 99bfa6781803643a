use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::Result as OrtResult;
use std::sync::OnceLock;

use crate::classifier::ClassifierError;

static ENVIRONMENT: OnceLock<Result<(), String>> = OnceLock::new();

/// Settings applied to every ONNX Runtime session the crate creates.
#[derive(Debug)]
pub struct RuntimeConfig {
    pub inter_threads: usize,
    pub intra_threads: usize,
    pub optimization_level: GraphOptimizationLevel,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inter_threads: 0, // Let ONNX Runtime decide
            intra_threads: 0, // Let ONNX Runtime decide
            optimization_level: GraphOptimizationLevel::Level3,
        }
    }
}

impl RuntimeConfig {
    /// Uses `threads` for intra-op parallelism, leaving everything else at its default
    pub fn with_intra_threads(threads: usize) -> Self {
        Self {
            intra_threads: threads,
            ..Self::default()
        }
    }
}

// GraphOptimizationLevel is not Clone in ort 2.0.0-rc.9
fn copy_level(level: &GraphOptimizationLevel) -> GraphOptimizationLevel {
    match level {
        GraphOptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
        GraphOptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
        GraphOptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
        GraphOptimizationLevel::Disable => GraphOptimizationLevel::Disable,
    }
}

impl Clone for RuntimeConfig {
    fn clone(&self) -> Self {
        Self {
            inter_threads: self.inter_threads,
            intra_threads: self.intra_threads,
            optimization_level: copy_level(&self.optimization_level),
        }
    }
}

fn init_onnx_environment() -> OrtResult<()> {
    ort::init()
        .with_name("emotive")
        .commit()?;
    Ok(())
}

fn initialize_once<E: std::fmt::Display>(
    slot: &OnceLock<Result<(), String>>,
    init: impl FnOnce() -> Result<(), E>,
) -> Result<(), ClassifierError> {
    slot
        .get_or_init(|| {
            log::info!("Initializing ONNX Runtime environment");
            init().map_err(|e| e.to_string())
        })
        .clone()
        .map_err(|e| {
            ClassifierError::ModelError(format!("Failed to initialize ONNX Runtime environment: {}", e))
        })
}

/// Commits the process-wide ONNX Runtime environment on first use.
///
/// Later calls return the outcome of the first attempt, so a failed
/// environment keeps failing instead of being retried.
pub fn ensure_initialized() -> Result<(), ClassifierError> {
    initialize_once(&ENVIRONMENT, init_onnx_environment)
}

/// Session builder configured from `config`. Fails if the environment could not be committed.
pub fn create_session_builder(config: &RuntimeConfig) -> Result<SessionBuilder, ClassifierError> {
    ensure_initialized()?;
    let mut builder = Session::builder()?;

    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads)?;
    }

    builder = builder.with_optimization_level(copy_level(&config.optimization_level))?;

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_initialization() {
        let first = ensure_initialized();
        let second = ensure_initialized();
        assert_eq!(first, second);
    }

    #[test]
    fn test_failed_initialization_is_reported_and_sticky() {
        let slot = OnceLock::new();
        let first = initialize_once(&slot, || Err("no runtime library"));
        match first {
            Err(ClassifierError::ModelError(msg)) => assert!(msg.contains("no runtime library")),
            other => panic!("expected a model error, got {:?}", other),
        }

        let mut retried = false;
        let second = initialize_once(&slot, || {
            retried = true;
            Ok::<(), String>(())
        });
        assert!(second.is_err());
        assert!(!retried);
    }

    #[test]
    fn test_intra_threads_config() {
        let config = RuntimeConfig::with_intra_threads(4);
        assert_eq!(config.intra_threads, 4);
        assert_eq!(config.inter_threads, 0);
        assert!(matches!(config.clone().optimization_level, GraphOptimizationLevel::Level3));
    }
}
