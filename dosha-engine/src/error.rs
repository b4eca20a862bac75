//! Error types for dosha-engine
//!
//! Only malformed input is an error. Degenerate signals, missing modalities
//! and empty fusions all produce well-formed results instead.

use thiserror::Error;

/// Malformed input rejected before any computation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("Waveform is empty")]
    EmptyWaveform,

    /// Sample array contained nested arrays or non-numeric entries
    #[error("Waveform must be a one-dimensional numeric array: {0}")]
    NotOneDimensional(String),

    #[error("Sampling rate must be positive and finite, got {0}")]
    InvalidSamplingRate(f64),

    #[error("Sample {index} is not finite")]
    NonFiniteSample { index: usize },

    #[error("Heart rate override must be positive and finite, got {0}")]
    InvalidHeartRateOverride(f64),

    #[error("Invalid fusion weights: {0}")]
    InvalidWeights(String),
}

/// Pipeline and CLI error type
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Input(#[from] InputError),

    /// dosha-common error
    #[error("Common error: {0}")]
    Common(#[from] dosha_common::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking extraction task panicked or was cancelled
    #[error("Task join error: {0}")]
    Join(String),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, EngineError>;
