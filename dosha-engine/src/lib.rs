//! dosha-engine library interface
//!
//! Pure core (no I/O, no shared state):
//! - [`pulse`]: waveform → feature vector
//! - [`scoring`]: feature vector → rule-based dosha scores
//! - [`adapters`]: analyzer payloads → dosha vectors
//! - [`fusion`]: weighted fusion of per-modality vectors
//! - [`explain`]: per-modality rationale text
//!
//! Around it: [`cache`], [`workflow`] (async orchestration) and [`report`].

pub mod adapters;
pub mod cache;
pub mod error;
pub mod explain;
pub mod fusion;
pub mod pulse;
pub mod report;
pub mod scoring;
pub mod types;
pub mod workflow;

pub use crate::adapters::adapt;
pub use crate::error::{EngineError, InputError, Result};
pub use crate::explain::{explain, summarize, ExplanationEntry};
pub use crate::fusion::{fuse, FusionEngine, FusionResult, FusionStatus, ImbalanceLevel};
pub use crate::pulse::{extract_features, FeatureVector, PulseFeatureExtractor, RhythmType, Waveform};
pub use crate::scoring::{score_dosha, DoshaScoreReport};
pub use crate::types::{Dosha, DoshaVector, FusionWeights, Modality, ModalityAnalyzer, ModalityResult};
pub use crate::workflow::{Assessment, AssessmentPipeline, AssessmentRequest};
