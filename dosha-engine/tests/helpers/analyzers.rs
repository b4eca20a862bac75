//! Stand-in external analyzers

use dosha_engine::types::{AnalyzerError, Modality, ModalityAnalyzer, ModalityResult};
use serde_json::Value;
use std::time::Duration;

/// Returns a fixed payload
pub struct StaticAnalyzer {
    pub modality: Modality,
    pub payload: Value,
    pub confidence: Option<f64>,
}

impl StaticAnalyzer {
    pub fn new(modality: Modality, payload: Value) -> Self {
        Self {
            modality,
            payload,
            confidence: None,
        }
    }
}

#[async_trait::async_trait]
impl ModalityAnalyzer for StaticAnalyzer {
    fn name(&self) -> &'static str {
        "static"
    }

    fn modality(&self) -> Modality {
        self.modality
    }

    async fn analyze(&self) -> Result<ModalityResult, AnalyzerError> {
        Ok(ModalityResult {
            source: self.name().to_string(),
            payload: self.payload.clone(),
            confidence: self.confidence,
        })
    }
}

/// Always fails
pub struct FailingAnalyzer(pub Modality);

#[async_trait::async_trait]
impl ModalityAnalyzer for FailingAnalyzer {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn modality(&self) -> Modality {
        self.0
    }

    async fn analyze(&self) -> Result<ModalityResult, AnalyzerError> {
        Err(AnalyzerError::Failed("model not loaded".to_string()))
    }
}

/// Answers after `delay`
pub struct SlowAnalyzer {
    pub inner: StaticAnalyzer,
    pub delay: Duration,
}

#[async_trait::async_trait]
impl ModalityAnalyzer for SlowAnalyzer {
    fn name(&self) -> &'static str {
        "slow"
    }

    fn modality(&self) -> Modality {
        self.inner.modality
    }

    async fn analyze(&self) -> Result<ModalityResult, AnalyzerError> {
        tokio::time::sleep(self.delay).await;
        self.inner.analyze().await
    }
}
