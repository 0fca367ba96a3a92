//! Mock backend for testing
//!
//! Produces deterministic text from the request, or fails on demand.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::{NarrativeBackend, NarrativeRequest, NarrativeValue};

/// Mock narrative backend
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Whether generate should fail
    pub fail: bool,
    /// Artificial latency before answering
    pub delay: Option<Duration>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            fail: false,
            delay: None,
        }
    }

    /// Create a backend whose generation always fails
    pub fn failing() -> Self {
        Self {
            healthy: false,
            fail: true,
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl NarrativeBackend for MockBackend {
    async fn generate(&self, request: &NarrativeRequest) -> Result<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail {
            return Err(Error::Narrative("mock backend configured to fail".into()));
        }

        let mut text = format!("Summary of {} indicators.", request.len());
        if let Some(NarrativeValue::Number(growth)) = request.get("financial.income_growth") {
            text.push_str(&format!(" Revenue changed {:.1}% against the previous period.", growth));
        }
        if let Some(NarrativeValue::Text(service)) = request.get("rankings.top_service") {
            text.push_str(&format!(" {} led service demand.", service));
        }

        Ok(text)
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
