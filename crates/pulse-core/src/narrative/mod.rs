//! Narrative gateway - optional free-text commentary on a report
//!
//! The deterministic report never depends on this module. A narrative is
//! requested after the report exists, with a single attempt bounded by a
//! timeout. Any failure turns into [`NarrativeOutcome::Unavailable`], which
//! renders as [`NARRATIVE_UNAVAILABLE`].
//!
//! # Usage
//!
//! ```rust,ignore
//! let client = NarrativeClient::from_config(&config.narrative);
//! if let Some(client) = client {
//!     let outcome = client.narrate(&report.narrative_request(), config.narrative.timeout()).await;
//!     println!("{}", outcome.text());
//! }
//! ```

mod mock;
mod ollama;
pub mod prompt;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{NarrativeBackendKind, NarrativeConfig};
use crate::error::{Error, Result};

/// Text shown in place of a narrative that could not be produced
pub const NARRATIVE_UNAVAILABLE: &str = "Narrative insights are unavailable right now.";

/// A single value sent to the generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NarrativeValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for NarrativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NarrativeValue::Number(n) => write!(f, "{:.2}", n),
            NarrativeValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for NarrativeValue {
    fn from(value: f64) -> Self {
        NarrativeValue::Number(value)
    }
}

impl From<String> for NarrativeValue {
    fn from(value: String) -> Self {
        NarrativeValue::Text(value)
    }
}

impl From<&str> for NarrativeValue {
    fn from(value: &str) -> Self {
        NarrativeValue::Text(value.to_string())
    }
}

/// Flat key/value summary of a report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NarrativeRequest {
    fields: BTreeMap<String, NarrativeValue>,
}

impl NarrativeRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<NarrativeValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&NarrativeValue> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NarrativeValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Result of a narrative attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum NarrativeOutcome {
    Text(String),
    Unavailable,
}

impl NarrativeOutcome {
    /// Narrative text, or the sentinel when none was produced
    pub fn text(&self) -> &str {
        match self {
            NarrativeOutcome::Text(text) => text,
            NarrativeOutcome::Unavailable => NARRATIVE_UNAVAILABLE,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, NarrativeOutcome::Text(_))
    }
}

/// Interface implemented by every narrative generator
#[async_trait]
pub trait NarrativeBackend: Send + Sync {
    /// Produce narrative text for a report summary
    async fn generate(&self, request: &NarrativeRequest) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete narrative client
#[derive(Clone)]
pub enum NarrativeClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl NarrativeClient {
    /// Build a client from resolved configuration
    ///
    /// Returns None when the narrative is disabled.
    pub fn from_config(config: &NarrativeConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        Some(Self::for_backend(config))
    }

    /// Build a client for the configured backend regardless of `enabled`
    pub fn for_backend(config: &NarrativeConfig) -> Self {
        match config.backend {
            NarrativeBackendKind::Ollama => Self::ollama(&config.host, &config.model),
            NarrativeBackendKind::Mock => Self::mock(),
        }
    }

    pub fn ollama(host: &str, model: &str) -> Self {
        NarrativeClient::Ollama(OllamaBackend::new(host, model))
    }

    pub fn mock() -> Self {
        NarrativeClient::Mock(MockBackend::new())
    }

    /// Make a single bounded attempt at a narrative
    ///
    /// Never fails: errors and timeouts are logged and reported as
    /// [`NarrativeOutcome::Unavailable`].
    pub async fn narrate(&self, request: &NarrativeRequest, timeout: Duration) -> NarrativeOutcome {
        let attempt = tokio::time::timeout(timeout, self.generate(request)).await;

        let result = match attempt {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(timeout.as_secs())),
        };

        match result {
            Ok(text) if !text.trim().is_empty() => {
                tracing::debug!(model = self.model(), chars = text.len(), "Narrative generated");
                NarrativeOutcome::Text(text.trim().to_string())
            }
            Ok(_) => {
                tracing::warn!(model = self.model(), host = self.host(), "Narrative backend returned empty text");
                NarrativeOutcome::Unavailable
            }
            Err(e) => {
                tracing::warn!(model = self.model(), host = self.host(), error = %e, "Narrative unavailable");
                NarrativeOutcome::Unavailable
            }
        }
    }
}

#[async_trait]
impl NarrativeBackend for NarrativeClient {
    async fn generate(&self, request: &NarrativeRequest) -> Result<String> {
        match self {
            NarrativeClient::Ollama(b) => b.generate(request).await,
            NarrativeClient::Mock(b) => b.generate(request).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            NarrativeClient::Ollama(b) => b.health_check().await,
            NarrativeClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            NarrativeClient::Ollama(b) => b.model(),
            NarrativeClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            NarrativeClient::Ollama(b) => b.host(),
            NarrativeClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> NarrativeRequest {
        let mut request = NarrativeRequest::new();
        request.insert("financial.income", 10_000.0);
        request.insert("rankings.top_service", "Haircut");
        request
    }

    #[test]
    fn test_request_serializes_flat() {
        let json = serde_json::to_value(request()).unwrap();
        assert_eq!(json["financial.income"], 10_000.0);
        assert_eq!(json["rankings.top_service"], "Haircut");
    }

    #[test]
    fn test_outcome_text() {
        assert_eq!(NarrativeOutcome::Unavailable.text(), NARRATIVE_UNAVAILABLE);
        assert_eq!(NarrativeOutcome::Text("ok".into()).text(), "ok");
        assert!(!NarrativeOutcome::Unavailable.is_available());
    }

    #[test]
    fn test_disabled_config_has_no_client() {
        let config = NarrativeConfig::default();
        assert!(NarrativeClient::from_config(&config).is_none());

        let enabled = NarrativeConfig {
            enabled: true,
            backend: NarrativeBackendKind::Mock,
            ..NarrativeConfig::default()
        };
        assert!(matches!(
            NarrativeClient::from_config(&enabled),
            Some(NarrativeClient::Mock(_))
        ));
    }

    #[tokio::test]
    async fn test_mock_narrative() {
        let client = NarrativeClient::mock();
        let outcome = client.narrate(&request(), Duration::from_secs(5)).await;
        assert!(outcome.is_available());
        assert!(outcome.text().contains("Haircut"));
    }

    #[tokio::test]
    async fn test_failing_backend_yields_sentinel() {
        let client = NarrativeClient::Mock(MockBackend::failing());
        let outcome = client.narrate(&request(), Duration::from_secs(5)).await;
        assert_eq!(outcome, NarrativeOutcome::Unavailable);
        assert_eq!(outcome.text(), NARRATIVE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_timeout_yields_sentinel() {
        let client = NarrativeClient::Mock(MockBackend::new().with_delay(Duration::from_secs(5)));
        let outcome = client.narrate(&request(), Duration::from_millis(20)).await;
        assert_eq!(outcome, NarrativeOutcome::Unavailable);
    }

    #[tokio::test]
    async fn test_unreachable_host_yields_sentinel() {
        // Port 9 (discard) on localhost is not an Ollama server
        let client = NarrativeClient::ollama("http://127.0.0.1:9", "llama3.2");
        let outcome = client.narrate(&request(), Duration::from_secs(5)).await;
        assert_eq!(outcome, NarrativeOutcome::Unavailable);
        assert!(!client.health_check().await);
    }
}
