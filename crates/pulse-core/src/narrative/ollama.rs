//! Ollama backend implementation
//!
//! Single `POST {host}/api/generate` with streaming disabled; the generated
//! text is read from the `response` field.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::prompt::render_prompt;
use super::{NarrativeBackend, NarrativeRequest};

#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl NarrativeBackend for OllamaBackend {
    async fn generate(&self, request: &NarrativeRequest) -> Result<String> {
        let body = OllamaRequest {
            model: &self.model,
            prompt: render_prompt(request),
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let ollama_response: OllamaResponse = response.json().await?;
        debug!(
            model = %self.model,
            chars = ollama_response.response.len(),
            "Ollama narrative response"
        );

        if ollama_response.response.trim().is_empty() {
            return Err(Error::Narrative("Ollama returned an empty response".into()));
        }

        Ok(ollama_response.response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockOllamaServer;

    #[test]
    fn test_trailing_slash_trimmed() {
        let backend = OllamaBackend::new("http://localhost:11434/", "llama3.2");
        assert_eq!(backend.host(), "http://localhost:11434");
        assert_eq!(backend.model(), "llama3.2");
    }

    #[tokio::test]
    async fn test_generate_against_mock_server() {
        let server = MockOllamaServer::start().await;
        let backend = OllamaBackend::new(&server.url(), "llama3.2");

        let mut request = NarrativeRequest::new();
        request.insert("financial.income", 1200.0);

        assert!(backend.health_check().await);
        let text = backend.generate(&request).await.unwrap();
        assert!(!text.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let server = MockOllamaServer::start_failing().await;
        let backend = OllamaBackend::new(&server.url(), "llama3.2");

        let err = backend.generate(&NarrativeRequest::new()).await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
