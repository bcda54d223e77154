//! Generation-backend client.
//!
//! The backend is an external collaborator: it takes a prompt, the active
//! group's URLs, and the resolved attachments, and returns generated text
//! plus optional retrieval metadata. Configuration, quota, and transport
//! problems are deliberately collapsed into one opaque failure: callers
//! only need to know the turn produced no text.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::GenerationConfig;
use crate::models::Attachment;

/// Outcome of a successful generation call.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationResponse {
    pub text: String,
    #[serde(default)]
    pub retrieval: Vec<RetrievedSource>,
}

/// Backend-reported status for one retrieved URL.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievedSource {
    pub url: String,
    pub status: String,
}

/// Interface the chat turn depends on; swap implementations for tests.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        urls: &[String],
        attachments: &[Attachment],
    ) -> Result<GenerationResponse>;
}

/// HTTP implementation speaking JSON to a configured endpoint.
///
/// The API key is read from the environment variable named in the config
/// (never from the config file itself) and sent as a bearer token when
/// present.
pub struct HttpGenerationClient {
    client: reqwest::Client,
    endpoint: String,
    model: Option<String>,
    api_key: Option<String>,
}

impl HttpGenerationClient {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let api_key = std::env::var(&config.api_key_env).ok();

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate(
        &self,
        prompt: &str,
        urls: &[String],
        attachments: &[Attachment],
    ) -> Result<GenerationResponse> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "urls": urls,
            "attachments": attachments,
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await.context("generation request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("generation backend error {}: {}", status, body_text);
        }

        let parsed: GenerationResponse = response
            .json()
            .await
            .context("malformed generation response")?;
        debug!(retrieved = parsed.retrieval.len(), "generation backend responded");
        Ok(parsed)
    }
}

/// Canned-response client for tests and offline runs.
pub struct StaticGenerationClient {
    pub text: String,
}

#[async_trait]
impl GenerationClient for StaticGenerationClient {
    async fn generate(
        &self,
        _prompt: &str,
        _urls: &[String],
        _attachments: &[Attachment],
    ) -> Result<GenerationResponse> {
        Ok(GenerationResponse {
            text: self.text.clone(),
            retrieval: Vec::new(),
        })
    }
}
