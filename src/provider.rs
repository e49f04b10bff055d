//! Remote translation provider boundary.
//!
//! The engine only ever talks to a [`Translator`]; the HTTP implementation
//! below speaks the LibreTranslate-style JSON API, and tests substitute
//! in-process stubs. Timeouts and retries are the engine's concern, not the
//! provider's: a `Translator` call represents exactly one attempt.

use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One-shot translation backend.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target`. A `None` source asks the provider to
    /// detect the source language itself.
    async fn translate(
        &self,
        text: &str,
        source: Option<&str>,
        target: &str,
    ) -> Result<String, ProviderError>;

    /// Detect the language of `text`, returning its code.
    async fn detect(&self, text: &str) -> Result<String, ProviderError>;
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    q: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct Detection {
    language: String,
}

/// HTTP client for a LibreTranslate-compatible endpoint.
pub struct HttpTranslator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTranslator {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(
        &self,
        text: &str,
        source: Option<&str>,
        target: &str,
    ) -> Result<String, ProviderError> {
        let request = TranslateRequest {
            q: text,
            source: source.unwrap_or("auto"),
            target,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        debug!(source = request.source, target, "sending translate request");
        let response = self
            .client
            .post(format!("{}/translate", self.base_url))
            .json(&request)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        Ok(parsed.translated_text)
    }

    async fn detect(&self, text: &str) -> Result<String, ProviderError> {
        let request = DetectRequest {
            q: text,
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/detect", self.base_url))
            .json(&request)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let detections: Vec<Detection> = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        detections
            .into_iter()
            .next()
            .map(|d| d.language)
            .ok_or(ProviderError::DetectionFailed)
    }
}
