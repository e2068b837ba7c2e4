use crate::error::{InsightsError, Result};
use crate::llm::types::*;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::time::Duration;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Anything that can turn a flattened prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Whether a credential is available. Checked before every call.
    fn is_configured(&self) -> bool;

    /// `Ok(None)` means the model answered with no text.
    async fn generate_text(&self, request: &GenerationRequest) -> Result<Option<String>>;
}

#[derive(Debug, Clone)]
enum Credential {
    /// Read from the environment at call time.
    Env(String),
    Static(String),
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    credential: Credential,
    base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::build(Credential::Static(api_key.into()), timeout)
    }

    /// The key is looked up in `var` on every request, so it may be set after
    /// the client is created.
    pub fn from_env(var: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::build(Credential::Env(var.into()), timeout)
    }

    fn build(credential: Credential, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            credential,
            base_url: GEMINI_BASE_URL.to_string(),
            timeout,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn api_key(&self) -> Result<String> {
        let key = match &self.credential {
            Credential::Static(key) => Some(key.clone()),
            Credential::Env(var) => std::env::var(var).ok(),
        };

        match key {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(InsightsError::Configuration(format!(
                "{} not found in environment variables",
                self.credential_name()
            ))),
        }
    }

    pub fn credential_name(&self) -> &str {
        match &self.credential {
            Credential::Env(var) => var,
            Credential::Static(_) => "API key",
        }
    }

    /// Error text ends up in chat replies and history, so the URL is dropped.
    fn map_transport_error(&self, err: reqwest::Error) -> InsightsError {
        if err.is_timeout() {
            InsightsError::Timeout(self.timeout.as_secs())
        } else {
            InsightsError::Http(err.without_url())
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn is_configured(&self) -> bool {
        self.api_key().is_ok()
    }

    async fn generate_text(&self, request: &GenerationRequest) -> Result<Option<String>> {
        let api_key = self.api_key()?;
        let params = request.variant.params();

        let url = format!("{}/models/{}:generateContent", self.base_url, params.model);

        let payload = GenerateContentRequest {
            contents: vec![Content::user(request.prompt.as_str())],
            generation_config: params.into(),
        };

        debug!(
            "Sending {} character prompt to {}",
            request.prompt.len(),
            params.model
        );

        let res = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await.map_err(|e| self.map_transport_error(e))?;
            return Err(InsightsError::Generation(format!(
                "Gemini API Error (status {}): {}",
                status, err_text
            )));
        }

        let body: GenerateContentResponse =
            res.json().await.map_err(|e| self.map_transport_error(e))?;

        if let Some(reason) = body
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.finish_reason.as_deref())
        {
            debug!("{} finished with reason {}", params.model, reason);
        }

        Ok(body.text())
    }
}
