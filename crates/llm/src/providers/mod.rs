use async_trait::async_trait;
use common::{ProviderError, ProviderResult};
use domain::{AiConfig, AiRequest, ProviderKind};
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error};

pub mod chat_completions;
pub mod ollama_provider;

pub use chat_completions::ChatCompletionsProvider;
pub use ollama_provider::OllamaProvider;

/// Uniform contract over every AI vendor
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Display name used in logs and error messages
    fn provider_name(&self) -> &str;

    /// Send one request and return the raw generated text
    async fn send_request(&self, request: &AiRequest) -> ProviderResult<String>;

    /// Validate request before execution
    fn validate_request(&self, request: &AiRequest) -> ProviderResult<()> {
        match request.range_violation() {
            Some(reason) => Err(ProviderError::InvalidRequest {
                provider: self.provider_name().to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// Connection settings resolved from configuration
#[derive(Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl ProviderSettings {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            base_url: kind.default_base_url().to_string(),
            api_key: None,
            timeout: Duration::from_millis(300_000),
        }
    }

    pub fn from_config(config: &AiConfig) -> Self {
        Self {
            kind: config.provider,
            base_url: config.effective_base_url(),
            api_key: config
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            timeout: config.timeout(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn build_client(&self) -> ProviderResult<Client> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ProviderError::Transport {
                provider: self.kind.display_name().to_string(),
                message: format!("Failed to create HTTP client: {}", e),
            })
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// POST a JSON body and return the response text of a 2xx reply.
pub(crate) async fn post_json<B: Serialize + ?Sized>(
    client: &Client,
    provider: &str,
    url: &str,
    api_key: Option<&str>,
    body: &B,
) -> ProviderResult<String> {
    let mut builder = client
        .post(url)
        .header("Content-Type", "application/json")
        .json(body);
    if let Some(key) = api_key {
        builder = builder.bearer_auth(key);
    }

    let response = builder.send().await.map_err(|e| {
        error!("{} request failed: {}", provider, e);
        ProviderError::Transport {
            provider: provider.to_string(),
            message: e.to_string(),
        }
    })?;

    let status = response.status();
    let text = response.text().await.map_err(|e| ProviderError::Transport {
        provider: provider.to_string(),
        message: format!("Failed to read response body: {}", e),
    })?;

    if !status.is_success() {
        error!("{} API error: status {}", provider, status);
        return Err(ProviderError::Http {
            provider: provider.to_string(),
            status: status.as_u16(),
            body: text,
        });
    }

    debug!("{} responded with {} bytes", provider, text.len());
    Ok(text)
}

pub(crate) fn malformed(provider: &str, message: impl fmt::Display) -> ProviderError {
    ProviderError::MalformedResponse {
        provider: provider.to_string(),
        message: message.to_string(),
    }
}

lazy_static! {
    static ref THINK_BLOCK: Regex = Regex::new(r"(?s)<think>.*?</think>").unwrap();
}

/// Drop `<think>…</think>` reasoning blocks emitted by reasoning models.
pub fn strip_reasoning(text: &str) -> String {
    if !text.contains("<think>") {
        return text.to_string();
    }
    THINK_BLOCK.replace_all(text, "").trim().to_string()
}
