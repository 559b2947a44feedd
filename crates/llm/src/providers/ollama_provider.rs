use super::{malformed, post_json, strip_reasoning, AiProvider, ProviderSettings};
use async_trait::async_trait;
use common::{ProviderError, ProviderResult};
use domain::{AiRequest, ProviderKind};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Adapter for Ollama's `/api/generate` endpoint
#[derive(Clone)]
pub struct OllamaProvider {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl OllamaProvider {
    pub fn new(settings: ProviderSettings) -> ProviderResult<Self> {
        if settings.kind != ProviderKind::Ollama {
            return Err(ProviderError::UnknownProvider(format!(
                "{} does not speak the generate shape",
                settings.kind.display_name()
            )));
        }
        if settings.base_url.trim().is_empty() {
            return Err(ProviderError::InvalidRequest {
                provider: ProviderKind::Ollama.display_name().to_string(),
                reason: "Ollama endpoint cannot be empty".to_string(),
            });
        }

        let client = settings.build_client()?;
        Ok(Self {
            endpoint: format!("{}/api/generate", settings.base_url.trim_end_matches('/')),
            api_key: settings.api_key,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_body<'a>(&self, request: &'a AiRequest) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            system: request.system_prompt.as_deref(),
            stream: request.stream,
            think: request.reasoning.then_some(true),
            options: GenerateOptions {
                temperature: request.temperature,
                top_p: request.top_p,
                top_k: request.top_k,
                num_predict: request.max_tokens,
            },
        }
    }

    /// Single JSON object, or one object per line when streaming.
    fn parse_response(&self, body: &str) -> ProviderResult<String> {
        let name = self.provider_name();
        let mut content = String::new();
        let mut chunks = 0usize;

        for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let chunk: GenerateResponse =
                serde_json::from_str(line).map_err(|e| malformed(name, e))?;
            if let Some(error) = chunk.error {
                return Err(malformed(name, error));
            }
            chunks += 1;
            content.push_str(&chunk.response);
            if chunk.done {
                break;
            }
        }

        if chunks == 0 {
            return Err(malformed(name, "empty response body"));
        }
        Ok(content)
    }
}

impl std::fmt::Debug for OllamaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaProvider")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AiProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        ProviderKind::Ollama.display_name()
    }

    async fn send_request(&self, request: &AiRequest) -> ProviderResult<String> {
        let start_time = Instant::now();
        self.validate_request(request)?;

        info!(
            "Sending request to Ollama: {} (model: {})",
            request.prompt.chars().take(50).collect::<String>(),
            request.model
        );

        let body = self.build_body(request);
        let text = post_json(
            &self.client,
            self.provider_name(),
            &self.endpoint,
            self.api_key.as_deref(),
            &body,
        )
        .await?;

        let content = self.parse_response(&text)?;
        debug!("Ollama answered in {:?}", start_time.elapsed());
        Ok(strip_reasoning(&content))
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    think: Option<bool>,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn provider_for(server: &Server) -> OllamaProvider {
        OllamaProvider::new(ProviderSettings::new(ProviderKind::Ollama).with_base_url(server.url()))
            .unwrap()
    }

    #[test]
    fn test_default_endpoint() {
        let provider = OllamaProvider::new(ProviderSettings::new(ProviderKind::Ollama)).unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:11434/api/generate");
        assert_eq!(provider.provider_name(), "Ollama");
    }

    #[tokio::test]
    async fn test_generate_request_shape() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .match_body(Matcher::PartialJson(json!({
                "model": "qwen2.5-coder:7b",
                "prompt": "Document save()",
                "stream": false,
                "options": {"top_k": 20, "num_predict": 512}
            })))
            .with_status(200)
            .with_body(r#"{"model":"qwen2.5-coder:7b","response":"/** Saves the entity. */","done":true}"#)
            .create_async()
            .await;

        let provider = provider_for(&server);
        let request = AiRequest::new("qwen2.5-coder:7b", "Document save()")
            .with_sampling(0.3, 0.8, 20)
            .with_max_tokens(512);

        let content = provider.send_request(&request).await.unwrap();
        assert_eq!(content, "/** Saves the entity. */");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_streamed_lines_are_joined() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(concat!(
                "{\"response\":\"/** Deletes \",\"done\":false}\n",
                "{\"response\":\"a row. */\",\"done\":false}\n",
                "{\"response\":\"\",\"done\":true}\n"
            ))
            .create_async()
            .await;

        let provider = provider_for(&server);
        let request = AiRequest::new("llama3", "doc").with_stream(true);
        assert_eq!(
            provider.send_request(&request).await.unwrap(),
            "/** Deletes a row. */"
        );
    }

    #[tokio::test]
    async fn test_model_missing_is_http_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/generate")
            .with_status(404)
            .with_body(r#"{"error":"model 'nope' not found"}"#)
            .create_async()
            .await;

        let provider = provider_for(&server);
        let err = provider
            .send_request(&AiRequest::new("nope", "doc"))
            .await
            .unwrap_err();
        match err {
            ProviderError::Http { provider, status, body } => {
                assert_eq!(provider, "Ollama");
                assert_eq!(status, 404);
                assert!(body.contains("not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let provider = OllamaProvider::new(
            ProviderSettings::new(ProviderKind::Ollama)
                .with_base_url("http://127.0.0.1:1")
                .with_timeout(std::time::Duration::from_secs(2)),
        )
        .unwrap();

        let err = provider
            .send_request(&AiRequest::new("llama3", "doc"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Transport { ref provider, .. } if provider == "Ollama"));
    }
}
