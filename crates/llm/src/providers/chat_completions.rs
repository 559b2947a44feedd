use super::{malformed, post_json, strip_reasoning, AiProvider, ProviderSettings};
use async_trait::async_trait;
use common::{ProviderError, ProviderResult};
use domain::{AiRequest, ProviderKind, WireShape};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Adapter for the chat-completions wire shape.
///
/// OpenAI, DeepSeek, Qwen, Moonshot, Zhipu, SiliconFlow and custom
/// OpenAI-compatible servers all go through this type; they differ only
/// in display name and base URL.
#[derive(Clone)]
pub struct ChatCompletionsProvider {
    name: String,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl ChatCompletionsProvider {
    pub fn new(settings: ProviderSettings) -> ProviderResult<Self> {
        let name = settings.kind.display_name().to_string();
        if settings.kind.wire_shape() != WireShape::ChatCompletions {
            return Err(ProviderError::UnknownProvider(format!(
                "{} does not speak the chat-completions shape",
                name
            )));
        }
        if settings.kind.requires_api_key() && settings.api_key.is_none() {
            return Err(ProviderError::MissingCredentials { provider: name });
        }

        let client = settings.build_client()?;
        Ok(Self {
            endpoint: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            api_key: settings.api_key,
            client,
            name,
        })
    }

    /// Vendor preset with its default base URL.
    pub fn for_vendor(kind: ProviderKind, api_key: impl Into<String>) -> ProviderResult<Self> {
        Self::new(ProviderSettings::new(kind).with_api_key(api_key))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_body<'a>(&self, request: &'a AiRequest) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system_prompt) = request.system_prompt.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system_prompt,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        ChatRequest {
            model: &request.model,
            messages,
            temperature: request.temperature,
            top_p: request.top_p,
            max_tokens: request.max_tokens,
            stream: request.stream,
        }
    }

    fn parse_response(&self, body: &str) -> ProviderResult<String> {
        let response: ChatResponse =
            serde_json::from_str(body).map_err(|e| malformed(&self.name, e))?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| malformed(&self.name, "response contains no choices"))?;

        match choice.message.content {
            Some(content) => Ok(content),
            None => Err(malformed(&self.name, "choice has no message content")),
        }
    }

    /// Concatenate `choices[0].delta.content` over `data:` events.
    fn parse_event_stream(&self, body: &str) -> ProviderResult<String> {
        let mut content = String::new();
        let mut events = 0usize;

        for line in body.lines() {
            let Some(data) = line.trim().strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data == "[DONE]" {
                break;
            }
            if data.is_empty() {
                continue;
            }
            let chunk: ChatStreamChunk =
                serde_json::from_str(data).map_err(|e| malformed(&self.name, e))?;
            events += 1;
            if let Some(delta) = chunk.choices.into_iter().next().and_then(|c| c.delta.content) {
                content.push_str(&delta);
            }
        }

        if events == 0 {
            return Err(malformed(&self.name, "stream contained no data events"));
        }
        Ok(content)
    }
}

impl std::fmt::Debug for ChatCompletionsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsProvider")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AiProvider for ChatCompletionsProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    async fn send_request(&self, request: &AiRequest) -> ProviderResult<String> {
        let start_time = Instant::now();
        self.validate_request(request)?;

        info!(
            "Sending request to {}: {} (model: {})",
            self.name,
            request.prompt.chars().take(50).collect::<String>(),
            request.model
        );

        let body = self.build_body(request);
        let text = post_json(
            &self.client,
            &self.name,
            &self.endpoint,
            self.api_key.as_deref(),
            &body,
        )
        .await?;

        let trimmed = text.trim_start();
        let content = if request.stream || trimmed.starts_with("data:") {
            self.parse_event_stream(&text)?
        } else {
            self.parse_response(&text)?
        };

        debug!("{} answered in {:?}", self.name, start_time.elapsed());
        Ok(strip_reasoning(&content))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamChunk {
    #[serde(default)]
    choices: Vec<ChatStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamChoice {
    #[serde(default)]
    delta: ChatDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChatDelta {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn provider_for(server: &Server, kind: ProviderKind) -> ChatCompletionsProvider {
        ChatCompletionsProvider::new(
            ProviderSettings::new(kind)
                .with_base_url(server.url())
                .with_api_key("test-api-key"),
        )
        .unwrap()
    }

    #[test]
    fn test_vendor_presets_share_the_adapter() {
        let deepseek = ChatCompletionsProvider::for_vendor(ProviderKind::DeepSeek, "k").unwrap();
        assert_eq!(deepseek.provider_name(), "DeepSeek");
        assert_eq!(deepseek.endpoint(), "https://api.deepseek.com/v1/chat/completions");

        let zhipu = ChatCompletionsProvider::for_vendor(ProviderKind::Zhipu, "k").unwrap();
        assert_eq!(zhipu.endpoint(), "https://open.bigmodel.cn/api/paas/v4/chat/completions");
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let err = ChatCompletionsProvider::new(ProviderSettings::new(ProviderKind::OpenAi))
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredentials { ref provider } if provider == "OpenAI"));

        // self-hosted compatible servers may run without a key
        assert!(ChatCompletionsProvider::new(ProviderSettings::new(ProviderKind::OpenAiCompatible)).is_ok());
    }

    #[test]
    fn test_ollama_kind_is_not_accepted() {
        let err = ChatCompletionsProvider::new(ProviderSettings::new(ProviderKind::Ollama)).unwrap_err();
        assert!(matches!(err, ProviderError::UnknownProvider(_)));
    }

    #[tokio::test]
    async fn test_chat_completion_roundtrip() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-api-key")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "stream": false,
                "max_tokens": 256,
                "messages": [
                    {"role": "system", "content": "Answer with JavaDoc only."},
                    {"role": "user", "content": "Document add(int, int)"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                "choices": [{
                    "message": {"role": "assistant", "content": "/** Adds two numbers. */"},
                    "finish_reason": "stop"
                }]
            }"#,
            )
            .create_async()
            .await;

        let provider = provider_for(&server, ProviderKind::OpenAi);
        let request = AiRequest::new("gpt-4o-mini", "Document add(int, int)")
            .with_system_prompt("Answer with JavaDoc only.")
            .with_max_tokens(256);

        let content = provider.send_request(&request).await.unwrap();
        assert_eq!(content, "/** Adds two numbers. */");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_carries_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Incorrect API key provided"}}"#)
            .create_async()
            .await;

        let provider = provider_for(&server, ProviderKind::Moonshot);
        let err = provider
            .send_request(&AiRequest::new("moonshot-v1-8k", "hi"))
            .await
            .unwrap_err();

        match err {
            ProviderError::Http { provider, status, body } => {
                assert_eq!(provider, "Moonshot");
                assert_eq!(status, 401);
                assert!(body.contains("Incorrect API key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_event_stream_is_concatenated() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(json!({"stream": true})))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(concat!(
                "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"/** Loads \"}}]}\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"a user. */\"}}]}\n\n",
                "data: [DONE]\n\n"
            ))
            .create_async()
            .await;

        let provider = provider_for(&server, ProviderKind::SiliconFlow);
        let request = AiRequest::new("Qwen/Qwen2.5-7B-Instruct", "doc").with_stream(true);
        let content = provider.send_request(&request).await.unwrap();
        assert_eq!(content, "/** Loads a user. */");
    }

    #[tokio::test]
    async fn test_reasoning_block_is_dropped() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"<think>plan</think>\n/** Saves. */"}}]}"#)
            .create_async()
            .await;

        let provider = provider_for(&server, ProviderKind::DeepSeek);
        let content = provider
            .send_request(&AiRequest::new("deepseek-reasoner", "doc").with_reasoning(true))
            .await
            .unwrap();
        assert_eq!(content, "/** Saves. */");
    }

    #[tokio::test]
    async fn test_empty_choices_is_malformed() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let provider = provider_for(&server, ProviderKind::OpenAi);
        let err = provider
            .send_request(&AiRequest::new("gpt-4o-mini", "doc"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_invalid_request_is_not_sent() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let provider = provider_for(&server, ProviderKind::OpenAi);
        let request = AiRequest::new("gpt-4o-mini", "doc").with_sampling(3.0, 0.9, 40);
        let err = provider.send_request(&request).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest { .. }));

        mock.assert_async().await;
    }
}
