//! AI provider adapters.
//!
//! A uniform `send_request(AiRequest) -> String` contract over the
//! chat-completions wire shape (OpenAI and the vendors that mirror it)
//! and the Ollama generate shape. Failures are never retried here; the
//! caller decides what to do with them.

mod factory;
pub mod providers;

pub use factory::{AiProviderFactory, ProviderSource};
pub use providers::{
    strip_reasoning, AiProvider, ChatCompletionsProvider, OllamaProvider, ProviderSettings,
};
