use crate::config::AiConfig;
use serde::{Deserialize, Serialize};

/// One generation call to an AI provider. Built per call, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiRequest {
    pub model: String,
    pub prompt: String,
    pub system_prompt: Option<String>,
    /// 0.0 - 2.0
    pub temperature: f32,
    /// 0.0 - 1.0
    pub top_p: f32,
    pub top_k: u32,
    pub max_tokens: u32,
    pub stream: bool,
    pub reasoning: bool,
}

impl AiRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system_prompt: None,
            temperature: 0.7,
            top_p: 0.9,
            top_k: 40,
            max_tokens: 2048,
            stream: false,
            reasoning: false,
        }
    }

    /// Request carrying the sampling settings from configuration.
    pub fn from_config(config: &AiConfig, prompt: impl Into<String>) -> Self {
        Self {
            model: config.model.clone(),
            prompt: prompt.into(),
            system_prompt: config.system_prompt.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            max_tokens: config.max_tokens,
            stream: config.stream,
            reasoning: config.reasoning,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_sampling(mut self, temperature: f32, top_p: f32, top_k: u32) -> Self {
        self.temperature = temperature;
        self.top_p = top_p;
        self.top_k = top_k;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_reasoning(mut self, reasoning: bool) -> Self {
        self.reasoning = reasoning;
        self
    }

    /// First range violation, if any.
    pub fn range_violation(&self) -> Option<String> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Some(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            ));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Some(format!("top_p must be within 0.0..=1.0, got {}", self.top_p));
        }
        if self.max_tokens == 0 {
            return Some("max_tokens must be greater than 0".to_string());
        }
        if self.model.trim().is_empty() {
            return Some("model must not be empty".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_copies_sampling() {
        let config = AiConfig {
            model: "deepseek-chat".to_string(),
            temperature: 0.2,
            top_p: 0.5,
            top_k: 10,
            max_tokens: 512,
            stream: true,
            ..AiConfig::default()
        };

        let request = AiRequest::from_config(&config, "document this");
        assert_eq!(request.model, "deepseek-chat");
        assert_eq!(request.temperature, 0.2);
        assert_eq!(request.top_k, 10);
        assert!(request.stream);
        assert!(request.range_violation().is_none());
    }

    #[test]
    fn test_range_violations() {
        let hot = AiRequest::new("m", "p").with_sampling(2.5, 0.9, 40);
        assert!(hot.range_violation().unwrap().contains("temperature"));

        let top_p = AiRequest::new("m", "p").with_sampling(0.7, 1.5, 40);
        assert!(top_p.range_violation().unwrap().contains("top_p"));

        let empty = AiRequest::new("m", "p").with_max_tokens(0);
        assert!(empty.range_violation().unwrap().contains("max_tokens"));
    }
}
