use crate::value_objects::NodeKind;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Root settings object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocConfig {
    #[serde(default = "default_author")]
    pub author: String,

    /// chrono format string for the `date` parameter
    #[serde(default = "default_date_format")]
    pub date_format: String,

    #[serde(default = "default_file_type")]
    pub file_type: String,

    /// Applied after the built-in parameters, so they may shadow them
    #[serde(default)]
    pub custom_parameters: Vec<CustomParameter>,

    #[serde(default)]
    pub templates: TemplateConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub listeners: ListenerConfig,
}

impl Default for DocConfig {
    fn default() -> Self {
        Self {
            author: default_author(),
            date_format: default_date_format(),
            templates: TemplateConfig::default(),
            custom_parameters: Vec::new(),
            ai: AiConfig::default(),
            listeners: ListenerConfig::default(),
            file_type: default_file_type(),
        }
    }
}

impl DocConfig {
    /// Copy with credentials masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.ai.api_key.is_some() {
            copy.ai.api_key = Some("********".to_string());
        }
        copy
    }
}

/// Template overrides per node kind; `None` selects the built-in template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Directory searched for template files before the built-ins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl TemplateConfig {
    pub fn for_kind(&self, kind: NodeKind) -> Option<&str> {
        match kind {
            NodeKind::Class => self.class.as_deref(),
            NodeKind::Method => self.method.as_deref(),
            NodeKind::Field => self.field.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomParameter {
    pub name: String,
    pub value: String,
}

impl CustomParameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Generate missing comments before a document is saved
    #[serde(default)]
    pub save_enabled: bool,

    /// Generate comments for newly created files
    #[serde(default)]
    pub create_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub provider: ProviderKind,

    /// Overrides the vendor's default base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub stream: bool,

    #[serde(default)]
    pub reasoning: bool,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    #[serde(default)]
    pub prompts: PromptConfig,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: ProviderKind::default(),
            base_url: None,
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_tokens: default_max_tokens(),
            stream: false,
            reasoning: false,
            timeout_ms: default_timeout_ms(),
            system_prompt: None,
            prompts: PromptConfig::default(),
        }
    }
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn effective_base_url(&self) -> String {
        match &self.base_url {
            Some(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_string(),
            _ => self.provider.default_base_url().to_string(),
        }
    }
}

/// Prompt overrides per node kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl PromptConfig {
    pub fn for_kind(&self, kind: NodeKind) -> Option<&str> {
        match kind {
            NodeKind::Class => self.class.as_deref(),
            NodeKind::Method => self.method.as_deref(),
            NodeKind::Field => self.field.as_deref(),
        }
    }
}

/// Request/response shape spoken by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireShape {
    /// `POST {base}/chat/completions` with a message array
    ChatCompletions,
    /// `POST {base}/api/generate` with a single prompt
    Generate,
}

/// Supported AI vendors.
///
/// Every vendor except Ollama speaks the chat-completions shape and
/// differs only in display name and default base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProviderKind {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "qwen")]
    Qwen,
    #[serde(rename = "moonshot")]
    Moonshot,
    #[serde(rename = "zhipu")]
    Zhipu,
    #[serde(rename = "siliconflow")]
    SiliconFlow,
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible,
    #[serde(rename = "ollama")]
    Ollama,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 8] = [
        ProviderKind::OpenAi,
        ProviderKind::DeepSeek,
        ProviderKind::Qwen,
        ProviderKind::Moonshot,
        ProviderKind::Zhipu,
        ProviderKind::SiliconFlow,
        ProviderKind::OpenAiCompatible,
        ProviderKind::Ollama,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::DeepSeek => "DeepSeek",
            ProviderKind::Qwen => "Qwen",
            ProviderKind::Moonshot => "Moonshot",
            ProviderKind::Zhipu => "Zhipu",
            ProviderKind::SiliconFlow => "SiliconFlow",
            ProviderKind::OpenAiCompatible => "OpenAI-compatible",
            ProviderKind::Ollama => "Ollama",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::DeepSeek => "https://api.deepseek.com/v1",
            ProviderKind::Qwen => "https://dashscope.aliyuncs.com/compatible-mode/v1",
            ProviderKind::Moonshot => "https://api.moonshot.cn/v1",
            ProviderKind::Zhipu => "https://open.bigmodel.cn/api/paas/v4",
            ProviderKind::SiliconFlow => "https://api.siliconflow.cn/v1",
            ProviderKind::OpenAiCompatible => "http://localhost:8000/v1",
            ProviderKind::Ollama => "http://localhost:11434",
        }
    }

    pub fn wire_shape(&self) -> WireShape {
        match self {
            ProviderKind::Ollama => WireShape::Generate,
            _ => WireShape::ChatCompletions,
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderKind::Ollama | ProviderKind::OpenAiCompatible)
    }

    fn key(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Qwen => "qwen",
            ProviderKind::Moonshot => "moonshot",
            ProviderKind::Zhipu => "zhipu",
            ProviderKind::SiliconFlow => "siliconflow",
            ProviderKind::OpenAiCompatible => "openai_compatible",
            ProviderKind::Ollama => "ollama",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        let wanted = match wanted.as_str() {
            "tongyi" | "dashscope" => "qwen",
            "kimi" => "moonshot",
            "glm" | "bigmodel" => "zhipu",
            "custom" | "compatible" => "openai_compatible",
            other => other,
        };
        ProviderKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.key() == wanted)
            .ok_or_else(|| format!("unknown provider '{}'", s))
    }
}

/// Process-wide, read-mostly settings shared by every component.
///
/// Readers take a fresh look on every request so that edits made
/// through [`ConfigHandle::update`] apply to the next call.
#[derive(Debug, Clone, Default)]
pub struct ConfigHandle {
    inner: Arc<RwLock<DocConfig>>,
}

impl ConfigHandle {
    pub fn new(config: DocConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub fn snapshot(&self) -> DocConfig {
        self.inner.read().clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&DocConfig) -> R) -> R {
        f(&self.inner.read())
    }

    pub fn update(&self, f: impl FnOnce(&mut DocConfig)) {
        f(&mut self.inner.write());
    }

    pub fn ai_enabled(&self) -> bool {
        self.inner.read().ai.enabled
    }
}

fn default_author() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_default()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_file_type() -> String {
    "JAVA".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_top_k() -> u32 {
    40
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_timeout_ms() -> u64 {
    300_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DocConfig::default();
        assert_eq!(config.date_format, "%Y-%m-%d");
        assert_eq!(config.file_type, "JAVA");
        assert!(!config.ai.enabled);
        assert_eq!(config.ai.timeout_ms, 300_000);
        assert_eq!(config.ai.provider, ProviderKind::OpenAi);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: DocConfig = toml::from_str(
            r#"
author = "alice"

[ai]
enabled = true
provider = "deepseek"
model = "deepseek-chat"

[[custom_parameters]]
name = "team"
value = "platform"
"#,
        )
        .unwrap();

        assert_eq!(config.author, "alice");
        assert_eq!(config.ai.provider, ProviderKind::DeepSeek);
        assert_eq!(config.ai.top_k, 40);
        assert_eq!(config.custom_parameters[0], CustomParameter::new("team", "platform"));
        assert_eq!(config.ai.effective_base_url(), "https://api.deepseek.com/v1");
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("OpenAI".parse::<ProviderKind>(), Ok(ProviderKind::OpenAi));
        assert_eq!("kimi".parse::<ProviderKind>(), Ok(ProviderKind::Moonshot));
        assert_eq!("openai-compatible".parse::<ProviderKind>(), Ok(ProviderKind::OpenAiCompatible));
        assert!("claude-ish".parse::<ProviderKind>().is_err());
        assert_eq!(ProviderKind::Ollama.wire_shape(), WireShape::Generate);
        assert!(!ProviderKind::Ollama.requires_api_key());
    }

    #[test]
    fn test_base_url_override_is_trimmed() {
        let ai = AiConfig {
            base_url: Some("http://127.0.0.1:9000/v1/".to_string()),
            ..AiConfig::default()
        };
        assert_eq!(ai.effective_base_url(), "http://127.0.0.1:9000/v1");
    }

    #[test]
    fn test_handle_observes_updates() {
        let handle = ConfigHandle::new(DocConfig::default());
        let reader = handle.clone();
        assert!(!reader.ai_enabled());

        handle.update(|c| c.ai.enabled = true);
        assert!(reader.ai_enabled());
    }

    #[test]
    fn test_redacted_masks_key() {
        let mut config = DocConfig::default();
        config.ai.api_key = Some("sk-secret".to_string());
        assert_eq!(config.redacted().ai.api_key.as_deref(), Some("********"));
    }
}
