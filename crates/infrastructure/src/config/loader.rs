use anyhow::{anyhow, Context, Result};
use domain::config::*;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    Default,
}

pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_paths: Self::default_config_paths(),
            env_prefix: "DOCFORGE_".to_string(),
        }
    }

    /// Loader that only looks at the given paths.
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            env_prefix: "DOCFORGE_".to_string(),
        }
    }

    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.config_paths.insert(0, path);
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".docforge.toml"),
            PathBuf::from(".docforge.json"),
            PathBuf::from("docforge.toml"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("docforge").join("config.toml"));
            paths.push(config_dir.join("docforge").join("config.json"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".docforge.toml"));
        }

        paths
    }

    pub async fn load(&self) -> Result<DocConfig> {
        let (config, _) = self.load_with_source().await?;
        Ok(config)
    }

    /// First readable file wins; environment overrides are applied on top.
    pub async fn load_with_source(&self) -> Result<(DocConfig, ConfigSource)> {
        let mut config = DocConfig::default();
        let mut source = ConfigSource::Default;

        for path in &self.config_paths {
            if !path.exists() {
                continue;
            }
            match Self::load_file(path).await {
                Ok(file_config) => {
                    info!("Loaded configuration from: {}", path.display());
                    config = file_config;
                    source = ConfigSource::File(path.clone());
                    break;
                }
                Err(e) => {
                    warn!("Failed to load config from {}: {:#}", path.display(), e);
                }
            }
        }

        if source == ConfigSource::Default {
            debug!("No configuration file found, using defaults");
        }

        let config = self.apply_env_overrides(config)?;
        Ok((config, source))
    }

    /// Load one explicit file. Unlike [`ConfigLoader::load`], a broken file is an error.
    pub async fn load_from(&self, path: &Path) -> Result<DocConfig> {
        let config = Self::load_file(path)
            .await
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        self.apply_env_overrides(config)
    }

    async fn load_file(path: &Path) -> Result<DocConfig> {
        let content = fs::read_to_string(path)
            .await
            .context("Failed to read config file")?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&content).context("Failed to parse TOML config"),
            "json" => serde_json::from_str(&content).context("Failed to parse JSON config"),
            _ => toml::from_str(&content)
                .or_else(|_| serde_json::from_str(&content))
                .context("Failed to parse config file"),
        }
    }

    fn var(&self, name: &str) -> Option<String> {
        env::var(format!("{}{}", self.env_prefix, name))
            .ok()
            .filter(|value| !value.trim().is_empty())
    }

    fn apply_env_overrides(&self, mut config: DocConfig) -> Result<DocConfig> {
        if let Some(author) = self.var("AUTHOR") {
            config.author = author;
        }

        if let Some(enabled) = self.var("AI_ENABLED") {
            config.ai.enabled = parse_flag(&enabled);
        }

        if let Some(provider) = self.var("AI_PROVIDER") {
            config.ai.provider = ProviderKind::from_str(&provider)
                .map_err(|e| anyhow!("{}AI_PROVIDER: {}", self.env_prefix, e))?;
        }

        if let Some(api_key) = self.var("AI_API_KEY") {
            config.ai.api_key = Some(api_key);
        }

        if let Some(model) = self.var("AI_MODEL") {
            config.ai.model = model;
        }

        if let Some(base_url) = self.var("AI_BASE_URL") {
            config.ai.base_url = Some(base_url);
        }

        Ok(config)
    }

    pub async fn save_config(&self, config: &DocConfig, path: &Path) -> Result<()> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("toml");

        let content = match extension {
            "json" => serde_json::to_string_pretty(config)?,
            _ => toml::to_string_pretty(config)?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        fs::write(path, content).await?;
        info!("Configuration saved to: {}", path.display());

        Ok(())
    }

    pub fn generate_example_config() -> String {
        let config = DocConfig {
            author: "Jane Doe".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            templates: TemplateConfig {
                class: None,
                method: None,
                field: None,
                directory: None,
            },
            custom_parameters: vec![CustomParameter::new("team", "platform")],
            ai: AiConfig {
                enabled: false,
                provider: ProviderKind::DeepSeek,
                api_key: Some("your-api-key-here".to_string()),
                model: "deepseek-chat".to_string(),
                ..AiConfig::default()
            },
            listeners: ListenerConfig {
                save_enabled: true,
                create_enabled: false,
            },
            file_type: "JAVA".to_string(),
        };

        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| "Failed to generate example config".to_string())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
