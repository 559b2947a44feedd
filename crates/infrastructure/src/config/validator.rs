use common::{ConfigError, ConfigResult};
use domain::config::*;
use std::path::Path;
use tracing::warn;

/// Rejects settings that would make every request fail.
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, config: &DocConfig) -> ConfigResult<()> {
        self.validate_ai_config(&config.ai)?;
        self.validate_template_config(&config.templates)?;
        self.validate_parameters(config);

        if config.date_format.trim().is_empty() {
            warn!("date_format is empty, the date parameter will be blank");
        }

        Ok(())
    }

    fn validate_ai_config(&self, config: &AiConfig) -> ConfigResult<()> {
        if !(0.0..=2.0).contains(&config.temperature) {
            return Err(invalid(
                "ai.temperature",
                format!("must be between 0.0 and 2.0, got {}", config.temperature),
            ));
        }

        if !(0.0..=1.0).contains(&config.top_p) {
            return Err(invalid(
                "ai.top_p",
                format!("must be between 0.0 and 1.0, got {}", config.top_p),
            ));
        }

        if config.max_tokens == 0 {
            return Err(invalid("ai.max_tokens", "must be greater than 0"));
        }

        if config.timeout_ms == 0 {
            return Err(invalid("ai.timeout_ms", "must be greater than 0"));
        }

        if config.enabled {
            check_credentials(config)?;
        }

        if config.model.trim().is_empty() {
            warn!("ai.model is empty, the provider will pick its own default");
        }

        if config.max_tokens < 128 {
            warn!(
                "ai.max_tokens = {} may truncate generated comments",
                config.max_tokens
            );
        }

        if config.provider == ProviderKind::OpenAiCompatible && config.base_url.is_none() {
            warn!(
                "openai_compatible provider without base_url, falling back to {}",
                config.provider.default_base_url()
            );
        }

        Ok(())
    }

    /// Full validation plus the credential check, for runs that will
    /// call the AI provider whatever `ai.enabled` says.
    pub fn validate_for_ai(&self, config: &DocConfig) -> ConfigResult<()> {
        self.validate(config)?;
        check_credentials(&config.ai)
    }

    fn validate_template_config(&self, config: &TemplateConfig) -> ConfigResult<()> {
        if let Some(dir) = &config.directory {
            check_readable_dir(dir)?;
        }
        Ok(())
    }

    fn validate_parameters(&self, config: &DocConfig) {
        for param in &config.custom_parameters {
            if param.name.trim().is_empty() {
                warn!("Custom parameter with empty name will be ignored");
            } else if matches!(param.name.as_str(), "author" | "version" | "since" | "date") {
                warn!("Custom parameter '{}' shadows a built-in parameter", param.name);
            }
        }
    }
}

fn check_credentials(config: &AiConfig) -> ConfigResult<()> {
    let has_key = config
        .api_key
        .as_deref()
        .is_some_and(|key| !key.trim().is_empty());
    if config.provider.requires_api_key() && !has_key {
        return Err(ConfigError::Missing {
            field: format!("ai.api_key ({})", config.provider.display_name()),
        });
    }
    Ok(())
}

fn check_readable_dir(dir: &Path) -> ConfigResult<()> {
    let io_error = |reason: String| ConfigError::Io {
        path: dir.display().to_string(),
        reason,
    };

    if !dir.is_dir() {
        return Err(io_error("template directory does not exist".to_string()));
    }
    std::fs::read_dir(dir).map_err(|e| io_error(e.to_string()))?;
    Ok(())
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ConfigValidator::new().validate(&DocConfig::default()).is_ok());
    }

    #[test]
    fn test_out_of_range_sampling() {
        let mut config = DocConfig::default();
        config.ai.temperature = 2.5;
        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "ai.temperature"));

        let mut config = DocConfig::default();
        config.ai.top_p = 1.2;
        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "ai.top_p"));
    }

    #[test]
    fn test_zero_limits() {
        let mut config = DocConfig::default();
        config.ai.max_tokens = 0;
        assert!(ConfigValidator::new().validate(&config).is_err());

        let mut config = DocConfig::default();
        config.ai.timeout_ms = 0;
        assert!(ConfigValidator::new().validate(&config).is_err());
    }

    #[test]
    fn test_enabled_vendor_without_key() {
        let mut config = DocConfig::default();
        config.ai.enabled = true;
        config.ai.provider = ProviderKind::DeepSeek;
        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { .. }));

        config.ai.provider = ProviderKind::Ollama;
        assert!(ConfigValidator::new().validate(&config).is_ok());
    }

    #[test]
    fn test_forced_ai_needs_key_even_when_disabled() {
        let config = DocConfig::default();
        assert!(ConfigValidator::new().validate(&config).is_ok());
        assert!(matches!(
            ConfigValidator::new().validate_for_ai(&config),
            Err(ConfigError::Missing { .. })
        ));
    }

    #[test]
    fn test_missing_template_dir() {
        let mut config = DocConfig::default();
        config.templates.directory = Some("/definitely/not/here".into());
        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
