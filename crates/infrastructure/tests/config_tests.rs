#[cfg(test)]
mod tests {
    use domain::config::*;
    use infrastructure::config::{ConfigLoader, ConfigSource, ConfigValidator};
    use std::env;
    use tempfile::TempDir;
    use tokio::fs;

    fn isolated(path: std::path::PathBuf, prefix: &str) -> ConfigLoader {
        ConfigLoader::with_paths(vec![path]).with_env_prefix(prefix)
    }

    #[tokio::test]
    async fn test_config_loader_from_toml() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join(".docforge.toml");

        let toml_content = r#"
author = "alice"

[[custom_parameters]]
name = "team"
value = "billing"

[ai]
enabled = true
provider = "deepseek"
api_key = "sk-test"
temperature = 0.2
max_tokens = 1024

[listeners]
save_enabled = true
"#;

        fs::write(&config_path, toml_content).await?;

        let loader = isolated(config_path.clone(), "DOCFORGE_TEST_TOML_");
        let (config, source) = loader.load_with_source().await?;

        assert_eq!(source, ConfigSource::File(config_path));
        assert_eq!(config.author, "alice");
        assert_eq!(config.ai.provider, ProviderKind::DeepSeek);
        assert_eq!(config.ai.temperature, 0.2);
        assert_eq!(config.ai.max_tokens, 1024);
        assert_eq!(config.ai.top_k, 40);
        assert!(config.listeners.save_enabled);
        assert!(!config.listeners.create_enabled);
        assert_eq!(config.custom_parameters, vec![CustomParameter::new("team", "billing")]);

        Ok(())
    }

    #[tokio::test]
    async fn test_config_loader_from_json() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join(".docforge.json");

        let json_content = r#"{
  "date_format": "%d/%m/%Y",
  "ai": { "provider": "ollama", "model": "qwen2.5-coder:7b" }
}"#;
        fs::write(&config_path, json_content).await?;

        let config = isolated(config_path, "DOCFORGE_TEST_JSON_").load().await?;
        assert_eq!(config.date_format, "%d/%m/%Y");
        assert_eq!(config.ai.provider, ProviderKind::Ollama);
        assert_eq!(config.ai.effective_base_url(), "http://localhost:11434");

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_files_use_defaults() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let loader = isolated(temp_dir.path().join("absent.toml"), "DOCFORGE_TEST_NONE_");
        let (config, source) = loader.load_with_source().await?;

        assert_eq!(source, ConfigSource::Default);
        assert!(!config.ai.enabled);
        assert_eq!(config.ai.timeout_ms, 300_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_broken_file_is_skipped_but_explicit_load_fails() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let broken = temp_dir.path().join("broken.toml");
        fs::write(&broken, "ai = [not toml").await?;

        let loader = isolated(broken.clone(), "DOCFORGE_TEST_BROKEN_");
        let (_, source) = loader.load_with_source().await?;
        assert_eq!(source, ConfigSource::Default);

        assert!(loader.load_from(&broken).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_env_overrides() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let prefix = "DOCFORGE_TEST_ENV_";

        env::set_var(format!("{prefix}AI_ENABLED"), "true");
        env::set_var(format!("{prefix}AI_PROVIDER"), "kimi");
        env::set_var(format!("{prefix}AI_API_KEY"), "sk-env");
        env::set_var(format!("{prefix}AI_MODEL"), "moonshot-v1-8k");
        env::set_var(format!("{prefix}AUTHOR"), "ci-bot");

        let config = isolated(temp_dir.path().join("none.toml"), prefix)
            .load()
            .await?;

        assert!(config.ai.enabled);
        assert_eq!(config.ai.provider, ProviderKind::Moonshot);
        assert_eq!(config.ai.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.ai.model, "moonshot-v1-8k");
        assert_eq!(config.author, "ci-bot");

        for name in ["AI_ENABLED", "AI_PROVIDER", "AI_API_KEY", "AI_MODEL", "AUTHOR"] {
            env::remove_var(format!("{prefix}{name}"));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_provider_in_env_is_rejected() {
        let prefix = "DOCFORGE_TEST_BADENV_";
        env::set_var(format!("{prefix}AI_PROVIDER"), "clippy");

        let result = ConfigLoader::with_paths(Vec::new())
            .with_env_prefix(prefix)
            .load()
            .await;
        env::remove_var(format!("{prefix}AI_PROVIDER"));

        let err = result.unwrap_err();
        assert!(err.to_string().contains("unknown provider"));
    }

    #[tokio::test]
    async fn test_save_and_reload() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join("docforge.toml");

        let mut config = DocConfig::default();
        config.author = "bob".to_string();
        config.ai.provider = ProviderKind::Zhipu;
        config.templates.method = Some("my-method.jinja".to_string());

        let loader = isolated(path.clone(), "DOCFORGE_TEST_SAVE_");
        loader.save_config(&config, &path).await?;
        let reloaded = loader.load().await?;

        assert_eq!(reloaded.author, "bob");
        assert_eq!(reloaded.ai.provider, ProviderKind::Zhipu);
        assert_eq!(reloaded.templates.method.as_deref(), Some("my-method.jinja"));
        Ok(())
    }

    #[tokio::test]
    async fn test_loaded_config_passes_validation() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let template_dir = temp_dir.path().join("templates");
        fs::create_dir_all(&template_dir).await?;

        let path = temp_dir.path().join(".docforge.toml");
        fs::write(
            &path,
            format!("[templates]\ndirectory = {:?}\n", template_dir.display().to_string()),
        )
        .await?;

        let config = isolated(path, "DOCFORGE_TEST_VALID_").load().await?;
        ConfigValidator::new().validate(&config)?;
        Ok(())
    }
}
