use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use domain::DocConfig;
use infrastructure::{ConfigLoader, ConfigSource, ConfigValidator};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show the configuration in effect, secrets masked
    Show,

    /// Print an example configuration
    #[command(alias = "gen")]
    Example {
        /// Output format (toml or json)
        #[arg(short, long, default_value = "toml")]
        format: String,
    },

    /// Validate the configuration in effect
    #[command(alias = "check")]
    Validate,

    /// Write an example configuration to the current directory
    Init {
        #[arg(short, long, default_value = ".docforge.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub async fn execute(&self, loader: &ConfigLoader, explicit: Option<&Path>) -> Result<()> {
        match &self.command {
            ConfigSubcommand::Show => self.show_config(loader, explicit).await,
            ConfigSubcommand::Example { format } => self.print_example(format),
            ConfigSubcommand::Validate => self.validate_config(loader, explicit).await,
            ConfigSubcommand::Init { output, force } => self.init_config(output, *force).await,
        }
    }

    async fn load(loader: &ConfigLoader, explicit: Option<&Path>) -> Result<(DocConfig, ConfigSource)> {
        match explicit {
            Some(path) => Ok((loader.load_from(path).await?, ConfigSource::File(path.to_path_buf()))),
            None => loader.load_with_source().await,
        }
    }

    async fn show_config(&self, loader: &ConfigLoader, explicit: Option<&Path>) -> Result<()> {
        let (config, source) = Self::load(loader, explicit).await?;
        match source {
            ConfigSource::File(path) => println!("# Loaded from {}", path.display()),
            ConfigSource::Default => println!("# No configuration file found, showing defaults"),
        }
        println!("{}", toml::to_string_pretty(&config.redacted())?);
        Ok(())
    }

    fn print_example(&self, format: &str) -> Result<()> {
        let example = ConfigLoader::generate_example_config();
        let content = match format {
            "json" => {
                let config: DocConfig = toml::from_str(&example)?;
                serde_json::to_string_pretty(&config)?
            }
            "toml" => example,
            other => bail!("Unknown format '{}', expected toml or json", other),
        };
        println!("{}", content);
        Ok(())
    }

    async fn validate_config(&self, loader: &ConfigLoader, explicit: Option<&Path>) -> Result<()> {
        info!("Validating configuration...");
        let (config, _) = Self::load(loader, explicit).await?;

        match ConfigValidator::new().validate(&config) {
            Ok(()) => {
                println!("{} Configuration is valid", "✓".green().bold());
                Ok(())
            }
            Err(e) => {
                println!("{} Configuration validation failed:", "✗".red().bold());
                println!("   {}", e);
                Err(e.into())
            }
        }
    }

    async fn init_config(&self, output: &Path, force: bool) -> Result<()> {
        if output.exists() && !force {
            warn!("Configuration file already exists at: {}", output.display());
            println!("Configuration file already exists at {}", output.display());
            println!("   Use --force to overwrite");
            return Ok(());
        }

        tokio::fs::write(output, ConfigLoader::generate_example_config()).await?;
        info!("Configuration file generated at: {}", output.display());

        println!("{} Created {}", "✓".green().bold(), output.display());
        println!("   1. Set your name as author");
        println!("   2. Add an API key and set ai.enabled = true to use a model");
        println!("   3. Run 'docforge config validate' to check the result");
        Ok(())
    }
}
