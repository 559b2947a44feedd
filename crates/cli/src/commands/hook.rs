use super::{load_host, save_host};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use docgen::{DocService, FileEvent};
use std::path::PathBuf;
use tracing::debug;

/// Entry point for editor or VCS hooks.
#[derive(Debug, Args)]
pub struct HookCommand {
    /// `before-save` or `created`
    pub event: FileEvent,

    /// The Java file the event is about
    pub path: PathBuf,
}

impl HookCommand {
    pub async fn execute(self, service: &DocService) -> Result<bool> {
        let triggers = service.triggers();
        if !triggers.is_enabled(self.event) {
            debug!("Listener for {} is disabled", self.event);
            return Ok(true);
        }

        let mut host = load_host(&self.path).await?;
        let Some(report) = triggers.dispatch(self.event, &mut host).await? else {
            return Ok(true);
        };

        if save_host(&host, false).await? {
            println!(
                "{} {} comments added to {}",
                "✓".green().bold(),
                report.generated,
                self.path.display()
            );
        }
        for failure in &report.failures {
            eprintln!("{} {}: {}", "✗".red().bold(), failure.node, failure.error);
        }
        Ok(report.failures.is_empty())
    }
}
