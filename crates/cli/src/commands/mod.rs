pub mod config;
pub mod generate;
pub mod hook;

pub use config::ConfigCommand;
pub use generate::{GenerateCommand, RemoveCommand};
pub use hook::HookCommand;

use crate::java_host::JavaSourceHost;
use anyhow::{Context, Result};
use docgen::host::SourceHost;
use std::path::Path;
use tracing::info;

pub(crate) async fn load_host(path: &Path) -> Result<JavaSourceHost> {
    let source = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    JavaSourceHost::parse(path, source)
}

/// Write the buffer back when a scope changed it. Returns whether the
/// file on disk was (or, on a dry run, would have been) updated.
pub(crate) async fn save_host(host: &JavaSourceHost, dry_run: bool) -> Result<bool> {
    if !host.is_modified() {
        return Ok(false);
    }
    let path = &host.file().path;
    if dry_run {
        info!("Dry run, not writing {}", path.display());
        return Ok(true);
    }
    tokio::fs::write(path, host.source())
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Updated {}", path.display());
    Ok(true)
}
