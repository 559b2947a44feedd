//! Save and create events that kick off generation.

use crate::host::SourceHost;
use crate::orchestrator::{DocGenerator, GenerationReport};
use common::DocResult;
use domain::ConfigHandle;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEvent {
    /// A document is about to be written to disk
    BeforeSave,
    /// A new file appeared
    Created,
}

impl fmt::Display for FileEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileEvent::BeforeSave => f.write_str("before-save"),
            FileEvent::Created => f.write_str("created"),
        }
    }
}

impl FromStr for FileEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "before-save" | "before_save" | "save" => Ok(FileEvent::BeforeSave),
            "created" | "create" => Ok(FileEvent::Created),
            other => Err(format!("unknown file event: {}", other)),
        }
    }
}

/// Routes file events to the generator.
///
/// Triggered runs never overwrite existing comments, and the listener
/// toggles are read at dispatch time.
pub struct TriggerDispatcher {
    config: ConfigHandle,
    generator: Arc<DocGenerator>,
}

impl TriggerDispatcher {
    pub fn new(config: ConfigHandle, generator: Arc<DocGenerator>) -> Self {
        Self { config, generator }
    }

    pub fn is_enabled(&self, event: FileEvent) -> bool {
        self.config.read(|c| match event {
            FileEvent::BeforeSave => c.listeners.save_enabled,
            FileEvent::Created => c.listeners.create_enabled,
        })
    }

    /// Returns `None` when the listener for `event` is switched off.
    pub async fn dispatch<H: SourceHost>(
        &self,
        event: FileEvent,
        file: &mut H,
    ) -> DocResult<Option<GenerationReport>> {
        if !self.is_enabled(event) {
            debug!(event = %event, file = %file.file().path.display(), "Listener disabled");
            return Ok(None);
        }

        info!(event = %event, file = %file.file().path.display(), "Generating comments for file event");
        let report = self.generator.generate(file, false).await?;
        Ok(Some(report))
    }
}
