//! Project version lookup from the nearest build descriptor.

use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_VERSION: &str = "1.0.0";

const DESCRIPTOR_FILE: &str = "pom.xml";

lazy_static! {
    static ref VERSION_TAG: Regex = Regex::new(r"<version>\s*([^<]*?)\s*</version>").unwrap();
}

/// Resolves the `version` template parameter.
///
/// Walks from a start path up through its ancestors until a directory
/// holding a descriptor file is found, then takes the first
/// `<version>…</version>` value in it. Every failure falls back to
/// [`DEFAULT_VERSION`].
#[derive(Debug, Clone)]
pub struct VersionResolver {
    descriptor: String,
}

impl Default for VersionResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionResolver {
    pub fn new() -> Self {
        Self {
            descriptor: DESCRIPTOR_FILE.to_string(),
        }
    }

    pub fn with_descriptor(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
        }
    }

    pub fn resolve(&self, start: &Path) -> String {
        let Some(descriptor) = self.find_descriptor(start) else {
            debug!("No {} above {}", self.descriptor, start.display());
            return DEFAULT_VERSION.to_string();
        };

        match fs::read_to_string(&descriptor) {
            Ok(content) => parse_version(&content).unwrap_or_else(|| {
                debug!("No version tag in {}", descriptor.display());
                DEFAULT_VERSION.to_string()
            }),
            Err(e) => {
                debug!("Cannot read {}: {}", descriptor.display(), e);
                DEFAULT_VERSION.to_string()
            }
        }
    }

    /// Nearest descriptor at or above `start`.
    pub fn find_descriptor(&self, start: &Path) -> Option<PathBuf> {
        let start = if start.is_file() { start.parent()? } else { start };
        start
            .ancestors()
            .map(|dir| dir.join(&self.descriptor))
            .find(|candidate| candidate.is_file())
    }
}

/// First non-empty `<version>` value in the text.
pub fn parse_version(content: &str) -> Option<String> {
    VERSION_TAG
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .find(|v| !v.is_empty())
}
