//! Error taxonomy for the documentation pipeline.
//!
//! Each stage of generation has its own error enum; `DocError` is the
//! umbrella type returned by the orchestrator. Batch operations record
//! node-level errors and keep going, single-element operations surface
//! them to the caller.

use thiserror::Error;

/// Top-level error type for documentation operations
#[derive(Debug, Error)]
pub enum DocError {
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("AI provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Tree mutation failed: {0}")]
    Mutation(#[from] MutationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DocError {
    /// Whether a batch operation may continue with the next node after this error.
    pub fn is_node_local(&self) -> bool {
        !matches!(self, DocError::Config(_) | DocError::Cancelled)
    }
}

/// Context extraction errors
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported element kind '{kind}' for '{name}'")]
    UnsupportedElementKind { kind: String, name: String },

    #[error("Node {0} is no longer present in the tree")]
    NodeNotFound(String),
}

/// Template rendering errors
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template '{template}' failed: {message}")]
    Template { template: String, message: String },

    #[error("No template registered for {0}")]
    MissingTemplate(String),
}

/// AI provider errors, always tagged with the provider display name
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} returned HTTP {status}: {body}")]
    Http {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} request failed: {message}")]
    Transport { provider: String, message: String },

    #[error("{provider} returned a malformed response: {message}")]
    MalformedResponse { provider: String, message: String },

    #[error("{provider} requires an API key")]
    MissingCredentials { provider: String },

    #[error("{provider} rejected the request before sending: {reason}")]
    InvalidRequest { provider: String, reason: String },

    #[error("Unknown AI provider: {0}")]
    UnknownProvider(String),
}

impl ProviderError {
    pub fn provider(&self) -> Option<&str> {
        match self {
            ProviderError::Http { provider, .. }
            | ProviderError::Transport { provider, .. }
            | ProviderError::MalformedResponse { provider, .. }
            | ProviderError::MissingCredentials { provider }
            | ProviderError::InvalidRequest { provider, .. } => Some(provider),
            ProviderError::UnknownProvider(_) => None,
        }
    }
}

/// Errors raised at the host write boundary
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("Write rejected for {target}: {reason}")]
    Rejected { target: String, reason: String },

    #[error("Unknown node handle {0}")]
    UnknownNode(String),

    #[error("Conflicting edits in one scope: {0}")]
    Conflict(String),
}

/// Configuration errors, reported before any work begins
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration value: {field}")]
    Missing { field: String },

    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("Cannot read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Cannot parse {path}: {reason}")]
    Parse { path: String, reason: String },
}

pub type DocResult<T> = Result<T, DocError>;
pub type ProviderResult<T> = Result<T, ProviderError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
