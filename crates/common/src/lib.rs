pub mod errors;
pub mod structured_logging;

pub use structured_logging::{
    init_structured_logging,
    LoggingConfig,
    StructuredLogEntry,
    ExecutionContext,
    OperationTimer,
};

pub use errors::{
    DocError, DocResult, ProviderResult, ConfigResult,
    ExtractionError,
    RenderError,
    ProviderError,
    MutationError,
    ConfigError,
};
