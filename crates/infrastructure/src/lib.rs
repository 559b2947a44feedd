pub mod config;
pub mod token_cache;
pub mod version;

pub use config::{ConfigLoader, ConfigSource, ConfigValidator};
pub use token_cache::TokenCache;
pub use version::{VersionResolver, DEFAULT_VERSION};
