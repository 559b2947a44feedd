//! docforge CLI library
//!
//! Command implementations and the tree-sitter backed Java host used
//! by the `docforge` binary.

pub mod commands;
pub mod files;
pub mod java_host;
pub mod progress;

pub use commands::{ConfigCommand, GenerateCommand, HookCommand, RemoveCommand};
pub use java_host::JavaSourceHost;
pub use progress::{BatchProgress, Summary};
