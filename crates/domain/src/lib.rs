//! Domain layer: the data model shared by the documentation pipeline.
//!
//! - Entities: node snapshots handed out by the host, AI requests
//! - Value objects: node kinds, template context
//! - Config: the process-wide settings object

pub mod config;
pub mod entities;
pub mod value_objects;

pub use config::{
    AiConfig, ConfigHandle, CustomParameter, DocConfig, ListenerConfig, PromptConfig,
    ProviderKind, TemplateConfig, WireShape,
};
pub use entities::{AiRequest, ExistingComment, FileRef, NodeId, NodeSnapshot, ValueParameter};
pub use value_objects::{ContextValue, NodeKind, StructuredParam, TemplateContext};
