//! JavaDoc generation pipeline.
//!
//! A [`DocGenerator`] walks the documentable nodes a [`SourceHost`]
//! exposes, builds a template context for each, renders a comment with
//! either the deterministic templates or an AI provider, cleans the
//! result up and writes it back in a single scoped edit.

pub mod extractor;
pub mod host;
pub mod merge;
pub mod orchestrator;
pub mod parameters;
pub mod progress;
pub mod prompt;
pub mod render;
pub mod sanitizer;
pub mod service;
pub mod triggers;

pub use extractor::{ClassHandler, ElementHandler, FieldHandler, HandlerRegistry, MethodHandler};
pub use host::{MemoryHost, MutationScope, SourceHost, TreeReader};
pub use merge::{CommentComparator, ComparatorRegistry, JavaDocComparator, MergeDecision, SkipReason};
pub use orchestrator::{
    DocGenerator, GenerateOptions, GenerationReport, GenerationStage, NodeFailure, NodeOutcome,
    SkippedNode,
};
pub use parameters::TemplateParameterProvider;
pub use progress::{Progress, ProgressObserver, SilentProgress};
pub use render::{
    AiPromptRenderer, MacroTemplateRenderer, RenderMode, RenderPolicy, RendererSelector,
    TemplateRenderer,
};
pub use sanitizer::{extract_comment, sanitize_generics};
pub use service::{DocService, DocServiceBuilder};
pub use triggers::{FileEvent, TriggerDispatcher};
