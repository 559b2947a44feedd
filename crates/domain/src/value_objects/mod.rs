pub mod node_kind;
pub mod template_context;

pub use node_kind::NodeKind;
pub use template_context::{ContextValue, StructuredParam, TemplateContext};
