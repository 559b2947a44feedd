pub mod node;
pub mod request;

pub use node::{ExistingComment, FileRef, NodeId, NodeSnapshot, ValueParameter};
pub use request::AiRequest;
