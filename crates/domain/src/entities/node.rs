use crate::value_objects::NodeKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Opaque handle to a node in the host tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A source file as seen by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef {
    pub path: PathBuf,
    /// Key used to pick the comment comparator, e.g. `JAVA`
    pub file_type: String,
}

impl FileRef {
    pub fn new(path: impl Into<PathBuf>, file_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file_type: file_type.into(),
        }
    }

    pub fn java(path: impl Into<PathBuf>) -> Self {
        Self::new(path, "JAVA")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueParameter {
    pub name: String,
    pub type_name: String,
}

/// Documentation comment already attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingComment {
    pub id: NodeId,
    pub text: String,
}

/// Read-only facts about a documentable node, captured inside a read scope.
///
/// Snapshots are plain data so they can cross into background tasks;
/// the host tree itself never leaves the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    /// Kind label reported by the host (class, interface, constructor...)
    pub host_kind: String,
    pub name: String,
    pub file_path: PathBuf,
    /// Presentable return type; `None` for constructors
    pub return_type: Option<String>,
    pub parameters: Vec<ValueParameter>,
    pub type_parameters: Vec<String>,
    pub thrown_types: Vec<String>,
    pub field_type: Option<String>,
    pub existing_comment: Option<ExistingComment>,
    /// Insertion anchor used when no comment exists yet
    pub first_child: Option<NodeId>,
    /// Declaration source, without the attached comment
    pub source_text: String,
}

impl NodeSnapshot {
    pub fn new(id: NodeId, host_kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            host_kind: host_kind.into(),
            name: name.into(),
            file_path: PathBuf::new(),
            return_type: None,
            parameters: Vec::new(),
            type_parameters: Vec::new(),
            thrown_types: Vec::new(),
            field_type: None,
            existing_comment: None,
            first_child: None,
            source_text: String::new(),
        }
    }

    pub fn kind(&self) -> Option<NodeKind> {
        NodeKind::from_host_kind(&self.host_kind)
    }

    pub fn has_comment(&self) -> bool {
        self.existing_comment.is_some()
    }

    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = path.into();
        self
    }

    pub fn with_return_type(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = Some(return_type.into());
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.parameters.push(ValueParameter {
            name: name.into(),
            type_name: type_name.into(),
        });
        self
    }

    pub fn with_type_parameter(mut self, name: impl Into<String>) -> Self {
        self.type_parameters.push(name.into());
        self
    }

    pub fn with_thrown_type(mut self, type_name: impl Into<String>) -> Self {
        self.thrown_types.push(type_name.into());
        self
    }

    pub fn with_field_type(mut self, field_type: impl Into<String>) -> Self {
        self.field_type = Some(field_type.into());
        self
    }

    pub fn with_comment(mut self, id: NodeId, text: impl Into<String>) -> Self {
        self.existing_comment = Some(ExistingComment {
            id,
            text: text.into(),
        });
        self
    }

    pub fn with_first_child(mut self, child: NodeId) -> Self {
        self.first_child = Some(child);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source_text = source.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_builder() {
        let node = NodeSnapshot::new(NodeId(7), "constructor", "UserService")
            .with_parameter("repo", "UserRepository")
            .with_comment(NodeId(8), "/** old */");

        assert_eq!(node.kind(), Some(NodeKind::Method));
        assert!(node.has_comment());
        assert_eq!(node.parameters[0].type_name, "UserRepository");
        assert_eq!(node.id.to_string(), "#7");
    }

    #[test]
    fn test_unknown_host_kind() {
        let node = NodeSnapshot::new(NodeId(1), "initializer", "static");
        assert_eq!(node.kind(), None);
    }
}
