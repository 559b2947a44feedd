use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of element kinds that carry documentation comments.
///
/// Hosts report a finer-grained kind string (interface, record,
/// constructor...) which is folded into one of these variants by
/// [`NodeKind::from_host_kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Class,
    Method,
    Field,
}

impl NodeKind {
    pub const ALL: [NodeKind; 3] = [NodeKind::Class, NodeKind::Method, NodeKind::Field];

    /// Map a host kind label onto a documentable kind, `None` if unsupported.
    pub fn from_host_kind(kind: &str) -> Option<Self> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "class" | "interface" | "enum" | "record" | "annotation" => Some(NodeKind::Class),
            "method" | "constructor" => Some(NodeKind::Method),
            "field" => Some(NodeKind::Field),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Class => "class",
            NodeKind::Method => "method",
            NodeKind::Field => "field",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
