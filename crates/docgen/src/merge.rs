//! Decide what happens to a node's existing comment.

use domain::{NodeId, NodeSnapshot};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub const JAVA_FILE_TYPE: &str = "JAVA";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A comment exists and overwriting was not requested
    Exists,
    /// The regenerated block matches the existing one
    Unchanged,
    /// Rendering produced nothing
    Blank,
    /// No handler for the node's kind
    Unsupported,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::Exists => "comment exists",
            SkipReason::Unchanged => "unchanged",
            SkipReason::Blank => "blank output",
            SkipReason::Unsupported => "unsupported element",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeDecision {
    Insert(String),
    Replace { existing: NodeId, text: String },
    Skip(SkipReason),
}

/// Comment dialect for one file type.
pub trait CommentComparator: Send + Sync {
    fn file_type(&self) -> &str;

    fn has_existing_comment(&self, node: &NodeSnapshot) -> bool {
        node.existing_comment.is_some()
    }

    fn merge(&self, node: &NodeSnapshot, new_block: &str, overwrite: bool) -> MergeDecision;
}

/// `/** … */` blocks: replace wholesale or leave alone.
#[derive(Debug, Default)]
pub struct JavaDocComparator;

impl JavaDocComparator {
    fn normalize(block: &str) -> String {
        block.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

impl CommentComparator for JavaDocComparator {
    fn file_type(&self) -> &str {
        JAVA_FILE_TYPE
    }

    fn merge(&self, node: &NodeSnapshot, new_block: &str, overwrite: bool) -> MergeDecision {
        if new_block.trim().is_empty() {
            return MergeDecision::Skip(SkipReason::Blank);
        }

        match &node.existing_comment {
            None => MergeDecision::Insert(new_block.to_string()),
            Some(_) if !overwrite => MergeDecision::Skip(SkipReason::Exists),
            Some(existing) if Self::normalize(&existing.text) == Self::normalize(new_block) => {
                MergeDecision::Skip(SkipReason::Unchanged)
            }
            Some(existing) => MergeDecision::Replace {
                existing: existing.id,
                text: new_block.to_string(),
            },
        }
    }
}

/// Comparators keyed by upper-case file type.
pub struct ComparatorRegistry {
    comparators: HashMap<String, Arc<dyn CommentComparator>>,
    fallback: Arc<dyn CommentComparator>,
}

impl Default for ComparatorRegistry {
    fn default() -> Self {
        let java: Arc<dyn CommentComparator> = Arc::new(JavaDocComparator);
        let mut comparators = HashMap::new();
        comparators.insert(JAVA_FILE_TYPE.to_string(), Arc::clone(&java));
        Self {
            comparators,
            fallback: java,
        }
    }
}

impl ComparatorRegistry {
    pub fn register(&mut self, comparator: Arc<dyn CommentComparator>) {
        self.comparators
            .insert(comparator.file_type().to_ascii_uppercase(), comparator);
    }

    /// Comparator for `file_type`, or the JavaDoc one when none is registered.
    pub fn for_file_type(&self, file_type: &str) -> Arc<dyn CommentComparator> {
        self.comparators
            .get(&file_type.to_ascii_uppercase())
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }
}
