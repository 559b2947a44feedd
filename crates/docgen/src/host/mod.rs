//! Facilities the pipeline consumes from whatever owns the syntax tree.
//!
//! Reads happen inside [`SourceHost::read`]; every edit for one logical
//! operation is issued inside a single [`SourceHost::run_scoped`] call so
//! observers never see a half-applied batch.

use common::{ExtractionError, MutationError};
use domain::{FileRef, NodeId, NodeSnapshot};

pub mod memory;

pub use memory::{MemoryHost, RecordedMutation};

/// Read-only view of one file's tree, valid for the duration of a read scope.
pub trait TreeReader {
    /// Documentable nodes at the top of the file, in source order.
    fn roots(&self) -> Vec<NodeId>;

    /// Documentable children of `node`, in source order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn snapshot(&self, node: NodeId) -> Result<NodeSnapshot, ExtractionError>;
}

/// Edits available inside a write scope.
pub trait MutationScope {
    /// Build a detached comment node from its text.
    fn create_comment_from_text(&mut self, text: &str) -> Result<NodeId, MutationError>;

    /// Swap `old` for `new` in place.
    fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), MutationError>;

    /// Attach `new` to `anchor`, directly before its child `reference_child`.
    fn insert_before(
        &mut self,
        anchor: NodeId,
        new: NodeId,
        reference_child: NodeId,
    ) -> Result<(), MutationError>;

    fn delete(&mut self, node: NodeId) -> Result<(), MutationError>;
}

/// One source file together with its read and write scopes.
pub trait SourceHost {
    fn file(&self) -> &FileRef;

    /// Run `action` inside a read-safe scope.
    fn read<R>(&self, action: impl FnOnce(&dyn TreeReader) -> R) -> R;

    /// Run `action` inside a write scope. Edits become visible together
    /// when the scope ends; an `Err` means none of them were applied.
    fn run_scoped<R>(
        &mut self,
        action: impl FnOnce(&mut dyn MutationScope) -> R,
    ) -> Result<R, MutationError>;
}

/// Pre-order walk: each node, then its documentable children.
pub fn preorder(tree: &dyn TreeReader) -> Vec<NodeId> {
    let mut order = Vec::new();
    let mut stack: Vec<NodeId> = tree.roots().into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        order.push(node);
        stack.extend(tree.children(node).into_iter().rev());
    }
    order
}

/// Pre-order walk of the subtree rooted at `root`.
pub fn preorder_from(tree: &dyn TreeReader, root: NodeId) -> Vec<NodeId> {
    let mut order = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        order.push(node);
        stack.extend(tree.children(node).into_iter().rev());
    }
    order
}
