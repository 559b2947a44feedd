//! In-memory host for exercising the pipeline without a parser.

use super::{MutationScope, SourceHost, TreeReader};
use common::{ExtractionError, MutationError};
use domain::{FileRef, NodeId, NodeSnapshot};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Edit applied to a [`MemoryHost`], in commit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedMutation {
    Created { id: NodeId, text: String },
    Replaced { old: NodeId, new: NodeId },
    Inserted { anchor: NodeId, new: NodeId, reference: NodeId },
    Deleted { node: NodeId },
}

#[derive(Debug, Clone)]
struct MemoryNode {
    template: NodeSnapshot,
    children: Vec<NodeId>,
    body: NodeId,
    comment: Option<NodeId>,
}

#[derive(Debug, Clone)]
enum StagedEdit {
    Replace { old: NodeId, new: NodeId },
    Insert { anchor: NodeId, new: NodeId, reference: NodeId },
    Delete { node: NodeId },
}

/// A tree of documentable nodes held in memory.
///
/// Every committed edit is recorded so tests can assert exactly what
/// was written, or that nothing was.
#[derive(Debug)]
pub struct MemoryHost {
    file: FileRef,
    roots: Vec<NodeId>,
    nodes: BTreeMap<NodeId, MemoryNode>,
    comments: HashMap<NodeId, String>,
    comment_owner: HashMap<NodeId, NodeId>,
    next_id: u64,
    mutations: Vec<RecordedMutation>,
    write_scopes: usize,
    rejected: HashSet<NodeId>,
    fail_commit: bool,
}

impl MemoryHost {
    pub fn new(file: FileRef) -> Self {
        Self {
            file,
            roots: Vec::new(),
            nodes: BTreeMap::new(),
            comments: HashMap::new(),
            comment_owner: HashMap::new(),
            next_id: 1,
            mutations: Vec::new(),
            write_scopes: 0,
            rejected: HashSet::new(),
            fail_commit: false,
        }
    }

    fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert_node(&mut self, node: NodeSnapshot) -> NodeId {
        let id = self.allocate();
        let body = self.allocate();
        let mut template = node;
        template.id = id;
        if template.file_path.as_os_str().is_empty() {
            template.file_path = self.file.path.clone();
        }
        let comment = template.existing_comment.take().map(|existing| existing.text);

        self.nodes.insert(
            id,
            MemoryNode {
                template,
                children: Vec::new(),
                body,
                comment: None,
            },
        );
        if let Some(text) = comment {
            self.attach_comment(id, text);
        }
        id
    }

    /// Add a top-level node; the id on `node` is replaced by a fresh one.
    pub fn add_root(&mut self, node: NodeSnapshot) -> NodeId {
        let id = self.insert_node(node);
        self.roots.push(id);
        id
    }

    pub fn add_child(&mut self, parent: NodeId, node: NodeSnapshot) -> NodeId {
        let id = self.insert_node(node);
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.push(id);
        }
        id
    }

    /// Attach a comment directly, bypassing the write scope.
    pub fn attach_comment(&mut self, node: NodeId, text: impl Into<String>) -> NodeId {
        let comment = self.allocate();
        self.comments.insert(comment, text.into());
        self.comment_owner.insert(comment, node);
        if let Some(entry) = self.nodes.get_mut(&node) {
            if let Some(previous) = entry.comment.replace(comment) {
                self.comments.remove(&previous);
                self.comment_owner.remove(&previous);
            }
        }
        comment
    }

    pub fn comment_of(&self, node: NodeId) -> Option<&str> {
        let comment = self.nodes.get(&node)?.comment?;
        self.comments.get(&comment).map(String::as_str)
    }

    /// Find a node by simple name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.template.name == name)
            .map(|(id, _)| *id)
    }

    pub fn mutations(&self) -> &[RecordedMutation] {
        &self.mutations
    }

    /// Number of write scopes opened so far.
    pub fn write_scopes(&self) -> usize {
        self.write_scopes
    }

    /// Reject every edit that targets `node`.
    pub fn reject_edits_for(&mut self, node: NodeId) {
        self.rejected.insert(node);
    }

    /// Make the next write scope fail as a whole.
    pub fn fail_next_commit(&mut self) {
        self.fail_commit = true;
    }

    fn commit(&mut self, created: Vec<(NodeId, String)>, staged: Vec<StagedEdit>) {
        for (id, text) in created {
            self.mutations.push(RecordedMutation::Created {
                id,
                text: text.clone(),
            });
            self.comments.insert(id, text);
        }

        for edit in staged {
            match edit {
                StagedEdit::Replace { old, new } => {
                    if let Some(owner) = self.comment_owner.remove(&old) {
                        self.comments.remove(&old);
                        self.comment_owner.insert(new, owner);
                        if let Some(node) = self.nodes.get_mut(&owner) {
                            node.comment = Some(new);
                        }
                    }
                    self.mutations.push(RecordedMutation::Replaced { old, new });
                }
                StagedEdit::Insert {
                    anchor,
                    new,
                    reference,
                } => {
                    self.comment_owner.insert(new, anchor);
                    if let Some(node) = self.nodes.get_mut(&anchor) {
                        if let Some(previous) = node.comment.replace(new) {
                            self.comments.remove(&previous);
                            self.comment_owner.remove(&previous);
                        }
                    }
                    self.mutations.push(RecordedMutation::Inserted {
                        anchor,
                        new,
                        reference,
                    });
                }
                StagedEdit::Delete { node } => {
                    self.comments.remove(&node);
                    if let Some(owner) = self.comment_owner.remove(&node) {
                        if let Some(entry) = self.nodes.get_mut(&owner) {
                            entry.comment = None;
                        }
                    }
                    self.mutations.push(RecordedMutation::Deleted { node });
                }
            }
        }
    }
}

impl TreeReader for MemoryHost {
    fn roots(&self) -> Vec<NodeId> {
        self.roots.clone()
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn snapshot(&self, node: NodeId) -> Result<NodeSnapshot, ExtractionError> {
        let entry = self
            .nodes
            .get(&node)
            .ok_or_else(|| ExtractionError::NodeNotFound(node.to_string()))?;

        let mut snapshot = entry.template.clone().with_first_child(entry.body);
        if let Some(comment) = entry.comment {
            if let Some(text) = self.comments.get(&comment) {
                snapshot = snapshot.with_comment(comment, text.clone());
            }
        }
        Ok(snapshot)
    }
}

struct MemoryScope<'a> {
    host: &'a MemoryHost,
    next_id: u64,
    created: Vec<(NodeId, String)>,
    staged: Vec<StagedEdit>,
}

impl MemoryScope<'_> {
    fn is_new(&self, id: NodeId) -> bool {
        self.created.iter().any(|(created, _)| *created == id)
    }

    fn check_target(&self, node: NodeId) -> Result<(), MutationError> {
        if self.host.rejected.contains(&node) {
            return Err(MutationError::Rejected {
                target: node.to_string(),
                reason: "node is read-only".to_string(),
            });
        }
        Ok(())
    }

    fn require_new(&self, id: NodeId) -> Result<(), MutationError> {
        if self.is_new(id) {
            Ok(())
        } else {
            Err(MutationError::UnknownNode(id.to_string()))
        }
    }
}

impl MutationScope for MemoryScope<'_> {
    fn create_comment_from_text(&mut self, text: &str) -> Result<NodeId, MutationError> {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.created.push((id, text.to_string()));
        Ok(id)
    }

    fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), MutationError> {
        let owner = self
            .host
            .comment_owner
            .get(&old)
            .copied()
            .ok_or_else(|| MutationError::UnknownNode(old.to_string()))?;
        self.check_target(owner)?;
        self.require_new(new)?;
        self.staged.push(StagedEdit::Replace { old, new });
        Ok(())
    }

    fn insert_before(
        &mut self,
        anchor: NodeId,
        new: NodeId,
        reference_child: NodeId,
    ) -> Result<(), MutationError> {
        let node = self
            .host
            .nodes
            .get(&anchor)
            .ok_or_else(|| MutationError::UnknownNode(anchor.to_string()))?;
        if node.body != reference_child {
            return Err(MutationError::Rejected {
                target: anchor.to_string(),
                reason: format!("{} is not the first child", reference_child),
            });
        }
        self.check_target(anchor)?;
        self.require_new(new)?;
        self.staged.push(StagedEdit::Insert {
            anchor,
            new,
            reference: reference_child,
        });
        Ok(())
    }

    fn delete(&mut self, node: NodeId) -> Result<(), MutationError> {
        let owner = self
            .host
            .comment_owner
            .get(&node)
            .copied()
            .ok_or_else(|| MutationError::UnknownNode(node.to_string()))?;
        self.check_target(owner)?;
        self.staged.push(StagedEdit::Delete { node });
        Ok(())
    }
}

impl SourceHost for MemoryHost {
    fn file(&self) -> &FileRef {
        &self.file
    }

    fn read<R>(&self, action: impl FnOnce(&dyn TreeReader) -> R) -> R {
        action(self)
    }

    fn run_scoped<R>(
        &mut self,
        action: impl FnOnce(&mut dyn MutationScope) -> R,
    ) -> Result<R, MutationError> {
        self.write_scopes += 1;

        let mut scope = MemoryScope {
            host: self,
            next_id: self.next_id,
            created: Vec::new(),
            staged: Vec::new(),
        };
        let result = action(&mut scope);
        let MemoryScope {
            next_id,
            created,
            staged,
            ..
        } = scope;

        if self.fail_commit {
            self.fail_commit = false;
            return Err(MutationError::Conflict(format!(
                "{} changed during the write scope",
                self.file.path.display()
            )));
        }

        self.next_id = next_id;
        self.commit(created, staged);
        Ok(result)
    }
}
