//! Java source buffer exposed through the docgen host traits.
//!
//! The buffer is parsed with tree-sitter and indexed into declarations.
//! Edits issued inside a write scope are staged as byte-range
//! replacements and applied together when the scope ends, after which
//! the buffer is parsed again and every id is reassigned.

use anyhow::{anyhow, Result};
use common::{ExtractionError, MutationError};
use docgen::host::{MutationScope, SourceHost, TreeReader};
use domain::{FileRef, NodeId, NodeSnapshot};
use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tree_sitter::{Node, Parser};

const DOC_OPEN: &str = "/**";

fn host_kind(ts_kind: &str) -> Option<&'static str> {
    match ts_kind {
        "class_declaration" => Some("class"),
        "interface_declaration" => Some("interface"),
        "enum_declaration" => Some("enum"),
        "record_declaration" => Some("record"),
        "annotation_type_declaration" => Some("annotation"),
        "method_declaration" => Some("method"),
        "constructor_declaration" | "compact_constructor_declaration" => Some("constructor"),
        "field_declaration" | "constant_declaration" => Some("field"),
        _ => None,
    }
}

fn is_type_declaration(ts_kind: &str) -> bool {
    matches!(
        ts_kind,
        "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration"
            | "annotation_type_declaration"
    )
}

fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or_default()
}

#[derive(Debug, Clone)]
struct Declaration {
    snapshot: NodeSnapshot,
    children: Vec<NodeId>,
    start: usize,
    comment: Option<Range<usize>>,
    indent: String,
}

/// Declarations of one parse, keyed by the ids handed out for it.
#[derive(Debug, Default)]
struct DeclarationIndex {
    roots: Vec<NodeId>,
    declarations: HashMap<NodeId, Declaration>,
    /// Comment id to the declaration it documents
    comments: HashMap<NodeId, NodeId>,
    next_id: u64,
}

impl DeclarationIndex {
    fn build(source: &str, root: Node<'_>, path: &Path) -> Self {
        let mut builder = IndexBuilder {
            source,
            path,
            index: DeclarationIndex {
                next_id: 1,
                ..DeclarationIndex::default()
            },
        };

        let mut cursor = root.walk();
        let top: Vec<Node<'_>> = root.named_children(&mut cursor).collect();
        for node in top {
            if let Some(id) = builder.visit(node) {
                builder.index.roots.push(id);
            }
        }
        builder.index
    }

    fn declaration(&self, id: NodeId) -> Option<&Declaration> {
        self.declarations.get(&id)
    }

    fn owner_of_comment(&self, comment: NodeId) -> Option<&Declaration> {
        self.comments
            .get(&comment)
            .and_then(|owner| self.declarations.get(owner))
    }
}

impl TreeReader for DeclarationIndex {
    fn roots(&self) -> Vec<NodeId> {
        self.roots.clone()
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.declarations
            .get(&node)
            .map(|d| d.children.clone())
            .unwrap_or_default()
    }

    fn snapshot(&self, node: NodeId) -> Result<NodeSnapshot, ExtractionError> {
        self.declarations
            .get(&node)
            .map(|d| d.snapshot.clone())
            .ok_or_else(|| ExtractionError::NodeNotFound(node.to_string()))
    }
}

struct IndexBuilder<'a> {
    source: &'a str,
    path: &'a Path,
    index: DeclarationIndex,
}

impl IndexBuilder<'_> {
    fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.index.next_id);
        self.index.next_id += 1;
        id
    }

    fn visit(&mut self, node: Node<'_>) -> Option<NodeId> {
        let kind = host_kind(node.kind())?;
        let name = declared_name(node, self.source)?;

        let id = self.allocate();
        let body = self.allocate();
        let mut snapshot = NodeSnapshot::new(id, kind, name)
            .with_file_path(self.path)
            .with_first_child(body)
            .with_source(text(node, self.source));

        for type_param in type_parameters(node, self.source) {
            snapshot = snapshot.with_type_parameter(type_param);
        }
        match kind {
            "method" | "constructor" => {
                if let Some(ret) = node.child_by_field_name("type") {
                    snapshot = snapshot.with_return_type(text(ret, self.source));
                }
                for (name, type_name) in value_parameters(node, self.source) {
                    snapshot = snapshot.with_parameter(name, type_name);
                }
                for thrown in thrown_types(node, self.source) {
                    snapshot = snapshot.with_thrown_type(thrown);
                }
            }
            "field" => {
                if let Some(field_type) = node.child_by_field_name("type") {
                    snapshot = snapshot.with_field_type(text(field_type, self.source));
                }
            }
            _ => {}
        }

        let comment = doc_comment(node, self.source);
        if let Some(range) = &comment {
            let comment_id = self.allocate();
            snapshot = snapshot.with_comment(comment_id, &self.source[range.clone()]);
            self.index.comments.insert(comment_id, id);
        }

        let children = if is_type_declaration(node.kind()) {
            members(node)
                .into_iter()
                .filter_map(|member| self.visit(member))
                .collect()
        } else {
            Vec::new()
        };

        let start = node.start_byte();
        self.index.declarations.insert(
            id,
            Declaration {
                snapshot,
                children,
                start,
                comment,
                indent: indentation(self.source, start),
            },
        );
        Some(id)
    }
}

fn declared_name(node: Node<'_>, source: &str) -> Option<String> {
    if let Some(name) = node.child_by_field_name("name") {
        return Some(text(name, source).to_string());
    }
    // Fields name their declarators instead.
    let mut cursor = node.walk();
    let names: Vec<&str> = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "variable_declarator")
        .filter_map(|declarator| declarator.child_by_field_name("name"))
        .map(|name| text(name, source))
        .collect();
    names.first().map(|first| first.to_string())
}

fn members(node: Node<'_>) -> Vec<Node<'_>> {
    let Some(body) = node.child_by_field_name("body") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        if child.kind() == "enum_body_declarations" {
            let mut inner = child.walk();
            out.extend(child.named_children(&mut inner));
        } else {
            out.push(child);
        }
    }
    out
}

fn type_parameters(node: Node<'_>, source: &str) -> Vec<String> {
    let mut cursor = node.walk();
    let Some(params) = node
        .children(&mut cursor)
        .find(|child| child.kind() == "type_parameters")
    else {
        return Vec::new();
    };

    let mut cursor = params.walk();
    params
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "type_parameter")
        .filter_map(|param| {
            let mut inner = param.walk();
            let name = param
                .named_children(&mut inner)
                .find(|c| matches!(c.kind(), "type_identifier" | "identifier"))
                .map(|c| text(c, source).to_string());
            name
        })
        .collect()
}

fn value_parameters(node: Node<'_>, source: &str) -> Vec<(String, String)> {
    let Some(params) = node.child_by_field_name("parameters") else {
        return Vec::new();
    };

    let mut cursor = params.walk();
    let mut out = Vec::new();
    for param in params.named_children(&mut cursor) {
        match param.kind() {
            "formal_parameter" => {
                let name = param.child_by_field_name("name").map(|n| text(n, source));
                let type_name = param.child_by_field_name("type").map(|t| text(t, source));
                if let (Some(name), Some(type_name)) = (name, type_name) {
                    out.push((name.to_string(), type_name.to_string()));
                }
            }
            "spread_parameter" => {
                let mut inner = param.walk();
                let children: Vec<Node<'_>> = param.named_children(&mut inner).collect();
                let type_name = children
                    .iter()
                    .find(|c| !matches!(c.kind(), "modifiers" | "variable_declarator"))
                    .map(|t| format!("{}...", text(*t, source)));
                let name = children
                    .iter()
                    .find(|c| c.kind() == "variable_declarator")
                    .and_then(|d| d.child_by_field_name("name"))
                    .map(|n| text(n, source).to_string());
                if let (Some(name), Some(type_name)) = (name, type_name) {
                    out.push((name, type_name));
                }
            }
            _ => {}
        }
    }
    out
}

fn thrown_types(node: Node<'_>, source: &str) -> Vec<String> {
    let mut cursor = node.walk();
    let Some(throws) = node.children(&mut cursor).find(|c| c.kind() == "throws") else {
        return Vec::new();
    };
    let mut cursor = throws.walk();
    let thrown = throws
        .named_children(&mut cursor)
        .map(|t| text(t, source).to_string())
        .collect();
    thrown
}

/// The `/** */` block directly before a declaration.
fn doc_comment(node: Node<'_>, source: &str) -> Option<Range<usize>> {
    let previous = node.prev_sibling()?;
    if !matches!(previous.kind(), "block_comment" | "comment") {
        return None;
    }
    let body = text(previous, source);
    (body.starts_with(DOC_OPEN) && body != "/**/").then(|| previous.byte_range())
}

/// Whitespace between the start of the line and `offset`, empty when
/// something else shares the line.
fn indentation(source: &str, offset: usize) -> String {
    let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &source[line_start..offset];
    if prefix.chars().all(|c| c == ' ' || c == '\t') {
        prefix.to_string()
    } else {
        String::new()
    }
}

/// Re-indent a comment block so continuation lines line up under `/**`.
fn format_block(block: &str, indent: &str) -> String {
    let mut lines = block.trim().lines();
    let mut out = lines.next().unwrap_or_default().trim().to_string();
    for line in lines {
        let line = line.trim();
        out.push('\n');
        out.push_str(indent);
        if line.starts_with('*') {
            out.push(' ');
            out.push_str(line);
        } else if line.is_empty() {
            out.push_str(" *");
        } else {
            out.push_str(" * ");
            out.push_str(line);
        }
    }
    out
}

#[derive(Debug)]
struct TextEdit {
    range: Range<usize>,
    replacement: String,
}

struct JavaScope<'a> {
    index: &'a DeclarationIndex,
    source: &'a str,
    next_id: u64,
    created: HashMap<NodeId, String>,
    edits: Vec<TextEdit>,
}

impl JavaScope<'_> {
    fn take_created(&mut self, id: NodeId) -> Result<String, MutationError> {
        self.created
            .remove(&id)
            .ok_or_else(|| MutationError::UnknownNode(id.to_string()))
    }

    fn into_edits(mut self) -> Result<Vec<TextEdit>, MutationError> {
        self.edits.sort_by_key(|edit| edit.range.start);
        for pair in self.edits.windows(2) {
            if pair[1].range.start < pair[0].range.end
                || (pair[0].range == pair[1].range && pair[0].range.is_empty())
            {
                return Err(MutationError::Conflict(format!(
                    "overlapping edits at byte {}",
                    pair[1].range.start
                )));
            }
        }
        Ok(self.edits)
    }
}

impl MutationScope for JavaScope<'_> {
    fn create_comment_from_text(&mut self, text: &str) -> Result<NodeId, MutationError> {
        if !text.trim_start().starts_with(DOC_OPEN) {
            return Err(MutationError::Rejected {
                target: "comment".to_string(),
                reason: "not a documentation comment".to_string(),
            });
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.created.insert(id, text.to_string());
        Ok(id)
    }

    fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), MutationError> {
        let owner = self
            .index
            .owner_of_comment(old)
            .ok_or_else(|| MutationError::UnknownNode(old.to_string()))?;
        let range = owner
            .comment
            .clone()
            .ok_or_else(|| MutationError::UnknownNode(old.to_string()))?;
        let block = self.take_created(new)?;
        self.edits.push(TextEdit {
            range,
            replacement: format_block(&block, &owner.indent),
        });
        Ok(())
    }

    fn insert_before(
        &mut self,
        anchor: NodeId,
        new: NodeId,
        reference_child: NodeId,
    ) -> Result<(), MutationError> {
        let declaration = self
            .index
            .declaration(anchor)
            .ok_or_else(|| MutationError::UnknownNode(anchor.to_string()))?;
        if declaration.snapshot.first_child != Some(reference_child) {
            return Err(MutationError::Rejected {
                target: declaration.snapshot.name.clone(),
                reason: format!("{} is not the first child", reference_child),
            });
        }
        let block = self.take_created(new)?;
        let at = declaration.start;
        self.edits.push(TextEdit {
            range: at..at,
            replacement: format!(
                "{}\n{}",
                format_block(&block, &declaration.indent),
                declaration.indent
            ),
        });
        Ok(())
    }

    fn delete(&mut self, node: NodeId) -> Result<(), MutationError> {
        let owner = self
            .index
            .owner_of_comment(node)
            .ok_or_else(|| MutationError::UnknownNode(node.to_string()))?;
        let range = owner
            .comment
            .clone()
            .ok_or_else(|| MutationError::UnknownNode(node.to_string()))?;
        // Take the whitespace up to the declaration with it.
        let end = range.end
            + self.source[range.end..]
                .chars()
                .take_while(|c| c.is_whitespace())
                .map(char::len_utf8)
                .sum::<usize>();
        self.edits.push(TextEdit {
            range: range.start..end,
            replacement: String::new(),
        });
        Ok(())
    }
}

/// A Java file held in memory.
pub struct JavaSourceHost {
    file: FileRef,
    source: String,
    original: String,
    parser: Parser,
    index: DeclarationIndex,
    syntax_errors: bool,
}

impl JavaSourceHost {
    pub fn parse(path: impl Into<PathBuf>, source: impl Into<String>) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::language())
            .map_err(|e| anyhow!("failed to load the Java grammar: {:?}", e))?;

        let file = FileRef::java(path);
        let source = source.into();
        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| anyhow!("could not parse {}", file.path.display()))?;
        let syntax_errors = tree.root_node().has_error();
        if syntax_errors {
            warn!(file = %file.path.display(), "Source has syntax errors, declarations may be missing");
        }
        let index = DeclarationIndex::build(&source, tree.root_node(), &file.path);
        debug!(file = %file.path.display(), declarations = index.declarations.len(), "Indexed source");

        Ok(Self {
            file,
            original: source.clone(),
            source,
            parser,
            index,
            syntax_errors,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether any scope changed the buffer since it was parsed.
    pub fn is_modified(&self) -> bool {
        self.source != self.original
    }

    pub fn has_syntax_errors(&self) -> bool {
        self.syntax_errors
    }

    /// Every declaration with this simple name, in source order.
    pub fn find(&self, name: &str) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .index
            .declarations
            .iter()
            .filter(|(_, d)| d.snapshot.name == name)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_by_key(|id| self.index.declarations[id].start);
        ids
    }

    fn apply(&mut self, edits: Vec<TextEdit>) -> Result<(), MutationError> {
        let mut updated = self.source.clone();
        for edit in edits.iter().rev() {
            updated.replace_range(edit.range.clone(), &edit.replacement);
        }

        let tree = self.parser.parse(&updated, None).ok_or_else(|| {
            MutationError::Conflict(format!("could not re-parse {}", self.file.path.display()))
        })?;
        self.syntax_errors = tree.root_node().has_error();
        self.index = DeclarationIndex::build(&updated, tree.root_node(), &self.file.path);
        self.source = updated;
        debug!(file = %self.file.path.display(), edits = edits.len(), "Applied scoped edits");
        Ok(())
    }
}

impl SourceHost for JavaSourceHost {
    fn file(&self) -> &FileRef {
        &self.file
    }

    fn read<R>(&self, action: impl FnOnce(&dyn TreeReader) -> R) -> R {
        action(&self.index)
    }

    fn run_scoped<R>(
        &mut self,
        action: impl FnOnce(&mut dyn MutationScope) -> R,
    ) -> Result<R, MutationError> {
        let mut scope = JavaScope {
            index: &self.index,
            source: &self.source,
            next_id: self.index.next_id,
            created: HashMap::new(),
            edits: Vec::new(),
        };
        let result = action(&mut scope);
        let edits = scope.into_edits()?;
        if !edits.is_empty() {
            self.apply(edits)?;
        }
        Ok(result)
    }
}
