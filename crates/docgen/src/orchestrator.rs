//! Generation and removal over a file's documentable nodes.
//!
//! Every operation runs in three passes:
//! 1. a read pass that snapshots and extracts each node inside the
//!    host's read scope,
//! 2. a render pass (template or AI) that never touches the tree,
//! 3. a single write scope carrying every edit for the operation.

use crate::extractor::HandlerRegistry;
use crate::host::{preorder, preorder_from, MutationScope, SourceHost, TreeReader};
use crate::merge::{ComparatorRegistry, MergeDecision, SkipReason};
use crate::parameters::TemplateParameterProvider;
use crate::progress::{Progress, ProgressObserver, SilentProgress};
use crate::render::{RenderMode, RenderPolicy, RendererSelector};
use crate::sanitizer::{extract_comment, sanitize_generics};
use common::{DocError, DocResult, MutationError, OperationTimer};
use domain::{ConfigHandle, NodeId, NodeKind, NodeSnapshot, TemplateContext};
use infrastructure::ConfigValidator;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Where a node is in its trip through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GenerationStage {
    Idle,
    ExtractingContext,
    Rendering,
    AiPending,
    Sanitizing,
    Merging,
    Writing,
    Done,
    Failed,
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GenerationStage::Idle => "idle",
            GenerationStage::ExtractingContext => "extracting context",
            GenerationStage::Rendering => "rendering",
            GenerationStage::AiPending => "waiting for AI",
            GenerationStage::Sanitizing => "sanitizing",
            GenerationStage::Merging => "merging",
            GenerationStage::Writing => "writing",
            GenerationStage::Done => "done",
            GenerationStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct NodeFailure {
    pub node: String,
    /// Stage the node was in when it failed
    pub stage: GenerationStage,
    pub error: DocError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedNode {
    pub node: String,
    pub reason: SkipReason,
}

/// Per-item outcome of a batch operation.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub generated: usize,
    pub removed: usize,
    pub skipped: Vec<SkippedNode>,
    pub failures: Vec<NodeFailure>,
    /// Set when a cancellation stopped the batch early
    pub cancelled: bool,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    /// Fold another file's report into this one.
    pub fn absorb(&mut self, other: GenerationReport) {
        self.generated += other.generated;
        self.removed += other.removed;
        self.skipped.extend(other.skipped);
        self.failures.extend(other.failures);
        self.cancelled |= other.cancelled;
    }

    fn skip(&mut self, node: &str, reason: SkipReason) {
        debug!(node = %node, reason = %reason, "Skipping node");
        self.skipped.push(SkippedNode {
            node: node.to_string(),
            reason,
        });
    }

    fn fail(&mut self, node: &str, stage: GenerationStage, error: DocError) {
        warn!(node = %node, stage = %stage, error = %error, "Node failed");
        self.failures.push(NodeFailure {
            node: node.to_string(),
            stage,
            error,
        });
    }
}

/// Result of documenting a single element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOutcome {
    Generated,
    Skipped(SkipReason),
}

/// Knobs for one generation run.
#[derive(Clone)]
pub struct GenerateOptions {
    pub overwrite: bool,
    pub policy: RenderPolicy,
    /// Stops enqueueing further nodes once triggered
    pub cancel: CancellationToken,
    pub progress: Arc<dyn ProgressObserver>,
}

impl GenerateOptions {
    pub fn new(overwrite: bool) -> Self {
        Self {
            overwrite,
            policy: RenderPolicy::FromConfig,
            cancel: CancellationToken::new(),
            progress: Arc::new(SilentProgress),
        }
    }

    pub fn with_ai(mut self) -> Self {
        self.policy = RenderPolicy::ForceAi;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressObserver>) -> Self {
        self.progress = progress;
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum Target {
    File,
    Node(NodeId),
    Subtree(NodeId),
}

struct Planned {
    snapshot: NodeSnapshot,
    kind: NodeKind,
    context: TemplateContext,
}

struct PendingEdit {
    snapshot: NodeSnapshot,
    decision: MergeDecision,
}

/// Coordinates extraction, rendering, merging and writing.
pub struct DocGenerator {
    config: ConfigHandle,
    handlers: Arc<HandlerRegistry>,
    parameters: Arc<TemplateParameterProvider>,
    renderers: Arc<RendererSelector>,
    comparators: Arc<ComparatorRegistry>,
}

impl DocGenerator {
    pub fn new(
        config: ConfigHandle,
        handlers: Arc<HandlerRegistry>,
        parameters: Arc<TemplateParameterProvider>,
        renderers: Arc<RendererSelector>,
        comparators: Arc<ComparatorRegistry>,
    ) -> Self {
        Self {
            config,
            handlers,
            parameters,
            renderers,
            comparators,
        }
    }

    /// Document every node in the file, depth-first, parents before children.
    pub async fn generate<H: SourceHost>(
        &self,
        file: &mut H,
        overwrite: bool,
    ) -> DocResult<GenerationReport> {
        self.generate_with(file, GenerateOptions::new(overwrite)).await
    }

    pub async fn generate_with<H: SourceHost>(
        &self,
        file: &mut H,
        options: GenerateOptions,
    ) -> DocResult<GenerationReport> {
        self.run(file, Target::File, &options).await
    }

    /// Document one node. Errors are returned rather than collected.
    pub async fn generate_node<H: SourceHost>(
        &self,
        file: &mut H,
        node: NodeId,
        overwrite: bool,
    ) -> DocResult<NodeOutcome> {
        let report = self
            .run(file, Target::Node(node), &GenerateOptions::new(overwrite))
            .await?;
        single_outcome(report)
    }

    pub async fn generate_by_ai<H: SourceHost>(
        &self,
        file: &mut H,
        overwrite: bool,
    ) -> DocResult<GenerationReport> {
        self.generate_with(file, GenerateOptions::new(overwrite).with_ai())
            .await
    }

    pub async fn generate_node_by_ai<H: SourceHost>(
        &self,
        file: &mut H,
        node: NodeId,
        overwrite: bool,
    ) -> DocResult<NodeOutcome> {
        let options = GenerateOptions::new(overwrite).with_ai();
        let report = self.run(file, Target::Node(node), &options).await?;
        single_outcome(report)
    }

    /// Delete every attached comment in the file. Node bodies are untouched.
    pub fn remove<H: SourceHost>(&self, file: &mut H) -> DocResult<GenerationReport> {
        self.remove_target(file, Target::File)
    }

    /// Delete the comments of `node` and everything below it; returns
    /// how many were removed.
    pub fn remove_node<H: SourceHost>(&self, file: &mut H, node: NodeId) -> DocResult<usize> {
        let mut report = self.remove_target(file, Target::Subtree(node))?;
        match report.failures.pop() {
            Some(failure) => Err(failure.error),
            None => Ok(report.removed),
        }
    }

    fn remove_target<H: SourceHost>(
        &self,
        file: &mut H,
        target: Target,
    ) -> DocResult<GenerationReport> {
        let mut timer = OperationTimer::new("remove");
        timer.add_field("file", file.file().path.display().to_string());
        let mut report = GenerationReport::default();

        let comments: Vec<(String, NodeId)> = file.read(|tree| {
            walk(tree, target)
                .into_iter()
                .filter_map(|id| match tree.snapshot(id) {
                    Ok(snapshot) => snapshot
                        .existing_comment
                        .map(|comment| (snapshot.name, comment.id)),
                    Err(e) => {
                        report.fail(&id.to_string(), GenerationStage::ExtractingContext, e.into());
                        None
                    }
                })
                .collect()
        });

        if comments.is_empty() {
            debug!("No comments to remove");
            timer.finish();
            return Ok(report);
        }

        let outcome = file.run_scoped(|scope| {
            comments
                .iter()
                .map(|(_, comment)| scope.delete(*comment))
                .collect::<Vec<_>>()
        });

        match outcome {
            Ok(results) => {
                for ((name, _), result) in comments.iter().zip(results) {
                    match result {
                        Ok(()) => report.removed += 1,
                        Err(e) => report.fail(name, GenerationStage::Writing, e.into()),
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "Write scope rejected, no comments removed");
                for (name, _) in &comments {
                    report.fail(name, GenerationStage::Writing, scope_failure(name, &e));
                }
            }
        }

        timer.add_field("removed", report.removed);
        timer.finish();
        Ok(report)
    }

    async fn run<H: SourceHost>(
        &self,
        file: &mut H,
        target: Target,
        options: &GenerateOptions,
    ) -> DocResult<GenerationReport> {
        let mut timer = OperationTimer::new("generate");
        timer.add_field("file", file.file().path.display().to_string());

        let result = self.run_inner(file, target, options).await;
        match &result {
            Ok(report) => {
                timer.add_field("generated", report.generated);
                timer.add_field("skipped", report.skipped.len());
                timer.add_field("failed", report.failures.len());
                timer.finish();
            }
            Err(e) => timer.finish_with_result(Err::<(), _>(e)),
        }
        result
    }

    async fn run_inner<H: SourceHost>(
        &self,
        file: &mut H,
        target: Target,
        options: &GenerateOptions,
    ) -> DocResult<GenerationReport> {
        let config = self.config.snapshot();
        let validator = ConfigValidator::new();
        match self.renderers.mode(options.policy) {
            RenderMode::Ai => validator.validate_for_ai(&config)?,
            RenderMode::Template => validator.validate(&config)?,
        }

        let mut report = GenerationReport::default();
        let planned = file.read(|tree| self.plan(tree, target, options.overwrite, &mut report));

        let shared = self.parameters.shared_context(&file.file().path);
        let comparator = self.comparators.for_file_type(&file.file().file_type);
        let total = planned.len();
        let mut edits = Vec::new();

        for (index, item) in planned.into_iter().enumerate() {
            if options.cancel.is_cancelled() {
                info!(remaining = total - index, "Generation cancelled");
                report.cancelled = true;
                break;
            }
            options.progress.on_progress(&Progress {
                current: index + 1,
                total,
                message: format!("Documenting {}", item.snapshot.name),
            });

            let name = item.snapshot.name.clone();
            let text = match self.render(item.kind, &item, &shared, options).await {
                Ok(text) => text,
                Err((_, DocError::Cancelled)) => {
                    info!(node = %name, "Discarding result that arrived after cancellation");
                    report.cancelled = true;
                    break;
                }
                Err((stage, e)) => {
                    report.fail(&name, stage, e);
                    continue;
                }
            };

            match comparator.merge(&item.snapshot, &text, options.overwrite) {
                MergeDecision::Skip(reason) => report.skip(&name, reason),
                decision => edits.push(PendingEdit {
                    snapshot: item.snapshot,
                    decision,
                }),
            }
        }

        if !edits.is_empty() {
            self.write(file, edits, &mut report);
        }
        Ok(report)
    }

    /// Read pass: snapshot and extract every targeted node in pre-order.
    fn plan(
        &self,
        tree: &dyn TreeReader,
        target: Target,
        overwrite: bool,
        report: &mut GenerationReport,
    ) -> Vec<Planned> {
        let mut planned = Vec::new();

        for id in walk(tree, target) {
            let snapshot = match tree.snapshot(id) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    report.fail(&id.to_string(), GenerationStage::ExtractingContext, e.into());
                    continue;
                }
            };

            let (kind, context) = match self.handlers.extract(&snapshot) {
                Ok(extracted) => extracted,
                Err(e) => {
                    debug!(error = %e, "No handler for node");
                    report.skip(&snapshot.name, SkipReason::Unsupported);
                    continue;
                }
            };

            if !overwrite && snapshot.has_comment() {
                report.skip(&snapshot.name, SkipReason::Exists);
                continue;
            }

            planned.push(Planned {
                snapshot,
                kind,
                context,
            });
        }

        planned
    }

    /// Render pass for one node, ending with a sanitized block.
    async fn render(
        &self,
        kind: NodeKind,
        item: &Planned,
        shared: &TemplateContext,
        options: &GenerateOptions,
    ) -> Result<String, (GenerationStage, DocError)> {
        let mut context = shared.clone();
        context.extend(item.context.clone());

        let overrides = self.config.read(|c| c.templates.clone());
        let template_text = self
            .renderers
            .templates()
            .template_text(kind, &overrides)
            .map_err(|e| (GenerationStage::Rendering, e))?;

        let (mode, renderer) = self.renderers.select(options.policy);
        debug!(node = %item.snapshot.name, renderer = renderer.name(), "Rendering node");

        let text = match mode {
            RenderMode::Template => renderer
                .render(&template_text, &context, &item.snapshot)
                .await
                .map_err(|e| (GenerationStage::Rendering, e))?,
            RenderMode::Ai => {
                let snapshot = item.snapshot.clone();
                let task = tokio::spawn(async move {
                    renderer.render(&template_text, &context, &snapshot).await
                });
                let raw = match task.await {
                    Ok(result) => result,
                    Err(join_error) if join_error.is_panic() => {
                        std::panic::resume_unwind(join_error.into_panic())
                    }
                    Err(_) => Err(DocError::Cancelled),
                };
                if options.cancel.is_cancelled() {
                    return Err((GenerationStage::AiPending, DocError::Cancelled));
                }
                let raw = raw.map_err(|e| {
                    let stage = match e {
                        DocError::Render(_) => GenerationStage::Rendering,
                        _ => GenerationStage::AiPending,
                    };
                    (stage, e)
                })?;
                extract_comment(&raw)
            }
        };

        Ok(sanitize_generics(text.trim()))
    }

    /// Write pass: every edit in one scope.
    fn write<H: SourceHost>(
        &self,
        file: &mut H,
        edits: Vec<PendingEdit>,
        report: &mut GenerationReport,
    ) {
        let outcome = file.run_scoped(|scope| {
            edits
                .iter()
                .map(|edit| apply(scope, edit))
                .collect::<Vec<_>>()
        });

        match outcome {
            Ok(results) => {
                for (edit, result) in edits.iter().zip(results) {
                    match result {
                        Ok(()) => report.generated += 1,
                        Err(e) => {
                            error!(node = %edit.snapshot.name, error = %e, "Comment write rejected");
                            report.fail(&edit.snapshot.name, GenerationStage::Writing, e.into());
                        }
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "Write scope rejected, no comments written");
                for edit in &edits {
                    report.fail(
                        &edit.snapshot.name,
                        GenerationStage::Writing,
                        scope_failure(&edit.snapshot.name, &e),
                    );
                }
            }
        }
    }
}

fn walk(tree: &dyn TreeReader, target: Target) -> Vec<NodeId> {
    match target {
        Target::File => preorder(tree),
        Target::Node(id) => vec![id],
        Target::Subtree(id) => preorder_from(tree, id),
    }
}

fn apply(scope: &mut dyn MutationScope, edit: &PendingEdit) -> Result<(), MutationError> {
    match &edit.decision {
        MergeDecision::Insert(text) => {
            let reference = edit
                .snapshot
                .first_child
                .ok_or_else(|| MutationError::Rejected {
                    target: edit.snapshot.name.clone(),
                    reason: "node has no child to insert before".to_string(),
                })?;
            let comment = scope.create_comment_from_text(text)?;
            scope.insert_before(edit.snapshot.id, comment, reference)
        }
        MergeDecision::Replace { existing, text } => {
            let comment = scope.create_comment_from_text(text)?;
            scope.replace(*existing, comment)
        }
        MergeDecision::Skip(_) => Ok(()),
    }
}

fn scope_failure(node: &str, error: &MutationError) -> DocError {
    MutationError::Rejected {
        target: node.to_string(),
        reason: error.to_string(),
    }
    .into()
}

fn single_outcome(mut report: GenerationReport) -> DocResult<NodeOutcome> {
    if let Some(failure) = report.failures.pop() {
        return Err(failure.error);
    }
    if report.cancelled {
        return Err(DocError::Cancelled);
    }
    if report.generated > 0 {
        return Ok(NodeOutcome::Generated);
    }
    Ok(NodeOutcome::Skipped(
        report
            .skipped
            .pop()
            .map(|s| s.reason)
            .unwrap_or(SkipReason::Blank),
    ))
}
