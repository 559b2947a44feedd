use super::{load_host, save_host};
use crate::files::collect_java_files;
use crate::java_host::JavaSourceHost;
use crate::progress::{BatchProgress, Summary};
use anyhow::{bail, Result};
use clap::Args;
use docgen::{
    DocService, GenerateOptions, GenerationReport, GenerationStage, NodeFailure, NodeOutcome,
    Progress, ProgressObserver, SkippedNode,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Args)]
pub struct GenerateCommand {
    /// Java files or directories to document
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Replace comments that already exist
    #[arg(long)]
    pub overwrite: bool,

    /// Ask the configured AI provider, whatever `ai.enabled` says
    #[arg(long)]
    pub ai: bool,

    /// Only document elements with this simple name
    #[arg(short, long)]
    pub element: Option<String>,

    /// Report what would change without writing files
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct RemoveCommand {
    /// Java files or directories to strip
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Only strip comments under elements with this simple name
    #[arg(short, long)]
    pub element: Option<String>,

    #[arg(long)]
    pub dry_run: bool,
}

impl GenerateCommand {
    pub async fn execute(
        self,
        service: &DocService,
        progress: BatchProgress,
        cancel: CancellationToken,
    ) -> Result<Summary> {
        let files = collect_java_files(&self.paths);
        if files.is_empty() {
            bail!("No Java sources found under the given paths");
        }
        info!("Generating comments for {} files", files.len());
        progress.set_files(files.len());

        let generator = service.generator();
        let mut summary = Summary::default();

        for path in files {
            if cancel.is_cancelled() {
                summary.report.cancelled = true;
                break;
            }
            progress.start_file(&path);

            let mut host = match load_host(&path).await {
                Ok(host) => host,
                Err(e) => {
                    warn!("{:#}", e);
                    summary.files_failed.push((path, format!("{:#}", e)));
                    progress.finish_file();
                    continue;
                }
            };

            let report = match &self.element {
                Some(name) => {
                    self.generate_named(service, &mut host, name, &progress, &cancel)
                        .await?
                }
                None => {
                    let mut options = GenerateOptions::new(self.overwrite)
                        .with_cancel(cancel.clone())
                        .with_progress(Arc::new(progress.clone()));
                    if self.ai {
                        options = options.with_ai();
                    }
                    generator.generate_with(&mut host, options).await?
                }
            };
            summary.record(report);

            if save_host(&host, self.dry_run).await? {
                summary.files_changed.push(path);
            }
            progress.finish_file();
        }

        progress.finish();
        Ok(summary)
    }

    async fn generate_named(
        &self,
        service: &DocService,
        host: &mut JavaSourceHost,
        name: &str,
        progress: &BatchProgress,
        cancel: &CancellationToken,
    ) -> Result<GenerationReport> {
        let generator = service.generator();
        let mut report = GenerationReport::default();

        // Ids are reassigned after every write, so look the element up each time.
        let matches = host.find(name).len();
        for position in 0..matches {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            progress.on_progress(&Progress {
                current: position + 1,
                total: matches,
                message: format!("documenting {}", name),
            });
            let Some(id) = host.find(name).get(position).copied() else {
                break;
            };
            let outcome = if self.ai {
                generator.generate_node_by_ai(host, id, self.overwrite).await
            } else {
                generator.generate_node(host, id, self.overwrite).await
            };
            match outcome {
                Ok(NodeOutcome::Generated) => report.generated += 1,
                Ok(NodeOutcome::Skipped(reason)) => report.skipped.push(SkippedNode {
                    node: name.to_string(),
                    reason,
                }),
                Err(e) if !e.is_node_local() => return Err(e.into()),
                Err(e) => report.failures.push(NodeFailure {
                    node: name.to_string(),
                    stage: GenerationStage::Failed,
                    error: e,
                }),
            }
        }

        if matches == 0 {
            warn!("No element named {} in {}", name, host_path(host));
        }
        Ok(report)
    }
}

impl RemoveCommand {
    pub async fn execute(self, service: &DocService, progress: BatchProgress) -> Result<Summary> {
        let files = collect_java_files(&self.paths);
        if files.is_empty() {
            bail!("No Java sources found under the given paths");
        }
        progress.set_files(files.len());

        let generator = service.generator();
        let mut summary = Summary::default();

        for path in files {
            progress.start_file(&path);
            let mut host = match load_host(&path).await {
                Ok(host) => host,
                Err(e) => {
                    summary.files_failed.push((path, format!("{:#}", e)));
                    progress.finish_file();
                    continue;
                }
            };

            match &self.element {
                Some(name) => {
                    let matches = host.find(name).len();
                    for position in 0..matches {
                        let Some(id) = host.find(name).get(position).copied() else {
                            break;
                        };
                        match generator.remove_node(&mut host, id) {
                            Ok(removed) => summary.report.removed += removed,
                            Err(e) => summary.report.failures.push(NodeFailure {
                                node: name.clone(),
                                stage: GenerationStage::Writing,
                                error: e,
                            }),
                        }
                    }
                }
                None => summary.record(generator.remove(&mut host)?),
            }

            if save_host(&host, self.dry_run).await? {
                summary.files_changed.push(path);
            }
            progress.finish_file();
        }

        progress.finish();
        Ok(summary)
    }
}

fn host_path(host: &JavaSourceHost) -> String {
    use docgen::host::SourceHost;
    host.file().path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{ConfigHandle, DocConfig};

    const SOURCE: &str = "public class Repo {\n    public void save(Long id) {\n    }\n\n    public void save(String key) {\n    }\n}\n";

    fn command() -> GenerateCommand {
        GenerateCommand {
            paths: vec![PathBuf::from("Repo.java")],
            overwrite: false,
            ai: false,
            element: Some("save".to_string()),
            dry_run: true,
        }
    }

    #[tokio::test]
    async fn test_named_element_documents_every_match() {
        let service = DocService::new(ConfigHandle::new(DocConfig::default()));
        let mut host = JavaSourceHost::parse("Repo.java", SOURCE).unwrap();

        let report = command()
            .generate_named(
                &service,
                &mut host,
                "save",
                &BatchProgress::hidden(1),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(report.generated, 2);
        assert!(!report.cancelled);
        assert_eq!(host.source().matches("* save method").count(), 2);
    }

    #[tokio::test]
    async fn test_named_element_stops_when_cancelled() {
        let service = DocService::new(ConfigHandle::new(DocConfig::default()));
        let mut host = JavaSourceHost::parse("Repo.java", SOURCE).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = command()
            .generate_named(&service, &mut host, "save", &BatchProgress::hidden(1), &cancel)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.generated, 0);
        assert!(!host.is_modified());
    }
}
