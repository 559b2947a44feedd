use colored::Colorize;
use docgen::{GenerationReport, Progress, ProgressObserver};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

/// File-level progress bar that also shows the node being documented.
#[derive(Clone)]
pub struct BatchProgress {
    bar: ProgressBar,
}

impl BatchProgress {
    pub fn new(files: usize) -> Self {
        let bar = ProgressBar::new(files as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    /// A bar that draws nothing, for scripted runs.
    pub fn hidden(files: usize) -> Self {
        let bar = ProgressBar::with_draw_target(Some(files as u64), ProgressDrawTarget::hidden());
        Self { bar }
    }

    pub fn set_files(&self, files: usize) {
        self.bar.set_length(files as u64);
    }

    pub fn start_file(&self, path: &std::path::Path) {
        self.bar.set_message(path.display().to_string());
    }

    pub fn finish_file(&self) {
        self.bar.inc(1);
    }

    pub fn println(&self, line: impl AsRef<str>) {
        self.bar.println(line);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressObserver for BatchProgress {
    fn on_progress(&self, progress: &Progress) {
        self.bar.set_message(format!(
            "{} ({}/{})",
            progress.message, progress.current, progress.total
        ));
    }
}

/// Totals across every file in a run.
#[derive(Debug, Default)]
pub struct Summary {
    pub report: GenerationReport,
    pub files_changed: Vec<PathBuf>,
    pub files_failed: Vec<(PathBuf, String)>,
}

impl Summary {
    pub fn record(&mut self, report: GenerationReport) {
        self.report.absorb(report);
    }

    pub fn is_success(&self) -> bool {
        self.files_failed.is_empty() && self.report.failures.is_empty()
    }

    pub fn print(&self) {
        let report = &self.report;
        println!();
        if report.generated > 0 {
            println!("{} {} comments written", "✓".green().bold(), report.generated);
        }
        if report.removed > 0 {
            println!("{} {} comments removed", "✓".green().bold(), report.removed);
        }
        if !report.skipped.is_empty() {
            println!("{} {} elements skipped", "•".yellow(), report.skipped.len());
        }
        for failure in &report.failures {
            println!(
                "{} {} failed while {}: {}",
                "✗".red().bold(),
                failure.node.bold(),
                failure.stage,
                failure.error
            );
        }
        for (path, error) in &self.files_failed {
            println!("{} {}: {}", "✗".red().bold(), path.display(), error);
        }
        if report.cancelled {
            println!("{}", "Cancelled before every element was processed".yellow());
        }
        println!(
            "{} files changed",
            self.files_changed.len().to_string().cyan().bold()
        );
    }
}
