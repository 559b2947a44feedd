use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const JAVA_EXTENSION: &str = "java";

fn is_java(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(JAVA_EXTENSION))
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.') || name == "target" || name == "build")
}

/// Expand files and directories into the Java sources they contain,
/// sorted and without duplicates.
pub fn collect_java_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_java(path) {
                files.push(path.clone());
            } else {
                warn!("Skipping non-Java file: {}", path.display());
            }
            continue;
        }

        if !path.is_dir() {
            warn!("Path does not exist: {}", path.display());
            continue;
        }

        for entry in WalkDir::new(path)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
        {
            match entry {
                Ok(entry) if entry.file_type().is_file() && is_java(entry.path()) => {
                    files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => warn!("Cannot read directory entry: {}", e),
            }
        }
    }

    files.sort();
    files.dedup();
    debug!("Collected {} Java files", files.len());
    files
}
