use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "mdx", "markdown", "rst", "adoc", "html", "htm", "tex", "org",
];

/// Whether a file found while walking a directory should be checked.
/// Files named explicitly on the command line are always checked.
pub fn is_checkable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| TEXT_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Expand command-line paths into files, walking directories while
/// honouring `.gitignore` and hidden-file rules.
///
/// Arguments keep their command-line order. Files found inside a directory
/// are sorted among themselves. A path reached twice is kept once.
pub fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut seen = HashSet::new();

    for path in paths {
        if !path.is_dir() {
            if seen.insert(path.clone()) {
                files.push(path.clone());
            }
            continue;
        }

        let mut walked = Vec::new();
        for entry in WalkBuilder::new(path).build() {
            let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
            let is_file = entry.file_type().map_or(false, |t| t.is_file());
            if is_file && is_checkable(entry.path()) {
                walked.push(entry.into_path());
            }
        }
        walked.sort();
        files.extend(walked.into_iter().filter(|f| seen.insert(f.clone())));
    }

    Ok(files)
}
