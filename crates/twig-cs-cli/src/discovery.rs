//! Template discovery.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use twig_cs_core::SourceUnit;

/// Extension and exclude filters for discovery.
#[derive(Debug)]
pub struct Filter {
    extensions: Vec<String>,
    exclude: Vec<glob::Pattern>,
}

impl Filter {
    /// Compiles exclude globs. Extensions are given without the leading dot.
    pub fn new(extensions: &[String], exclude: &[String]) -> Result<Self> {
        let exclude = exclude
            .iter()
            .map(|p| {
                glob::Pattern::new(p).with_context(|| format!("Invalid exclude pattern: {p}"))
            })
            .collect::<Result<_>>()?;
        Ok(Self {
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .collect(),
            exclude,
        })
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    fn is_excluded(&self, relative: &Path) -> bool {
        self.exclude.iter().any(|p| p.matches_path(relative))
    }
}

/// Finds template files under `root`, honoring `.gitignore`, sorted by path.
///
/// A `root` that is itself a file is returned as is, without filtering.
pub fn discover(root: &Path, filter: &Filter) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut builder = ignore::WalkBuilder::new(root);
    builder.hidden(false).git_ignore(true);

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || !filter.has_extension(path) {
            continue;
        }
        if filter.is_excluded(path.strip_prefix(root).unwrap_or(path)) {
            tracing::debug!("Excluding: {}", path.display());
            continue;
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

/// Reads files into source units identified by their path relative to
/// `root`. Unreadable files are skipped with a warning.
#[must_use]
pub fn load_units(root: &Path, files: &[PathBuf]) -> Vec<SourceUnit> {
    files
        .iter()
        .filter_map(|path| match std::fs::read_to_string(path) {
            Ok(text) => Some(SourceUnit::new(unit_id(root, path), text)),
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

fn unit_id(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(relative) if !relative.as_os_str().is_empty() => relative.display().to_string(),
        _ => path.display().to_string(),
    }
}
