//! Configuration file resolution with global fallback.
//!
//! The first match wins:
//!
//! 1. `--config` flag or `TWIG_CS_CONFIG` (explicit path)
//! 2. `twig-cs.toml` or `.twig-cs.toml` in the linted directory or any of
//!    its ancestors, nearest first
//! 3. `~/.twig-cs/config.toml` (global fallback)
//! 4. No config found → defaults

use std::path::{Path, PathBuf};

/// Where the configuration was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly specified via `--config`.
    Explicit(PathBuf),
    /// Found next to the templates or in an ancestor directory.
    Project(PathBuf),
    /// Loaded from the global config directory (`~/.twig-cs/`).
    Global(PathBuf),
    /// No config found; defaults will be used.
    Default,
}

impl ConfigSource {
    /// Returns the resolved path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }

    /// Returns `true` if the config was loaded from the global directory.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global(_))
    }
}

/// Project-level config file names, checked in order within a directory.
const PROJECT_CONFIG_NAMES: &[&str] = &["twig-cs.toml", ".twig-cs.toml"];

const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Resolves the configuration file for linting `target`, which may be a
/// file or a directory.
#[must_use]
pub fn resolve(target: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_inner(target, explicit, global_config_dir())
}

/// Takes `global_dir` as a parameter so tests avoid env var races.
fn resolve_inner(
    target: &Path,
    explicit: Option<&Path>,
    global_dir: Option<PathBuf>,
) -> ConfigSource {
    if let Some(p) = explicit {
        return ConfigSource::Explicit(p.to_path_buf());
    }

    let start = if target.is_file() {
        target.parent().unwrap_or(target)
    } else {
        target
    };
    // Walk real ancestors, also for `.` or `a/..` targets
    let start = std::fs::canonicalize(start).unwrap_or_else(|_| start.to_path_buf());
    for dir in start.ancestors() {
        if let Some(found) = project_config_in(dir) {
            tracing::debug!("Found project config: {}", found.display());
            return ConfigSource::Project(found);
        }
    }

    if let Some(candidate) = global_dir.map(|dir| dir.join(GLOBAL_CONFIG_NAME)) {
        if candidate.is_file() {
            tracing::debug!("Found global config: {}", candidate.display());
            return ConfigSource::Global(candidate);
        }
    }

    ConfigSource::Default
}

fn project_config_in(dir: &Path) -> Option<PathBuf> {
    PROJECT_CONFIG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Returns the global config directory: `$TWIG_CS_CONFIG_DIR`, else
/// `~/.twig-cs/`.
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("TWIG_CS_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|h| h.join(".twig-cs"))
}
