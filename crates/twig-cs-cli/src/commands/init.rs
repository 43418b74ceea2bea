//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

const CONFIG_NAME: &str = "twig-cs.toml";

pub(crate) const DEFAULT_CONFIG: &str = r#"# twig-cs configuration

# recommended | strict | minimal
preset = "recommended"

[linter]
parallel = true
extensions = ["twig"]
exclude = [
    "**/vendor/**",
    "**/node_modules/**",
]

# Each sniff can be enabled/disabled, have its severity overridden and
# take sniff-specific options.

[sniffs.line-length]
max = 120
# severity = "error"

# [sniffs.quote-style]
# enabled = true
# prefer = "single"

# [sniffs.known-tests]
# tests = ["instanceof"]

# Declarative sniffs
# [[forbid]]
# name = "no-raw-filter"
# node = "filter"
# value = "raw"
# message = "The raw filter disables escaping"
"#;

/// Runs the init command in the current directory.
pub fn run(force: bool) -> Result<()> {
    let path = write_config(Path::new("."), force)?;

    println!("Created {}", path.display());
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_NAME} to configure sniffs");
    println!("  2. Run: twig-cs check");

    Ok(())
}

fn write_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let path = dir.join(CONFIG_NAME);
    if path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }
    std::fs::write(&path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
