//! Check command implementation.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use twig_cs_core::{Config, Linter, Report, Ruleset};
use twig_cs_sniffs::{all_sniffs, ruleset_from_config, sniff_by_name};

use crate::config_resolver::ConfigSource;
use crate::discovery::{self, Filter};
use crate::OutputFormat;

/// Command-line options of `twig-cs check`.
#[derive(Debug, Default)]
pub struct CheckOptions {
    /// Output format.
    pub format: OutputFormat,
    /// Comma-separated sniff names or codes to run exclusively.
    pub sniffs: Option<String>,
    /// Extra exclude globs, added to the configured ones.
    pub exclude: Vec<String>,
    /// Disables parallel linting.
    pub sequential: bool,
    /// Directory given by `--working-dir`; `path` is already resolved
    /// against it.
    pub working_dir: Option<PathBuf>,
}

/// Runs the check command, prints the report and returns it.
pub fn run(path: &Path, options: &CheckOptions, source: &ConfigSource) -> Result<Report> {
    let config = load_config(source)?;

    let mut ruleset = ruleset_from_config(&config).context("Invalid sniff configuration")?;
    if let Some(filter) = &options.sniffs {
        restrict(&mut ruleset, filter, &config)?;
    }

    let mut exclude = config.linter.exclude.clone();
    exclude.extend(options.exclude.iter().cloned());
    let filter = Filter::new(&config.linter.extensions, &exclude)?;
    let files = discovery::discover(path, &filter)
        .with_context(|| format!("Failed to scan {}", path.display()))?;
    // A single file is named relative to the working directory
    let id_root = match &options.working_dir {
        Some(dir) if path.is_file() => dir.as_path(),
        _ => path,
    };
    let units = discovery::load_units(id_root, &files);

    let mut builder = Linter::builder().config(config);
    if options.sequential {
        builder = builder.parallel(false);
    }
    let linter = builder.build();

    tracing::info!(
        "Linting {} files under {} with {} sniffs",
        units.len(),
        path.display(),
        ruleset.len()
    );
    let report = linter.run(&units, &ruleset);

    super::output::print(&report, options.format)?;
    Ok(report)
}

fn load_config(source: &ConfigSource) -> Result<Config> {
    let Some(path) = source.path() else {
        return Ok(Config::default());
    };
    if source.is_global() {
        tracing::info!("Using global config: {}", path.display());
    }
    Config::from_file(path).with_context(|| format!("Failed to load config: {}", path.display()))
}

/// Keeps only the sniffs selected by `filter`, adding built-in ones the
/// preset left out.
fn restrict(ruleset: &mut Ruleset, filter: &str, config: &Config) -> Result<()> {
    let codes: Vec<(String, String)> = all_sniffs()
        .iter()
        .map(|s| (s.code().to_string(), s.name().to_string()))
        .collect();

    let mut wanted = BTreeSet::new();
    for entry in filter.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let name = codes
            .iter()
            .find(|(code, _)| code == entry)
            .map_or(entry, |(_, name)| name.as_str());
        if ruleset.contains(name) {
            wanted.insert(name.to_string());
        } else if let Ok(sniff) = sniff_by_name(name, config.sniff(name)) {
            ruleset.add_sniff(sniff)?;
            wanted.insert(name.to_string());
        } else {
            tracing::warn!("Unknown sniff: {}", entry);
        }
    }

    let unwanted: Vec<String> = ruleset
        .sniffs()
        .iter()
        .map(|s| s.name().to_string())
        .filter(|name| !wanted.contains(name))
        .collect();
    for name in &unwanted {
        ruleset.remove_sniff(name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(ruleset: &Ruleset) -> Vec<&str> {
        ruleset.sniffs().into_iter().map(|s| s.name()).collect()
    }

    #[test]
    fn restrict_by_name_and_code() {
        let config = Config::default();
        let mut ruleset = ruleset_from_config(&config).unwrap();
        restrict(&mut ruleset, "line-length, TCS101", &config).unwrap();
        assert_eq!(names(&ruleset), vec!["line-length", "no-dump"]);
    }

    #[test]
    fn restrict_adds_sniffs_outside_the_preset() {
        let config = Config::parse("[sniffs.max-nesting]\nmax = 2\n").unwrap();
        let mut ruleset = ruleset_from_config(&config).unwrap();
        restrict(&mut ruleset, "max-nesting,no-such-sniff", &config).unwrap();
        assert_eq!(names(&ruleset), vec!["max-nesting"]);
    }

    #[test]
    fn restrict_keeps_forbid_rules_by_name() {
        let config = Config::parse(
            "[[forbid]]\nname = \"no-raw\"\nnode = \"filter\"\nvalue = \"raw\"\nmessage = \"m\"\n",
        )
        .unwrap();
        let mut ruleset = ruleset_from_config(&config).unwrap();
        restrict(&mut ruleset, "no-raw", &config).unwrap();
        assert_eq!(names(&ruleset), vec!["no-raw"]);
    }
}
