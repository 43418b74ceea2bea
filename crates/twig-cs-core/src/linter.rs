//! Core linter orchestrating sniff execution over source units.

use crate::config::Config;
use crate::context::UnitContext;
use crate::parser::{normalize_tests, GenericTreeBuilder, TreeBuilder};
use crate::report::{Finding, Location, Report, Severity};
use crate::ruleset::Ruleset;
use crate::sniff::{Phase, Sniff};
use crate::token::{tokenize, Position};

use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Identity of findings produced when a unit cannot be tokenized.
pub const TOKENIZATION_ERROR: &str = "tokenization-error";
/// Identity of findings produced when a unit cannot be parsed.
pub const SYNTAX_ERROR: &str = "syntax-error";

/// Code of unit-level tokenization and syntax error findings.
pub const UNIT_ERROR_CODE: &str = "TCS000";

/// One template to lint: an identifier (usually a path) and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Identifier reported in finding locations.
    pub id: String,
    /// Full source text.
    pub text: String,
}

impl SourceUnit {
    /// Creates a new source unit.
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Builder for configuring a [`Linter`].
#[derive(Default)]
pub struct LinterBuilder {
    tree_builder: Option<Box<dyn TreeBuilder>>,
    config: Option<Config>,
    parallel: Option<bool>,
}

impl LinterBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the dialect tree builder (default: [`GenericTreeBuilder`]).
    #[must_use]
    pub fn tree_builder(mut self, builder: Box<dyn TreeBuilder>) -> Self {
        self.tree_builder = Some(builder);
        self
    }

    /// Sets the configuration used for sniff enablement and severity
    /// overrides.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Lints units in parallel (default: the configured value, else true).
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = Some(parallel);
        self
    }

    /// Builds the linter.
    #[must_use]
    pub fn build(self) -> Linter {
        let config = self.config.unwrap_or_default();
        let parallel = self.parallel.unwrap_or(config.linter.parallel);
        Linter {
            tree_builder: self
                .tree_builder
                .unwrap_or_else(|| Box::new(GenericTreeBuilder::new())),
            config,
            parallel,
        }
    }
}

/// Runs a [`Ruleset`] over source units and aggregates a [`Report`].
///
/// Each unit is processed in isolation: tokenize, run token-phase sniffs,
/// build and normalize the tree, run tree-phase sniffs. A unit that fails
/// to tokenize or parse yields a single error finding and is still counted.
///
/// Use [`Linter::builder()`] to construct a configured instance.
pub struct Linter {
    tree_builder: Box<dyn TreeBuilder>,
    config: Config,
    parallel: bool,
}

impl Default for Linter {
    fn default() -> Self {
        LinterBuilder::new().build()
    }
}

impl Linter {
    /// Creates a new builder for configuring a linter.
    #[must_use]
    pub fn builder() -> LinterBuilder {
        LinterBuilder::new()
    }

    /// Returns true if units are linted in parallel.
    #[must_use]
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Lints every unit and returns the aggregated report.
    ///
    /// Findings appear in unit order whether or not the run is parallel.
    /// A panicking sniff propagates out of this call.
    #[must_use]
    pub fn run(&self, units: &[SourceUnit], ruleset: &Ruleset) -> Report {
        info!(
            "Linting {} units with {} sniffs (dialect: {}, parallel: {})",
            units.len(),
            ruleset.len(),
            self.tree_builder.name(),
            self.parallel
        );

        let per_unit: Vec<Vec<Finding>> = if self.parallel {
            units
                .par_iter()
                .map(|unit| self.lint_unit(unit, ruleset))
                .collect()
        } else {
            units
                .iter()
                .map(|unit| self.lint_unit(unit, ruleset))
                .collect()
        };

        let mut report = Report::new();
        for findings in per_unit {
            report.add_unit(findings);
        }

        info!("Lint complete: {}", report.format_summary());
        report
    }

    /// Lints a single unit and returns its findings.
    #[must_use]
    pub fn lint_unit(&self, unit: &SourceUnit, ruleset: &Ruleset) -> Vec<Finding> {
        debug!("Linting: {}", unit.id);
        let ctx = UnitContext::new(&unit.id, &unit.text);

        let tokens = match tokenize(&unit.text) {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("Failed to tokenize {}: {}", unit.id, e);
                return vec![unit_error(
                    &ctx,
                    UNIT_ERROR_CODE,
                    TOKENIZATION_ERROR,
                    e.position(),
                    e.to_string(),
                )];
            }
        };

        let mut findings = Vec::new();
        for sniff in ruleset.phase_sniffs(Phase::PreParser) {
            if let Some(found) = self.run_sniff(sniff, |s| s.check_tokens(&ctx, &tokens)) {
                findings.extend(found);
            }
        }

        let mut root = match self.tree_builder.build(&tokens) {
            Ok(root) => root,
            Err(e) => {
                warn!("Failed to parse {}: {}", unit.id, e);
                findings.push(unit_error(
                    &ctx,
                    UNIT_ERROR_CODE,
                    SYNTAX_ERROR,
                    e.position(),
                    e.to_string(),
                ));
                return findings;
            }
        };

        let normalized = normalize_tests(&mut root, self.tree_builder.test_normalizer());
        if normalized > 0 {
            debug!("Normalized {} test expressions in {}", normalized, unit.id);
        }

        for sniff in ruleset.phase_sniffs(Phase::PostParser) {
            if let Some(found) = self.run_sniff(sniff, |s| s.check_tree(&ctx, &root)) {
                findings.extend(found);
            }
        }

        findings
    }

    /// Runs one sniff unless disabled, applying any severity override.
    fn run_sniff<F>(&self, sniff: &dyn Sniff, check: F) -> Option<Vec<Finding>>
    where
        F: FnOnce(&dyn Sniff) -> Vec<Finding>,
    {
        if !self.config.is_sniff_enabled(sniff.name()) {
            debug!("Skipping disabled sniff: {}", sniff.name());
            return None;
        }
        Some(self.apply_severity_override(sniff.name(), check(sniff)))
    }

    /// Applies severity overrides from configuration.
    fn apply_severity_override(&self, name: &str, mut findings: Vec<Finding>) -> Vec<Finding> {
        if let Some(severity) = self.config.sniff_severity(name) {
            for f in &mut findings {
                f.severity = severity;
            }
        }
        findings
    }
}

fn unit_error(
    ctx: &UnitContext<'_>,
    code: &str,
    sniff: &str,
    position: Position,
    message: String,
) -> Finding {
    Finding::new(
        code,
        sniff,
        Severity::Error,
        Location::new(ctx.unit, position.line, Some(position.column)),
        message,
    )
}
