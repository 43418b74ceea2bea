//! Sniff to limit how deeply block tags nest.
//!
//! # Configuration
//!
//! - `max`: Maximum nesting depth of body tags (default: 5)

use crate::options;
use twig_cs_core::{
    walk_node, ConfigurationError, Finding, NodeKind, Phase, Severity, Sniff, SniffConfig,
    TreeNode, UnitContext, Visit,
};

/// Sniff code for max-nesting.
pub const CODE: &str = "TCS103";

/// Sniff name for max-nesting.
pub const NAME: &str = "max-nesting";

/// Default maximum nesting depth.
pub const DEFAULT_MAX: usize = 5;

/// Reports blocks nested deeper than a maximum.
#[derive(Debug, Clone)]
pub struct MaxNesting {
    max: usize,
    severity: Severity,
}

impl Default for MaxNesting {
    fn default() -> Self {
        Self::new()
    }
}

impl MaxNesting {
    /// Creates a new sniff with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max: DEFAULT_MAX,
            severity: Severity::Warning,
        }
    }

    /// Creates the sniff from its configuration section.
    ///
    /// # Errors
    ///
    /// Returns an error if `max` is not a positive integer.
    pub fn from_config(config: Option<&SniffConfig>) -> Result<Self, ConfigurationError> {
        Self::from_config_with_max(config, DEFAULT_MAX)
    }

    /// Like [`MaxNesting::from_config`], with `default_max` used when the
    /// section does not set `max`.
    ///
    /// # Errors
    ///
    /// Returns an error if `max` is set but not a positive integer.
    pub fn from_config_with_max(
        config: Option<&SniffConfig>,
        default_max: usize,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self::new().max(options::positive_int(config, NAME, "max", default_max)?))
    }

    /// Sets the maximum nesting depth.
    #[must_use]
    pub fn max(mut self, max: usize) -> Self {
        self.max = max;
        self
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// Tracks block depth independently of tree depth, since bodies and
/// branches sit between nested blocks.
struct NestingVisitor<'s, 'c> {
    sniff: &'s MaxNesting,
    ctx: &'c UnitContext<'c>,
    blocks: usize,
    findings: Vec<Finding>,
}

impl Visit for NestingVisitor<'_, '_> {
    fn visit_node(&mut self, node: &TreeNode, depth: usize) {
        if !node.is(&NodeKind::Block) {
            walk_node(self, node, depth);
            return;
        }

        self.blocks += 1;
        if self.blocks > self.sniff.max {
            let start = node.span.start;
            self.findings.push(Finding::new(
                CODE,
                NAME,
                self.sniff.severity,
                self.ctx.location(start.line, Some(start.column)),
                format!(
                    "Block nesting depth {} exceeds {}",
                    self.blocks, self.sniff.max
                ),
            ));
        }
        walk_node(self, node, depth);
        self.blocks -= 1;
    }
}

impl Sniff for MaxNesting {
    fn name(&self) -> &str {
        NAME
    }

    fn code(&self) -> &str {
        CODE
    }

    fn description(&self) -> &str {
        "Limits how deeply block tags may nest"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn phase(&self) -> Phase {
        Phase::PostParser
    }

    fn check_tree(&self, ctx: &UnitContext<'_>, root: &TreeNode) -> Vec<Finding> {
        let mut visitor = NestingVisitor {
            sniff: self,
            ctx,
            blocks: 0,
            findings: Vec::new(),
        };
        visitor.visit_node(root, 0);
        visitor.findings
    }
}
