//! Sniff to limit line length.
//!
//! # Configuration
//!
//! - `max`: Maximum characters per line (default: 120)

use crate::options;
use twig_cs_core::{
    ConfigurationError, Finding, Phase, Severity, Sniff, SniffConfig, TokenStream, UnitContext,
};

/// Sniff code for line-length.
pub const CODE: &str = "TCS001";

/// Sniff name for line-length.
pub const NAME: &str = "line-length";

/// Default maximum line length.
pub const DEFAULT_MAX: usize = 120;

/// Reports lines longer than a maximum number of characters.
#[derive(Debug, Clone)]
pub struct LineLength {
    max: usize,
    severity: Severity,
}

impl Default for LineLength {
    fn default() -> Self {
        Self::new()
    }
}

impl LineLength {
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
        Ok(Self::new().max(options::positive_int(config, NAME, "max", DEFAULT_MAX)?))
    }

    /// Sets the maximum line length.
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

impl Sniff for LineLength {
    fn name(&self) -> &str {
        NAME
    }

    fn code(&self) -> &str {
        CODE
    }

    fn description(&self) -> &str {
        "Limits the number of characters per line"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn phase(&self) -> Phase {
        Phase::PreParser
    }

    fn check_tokens(&self, ctx: &UnitContext<'_>, _tokens: &TokenStream) -> Vec<Finding> {
        ctx.lines()
            .filter_map(|(line, text)| {
                let length = text.trim_end_matches('\r').chars().count();
                (length > self.max).then(|| {
                    Finding::new(
                        CODE,
                        NAME,
                        self.severity,
                        ctx.location(line, Some(self.max + 1)),
                        format!(
                            "Line exceeds {} characters; contains {length} characters",
                            self.max
                        ),
                    )
                })
            })
            .collect()
    }
}
