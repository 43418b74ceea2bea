//! Sniff to forbid whitespace at the end of lines.

use twig_cs_core::{Finding, Phase, Severity, Sniff, TokenStream, UnitContext};

/// Sniff code for no-trailing-whitespace.
pub const CODE: &str = "TCS004";

/// Sniff name for no-trailing-whitespace.
pub const NAME: &str = "no-trailing-whitespace";

/// Reports spaces or tabs before a line terminator.
#[derive(Debug, Clone)]
pub struct NoTrailingWhitespace {
    severity: Severity,
}

impl Default for NoTrailingWhitespace {
    fn default() -> Self {
        Self::new()
    }
}

impl NoTrailingWhitespace {
    /// Creates a new sniff with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Warning,
        }
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl Sniff for NoTrailingWhitespace {
    fn name(&self) -> &str {
        NAME
    }

    fn code(&self) -> &str {
        CODE
    }

    fn description(&self) -> &str {
        "Lines must not end with whitespace"
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
                let text = text.strip_suffix('\r').unwrap_or(text);
                let content = text.trim_end_matches([' ', '\t']);
                (content.len() < text.len()).then(|| {
                    Finding::new(
                        CODE,
                        NAME,
                        self.severity,
                        ctx.location(line, Some(content.chars().count() + 1)),
                        "Whitespace found at end of line",
                    )
                })
            })
            .collect()
    }
}
