//! Sniff to forbid commented-out template code.
//!
//! `{# {{ user.name }} #}` is usually left behind during debugging. Use
//! version control to keep old markup instead.

use twig_cs_core::{Finding, Phase, Severity, Sniff, TokenKind, TokenStream, UnitContext};

/// Sniff code for no-commented-code.
pub const CODE: &str = "TCS007";

/// Sniff name for no-commented-code.
pub const NAME: &str = "no-commented-code";

const CODE_MARKERS: [&str; 2] = ["{{", "{%"];

/// Reports comments that contain print or tag delimiters.
#[derive(Debug, Clone)]
pub struct NoCommentedCode {
    severity: Severity,
}

impl Default for NoCommentedCode {
    fn default() -> Self {
        Self::new()
    }
}

impl NoCommentedCode {
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

impl Sniff for NoCommentedCode {
    fn name(&self) -> &str {
        NAME
    }

    fn code(&self) -> &str {
        CODE
    }

    fn description(&self) -> &str {
        "Comments must not contain template code"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn phase(&self) -> Phase {
        Phase::PreParser
    }

    fn check_tokens(&self, ctx: &UnitContext<'_>, tokens: &TokenStream) -> Vec<Finding> {
        let tokens = tokens.as_slice();
        tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| {
                t.kind == TokenKind::Comment && CODE_MARKERS.iter().any(|m| t.text.contains(m))
            })
            .map(|(index, comment)| {
                let at = index
                    .checked_sub(1)
                    .and_then(|i| tokens.get(i))
                    .filter(|t| t.kind == TokenKind::CommentStart)
                    .unwrap_or(comment);
                Finding::new(
                    CODE,
                    NAME,
                    self.severity,
                    ctx.location(at.line, Some(at.column)),
                    "Comment contains commented-out template code",
                )
            })
            .collect()
    }
}
