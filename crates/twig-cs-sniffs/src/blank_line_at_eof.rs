//! Sniff to require exactly one newline at the end of a file.

use twig_cs_core::{Finding, Phase, Severity, Sniff, TokenStream, UnitContext};

/// Sniff code for blank-line-at-eof.
pub const CODE: &str = "TCS003";

/// Sniff name for blank-line-at-eof.
pub const NAME: &str = "blank-line-at-eof";

/// Reports files that do not end with exactly one line terminator.
#[derive(Debug, Clone)]
pub struct BlankLineAtEof {
    severity: Severity,
}

impl Default for BlankLineAtEof {
    fn default() -> Self {
        Self::new()
    }
}

impl BlankLineAtEof {
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

    fn finding(&self, ctx: &UnitContext<'_>, line: usize, message: String) -> Finding {
        Finding::new(CODE, NAME, self.severity, ctx.location(line, None), message)
    }
}

impl Sniff for BlankLineAtEof {
    fn name(&self) -> &str {
        NAME
    }

    fn code(&self) -> &str {
        CODE
    }

    fn description(&self) -> &str {
        "A file must end with a single newline"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn phase(&self) -> Phase {
        Phase::PreParser
    }

    fn check_tokens(&self, ctx: &UnitContext<'_>, _tokens: &TokenStream) -> Vec<Finding> {
        let content = ctx.source.trim_end_matches(['\n', '\r']);
        if content.is_empty() {
            return Vec::new();
        }

        let last_line = content.matches('\n').count() + 1;
        let terminators = ctx.source[content.len()..].matches('\n').count();
        match terminators {
            0 => vec![self.finding(ctx, last_line, "File must end with a newline".to_string())],
            1 => Vec::new(),
            n => vec![self.finding(
                ctx,
                last_line + 1,
                format!("File must end with a single newline; found {} blank lines", n - 1),
            )],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::lint;

    #[test]
    fn single_newline_passes() {
        assert!(lint(BlankLineAtEof::new(), "a\nb\n").is_empty());
        assert!(lint(BlankLineAtEof::new(), "a\r\n").is_empty());
    }

    #[test]
    fn empty_file_passes() {
        assert!(lint(BlankLineAtEof::new(), "").is_empty());
    }

    #[test]
    fn missing_newline_reports_last_line() {
        let findings = lint(BlankLineAtEof::new(), "a\nb");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.line, 2);
        assert_eq!(findings[0].location.column, None);
    }

    #[test]
    fn extra_blank_lines_report_first_blank_line() {
        let findings = lint(BlankLineAtEof::new(), "a\nb\n\n\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.line, 3);
        assert!(findings[0].message.contains("found 2 blank lines"));
    }
}
