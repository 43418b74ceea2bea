//! Sniff to forbid tab characters in indentation.

use twig_cs_core::{Finding, Phase, Severity, Sniff, TokenStream, UnitContext};

/// Sniff code for no-tab-indent.
pub const CODE: &str = "TCS002";

/// Sniff name for no-tab-indent.
pub const NAME: &str = "no-tab-indent";

/// Reports lines whose leading whitespace contains a tab.
#[derive(Debug, Clone)]
pub struct NoTabIndent {
    severity: Severity,
}

impl Default for NoTabIndent {
    fn default() -> Self {
        Self::new()
    }
}

impl NoTabIndent {
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

impl Sniff for NoTabIndent {
    fn name(&self) -> &str {
        NAME
    }

    fn code(&self) -> &str {
        CODE
    }

    fn description(&self) -> &str {
        "Indentation must use spaces, not tabs"
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
                let column = text
                    .chars()
                    .take_while(|c| *c == ' ' || *c == '\t')
                    .position(|c| c == '\t')?;
                Some(Finding::new(
                    CODE,
                    NAME,
                    self.severity,
                    ctx.location(line, Some(column + 1)),
                    "Indentation contains a tab character",
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::lint;

    #[test]
    fn reports_tab_in_indentation() {
        let findings = lint(NoTabIndent::new(), "a\n  \tb\n\tc");
        let positions: Vec<(usize, Option<usize>)> = findings
            .iter()
            .map(|f| (f.location.line, f.location.column))
            .collect();
        assert_eq!(positions, vec![(2, Some(3)), (3, Some(1))]);
    }

    #[test]
    fn ignores_tabs_after_content() {
        assert!(lint(NoTabIndent::new(), "a\tb\n    c\n").is_empty());
    }
}
