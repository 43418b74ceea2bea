//! Sniff to forbid `dump` calls and tags in templates.
//!
//! # Rationale
//!
//! `dump` prints internal state and is meant for development only. Leaving
//! it in a template leaks data once debug mode is enabled in production.
//!
//! Both the function form `{{ dump(user) }}` and the tag form
//! `{% dump user %}` are reported. Method calls such as `logger.dump()` are
//! not.

use twig_cs_core::{Finding, NodeKind, Phase, Severity, Sniff, TreeNode, UnitContext};

/// Sniff code for no-dump.
pub const CODE: &str = "TCS101";

/// Sniff name for no-dump.
pub const NAME: &str = "no-dump";

/// Reports `dump` function calls and `dump` tags.
#[derive(Debug, Clone)]
pub struct NoDump {
    severity: Severity,
}

impl Default for NoDump {
    fn default() -> Self {
        Self::new()
    }
}

impl NoDump {
    /// Creates a new sniff with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Error,
        }
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

fn is_dump(node: &TreeNode) -> bool {
    if node.name() != Some("dump") {
        return false;
    }
    match node.kind {
        NodeKind::Tag => true,
        NodeKind::Call => node.attr("method").is_none(),
        _ => false,
    }
}

impl Sniff for NoDump {
    fn name(&self) -> &str {
        NAME
    }

    fn code(&self) -> &str {
        CODE
    }

    fn description(&self) -> &str {
        "Templates must not call dump"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn phase(&self) -> Phase {
        Phase::PostParser
    }

    fn check_tree(&self, ctx: &UnitContext<'_>, root: &TreeNode) -> Vec<Finding> {
        root.descendants()
            .filter(|node| is_dump(node))
            .map(|node| {
                let start = node.span.start;
                Finding::new(
                    CODE,
                    NAME,
                    self.severity,
                    ctx.location(start.line, Some(start.column)),
                    "Call to debug function dump() must be removed",
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::lint;

    #[test]
    fn reports_function_and_tag() {
        let findings = lint(NoDump::new(), "{{ dump(user) }}\n{% dump user %}\n");
        let lines: Vec<usize> = findings.iter().map(|f| f.location.line).collect();
        assert_eq!(lines, vec![1, 2]);
        assert!(findings.iter().all(|f| f.severity == Severity::Error));
    }

    #[test]
    fn method_named_dump_passes() {
        assert!(lint(NoDump::new(), "{{ logger.dump() }}{{ dumper }}").is_empty());
    }
}
