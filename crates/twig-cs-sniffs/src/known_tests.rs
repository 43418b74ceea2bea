//! Sniff to report test expressions that the engine does not define.
//!
//! `{% if x is defnied %}` compiles to a runtime error only when the
//! template is rendered. This sniff catches the typo at lint time.
//!
//! # Configuration
//!
//! - `tests`: Additional test names registered by extensions

use std::collections::BTreeSet;

use crate::options;
use twig_cs_core::{
    ConfigurationError, Finding, NodeKind, Phase, Severity, Sniff, SniffConfig, TreeNode,
    UnitContext,
};

/// Sniff code for known-tests.
pub const CODE: &str = "TCS102";

/// Sniff name for known-tests.
pub const NAME: &str = "known-tests";

/// Tests shipped with the engine.
pub const CORE_TESTS: &[&str] = &[
    "constant",
    "defined",
    "divisible by",
    "divisibleby",
    "empty",
    "even",
    "iterable",
    "none",
    "null",
    "odd",
    "same as",
    "sameas",
];

/// Reports test nodes whose name is not a known test.
#[derive(Debug, Clone)]
pub struct KnownTests {
    known: BTreeSet<String>,
    severity: Severity,
}

impl Default for KnownTests {
    fn default() -> Self {
        Self::new()
    }
}

impl KnownTests {
    /// Creates a new sniff that knows the core tests.
    #[must_use]
    pub fn new() -> Self {
        Self {
            known: CORE_TESTS.iter().map(|t| (*t).to_string()).collect(),
            severity: Severity::Warning,
        }
    }

    /// Creates the sniff from its configuration section.
    ///
    /// # Errors
    ///
    /// Returns an error if `tests` is not an array of strings.
    pub fn from_config(config: Option<&SniffConfig>) -> Result<Self, ConfigurationError> {
        Ok(Self::new().with_tests(options::str_array(config, NAME, "tests")?))
    }

    /// Registers additional test names.
    #[must_use]
    pub fn with_tests<I, S>(mut self, tests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known.extend(tests.into_iter().map(Into::into));
        self
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl Sniff for KnownTests {
    fn name(&self) -> &str {
        NAME
    }

    fn code(&self) -> &str {
        CODE
    }

    fn description(&self) -> &str {
        "Test expressions must use a known test"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn phase(&self) -> Phase {
        Phase::PostParser
    }

    fn check_tree(&self, ctx: &UnitContext<'_>, root: &TreeNode) -> Vec<Finding> {
        root.find_all(&NodeKind::Test)
            .into_iter()
            .filter_map(|node| {
                let name = node.name()?;
                if self.known.contains(name) {
                    return None;
                }
                let start = node.span.start;
                Some(Finding::new(
                    CODE,
                    NAME,
                    self.severity,
                    ctx.location(start.line, Some(start.column)),
                    format!("Unknown test \"{name}\""),
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::lint;

    fn messages(sniff: KnownTests, source: &str) -> Vec<String> {
        lint(sniff, source).into_iter().map(|f| f.message).collect()
    }

    #[test]
    fn core_tests_pass() {
        let source = "{% if a is defined and b is not null and c is same as(d) %}{% endif %}\
                      {% if n is divisible by(3) or n is even %}{% endif %}";
        assert!(messages(KnownTests::new(), source).is_empty());
    }

    #[test]
    fn unknown_test_is_reported() {
        assert_eq!(
            messages(KnownTests::new(), "{% if a is defnied %}{% endif %}"),
            vec!["Unknown test \"defnied\""]
        );
    }

    #[test]
    fn extension_tests_can_be_registered() {
        let sniff = KnownTests::new().with_tests(["instanceof"]);
        assert!(messages(sniff, "{{ a is instanceof('User') }}").is_empty());
    }
}
