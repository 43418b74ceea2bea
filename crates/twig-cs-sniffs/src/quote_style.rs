//! Sniff to enforce a consistent quote style for string literals.
//!
//! # Configuration
//!
//! - `prefer`: `"single"` (default) or `"double"`
//!
//! Strings that contain the preferred quote character are left alone, as
//! are double-quoted strings using `#{}` interpolation.

use crate::options;
use twig_cs_core::{
    ConfigurationError, Finding, Phase, Severity, Sniff, SniffConfig, TokenKind, TokenStream,
    UnitContext,
};

/// Sniff code for quote-style.
pub const CODE: &str = "TCS006";

/// Sniff name for quote-style.
pub const NAME: &str = "quote-style";

/// Preferred quote character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    /// `'text'`
    Single,
    /// `"text"`
    Double,
}

impl QuoteStyle {
    fn quote(self) -> char {
        match self {
            Self::Single => '\'',
            Self::Double => '"',
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Double => "double",
        }
    }
}

/// Reports string literals not using the preferred quotes.
#[derive(Debug, Clone)]
pub struct QuoteStyleSniff {
    prefer: QuoteStyle,
    severity: Severity,
}

impl Default for QuoteStyleSniff {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteStyleSniff {
    /// Creates a new sniff preferring single quotes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            prefer: QuoteStyle::Single,
            severity: Severity::Notice,
        }
    }

    /// Creates the sniff from its configuration section.
    ///
    /// # Errors
    ///
    /// Returns an error if `prefer` is neither `single` nor `double`.
    pub fn from_config(config: Option<&SniffConfig>) -> Result<Self, ConfigurationError> {
        let prefer = match options::one_of(config, NAME, "prefer", &["single", "double"], "single")?
            .as_str()
        {
            "double" => QuoteStyle::Double,
            _ => QuoteStyle::Single,
        };
        Ok(Self::new().prefer(prefer))
    }

    /// Sets the preferred quote style.
    #[must_use]
    pub fn prefer(mut self, prefer: QuoteStyle) -> Self {
        self.prefer = prefer;
        self
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    fn violates(&self, literal: &str) -> bool {
        let wanted = self.prefer.quote();
        let Some(used) = literal.chars().next() else {
            return false;
        };
        if used == wanted {
            return false;
        }
        let body = &literal[1..literal.len().saturating_sub(1).max(1)];
        !body.contains(wanted) && !(used == '"' && body.contains("#{"))
    }
}

impl Sniff for QuoteStyleSniff {
    fn name(&self) -> &str {
        NAME
    }

    fn code(&self) -> &str {
        CODE
    }

    fn description(&self) -> &str {
        "String literals must use the preferred quote style"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn phase(&self) -> Phase {
        Phase::PreParser
    }

    fn check_tokens(&self, ctx: &UnitContext<'_>, tokens: &TokenStream) -> Vec<Finding> {
        tokens
            .iter()
            .filter(|t| t.kind == TokenKind::String && self.violates(&t.text))
            .map(|t| {
                Finding::new(
                    CODE,
                    NAME,
                    self.severity,
                    ctx.location(t.line, Some(t.column)),
                    format!("Use {} quotes for string {}", self.prefer.label(), t.text),
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
    fn prefers_single_quotes_by_default() {
        let findings = lint(QuoteStyleSniff::new(), "{{ \"a\" ~ 'b' }}");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.column, Some(4));
        assert_eq!(findings[0].severity, Severity::Notice);
    }

    #[test]
    fn allows_needed_quotes_and_interpolation() {
        let source = "{{ \"it's\" }}{{ \"hi #{name}\" }}";
        assert!(lint(QuoteStyleSniff::new(), source).is_empty());
    }

    #[test]
    fn double_preference() {
        let sniff = QuoteStyleSniff::new().prefer(QuoteStyle::Double);
        assert_eq!(lint(sniff.clone(), "{{ 'a' }}").len(), 1);
        assert!(lint(sniff, "{{ 'say \"x\"' }}").is_empty());
    }

    #[test]
    fn strings_in_text_are_ignored() {
        assert!(lint(QuoteStyleSniff::new(), "<a href=\"x\">").is_empty());
    }
}
