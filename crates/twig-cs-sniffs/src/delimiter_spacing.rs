//! Sniff to require one space inside `{{ }}`, `{% %}` and `{# #}`.
//!
//! # Rationale
//!
//! `{{ name }}` reads better than `{{name}}` or `{{  name  }}`. A line break
//! next to a delimiter is accepted, so multi-line tags stay legal.

use twig_cs_core::{Finding, Phase, Severity, Sniff, Token, TokenKind, TokenStream, UnitContext};

/// Sniff code for delimiter-spacing.
pub const CODE: &str = "TCS005";

/// Sniff name for delimiter-spacing.
pub const NAME: &str = "delimiter-spacing";

/// Reports delimiters not separated from their content by exactly one space.
#[derive(Debug, Clone)]
pub struct DelimiterSpacing {
    severity: Severity,
}

impl Default for DelimiterSpacing {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of spaces if `gap` is not an acceptable separator.
fn bad_gap(gap: &str) -> Option<usize> {
    if gap.contains('\n') || gap == " " {
        None
    } else {
        Some(gap.chars().count())
    }
}

impl DelimiterSpacing {
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

    fn report(&self, ctx: &UnitContext<'_>, at: &Token, side: &str, found: usize) -> Finding {
        Finding::new(
            CODE,
            NAME,
            self.severity,
            ctx.location(at.line, Some(at.column)),
            format!(
                "Expecting 1 whitespace {side} \"{}\"; found {found}",
                at.text.trim_matches(['-', '~'])
            ),
        )
    }

    fn check_code(
        &self,
        ctx: &UnitContext<'_>,
        tokens: &[Token],
        index: usize,
        out: &mut Vec<Finding>,
    ) {
        let token = &tokens[index];
        if token.kind.is_opening_delimiter() {
            let after = tokens.get(index + 1);
            // `{{}}`, `{##}` and similar empty pairs are left to the parser
            if after.is_some_and(|t| t.kind.is_closing_delimiter()) {
                return;
            }
            let gap = after.filter(|t| t.is_whitespace()).map_or("", |t| t.text.as_str());
            if let Some(found) = bad_gap(gap) {
                out.push(self.report(ctx, token, "after", found));
            }
        } else if token.kind.is_closing_delimiter() {
            let before = index.checked_sub(1).and_then(|i| tokens.get(i));
            if before.is_some_and(|t| t.kind.is_opening_delimiter()) {
                return;
            }
            let gap = before.filter(|t| t.is_whitespace()).map_or("", |t| t.text.as_str());
            if let Some(found) = bad_gap(gap) {
                out.push(self.report(ctx, token, "before", found));
            }
        }
    }

    fn check_comment(
        &self,
        ctx: &UnitContext<'_>,
        tokens: &[Token],
        index: usize,
        out: &mut Vec<Finding>,
    ) {
        let body = &tokens[index].text;
        if body.trim().is_empty() {
            return;
        }
        let leading = &body[..body.len() - body.trim_start().len()];
        let trailing = &body[body.trim_end().len()..];

        let open = index.checked_sub(1).and_then(|i| tokens.get(i));
        if let (Some(found), Some(open)) = (bad_gap(leading), open) {
            out.push(self.report(ctx, open, "after", found));
        }
        if let (Some(found), Some(close)) = (bad_gap(trailing), tokens.get(index + 1)) {
            out.push(self.report(ctx, close, "before", found));
        }
    }
}

impl Sniff for DelimiterSpacing {
    fn name(&self) -> &str {
        NAME
    }

    fn code(&self) -> &str {
        CODE
    }

    fn description(&self) -> &str {
        "Delimiters must be separated from their content by one space"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn phase(&self) -> Phase {
        Phase::PreParser
    }

    fn check_tokens(&self, ctx: &UnitContext<'_>, tokens: &TokenStream) -> Vec<Finding> {
        let tokens = tokens.as_slice();
        let mut findings = Vec::new();

        for (index, token) in tokens.iter().enumerate() {
            match token.kind {
                TokenKind::Comment => self.check_comment(ctx, tokens, index, &mut findings),
                TokenKind::CommentStart | TokenKind::CommentEnd => {}
                _ => self.check_code(ctx, tokens, index, &mut findings),
            }
        }

        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::lint;

    fn messages(source: &str) -> Vec<String> {
        lint(DelimiterSpacing::new(), source)
            .into_iter()
            .map(|f| f.message)
            .collect()
    }

    #[test]
    fn single_spaces_pass() {
        assert!(messages("{{ a }}{% if b %}{% endif %}{# c #}").is_empty());
        assert!(messages("{{- a -}}{%~ if b ~%}{% endif %}").is_empty());
    }

    #[test]
    fn line_breaks_pass() {
        assert!(messages("{% set x = {\n    a: 1\n} %}{{\n  a\n}}").is_empty());
    }

    #[test]
    fn missing_and_extra_spaces_are_reported() {
        assert_eq!(
            messages("{{a}}{{  b }}"),
            vec![
                "Expecting 1 whitespace after \"{{\"; found 0",
                "Expecting 1 whitespace before \"}}\"; found 0",
                "Expecting 1 whitespace after \"{{\"; found 2",
            ]
        );
    }

    #[test]
    fn comments_are_checked() {
        let findings = lint(DelimiterSpacing::new(), "{#note  #}");
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].location.column, Some(1));
        assert_eq!(findings[1].location.column, Some(9));
    }

    #[test]
    fn trim_modifier_is_stripped_from_message() {
        assert_eq!(
            messages("{{-a }}"),
            vec!["Expecting 1 whitespace after \"{{\"; found 0"]
        );
    }
}
