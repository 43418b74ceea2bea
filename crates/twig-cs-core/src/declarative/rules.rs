//! Sniff implementations behind `[[forbid]]` tables.

use crate::context::UnitContext;
use crate::report::{Finding, Severity};
use crate::sniff::{Phase, Sniff};
use crate::token::{TokenKind, TokenStream};
use crate::tree::{NodeKind, TreeNode};

// ────────────────────────────────────────────
// ForbidTokenSniff
// ────────────────────────────────────────────

/// Reports every occurrence of a text fragment in the token stream.
#[derive(Debug, Clone)]
pub struct ForbidTokenSniff {
    name: String,
    code: String,
    kind: Option<TokenKind>,
    text: String,
    message: String,
    severity: Severity,
}

impl ForbidTokenSniff {
    /// Creates a token-phase forbid sniff.
    #[must_use]
    pub fn new(
        name: &str,
        code: &str,
        kind: Option<TokenKind>,
        text: impl Into<String>,
        message: &str,
        severity: Severity,
    ) -> Self {
        Self {
            name: name.to_string(),
            code: code.to_string(),
            kind,
            text: text.into(),
            message: message.to_string(),
            severity,
        }
    }
}

impl Sniff for ForbidTokenSniff {
    fn name(&self) -> &str {
        &self.name
    }

    fn code(&self) -> &str {
        &self.code
    }

    fn description(&self) -> &str {
        &self.message
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn phase(&self) -> Phase {
        Phase::PreParser
    }

    fn check_tokens(&self, ctx: &UnitContext<'_>, tokens: &TokenStream) -> Vec<Finding> {
        if self.text.is_empty() {
            return Vec::new();
        }

        tokens
            .iter()
            .filter(|t| self.kind.map_or(true, |k| t.kind == k))
            .flat_map(|token| {
                token.text.match_indices(&self.text).map(move |(index, _)| {
                    let pos = token.position_at(index);
                    Finding::new(
                        &self.code,
                        &self.name,
                        self.severity,
                        ctx.location(pos.line, Some(pos.column)),
                        &self.message,
                    )
                })
            })
            .collect()
    }
}

// ────────────────────────────────────────────
// ForbidNodeSniff
// ────────────────────────────────────────────

/// Reports every node of a kind, optionally only those with a given name.
#[derive(Debug, Clone)]
pub struct ForbidNodeSniff {
    name: String,
    code: String,
    kind: NodeKind,
    value: Option<String>,
    message: String,
    severity: Severity,
}

impl ForbidNodeSniff {
    /// Creates a tree-phase forbid sniff.
    #[must_use]
    pub fn new(
        name: &str,
        code: &str,
        kind: NodeKind,
        value: Option<String>,
        message: &str,
        severity: Severity,
    ) -> Self {
        Self {
            name: name.to_string(),
            code: code.to_string(),
            kind,
            value,
            message: message.to_string(),
            severity,
        }
    }

    fn matches(&self, node: &TreeNode) -> bool {
        node.is(&self.kind)
            && self
                .value
                .as_deref()
                .map_or(true, |value| node.name() == Some(value))
    }
}

impl Sniff for ForbidNodeSniff {
    fn name(&self) -> &str {
        &self.name
    }

    fn code(&self) -> &str {
        &self.code
    }

    fn description(&self) -> &str {
        &self.message
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn phase(&self) -> Phase {
        Phase::PostParser
    }

    fn check_tree(&self, ctx: &UnitContext<'_>, root: &TreeNode) -> Vec<Finding> {
        root.descendants()
            .filter(|node| self.matches(node))
            .map(|node| {
                Finding::new(
                    &self.code,
                    &self.name,
                    self.severity,
                    ctx.location(node.span.start.line, Some(node.span.start.column)),
                    &self.message,
                )
            })
            .collect()
    }
}
