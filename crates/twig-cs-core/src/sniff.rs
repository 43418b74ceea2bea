//! The sniff trait and its execution phases.

use crate::context::UnitContext;
use crate::report::{Finding, Severity};
use crate::ruleset::ConfigurationError;
use crate::token::TokenStream;
use crate::tree::TreeNode;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// When a sniff runs relative to tree building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Runs on the token stream, before the tree is built.
    PreParser,
    /// Runs on the normalized syntax tree.
    PostParser,
}

impl Phase {
    /// Both phases, in execution order.
    pub const ALL: [Self; 2] = [Self::PreParser, Self::PostParser];

    /// Returns the snake_case name used in configuration files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreParser => "pre_parser",
            Self::PostParser => "post_parser",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre_parser" => Ok(Self::PreParser),
            "post_parser" => Ok(Self::PostParser),
            _ => Err(ConfigurationError::UnknownPhase {
                value: s.to_string(),
            }),
        }
    }
}

/// A single lint rule over templates.
///
/// A sniff declares its [`Phase`] and implements the matching check:
/// [`Sniff::check_tokens`] for [`Phase::PreParser`], [`Sniff::check_tree`]
/// for [`Phase::PostParser`]. Checks only read their input and return the
/// findings they produce.
///
/// # Example
///
/// ```ignore
/// use twig_cs_core::{Finding, Location, Phase, Severity, Sniff, TokenStream, UnitContext};
///
/// pub struct NoTabs;
///
/// impl Sniff for NoTabs {
///     fn name(&self) -> &str { "no-tabs" }
///     fn code(&self) -> &str { "X001" }
///     fn phase(&self) -> Phase { Phase::PreParser }
///
///     fn check_tokens(&self, ctx: &UnitContext<'_>, tokens: &TokenStream) -> Vec<Finding> {
///         tokens
///             .iter()
///             .filter(|t| t.text.contains('\t'))
///             .map(|t| Finding::new(
///                 self.code(),
///                 self.name(),
///                 self.default_severity(),
///                 ctx.location(t.line, Some(t.column)),
///                 "Tab character found",
///             ))
///             .collect()
///     }
/// }
/// ```
pub trait Sniff: Send + Sync {
    /// Kebab-case identity of this sniff (e.g., "line-length").
    ///
    /// A ruleset holds at most one sniff per identity.
    fn name(&self) -> &str;

    /// Short code shown in reports (e.g., "TCS001").
    fn code(&self) -> &str;

    /// Returns a brief description of what this sniff checks.
    fn description(&self) -> &str {
        ""
    }

    /// Returns the default severity for findings from this sniff.
    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    /// Phase this sniff runs in.
    fn phase(&self) -> Phase;

    /// Checks the token stream of one unit.
    fn check_tokens(&self, _ctx: &UnitContext<'_>, _tokens: &TokenStream) -> Vec<Finding> {
        Vec::new()
    }

    /// Checks the normalized syntax tree of one unit.
    fn check_tree(&self, _ctx: &UnitContext<'_>, _root: &TreeNode) -> Vec<Finding> {
        Vec::new()
    }
}

/// Type alias for boxed Sniff trait objects.
pub type SniffBox = Box<dyn Sniff>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize;

    struct TabSniff;

    impl Sniff for TabSniff {
        fn name(&self) -> &str {
            "no-tabs"
        }

        fn code(&self) -> &str {
            "T001"
        }

        fn phase(&self) -> Phase {
            Phase::PreParser
        }

        fn check_tokens(&self, ctx: &UnitContext<'_>, tokens: &TokenStream) -> Vec<Finding> {
            tokens
                .iter()
                .filter(|t| t.text.contains('\t'))
                .map(|t| {
                    Finding::new(
                        self.code(),
                        self.name(),
                        self.default_severity(),
                        ctx.location(t.line, Some(t.column)),
                        "tab",
                    )
                })
                .collect()
        }
    }

    #[test]
    fn phase_parses_config_names() {
        assert_eq!("pre_parser".parse::<Phase>().ok(), Some(Phase::PreParser));
        assert_eq!("post_parser".parse::<Phase>().ok(), Some(Phase::PostParser));
    }

    #[test]
    fn unknown_phase_is_configuration_error() {
        let err = "during_parser".parse::<Phase>().expect_err("unknown phase");
        assert_eq!(
            err,
            ConfigurationError::UnknownPhase {
                value: "during_parser".to_string()
            }
        );
    }

    #[test]
    fn default_tree_check_is_empty() {
        let ctx = UnitContext::new("a.twig", "\tx");
        let tokens = tokenize("\tx").expect("valid");
        let root = TreeNode::new(crate::tree::NodeKind::Template, crate::tree::Span::default());

        assert_eq!(TabSniff.check_tokens(&ctx, &tokens).len(), 1);
        assert!(TabSniff.check_tree(&ctx, &root).is_empty());
        assert_eq!(TabSniff.default_severity(), Severity::Warning);
    }
}
