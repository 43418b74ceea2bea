//! Declarative sniffs driven by TOML configuration.
//!
//! A `[[forbid]]` table defines a sniff without writing Rust code:
//!
//! ```text
//! [[forbid]]            →  ForbidConfig (serde)
//!   ↓ load()               validate names, phase, kinds, severity
//! Vec<SniffBox>         →  ForbidTokenSniff | ForbidNodeSniff
//! ```
//!
//! Token-phase definitions match a substring of token text, optionally
//! restricted to one token kind. Tree-phase definitions match a node kind,
//! optionally restricted to nodes whose `name` attribute equals `value`.

use crate::report::Severity;
use crate::ruleset::ConfigurationError;
use crate::sniff::{Phase, SniffBox};
use crate::token::TokenKind;
use crate::tree::NodeKind;

use serde::{Deserialize, Serialize};

pub mod rules;

pub use rules::{ForbidNodeSniff, ForbidTokenSniff};

/// Code reported by declarative sniffs that do not set one.
pub const DEFAULT_CODE: &str = "TCS900";

/// TOML representation of a `[[forbid]]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForbidConfig {
    /// Sniff identity (e.g., "no-raw-filter").
    pub name: String,
    /// `pre_parser` or `post_parser`. Inferred from `node` when missing.
    #[serde(default)]
    pub phase: Option<String>,
    /// Token kind to restrict a token-phase match to.
    #[serde(default)]
    pub token: Option<String>,
    /// Text a token must contain to match.
    #[serde(default)]
    pub text: Option<String>,
    /// Node kind to match in the tree phase.
    #[serde(default)]
    pub node: Option<String>,
    /// Required `name` attribute of matched nodes.
    #[serde(default)]
    pub value: Option<String>,
    /// Finding message.
    pub message: String,
    /// Severity (default: "warning").
    #[serde(default)]
    pub severity: Option<String>,
    /// Code shown in reports (default: [`DEFAULT_CODE`]).
    #[serde(default)]
    pub code: Option<String>,
}

/// Validates `[[forbid]]` tables and creates their sniffs, in order.
///
/// # Errors
///
/// Returns the first invalid phase, kind, severity or missing field.
pub fn load(configs: &[ForbidConfig]) -> Result<Vec<SniffBox>, ConfigurationError> {
    configs.iter().map(load_one).collect()
}

fn load_one(config: &ForbidConfig) -> Result<SniffBox, ConfigurationError> {
    let phase = match config.phase.as_deref() {
        Some(value) => value.parse::<Phase>()?,
        None if config.node.is_some() => Phase::PostParser,
        None => Phase::PreParser,
    };

    let severity = config
        .severity
        .as_deref()
        .map(str::parse::<Severity>)
        .transpose()?
        .unwrap_or(Severity::Warning);
    let code = config.code.as_deref().unwrap_or(DEFAULT_CODE);

    match phase {
        Phase::PreParser => {
            reject(config, "node", config.node.is_some())?;
            reject(config, "value", config.value.is_some())?;
            let text = config
                .text
                .clone()
                .ok_or_else(|| missing(config, "text"))?;
            let kind = config
                .token
                .as_deref()
                .map(str::parse::<TokenKind>)
                .transpose()?;
            Ok(Box::new(ForbidTokenSniff::new(
                &config.name,
                code,
                kind,
                text,
                &config.message,
                severity,
            )))
        }
        Phase::PostParser => {
            reject(config, "token", config.token.is_some())?;
            reject(config, "text", config.text.is_some())?;
            let node = config
                .node
                .as_deref()
                .ok_or_else(|| missing(config, "node"))?
                .parse::<NodeKind>()?;
            Ok(Box::new(ForbidNodeSniff::new(
                &config.name,
                code,
                node,
                config.value.clone(),
                &config.message,
                severity,
            )))
        }
    }
}

fn missing(config: &ForbidConfig, field: &str) -> ConfigurationError {
    ConfigurationError::MissingField {
        sniff: config.name.clone(),
        field: field.to_string(),
    }
}

fn reject(config: &ForbidConfig, option: &str, present: bool) -> Result<(), ConfigurationError> {
    if present {
        return Err(ConfigurationError::InvalidOption {
            sniff: config.name.clone(),
            option: option.to_string(),
            reason: "not valid for this phase".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forbid(name: &str) -> ForbidConfig {
        ForbidConfig {
            name: name.to_string(),
            message: "forbidden".to_string(),
            ..ForbidConfig::default()
        }
    }

    #[test]
    fn node_definition_infers_post_parser() {
        let config = ForbidConfig {
            node: Some("filter".to_string()),
            value: Some("raw".to_string()),
            ..forbid("no-raw")
        };
        let sniffs = load(&[config]).expect("valid");
        assert_eq!(sniffs[0].phase(), Phase::PostParser);
        assert_eq!(sniffs[0].name(), "no-raw");
        assert_eq!(sniffs[0].code(), DEFAULT_CODE);
        assert_eq!(sniffs[0].default_severity(), Severity::Warning);
    }

    #[test]
    fn token_definition_is_pre_parser() {
        let config = ForbidConfig {
            phase: Some("pre_parser".to_string()),
            token: Some("string".to_string()),
            text: Some("http://".to_string()),
            severity: Some("error".to_string()),
            code: Some("X100".to_string()),
            ..forbid("no-http")
        };
        let sniffs = load(&[config]).expect("valid");
        assert_eq!(sniffs[0].phase(), Phase::PreParser);
        assert_eq!(sniffs[0].default_severity(), Severity::Error);
        assert_eq!(sniffs[0].code(), "X100");
    }

    #[test]
    fn unknown_phase_is_rejected() {
        let config = ForbidConfig {
            phase: Some("mid_parser".to_string()),
            text: Some("x".to_string()),
            ..forbid("bad")
        };
        let err = load(&[config]).err();
        assert_eq!(
            err,
            Some(ConfigurationError::UnknownPhase {
                value: "mid_parser".to_string()
            })
        );
    }

    #[test]
    fn unknown_kinds_and_severities_are_rejected() {
        let bad_node = ForbidConfig {
            node: Some("loop".to_string()),
            ..forbid("a")
        };
        assert!(matches!(
            load(&[bad_node]),
            Err(ConfigurationError::UnknownNodeKind { .. })
        ));

        let bad_token = ForbidConfig {
            token: Some("word".to_string()),
            text: Some("x".to_string()),
            ..forbid("b")
        };
        assert!(matches!(
            load(&[bad_token]),
            Err(ConfigurationError::UnknownTokenKind { .. })
        ));

        let bad_severity = ForbidConfig {
            text: Some("x".to_string()),
            severity: Some("fatal".to_string()),
            ..forbid("c")
        };
        assert!(matches!(
            load(&[bad_severity]),
            Err(ConfigurationError::UnknownSeverity { .. })
        ));
    }

    #[test]
    fn missing_match_field_is_rejected() {
        assert!(matches!(
            load(&[forbid("empty")]),
            Err(ConfigurationError::MissingField { ref field, .. }) if field == "text"
        ));

        let tree_without_node = ForbidConfig {
            phase: Some("post_parser".to_string()),
            ..forbid("empty-tree")
        };
        assert!(matches!(
            load(&[tree_without_node]),
            Err(ConfigurationError::MissingField { ref field, .. }) if field == "node"
        ));
    }

    #[test]
    fn fields_of_the_other_phase_are_rejected() {
        let config = ForbidConfig {
            phase: Some("post_parser".to_string()),
            node: Some("call".to_string()),
            text: Some("dump".to_string()),
            ..forbid("mixed")
        };
        assert!(matches!(
            load(&[config]),
            Err(ConfigurationError::InvalidOption { .. })
        ));
    }
}
