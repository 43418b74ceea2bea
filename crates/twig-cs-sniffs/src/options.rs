//! Typed access to sniff options with validation.

use twig_cs_core::{ConfigurationError, SniffConfig};

/// Reads a positive integer option, falling back to `default` when unset.
pub(crate) fn positive_int(
    config: Option<&SniffConfig>,
    sniff: &str,
    key: &str,
    default: usize,
) -> Result<usize, ConfigurationError> {
    let Some(value) = config.and_then(|c| c.options.get(key)) else {
        return Ok(default);
    };
    value
        .as_integer()
        .and_then(|n| usize::try_from(n).ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| ConfigurationError::InvalidOption {
            sniff: sniff.to_string(),
            option: key.to_string(),
            reason: format!("expected a positive integer, found `{value}`"),
        })
}

/// Reads a string option restricted to `allowed` values.
pub(crate) fn one_of(
    config: Option<&SniffConfig>,
    sniff: &str,
    key: &str,
    allowed: &[&str],
    default: &str,
) -> Result<String, ConfigurationError> {
    let Some(value) = config.and_then(|c| c.options.get(key)) else {
        return Ok(default.to_string());
    };
    match value.as_str() {
        Some(s) if allowed.contains(&s) => Ok(s.to_string()),
        _ => Err(ConfigurationError::InvalidOption {
            sniff: sniff.to_string(),
            option: key.to_string(),
            reason: format!("expected one of {}, found `{value}`", allowed.join(", ")),
        }),
    }
}

/// Reads a string array option; unset means empty.
pub(crate) fn str_array(
    config: Option<&SniffConfig>,
    sniff: &str,
    key: &str,
) -> Result<Vec<String>, ConfigurationError> {
    let Some(value) = config.and_then(|c| c.options.get(key)) else {
        return Ok(Vec::new());
    };
    let invalid = || ConfigurationError::InvalidOption {
        sniff: sniff.to_string(),
        option: key.to_string(),
        reason: "expected an array of strings".to_string(),
    };
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|v| v.as_str().map(String::from).ok_or_else(invalid))
        .collect()
}
