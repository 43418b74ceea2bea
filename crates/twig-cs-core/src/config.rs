//! Configuration types for twig-cs.

use crate::declarative::ForbidConfig;
use crate::report::Severity;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Top-level configuration, usually read from `twig-cs.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Preset to start from ("recommended", "strict" or "minimal").
    #[serde(default)]
    pub preset: Option<String>,

    /// Linter configuration.
    #[serde(default)]
    pub linter: LinterConfig,

    /// Per-sniff configuration, keyed by sniff identity.
    #[serde(default)]
    pub sniffs: BTreeMap<String, SniffConfig>,

    /// Declarative sniffs defined with `[[forbid]]` tables.
    #[serde(default)]
    pub forbid: Vec<ForbidConfig>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Checks if a sniff is enabled. Sniffs without a section are enabled.
    #[must_use]
    pub fn is_sniff_enabled(&self, name: &str) -> bool {
        self.sniffs
            .get(name)
            .map_or(true, |c| c.enabled.unwrap_or(true))
    }

    /// Gets the severity override for a sniff.
    #[must_use]
    pub fn sniff_severity(&self, name: &str) -> Option<Severity> {
        self.sniffs.get(name).and_then(|c| c.severity)
    }

    /// Gets the configuration section of a sniff.
    #[must_use]
    pub fn sniff(&self, name: &str) -> Option<&SniffConfig> {
        self.sniffs.get(name)
    }
}

/// Linter-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinterConfig {
    /// Lint units in parallel (default: true).
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// File extensions treated as templates, without the dot.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Glob patterns to exclude from discovery.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for LinterConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            extensions: default_extensions(),
            exclude: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_extensions() -> Vec<String> {
    vec!["twig".to_string()]
}

/// Per-sniff configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SniffConfig {
    /// Whether this sniff is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for this sniff.
    #[serde(default)]
    pub severity: Option<Severity>,

    /// Sniff-specific options as key-value pairs, validated by each sniff.
    #[serde(flatten)]
    pub options: BTreeMap<String, toml::Value>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.linter.parallel);
        assert_eq!(config.linter.extensions, vec!["twig"]);
        assert!(config.sniffs.is_empty());
        assert!(config.is_sniff_enabled("anything"));
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
preset = "strict"

[linter]
parallel = false
exclude = ["**/vendor/**"]

[sniffs.line-length]
severity = "error"
max = 100

[sniffs.quote-style]
enabled = false
prefer = "double"
"#;

        let config = Config::parse(toml).expect("Failed to parse");
        assert_eq!(config.preset.as_deref(), Some("strict"));
        assert!(!config.linter.parallel);
        assert_eq!(config.linter.extensions, vec!["twig"]);
        assert!(config.is_sniff_enabled("line-length"));
        assert!(!config.is_sniff_enabled("quote-style"));
        assert_eq!(config.sniff_severity("line-length"), Some(Severity::Error));

        // Only sniff-specific keys land in the flattened options
        let line_length = config.sniff("line-length").expect("section present");
        assert_eq!(
            line_length.options.keys().collect::<Vec<_>>(),
            vec!["max"]
        );
        assert_eq!(line_length.options["max"].as_integer(), Some(100));
        let quotes = config.sniff("quote-style").expect("section present");
        assert_eq!(quotes.enabled, Some(false));
        assert_eq!(quotes.options["prefer"].as_str(), Some("double"));
    }

    #[test]
    fn forbid_tables_are_collected() {
        let toml = r#"
[[forbid]]
name = "no-raw"
phase = "post_parser"
node = "filter"
value = "raw"
message = "raw disables escaping"
"#;
        let config = Config::parse(toml).expect("Failed to parse");
        assert_eq!(config.forbid.len(), 1);
        assert_eq!(config.forbid[0].node.as_deref(), Some("filter"));
    }

    #[test]
    fn invalid_severity_is_a_parse_error() {
        let toml = "[sniffs.line-length]\nseverity = \"fatal\"\n";
        assert!(matches!(
            Config::parse(toml),
            Err(ConfigError::Parse { .. })
        ));
    }
}
