//! Sniff presets for common configurations.

use std::str::FromStr;

use crate::{
    blank_line_at_eof, delimiter_spacing, known_tests, line_length, max_nesting,
    no_commented_code, no_dump, no_tab_indent, no_trailing_whitespace, quote_style,
    BlankLineAtEof, DelimiterSpacing, KnownTests, LineLength, MaxNesting, NoCommentedCode, NoDump,
    NoTabIndent, NoTrailingWhitespace, QuoteStyleSniff,
};
use twig_cs_core::{ConfigurationError, SniffBox, SniffConfig};

/// Names of every built-in sniff, in code order.
pub const SNIFF_NAMES: &[&str] = &[
    line_length::NAME,
    no_tab_indent::NAME,
    blank_line_at_eof::NAME,
    no_trailing_whitespace::NAME,
    delimiter_spacing::NAME,
    quote_style::NAME,
    no_commented_code::NAME,
    no_dump::NAME,
    known_tests::NAME,
    max_nesting::NAME,
];

/// `max-nesting` limit applied by the strict preset.
pub const STRICT_MAX_NESTING: usize = 3;

/// Preset configurations for twig-cs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    /// Recommended sniffs with sensible defaults.
    #[default]
    Recommended,
    /// Every built-in sniff, with tighter limits.
    Strict,
    /// Minimal sniffs for gradual adoption.
    Minimal,
}

impl Preset {
    /// Returns the sniffs for this preset.
    #[must_use]
    pub fn sniffs(self) -> Vec<SniffBox> {
        match self {
            Self::Recommended => recommended_sniffs(),
            Self::Strict => strict_sniffs(),
            Self::Minimal => minimal_sniffs(),
        }
    }

    /// Builds one sniff as this preset tunes it, then applies the options
    /// of `config` on top. Options the section leaves unset keep the
    /// preset's value.
    ///
    /// # Errors
    ///
    /// Same as [`sniff_by_name`].
    pub fn sniff(
        self,
        name: &str,
        config: Option<&SniffConfig>,
    ) -> Result<SniffBox, ConfigurationError> {
        match (self, name) {
            (Self::Strict, max_nesting::NAME) => Ok(Box::new(MaxNesting::from_config_with_max(
                config,
                STRICT_MAX_NESTING,
            )?)),
            _ => sniff_by_name(name, config),
        }
    }

    /// Returns the preset name as written in configuration.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recommended => "recommended",
            Self::Strict => "strict",
            Self::Minimal => "minimal",
        }
    }
}

impl FromStr for Preset {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recommended" => Ok(Self::Recommended),
            "strict" => Ok(Self::Strict),
            "minimal" => Ok(Self::Minimal),
            _ => Err(ConfigurationError::UnknownPreset {
                value: s.to_string(),
            }),
        }
    }
}

/// Returns the recommended set of sniffs.
///
/// Includes the whitespace and layout sniffs (TCS001-TCS005) plus:
/// - `no-dump` (TCS101) - Forbids debug output
/// - `known-tests` (TCS102) - Catches misspelled tests
#[must_use]
pub fn recommended_sniffs() -> Vec<SniffBox> {
    vec![
        Box::new(LineLength::new()),
        Box::new(NoTabIndent::new()),
        Box::new(BlankLineAtEof::new()),
        Box::new(NoTrailingWhitespace::new()),
        Box::new(DelimiterSpacing::new()),
        Box::new(NoDump::new()),
        Box::new(KnownTests::new()),
    ]
}

/// Returns the strict set of sniffs.
///
/// Includes every built-in sniff, with `max-nesting` lowered to
/// [`STRICT_MAX_NESTING`].
#[must_use]
pub fn strict_sniffs() -> Vec<SniffBox> {
    vec![
        Box::new(LineLength::new()),
        Box::new(NoTabIndent::new()),
        Box::new(BlankLineAtEof::new()),
        Box::new(NoTrailingWhitespace::new()),
        Box::new(DelimiterSpacing::new()),
        Box::new(QuoteStyleSniff::new()),
        Box::new(NoCommentedCode::new()),
        Box::new(NoDump::new()),
        Box::new(KnownTests::new()),
        Box::new(MaxNesting::new().max(STRICT_MAX_NESTING)),
    ]
}

/// Returns the minimal set of sniffs.
#[must_use]
pub fn minimal_sniffs() -> Vec<SniffBox> {
    vec![Box::new(NoDump::new()), Box::new(BlankLineAtEof::new())]
}

/// Returns all available sniffs with default settings.
#[must_use]
pub fn all_sniffs() -> Vec<SniffBox> {
    SNIFF_NAMES
        .iter()
        .filter_map(|name| sniff_by_name(name, None).ok())
        .collect()
}

/// Builds a built-in sniff by name, applying its option section.
///
/// # Errors
///
/// Returns [`ConfigurationError::UnknownSniff`] for a name that is not
/// built in, or an option error from the sniff itself.
pub fn sniff_by_name(
    name: &str,
    config: Option<&SniffConfig>,
) -> Result<SniffBox, ConfigurationError> {
    let sniff: SniffBox = match name {
        line_length::NAME => Box::new(LineLength::from_config(config)?),
        no_tab_indent::NAME => Box::new(NoTabIndent::new()),
        blank_line_at_eof::NAME => Box::new(BlankLineAtEof::new()),
        no_trailing_whitespace::NAME => Box::new(NoTrailingWhitespace::new()),
        delimiter_spacing::NAME => Box::new(DelimiterSpacing::new()),
        quote_style::NAME => Box::new(QuoteStyleSniff::from_config(config)?),
        no_commented_code::NAME => Box::new(NoCommentedCode::new()),
        no_dump::NAME => Box::new(NoDump::new()),
        known_tests::NAME => Box::new(KnownTests::from_config(config)?),
        max_nesting::NAME => Box::new(MaxNesting::from_config(config)?),
        _ => {
            return Err(ConfigurationError::UnknownSniff {
                name: name.to_string(),
            })
        }
    };
    Ok(sniff)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(sniffs: &[SniffBox]) -> Vec<&str> {
        sniffs.iter().map(|s| s.name()).collect()
    }

    #[test]
    fn test_preset_sniffs() {
        assert!(!Preset::Recommended.sniffs().is_empty());
        assert_eq!(Preset::Strict.sniffs().len(), SNIFF_NAMES.len());
        assert_eq!(
            names(&Preset::Minimal.sniffs()),
            vec![no_dump::NAME, blank_line_at_eof::NAME]
        );
    }

    #[test]
    fn all_sniffs_have_unique_names_and_codes() {
        let sniffs = all_sniffs();
        assert_eq!(names(&sniffs), SNIFF_NAMES);
        let mut codes: Vec<&str> = sniffs.iter().map(|s| s.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), SNIFF_NAMES.len());
    }

    #[test]
    fn preset_names_parse() {
        for preset in [Preset::Recommended, Preset::Strict, Preset::Minimal] {
            assert_eq!(preset.as_str().parse::<Preset>(), Ok(preset));
        }
        assert!(matches!(
            "pedantic".parse::<Preset>(),
            Err(ConfigurationError::UnknownPreset { .. })
        ));
    }

    #[test]
    fn unknown_sniff_name() {
        assert!(matches!(
            sniff_by_name("no-such-sniff", None),
            Err(ConfigurationError::UnknownSniff { name }) if name == "no-such-sniff"
        ));
    }
}
