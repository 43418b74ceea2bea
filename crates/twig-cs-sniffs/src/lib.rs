//! # twig-cs-sniffs
//!
//! Built-in sniffs and presets for twig-cs.
//!
//! ## Available Sniffs
//!
//! | Code | Name | Phase | Description |
//! |------|------|-------|-------------|
//! | TCS001 | `line-length` | pre-parser | Limits characters per line |
//! | TCS002 | `no-tab-indent` | pre-parser | Forbids tabs in indentation |
//! | TCS003 | `blank-line-at-eof` | pre-parser | Requires a single trailing newline |
//! | TCS004 | `no-trailing-whitespace` | pre-parser | Forbids whitespace at line end |
//! | TCS005 | `delimiter-spacing` | pre-parser | One space inside `{{ }}`, `{% %}` and `{# #}` |
//! | TCS006 | `quote-style` | pre-parser | Consistent string quotes |
//! | TCS007 | `no-commented-code` | pre-parser | Forbids template code in comments |
//! | TCS101 | `no-dump` | post-parser | Forbids `dump` |
//! | TCS102 | `known-tests` | post-parser | Reports unknown `is` tests |
//! | TCS103 | `max-nesting` | post-parser | Limits block nesting depth |
//!
//! ## Usage
//!
//! ```ignore
//! use twig_cs_core::{Config, Linter, SourceUnit};
//! use twig_cs_sniffs::ruleset_from_config;
//!
//! let config = Config::parse("preset = \"strict\"")?;
//! let ruleset = ruleset_from_config(&config)?;
//! let report = Linter::builder().config(config).build().run(&units, &ruleset);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod blank_line_at_eof;
pub mod delimiter_spacing;
mod factory;
pub mod known_tests;
pub mod line_length;
pub mod max_nesting;
pub mod no_commented_code;
pub mod no_dump;
pub mod no_tab_indent;
pub mod no_trailing_whitespace;
mod options;
mod presets;
pub mod quote_style;

pub use blank_line_at_eof::BlankLineAtEof;
pub use delimiter_spacing::DelimiterSpacing;
pub use factory::ruleset_from_config;
pub use known_tests::KnownTests;
pub use line_length::LineLength;
pub use max_nesting::MaxNesting;
pub use no_commented_code::NoCommentedCode;
pub use no_dump::NoDump;
pub use no_tab_indent::NoTabIndent;
pub use no_trailing_whitespace::NoTrailingWhitespace;
pub use presets::{
    all_sniffs, minimal_sniffs, recommended_sniffs, sniff_by_name, strict_sniffs, Preset,
    SNIFF_NAMES,
};
pub use quote_style::{QuoteStyle, QuoteStyleSniff};

/// Re-export core types for convenience.
pub use twig_cs_core::{Finding, Phase, Severity, Sniff};

#[cfg(test)]
pub(crate) mod test_util {
    use twig_cs_core::{Finding, Linter, Ruleset, Sniff, SourceUnit};

    /// Runs a single sniff over `source` and returns its findings.
    pub fn lint<S: Sniff + 'static>(sniff: S, source: &str) -> Vec<Finding> {
        let mut ruleset = Ruleset::new();
        ruleset
            .add_sniff(Box::new(sniff))
            .expect("test sniff has a valid identity");
        let units = [SourceUnit::new("test.twig", source)];
        Linter::builder()
            .parallel(false)
            .build()
            .run(&units, &ruleset)
            .into_findings()
    }
}
