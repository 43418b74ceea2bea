//! Builds a [`Ruleset`] from a [`Config`].

use crate::presets::{sniff_by_name, Preset};
use twig_cs_core::{declarative, Config, ConfigurationError, Ruleset};

/// Resolves the configured preset, sniff sections and `[[forbid]]` rules
/// into a ruleset.
///
/// Starting from the preset (recommended when unset):
///
/// 1. every preset sniff with a `[sniffs.<name>]` section is rebuilt with
///    its options over the preset's own tuning,
/// 2. sections with `enabled = true` add sniffs outside the preset,
/// 3. sections with `enabled = false` remove the sniff,
/// 4. declarative `[[forbid]]` rules are appended.
///
/// Severity overrides are left to the linter, which reads them from the
/// same configuration.
///
/// # Errors
///
/// Returns an error for an unknown preset, an unknown sniff section, an
/// invalid sniff option or an invalid declarative rule.
pub fn ruleset_from_config(config: &Config) -> Result<Ruleset, ConfigurationError> {
    let preset = match config.preset.as_deref() {
        Some(name) => name.parse()?,
        None => Preset::default(),
    };
    let mut ruleset = Ruleset::new();

    for sniff in preset.sniffs() {
        match config.sniff(sniff.name()) {
            Some(section) => {
                let name = sniff.name().to_string();
                ruleset.add_sniff(preset.sniff(&name, Some(section))?)?;
            }
            None => {
                ruleset.add_sniff(sniff)?;
            }
        }
    }

    let forbid_names: Vec<&str> = config.forbid.iter().map(|f| f.name.as_str()).collect();
    for (name, section) in &config.sniffs {
        if forbid_names.contains(&name.as_str()) {
            continue;
        }
        match section.enabled {
            Some(false) => {
                ruleset.remove_sniff(name);
            }
            Some(true) if !ruleset.contains(name) => {
                ruleset.add_sniff(sniff_by_name(name, Some(section))?)?;
            }
            // Still validates the name for sections that only tune options
            _ => {
                sniff_by_name(name, Some(section))?;
            }
        }
    }

    for sniff in declarative::load(&config.forbid)? {
        ruleset.add_sniff(sniff)?;
    }

    tracing::debug!(
        preset = preset.as_str(),
        sniffs = ruleset.len(),
        "Resolved ruleset"
    );
    Ok(ruleset)
}
