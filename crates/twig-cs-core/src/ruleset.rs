//! Identity-keyed registry of sniffs, grouped by phase.

use crate::sniff::{Phase, Sniff, SniffBox};

/// Errors raised while assembling a ruleset from code or configuration.
///
/// A failed registration leaves the ruleset unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// A phase value that is neither `pre_parser` nor `post_parser`.
    #[error("unknown phase `{value}`, expected: pre_parser, post_parser")]
    UnknownPhase {
        /// The invalid value.
        value: String,
    },

    /// A sniff identity that is empty or contains whitespace.
    #[error("invalid sniff identity `{identity}`")]
    InvalidIdentity {
        /// The invalid identity.
        identity: String,
    },

    /// A sniff name no built-in sniff answers to.
    #[error("unknown sniff `{name}`")]
    UnknownSniff {
        /// The unknown name.
        name: String,
    },

    /// A node kind name that does not exist.
    #[error("unknown node kind `{value}`")]
    UnknownNodeKind {
        /// The invalid value.
        value: String,
    },

    /// A token kind name that does not exist.
    #[error("unknown token kind `{value}`")]
    UnknownTokenKind {
        /// The invalid value.
        value: String,
    },

    /// A severity that is not notice, warning or error.
    #[error("unknown severity `{value}`, expected: notice, warning, error")]
    UnknownSeverity {
        /// The invalid value.
        value: String,
    },

    /// A required field is missing from a sniff definition.
    #[error("{sniff}: missing field `{field}`")]
    MissingField {
        /// The sniff being defined.
        sniff: String,
        /// The missing field.
        field: String,
    },

    /// An option has the wrong type or an out-of-range value.
    #[error("{sniff}: invalid option `{option}`: {reason}")]
    InvalidOption {
        /// The sniff the option belongs to.
        sniff: String,
        /// The option key.
        option: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Unknown preset name.
    #[error("unknown preset `{value}`, expected: recommended, strict, minimal")]
    UnknownPreset {
        /// The invalid value.
        value: String,
    },
}

/// The active set of sniffs, at most one per identity.
///
/// Sniffs are kept per [`Phase`] in registration order. Re-registering an
/// identity replaces the earlier sniff in place, so registration is
/// idempotent.
#[derive(Default)]
pub struct Ruleset {
    pre_parser: Vec<(String, SniffBox)>,
    post_parser: Vec<(String, SniffBox)>,
}

impl std::fmt::Debug for Ruleset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids = |entries: &[(String, SniffBox)]| {
            entries.iter().map(|(id, _)| id.clone()).collect::<Vec<_>>()
        };
        f.debug_struct("Ruleset")
            .field("pre_parser", &ids(&self.pre_parser))
            .field("post_parser", &ids(&self.post_parser))
            .finish()
    }
}

fn validate_identity(identity: &str) -> Result<(), ConfigurationError> {
    if identity.is_empty() || identity.chars().any(char::is_whitespace) {
        return Err(ConfigurationError::InvalidIdentity {
            identity: identity.to_string(),
        });
    }
    Ok(())
}

impl Ruleset {
    /// Creates an empty ruleset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ruleset by registering every sniff in order.
    ///
    /// # Errors
    ///
    /// Returns the first registration error.
    pub fn from_sniffs<I>(sniffs: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = SniffBox>,
    {
        let mut ruleset = Self::new();
        for sniff in sniffs {
            ruleset.add_sniff(sniff)?;
        }
        Ok(ruleset)
    }

    fn entries(&self, phase: Phase) -> &Vec<(String, SniffBox)> {
        match phase {
            Phase::PreParser => &self.pre_parser,
            Phase::PostParser => &self.post_parser,
        }
    }

    fn entries_mut(&mut self, phase: Phase) -> &mut Vec<(String, SniffBox)> {
        match phase {
            Phase::PreParser => &mut self.pre_parser,
            Phase::PostParser => &mut self.post_parser,
        }
    }

    /// Registers a sniff under its identity, routed by its phase.
    ///
    /// A sniff with the same identity is replaced, whichever phase it was
    /// registered under.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidIdentity`] if the sniff name is
    /// empty or contains whitespace. The ruleset is left unchanged.
    pub fn add_sniff(&mut self, sniff: SniffBox) -> Result<&mut Self, ConfigurationError> {
        let identity = sniff.name().to_string();
        validate_identity(&identity)?;

        let phase = sniff.phase();
        for other in Phase::ALL.into_iter().filter(|p| *p != phase) {
            self.entries_mut(other).retain(|(id, _)| *id != identity);
        }

        let entries = self.entries_mut(phase);
        match entries.iter_mut().find(|(id, _)| *id == identity) {
            Some(slot) => slot.1 = sniff,
            None => entries.push((identity, sniff)),
        }
        Ok(self)
    }

    /// Unregisters a sniff by identity. Does nothing if it is not registered.
    pub fn remove_sniff(&mut self, identity: &str) -> &mut Self {
        for phase in Phase::ALL {
            self.entries_mut(phase).retain(|(id, _)| id != identity);
        }
        self
    }

    /// Sniffs registered for any of `phases`, grouped in the order the
    /// phases are given, each group in registration order.
    #[must_use]
    pub fn get_sniffs(&self, phases: &[Phase]) -> Vec<&dyn Sniff> {
        phases
            .iter()
            .flat_map(|phase| self.phase_sniffs(*phase))
            .collect()
    }

    /// Sniffs of one phase in registration order.
    pub fn phase_sniffs(&self, phase: Phase) -> impl Iterator<Item = &dyn Sniff> {
        self.entries(phase).iter().map(|(_, sniff)| sniff.as_ref())
    }

    /// Every registered sniff, token-phase sniffs first.
    #[must_use]
    pub fn sniffs(&self) -> Vec<&dyn Sniff> {
        self.get_sniffs(&Phase::ALL)
    }

    /// Looks up a sniff by identity.
    #[must_use]
    pub fn get(&self, identity: &str) -> Option<&dyn Sniff> {
        Phase::ALL.into_iter().find_map(|phase| {
            self.entries(phase)
                .iter()
                .find(|(id, _)| id == identity)
                .map(|(_, sniff)| sniff.as_ref())
        })
    }

    /// Returns true if a sniff with this identity is registered.
    #[must_use]
    pub fn contains(&self, identity: &str) -> bool {
        self.get(identity).is_some()
    }

    /// Number of registered sniffs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pre_parser.len() + self.post_parser.len()
    }

    /// Returns true if no sniff is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
