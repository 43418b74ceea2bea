//! Findings and the aggregated lint report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Severity level of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, does not fail a run.
    Notice,
    /// Should be addressed.
    Warning,
    /// Must be fixed. Any error makes the run fail.
    Error,
}

impl Severity {
    /// All severities, lowest first.
    pub const ALL: [Self; 3] = [Self::Notice, Self::Warning, Self::Error];
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Notice => write!(f, "notice"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = crate::ruleset::ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notice" => Ok(Self::Notice),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            _ => Err(crate::ruleset::ConfigurationError::UnknownSeverity {
                value: s.to_string(),
            }),
        }
    }
}

/// Where a finding points.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Identifier of the source unit (usually its path).
    pub unit: String,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed), when the finding has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl Location {
    /// Creates a new location.
    #[must_use]
    pub fn new(unit: impl Into<String>, line: usize, column: Option<usize>) -> Self {
        Self {
            unit: unit.into(),
            line,
            column,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.column {
            Some(column) => write!(f, "{}:{}:{}", self.unit, self.line, column),
            None => write!(f, "{}:{}", self.unit, self.line),
        }
    }
}

/// One violation reported by a sniff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Sniff code (e.g., "TCS001").
    pub code: String,
    /// Sniff identity (e.g., "line-length").
    pub sniff: String,
    /// Severity of this finding.
    pub severity: Severity,
    /// Where the finding points.
    pub location: Location,
    /// Human-readable message.
    pub message: String,
}

impl Finding {
    /// Creates a new finding.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        sniff: impl Into<String>,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            sniff: sniff.into(),
            severity,
            location,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.location, self.severity, self.code, self.message
        )
    }
}

/// Counters of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Units linted.
    pub files: usize,
    /// Findings at notice level.
    pub notices: usize,
    /// Findings at warning level.
    pub warnings: usize,
    /// Findings at error level.
    pub errors: usize,
}

/// Aggregated result of a lint run.
///
/// Findings are kept in unit order, then in the order sniffs produced them.
/// The severity counters are always computed from the findings, so they
/// cannot drift.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    findings: Vec<Finding>,
    files: usize,
}

impl Report {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one linted unit together with its findings.
    pub fn add_unit(&mut self, findings: Vec<Finding>) {
        self.files += 1;
        self.findings.extend(findings);
    }

    /// All findings, in order.
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Consumes the report and returns its findings.
    #[must_use]
    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }

    /// Number of units linted.
    #[must_use]
    pub fn files(&self) -> usize {
        self.files
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    /// Number of notice findings.
    #[must_use]
    pub fn notices(&self) -> usize {
        self.count(Severity::Notice)
    }

    /// Number of warning findings.
    #[must_use]
    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Number of error findings.
    #[must_use]
    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Returns true if there are any error findings.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    /// All counters at once.
    #[must_use]
    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            files: self.files,
            ..Summary::default()
        };
        for finding in &self.findings {
            match finding.severity {
                Severity::Notice => summary.notices += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Error => summary.errors += 1,
            }
        }
        summary
    }

    /// Findings for one unit.
    #[must_use]
    pub fn by_unit(&self, unit: &str) -> Vec<&Finding> {
        self.findings
            .iter()
            .filter(|f| f.location.unit == unit)
            .collect()
    }

    /// Findings of the given severity.
    #[must_use]
    pub fn by_severity(&self, severity: Severity) -> Vec<&Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .collect()
    }

    /// Findings grouped by unit, units in first-seen order.
    #[must_use]
    pub fn grouped_by_unit(&self) -> Vec<(&str, Vec<&Finding>)> {
        let mut order: Vec<&str> = Vec::new();
        let mut groups: BTreeMap<&str, Vec<&Finding>> = BTreeMap::new();
        for finding in &self.findings {
            let unit = finding.location.unit.as_str();
            groups
                .entry(unit)
                .or_insert_with(|| {
                    order.push(unit);
                    Vec::new()
                })
                .push(finding);
        }
        order
            .into_iter()
            .map(|unit| (unit, groups.remove(unit).unwrap_or_default()))
            .collect()
    }

    /// Appends another report.
    pub fn merge(&mut self, other: Self) {
        self.findings.extend(other.findings);
        self.files += other.files;
    }

    /// One-line summary, e.g. `Files linted: 3, notices: 0, warnings: 1, errors: 0`.
    #[must_use]
    pub fn format_summary(&self) -> String {
        let s = self.summary();
        format!(
            "Files linted: {}, notices: {}, warnings: {}, errors: {}",
            s.files, s.notices, s.warnings, s.errors
        )
    }
}
