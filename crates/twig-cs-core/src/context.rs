//! Context passed to sniffs.

use crate::report::Location;

/// Context provided to sniffs for one source unit.
///
/// Sniffs use it to build finding locations and to look at the raw source
/// around a token or node.
#[derive(Debug, Clone, Copy)]
pub struct UnitContext<'a> {
    /// Identifier of the unit (usually its path).
    pub unit: &'a str,
    /// Full source text of the unit.
    pub source: &'a str,
}

impl<'a> UnitContext<'a> {
    /// Creates a new unit context.
    #[must_use]
    pub fn new(unit: &'a str, source: &'a str) -> Self {
        Self { unit, source }
    }

    /// Builds a [`Location`] in this unit.
    #[must_use]
    pub fn location(&self, line: usize, column: Option<usize>) -> Location {
        Location::new(self.unit, line, column)
    }

    /// Iterates over source lines without their terminators, numbered from 1.
    ///
    /// A trailing `\r` is kept so sniffs can report it.
    pub fn lines(&self) -> impl Iterator<Item = (usize, &'a str)> {
        self.source.split('\n').enumerate().map(|(i, l)| (i + 1, l))
    }

    /// Text of a 1-indexed line, without its terminator.
    #[must_use]
    pub fn line_text(&self, line: usize) -> Option<&'a str> {
        if line == 0 {
            return None;
        }
        self.source.split('\n').nth(line - 1)
    }

    /// Number of lines, counting a trailing partial line.
    #[must_use]
    pub fn line_count(&self) -> usize {
        if self.source.is_empty() {
            0
        } else {
            self.source.split('\n').count()
        }
    }

    /// Calculates the byte offset of a 1-indexed line and character column.
    ///
    /// Returns `None` when the position is outside the source.
    #[must_use]
    pub fn offset_for(&self, line: usize, column: usize) -> Option<usize> {
        if line == 0 || column == 0 {
            return None;
        }

        let mut offset = 0;
        for (i, text) in self.source.split('\n').enumerate() {
            if i + 1 == line {
                let within = if column - 1 == text.chars().count() {
                    text.len()
                } else {
                    text.char_indices().nth(column - 1)?.0
                };
                return Some(offset + within);
            }
            offset += text.len() + 1;
        }
        None
    }
}
