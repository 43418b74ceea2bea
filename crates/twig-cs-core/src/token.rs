//! Token stream producer.
//!
//! The [`Lexer`] turns raw template source into [`Token`]s. It is lossless:
//! concatenating the text of every token yields the original source, byte for
//! byte. Whitespace inside `{{ }}` and `{% %}` is kept as
//! [`TokenKind::Whitespace`] tokens so that token-phase sniffs can inspect
//! spacing.

use crate::ruleset::ConfigurationError;

use miette::{Diagnostic, SourceSpan};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Raw template text outside of any delimiter.
    Text,
    /// `{{`, optionally with a `-` or `~` trim modifier.
    VarStart,
    /// `}}`, optionally with a `-` or `~` trim modifier.
    VarEnd,
    /// `{%`, optionally with a trim modifier.
    BlockStart,
    /// `%}`, optionally with a trim modifier.
    BlockEnd,
    /// `{#`, optionally with a trim modifier.
    CommentStart,
    /// `#}`, optionally with a trim modifier.
    CommentEnd,
    /// Body of a `{# #}` comment.
    Comment,
    /// Identifier or keyword.
    Name,
    /// Integer or decimal literal.
    Number,
    /// Quoted string literal, quotes included.
    String,
    /// Operator such as `+`, `==` or `??`.
    Operator,
    /// One of `( ) [ ] { } ? : . , |`.
    Punctuation,
    /// Whitespace inside an expression or tag.
    Whitespace,
}

impl TokenKind {
    /// All token kinds, in declaration order.
    pub const ALL: [Self; 14] = [
        Self::Text,
        Self::VarStart,
        Self::VarEnd,
        Self::BlockStart,
        Self::BlockEnd,
        Self::CommentStart,
        Self::CommentEnd,
        Self::Comment,
        Self::Name,
        Self::Number,
        Self::String,
        Self::Operator,
        Self::Punctuation,
        Self::Whitespace,
    ];

    /// Returns the snake_case name used in configuration files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::VarStart => "var_start",
            Self::VarEnd => "var_end",
            Self::BlockStart => "block_start",
            Self::BlockEnd => "block_end",
            Self::CommentStart => "comment_start",
            Self::CommentEnd => "comment_end",
            Self::Comment => "comment",
            Self::Name => "name",
            Self::Number => "number",
            Self::String => "string",
            Self::Operator => "operator",
            Self::Punctuation => "punctuation",
            Self::Whitespace => "whitespace",
        }
    }

    /// Returns true for `{{`, `{%` and `{#`.
    #[must_use]
    pub fn is_opening_delimiter(self) -> bool {
        matches!(self, Self::VarStart | Self::BlockStart | Self::CommentStart)
    }

    /// Returns true for `}}`, `%}` and `#}`.
    #[must_use]
    pub fn is_closing_delimiter(self) -> bool {
        matches!(self, Self::VarEnd | Self::BlockEnd | Self::CommentEnd)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ConfigurationError::UnknownTokenKind {
                value: s.to_string(),
            })
    }
}

/// A line/column position in a source unit. Both are 1-indexed; columns
/// count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A single lexeme with its category and source position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Lexical category.
    pub kind: TokenKind,
    /// Raw text of the lexeme.
    pub text: String,
    /// Line of the first character (1-indexed).
    pub line: usize,
    /// Column of the first character (1-indexed).
    pub column: usize,
    /// Byte offset of the first character.
    pub offset: usize,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub fn new(
        kind: TokenKind,
        text: impl Into<String>,
        line: usize,
        column: usize,
        offset: usize,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
            offset,
        }
    }

    /// Position of the first character.
    #[must_use]
    pub fn start(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Position just past the last character.
    #[must_use]
    pub fn end(&self) -> Position {
        advance(self.start(), &self.text)
    }

    /// Position of the character `index` bytes into the token text.
    #[must_use]
    pub fn position_at(&self, index: usize) -> Position {
        advance(self.start(), self.text.get(..index).unwrap_or(&self.text))
    }

    /// Returns true if the token has the given kind and text.
    #[must_use]
    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }

    /// Returns true if the token is whitespace.
    #[must_use]
    pub fn is_whitespace(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }
}

/// Moves `pos` over `text`.
fn advance(mut pos: Position, text: &str) -> Position {
    for c in text.chars() {
        if c == '\n' {
            pos.line += 1;
            pos.column = 1;
        } else {
            pos.column += 1;
        }
    }
    pos
}

/// Errors raised while tokenizing a source unit.
///
/// Tokenization stops at the first error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Diagnostic)]
pub enum TokenizeError {
    /// A `{{`, `{%` or `{#` was never closed.
    #[error("unclosed `{delimiter}` opened at line {line}, column {column}")]
    #[diagnostic(
        code(twig_cs::tokenize::unclosed_delimiter),
        help("close it with `{closing}`")
    )]
    UnclosedDelimiter {
        /// The opening delimiter.
        delimiter: &'static str,
        /// The expected closing delimiter.
        closing: &'static str,
        /// Line of the opening delimiter.
        line: usize,
        /// Column of the opening delimiter.
        column: usize,
        /// Byte span of the opening delimiter.
        #[label("opened here")]
        span: SourceSpan,
    },

    /// A string literal reached the end of input.
    #[error("unclosed string literal starting at line {line}, column {column}")]
    #[diagnostic(code(twig_cs::tokenize::unclosed_string))]
    UnclosedString {
        /// Line of the opening quote.
        line: usize,
        /// Column of the opening quote.
        column: usize,
        /// Byte span of the opening quote.
        #[label("string starts here")]
        span: SourceSpan,
    },

    /// A character that cannot start any token inside an expression or tag.
    #[error("unexpected character `{character}` at line {line}, column {column}")]
    #[diagnostic(code(twig_cs::tokenize::unexpected_character))]
    UnexpectedCharacter {
        /// The offending character.
        character: char,
        /// Line of the character.
        line: usize,
        /// Column of the character.
        column: usize,
        /// Byte span of the character.
        #[label("not valid here")]
        span: SourceSpan,
    },
}

impl TokenizeError {
    /// Position the error points at.
    #[must_use]
    pub fn position(&self) -> Position {
        match self {
            Self::UnclosedDelimiter { line, column, .. }
            | Self::UnclosedString { line, column, .. }
            | Self::UnexpectedCharacter { line, column, .. } => Position::new(*line, *column),
        }
    }
}

/// The three delimiter pairs of the template language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Var,
    Block,
    Comment,
}

impl Delimiter {
    fn from_marker(c: u8) -> Option<Self> {
        match c {
            b'{' => Some(Self::Var),
            b'%' => Some(Self::Block),
            b'#' => Some(Self::Comment),
            _ => None,
        }
    }

    fn opening(self) -> &'static str {
        match self {
            Self::Var => "{{",
            Self::Block => "{%",
            Self::Comment => "{#",
        }
    }

    fn closing(self) -> &'static str {
        match self {
            Self::Var => "}}",
            Self::Block => "%}",
            Self::Comment => "#}",
        }
    }

    fn kinds(self) -> (TokenKind, TokenKind) {
        match self {
            Self::Var => (TokenKind::VarStart, TokenKind::VarEnd),
            Self::Block => (TokenKind::BlockStart, TokenKind::BlockEnd),
            Self::Comment => (TokenKind::CommentStart, TokenKind::CommentEnd),
        }
    }
}

/// Where the opening delimiter of the current region sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Opening {
    delimiter: Delimiter,
    position: Position,
    offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    /// Inside `{{ }}` or `{% %}`; `depth` counts open `{` of hash literals.
    Code { opening: Opening, depth: usize },
    Comment { opening: Opening },
}

/// Operators longer than one character, longest first.
const MULTI_CHAR_OPERATORS: &[&str] = &[
    "...", "**", "//", "==", "!=", "<=", ">=", "??", "?:", "=>", "..",
];

const OPERATOR_CHARS: &str = "+-*/%~=<>!";
const PUNCTUATION_CHARS: &str = "()[]{}?:.,|";

/// Lazy tokenizer over a source string.
///
/// Yields `Ok(Token)` until the input is exhausted, or a single `Err` after
/// which the iterator is fused. The lexer is `Clone`, so a partially
/// consumed lexer can be forked and enumeration restarted from that point.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    position: Position,
    state: State,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer positioned at the start of `source`.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            position: Position::default(),
            state: State::Data,
            finished: false,
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    /// Emits the next `len` bytes as a token of `kind`.
    fn emit(&mut self, kind: TokenKind, len: usize) -> Token {
        let text = &self.source[self.offset..self.offset + len];
        let token = Token::new(
            kind,
            text,
            self.position.line,
            self.position.column,
            self.offset,
        );
        self.position = advance(self.position, text);
        self.offset += len;
        token
    }

    fn span_here(&self, len: usize) -> SourceSpan {
        SourceSpan::from((self.offset, len))
    }

    fn lex_data(&mut self) -> Token {
        let rest = self.rest();
        match find_opening(rest) {
            Some(0) => self.lex_opening(),
            Some(idx) => self.emit(TokenKind::Text, idx),
            None => self.emit(TokenKind::Text, rest.len()),
        }
    }

    fn lex_opening(&mut self) -> Token {
        let bytes = self.rest().as_bytes();
        let Some(delimiter) = bytes.get(1).copied().and_then(Delimiter::from_marker) else {
            // find_opening only stops on a valid marker
            return self.emit(TokenKind::Text, 1);
        };
        let len = if matches!(bytes.get(2), Some(b'-' | b'~')) {
            3
        } else {
            2
        };
        let opening = Opening {
            delimiter,
            position: self.position,
            offset: self.offset,
        };
        self.state = match delimiter {
            Delimiter::Comment => State::Comment { opening },
            Delimiter::Var | Delimiter::Block => State::Code { opening, depth: 0 },
        };
        self.emit(delimiter.kinds().0, len)
    }

    fn lex_comment(&mut self, opening: Opening) -> Result<Token, TokenizeError> {
        let rest = self.rest();
        if let Some(len) = closing_len(rest, Delimiter::Comment) {
            self.state = State::Data;
            return Ok(self.emit(TokenKind::CommentEnd, len));
        }
        let Some(idx) = rest.find("#}") else {
            return Err(unclosed(opening));
        };
        let body_len = if idx > 0 && matches!(rest.as_bytes()[idx - 1], b'-' | b'~') {
            idx - 1
        } else {
            idx
        };
        Ok(self.emit(TokenKind::Comment, body_len))
    }

    fn lex_code(&mut self, opening: Opening, depth: usize) -> Result<Token, TokenizeError> {
        let rest = self.rest();
        let Some(c) = rest.chars().next() else {
            return Err(unclosed(opening));
        };

        if c.is_whitespace() {
            let len = rest
                .char_indices()
                .find(|(_, ch)| !ch.is_whitespace())
                .map_or(rest.len(), |(i, _)| i);
            return Ok(self.emit(TokenKind::Whitespace, len));
        }

        if depth == 0 {
            if let Some(len) = closing_len(rest, opening.delimiter) {
                self.state = State::Data;
                return Ok(self.emit(opening.delimiter.kinds().1, len));
            }
        }

        if c == '\'' || c == '"' {
            return self.lex_string(c);
        }

        if c.is_ascii_digit() {
            // `a.0.1` is two attribute lookups, not `a` and `0.1`
            let before = &self.source[..self.offset];
            let attribute = before.ends_with('.') && !before.ends_with("..");
            return Ok(self.emit(TokenKind::Number, number_len(rest, !attribute)));
        }

        if c.is_alphabetic() || c == '_' {
            let len = rest
                .char_indices()
                .find(|(_, ch)| !(ch.is_alphanumeric() || *ch == '_'))
                .map_or(rest.len(), |(i, _)| i);
            return Ok(self.emit(TokenKind::Name, len));
        }

        if let Some(op) = MULTI_CHAR_OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            return Ok(self.emit(TokenKind::Operator, op.len()));
        }

        if PUNCTUATION_CHARS.contains(c) {
            let depth = match c {
                '{' => depth + 1,
                '}' => depth.saturating_sub(1),
                _ => depth,
            };
            self.state = State::Code { opening, depth };
            return Ok(self.emit(TokenKind::Punctuation, 1));
        }

        if OPERATOR_CHARS.contains(c) {
            return Ok(self.emit(TokenKind::Operator, 1));
        }

        Err(TokenizeError::UnexpectedCharacter {
            character: c,
            line: self.position.line,
            column: self.position.column,
            span: self.span_here(c.len_utf8()),
        })
    }

    fn lex_string(&mut self, quote: char) -> Result<Token, TokenizeError> {
        let rest = self.rest();
        let mut escaped = false;
        for (idx, ch) in rest.char_indices().skip(1) {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                return Ok(self.emit(TokenKind::String, idx + 1));
            }
        }
        Err(TokenizeError::UnclosedString {
            line: self.position.line,
            column: self.position.column,
            span: self.span_here(1),
        })
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, TokenizeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = match self.state {
            State::Data if self.offset >= self.source.len() => {
                self.finished = true;
                return None;
            }
            State::Data => Ok(self.lex_data()),
            State::Comment { opening } => self.lex_comment(opening),
            State::Code { opening, depth } => self.lex_code(opening, depth),
        };

        if result.is_err() {
            self.finished = true;
        }
        Some(result)
    }
}

fn unclosed(opening: Opening) -> TokenizeError {
    TokenizeError::UnclosedDelimiter {
        delimiter: opening.delimiter.opening(),
        closing: opening.delimiter.closing(),
        line: opening.position.line,
        column: opening.position.column,
        span: SourceSpan::from((opening.offset, 2)),
    }
}

/// Byte index of the first `{{`, `{%` or `{#` in `text`.
fn find_opening(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    text.match_indices('{')
        .map(|(idx, _)| idx)
        .find(|idx| matches!(bytes.get(idx + 1), Some(b'{' | b'%' | b'#')))
}

/// Length of the closing delimiter at the start of `text`, trim modifier included.
fn closing_len(text: &str, delimiter: Delimiter) -> Option<usize> {
    let closing = delimiter.closing();
    if text.starts_with(closing) {
        return Some(closing.len());
    }
    let trimmed = text.strip_prefix('-').or_else(|| text.strip_prefix('~'))?;
    trimmed.starts_with(closing).then_some(closing.len() + 1)
}

fn number_len(text: &str, fraction: bool) -> usize {
    let bytes = text.as_bytes();
    let mut len = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if fraction
        && bytes.get(len) == Some(&b'.') && bytes.get(len + 1).is_some_and(u8::is_ascii_digit) {
        len += 1;
        len += bytes[len..].iter().take_while(|b| b.is_ascii_digit()).count();
    }
    len
}

/// The complete, re-iterable token sequence of one source unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Creates an empty stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if the stream has no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Iterates over the tokens in source order.
    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// Returns the tokens as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    /// Returns the token at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Reassembles the source text from the token texts.
    #[must_use]
    pub fn to_source(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }
}

impl From<Vec<Token>> for TokenStream {
    fn from(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }
}

impl<'a> IntoIterator for &'a TokenStream {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// Tokenizes a whole source unit.
///
/// # Errors
///
/// Returns the first [`TokenizeError`] encountered.
pub fn tokenize(source: &str) -> Result<TokenStream, TokenizeError> {
    Lexer::new(source)
        .collect::<Result<Vec<_>, _>>()
        .map(TokenStream::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_at_walks_newlines() {
        let token = Token::new(TokenKind::Text, "ab\ncd", 3, 5, 10);
        assert_eq!(token.position_at(1), Position::new(3, 6));
        assert_eq!(token.position_at(4), Position::new(4, 2));
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("source should tokenize")
            .iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn empty_source_has_no_tokens() {
        let tokens = tokenize("").expect("empty source is valid");
        assert!(tokens.is_empty());
    }

    #[test]
    fn tokenization_is_lossless() {
        let samples = [
            "",
            "plain text only\n",
            "Hello {{ name }}!\n",
            "{% if user is defined %}\n  {{ user.name|upper }}\n{% endif %}\n",
            "{#- a comment -#}{{- 'x' ~}}\t{%~ set a = [1, 2.5, \"s\"] -%}",
            "{{ {'a': {'b': 1}} }}",
            "{{ \"}}\" }} tail { not a tag }",
            "ünïcödé {{ naïve }} ✓\r\n",
            "{{ a ?? b ?: c }}{{ 1..3 }}",
        ];
        for sample in samples {
            let tokens = tokenize(sample).expect("sample should tokenize");
            assert_eq!(tokens.to_source(), sample);
        }
    }

    #[test]
    fn print_statement_kinds() {
        assert_eq!(
            kinds("Hi {{ name }}"),
            vec![
                TokenKind::Text,
                TokenKind::VarStart,
                TokenKind::Whitespace,
                TokenKind::Name,
                TokenKind::Whitespace,
                TokenKind::VarEnd,
            ]
        );
    }

    #[test]
    fn trim_modifiers_belong_to_delimiters() {
        let tokens = tokenize("{{- x -}}").expect("valid");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["{{-", " ", "x", " ", "-}}"]);
    }

    #[test]
    fn comment_body_is_one_token() {
        let tokens = tokenize("{# {{ old }} #}").expect("valid");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens.as_slice()[1].kind, TokenKind::Comment);
        assert_eq!(tokens.as_slice()[1].text, " {{ old }} ");
    }

    #[test]
    fn closing_marker_inside_string_is_not_a_delimiter() {
        let tokens = tokenize("{{ '}}' }}").expect("valid");
        assert_eq!(tokens.as_slice()[2].kind, TokenKind::String);
        assert_eq!(tokens.as_slice()[2].text, "'}}'");
    }

    #[test]
    fn hash_literal_braces_are_tracked() {
        let tokens = tokenize("{{ {'a': 1}}}").expect("valid");
        let last = tokens.iter().last().expect("has tokens");
        assert_eq!(last.kind, TokenKind::VarEnd);
        assert_eq!(last.offset, 11);
    }

    #[test]
    fn escaped_quotes_stay_in_string() {
        let tokens = tokenize(r"{{ 'it\'s' }}").expect("valid");
        assert_eq!(tokens.as_slice()[2].text, r"'it\'s'");
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let tokens = tokenize("a\n  {{ b }}").expect("valid");
        let name = tokens
            .iter()
            .find(|t| t.kind == TokenKind::Name)
            .expect("has a name");
        assert_eq!(name.start(), Position::new(2, 6));
        assert_eq!(name.end(), Position::new(2, 7));
    }

    #[test]
    fn operators_and_numbers() {
        let tokens = tokenize("{{ 1.5 ** 2 != x }}").expect("valid");
        let significant: Vec<(TokenKind, &str)> = tokens
            .iter()
            .filter(|t| !t.is_whitespace())
            .map(|t| (t.kind, t.text.as_str()))
            .collect();
        assert_eq!(
            significant[1..6],
            [
                (TokenKind::Number, "1.5"),
                (TokenKind::Operator, "**"),
                (TokenKind::Number, "2"),
                (TokenKind::Operator, "!="),
                (TokenKind::Name, "x"),
            ]
        );
    }

    #[test]
    fn numbers_after_a_dot_are_attribute_names() {
        let tokens = tokenize("{{ a.0.1 ~ 1..2.5 }}").expect("valid");
        let significant: Vec<(TokenKind, &str)> = tokens
            .iter()
            .filter(|t| !t.is_whitespace())
            .map(|t| (t.kind, t.text.as_str()))
            .collect();
        assert_eq!(
            significant[1..10],
            [
                (TokenKind::Name, "a"),
                (TokenKind::Punctuation, "."),
                (TokenKind::Number, "0"),
                (TokenKind::Punctuation, "."),
                (TokenKind::Number, "1"),
                (TokenKind::Operator, "~"),
                (TokenKind::Number, "1"),
                (TokenKind::Operator, ".."),
                (TokenKind::Number, "2.5"),
            ]
        );
    }

    #[test]
    fn unclosed_print_points_at_opening() {
        let err = tokenize("line\n  {{ name").expect_err("should fail");
        assert!(matches!(
            err,
            TokenizeError::UnclosedDelimiter {
                delimiter: "{{",
                ..
            }
        ));
        assert_eq!(err.position(), Position::new(2, 3));
    }

    #[test]
    fn unclosed_comment_is_an_error() {
        let err = tokenize("{# never closed").expect_err("should fail");
        assert!(matches!(
            err,
            TokenizeError::UnclosedDelimiter {
                delimiter: "{#",
                ..
            }
        ));
    }

    #[test]
    fn unclosed_string_is_an_error() {
        let err = tokenize("{{ 'abc }}").expect_err("should fail");
        assert!(matches!(err, TokenizeError::UnclosedString { .. }));
        assert_eq!(err.position(), Position::new(1, 4));
    }

    #[test]
    fn unexpected_character_is_an_error() {
        let err = tokenize("{{ a @ b }}").expect_err("should fail");
        assert!(matches!(
            err,
            TokenizeError::UnexpectedCharacter { character: '@', .. }
        ));
    }

    #[test]
    fn lexer_is_fused_after_error() {
        let mut lexer = Lexer::new("{{ $ }}");
        let results: Vec<_> = lexer.by_ref().collect();
        assert!(results.last().is_some_and(Result::is_err));
        assert!(lexer.next().is_none());
    }

    #[test]
    fn lexer_clone_restarts_enumeration() {
        let mut lexer = Lexer::new("a {{ b }} c");
        let _ = lexer.next();
        let fork = lexer.clone();
        let rest: Vec<_> = lexer.collect::<Result<_, _>>().expect("valid");
        let again: Vec<_> = fork.collect::<Result<_, _>>().expect("valid");
        assert_eq!(rest, again);
    }

    #[test]
    fn token_kind_round_trips_through_config_names() {
        assert_eq!("var_start".parse::<TokenKind>().ok(), Some(TokenKind::VarStart));
        assert!("nonsense".parse::<TokenKind>().is_err());
    }
}
