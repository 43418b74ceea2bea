//! Syntax tree builders.
//!
//! A [`TreeBuilder`] turns a [`TokenStream`] into a rooted [`TreeNode`]
//! tree. Dialects plug in their own builder; [`GenericTreeBuilder`] covers
//! the Twig-like syntax the built-in sniffs expect.
//!
//! Builders may emit [`NodeKind::DialectTest`] nodes for test constructs
//! they treat specially. Before any tree-phase sniff runs, the linter
//! rewrites those through the builder's [`TestNormalizer`] so that every
//! test expression reaches sniffs as a single [`NodeKind::Test`] kind.

use crate::token::{Position, Token, TokenKind, TokenStream};
use crate::tree::{NodeKind, Span, TreeNode};

use miette::{Diagnostic, SourceSpan};
use std::collections::BTreeMap;

/// Errors raised while building the syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Diagnostic)]
pub enum SyntaxError {
    /// A token that cannot appear at this point.
    #[error("unexpected {found} at line {line}, column {column}, expected {expected}")]
    #[diagnostic(code(twig_cs::syntax::unexpected_token))]
    UnexpectedToken {
        /// Description of the offending token.
        found: String,
        /// What the builder was looking for.
        expected: String,
        /// Line of the token.
        line: usize,
        /// Column of the token.
        column: usize,
        /// Byte span of the token.
        #[label("unexpected")]
        span: SourceSpan,
    },

    /// The token stream ended in the middle of a construct.
    #[error("unexpected end of template at line {line}, column {column}, expected {expected}")]
    #[diagnostic(code(twig_cs::syntax::unexpected_end))]
    UnexpectedEnd {
        /// What the builder was looking for.
        expected: String,
        /// Line where input ended.
        line: usize,
        /// Column where input ended.
        column: usize,
        /// Empty span at the end of input.
        #[label("input ends here")]
        span: SourceSpan,
    },

    /// `{{ }}` with nothing inside.
    #[error("empty expression at line {line}, column {column}")]
    #[diagnostic(code(twig_cs::syntax::empty_expression))]
    EmptyExpression {
        /// Line of the opening delimiter.
        line: usize,
        /// Column of the opening delimiter.
        column: usize,
        /// Byte span of the opening delimiter.
        #[label("nothing to print")]
        span: SourceSpan,
    },

    /// `{% %}` with no tag name.
    #[error("missing tag name at line {line}, column {column}")]
    #[diagnostic(code(twig_cs::syntax::missing_tag_name))]
    MissingTagName {
        /// Line of the opening delimiter.
        line: usize,
        /// Column of the opening delimiter.
        column: usize,
        /// Byte span of the opening delimiter.
        #[label("tag name expected after this")]
        span: SourceSpan,
    },

    /// An end or intermediate tag with no matching opening block.
    #[error("unexpected `{tag}` tag at line {line}, column {column}")]
    #[diagnostic(code(twig_cs::syntax::unexpected_tag))]
    UnexpectedTag {
        /// The tag name.
        tag: String,
        /// Line of the tag name.
        line: usize,
        /// Column of the tag name.
        column: usize,
        /// Byte span of the tag name.
        #[label("no open block accepts this tag")]
        span: SourceSpan,
    },

    /// A block tag that is never closed.
    #[error("unclosed `{tag}` block opened at line {line}, column {column}, expected `{expected}`")]
    #[diagnostic(code(twig_cs::syntax::unclosed_block))]
    UnclosedBlock {
        /// The opening tag name.
        tag: String,
        /// The closing tag name.
        expected: String,
        /// Line of the opening tag.
        line: usize,
        /// Column of the opening tag.
        column: usize,
        /// Byte span of the opening tag name.
        #[label("opened here")]
        span: SourceSpan,
    },

    /// Expressions or blocks nested deeper than the parser allows.
    #[error("nesting too deep at line {line}, column {column}")]
    #[diagnostic(
        code(twig_cs::syntax::nesting_too_deep),
        help("split the template into smaller includes or macros")
    )]
    NestingTooDeep {
        /// Line of the token that exceeded the limit.
        line: usize,
        /// Column of the token that exceeded the limit.
        column: usize,
        /// Byte span of that token.
        #[label("too deep")]
        span: SourceSpan,
    },
}

impl SyntaxError {
    /// Position the error points at.
    #[must_use]
    pub fn position(&self) -> Position {
        match self {
            Self::UnexpectedToken { line, column, .. }
            | Self::UnexpectedEnd { line, column, .. }
            | Self::EmptyExpression { line, column, .. }
            | Self::MissingTagName { line, column, .. }
            | Self::UnexpectedTag { line, column, .. }
            | Self::UnclosedBlock { line, column, .. }
            | Self::NestingTooDeep { line, column, .. } => Position::new(*line, *column),
        }
    }
}

fn token_span(token: &Token) -> SourceSpan {
    SourceSpan::from((token.offset, token.text.len()))
}

fn unexpected_token(token: &Token, expected: &str) -> SyntaxError {
    SyntaxError::UnexpectedToken {
        found: format!("{} `{}`", token.kind, token.text),
        expected: expected.to_string(),
        line: token.line,
        column: token.column,
        span: token_span(token),
    }
}

/// Maps dialect-specific test constructs onto the generic test kind.
pub trait TestNormalizer: Send + Sync {
    /// Returns the generic test name when `node` is a dialect-specific test
    /// construct, `None` otherwise.
    fn test_name(&self, node: &TreeNode) -> Option<String>;
}

/// Normalizer that maps every [`NodeKind::DialectTest`] to [`NodeKind::Test`],
/// whatever its subtype.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubbedTests;

impl TestNormalizer for StubbedTests {
    fn test_name(&self, node: &TreeNode) -> Option<String> {
        match &node.kind {
            NodeKind::DialectTest(subtype) => {
                Some(node.name().map_or_else(|| subtype.clone(), str::to_string))
            }
            _ => None,
        }
    }
}

/// Rewrites every node recognized by `normalizer` into a [`NodeKind::Test`]
/// node carrying a `name` attribute. Returns the number of rewritten nodes.
pub fn normalize_tests(root: &mut TreeNode, normalizer: &dyn TestNormalizer) -> usize {
    let mut count = 0;
    if let Some(name) = normalizer.test_name(root) {
        root.kind = NodeKind::Test;
        root.attributes.insert("name".to_string(), name);
        count += 1;
    }
    for child in &mut root.children {
        count += normalize_tests(child, normalizer);
    }
    count
}

/// A dialect parsing collaborator.
pub trait TreeBuilder: Send + Sync {
    /// Dialect name, used in logs.
    fn name(&self) -> &str;

    /// Builds the tree for one source unit.
    ///
    /// # Errors
    ///
    /// Returns a [`SyntaxError`] pointing at the offending token.
    fn build(&self, tokens: &TokenStream) -> Result<TreeNode, SyntaxError>;

    /// Hook mapping this dialect's test constructs to the generic test kind.
    fn test_normalizer(&self) -> &dyn TestNormalizer {
        &StubbedTests
    }
}

/// Tags that open a body, with their intermediate tags.
const DEFAULT_BODY_TAGS: &[(&str, &[&str])] = &[
    ("if", &["elseif", "else"]),
    ("for", &["else"]),
    ("block", &[]),
    ("macro", &[]),
    ("filter", &[]),
    ("apply", &[]),
    ("spaceless", &[]),
    ("embed", &[]),
    ("with", &[]),
    ("autoescape", &[]),
    ("sandbox", &[]),
    ("set", &[]),
];

/// Nested expressions and blocks a unit may contain.
pub const MAX_NESTING: usize = 64;

/// Depth of the built tree, counting operator and postfix chains.
pub const MAX_TREE_DEPTH: usize = 1024;

/// Tests whose name spans two words.
const TWO_WORD_TESTS: &[(&str, &str)] = &[("same", "as"), ("divisible", "by")];

/// Binding power of binary operators. Higher binds tighter.
fn binary_precedence(op: &str) -> Option<u16> {
    let prec = match op {
        "=" | "=>" => 0,
        "or" => 10,
        "and" => 15,
        "==" | "!=" | "<" | ">" | "<=" | ">=" | "in" | "not in" | "matches" | "starts with"
        | "ends with" => 20,
        ".." => 25,
        "+" | "-" => 30,
        "~" => 40,
        "*" | "/" | "//" | "%" => 60,
        "is" | "is not" => 100,
        "**" => 200,
        "??" => 250,
        _ => return None,
    };
    Some(prec)
}

/// Tree builder for the generic Twig-like dialect.
///
/// Core tests with dedicated semantics (`defined`, `null`, `same as`,
/// `divisible by`, `even`, `odd`, `constant`) are emitted as
/// [`NodeKind::DialectTest`] nodes; all other tests are emitted as
/// [`NodeKind::Test`] directly.
#[derive(Debug, Clone)]
pub struct GenericTreeBuilder {
    body_tags: BTreeMap<String, Vec<String>>,
}

impl Default for GenericTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GenericTreeBuilder {
    /// Creates a builder with the default body tags.
    #[must_use]
    pub fn new() -> Self {
        let body_tags = DEFAULT_BODY_TAGS
            .iter()
            .map(|(tag, mids)| {
                (
                    (*tag).to_string(),
                    mids.iter().map(|m| (*m).to_string()).collect(),
                )
            })
            .collect();
        Self { body_tags }
    }

    /// Registers an extra tag that opens a body closed by `end<name>`.
    #[must_use]
    pub fn with_body_tag(mut self, name: impl Into<String>, intermediates: &[&str]) -> Self {
        self.body_tags.insert(
            name.into(),
            intermediates.iter().map(|m| (*m).to_string()).collect(),
        );
        self
    }

    fn opens_body(&self, name: &str, args: &[TreeNode]) -> bool {
        if !self.body_tags.contains_key(name) {
            return false;
        }
        match name {
            // `{% block title 'Home' %}` is the short form
            "block" => args.len() <= 1,
            // `{% set x = 1 %}` assigns, `{% set x %}...{% endset %}` captures
            "set" => !args
                .iter()
                .any(|a| a.kind == NodeKind::Binary && a.attr("operator") == Some("=")),
            _ => true,
        }
    }

    fn is_closing_tag(&self, name: &str) -> bool {
        name.strip_prefix("end")
            .is_some_and(|tag| self.body_tags.contains_key(tag))
            || self
                .body_tags
                .values()
                .any(|mids| mids.iter().any(|m| m == name))
    }

    fn test_kind(name: &str) -> NodeKind {
        let subtype = match name {
            "defined" => "defined",
            "null" | "none" => "null",
            "same as" | "sameas" => "same_as",
            "divisible by" | "divisibleby" => "divisible_by",
            "even" => "even",
            "odd" => "odd",
            "constant" => "constant",
            _ => return NodeKind::Test,
        };
        NodeKind::DialectTest(subtype.to_string())
    }
}

impl TreeBuilder for GenericTreeBuilder {
    fn name(&self) -> &str {
        "generic"
    }

    fn build(&self, tokens: &TokenStream) -> Result<TreeNode, SyntaxError> {
        Parser::new(tokens.as_slice(), self).parse_template()
    }
}

/// `{% name` as read by [`Parser::parse_tag_head`].
struct TagHead<'t> {
    name: &'t str,
    start: &'t Token,
    name_token: &'t Token,
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    last_end: Position,
    last_offset: usize,
    dialect: &'t GenericTreeBuilder,
    nesting: usize,
    tree_depth: usize,
}

fn wrap(kind: NodeKind, first: TreeNode) -> TreeNode {
    TreeNode::new(kind, first.span).with_child(first)
}

fn extend_to(node: &mut TreeNode, token: &Token) {
    node.span = node.span.join(Span::of_token(token));
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token], dialect: &'t GenericTreeBuilder) -> Self {
        Self {
            tokens,
            pos: 0,
            last_end: Position::default(),
            last_offset: 0,
            dialect,
            nesting: 0,
            tree_depth: 0,
        }
    }

    /// Enters one level of recursion. Errors abort the whole build, so a
    /// failed `enter` needs no matching `leave`.
    fn enter(&mut self) -> Result<(), SyntaxError> {
        self.nesting += 1;
        if self.nesting > MAX_NESTING {
            return Err(self.too_deep());
        }
        self.deepen()
    }

    fn leave(&mut self) {
        self.nesting -= 1;
        self.tree_depth -= 1;
    }

    /// Accounts for one node wrapped around the current one.
    fn deepen(&mut self) -> Result<(), SyntaxError> {
        self.tree_depth += 1;
        if self.tree_depth > MAX_TREE_DEPTH {
            return Err(self.too_deep());
        }
        Ok(())
    }

    fn too_deep(&self) -> SyntaxError {
        match self.peek_sig(0) {
            Some(token) => SyntaxError::NestingTooDeep {
                line: token.line,
                column: token.column,
                span: token_span(token),
            },
            None => SyntaxError::NestingTooDeep {
                line: self.last_end.line,
                column: self.last_end.column,
                span: SourceSpan::from((self.last_offset, 0)),
            },
        }
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    /// The `n`-th token from the cursor that is not whitespace.
    fn peek_sig(&self, n: usize) -> Option<&'t Token> {
        self.tokens[self.pos..]
            .iter()
            .filter(|t| !t.is_whitespace())
            .nth(n)
    }

    fn peek_sig_is(&self, kind: TokenKind, text: &str) -> bool {
        self.peek_sig(0).is_some_and(|t| t.is(kind, text))
    }

    fn bump(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        self.last_end = token.end();
        self.last_offset = token.offset + token.text.len();
        Some(token)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(Token::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Skips whitespace and consumes the next token.
    fn bump_sig(&mut self) -> Option<&'t Token> {
        self.skip_ws();
        self.bump()
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        match self.peek_sig(0) {
            Some(token) => unexpected_token(token, expected),
            None => SyntaxError::UnexpectedEnd {
                expected: expected.to_string(),
                line: self.last_end.line,
                column: self.last_end.column,
                span: SourceSpan::from((self.last_offset, 0)),
            },
        }
    }

    fn expect_kind(&mut self, kind: TokenKind, expected: &str) -> Result<&'t Token, SyntaxError> {
        match self.peek_sig(0) {
            Some(token) if token.kind == kind => {
                self.bump_sig();
                Ok(token)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn expect_punct(&mut self, text: &str) -> Result<&'t Token, SyntaxError> {
        match self.peek_sig(0) {
            Some(token) if token.is(TokenKind::Punctuation, text) => {
                self.bump_sig();
                Ok(token)
            }
            _ => Err(self.unexpected(&format!("`{text}`"))),
        }
    }

    fn parse_template(&mut self) -> Result<TreeNode, SyntaxError> {
        let mut root = TreeNode::new(NodeKind::Template, Span::default());
        let (nodes, _) = self.parse_body(&[])?;
        for node in nodes {
            root.push(node);
        }
        Ok(root)
    }

    /// Parses template nodes until EOF or one of the `stops` tags.
    fn parse_body(
        &mut self,
        stops: &[&str],
    ) -> Result<(Vec<TreeNode>, Option<TagHead<'t>>), SyntaxError> {
        let mut nodes = Vec::new();
        while let Some(token) = self.bump() {
            match token.kind {
                TokenKind::Text => nodes.push(TreeNode::new(NodeKind::Text, Span::of_token(token))),
                TokenKind::CommentStart => nodes.push(self.parse_comment(token)?),
                TokenKind::VarStart => nodes.push(self.parse_print(token)?),
                TokenKind::BlockStart => {
                    let head = self.parse_tag_head(token)?;
                    if stops.contains(&head.name) {
                        return Ok((nodes, Some(head)));
                    }
                    if self.dialect.is_closing_tag(head.name) {
                        return Err(SyntaxError::UnexpectedTag {
                            tag: head.name.to_string(),
                            line: head.name_token.line,
                            column: head.name_token.column,
                            span: token_span(head.name_token),
                        });
                    }
                    nodes.push(self.parse_tag(&head)?);
                }
                _ => return Err(unexpected_token(token, "template data")),
            }
        }
        Ok((nodes, None))
    }

    fn parse_comment(&mut self, start: &'t Token) -> Result<TreeNode, SyntaxError> {
        let mut node = TreeNode::new(NodeKind::Comment, Span::of_token(start));
        if self.peek().is_some_and(|t| t.kind == TokenKind::Comment) {
            self.bump();
        }
        let end = self.expect_kind(TokenKind::CommentEnd, "`#}`")?;
        extend_to(&mut node, end);
        Ok(node)
    }

    fn parse_print(&mut self, start: &'t Token) -> Result<TreeNode, SyntaxError> {
        if self.peek_sig(0).is_some_and(|t| t.kind == TokenKind::VarEnd) {
            return Err(SyntaxError::EmptyExpression {
                line: start.line,
                column: start.column,
                span: token_span(start),
            });
        }
        let mut node = TreeNode::new(NodeKind::Print, Span::of_token(start));
        node.push(self.parse_expression()?);
        let end = self.expect_kind(TokenKind::VarEnd, "`}}`")?;
        extend_to(&mut node, end);
        Ok(node)
    }

    fn parse_tag_head(&mut self, start: &'t Token) -> Result<TagHead<'t>, SyntaxError> {
        match self.peek_sig(0) {
            Some(token) if token.kind == TokenKind::Name => {
                self.bump_sig();
                Ok(TagHead {
                    name: token.text.as_str(),
                    start,
                    name_token: token,
                })
            }
            Some(token) if token.kind != TokenKind::BlockEnd => {
                Err(unexpected_token(token, "tag name"))
            }
            _ => Err(SyntaxError::MissingTagName {
                line: start.line,
                column: start.column,
                span: token_span(start),
            }),
        }
    }

    /// Parses tag arguments up to and including `%}`.
    fn parse_tag_args(&mut self) -> Result<(Vec<TreeNode>, &'t Token), SyntaxError> {
        let mut args = Vec::new();
        loop {
            match self.peek_sig(0) {
                Some(token) if token.kind == TokenKind::BlockEnd => {
                    self.bump_sig();
                    return Ok((args, token));
                }
                Some(token) if token.is(TokenKind::Punctuation, ",") => {
                    self.bump_sig();
                }
                Some(_) => args.push(self.parse_expression()?),
                None => return Err(self.unexpected("`%}`")),
            }
        }
    }

    fn parse_tag(&mut self, head: &TagHead<'t>) -> Result<TreeNode, SyntaxError> {
        self.enter()?;
        let node = self.parse_tag_inner(head);
        self.leave();
        node
    }

    fn parse_tag_inner(&mut self, head: &TagHead<'t>) -> Result<TreeNode, SyntaxError> {
        let (args, end) = self.parse_tag_args()?;
        let span = Span::new(head.start.start(), end.end());
        let opens_body = self.dialect.opens_body(head.name, &args);

        let kind = if opens_body {
            NodeKind::Block
        } else {
            NodeKind::Tag
        };
        let mut node = TreeNode::new(kind, span).with_attr("name", head.name);
        for arg in args {
            node.push(arg);
        }
        if !opens_body {
            return Ok(node);
        }

        let end_name = format!("end{}", head.name);
        let mut stops: Vec<&str> = self
            .dialect
            .body_tags
            .get(head.name)
            .map(|mids| mids.iter().map(String::as_str).collect())
            .unwrap_or_default();
        stops.push(&end_name);

        let mut branch: Option<TreeNode> = None;
        loop {
            let mut body = TreeNode::new(NodeKind::Body, Span::new(self.last_end, self.last_end));
            let (nodes, stop) = self.parse_body(&stops)?;
            for child in nodes {
                body.push(child);
            }
            match branch.take() {
                Some(mut open) => {
                    open.push(body);
                    node.push(open);
                }
                None => node.push(body),
            }

            let Some(stop) = stop else {
                return Err(SyntaxError::UnclosedBlock {
                    tag: head.name.to_string(),
                    expected: end_name,
                    line: head.start.line,
                    column: head.start.column,
                    span: token_span(head.name_token),
                });
            };

            let (stop_args, stop_end) = self.parse_tag_args()?;
            let stop_span = Span::new(stop.start.start(), stop_end.end());
            if stop.name == end_name {
                node.span = node.span.join(stop_span);
                return Ok(node);
            }

            let mut open = TreeNode::new(NodeKind::Branch, stop_span).with_attr("name", stop.name);
            for arg in stop_args {
                open.push(arg);
            }
            branch = Some(open);
        }
    }

    fn parse_expression(&mut self) -> Result<TreeNode, SyntaxError> {
        self.enter()?;
        let node = self.parse_conditional();
        self.leave();
        node
    }

    fn parse_conditional(&mut self) -> Result<TreeNode, SyntaxError> {
        let condition = self.parse_binary(0)?;

        if self.peek_sig_is(TokenKind::Punctuation, "?") {
            self.bump_sig();
            let mut node = wrap(NodeKind::Conditional, condition);
            node.push(self.parse_expression()?);
            if self.peek_sig_is(TokenKind::Punctuation, ":") {
                self.bump_sig();
                node.push(self.parse_expression()?);
            }
            return Ok(node);
        }

        if self.peek_sig_is(TokenKind::Operator, "?:") {
            self.bump_sig();
            let mut node = wrap(NodeKind::Conditional, condition).with_attr("operator", "?:");
            node.push(self.parse_expression()?);
            return Ok(node);
        }

        Ok(condition)
    }

    /// Operator at the cursor, with its precedence and width in tokens.
    fn peek_binary_op(&self) -> Option<(String, u16, usize)> {
        let first = self.peek_sig(0)?;
        let second = self.peek_sig(1);
        let followed_by = |word: &str| second.is_some_and(|t| t.is(TokenKind::Name, word));

        let (op, width) = match first.kind {
            TokenKind::Operator => (first.text.clone(), 1),
            TokenKind::Name => match first.text.as_str() {
                "not" if followed_by("in") => ("not in".to_string(), 2),
                "is" if followed_by("not") => ("is not".to_string(), 2),
                "starts" if followed_by("with") => ("starts with".to_string(), 2),
                "ends" if followed_by("with") => ("ends with".to_string(), 2),
                "or" | "and" | "in" | "matches" | "is" => (first.text.clone(), 1),
                _ => return None,
            },
            _ => return None,
        };
        let prec = binary_precedence(&op)?;
        Some((op, prec, width))
    }

    fn parse_binary(&mut self, min_prec: u16) -> Result<TreeNode, SyntaxError> {
        let mut left = self.parse_unary()?;
        let mut wraps = 0;

        while let Some((op, prec, width)) = self.peek_binary_op() {
            if prec < min_prec {
                break;
            }
            for _ in 0..width {
                self.bump_sig();
            }
            self.deepen()?;
            wraps += 1;

            if op == "is" || op == "is not" {
                left = self.parse_test(left, op == "is not")?;
                continue;
            }

            self.enter()?;
            let right = match op.as_str() {
                "=" | "=>" => self.parse_expression(),
                "**" => self.parse_binary(prec),
                _ => self.parse_binary(prec + 1),
            };
            self.leave();
            left = wrap(NodeKind::Binary, left).with_attr("operator", op);
            left.push(right?);
        }

        self.tree_depth -= wraps;
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<TreeNode, SyntaxError> {
        let Some(token) = self.peek_sig(0) else {
            return Err(self.unexpected("expression"));
        };
        let prec = match (token.kind, token.text.as_str()) {
            (TokenKind::Name, "not") => Some(50),
            (TokenKind::Operator, "-" | "+") => Some(500),
            _ => None,
        };
        if let Some(prec) = prec {
            self.bump_sig();
            let mut node = TreeNode::new(NodeKind::Unary, Span::of_token(token))
                .with_attr("operator", token.text.as_str());
            self.enter()?;
            let operand = self.parse_binary(prec);
            self.leave();
            node.push(operand?);
            return Ok(node);
        }

        let primary = self.parse_primary()?;
        self.parse_postfix(primary)
    }

    fn parse_primary(&mut self) -> Result<TreeNode, SyntaxError> {
        let Some(token) = self.peek_sig(0) else {
            return Err(self.unexpected("expression"));
        };

        match token.kind {
            TokenKind::Number | TokenKind::String => {
                self.bump_sig();
                Ok(TreeNode::new(NodeKind::Literal, Span::of_token(token))
                    .with_attr("value", token.text.as_str()))
            }
            TokenKind::Name => {
                self.bump_sig();
                let span = Span::of_token(token);
                let lowered = token.text.to_ascii_lowercase();
                if matches!(lowered.as_str(), "true" | "false" | "null" | "none") {
                    return Ok(TreeNode::new(NodeKind::Literal, span)
                        .with_attr("value", token.text.as_str()));
                }
                if self.peek_sig_is(TokenKind::Punctuation, "(") {
                    let mut call =
                        TreeNode::new(NodeKind::Call, span).with_attr("name", token.text.as_str());
                    let (args, close) = self.parse_sequence("(", ")")?;
                    for arg in args {
                        call.push(arg);
                    }
                    extend_to(&mut call, close);
                    return Ok(call);
                }
                Ok(TreeNode::new(NodeKind::Variable, span).with_attr("name", token.text.as_str()))
            }
            TokenKind::Punctuation => match token.text.as_str() {
                "(" => {
                    self.bump_sig();
                    let inner = self.parse_expression()?;
                    self.expect_punct(")")?;
                    Ok(inner)
                }
                "[" => {
                    let mut array = TreeNode::new(NodeKind::Array, Span::of_token(token));
                    let (items, close) = self.parse_sequence("[", "]")?;
                    for item in items {
                        array.push(item);
                    }
                    extend_to(&mut array, close);
                    Ok(array)
                }
                "{" => self.parse_hash(token),
                _ => Err(self.unexpected("expression")),
            },
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Parses `open expr, expr, ... close`, allowing a trailing comma.
    fn parse_sequence(
        &mut self,
        open: &str,
        close: &str,
    ) -> Result<(Vec<TreeNode>, &'t Token), SyntaxError> {
        self.expect_punct(open)?;
        let mut items = Vec::new();
        loop {
            if let Some(token) = self.peek_sig(0).filter(|t| t.is(TokenKind::Punctuation, close)) {
                self.bump_sig();
                return Ok((items, token));
            }
            items.push(self.parse_expression()?);
            if self.peek_sig_is(TokenKind::Punctuation, ",") {
                self.bump_sig();
            } else if !self.peek_sig_is(TokenKind::Punctuation, close) {
                return Err(self.unexpected(&format!("`,` or `{close}`")));
            }
        }
    }

    fn parse_hash(&mut self, open: &'t Token) -> Result<TreeNode, SyntaxError> {
        self.expect_punct("{")?;
        let mut hash = TreeNode::new(NodeKind::Hash, Span::of_token(open));
        loop {
            if let Some(token) = self.peek_sig(0).filter(|t| t.is(TokenKind::Punctuation, "}")) {
                self.bump_sig();
                extend_to(&mut hash, token);
                return Ok(hash);
            }

            let key = match self.peek_sig(0) {
                Some(token)
                    if matches!(
                        token.kind,
                        TokenKind::Name | TokenKind::String | TokenKind::Number
                    ) =>
                {
                    self.bump_sig();
                    TreeNode::new(NodeKind::Literal, Span::of_token(token))
                        .with_attr("value", token.text.as_str())
                }
                Some(token) if token.is(TokenKind::Punctuation, "(") => {
                    self.bump_sig();
                    let key = self.parse_expression()?;
                    self.expect_punct(")")?;
                    key
                }
                _ => return Err(self.unexpected("hash key")),
            };
            hash.push(key);

            if self.peek_sig_is(TokenKind::Punctuation, ":") {
                self.bump_sig();
                hash.push(self.parse_expression()?);
            }

            if self.peek_sig_is(TokenKind::Punctuation, ",") {
                self.bump_sig();
            } else if !self.peek_sig_is(TokenKind::Punctuation, "}") {
                return Err(self.unexpected("`,` or `}`"));
            }
        }
    }

    fn parse_postfix(&mut self, node: TreeNode) -> Result<TreeNode, SyntaxError> {
        let mut wraps = 0;
        let node = self.parse_postfix_chain(node, &mut wraps);
        self.tree_depth -= wraps;
        node
    }

    fn parse_postfix_chain(
        &mut self,
        mut node: TreeNode,
        wraps: &mut usize,
    ) -> Result<TreeNode, SyntaxError> {
        loop {
            let Some(next) = self.peek_sig(0) else {
                return Ok(node);
            };
            if next.kind != TokenKind::Punctuation || !matches!(next.text.as_str(), "." | "[" | "|")
            {
                return Ok(node);
            }
            self.deepen()?;
            *wraps += 1;

            match next.text.as_str() {
                "." => {
                    self.bump_sig();
                    let attr = match self.peek() {
                        Some(t) if matches!(t.kind, TokenKind::Name | TokenKind::Number) => {
                            self.bump();
                            t
                        }
                        _ => return Err(self.unexpected("attribute name")),
                    };
                    if self.peek_sig_is(TokenKind::Punctuation, "(") {
                        let mut call = wrap(NodeKind::Call, node)
                            .with_attr("name", attr.text.as_str())
                            .with_attr("method", "true");
                        let (args, close) = self.parse_sequence("(", ")")?;
                        for arg in args {
                            call.push(arg);
                        }
                        extend_to(&mut call, close);
                        node = call;
                    } else {
                        node = wrap(NodeKind::GetAttr, node).with_attr("name", attr.text.as_str());
                        extend_to(&mut node, attr);
                    }
                }
                "[" => {
                    self.bump_sig();
                    let mut access = wrap(NodeKind::GetAttr, node);
                    access.push(self.parse_expression()?);
                    if self.peek_sig_is(TokenKind::Punctuation, ":") {
                        self.bump_sig();
                        if !self.peek_sig_is(TokenKind::Punctuation, "]") {
                            access.push(self.parse_expression()?);
                        }
                    }
                    let close = self.expect_punct("]")?;
                    extend_to(&mut access, close);
                    node = access;
                }
                "|" => {
                    self.bump_sig();
                    let name = self.expect_kind(TokenKind::Name, "filter name")?;
                    let mut filter =
                        wrap(NodeKind::Filter, node).with_attr("name", name.text.as_str());
                    extend_to(&mut filter, name);
                    if self.peek_sig_is(TokenKind::Punctuation, "(") {
                        let (args, close) = self.parse_sequence("(", ")")?;
                        for arg in args {
                            filter.push(arg);
                        }
                        extend_to(&mut filter, close);
                    }
                    node = filter;
                }
                _ => return Ok(node),
            }
        }
    }

    fn parse_test(&mut self, operand: TreeNode, negated: bool) -> Result<TreeNode, SyntaxError> {
        let first = self.expect_kind(TokenKind::Name, "test name")?;
        let mut name = first.text.clone();
        let mut last = first;

        if let Some((_, second)) = TWO_WORD_TESTS.iter().find(|(w, _)| *w == name) {
            if let Some(token) = self.peek_sig(0).filter(|t| t.is(TokenKind::Name, second)) {
                self.bump_sig();
                name = format!("{name} {second}");
                last = token;
            }
        }

        let mut test = wrap(GenericTreeBuilder::test_kind(&name), operand).with_attr("name", name);
        extend_to(&mut test, last);
        if self.peek_sig_is(TokenKind::Punctuation, "(") {
            let (args, close) = self.parse_sequence("(", ")")?;
            for arg in args {
                test.push(arg);
            }
            extend_to(&mut test, close);
        }

        if negated {
            test = wrap(NodeKind::Unary, test).with_attr("operator", "not");
        }
        Ok(test)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize;

    fn build(source: &str) -> Result<TreeNode, SyntaxError> {
        let tokens = tokenize(source).expect("source should tokenize");
        GenericTreeBuilder::new().build(&tokens)
    }

    fn outline(source: &str) -> String {
        build(source).expect("source should parse").outline()
    }

    #[test]
    fn empty_template_has_no_children() {
        let root = build("").expect("empty template parses");
        assert_eq!(root.kind, NodeKind::Template);
        assert!(root.children.is_empty());
    }

    #[test]
    fn print_with_filter_and_attribute() {
        insta::assert_snapshot!(outline("Hi {{ user.name|upper }}"), @r#"
        template
          text
          print
            filter name="upper"
              get_attr name="name"
                variable name="user"
        "#);
    }

    #[test]
    fn if_with_branches() {
        insta::assert_snapshot!(
            outline("{% if a %}x{% elseif b %}y{% else %}z{% endif %}"),
            @r#"
        template
          block name="if"
            variable name="a"
            body
              text
            branch name="elseif"
              variable name="b"
              body
                text
            branch name="else"
              body
                text
        "#
        );
    }

    #[test]
    fn core_tests_are_dialect_specific_before_normalization() {
        let root = build("{{ a is defined }}{{ b is same as(c) }}{{ d is iterable }}")
            .expect("valid");
        let kinds: Vec<String> = root
            .descendants()
            .filter(|n| n.name().is_some() && n.kind != NodeKind::Variable)
            .map(|n| n.kind.to_string())
            .collect();
        assert_eq!(
            kinds,
            vec!["dialect_test(defined)", "dialect_test(same_as)", "test"]
        );
    }

    #[test]
    fn normalization_maps_every_test_to_generic_kind() {
        let mut root =
            build("{% if a is not defined and b is divisible by(3) %}{% endif %}").expect("valid");
        let rewritten = normalize_tests(&mut root, &StubbedTests);
        assert_eq!(rewritten, 2);

        let tests = root.find_all(&NodeKind::Test);
        let names: Vec<Option<&str>> = tests.iter().map(|n| n.name()).collect();
        assert_eq!(names, vec![Some("defined"), Some("divisible by")]);
        assert!(root
            .descendants()
            .all(|n| !matches!(n.kind, NodeKind::DialectTest(_))));
    }

    #[test]
    fn negated_test_is_wrapped_in_not() {
        let root = build("{{ a is not null }}").expect("valid");
        let print = &root.children[0];
        let unary = &print.children[0];
        assert_eq!(unary.kind, NodeKind::Unary);
        assert_eq!(unary.attr("operator"), Some("not"));
        assert_eq!(
            unary.children[0].kind,
            NodeKind::DialectTest("null".to_string())
        );
    }

    #[test]
    fn for_loop_with_else_and_nested_if() {
        let root = build(
            "{% for item in items %}{% if item %}{{ item }}{% else %}-{% endif %}{% else %}none{% endfor %}",
        )
        .expect("valid");
        let block = &root.children[0];
        assert_eq!(block.name(), Some("for"));
        let branches: Vec<&TreeNode> = block
            .children
            .iter()
            .filter(|c| c.kind == NodeKind::Branch)
            .collect();
        assert_eq!(branches.len(), 1);
        assert_eq!(root.find_all(&NodeKind::Block).len(), 2);
    }

    #[test]
    fn set_assignment_is_a_plain_tag() {
        let root = build("{% set x = {'a': [1, 2], b: 3} %}").expect("valid");
        assert_eq!(root.children[0].kind, NodeKind::Tag);
        assert_eq!(root.find_all(&NodeKind::Hash).len(), 1);
    }

    #[test]
    fn set_capture_opens_a_body() {
        let root = build("{% set x %}captured{% endset %}").expect("valid");
        assert_eq!(root.children[0].kind, NodeKind::Block);
    }

    #[test]
    fn block_short_form_has_no_body() {
        let root = build("{% block title 'Home' %}").expect("valid");
        assert_eq!(root.children[0].kind, NodeKind::Tag);
    }

    #[test]
    fn precedence_binds_multiplication_tighter() {
        let root = build("{{ 1 + 2 * 3 }}").expect("valid");
        let sum = &root.children[0].children[0];
        assert_eq!(sum.attr("operator"), Some("+"));
        assert_eq!(sum.children[1].attr("operator"), Some("*"));
    }

    #[test]
    fn ternary_and_null_coalescing() {
        let root = build("{{ a ? b : c ?? 'd' }}{{ e ?: f }}").expect("valid");
        assert_eq!(root.find_all(&NodeKind::Conditional).len(), 2);
    }

    #[test]
    fn method_calls_and_functions() {
        let root = build("{{ dump(user.getName(), range(1, 3)) }}").expect("valid");
        let calls: Vec<Option<&str>> = root
            .find_all(&NodeKind::Call)
            .iter()
            .map(|n| n.name())
            .collect();
        assert_eq!(calls, vec![Some("dump"), Some("getName"), Some("range")]);
    }

    #[test]
    fn registered_body_tag_is_closed() {
        let tokens = tokenize("{% cache 'k' %}x{% endcache %}").expect("valid");
        let root = GenericTreeBuilder::new()
            .with_body_tag("cache", &[])
            .build(&tokens)
            .expect("valid");
        assert_eq!(root.children[0].kind, NodeKind::Block);
    }

    #[test]
    fn node_spans_cover_source() {
        let root = build("ab\n{{ x }}").expect("valid");
        let print = &root.children[1];
        assert_eq!(print.span.start, Position::new(2, 1));
        assert_eq!(print.span.end, Position::new(2, 8));
    }

    #[test]
    fn empty_print_is_an_error() {
        let err = build("{{ }}").expect_err("should fail");
        assert!(matches!(err, SyntaxError::EmptyExpression { .. }));
    }

    #[test]
    fn missing_tag_name_is_an_error() {
        let err = build("{% %}").expect_err("should fail");
        assert!(matches!(err, SyntaxError::MissingTagName { .. }));
    }

    #[test]
    fn unclosed_block_points_at_opening_tag() {
        let err = build("\n{% if a %}never closed").expect_err("should fail");
        assert!(matches!(err, SyntaxError::UnclosedBlock { ref tag, .. } if tag == "if"));
        assert_eq!(err.position(), Position::new(2, 1));
    }

    #[test]
    fn stray_end_tag_is_an_error() {
        let err = build("{% endfor %}").expect_err("should fail");
        assert!(matches!(err, SyntaxError::UnexpectedTag { ref tag, .. } if tag == "endfor"));
    }

    #[test]
    fn mismatched_end_tag_is_an_error() {
        let err = build("{% if a %}{% endfor %}").expect_err("should fail");
        assert!(matches!(err, SyntaxError::UnexpectedTag { .. }));
    }

    #[test]
    fn dangling_operator_is_an_error() {
        let err = build("{{ a + }}").expect_err("should fail");
        assert!(matches!(err, SyntaxError::UnexpectedToken { .. }));
        assert_eq!(err.position(), Position::new(1, 8));
    }

    #[test]
    fn unary_minus_and_plus() {
        insta::assert_snapshot!(outline("{{ -a ** 2 }}{{ +b }}"), @r#"
        template
          print
            binary operator="**"
              unary operator="-"
                variable name="a"
              literal value="2"
          print
            unary operator="+"
              variable name="b"
        "#);
    }

    #[test]
    fn not_binds_tighter_than_comparison_but_looser_than_sum() {
        let root = build("{{ not a == b }}{{ not a + b }}").expect("valid");
        let compare = &root.children[0].children[0];
        assert_eq!(compare.attr("operator"), Some("=="));
        assert_eq!(compare.children[0].attr("operator"), Some("not"));

        let not = &root.children[1].children[0];
        assert_eq!(not.attr("operator"), Some("not"));
        assert_eq!(not.children[0].attr("operator"), Some("+"));
    }

    #[test]
    fn numeric_attribute_chain() {
        insta::assert_snapshot!(outline("{{ a.0.1 }}"), @r#"
        template
          print
            get_attr name="1"
              get_attr name="0"
                variable name="a"
        "#);
    }

    #[test]
    fn moderate_nesting_parses() {
        let depth = MAX_NESTING / 2;
        let source = format!("{{{{ {}x{} }}}}", "(".repeat(depth), ")".repeat(depth));
        assert!(build(&source).is_ok());
    }

    #[test]
    fn deep_parentheses_are_rejected() {
        let source = format!("{{{{ {}x{} }}}}", "(".repeat(10_000), ")".repeat(10_000));
        let err = build(&source).expect_err("should fail");
        assert!(matches!(err, SyntaxError::NestingTooDeep { .. }));
        assert_eq!(err.position().line, 1);
    }

    #[test]
    fn deep_unary_and_blocks_are_rejected() {
        let minus = format!("{{{{ {}x }}}}", "- ".repeat(10_000));
        assert!(matches!(
            build(&minus).expect_err("should fail"),
            SyntaxError::NestingTooDeep { .. }
        ));

        let ifs = format!(
            "{}x{}",
            "{% if a %}".repeat(5_000),
            "{% endif %}".repeat(5_000)
        );
        assert!(matches!(
            build(&ifs).expect_err("should fail"),
            SyntaxError::NestingTooDeep { .. }
        ));
    }

    #[test]
    fn long_operator_chains_are_bounded() {
        let short = format!("{{{{ a{} }}}}", " ~ a".repeat(100));
        assert!(build(&short).is_ok());

        let long = format!("{{{{ a{} }}}}", " ~ a".repeat(MAX_TREE_DEPTH * 2));
        assert!(matches!(
            build(&long).expect_err("should fail"),
            SyntaxError::NestingTooDeep { .. }
        ));

        let filters = format!("{{{{ a{} }}}}", "|upper".repeat(MAX_TREE_DEPTH * 2));
        assert!(matches!(
            build(&filters).expect_err("should fail"),
            SyntaxError::NestingTooDeep { .. }
        ));
    }
}
