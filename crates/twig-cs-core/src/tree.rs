//! Syntax tree types.

use crate::ruleset::ConfigurationError;
use crate::token::{Position, Token};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Semantic category of a tree node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Root of a source unit.
    Template,
    /// Raw text between delimiters.
    Text,
    /// A `{# #}` comment.
    Comment,
    /// A `{{ }}` print statement.
    Print,
    /// A `{% %}` tag without a body. The `name` attribute holds the tag name.
    Tag,
    /// A tag with a body, such as `if` or `for`. The `name` attribute holds the tag name.
    Block,
    /// Sequence of template nodes inside a block or branch.
    Body,
    /// An `elseif` or `else` section of a block.
    Branch,
    /// A variable reference. The `name` attribute holds the identifier.
    Variable,
    /// A literal. The `value` attribute holds the raw text.
    Literal,
    /// An array literal.
    Array,
    /// A hash literal; children alternate key, value.
    Hash,
    /// Attribute or item access (`a.b`, `a[b]`).
    GetAttr,
    /// A function or method call. The `name` attribute holds the callee name.
    /// Method calls also carry `method="true"` and their first child is the
    /// receiver.
    Call,
    /// A filter application. The `name` attribute holds the filter name.
    Filter,
    /// A unary operation. The `operator` attribute holds the operator.
    Unary,
    /// A binary operation. The `operator` attribute holds the operator.
    Binary,
    /// A ternary or `?:` expression.
    Conditional,
    /// The generic test expression (`x is defined`). Every dialect-specific
    /// test construct is normalized to this kind. The `name` attribute holds
    /// the test name.
    Test,
    /// A dialect-specific test construct, only present before normalization.
    DialectTest(String),
}

impl NodeKind {
    /// Returns the snake_case name used in configuration files.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Template => "template",
            Self::Text => "text",
            Self::Comment => "comment",
            Self::Print => "print",
            Self::Tag => "tag",
            Self::Block => "block",
            Self::Body => "body",
            Self::Branch => "branch",
            Self::Variable => "variable",
            Self::Literal => "literal",
            Self::Array => "array",
            Self::Hash => "hash",
            Self::GetAttr => "get_attr",
            Self::Call => "call",
            Self::Filter => "filter",
            Self::Unary => "unary",
            Self::Binary => "binary",
            Self::Conditional => "conditional",
            Self::Test => "test",
            Self::DialectTest(subtype) => subtype,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DialectTest(subtype) => write!(f, "dialect_test({subtype})"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl FromStr for NodeKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "template" => Self::Template,
            "text" => Self::Text,
            "comment" => Self::Comment,
            "print" => Self::Print,
            "tag" => Self::Tag,
            "block" => Self::Block,
            "body" => Self::Body,
            "branch" => Self::Branch,
            "variable" => Self::Variable,
            "literal" => Self::Literal,
            "array" => Self::Array,
            "hash" => Self::Hash,
            "get_attr" => Self::GetAttr,
            "call" => Self::Call,
            "filter" => Self::Filter,
            "unary" => Self::Unary,
            "binary" => Self::Binary,
            "conditional" => Self::Conditional,
            "test" => Self::Test,
            _ => {
                return Err(ConfigurationError::UnknownNodeKind {
                    value: s.to_string(),
                })
            }
        };
        Ok(kind)
    }
}

/// Start and end positions of a node. `end` is exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// First position covered.
    pub start: Position,
    /// Position just past the last character covered.
    pub end: Position,
}

impl Span {
    /// Creates a span.
    #[must_use]
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Span covering a single token.
    #[must_use]
    pub fn of_token(token: &Token) -> Self {
        Self::new(token.start(), token.end())
    }

    /// Smallest span covering both `self` and `other`.
    #[must_use]
    pub fn join(self, other: Self) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// A node of the syntax tree. A node exclusively owns its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Semantic category.
    pub kind: NodeKind,
    /// Source span.
    pub span: Span,
    /// Child nodes in source order.
    pub children: Vec<TreeNode>,
    /// Literal attributes, e.g. a tag or test name.
    pub attributes: BTreeMap<String, String>,
}

impl TreeNode {
    /// Creates a leaf node.
    #[must_use]
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            children: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Sets an attribute.
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Appends a child.
    #[must_use]
    pub fn with_child(mut self, child: TreeNode) -> Self {
        self.push(child);
        self
    }

    /// Appends a child, widening the span to cover it.
    pub fn push(&mut self, child: TreeNode) {
        self.span = self.span.join(child.span);
        self.children.push(child);
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Shorthand for the `name` attribute.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.attr("name")
    }

    /// Returns true if this node has the given kind.
    #[must_use]
    pub fn is(&self, kind: &NodeKind) -> bool {
        &self.kind == kind
    }

    /// Iterates over this node and all descendants in pre-order.
    #[must_use]
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Collects every node of the given kind, in pre-order.
    #[must_use]
    pub fn find_all(&self, kind: &NodeKind) -> Vec<&TreeNode> {
        self.descendants().filter(|n| n.is(kind)).collect()
    }

    /// Renders an indented one-line-per-node outline, useful in tests and
    /// debugging output.
    #[must_use]
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(&mut out, 0);
        out
    }

    fn write_outline(&self, out: &mut String, depth: usize) {
        use std::fmt::Write;

        let _ = write!(out, "{}{}", "  ".repeat(depth), self.kind);
        for (key, value) in &self.attributes {
            let _ = write!(out, " {key}={value:?}");
        }
        out.push('\n');
        for child in &self.children {
            child.write_outline(out, depth + 1);
        }
    }
}

/// Pre-order iterator returned by [`TreeNode::descendants`].
#[derive(Debug)]
pub struct Descendants<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Read-only tree visitor with depth tracking.
///
/// Override [`Visit::visit_node`] and call [`walk_node`] to keep descending.
///
/// ```ignore
/// struct Counter(usize);
///
/// impl Visit for Counter {
///     fn visit_node(&mut self, node: &TreeNode, depth: usize) {
///         self.0 += 1;
///         walk_node(self, node, depth);
///     }
/// }
/// ```
pub trait Visit {
    /// Called for every node. The default implementation descends into children.
    fn visit_node(&mut self, node: &TreeNode, depth: usize) {
        walk_node(self, node, depth);
    }
}

/// Visits every child of `node` at `depth + 1`.
pub fn walk_node<V: Visit + ?Sized>(visitor: &mut V, node: &TreeNode, depth: usize) {
    for child in &node.children {
        visitor.visit_node(child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(line: usize, start: usize, end: usize) -> Span {
        Span::new(Position::new(line, start), Position::new(line, end))
    }

    fn sample() -> TreeNode {
        TreeNode::new(NodeKind::Template, Span::default())
            .with_child(TreeNode::new(NodeKind::Text, span(1, 1, 4)))
            .with_child(
                TreeNode::new(NodeKind::Print, span(1, 4, 14)).with_child(
                    TreeNode::new(NodeKind::Variable, span(1, 7, 11)).with_attr("name", "user"),
                ),
            )
    }

    #[test]
    fn push_widens_span() {
        let root = sample();
        assert_eq!(root.span, span(1, 1, 14));
    }

    #[test]
    fn descendants_are_pre_order() {
        let root = sample();
        let kinds: Vec<&NodeKind> = root.descendants().map(|n| &n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &NodeKind::Template,
                &NodeKind::Text,
                &NodeKind::Print,
                &NodeKind::Variable
            ]
        );
    }

    #[test]
    fn find_all_matches_kind() {
        let root = sample();
        let vars = root.find_all(&NodeKind::Variable);
        assert_eq!(vars.len(), 1);
        assert_eq!(vars[0].name(), Some("user"));
    }

    #[test]
    fn visitor_tracks_depth() {
        struct MaxDepth(usize);
        impl Visit for MaxDepth {
            fn visit_node(&mut self, node: &TreeNode, depth: usize) {
                self.0 = self.0.max(depth);
                walk_node(self, node, depth);
            }
        }

        let mut v = MaxDepth(0);
        v.visit_node(&sample(), 0);
        assert_eq!(v.0, 2);
    }

    #[test]
    fn outline_lists_attributes() {
        insta::assert_snapshot!(sample().outline(), @r#"
        template
          text
          print
            variable name="user"
        "#);
    }

    #[test]
    fn node_kind_parses_config_names() {
        assert_eq!("get_attr".parse::<NodeKind>().ok(), Some(NodeKind::GetAttr));
        assert!("dialect_test".parse::<NodeKind>().is_err());
    }
}
