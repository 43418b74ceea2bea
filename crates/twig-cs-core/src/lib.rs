//! # twig-cs-core
//!
//! Core framework for linting Twig-like templates.
//!
//! The pipeline for one source unit:
//!
//! ```text
//! source text
//!   ↓ tokenize()                lossless token stream
//! TokenStream ──→ PRE_PARSER sniffs
//!   ↓ TreeBuilder::build()      dialect parser
//! TreeNode
//!   ↓ normalize_tests()         dialect tests → NodeKind::Test
//! TreeNode ──→ POST_PARSER sniffs
//!   ↓
//! Report (findings + derived counters)
//! ```
//!
//! This crate provides:
//!
//! - [`Sniff`] trait for token-phase and tree-phase rules
//! - [`Ruleset`] for identity-keyed sniff registration
//! - [`Linter`] for running a ruleset over [`SourceUnit`]s
//! - [`Report`] and [`Finding`] for results
//!
//! ## Example
//!
//! ```ignore
//! use twig_cs_core::{Linter, Ruleset, SourceUnit};
//!
//! let mut ruleset = Ruleset::new();
//! ruleset.add_sniff(Box::new(MySniff::new()))?;
//!
//! let units = vec![SourceUnit::new("index.twig", "{{ title }}\n")];
//! let report = Linter::default().run(&units, &ruleset);
//! println!("{}", report.format_summary());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
mod context;
pub mod declarative;
mod linter;
pub mod parser;
mod report;
mod ruleset;
mod sniff;
pub mod token;
pub mod tree;

pub use config::{Config, ConfigError, LinterConfig, SniffConfig};
pub use context::UnitContext;
pub use linter::{
    Linter, LinterBuilder, SourceUnit, SYNTAX_ERROR, TOKENIZATION_ERROR, UNIT_ERROR_CODE,
};
pub use parser::{
    normalize_tests, GenericTreeBuilder, StubbedTests, SyntaxError, TestNormalizer, TreeBuilder,
};
pub use report::{Finding, Location, Report, Severity, Summary};
pub use ruleset::{ConfigurationError, Ruleset};
pub use sniff::{Phase, Sniff, SniffBox};
pub use token::{tokenize, Lexer, Position, Token, TokenKind, TokenStream, TokenizeError};
pub use tree::{walk_node, NodeKind, Span, TreeNode, Visit};
