//! A scanner and parser for Liquid templates.
//!
//! # Features
//!
//! - Scans template markup into a flat list of nodes: content, raw blocks,
//!   comments with extensible `#` fences, output statements, tags, and the
//!   line-oriented `{% liquid %}` tag.
//! - Tokenizes tag and output bodies into expression tokens: literals,
//!   operators, reserved words, ranges, and embedded path queries.
//! - Parses JSONPath-derived path expressions, including slices, filters
//!   with a full logical expression sub-grammar, and singular query
//!   selectors.
//! - Every node carries a byte span into the original source, and errors
//!   render the offending line with an underline.
//!
//! This crate is a front-end only: it defines the token and AST contracts
//! that evaluation, filtering and rendering layers consume. It performs no
//! I/O and keeps no state between invocations, so parsing different sources
//! on parallel threads needs no coordination.
//!
//! # Introduction
//!
//! Your entry point for templates is [`tokenize`], which scans the full
//! source into a list of [`Markup`] nodes terminated by [`Markup::Eoi`].
//!
//! ```
//! let nodes = brine::tokenize("Hello, {{ you }}!")?;
//! assert_eq!(nodes.len(), 4); // content, output, content, end of input
//! # Ok::<(), brine::Error>(())
//! ```
//!
//! Tag and output nodes carry their expression token lists. Paths into the
//! data model appear as [`ExpressionToken::Query`] tokens.
//!
//! ```
//! use brine::{ExpressionToken, Markup};
//!
//! let nodes = brine::tokenize("{{ user.name }}")?;
//! let Markup::Output { expression, .. } = &nodes[0] else {
//!     unreachable!();
//! };
//! let ExpressionToken::Query { path, .. } = &expression[0] else {
//!     unreachable!();
//! };
//! assert_eq!(path.to_string(), "$['user']['name']");
//! # Ok::<(), brine::Error>(())
//! ```
//!
//! Standalone path strings are parsed with [`parse_query`], or with
//! [`parse_jsonpath_query`] for the strict JSONPath dialect.
//!
//! ```
//! let query = brine::parse_query("$.users[0].name")?;
//! assert_eq!(query.to_string(), "$['users'][0]['name']");
//! # Ok::<(), brine::Error>(())
//! ```
//!
//! Errors carry a span and render the offending line with a caret
//! underline.
//!
//! ```
//! let err = brine::tokenize("lorem {{ ipsum").unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "syntax error: unterminated output statement\n1 | lorem {{ ipsum\n  |       ^^"
//! );
//! ```

mod dump;
mod error;
mod scan;
mod types;

pub use crate::error::{Error, ErrorKind};
pub use crate::types::markup::{ExpressionToken, Markup, RangeArgument, Whitespace};
pub use crate::types::query::{
    ComparisonOperator, FilterExpression, LogicalOperator, Query, Segment, Selector,
};
pub use crate::types::span::{LineIndex, Span};

/// A type alias for results in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Scans a template into an ordered list of markup nodes.
///
/// The final node is always [`Markup::Eoi`]. Scanning fails fast at the
/// first syntax error; a partial node list is never returned.
pub fn tokenize(source: &str) -> Result<Vec<Markup<'_>>> {
    scan::markup::tokenize(source)
}

/// Parses a path string into a [`Query`].
///
/// The whole input must be consumed; trailing input is a syntax error. The
/// grammar is the Liquid dialect: the leading `$` may be omitted, shorthand
/// names may contain hyphens, and bracketed selections may contain singular
/// query selectors.
pub fn parse_query(path: &str) -> Result<Query> {
    scan::query::parse(path, scan::query::Dialect::Liquid)
}

/// Parses a path string restricted to strict JSONPath.
///
/// The query must start with `$`, shorthand names may not contain hyphens,
/// and singular query selectors are unavailable.
pub fn parse_jsonpath_query(path: &str) -> Result<Query> {
    scan::query::parse(path, scan::query::Dialect::JsonPath)
}

/// Resolves escape sequences in a raw string in a single pass.
///
/// Handles both quote styles' escapes: `\b \f \n \r \t \/ \\ \" \'` and
/// `\uXXXX` with surrogate pairs.
///
/// ```
/// assert_eq!(brine::unescape_string("snow\\u2603man")?, "snow☃man");
/// # Ok::<(), brine::Error>(())
/// ```
pub fn unescape_string(value: &str) -> Result<String> {
    scan::unescape::unescape(value, value, Span::from(0..value.len()))
}

/// Renders a template's markup nodes as a human readable tree.
///
/// Syntax errors are rendered in place of the tree. The format is advisory
/// and may change.
pub fn dump(source: &str) -> String {
    dump::dump(source)
}

/// Renders a parsed path as a human readable tree.
///
/// Syntax errors are rendered in place of the tree. The format is advisory
/// and may change.
pub fn dump_query(path: &str) -> String {
    dump::dump_query(path)
}
