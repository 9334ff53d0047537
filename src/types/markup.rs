//! The markup and expression token types produced by the scanner.

use std::fmt;

use serde::Serialize;

use crate::types::query::Query;
use crate::types::span::Span;

/// A whitespace control marker attached to the inside edge of a delimiter.
///
/// Markers are payload for a downstream whitespace-stripping pass; they do
/// not affect how the template is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Whitespace {
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `~`
    Smart,
    /// No marker.
    Default,
}

impl Whitespace {
    pub(crate) fn from_marker(c: Option<char>) -> Self {
        match c {
            Some('+') => Self::Plus,
            Some('-') => Self::Minus,
            Some('~') => Self::Smart,
            None => Self::Default,
            Some(c) => panic!("scanner bug: `{c}` is not a whitespace marker"),
        }
    }
}

impl fmt::Display for Whitespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Whitespace::Plus => f.write_str("+"),
            Whitespace::Minus => f.write_str("-"),
            Whitespace::Smart => f.write_str("~"),
            Whitespace::Default => Ok(()),
        }
    }
}

/// A top-level template syntactic unit.
///
/// Text payloads are borrowed slices of the original source; only cooked
/// string literals inside expressions are owned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Markup<'source> {
    /// Raw text between template constructs.
    Content { span: Span, text: &'source str },

    /// Verbatim text inside a `{% raw %}` ... `{% endraw %}` pair.
    ///
    /// The four whitespace markers belong to the edges of the opening and
    /// closing tags, in source order.
    Raw {
        span: Span,
        wc: (Whitespace, Whitespace, Whitespace, Whitespace),
        text: &'source str,
    },

    /// A `{# ... #}` comment. `hashes` is the opening fence; the closing
    /// fence always has the same hash count.
    Comment {
        span: Span,
        wc: (Whitespace, Whitespace),
        hashes: &'source str,
        text: &'source str,
    },

    /// An output statement, e.g. `{{ user.name | upcase }}`.
    Output {
        span: Span,
        wc: (Whitespace, Whitespace),
        expression: Vec<ExpressionToken<'source>>,
    },

    /// A tag, e.g. `{% assign x = 1 %}`.
    Tag {
        span: Span,
        wc: (Whitespace, Whitespace),
        name: &'source str,
        expression: Vec<ExpressionToken<'source>>,
    },

    /// A `{% liquid %}` tag: a block of line-oriented statements, each a
    /// [`Markup::Tag`] or a [`Markup::Comment`].
    Lines {
        span: Span,
        wc: (Whitespace, Whitespace),
        statements: Vec<Markup<'source>>,
    },

    /// End of input sentinel.
    Eoi,
}

impl Markup<'_> {
    /// Returns the node's span, or `None` for the end of input sentinel.
    pub fn span(&self) -> Option<Span> {
        match self {
            Markup::Content { span, .. }
            | Markup::Raw { span, .. }
            | Markup::Comment { span, .. }
            | Markup::Output { span, .. }
            | Markup::Tag { span, .. }
            | Markup::Lines { span, .. } => Some(*span),
            Markup::Eoi => None,
        }
    }
}

/// A lexical unit inside an output or tag body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExpressionToken<'source> {
    /// `true`
    True { span: Span },
    /// `false`
    False { span: Span },
    /// `and`
    And { span: Span },
    /// `or`
    Or { span: Span },
    /// `in`
    In { span: Span },
    /// `not`
    Not { span: Span },
    /// `contains`
    Contains { span: Span },
    /// `null` or `nil`
    Null { span: Span },
    /// `if`
    If { span: Span },
    /// `else`
    Else { span: Span },
    /// `with`
    With { span: Span },
    /// `as`
    As { span: Span },
    /// `for`
    For { span: Span },
    /// `required`
    Required { span: Span },
    /// `==`
    Eq { span: Span },
    /// `!=` or `<>`
    Ne { span: Span },
    /// `>=`
    Ge { span: Span },
    /// `>`
    Gt { span: Span },
    /// `<=`
    Le { span: Span },
    /// `<`
    Lt { span: Span },
    /// `:`
    Colon { span: Span },
    /// `|`
    Pipe { span: Span },
    /// `||`
    DoublePipe { span: Span },
    /// `,`
    Comma { span: Span },
    /// `=`
    Assign { span: Span },
    /// `(`
    LeftParen { span: Span },
    /// `)`
    RightParen { span: Span },
    /// A quoted string with escape sequences resolved.
    StringLiteral { span: Span, value: String },
    IntegerLiteral { span: Span, value: i64 },
    FloatLiteral { span: Span, value: f64 },
    /// A bare identifier.
    Word { span: Span, value: &'source str },
    /// A range such as `(1..3)`.
    RangeLiteral {
        span: Span,
        start: RangeArgument,
        stop: RangeArgument,
    },
    /// An embedded path expression.
    Query { span: Span, path: Query },
}

impl ExpressionToken<'_> {
    pub fn span(&self) -> Span {
        match self {
            ExpressionToken::True { span }
            | ExpressionToken::False { span }
            | ExpressionToken::And { span }
            | ExpressionToken::Or { span }
            | ExpressionToken::In { span }
            | ExpressionToken::Not { span }
            | ExpressionToken::Contains { span }
            | ExpressionToken::Null { span }
            | ExpressionToken::If { span }
            | ExpressionToken::Else { span }
            | ExpressionToken::With { span }
            | ExpressionToken::As { span }
            | ExpressionToken::For { span }
            | ExpressionToken::Required { span }
            | ExpressionToken::Eq { span }
            | ExpressionToken::Ne { span }
            | ExpressionToken::Ge { span }
            | ExpressionToken::Gt { span }
            | ExpressionToken::Le { span }
            | ExpressionToken::Lt { span }
            | ExpressionToken::Colon { span }
            | ExpressionToken::Pipe { span }
            | ExpressionToken::DoublePipe { span }
            | ExpressionToken::Comma { span }
            | ExpressionToken::Assign { span }
            | ExpressionToken::LeftParen { span }
            | ExpressionToken::RightParen { span }
            | ExpressionToken::StringLiteral { span, .. }
            | ExpressionToken::IntegerLiteral { span, .. }
            | ExpressionToken::FloatLiteral { span, .. }
            | ExpressionToken::Word { span, .. }
            | ExpressionToken::RangeLiteral { span, .. }
            | ExpressionToken::Query { span, .. } => *span,
        }
    }

    /// A short human readable description used in error messages.
    pub fn human(&self) -> &'static str {
        match self {
            ExpressionToken::True { .. } => "keyword `true`",
            ExpressionToken::False { .. } => "keyword `false`",
            ExpressionToken::And { .. } => "keyword `and`",
            ExpressionToken::Or { .. } => "keyword `or`",
            ExpressionToken::In { .. } => "keyword `in`",
            ExpressionToken::Not { .. } => "keyword `not`",
            ExpressionToken::Contains { .. } => "keyword `contains`",
            ExpressionToken::Null { .. } => "keyword `null`",
            ExpressionToken::If { .. } => "keyword `if`",
            ExpressionToken::Else { .. } => "keyword `else`",
            ExpressionToken::With { .. } => "keyword `with`",
            ExpressionToken::As { .. } => "keyword `as`",
            ExpressionToken::For { .. } => "keyword `for`",
            ExpressionToken::Required { .. } => "keyword `required`",
            ExpressionToken::Eq { .. } => "`==`",
            ExpressionToken::Ne { .. } => "`!=`",
            ExpressionToken::Ge { .. } => "`>=`",
            ExpressionToken::Gt { .. } => "`>`",
            ExpressionToken::Le { .. } => "`<=`",
            ExpressionToken::Lt { .. } => "`<`",
            ExpressionToken::Colon { .. } => "colon",
            ExpressionToken::Pipe { .. } => "pipe",
            ExpressionToken::DoublePipe { .. } => "double pipe",
            ExpressionToken::Comma { .. } => "comma",
            ExpressionToken::Assign { .. } => "`=`",
            ExpressionToken::LeftParen { .. } => "`(`",
            ExpressionToken::RightParen { .. } => "`)`",
            ExpressionToken::StringLiteral { .. } => "string literal",
            ExpressionToken::IntegerLiteral { .. } => "integer literal",
            ExpressionToken::FloatLiteral { .. } => "float literal",
            ExpressionToken::Word { .. } => "word",
            ExpressionToken::RangeLiteral { .. } => "range literal",
            ExpressionToken::Query { .. } => "query",
        }
    }
}

/// An endpoint of a range literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RangeArgument {
    StringLiteral { span: Span, value: String },
    IntegerLiteral { span: Span, value: i64 },
    FloatLiteral { span: Span, value: f64 },
    Query { span: Span, path: Query },
}
