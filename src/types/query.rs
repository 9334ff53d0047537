//! The query syntax tree.
//!
//! A [`Query`] is an ordered sequence of segments, each carrying one or more
//! selectors. The grammar is modeled on JSONPath with two extensions: member
//! name shorthands may contain hyphens, and a bracketed selection may contain
//! a nested *singular* query acting as a dynamic key or index.

use std::fmt;

use serde::Serialize;

use crate::types::span::Span;

/// A parsed path expression referencing a position in the data model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub segments: Vec<Segment>,
}

impl Query {
    /// Returns `true` if this query can yield at most one node.
    ///
    /// A query is singular when every segment is a child segment with exactly
    /// one selector, and that selector is a name or an index.
    pub fn is_singular(&self) -> bool {
        self.segments.iter().all(|segment| match segment {
            Segment::Child { selectors, .. } => {
                selectors.len() == 1
                    && matches!(
                        selectors[0],
                        Selector::Name { .. } | Selector::Index { .. }
                    )
            }
            Segment::Recursive { .. } => false,
        })
    }
}

/// One step of a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Segment {
    /// `.name`, `.*` or `[ ... ]`
    Child { span: Span, selectors: Vec<Selector> },
    /// `..name`, `..*` or `..[ ... ]`
    Recursive { span: Span, selectors: Vec<Selector> },
}

impl Segment {
    pub fn span(&self) -> Span {
        match self {
            Segment::Child { span, .. } | Segment::Recursive { span, .. } => *span,
        }
    }
}

/// One element of a bracketed selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Selector {
    /// A quoted or shorthand member name.
    Name { span: Span, name: String },
    /// An array index. Negative indices address from the end.
    Index { span: Span, index: i64 },
    /// An array slice. Absent bounds are preserved as absent.
    Slice {
        span: Span,
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    },
    /// `*`
    Wild { span: Span },
    /// `? expr`
    Filter {
        span: Span,
        expression: Box<FilterExpression>,
    },
    /// A nested singular query used as a dynamic key or index, e.g. the
    /// inner path in `a[b.c]`.
    SingularQuery { span: Span, query: Box<Query> },
}

impl Selector {
    pub fn span(&self) -> Span {
        match self {
            Selector::Name { span, .. }
            | Selector::Index { span, .. }
            | Selector::Slice { span, .. }
            | Selector::Wild { span }
            | Selector::Filter { span, .. }
            | Selector::SingularQuery { span, .. } => *span,
        }
    }
}

/// An expression inside a filter selector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FilterExpression {
    True { span: Span },
    False { span: Span },
    Null { span: Span },
    StringLiteral { span: Span, value: String },
    Int { span: Span, value: i64 },
    Float { span: Span, value: f64 },
    Not {
        span: Span,
        expression: Box<FilterExpression>,
    },
    Logical {
        span: Span,
        left: Box<FilterExpression>,
        operator: LogicalOperator,
        right: Box<FilterExpression>,
    },
    Comparison {
        span: Span,
        left: Box<FilterExpression>,
        operator: ComparisonOperator,
        right: Box<FilterExpression>,
    },
    /// A query rooted at the current filter context, e.g. `@.x`.
    RelativeQuery { span: Span, query: Box<Query> },
    /// A query rooted at the document root, e.g. `$.x`.
    RootQuery { span: Span, query: Box<Query> },
    /// A function call. Names are resolved downstream, not at parse time.
    Function {
        span: Span,
        name: String,
        args: Vec<FilterExpression>,
    },
}

impl FilterExpression {
    pub fn span(&self) -> Span {
        match self {
            FilterExpression::True { span }
            | FilterExpression::False { span }
            | FilterExpression::Null { span }
            | FilterExpression::StringLiteral { span, .. }
            | FilterExpression::Int { span, .. }
            | FilterExpression::Float { span, .. }
            | FilterExpression::Not { span, .. }
            | FilterExpression::Logical { span, .. }
            | FilterExpression::Comparison { span, .. }
            | FilterExpression::RelativeQuery { span, .. }
            | FilterExpression::RootQuery { span, .. }
            | FilterExpression::Function { span, .. } => *span,
        }
    }

    /// Returns `true` for literal leaf expressions.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            FilterExpression::True { .. }
                | FilterExpression::False { .. }
                | FilterExpression::Null { .. }
                | FilterExpression::StringLiteral { .. }
                | FilterExpression::Int { .. }
                | FilterExpression::Float { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogicalOperator {
    And,
    Or,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => f.write_str("&&"),
            LogicalOperator::Or => f.write_str("||"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            ComparisonOperator::Eq => "==",
            ComparisonOperator::Ne => "!=",
            ComparisonOperator::Ge => ">=",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Le => "<=",
            ComparisonOperator::Lt => "<",
        };
        f.write_str(op)
    }
}

impl fmt::Display for Query {
    /// Renders the query in canonical bracket notation rooted at `$`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let selectors = match self {
            Segment::Child { selectors, .. } => selectors,
            Segment::Recursive { selectors, .. } => {
                f.write_str("..")?;
                selectors
            }
        };
        f.write_str("[")?;
        for (i, selector) in selectors.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{selector}")?;
        }
        f.write_str("]")
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Name { name, .. } => write!(f, "'{name}'"),
            Selector::Index { index, .. } => write!(f, "{index}"),
            Selector::Slice {
                start, stop, step, ..
            } => {
                if let Some(start) = start {
                    write!(f, "{start}")?;
                }
                f.write_str(":")?;
                if let Some(stop) = stop {
                    write!(f, "{stop}")?;
                }
                f.write_str(":")?;
                if let Some(step) = step {
                    write!(f, "{step}")?;
                }
                Ok(())
            }
            Selector::Wild { .. } => f.write_str("*"),
            Selector::Filter { expression, .. } => write!(f, "?{expression}"),
            Selector::SingularQuery { query, .. } => write!(f, "{query}"),
        }
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpression::True { .. } => f.write_str("true"),
            FilterExpression::False { .. } => f.write_str("false"),
            FilterExpression::Null { .. } => f.write_str("null"),
            FilterExpression::StringLiteral { value, .. } => write!(f, "'{value}'"),
            FilterExpression::Int { value, .. } => write!(f, "{value}"),
            FilterExpression::Float { value, .. } => write!(f, "{value}"),
            FilterExpression::Not { expression, .. } => write!(f, "!{expression}"),
            FilterExpression::Logical {
                left,
                operator,
                right,
                ..
            } => write!(f, "({left} {operator} {right})"),
            FilterExpression::Comparison {
                left,
                operator,
                right,
                ..
            } => write!(f, "{left} {operator} {right}"),
            FilterExpression::RelativeQuery { query, .. } => {
                write!(f, "@{}", Segments(&query.segments))
            }
            FilterExpression::RootQuery { query, .. } => {
                write!(f, "${}", Segments(&query.segments))
            }
            FilterExpression::Function { name, args, .. } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

struct Segments<'a>(&'a [Segment]);

impl fmt::Display for Segments<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in self.0 {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}
