//! A recursive descent parser for path expressions.
//!
//! The parser is reentrant: it backs the public [`parse_query`] and
//! [`parse_jsonpath_query`] entry points and is also invoked by the
//! expression tokenizer for queries embedded in tag and output bodies. The
//! embedded entry accepts an absolute starting offset into the template
//! source and reports how many bytes it consumed, so spans always refer to
//! the original source.
//!
//! [`parse_query`]: crate::parse_query
//! [`parse_jsonpath_query`]: crate::parse_jsonpath_query

use crate::scan::cursor::Cursor;
use crate::scan::{self, Number, MAX_DEPTH};
use crate::types::query::{
    ComparisonOperator, FilterExpression, LogicalOperator, Query, Segment, Selector,
};
use crate::types::span::Span;
use crate::{Error, Result};

/// Indices and slice bounds are restricted to the I-JSON interval.
const INDEX_MIN: i64 = -(2_i64.pow(53)) + 1;
const INDEX_MAX: i64 = 2_i64.pow(53) - 1;

/// Which flavour of the query grammar to accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dialect {
    /// The Liquid dialect: implicit roots, hyphens in shorthand names, and
    /// singular query selectors.
    Liquid,
    /// Strict JSONPath: explicit `$` root only, no extensions.
    JsonPath,
}

/// Parses a complete path string. Trailing input is an error.
pub(crate) fn parse(path: &str, dialect: Dialect) -> Result<Query> {
    let mut parser = QueryParser {
        source: path,
        cursor: Cursor::new(path),
        dialect,
        embedded: false,
        depth: 0,
    };
    let query = parser.query(false)?;
    if !parser.cursor.is_eof() {
        let m = parser.cursor.pos();
        return Err(Error::syntax("expected end of query", path, m..path.len()));
    }
    Ok(query)
}

/// Parses a query embedded in a template expression, starting at `offset`.
///
/// Returns the query and the offset just past its final byte. With
/// `in_range` set, a `..` terminates the query instead of starting a
/// recursive segment, so that queries can appear as range literal endpoints.
pub(crate) fn parse_embedded(
    source: &str,
    offset: usize,
    in_range: bool,
) -> Result<(Query, usize)> {
    let mut parser = QueryParser {
        source,
        cursor: Cursor::at(source, offset),
        dialect: Dialect::Liquid,
        embedded: true,
        depth: 0,
    };
    let query = parser.query(in_range)?;
    Ok((query, parser.cursor.pos()))
}

struct QueryParser<'source> {
    source: &'source str,
    cursor: Cursor<'source>,
    dialect: Dialect,
    /// Embedded queries keep their segments contiguous; standalone queries
    /// permit blank space between segments.
    embedded: bool,
    depth: usize,
}

impl<'source> QueryParser<'source> {
    fn query(&mut self, in_range: bool) -> Result<Query> {
        let m = self.cursor.pos();
        let mut segments = Vec::new();

        if !self.cursor.eat('$') {
            match self.dialect {
                Dialect::JsonPath => {
                    return Err(Error::syntax("expected `$`", self.source, m..m + 1));
                }
                Dialect::Liquid => {
                    // An implicit root segment: a bare member name or a
                    // bracketed selection.
                    if self.cursor.starts_with("[") {
                        segments.push(self.bracketed_segment(m, false)?);
                    } else if let Some(span) = self.name() {
                        let name = self.source[span].to_owned();
                        segments.push(Segment::Child {
                            span,
                            selectors: vec![Selector::Name { span, name }],
                        });
                    } else {
                        return Err(Error::syntax("expected a query", self.source, m..m + 1));
                    }
                }
            }
        }

        self.segments(&mut segments, in_range)?;
        Ok(Query { segments })
    }

    /// Parses trailing segments into `segments` until the source stops
    /// looking like a query.
    fn segments(&mut self, segments: &mut Vec<Segment>, in_range: bool) -> Result<()> {
        loop {
            let mark = self.cursor.pos();
            if !self.embedded {
                self.skip_blank();
            }
            if in_range && self.cursor.starts_with("..") {
                // The dots belong to the enclosing range literal.
                self.cursor.set_pos(mark);
                break;
            }
            let m = self.cursor.pos();
            if self.cursor.eat_str("..") {
                segments.push(self.recursive_segment(m)?);
            } else if self.cursor.eat('.') {
                segments.push(self.dot_segment(m)?);
            } else if self.cursor.starts_with("[") {
                segments.push(self.bracketed_segment(m, false)?);
            } else {
                self.cursor.set_pos(mark);
                break;
            }
        }
        Ok(())
    }

    /// A `..name`, `..*` or `..[ ... ]` segment, with the cursor just past
    /// the dots.
    fn recursive_segment(&mut self, m: usize) -> Result<Segment> {
        if self.cursor.starts_with("[") {
            return self.bracketed_segment(m, true);
        }
        let selector = self.shorthand_selector()?;
        Ok(Segment::Recursive {
            span: Span::from(m..self.cursor.pos()),
            selectors: vec![selector],
        })
    }

    /// A `.name` or `.*` segment, with the cursor just past the dot.
    fn dot_segment(&mut self, m: usize) -> Result<Segment> {
        let selector = self.shorthand_selector()?;
        Ok(Segment::Child {
            span: Span::from(m..self.cursor.pos()),
            selectors: vec![selector],
        })
    }

    fn shorthand_selector(&mut self) -> Result<Selector> {
        let m = self.cursor.pos();
        if self.cursor.eat('*') {
            return Ok(Selector::Wild {
                span: Span::from(m..self.cursor.pos()),
            });
        }
        match self.name() {
            Some(span) => Ok(Selector::Name {
                span,
                name: self.source[span].to_owned(),
            }),
            None => Err(Error::syntax(
                "expected a member name",
                self.source,
                m..m + 1,
            )),
        }
    }

    /// A `[ ... ]` segment, with the cursor at the opening bracket. `m` is
    /// the start of the segment, which differs from the bracket position for
    /// recursive segments.
    fn bracketed_segment(&mut self, m: usize, recursive: bool) -> Result<Segment> {
        let open = self.cursor.pos();
        self.cursor.eat('[');
        self.enter(open)?;

        let mut selectors = Vec::new();
        loop {
            self.skip_blank();
            if self.cursor.is_eof() {
                return Err(Error::syntax(
                    "unterminated bracketed selection",
                    self.source,
                    open..open + 1,
                ));
            }
            selectors.push(self.selector()?);
            self.skip_blank();
            if self.cursor.eat(',') {
                continue;
            }
            if self.cursor.eat(']') {
                break;
            }
            if self.cursor.is_eof() {
                return Err(Error::syntax(
                    "unterminated bracketed selection",
                    self.source,
                    open..open + 1,
                ));
            }
            let n = self.cursor.pos();
            return Err(Error::syntax("expected `,` or `]`", self.source, n..n + 1));
        }
        self.depth -= 1;

        let span = Span::from(m..self.cursor.pos());
        Ok(if recursive {
            Segment::Recursive { span, selectors }
        } else {
            Segment::Child { span, selectors }
        })
    }

    fn selector(&mut self) -> Result<Selector> {
        let m = self.cursor.pos();
        match self.cursor.peek() {
            Some('\'' | '"') => {
                let (name, span) = scan::scan_string(&mut self.cursor, self.source, true)?;
                Ok(Selector::Name { span, name })
            }
            Some('*') => {
                self.cursor.bump();
                Ok(Selector::Wild {
                    span: Span::from(m..self.cursor.pos()),
                })
            }
            Some('?') => {
                self.cursor.bump();
                self.enter(m)?;
                let expression = self.logical_or()?;
                self.depth -= 1;
                Ok(Selector::Filter {
                    span: Span::from(m..self.cursor.pos()),
                    expression: Box::new(expression),
                })
            }
            Some(c) if c == '-' || c == ':' || c.is_ascii_digit() => self.slice_or_index(m),
            Some('$' | '@') if self.dialect == Dialect::Liquid => self.singular_query_selector(m),
            Some(c) if scan::is_name_first(c) && self.dialect == Dialect::Liquid => {
                self.singular_query_selector(m)
            }
            _ => Err(Error::syntax("expected a selector", self.source, m..m + 1)),
        }
    }

    /// An index selector, or a slice selector if a colon shows up.
    fn slice_or_index(&mut self, m: usize) -> Result<Selector> {
        let start = match self.cursor.peek() {
            Some(c) if c == '-' || c.is_ascii_digit() => Some(self.int_literal()?),
            _ => None,
        };
        let mut n = self.cursor.pos();

        self.skip_blank();
        if !self.cursor.eat(':') {
            self.cursor.set_pos(n);
            let (index, span) = start.expect("scanner bug: index selector without digits");
            return Ok(Selector::Index { span, index });
        }
        n = self.cursor.pos();

        self.skip_blank();
        let stop = match self.cursor.peek() {
            Some(c) if c == '-' || c.is_ascii_digit() => {
                let value = self.int_literal()?;
                n = self.cursor.pos();
                Some(value)
            }
            _ => {
                self.cursor.set_pos(n);
                None
            }
        };

        self.skip_blank();
        let step = if self.cursor.eat(':') {
            n = self.cursor.pos();
            self.skip_blank();
            match self.cursor.peek() {
                Some(c) if c == '-' || c.is_ascii_digit() => {
                    let (value, span) = self.int_literal()?;
                    if value == 0 {
                        return Err(Error::syntax(
                            "slice step can't be zero",
                            self.source,
                            span,
                        ));
                    }
                    n = self.cursor.pos();
                    Some((value, span))
                }
                _ => {
                    self.cursor.set_pos(n);
                    None
                }
            }
        } else {
            self.cursor.set_pos(n);
            None
        };

        Ok(Selector::Slice {
            span: Span::from(m..n),
            start: start.map(|(value, _)| value),
            stop: stop.map(|(value, _)| value),
            step: step.map(|(value, _)| value),
        })
    }

    /// A nested query acting as a dynamic key or index, e.g. the inner path
    /// in `a[b.c]`. The query must be singular.
    fn singular_query_selector(&mut self, m: usize) -> Result<Selector> {
        let mut segments = Vec::new();
        if !matches!(self.cursor.peek(), Some('$' | '@')) {
            let span = self
                .name()
                .expect("scanner bug: singular query selector without a name");
            let name = self.source[span].to_owned();
            segments.push(Segment::Child {
                span,
                selectors: vec![Selector::Name { span, name }],
            });
        } else {
            self.cursor.bump();
        }
        self.segments(&mut segments, false)?;

        let span = Span::from(m..self.cursor.pos());
        let query = Query { segments };
        if !query.is_singular() {
            return Err(Error::syntax(
                "non-singular query in singular context",
                self.source,
                span,
            ));
        }
        Ok(Selector::SingularQuery {
            span,
            query: Box::new(query),
        })
    }

    fn logical_or(&mut self) -> Result<FilterExpression> {
        let mut left = self.logical_and()?;
        loop {
            let mark = self.cursor.pos();
            self.skip_blank();
            if !self.cursor.eat_str("||") {
                self.cursor.set_pos(mark);
                return Ok(left);
            }
            let right = self.logical_and()?;
            let span = left.span().combine(right.span());
            left = FilterExpression::Logical {
                span,
                left: Box::new(left),
                operator: LogicalOperator::Or,
                right: Box::new(right),
            };
        }
    }

    fn logical_and(&mut self) -> Result<FilterExpression> {
        let mut left = self.basic_expression()?;
        loop {
            let mark = self.cursor.pos();
            self.skip_blank();
            if !self.cursor.eat_str("&&") {
                self.cursor.set_pos(mark);
                return Ok(left);
            }
            let right = self.basic_expression()?;
            let span = left.span().combine(right.span());
            left = FilterExpression::Logical {
                span,
                left: Box::new(left),
                operator: LogicalOperator::And,
                right: Box::new(right),
            };
        }
    }

    /// A negation, a comparison, or a bare test expression.
    fn basic_expression(&mut self) -> Result<FilterExpression> {
        self.skip_blank();
        let m = self.cursor.pos();

        // `!` binds tighter than `&&` but looser than a comparison, so
        // `!@.x == 1` negates the whole comparison.
        if self.cursor.eat('!') && !self.cursor.starts_with("=") {
            let expression = self.basic_expression()?;
            return Ok(FilterExpression::Not {
                span: Span::from(m..expression.span().n),
                expression: Box::new(expression),
            });
        }
        self.cursor.set_pos(m);

        let left = self.comparand()?;
        let mark = self.cursor.pos();
        self.skip_blank();

        let operator = if self.cursor.eat_str("==") {
            ComparisonOperator::Eq
        } else if self.cursor.eat_str("!=") {
            ComparisonOperator::Ne
        } else if self.cursor.eat_str("<=") {
            ComparisonOperator::Le
        } else if self.cursor.eat_str(">=") {
            ComparisonOperator::Ge
        } else if self.cursor.eat('<') {
            ComparisonOperator::Lt
        } else if self.cursor.eat('>') {
            ComparisonOperator::Gt
        } else {
            self.cursor.set_pos(mark);
            return Ok(left);
        };

        self.assert_comparable(&left)?;
        let right = self.comparand()?;
        self.assert_comparable(&right)?;
        let span = left.span().combine(right.span());
        Ok(FilterExpression::Comparison {
            span,
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    /// A primary filter expression: a parenthesized logical expression, a
    /// literal, a filter query, or a function call.
    fn comparand(&mut self) -> Result<FilterExpression> {
        self.skip_blank();
        let m = self.cursor.pos();
        match self.cursor.peek() {
            Some('(') => {
                self.cursor.bump();
                self.enter(m)?;
                let expression = self.logical_or()?;
                self.skip_blank();
                if !self.cursor.eat(')') {
                    return Err(Error::syntax(
                        "unbalanced parentheses",
                        self.source,
                        m..m + 1,
                    ));
                }
                self.depth -= 1;
                Ok(expression)
            }
            Some('\'' | '"') => {
                let (value, span) = scan::scan_string(&mut self.cursor, self.source, true)?;
                Ok(FilterExpression::StringLiteral { span, value })
            }
            Some(c) if c == '-' || c.is_ascii_digit() => {
                let (number, span) = scan::scan_number(&mut self.cursor, self.source)?;
                Ok(match number {
                    Number::Int(value) => FilterExpression::Int { span, value },
                    Number::Float(value) => FilterExpression::Float { span, value },
                })
            }
            Some('@') => {
                self.cursor.bump();
                let mut segments = Vec::new();
                self.segments(&mut segments, false)?;
                Ok(FilterExpression::RelativeQuery {
                    span: Span::from(m..self.cursor.pos()),
                    query: Box::new(Query { segments }),
                })
            }
            Some('$') => {
                self.cursor.bump();
                let mut segments = Vec::new();
                self.segments(&mut segments, false)?;
                Ok(FilterExpression::RootQuery {
                    span: Span::from(m..self.cursor.pos()),
                    query: Box::new(Query { segments }),
                })
            }
            Some(c) if scan::is_name_first(c) => {
                let span = scan::scan_name(&mut self.cursor, true)
                    .expect("scanner bug: name scan after name start");
                match &self.source[span] {
                    "true" => Ok(FilterExpression::True { span }),
                    "false" => Ok(FilterExpression::False { span }),
                    "null" => Ok(FilterExpression::Null { span }),
                    name => {
                        if !self.cursor.eat('(') {
                            return Err(Error::syntax(
                                "expected a filter expression",
                                self.source,
                                span,
                            ));
                        }
                        self.function_call(name.to_owned(), span)
                    }
                }
            }
            _ => Err(Error::syntax(
                "expected a filter expression",
                self.source,
                m..m + 1,
            )),
        }
    }

    /// A function call, with the cursor just past the opening parenthesis.
    ///
    /// Function names are not resolved here; unknown names are deferred to
    /// downstream resolution.
    fn function_call(&mut self, name: String, name_span: Span) -> Result<FilterExpression> {
        self.enter(name_span.m)?;
        let mut args = Vec::new();
        self.skip_blank();
        if !self.cursor.eat(')') {
            loop {
                args.push(self.logical_or()?);
                self.skip_blank();
                if self.cursor.eat(',') {
                    continue;
                }
                if self.cursor.eat(')') {
                    break;
                }
                let n = self.cursor.pos();
                return Err(Error::syntax("expected `,` or `)`", self.source, n..n + 1));
            }
        }
        self.depth -= 1;
        Ok(FilterExpression::Function {
            span: Span::from(name_span.m..self.cursor.pos()),
            name,
            args,
        })
    }

    /// Comparison operands must be literals, singular queries, or function
    /// calls.
    fn assert_comparable(&self, expression: &FilterExpression) -> Result<()> {
        match expression {
            FilterExpression::RelativeQuery { query, span }
            | FilterExpression::RootQuery { query, span } => {
                if !query.is_singular() {
                    return Err(Error::syntax(
                        "non-singular query is not comparable",
                        self.source,
                        *span,
                    ));
                }
                Ok(())
            }
            FilterExpression::Not { span, .. }
            | FilterExpression::Logical { span, .. }
            | FilterExpression::Comparison { span, .. } => Err(Error::syntax(
                "expression is not comparable",
                self.source,
                *span,
            )),
            _ => Ok(()),
        }
    }

    fn int_literal(&mut self) -> Result<(i64, Span)> {
        let m = self.cursor.pos();
        self.cursor.eat('-');
        let digits = self.cursor.eat_while(|c| c.is_ascii_digit());
        if digits.m == digits.n {
            return Err(Error::syntax(
                "expected an integer",
                self.source,
                m..self.cursor.pos(),
            ));
        }
        let span = Span::from(m..self.cursor.pos());
        let raw = &self.source[span];
        let value: i64 = raw.parse().map_err(|_| {
            Error::syntax(format!("index out of range `{raw}`"), self.source, span)
        })?;
        if !(INDEX_MIN..=INDEX_MAX).contains(&value) {
            return Err(Error::syntax(
                format!("index out of range `{raw}`"),
                self.source,
                span,
            ));
        }
        Ok((value, span))
    }

    fn name(&mut self) -> Option<Span> {
        scan::scan_name(&mut self.cursor, self.dialect == Dialect::JsonPath)
    }

    fn skip_blank(&mut self) {
        self.cursor.eat_while(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));
    }

    fn enter(&mut self, at: usize) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(Error::syntax(
                "maximum nesting depth exceeded",
                self.source,
                at..at + 1,
            ));
        }
        Ok(())
    }
}
