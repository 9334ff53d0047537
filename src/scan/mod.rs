//! Scan the template source into markup nodes.
//!
//! This process has three layers:
//! - The markup scanner partitions the source into markup nodes.
//! - The expression tokenizer produces a flat token list for each tag or
//!   output body.
//! - The query parser turns path expressions into a [`Query`] AST, both for
//!   queries embedded in expressions and for the standalone entry points.
//!
//! [`Query`]: crate::types::query::Query

mod cursor;
pub(crate) mod expr;
pub(crate) mod markup;
pub(crate) mod query;
pub(crate) mod unescape;

use crate::types::span::Span;
use crate::{Error, Result};

use self::cursor::Cursor;

/// Maximum nesting depth for delimited constructs such as parentheses,
/// bracketed selections and filter expressions.
pub(crate) const MAX_DEPTH: usize = 256;

/// Returns `true` if the character can start a name.
///
/// Names cover bare words in expressions, tag names, and shorthand member
/// names in queries.
pub(crate) fn is_name_first(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

/// Returns `true` if the character can continue a name.
///
/// Hyphens are allowed, which distinguishes this grammar from strict
/// JSONPath.
pub(crate) fn is_name_char(c: char) -> bool {
    is_name_first(c) || c.is_ascii_digit() || c == '-'
}

/// [`is_name_char`] for the strict JSONPath dialect, which has no hyphens.
pub(crate) fn is_strict_name_char(c: char) -> bool {
    is_name_first(c) || c.is_ascii_digit()
}

/// Consumes a name and returns its span, or `None` if the next character
/// cannot start one.
pub(crate) fn scan_name<'source>(
    cursor: &mut Cursor<'source>,
    strict: bool,
) -> Option<Span> {
    if !cursor.peek().map(is_name_first).unwrap_or(false) {
        return None;
    }
    let pred = if strict { is_strict_name_char } else { is_name_char };
    Some(cursor.eat_while(pred))
}

/// A scanned numeric literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Int(i64),
    Float(f64),
}

/// Consumes a numeric literal.
///
/// The grammar is an optional `-`, an integer part (`0` or a nonzero-leading
/// digit run), an optional fraction, and an optional exponent. A number is an
/// integer only when it has neither a fraction nor an exponent and fits in an
/// `i64`; everything else is a float.
pub(crate) fn scan_number(cursor: &mut Cursor<'_>, source: &str) -> Result<(Number, Span)> {
    let m = cursor.pos();
    cursor.eat('-');

    if !cursor.eat('0') {
        let digits = cursor.eat_while(|c| c.is_ascii_digit());
        if digits.m == digits.n {
            return Err(Error::syntax(
                "expected a digit",
                source,
                m..cursor.pos(),
            ));
        }
    }

    let mut is_float = false;

    // Fraction, only when a digit follows the dot. This keeps the `..` in
    // range literals like `(1..3)` out of the number.
    if cursor.peek() == Some('.') && cursor.peek_second().map(|c| c.is_ascii_digit()) == Some(true)
    {
        cursor.eat('.');
        cursor.eat_while(|c| c.is_ascii_digit());
        is_float = true;
    }

    // Exponent, only when at least one digit follows. `1e` is the integer
    // one followed by a name.
    if matches!(cursor.peek(), Some('e' | 'E')) {
        let mut lookahead = cursor.clone();
        lookahead.bump();
        if matches!(lookahead.peek(), Some('+' | '-')) {
            lookahead.bump();
        }
        if lookahead.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            lookahead.eat_while(|c| c.is_ascii_digit());
            cursor.set_pos(lookahead.pos());
            is_float = true;
        }
    }

    let span = Span::from(m..cursor.pos());
    let raw = &source[span];

    if !is_float {
        if let Ok(value) = raw.parse::<i64>() {
            return Ok((Number::Int(value), span));
        }
    }
    match raw.parse::<f64>() {
        Ok(value) => Ok((Number::Float(value), span)),
        Err(_) => Err(Error::syntax("invalid number literal", source, span)),
    }
}

/// Consumes a quoted string literal and returns the cooked value and the
/// span of the text between the quotes.
pub(crate) fn scan_string(
    cursor: &mut Cursor<'_>,
    source: &str,
    multiline: bool,
) -> Result<(String, Span)> {
    let open = cursor.pos();
    let quote = match cursor.bump() {
        Some(q @ ('\'' | '"')) => q,
        _ => panic!("scanner bug: not at a string literal"),
    };

    let m = cursor.pos();
    loop {
        match cursor.peek() {
            None => {
                return Err(Error::syntax(
                    "unterminated string literal",
                    source,
                    open..open + 1,
                ));
            }
            Some('\n') if !multiline => {
                return Err(Error::syntax(
                    "unterminated string literal",
                    source,
                    open..open + 1,
                ));
            }
            Some(c) if c == quote => break,
            Some('\\') => {
                cursor.bump();
                if cursor.bump().is_none() {
                    return Err(Error::syntax(
                        "unterminated string literal",
                        source,
                        open..open + 1,
                    ));
                }
            }
            Some(_) => {
                cursor.bump();
            }
        }
    }

    let span = Span::from(m..cursor.pos());
    cursor.eat(quote);
    let value = unescape::unescape(&source[span], source, span)?;
    Ok((value, span))
}
