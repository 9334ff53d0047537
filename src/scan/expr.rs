//! Tokenizes tag and output bodies into expression tokens.

use crate::scan::cursor::Cursor;
use crate::scan::{self, query, Number};
use crate::types::markup::{ExpressionToken, RangeArgument, Whitespace};
use crate::types::span::Span;
use crate::{Error, Result};

/// A tokenizer for the expression part of a tag or output statement.
///
/// Tokens are produced in source order until the closing delimiter. Inside
/// `liquid` line statements only spaces and tabs separate tokens and the
/// first newline ends the statement; in ordinary bodies newlines are just
/// whitespace and string literals may span lines.
pub(crate) struct ExprScanner<'source> {
    source: &'source str,
    cursor: Cursor<'source>,
    line_mode: bool,
}

impl<'source> ExprScanner<'source> {
    pub fn new(source: &'source str, pos: usize, line_mode: bool) -> Self {
        Self {
            source,
            cursor: Cursor::at(source, pos),
            line_mode,
        }
    }

    pub fn pos(&self) -> usize {
        self.cursor.pos()
    }

    /// Scans tokens up to and including the closing delimiter, returning the
    /// tokens and the whitespace marker attached to the close.
    pub fn scan_body(
        &mut self,
        close: &str,
        begin: Span,
        unterminated: &str,
    ) -> Result<(Vec<ExpressionToken<'source>>, Whitespace)> {
        let mut tokens = Vec::new();
        loop {
            self.skip_space();
            if let Some((wc, end)) = self.at_close(close) {
                self.cursor.set_pos(end);
                return Ok((tokens, wc));
            }
            if self.cursor.is_eof() {
                return Err(Error::syntax(unterminated, self.source, begin));
            }
            tokens.push(self.next_token()?);
        }
    }

    /// Scans tokens until the end of a `liquid` line statement, stopping
    /// before the newline or closing `%}` without consuming either.
    pub fn scan_line(&mut self) -> Result<Vec<ExpressionToken<'source>>> {
        let mut tokens = Vec::new();
        loop {
            self.cursor.eat_while(|c| c == ' ' || c == '\t');
            if self.cursor.is_eof() || self.at_line_end() {
                return Ok(tokens);
            }
            tokens.push(self.next_token()?);
        }
    }

    fn at_line_end(&self) -> bool {
        self.cursor.starts_with("\n")
            || self.cursor.starts_with("\r\n")
            || self.at_close("%}").is_some()
    }

    /// Checks for the closing delimiter, optionally preceded by a whitespace
    /// control marker, and returns the marker and the offset just past the
    /// close.
    fn at_close(&self, close: &str) -> Option<(Whitespace, usize)> {
        let rest = self.cursor.rest();
        if rest.starts_with(close) {
            return Some((Whitespace::Default, self.cursor.pos() + close.len()));
        }
        let mut chars = rest.chars();
        match chars.next() {
            Some(c @ ('+' | '-' | '~')) if chars.as_str().starts_with(close) => Some((
                Whitespace::from_marker(Some(c)),
                self.cursor.pos() + 1 + close.len(),
            )),
            _ => None,
        }
    }

    fn skip_space(&mut self) {
        if self.line_mode {
            self.cursor.eat_while(|c| c == ' ' || c == '\t');
        } else {
            self.cursor.eat_while(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));
        }
    }

    fn next_token(&mut self) -> Result<ExpressionToken<'source>> {
        let m = self.cursor.pos();
        let c = self.cursor.peek().expect("scanner bug: no input left");
        match c {
            '\'' | '"' => {
                let (value, span) =
                    scan::scan_string(&mut self.cursor, self.source, !self.line_mode)?;
                Ok(ExpressionToken::StringLiteral { span, value })
            }
            c if c.is_ascii_digit() => self.number(),
            '-' if self
                .cursor
                .peek_second()
                .map(|c| c.is_ascii_digit())
                .unwrap_or(false) =>
            {
                self.number()
            }
            '(' => match self.try_range() {
                Some(token) => Ok(token),
                None => {
                    self.cursor.bump();
                    Ok(ExpressionToken::LeftParen {
                        span: Span::from(m..m + 1),
                    })
                }
            },
            '$' | '[' => self.query(m),
            c if scan::is_name_first(c) => self.word(m),
            _ => self.symbol(m),
        }
    }

    fn number(&mut self) -> Result<ExpressionToken<'source>> {
        let (number, span) = scan::scan_number(&mut self.cursor, self.source)?;
        Ok(match number {
            Number::Int(value) => ExpressionToken::IntegerLiteral { span, value },
            Number::Float(value) => ExpressionToken::FloatLiteral { span, value },
        })
    }

    /// A reserved word, a bare word, or a query if the word is followed by
    /// `.` or `[`.
    fn word(&mut self, m: usize) -> Result<ExpressionToken<'source>> {
        let mut lookahead = self.cursor.clone();
        let span = scan::scan_name(&mut lookahead, false)
            .expect("scanner bug: word scan after name start");

        // Reserved words win, but only at a word boundary; `iftrue` is a
        // single word.
        if let Some(token) = reserved_word(&self.source[span], span) {
            self.cursor.set_pos(span.n);
            return Ok(token);
        }

        if matches!(lookahead.peek(), Some('.' | '[')) {
            return self.query(m);
        }

        self.cursor.set_pos(span.n);
        Ok(ExpressionToken::Word {
            span,
            value: &self.source[span],
        })
    }

    fn query(&mut self, m: usize) -> Result<ExpressionToken<'source>> {
        let (path, end) = query::parse_embedded(self.source, m, false)?;
        self.cursor.set_pos(end);
        Ok(ExpressionToken::Query {
            span: Span::from(m..end),
            path,
        })
    }

    /// Attempts to scan a range literal such as `(1..3)`. Returns `None`
    /// without consuming anything if the shape does not complete, in which
    /// case the `(` is an ordinary parenthesis.
    fn try_range(&mut self) -> Option<ExpressionToken<'source>> {
        let m = self.cursor.pos();
        let mut cursor = self.cursor.clone();
        cursor.eat('(');

        cursor.eat_while(is_hspace);
        let start = range_argument(&mut cursor, self.source)?;
        cursor.eat_while(is_hspace);
        if !cursor.eat_str("..") {
            return None;
        }
        cursor.eat_while(is_hspace);
        let stop = range_argument(&mut cursor, self.source)?;
        cursor.eat_while(is_hspace);
        if !cursor.eat(')') {
            return None;
        }

        let span = Span::from(m..cursor.pos());
        self.cursor.set_pos(cursor.pos());
        Some(ExpressionToken::RangeLiteral { span, start, stop })
    }

    fn symbol(&mut self, m: usize) -> Result<ExpressionToken<'source>> {
        for (symbol, token) in [
            ("==", ExpressionToken::Eq {
                span: Span::from(m..m + 2),
            }),
            ("!=", ExpressionToken::Ne {
                span: Span::from(m..m + 2),
            }),
            ("<>", ExpressionToken::Ne {
                span: Span::from(m..m + 2),
            }),
            (">=", ExpressionToken::Ge {
                span: Span::from(m..m + 2),
            }),
            ("<=", ExpressionToken::Le {
                span: Span::from(m..m + 2),
            }),
            ("||", ExpressionToken::DoublePipe {
                span: Span::from(m..m + 2),
            }),
        ] {
            if self.cursor.eat_str(symbol) {
                return Ok(token);
            }
        }

        let span = Span::from(m..m + 1);
        let token = match self.cursor.peek() {
            Some('>') => ExpressionToken::Gt { span },
            Some('<') => ExpressionToken::Lt { span },
            Some(':') => ExpressionToken::Colon { span },
            Some('|') => ExpressionToken::Pipe { span },
            Some(',') => ExpressionToken::Comma { span },
            Some('(') => ExpressionToken::LeftParen { span },
            Some(')') => ExpressionToken::RightParen { span },
            Some('=') => ExpressionToken::Assign { span },
            Some(c) => {
                return Err(Error::syntax(
                    "unexpected character",
                    self.source,
                    m..m + c.len_utf8(),
                ));
            }
            None => {
                return Err(Error::syntax("unexpected end of input", self.source, m..m));
            }
        };
        self.cursor.bump();
        Ok(token)
    }
}

fn is_hspace(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// An endpoint of a range literal: a number, a string, or a query. A bare
/// word counts as a single-segment query here.
fn range_argument<'source>(
    cursor: &mut Cursor<'source>,
    source: &'source str,
) -> Option<RangeArgument> {
    match cursor.peek()? {
        '\'' | '"' => {
            let (value, span) = scan::scan_string(cursor, source, false).ok()?;
            Some(RangeArgument::StringLiteral { span, value })
        }
        c if c.is_ascii_digit() || c == '-' => {
            let (number, span) = scan::scan_number(cursor, source).ok()?;
            Some(match number {
                Number::Int(value) => RangeArgument::IntegerLiteral { span, value },
                Number::Float(value) => RangeArgument::FloatLiteral { span, value },
            })
        }
        c if c == '$' || c == '[' || scan::is_name_first(c) => {
            let m = cursor.pos();
            let (path, end) = query::parse_embedded(source, m, true).ok()?;
            cursor.set_pos(end);
            Some(RangeArgument::Query {
                span: Span::from(m..end),
                path,
            })
        }
        _ => None,
    }
}

/// Maps a word to its reserved word token, if it is one.
fn reserved_word(word: &str, span: Span) -> Option<ExpressionToken<'static>> {
    let token = match word {
        "true" => ExpressionToken::True { span },
        "false" => ExpressionToken::False { span },
        "and" => ExpressionToken::And { span },
        "or" => ExpressionToken::Or { span },
        "in" => ExpressionToken::In { span },
        "not" => ExpressionToken::Not { span },
        "contains" => ExpressionToken::Contains { span },
        "null" | "nil" => ExpressionToken::Null { span },
        "if" => ExpressionToken::If { span },
        "else" => ExpressionToken::Else { span },
        "with" => ExpressionToken::With { span },
        "as" => ExpressionToken::As { span },
        "for" => ExpressionToken::For { span },
        "required" => ExpressionToken::Required { span },
        _ => return None,
    };
    Some(token)
}
