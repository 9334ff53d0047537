//! Partitions the template source into markup nodes.

use crate::scan;
use crate::scan::cursor::Cursor;
use crate::scan::expr::ExprScanner;
use crate::types::markup::{Markup, Whitespace};
use crate::types::span::Span;
use crate::{Error, Result};

/// Scans the whole template into a list of markup nodes ending in
/// [`Markup::Eoi`].
pub(crate) fn tokenize(source: &str) -> Result<Vec<Markup<'_>>> {
    Scanner::new(source).scan()
}

/// The markup scanner.
///
/// At each position the scanner recognises, in order: a raw block, a
/// comment, a `liquid` tag, an ordinary tag, an output statement, and
/// otherwise accumulates a content run. Tag and output bodies are handed to
/// the expression tokenizer.
struct Scanner<'source> {
    source: &'source str,
    cursor: Cursor<'source>,
}

impl<'source> Scanner<'source> {
    fn new(source: &'source str) -> Self {
        Self {
            source,
            cursor: Cursor::new(source),
        }
    }

    fn scan(mut self) -> Result<Vec<Markup<'source>>> {
        let mut nodes = Vec::new();
        while !self.cursor.is_eof() {
            nodes.push(self.next_markup()?);
        }
        nodes.push(Markup::Eoi);
        Ok(nodes)
    }

    fn next_markup(&mut self) -> Result<Markup<'source>> {
        if self.cursor.starts_with("{{") {
            self.output()
        } else if self.cursor.starts_with("{%") {
            self.tag()
        } else if self.cursor.starts_with("{#") {
            self.comment()
        } else {
            Ok(self.content())
        }
    }

    /// A maximal run of raw text, up to the next `{{`, `{%` or `{#`.
    fn content(&mut self) -> Markup<'source> {
        let m = self.cursor.pos();
        let rest = self.cursor.rest();

        let mut end = rest.len();
        for (i, _) in rest.match_indices('{') {
            // The first position is never a delimiter or we wouldn't be here.
            if i > 0 && matches!(rest.as_bytes().get(i + 1), Some(b'{' | b'%' | b'#')) {
                end = i;
                break;
            }
        }

        self.cursor.set_pos(m + end);
        let span = Span::from(m..m + end);
        Markup::Content {
            span,
            text: &self.source[span],
        }
    }

    /// An output statement, e.g. `{{ user.name }}`.
    fn output(&mut self) -> Result<Markup<'source>> {
        let m = self.cursor.pos();
        self.cursor.eat_str("{{");
        let wc_left = eat_marker(&mut self.cursor);

        let mut expr = ExprScanner::new(self.source, self.cursor.pos(), false);
        let (expression, wc_right) = expr.scan_body(
            "}}",
            Span::from(m..m + 2),
            "unterminated output statement",
        )?;
        self.cursor.set_pos(expr.pos());

        Ok(Markup::Output {
            span: Span::from(m..self.cursor.pos()),
            wc: (wc_left, wc_right),
            expression,
        })
    }

    /// A `{% ... %}` construct: a raw block, a `liquid` tag, or an ordinary
    /// tag.
    fn tag(&mut self) -> Result<Markup<'source>> {
        let m = self.cursor.pos();
        self.cursor.eat_str("{%");
        let wc_left = eat_marker(&mut self.cursor);
        self.skip_space();

        let name_span = match scan::scan_name(&mut self.cursor, false) {
            Some(span) => span,
            None => {
                let n = self.cursor.pos();
                return Err(Error::syntax("expected a tag name", self.source, n..n + 1));
            }
        };

        match &self.source[name_span] {
            "raw" => self.raw(m, wc_left),
            "liquid" => self.liquid(m, wc_left),
            name => {
                let mut expr = ExprScanner::new(self.source, self.cursor.pos(), false);
                let (expression, wc_right) =
                    expr.scan_body("%}", Span::from(m..m + 2), "unterminated tag")?;
                self.cursor.set_pos(expr.pos());

                Ok(Markup::Tag {
                    span: Span::from(m..self.cursor.pos()),
                    wc: (wc_left, wc_right),
                    name,
                    expression,
                })
            }
        }
    }

    /// The remainder of a raw block, with the cursor just past the `raw`
    /// name. The body is captured verbatim; nothing inside it is
    /// interpreted.
    fn raw(&mut self, m: usize, wc_left: Whitespace) -> Result<Markup<'source>> {
        self.skip_space();
        let wc_open_right = match eat_close(&mut self.cursor, "%}") {
            Some(wc) => wc,
            None => {
                let n = self.cursor.pos();
                return Err(Error::syntax("expected `%}`", self.source, n..n + 1));
            }
        };
        let body_start = self.cursor.pos();

        // Look for the first `{% endraw %}`, allowing whitespace and
        // whitespace control markers inside the closing tag.
        let mut search = Cursor::at(self.source, body_start);
        loop {
            let i = match search.find("{%") {
                Some(i) => i,
                None => {
                    return Err(Error::syntax(
                        "unterminated raw tag",
                        self.source,
                        m..body_start,
                    ));
                }
            };

            let mut close = Cursor::at(self.source, i + 2);
            let wc_close_left = eat_marker(&mut close);
            close.eat_while(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));
            if close.eat_str("endraw") {
                close.eat_while(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));
                if let Some(wc_close_right) = eat_close(&mut close, "%}") {
                    let span = Span::from(body_start..i);
                    self.cursor.set_pos(close.pos());
                    return Ok(Markup::Raw {
                        span: Span::from(m..close.pos()),
                        wc: (wc_left, wc_open_right, wc_close_left, wc_close_right),
                        text: &self.source[span],
                    });
                }
            }
            search.set_pos(i + 2);
        }
    }

    /// The remainder of a `liquid` tag, with the cursor just past the
    /// `liquid` name. The body is a sequence of newline separated
    /// statements.
    fn liquid(&mut self, m: usize, wc_left: Whitespace) -> Result<Markup<'source>> {
        let mut statements = Vec::new();
        let wc_right = loop {
            self.cursor.eat_while(|c| c == ' ' || c == '\t');

            if let Some(wc) = eat_close(&mut self.cursor, "%}") {
                break wc;
            }
            if self.cursor.is_eof() {
                return Err(Error::syntax(
                    "unterminated liquid tag",
                    self.source,
                    m..m + 2,
                ));
            }
            if self.cursor.eat_str("\r\n") || self.cursor.eat('\n') {
                continue;
            }
            if self.cursor.starts_with("#") {
                statements.push(self.line_comment());
                continue;
            }
            statements.push(self.line_statement()?);
        };

        Ok(Markup::Lines {
            span: Span::from(m..self.cursor.pos()),
            wc: (wc_left, wc_right),
            statements,
        })
    }

    /// A `# ...` comment line inside a `liquid` tag, running to the end of
    /// the line or the closing `%}`.
    fn line_comment(&mut self) -> Markup<'source> {
        let m = self.cursor.pos();
        self.cursor.eat('#');
        let hashes = &self.source[m..m + 1];

        let text_start = self.cursor.pos();
        loop {
            match self.cursor.peek() {
                None | Some('\n') => break,
                Some('\r') if self.cursor.peek_second() == Some('\n') => break,
                _ => {}
            }
            if at_close(&self.cursor, "%}") {
                break;
            }
            self.cursor.bump();
        }

        let span = Span::from(m..self.cursor.pos());
        Markup::Comment {
            span,
            wc: (Whitespace::Default, Whitespace::Default),
            hashes,
            text: &self.source[text_start..self.cursor.pos()],
        }
    }

    /// A tag shaped statement inside a `liquid` tag: a name followed by an
    /// optional expression that may not straddle newlines.
    fn line_statement(&mut self) -> Result<Markup<'source>> {
        let name_span = match scan::scan_name(&mut self.cursor, false) {
            Some(span) => span,
            None => {
                let n = self.cursor.pos();
                return Err(Error::syntax("expected a tag name", self.source, n..n + 1));
            }
        };

        let mut expr = ExprScanner::new(self.source, self.cursor.pos(), true);
        let expression = expr.scan_line()?;
        self.cursor.set_pos(expr.pos());

        let end = expression
            .last()
            .map(|token| token.span().n)
            .unwrap_or(name_span.n);
        Ok(Markup::Tag {
            span: Span::from(name_span.m..end),
            wc: (Whitespace::Default, Whitespace::Default),
            name: &self.source[name_span],
            expression,
        })
    }

    /// A `{# ... #}` comment. The closing fence must carry the same number
    /// of hashes as the opening fence; shorter or longer runs inside the
    /// body are text.
    fn comment(&mut self) -> Result<Markup<'source>> {
        let m = self.cursor.pos();
        self.cursor.eat('{');
        let hashes_span = self.cursor.eat_while(|c| c == '#');
        let hashes = &self.source[hashes_span];
        let wc_left = eat_marker(&mut self.cursor);
        let body_start = self.cursor.pos();

        let needle = format!("{hashes}}}");
        let i = match self.cursor.find(&needle) {
            Some(i) => i,
            None => {
                return Err(Error::syntax(
                    "unterminated comment",
                    self.source,
                    m..body_start,
                ));
            }
        };

        // A whitespace control marker directly before the closing fence
        // belongs to the fence, not the body.
        let (text_end, wc_right) = match self.source.as_bytes().get(i.wrapping_sub(1)) {
            Some(c @ (b'+' | b'-' | b'~')) if i > body_start => {
                (i - 1, Whitespace::from_marker(Some(*c as char)))
            }
            _ => (i, Whitespace::Default),
        };

        self.cursor.set_pos(i + needle.len());
        Ok(Markup::Comment {
            span: Span::from(m..self.cursor.pos()),
            wc: (wc_left, wc_right),
            hashes,
            text: &self.source[body_start..text_end],
        })
    }

    fn skip_space(&mut self) {
        self.cursor.eat_while(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));
    }
}

/// Consumes a whitespace control marker if one is next.
fn eat_marker(cursor: &mut Cursor<'_>) -> Whitespace {
    for c in ['+', '-', '~'] {
        if cursor.eat(c) {
            return Whitespace::from_marker(Some(c));
        }
    }
    Whitespace::Default
}

/// Consumes an optional whitespace control marker followed by the closing
/// delimiter, returning the marker.
fn eat_close(cursor: &mut Cursor<'_>, close: &str) -> Option<Whitespace> {
    if cursor.eat_str(close) {
        return Some(Whitespace::Default);
    }
    let mut lookahead = cursor.clone();
    match lookahead.peek() {
        Some(c @ ('+' | '-' | '~')) => {
            lookahead.bump();
            if lookahead.eat_str(close) {
                cursor.set_pos(lookahead.pos());
                Some(Whitespace::from_marker(Some(c)))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Returns `true` if the cursor is at an optional whitespace control marker
/// followed by the closing delimiter.
fn at_close(cursor: &Cursor<'_>, close: &str) -> bool {
    let mut lookahead = cursor.clone();
    eat_close(&mut lookahead, close).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn scan(source: &str) -> Vec<Markup<'_>> {
        tokenize(source).unwrap()
    }

    #[track_caller]
    fn scan_err(source: &str) -> Error {
        tokenize(source).unwrap_err()
    }

    #[test]
    fn scan_empty() {
        assert_eq!(scan(""), [Markup::Eoi]);
    }

    #[test]
    fn scan_content_only() {
        assert_eq!(
            scan("lorem ipsum"),
            [
                Markup::Content {
                    span: Span::from(0..11),
                    text: "lorem ipsum",
                },
                Markup::Eoi,
            ]
        );
    }

    #[test]
    fn scan_content_with_lone_braces() {
        assert_eq!(
            scan("a { b } c"),
            [
                Markup::Content {
                    span: Span::from(0..9),
                    text: "a { b } c",
                },
                Markup::Eoi,
            ]
        );
    }

    #[test]
    fn scan_output() {
        let nodes = scan("Hello, {{ you }}!");
        assert_eq!(nodes.len(), 4);
        assert_eq!(
            nodes[0],
            Markup::Content {
                span: Span::from(0..7),
                text: "Hello, ",
            }
        );
        let Markup::Output {
            span,
            wc,
            expression,
        } = &nodes[1]
        else {
            panic!("expected an output statement");
        };
        assert_eq!(*span, Span::from(7..16));
        assert_eq!(*wc, (Whitespace::Default, Whitespace::Default));
        assert_eq!(expression.len(), 1);
        assert_eq!(
            nodes[2],
            Markup::Content {
                span: Span::from(16..17),
                text: "!",
            }
        );
    }

    #[test]
    fn scan_output_whitespace_control() {
        let nodes = scan("{{- you ~}}");
        let Markup::Output { wc, .. } = &nodes[0] else {
            panic!("expected an output statement");
        };
        assert_eq!(*wc, (Whitespace::Minus, Whitespace::Smart));
    }

    #[test]
    fn scan_tag() {
        let nodes = scan("{% if a contains 5 %}x{% endif %}");
        let Markup::Tag {
            name, expression, ..
        } = &nodes[0]
        else {
            panic!("expected a tag");
        };
        assert_eq!(*name, "if");
        assert_eq!(expression.len(), 3);

        let Markup::Tag {
            name, expression, ..
        } = &nodes[2]
        else {
            panic!("expected a tag");
        };
        assert_eq!(*name, "endif");
        assert!(expression.is_empty());
    }

    #[test]
    fn scan_tag_whitespace_control() {
        let nodes = scan("{%~ assign x = 1 -%}");
        let Markup::Tag { name, wc, .. } = &nodes[0] else {
            panic!("expected a tag");
        };
        assert_eq!(*name, "assign");
        assert_eq!(*wc, (Whitespace::Smart, Whitespace::Minus));
    }

    #[test]
    fn scan_raw() {
        let nodes = scan("{% raw %}{{ x }}{% endraw %}");
        assert_eq!(
            nodes[0],
            Markup::Raw {
                span: Span::from(0..28),
                wc: (
                    Whitespace::Default,
                    Whitespace::Default,
                    Whitespace::Default,
                    Whitespace::Default,
                ),
                text: "{{ x }}",
            }
        );
    }

    #[test]
    fn scan_raw_whitespace_control() {
        let nodes = scan("{%- raw +%}body{%~ endraw -%}");
        let Markup::Raw { wc, text, .. } = &nodes[0] else {
            panic!("expected a raw block");
        };
        assert_eq!(
            *wc,
            (
                Whitespace::Minus,
                Whitespace::Plus,
                Whitespace::Smart,
                Whitespace::Minus,
            )
        );
        assert_eq!(*text, "body");
    }

    #[test]
    fn scan_raw_ignores_inner_tags() {
        let nodes = scan("{% raw %}{% if x %}{% endraw %}");
        let Markup::Raw { text, .. } = &nodes[0] else {
            panic!("expected a raw block");
        };
        assert_eq!(*text, "{% if x %}");
    }

    #[test]
    fn scan_raw_unterminated() {
        let err = scan_err("{% raw %}{{ x }}");
        assert_eq!(err.message(), "unterminated raw tag");
    }

    #[test]
    fn scan_comment() {
        assert_eq!(
            scan("{# a comment #}"),
            [
                Markup::Comment {
                    span: Span::from(0..15),
                    wc: (Whitespace::Default, Whitespace::Default),
                    hashes: "#",
                    text: " a comment ",
                },
                Markup::Eoi,
            ]
        );
    }

    #[test]
    fn scan_comment_whitespace_control() {
        let nodes = scan("{#- a comment +#}");
        let Markup::Comment { wc, text, .. } = &nodes[0] else {
            panic!("expected a comment");
        };
        assert_eq!(*wc, (Whitespace::Minus, Whitespace::Plus));
        assert_eq!(*text, " a comment ");
    }

    #[test]
    fn scan_comment_fence_matching() {
        // With a `##` fence an inner `#}` does not close the comment.
        let nodes = scan("{## a #} b ##}");
        assert_eq!(
            nodes[0],
            Markup::Comment {
                span: Span::from(0..14),
                wc: (Whitespace::Default, Whitespace::Default),
                hashes: "##",
                text: " a #} b ",
            }
        );
    }

    #[test]
    fn scan_comment_same_fence_closes() {
        // With a `#` fence the first `#}` closes, nested or not.
        let nodes = scan("{# a {# nested #} b #}");
        let Markup::Comment { span, text, .. } = &nodes[0] else {
            panic!("expected a comment");
        };
        assert_eq!(*text, " a {# nested ");
        assert_eq!(*span, Span::from(0..17));
    }

    #[test]
    fn scan_comment_unterminated() {
        let err = scan_err("{## a #}");
        assert_eq!(err.message(), "unterminated comment");
    }

    #[test]
    fn scan_liquid_tag() {
        let nodes = scan("{% liquid\n assign x = 1 \n echo x %}");
        let Markup::Lines {
            span,
            wc,
            statements,
        } = &nodes[0]
        else {
            panic!("expected a liquid tag");
        };
        assert_eq!(*span, Span::from(0..35));
        assert_eq!(*wc, (Whitespace::Default, Whitespace::Default));
        assert_eq!(statements.len(), 2);

        let Markup::Tag {
            name, expression, ..
        } = &statements[0]
        else {
            panic!("expected a tag statement");
        };
        assert_eq!(*name, "assign");
        assert_eq!(expression.len(), 3);

        let Markup::Tag {
            name, expression, ..
        } = &statements[1]
        else {
            panic!("expected a tag statement");
        };
        assert_eq!(*name, "echo");
        assert_eq!(expression.len(), 1);
    }

    #[test]
    fn scan_liquid_tag_line_comment() {
        let nodes = scan("{% liquid\n # note\n echo x\n%}");
        let Markup::Lines { statements, .. } = &nodes[0] else {
            panic!("expected a liquid tag");
        };
        assert_eq!(statements.len(), 2);
        let Markup::Comment { hashes, text, .. } = &statements[0] else {
            panic!("expected a comment statement");
        };
        assert_eq!(*hashes, "#");
        assert_eq!(*text, " note");
    }

    #[test]
    fn scan_liquid_tag_empty() {
        let nodes = scan("{% liquid %}");
        let Markup::Lines { statements, .. } = &nodes[0] else {
            panic!("expected a liquid tag");
        };
        assert!(statements.is_empty());
    }

    #[test]
    fn scan_liquid_tag_unterminated() {
        let err = scan_err("{% liquid\n echo x");
        assert_eq!(err.message(), "unterminated liquid tag");
    }

    #[test]
    fn scan_output_unterminated() {
        let err = scan_err("lorem {{ ipsum");
        assert_eq!(err.message(), "unterminated output statement");
    }

    #[test]
    fn scan_tag_unterminated() {
        let err = scan_err("lorem {% if x");
        assert_eq!(err.message(), "unterminated tag");
    }

    #[test]
    fn scan_tag_missing_name() {
        let err = scan_err("{% %}");
        assert_eq!(err.message(), "expected a tag name");
    }

    #[test]
    fn scan_output_ends_at_first_real_close() {
        let nodes = scan("{{ '}}' }}");
        let Markup::Output {
            span, expression, ..
        } = &nodes[0]
        else {
            panic!("expected an output statement");
        };
        assert_eq!(*span, Span::from(0..10));
        assert_eq!(expression.len(), 1);
    }

    #[test]
    fn scan_spans_cover_source() {
        let source = "a{{ b }}c{% if d %}e{# f #}g";
        let nodes = scan(source);
        let mut end = 0;
        for node in &nodes {
            if let Some(span) = node.span() {
                assert_eq!(span.m, end);
                end = span.n;
            }
        }
        assert_eq!(end, source.len());
    }
}
