use std::fmt;

use unicode_width::UnicodeWidthStr;

use crate::types::span::{LineIndex, Span};

/// An error that can occur while scanning a template or parsing a query.
pub struct Error {
    kind: ErrorKind,
    msg: String,
    span: Option<(String, Span)>,
}

/// The category of an [`Error`].
///
/// The front-end only ever emits [`ErrorKind::Syntax`]; the remaining kinds
/// are reserved for downstream collaborators (expression resolution, filter
/// lookup, extension functions) that reuse this error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Type,
    Name,
    Extension,
}

impl Error {
    /// Construct an error of the given kind with a source span.
    ///
    /// The span is clamped to the source and snapped to character boundaries
    /// so that errors raised at the end of input, or next to a multibyte
    /// character, stay renderable.
    pub fn new(
        kind: ErrorKind,
        msg: impl Into<String>,
        source: &str,
        span: impl Into<Span>,
    ) -> Self {
        let span = span.into();
        let mut m = span.m.min(source.len());
        while !source.is_char_boundary(m) {
            m -= 1;
        }
        let mut n = span.n.min(source.len());
        while !source.is_char_boundary(n) {
            n += 1;
        }
        let span = Span { m: m.min(n), n };
        Self {
            kind,
            msg: msg.into(),
            span: Some((source.to_string(), span)),
        }
    }

    /// Construct a syntax error with a source span.
    pub fn syntax(msg: impl Into<String>, source: &str, span: impl Into<Span>) -> Self {
        Self::new(ErrorKind::Syntax, msg, source, span)
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message without source context.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the span of the offending source region, if captured.
    pub fn span(&self) -> Option<Span> {
        self.span.as_ref().map(|(_, span)| *span)
    }

    /// Renders the message followed by the offending line and a caret
    /// underline, e.g.
    ///
    /// ```text
    /// syntax error: unterminated output statement
    /// 1 | lorem {{ ipsum
    ///   |       ^^
    /// ```
    fn fmt_snippet(&self, f: &mut fmt::Formatter<'_>, source: &str, span: Span) -> fmt::Result {
        let (line, _) = LineIndex::new(source).position(span.m);

        // Slice out the line holding the start of the span. Offsets are
        // byte positions, so this stays exact for multibyte content; the
        // display width only matters for aligning the carets.
        let first = source[..span.m].rfind('\n').map_or(0, |i| i + 1);
        let last = source[span.m..]
            .find('\n')
            .map_or(source.len(), |i| span.m + i);
        let text = source[first..last].trim_end_matches('\r');

        let num = line.to_string();
        let indent = source[first..span.m].width();
        let carets = "^".repeat(source[span].width().max(1));

        writeln!(f, "{} error: {}", self.kind.human(), self.msg)?;
        writeln!(f, "{num} | {text}")?;
        write!(
            f,
            "{:gutter$} | {:indent$}{carets}",
            "",
            "",
            gutter = num.len(),
            indent = indent
        )
    }
}

impl std::error::Error for Error {}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some((source, span)) => self.fmt_snippet(f, source, *span),
            None => f
                .debug_struct("Error")
                .field("kind", &self.kind)
                .field("msg", &self.msg)
                .finish(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some((source, span)) => self.fmt_snippet(f, source, *span),
            None => write!(f, "{} error: {}", self.kind.human(), self.msg),
        }
    }
}

impl ErrorKind {
    fn human(&self) -> &'static str {
        match self {
            ErrorKind::Syntax => "syntax",
            ErrorKind::Type => "type",
            ErrorKind::Name => "name",
            ErrorKind::Extension => "extension",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_single_line() {
        let source = "lorem {{ ipsum";
        let err = Error::syntax("unterminated output statement", source, 6..8);
        assert_eq!(
            err.to_string(),
            "syntax error: unterminated output statement\n\
             1 | lorem {{ ipsum\n  \
             |       ^^"
        );
    }

    #[test]
    fn render_later_line() {
        let source = "a\nb\nlorem {{ ipsum";
        let err = Error::syntax("unterminated output statement", source, 10..12);
        assert_eq!(
            err.to_string(),
            "syntax error: unterminated output statement\n\
             3 | lorem {{ ipsum\n  \
             |       ^^"
        );
    }

    #[test]
    fn render_aligns_by_display_width() {
        // The kanji is three bytes but two columns wide.
        let source = "{{ 本 ^ }}";
        let err = Error::syntax("unexpected character", source, 7..8);
        assert_eq!(
            err.to_string(),
            "syntax error: unexpected character\n\
             1 | {{ 本 ^ }}\n  \
             |       ^"
        );
    }

    #[test]
    fn render_empty_span_at_eof() {
        let source = "lorem";
        let err = Error::syntax("unexpected end of input", source, 5..9);
        assert_eq!(
            err.to_string(),
            "syntax error: unexpected end of input\n\
             1 | lorem\n  \
             |      ^"
        );
    }

    #[test]
    fn render_without_span() {
        let err = Error {
            kind: ErrorKind::Name,
            msg: "unknown function `nope`".to_owned(),
            span: None,
        };
        assert_eq!(err.to_string(), "name error: unknown function `nope`");
    }
}
