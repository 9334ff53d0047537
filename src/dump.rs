//! Renders parse results as human readable trees.
//!
//! The format is advisory and intended for debugging the front-end in
//! isolation; it is not part of the stable contract.

use std::fmt::Write;

use crate::types::markup::{ExpressionToken, Markup, RangeArgument};
use crate::types::query::{Query, Segment, Selector};

pub(crate) fn dump(source: &str) -> String {
    match crate::tokenize(source) {
        Ok(nodes) => {
            let mut out = String::from("template\n");
            for node in &nodes {
                write_markup(&mut out, node, 1);
            }
            out
        }
        Err(err) => err.to_string(),
    }
}

pub(crate) fn dump_query(path: &str) -> String {
    match crate::parse_query(path) {
        Ok(query) => {
            let mut out = String::new();
            write_query(&mut out, &query, 0);
            out
        }
        Err(err) => err.to_string(),
    }
}

fn line(out: &mut String, depth: usize, args: std::fmt::Arguments<'_>) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.write_fmt(args).expect("writing to a string");
    out.push('\n');
}

fn write_markup(out: &mut String, node: &Markup<'_>, depth: usize) {
    match node {
        Markup::Content { span, .. } => line(out, depth, format_args!("content {span:?}")),
        Markup::Raw { span, .. } => line(out, depth, format_args!("raw {span:?}")),
        Markup::Comment { span, hashes, .. } => {
            line(out, depth, format_args!("comment {span:?} fence=`{hashes}`"));
        }
        Markup::Output {
            span, expression, ..
        } => {
            line(out, depth, format_args!("output {span:?}"));
            for token in expression {
                write_token(out, token, depth + 1);
            }
        }
        Markup::Tag {
            span,
            name,
            expression,
            ..
        } => {
            line(out, depth, format_args!("tag {span:?} `{name}`"));
            for token in expression {
                write_token(out, token, depth + 1);
            }
        }
        Markup::Lines {
            span, statements, ..
        } => {
            line(out, depth, format_args!("liquid {span:?}"));
            for statement in statements {
                write_markup(out, statement, depth + 1);
            }
        }
        Markup::Eoi => line(out, depth, format_args!("eoi")),
    }
}

fn write_token(out: &mut String, token: &ExpressionToken<'_>, depth: usize) {
    let span = token.span();
    match token {
        ExpressionToken::StringLiteral { value, .. } => {
            line(out, depth, format_args!("string {span:?} '{value}'"));
        }
        ExpressionToken::IntegerLiteral { value, .. } => {
            line(out, depth, format_args!("integer {span:?} {value}"));
        }
        ExpressionToken::FloatLiteral { value, .. } => {
            line(out, depth, format_args!("float {span:?} {value}"));
        }
        ExpressionToken::Word { value, .. } => {
            line(out, depth, format_args!("word {span:?} `{value}`"));
        }
        ExpressionToken::Query { path, .. } => {
            line(out, depth, format_args!("query {span:?} {path}"));
        }
        ExpressionToken::RangeLiteral { start, stop, .. } => {
            line(out, depth, format_args!("range {span:?}"));
            write_range_argument(out, start, depth + 1);
            write_range_argument(out, stop, depth + 1);
        }
        token => line(out, depth, format_args!("{} {span:?}", token.human())),
    }
}

fn write_range_argument(out: &mut String, argument: &RangeArgument, depth: usize) {
    match argument {
        RangeArgument::StringLiteral { span, value } => {
            line(out, depth, format_args!("string {span:?} '{value}'"));
        }
        RangeArgument::IntegerLiteral { span, value } => {
            line(out, depth, format_args!("integer {span:?} {value}"));
        }
        RangeArgument::FloatLiteral { span, value } => {
            line(out, depth, format_args!("float {span:?} {value}"));
        }
        RangeArgument::Query { span, path } => {
            line(out, depth, format_args!("query {span:?} {path}"));
        }
    }
}

fn write_query(out: &mut String, query: &Query, depth: usize) {
    line(out, depth, format_args!("query {query}"));
    for segment in &query.segments {
        write_segment(out, segment, depth + 1);
    }
}

fn write_segment(out: &mut String, segment: &Segment, depth: usize) {
    let span = segment.span();
    let (kind, selectors) = match segment {
        Segment::Child { selectors, .. } => ("child", selectors),
        Segment::Recursive { selectors, .. } => ("recursive", selectors),
    };
    line(out, depth, format_args!("{kind} {span:?}"));
    for selector in selectors {
        write_selector(out, selector, depth + 1);
    }
}

fn write_selector(out: &mut String, selector: &Selector, depth: usize) {
    let span = selector.span();
    match selector {
        Selector::Name { name, .. } => {
            line(out, depth, format_args!("name {span:?} '{name}'"));
        }
        Selector::Index { index, .. } => {
            line(out, depth, format_args!("index {span:?} {index}"));
        }
        Selector::Slice {
            start, stop, step, ..
        } => {
            line(
                out,
                depth,
                format_args!(
                    "slice {span:?} {}:{}:{}",
                    DisplayOption(start),
                    DisplayOption(stop),
                    DisplayOption(step)
                ),
            );
        }
        Selector::Wild { .. } => line(out, depth, format_args!("wild {span:?}")),
        Selector::Filter { expression, .. } => {
            line(out, depth, format_args!("filter {span:?} {expression}"));
        }
        Selector::SingularQuery { query, .. } => {
            line(out, depth, format_args!("singular {span:?} {query}"));
        }
    }
}

struct DisplayOption<'a>(&'a Option<i64>);

impl std::fmt::Display for DisplayOption<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{value}"),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_template() {
        let out = dump("a{{ 'b' }}{% if c %}");
        assert_eq!(
            out,
            "template\n  \
               content 0..1\n  \
               output 1..10\n    \
               string 5..6 'b'\n  \
               tag 10..20 `if`\n    \
               word 16..17 `c`\n  \
               eoi\n"
        );
    }

    #[test]
    fn dump_template_error() {
        let out = dump("{{ a");
        assert!(out.contains("unterminated output statement"));
    }

    #[test]
    fn dump_query_tree() {
        let out = dump_query("$.a[0]");
        assert_eq!(
            out,
            "query $['a'][0]\n  \
               child 1..3\n    \
               name 2..3 'a'\n  \
               child 3..6\n    \
               index 4..5 0\n"
        );
    }

    #[test]
    fn dump_query_error() {
        let out = dump_query("$[");
        assert!(out.contains("unterminated bracketed selection"));
    }
}
