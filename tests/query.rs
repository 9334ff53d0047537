use brine::{ComparisonOperator, FilterExpression, Segment, Selector};
use rstest::rstest;

#[rstest]
#[case::root_only("$", "$")]
#[case::shorthand("$.a.b", "$['a']['b']")]
#[case::implicit_root("a.b", "$['a']['b']")]
#[case::negative_index("$.a.b[-1]", "$['a']['b'][-1]")]
#[case::quoted_name("$['a b']", "$['a b']")]
#[case::double_quoted_name("$[\"a b\"]", "$['a b']")]
#[case::wildcard("$.*", "$[*]")]
#[case::recursive_wild("$..*", "$..[*]")]
#[case::recursive_name("$..things", "$..['things']")]
#[case::slice("$[0:10:2]", "$[0:10:2]")]
#[case::slice_open("$[:]", "$[::]")]
#[case::multiple_selectors("$[0, 'a', *]", "$[0, 'a', *]")]
#[case::hyphenated("page.main-nav", "$['page']['main-nav']")]
#[case::unicode_shorthand("$.résumé", "$['résumé']")]
fn parse_query_canonical(#[case] path: &str, #[case] canonical: &str) {
    let query = brine::parse_query(path).unwrap();
    assert_eq!(query.to_string(), canonical);
}

#[test]
fn parse_query_negative_index() {
    let query = brine::parse_query("$.a.b[-1]").unwrap();
    let Segment::Child { selectors, .. } = &query.segments[2] else {
        panic!("expected a child segment");
    };
    assert!(matches!(selectors[..], [Selector::Index { index: -1, .. }]));
}

#[test]
fn parse_query_recursive_descent() {
    let query = brine::parse_query("$..*").unwrap();
    let [Segment::Recursive { selectors, .. }] = &query.segments[..] else {
        panic!("expected a recursive segment");
    };
    assert!(matches!(selectors[..], [Selector::Wild { .. }]));
}

#[test]
fn parse_query_filter_comparison() {
    let query = brine::parse_query("$[?@.x == 1]").unwrap();
    let [Segment::Child { selectors, .. }] = &query.segments[..] else {
        panic!("expected a child segment");
    };
    let [Selector::Filter { expression, .. }] = &selectors[..] else {
        panic!("expected a filter selector");
    };
    let FilterExpression::Comparison {
        left,
        operator,
        right,
        ..
    } = &**expression
    else {
        panic!("expected a comparison");
    };
    assert_eq!(*operator, ComparisonOperator::Eq);
    let FilterExpression::RelativeQuery { query, .. } = &**left else {
        panic!("expected a relative query");
    };
    assert_eq!(query.to_string(), "$['x']");
    assert!(matches!(**right, FilterExpression::Int { value: 1, .. }));
}

#[test]
fn parse_query_slice_bounds() {
    let query = brine::parse_query("$[0:10:2]").unwrap();
    let [Segment::Child { selectors, .. }] = &query.segments[..] else {
        panic!("expected a child segment");
    };
    assert!(matches!(
        selectors[..],
        [Selector::Slice {
            start: Some(0),
            stop: Some(10),
            step: Some(2),
            ..
        }]
    ));
}

#[test]
fn parse_query_slice_absent_bounds_stay_absent() {
    let query = brine::parse_query("$[1:]").unwrap();
    let [Segment::Child { selectors, .. }] = &query.segments[..] else {
        panic!("expected a child segment");
    };
    assert!(matches!(
        selectors[..],
        [Selector::Slice {
            start: Some(1),
            stop: None,
            step: None,
            ..
        }]
    ));
}

#[test]
fn parse_query_slice_step_zero() {
    let err = brine::parse_query("$[::0]").unwrap_err();
    assert_eq!(err.message(), "slice step can't be zero");
}

#[test]
fn parse_query_filter_allows_non_singular_test() {
    // The singular restriction only applies where a single value is
    // required: comparison operands and singular query selectors.
    brine::parse_query("$[?@.x]").unwrap();
    brine::parse_query("$[?@..x]").unwrap();

    let err = brine::parse_query("$[?@..x < 1]").unwrap_err();
    assert_eq!(err.message(), "non-singular query is not comparable");
}

#[test]
fn parse_query_singular_selector_shape() {
    let query = brine::parse_query("a[b.c]").unwrap();
    let Segment::Child { selectors, .. } = &query.segments[1] else {
        panic!("expected a child segment");
    };
    let [Selector::SingularQuery { query, .. }] = &selectors[..] else {
        panic!("expected a singular query selector");
    };
    // Only name and index child segments may appear in a singular query.
    for segment in &query.segments {
        let Segment::Child { selectors, .. } = segment else {
            panic!("expected a child segment");
        };
        assert_eq!(selectors.len(), 1);
        assert!(matches!(
            selectors[0],
            Selector::Name { .. } | Selector::Index { .. }
        ));
    }
}

#[test]
fn parse_query_singular_selector_rejects_wildcards() {
    let err = brine::parse_query("a[b.*]").unwrap_err();
    assert_eq!(err.message(), "non-singular query in singular context");
}

#[test]
fn parse_query_trailing_input() {
    let err = brine::parse_query("$.a b").unwrap_err();
    assert_eq!(err.message(), "expected end of query");
}

#[test]
fn parse_query_error_rendering() {
    let err = brine::parse_query("$[?(@.a || @.b]").unwrap_err();
    assert_eq!(
        err.to_string(),
        "syntax error: unbalanced parentheses\n\
         1 | $[?(@.a || @.b]\n  \
         |    ^"
    );
}

#[test]
fn parse_jsonpath_query_is_strict() {
    brine::parse_jsonpath_query("$.a.b[0]").unwrap();
    brine::parse_jsonpath_query("$[?@.x == 1]").unwrap();

    // No implicit root.
    let err = brine::parse_jsonpath_query("a.b").unwrap_err();
    assert_eq!(err.message(), "expected `$`");

    // No singular query selectors.
    let err = brine::parse_jsonpath_query("$[a.b]").unwrap_err();
    assert_eq!(err.message(), "expected a selector");

    // Hyphens end a shorthand name.
    let err = brine::parse_jsonpath_query("$.a-b").unwrap_err();
    assert_eq!(err.message(), "expected end of query");
}

#[test]
fn parse_query_functions_are_unresolved() {
    // Unknown function names are not a parse error; resolution is deferred.
    let query = brine::parse_query("$[?unknown(@.x) == 1]").unwrap();
    let [Segment::Child { selectors, .. }] = &query.segments[..] else {
        panic!("expected a child segment");
    };
    let [Selector::Filter { expression, .. }] = &selectors[..] else {
        panic!("expected a filter selector");
    };
    let FilterExpression::Comparison { left, .. } = &**expression else {
        panic!("expected a comparison");
    };
    let FilterExpression::Function { name, args, .. } = &**left else {
        panic!("expected a function call");
    };
    assert_eq!(name, "unknown");
    assert_eq!(args.len(), 1);
}

#[test]
fn parse_query_spans_nest() {
    let query = brine::parse_query("$.a[?@.b == 'c']").unwrap();
    for segment in &query.segments {
        let (span, selectors) = match segment {
            Segment::Child { span, selectors } => (span, selectors),
            Segment::Recursive { span, selectors } => (span, selectors),
        };
        for selector in selectors {
            let inner = selector.span();
            assert!(span.m <= inner.m && inner.n <= span.n);
        }
    }
}

#[test]
fn parse_query_serializes_to_json() {
    let query = brine::parse_query("$.a[0]").unwrap();
    let value = serde_json::to_value(&query).unwrap();
    assert_eq!(value["segments"][0]["Child"]["selectors"][0]["Name"]["name"], "a");
}

#[test]
fn dump_query_renders_a_tree() {
    let out = brine::dump_query("$.a[0]");
    assert!(out.starts_with("query $['a'][0]\n"));
    assert!(out.contains("index"));
}
