// tests/parser_tests.rs

use fortran_fragments::{parse, parse_with, skip_noise, ErrorKind, Match, ParseOptions, RuleName};
use rstest::rstest;

const CONTINUED_CALL: &str = "call sub( array(1:2), sin(1.234_prec), & ! note\n    & (/ 1.23, 3.45, 6.78 /), \"Hello World!\" )";

/// Descend through the single-child wrappers down to the first node of `rule`.
fn descend<'a, 'i>(m: &'a Match<'i>, rule: RuleName) -> &'a Match<'i> {
    m.find(rule)
        .unwrap_or_else(|| panic!("no {rule} below:\n{m}"))
}

fn texts<'i>(nodes: &[&Match<'i>]) -> Vec<&'i str> {
    nodes.iter().map(|m| m.as_str()).collect()
}

// ---
// Subroutine calls
// ---

#[test]
fn test_continued_call_with_comment() {
    let call = parse(CONTINUED_CALL, RuleName::SubroutineCall).expect("call should parse");
    assert_eq!(call.as_str(), CONTINUED_CALL);
    assert_eq!(call.child(RuleName::Name).unwrap().as_str(), "sub");

    let args: Vec<_> = call
        .child(RuleName::Arguments)
        .unwrap()
        .children_named(RuleName::Argument)
        .collect();
    assert_eq!(args.len(), 4);

    // array(1:2)
    let indexed = descend(args[0], RuleName::IndexedArray);
    assert_eq!(indexed.as_str(), "array(1:2)");
    assert!(args[0].find(RuleName::FunctionCall).is_none());
    let region = descend(indexed, RuleName::ArrayIndexRegion);
    assert_eq!(region.as_str(), "1:2");
    assert_eq!(region.child(RuleName::LowerBound).unwrap().as_str(), "1");
    assert_eq!(region.child(RuleName::UpperBound).unwrap().as_str(), "2");

    // sin(1.234_prec)
    let function = descend(args[1], RuleName::FunctionCall);
    assert_eq!(function.child(RuleName::Name).unwrap().as_str(), "sin");
    let inner: Vec<_> = function.find_all(RuleName::Argument);
    assert_eq!(texts(&inner), vec!["1.234_prec"]);
    let float = descend(function, RuleName::Float);
    assert_eq!(float.as_str(), "1.234_prec");
    let precision = float.child(RuleName::PrecisionSpec).unwrap();
    assert_eq!(precision.child(RuleName::Name).unwrap().as_str(), "prec");

    // (/ 1.23, 3.45, 6.78 /)
    let array = descend(args[2], RuleName::InPlaceArray);
    let numbers = array.child(RuleName::Numbers).expect("numeric list");
    let items: Vec<_> = numbers.children_named(RuleName::Number).collect();
    assert_eq!(texts(&items), vec!["1.23", "3.45", "6.78"]);

    // "Hello World!"
    let string = descend(args[3], RuleName::String);
    assert_eq!(string.as_str(), "\"Hello World!\"");
}

#[rstest]
#[case("call foo", "foo")]
#[case("CALL Foo()", "Foo")]
#[case("Call do_it ( x )", "do_it")]
#[case("call  log_message('x') ! trailing", "log_message")]
fn test_subroutine_call_names(#[case] input: &str, #[case] name: &str) {
    let call = parse(input, RuleName::SubroutineCall).unwrap();
    assert_eq!(call.child(RuleName::Name).unwrap().as_str(), name);
}

#[test]
fn test_call_keyword_needs_word_boundary() {
    let err = parse("callfoo(1)", RuleName::SubroutineCall).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Mismatch { .. }));
}

#[test]
fn test_call_without_arguments_has_no_arguments_node() {
    let call = parse("call flush()", RuleName::SubroutineCall).unwrap();
    assert!(call.child(RuleName::Arguments).is_none());
    assert_eq!(call.as_str(), "call flush()");
}

// ---
// Expressions
// ---

#[test]
fn test_nested_function_calls() {
    let m = parse("f(g(h(1)))", RuleName::ValueReturningCode).unwrap();
    let calls = m.find_all(RuleName::FunctionCall);
    assert_eq!(texts(&calls), vec!["f(g(h(1)))", "g(h(1))", "h(1)"]);

    let shallow = parse("f(1)", RuleName::ValueReturningCode).unwrap();
    let extra_levels = m.depth() - shallow.depth();
    // each extra call adds function-call, arguments, argument, value-returning-code
    assert_eq!(extra_levels, 8);
}

#[test]
fn test_deep_nesting_parses() {
    let depth = 40;
    let input = format!("{}x{}", "f(".repeat(depth), ")".repeat(depth));
    let m = parse(&input, RuleName::ValueReturningCode).unwrap();
    assert_eq!(m.as_str(), input);
    assert_eq!(m.find_all(RuleName::FunctionCall).len(), depth);
}

#[test]
fn test_indexed_array_falls_back_from_function_call() {
    let m = parse("a(:, 2, n)", RuleName::ValueReturningCode).unwrap();
    assert!(m.find(RuleName::FunctionCall).is_none());
    let indexed = descend(&m, RuleName::IndexedArray);
    let indices: Vec<_> = indexed.children_named(RuleName::ArrayIndex).collect();
    assert_eq!(texts(&indices), vec![":", "2", "n"]);
}

#[test]
fn test_bare_slice_has_no_bounds() {
    let region = parse(":", RuleName::ArrayIndexRegion).unwrap();
    assert_eq!(region.as_str(), ":");
    assert!(region.child(RuleName::LowerBound).is_none());
    assert!(region.child(RuleName::UpperBound).is_none());
}

#[rstest]
#[case("3:", true, false)]
#[case(":n", false, true)]
#[case("i : j", true, true)]
fn test_half_open_slices(#[case] input: &str, #[case] lower: bool, #[case] upper: bool) {
    let region = parse(input, RuleName::ArrayIndexRegion).unwrap();
    assert_eq!(region.as_str(), input);
    assert_eq!(region.child(RuleName::LowerBound).is_some(), lower);
    assert_eq!(region.child(RuleName::UpperBound).is_some(), upper);
}

#[test]
fn test_boolean_with_prefix() {
    let m = parse(".not. .true.", RuleName::Boolean).unwrap();
    let prefix = m.child(RuleName::LogicalPrefixOperator).expect("prefix present");
    assert!(prefix.child(RuleName::LogicalNot).is_some());
    assert_eq!(m.child(RuleName::BooleanValue).unwrap().as_str(), ".true.");
}

#[rstest]
#[case(".TRUE.")]
#[case(".False.")]
fn test_boolean_is_case_insensitive(#[case] input: &str) {
    let m = parse(input, RuleName::Boolean).unwrap();
    assert!(m.child(RuleName::LogicalPrefixOperator).is_none());
    assert_eq!(m.as_str(), input);
}

#[rstest]
#[case("42", RuleName::Integer)]
#[case("-7_int64", RuleName::Integer)]
#[case("+0.5", RuleName::Float)]
#[case("1.0_8", RuleName::Float)]
fn test_number_forms(#[case] input: &str, #[case] kind: RuleName) {
    let m = parse(input, RuleName::Number).unwrap();
    assert_eq!(m.as_str(), input);
    assert!(m.child(kind).is_some(), "{m}");
}

#[test]
fn test_float_is_tried_before_integer() {
    let m = parse("3.25", RuleName::Number).unwrap();
    assert!(m.child(RuleName::Integer).is_none());
    assert_eq!(m.child(RuleName::Float).unwrap().as_str(), "3.25");
}

#[rstest]
#[case("\"it's\"")]
#[case("'say \"hi\"'")]
#[case("''")]
fn test_strings(#[case] input: &str) {
    let m = parse(input, RuleName::String).unwrap();
    assert_eq!(m.as_str(), input);
}

#[rstest]
#[case("(/ .true., .false. /)", RuleName::Booleans)]
#[case("(/ 'a', \"b\" /)", RuleName::Strings)]
#[case("(/1, -2, 3.5/)", RuleName::Numbers)]
fn test_in_place_array_kinds(#[case] input: &str, #[case] kind: RuleName) {
    let m = parse(input, RuleName::InPlaceArray).unwrap();
    assert!(m.child(kind).is_some());
}

#[test]
fn test_mixed_in_place_array_is_rejected() {
    assert!(parse("(/ 1, 'a' /)", RuleName::InPlaceArray).is_err());
}

// ---
// Operators and chains
// ---

#[test]
fn test_power_is_not_two_multiplications() {
    let m = parse("a ** b", RuleName::ArithmeticStatement).unwrap();
    let ops = m.find_all(RuleName::ArithmeticOperator);
    assert_eq!(ops.len(), 1);
    assert!(ops[0].child(RuleName::Power).is_some());
    assert!(m.find(RuleName::Multiplication).is_none());
}

#[test]
fn test_arithmetic_chain_is_flat() {
    let m = parse("a + b * c - 2", RuleName::ArithmeticStatement).unwrap();
    let operands: Vec<_> = m.children_named(RuleName::ValueReturningCode).collect();
    assert_eq!(texts(&operands), vec!["a", "b", "c", "2"]);
    let ops: Vec<_> = m
        .children_named(RuleName::ArithmeticOperator)
        .map(|op| op.children()[0].rule())
        .collect();
    assert_eq!(
        ops,
        vec![RuleName::Addition, RuleName::Multiplication, RuleName::Subtraction]
    );
}

#[rstest]
#[case("a == b", RuleName::Equality)]
#[case("a .EQ. b", RuleName::Equality)]
#[case("a /= b", RuleName::Inequality)]
#[case("a.ne.b", RuleName::Inequality)]
#[case("a < b", RuleName::Less)]
#[case("a .lt. b", RuleName::Less)]
#[case("a > b", RuleName::Greater)]
#[case("a .gt. b", RuleName::Greater)]
#[case("a <= b", RuleName::LessEqual)]
#[case("a .Le. b", RuleName::LessEqual)]
#[case("a >= b", RuleName::GreaterEqual)]
#[case("a .ge. b", RuleName::GreaterEqual)]
fn test_relational_operators(#[case] input: &str, #[case] expected: RuleName) {
    let m = parse(input, RuleName::RelationalStatement).unwrap();
    assert_eq!(m.as_str(), input);
    let op = m.child(RuleName::RelationalOperator).unwrap();
    assert_eq!(op.children()[0].rule(), expected);
}

#[rstest]
#[case(".and.", RuleName::LogicalAnd)]
#[case(".OR.", RuleName::LogicalOr)]
#[case(".eqv.", RuleName::LogicalEqv)]
#[case(".neqv.", RuleName::LogicalNeqv)]
fn test_logical_operators(#[case] op: &str, #[case] expected: RuleName) {
    let input = format!("x > 1 {op} .not. .false.");
    let m = parse(&input, RuleName::LogicalStatement).unwrap();
    assert_eq!(m.as_str(), input);
    assert_eq!(m.children_named(RuleName::RelationalStatement).count(), 2);
    let op = m.child(RuleName::LogicalOperator).unwrap();
    assert_eq!(op.children()[0].rule(), expected);
}

// ---
// Assignment
// ---

#[test]
fn test_assignment_to_array_element() {
    let m = parse("grid(i, 2) = -offset", RuleName::Assignment).unwrap();
    let target = m.child(RuleName::AccessedVariable).unwrap();
    assert_eq!(target.as_str(), "grid(i, 2)");
    let value = m.child(RuleName::ValueReturningCode).unwrap();
    assert_eq!(value.as_str(), "-offset");
    assert!(value.find(RuleName::Sign).is_some());
}

#[test]
fn test_equality_is_not_assignment() {
    assert!(parse("a == b", RuleName::Assignment).is_err());
}

// ---
// Lexical noise and coverage
// ---

#[rstest]
#[case("call foo   ", RuleName::SubroutineCall, "call foo")]
#[case("call foo ! done", RuleName::SubroutineCall, "call foo")]
#[case("x = 1  \n", RuleName::Assignment, "x = 1")]
#[case("a + b ! sum", RuleName::ArithmeticStatement, "a + b")]
#[case("f(a, &\n  & b) rest", RuleName::FunctionCall, "f(a, &\n  & b)")]
#[case("1: ", RuleName::ArrayIndexRegion, "1:")]
fn test_root_span_excludes_trailing_noise(#[case] input: &str, #[case] rule: RuleName, #[case] covered: &str) {
    let m = parse(input, rule).unwrap();
    assert_eq!(m.span().start, 0);
    assert_eq!(m.as_str(), covered);
}

#[test]
fn test_children_are_ordered_and_contained() {
    fn check(m: &Match<'_>) {
        let mut last_end = m.span().start;
        for child in m.children() {
            assert!(m.span().contains(&child.span()), "{child} outside {m}");
            assert!(child.span().start >= last_end, "{child} overlaps a sibling");
            last_end = child.span().end;
            check(child);
        }
    }
    check(&parse(CONTINUED_CALL, RuleName::SubroutineCall).unwrap());
    check(&parse("x .lt. f(1, (/ 1, 2 /)) .and. .not. .true.", RuleName::LogicalStatement).unwrap());
}

#[rstest]
#[case("a  ! x")]
#[case("f( & ! c\n   & 1)")]
#[case("x &\n\n ! only comment\n & + y")]
fn test_skip_noise_is_idempotent(#[case] input: &str) {
    for pos in 0..=input.len() {
        let once = skip_noise(input, pos);
        assert_eq!(skip_noise(input, once), once);
    }
}

#[test]
fn test_comment_only_line_inside_continuation() {
    let input = "call f(a, &\n  ! explain b\n  & b)";
    let call = parse(input, RuleName::SubroutineCall).unwrap();
    assert_eq!(call.as_str(), input);
    assert_eq!(call.find_all(RuleName::Argument).len(), 2);
}

// ---
// Errors
// ---

#[test]
fn test_mismatch_reports_furthest_offset() {
    let err = parse("call 1", RuleName::SubroutineCall).unwrap_err();
    match err.kind {
        ErrorKind::Mismatch { rule, furthest, ref expected } => {
            assert_eq!(rule, RuleName::SubroutineCall);
            assert_eq!(furthest, 5);
            assert!(expected.contains(&RuleName::Name));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(err.offset(), 5);
}

#[test]
fn test_unclosed_call_fails_at_end() {
    let err = parse("f(1, ", RuleName::FunctionCall).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Mismatch { furthest: 5, .. }));
}

#[test]
fn test_incomplete_consumption_is_opt_in() {
    let input = "call sub(1, ";
    let m = parse(input, RuleName::SubroutineCall).unwrap();
    assert_eq!(m.as_str(), "call sub");

    let strict = ParseOptions::default().complete();
    let err = parse_with(input, RuleName::SubroutineCall, &strict).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Incomplete { consumed: 8, .. }));
}

#[test]
fn test_rule_names_parse_from_text() {
    let rule: RuleName = "subroutine-call".parse().unwrap();
    let m = parse("call x", rule).unwrap();
    assert_eq!(m.rule(), RuleName::SubroutineCall);
}

#[test]
fn test_match_serializes_as_labeled_tree() {
    let m = parse("f(1)", RuleName::FunctionCall).unwrap();
    let json = serde_json::to_value(&m).unwrap();
    assert_eq!(json["rule"], "function-call");
    assert_eq!(json["text"], "f(1)");
    assert_eq!(json["children"][0]["rule"], "name");
    assert_eq!(json["span"]["end"], 4);
}
