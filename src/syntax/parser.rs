//! Fortran fragment parser.
//!
//! Runs the pest grammar from a chosen start rule and turns the resulting
//! pairs into a [`Match`] tree. The parser is purely syntactic and keeps no
//! state between calls.

use std::ops::Range;

use pest::error::{Error, ErrorVariant, InputLocation};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use tracing::{debug, trace};

use super::noise::{nesting_depth, skip_trailing, trim_trailing};
use super::{Match, RuleName, Span};
use crate::errors::{ErrorKind, ErrorReporting, ParseError, SourceContext};
use crate::options::ParseOptions;

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
pub(crate) struct FortranParser;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Match `start_rule` against a prefix of `input`, with default options.
pub fn parse(input: &str, start_rule: RuleName) -> Result<Match<'_>, ParseError> {
    parse_with(input, start_rule, &ParseOptions::default())
}

/// Match `start_rule` against a prefix of `input`.
///
/// The match starts at offset 0 and covers as much as the rule consumes;
/// trailing noise is not part of it. With
/// [`ParseOptions::require_complete`] anything other than noise and line
/// breaks after the match is an error.
///
/// Noise is skipped between tokens only. Leading blanks or comments at
/// offset 0 are not skipped, so `"  call foo"` is a mismatch at 0; call
/// [`skip_noise`](super::skip_noise) first to find the statement start.
pub fn parse_with<'i>(
    input: &'i str,
    start_rule: RuleName,
    options: &ParseOptions,
) -> Result<Match<'i>, ParseError> {
    parse_range(input, 0..input.len(), start_rule, options)
}

/// Parse inside `range` of `input`; spans in the result stay absolute.
pub(crate) fn parse_range<'i>(
    input: &'i str,
    range: Range<usize>,
    start_rule: RuleName,
    options: &ParseOptions,
) -> Result<Match<'i>, ParseError> {
    // built on failure only: it owns a copy of the input
    let context = || SourceContext::from_fragment(options.source_name.clone(), input);
    let base = range.start;
    let Some(fragment) = input.get(range.clone()) else {
        return Err(context().malformed_tree(
            start_rule,
            "a range on character boundaries",
            Span::new(base.min(input.len()), base.min(input.len())),
        ));
    };

    let depth = nesting_depth(fragment);
    if depth > options.max_nesting {
        return Err(context().report(
            ErrorKind::NestingTooDeep {
                depth,
                limit: options.max_nesting,
            },
            Span::new(base, range.end).into(),
        ));
    }

    debug!(rule = %start_rule, offset = base, len = fragment.len(), "parsing fragment");

    let mut pairs = FortranParser::parse(start_rule.to_pest(), fragment)
        .map_err(|error| convert_parse_error(error, start_rule, base, &context()))?;

    let mut roots = Vec::with_capacity(1);
    if let Some(pair) = pairs.next() {
        collect_matches(pair, input, base, &mut roots);
    }
    let root = roots.into_iter().next().ok_or_else(|| {
        context().malformed_tree(start_rule, "a node for the start rule", Span::new(base, base))
    })?;

    if options.require_complete {
        let rest = skip_trailing(input, root.span.end);
        if rest < range.end {
            return Err(context().report(
                ErrorKind::Incomplete {
                    rule: start_rule,
                    consumed: root.span.end - base,
                    total: fragment.len(),
                },
                Span::new(root.span.end, range.end).into(),
            ));
        }
    }

    debug!(rule = %start_rule, consumed = root.span.len(), "matched");
    Ok(root)
}

// ============================================================================
// TREE CONVERSION
// ============================================================================

/// Append the match for `pair` to `out`. Pairs without a public rule name are
/// flattened into their parent.
fn collect_matches<'i>(pair: Pair<'_, Rule>, input: &'i str, base: usize, out: &mut Vec<Match<'i>>) {
    let Some(rule) = RuleName::from_pest(pair.as_rule()) else {
        for inner in pair.into_inner() {
            collect_matches(inner, input, base, out);
        }
        return;
    };

    let start = base + pair.as_span().start();
    let mut end = base + pair.as_span().end();

    let mut children = Vec::new();
    for inner in pair.into_inner() {
        collect_matches(inner, input, base, &mut children);
    }

    // implicit skipping before an absent optional tail leaks into the span
    if !rule.is_atomic() {
        let last_token = children.last().map_or(start, |child: &Match<'_>| child.span.end);
        end = trim_trailing(input, last_token, end);
    }

    out.push(Match {
        rule,
        span: Span::new(start, end),
        input,
        children,
    });
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

fn convert_parse_error(
    error: Error<Rule>,
    rule: RuleName,
    base: usize,
    context: &SourceContext,
) -> ParseError {
    let furthest = base
        + match error.location {
            InputLocation::Pos(pos) => pos,
            InputLocation::Span((start, _)) => start,
        };

    let mut expected: Vec<RuleName> = match &error.variant {
        ErrorVariant::ParsingError { positives, .. } => {
            positives.iter().copied().filter_map(RuleName::from_pest).collect()
        }
        ErrorVariant::CustomError { .. } => Vec::new(),
    };
    expected.sort();
    expected.dedup();

    trace!(%rule, furthest, ?expected, "no match");

    context.report(
        ErrorKind::Mismatch {
            rule,
            furthest,
            expected,
        },
        Span::new(furthest, furthest).into(),
    )
}
