//! Locating statements in whole source files.
//!
//! Free-form Fortran spreads one statement over several physical lines with
//! `&`. [`logical_lines`] joins them back together, and [`locate`] tries a
//! rule at the start of every logical line, e.g. to find every `call`.

use tracing::{debug, trace};

use crate::options::ParseOptions;
use crate::syntax::{parse_range, Match, RuleName, Span};

/// One or more physical lines joined by `&` continuations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalLine<'s> {
    /// Covers the joined lines, without the final line break.
    pub span: Span,
    pub text: &'s str,
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_line_break(c: char) -> bool {
    c == '\n' || c == '\r'
}

/// The part of a physical line before any `!` comment.
fn code_part(line: &str) -> &str {
    let mut quote = None;
    for (i, c) in line.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '!' => return &line[..i],
            None => {}
        }
    }
    line
}

fn continues(line: &str) -> bool {
    code_part(line).trim_end_matches(is_blank).ends_with('&')
}

/// Split `source` into logical lines.
pub fn logical_lines(source: &str) -> Vec<LogicalLine<'_>> {
    let mut lines = Vec::new();
    let mut pending: Option<usize> = None;
    let mut offset = 0;

    for physical in source.split_inclusive('\n') {
        let line_start = offset;
        offset += physical.len();

        let body = physical.trim_end_matches(is_line_break);
        // blank and comment-only lines stay inside an open continuation
        if pending.is_some() && code_part(body).trim_matches(is_blank).is_empty() {
            continue;
        }
        let begin = *pending.get_or_insert(line_start);
        if continues(body) {
            continue;
        }
        let end = line_start + body.len();
        lines.push(LogicalLine {
            span: Span::new(begin, end),
            text: &source[begin..end],
        });
        pending = None;
    }

    // a continuation with nothing after it
    if let Some(begin) = pending {
        let end = source.trim_end_matches(is_line_break).len().max(begin);
        lines.push(LogicalLine {
            span: Span::new(begin, end),
            text: &source[begin..end],
        });
    }
    lines
}

/// First column of the statement: leading blanks and a numeric statement
/// label are skipped.
fn statement_start(line: &LogicalLine<'_>) -> usize {
    let trimmed = line.text.trim_start_matches(is_blank);
    let mut pos = line.span.start + (line.text.len() - trimmed.len());

    let label = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    if label > 0 {
        let after = &trimmed[label..];
        let rest = after.trim_start_matches(is_blank);
        if rest.len() < after.len() {
            pos += label + (after.len() - rest.len());
        }
    }
    pos
}

/// Every logical line of `source` that starts with `rule`.
pub fn locate(source: &str, rule: RuleName) -> Vec<Match<'_>> {
    locate_with(source, rule, &ParseOptions::default())
}

/// Like [`locate`], with explicit options. With
/// [`ParseOptions::require_complete`] a hit must span the whole statement.
pub fn locate_with<'s>(source: &'s str, rule: RuleName, options: &ParseOptions) -> Vec<Match<'s>> {
    let lines = logical_lines(source);
    let mut hits = Vec::new();

    for line in &lines {
        let start = statement_start(line);
        if start >= line.span.end || source[start..].starts_with('!') {
            continue;
        }
        match parse_range(source, start..line.span.end, rule, options) {
            Ok(hit) => {
                trace!(%rule, offset = hit.span().start, "located");
                hits.push(hit);
            }
            Err(err) => trace!(%rule, offset = start, %err, "skipped line"),
        }
    }

    debug!(%rule, lines = lines.len(), hits = hits.len(), "scan finished");
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuation_joins_lines() {
        let source = "x = 1\ncall foo(a, & ! first\n    & b)\ny = 2\n";
        let lines = logical_lines(source);
        let texts: Vec<_> = lines.iter().map(|l| l.text).collect();
        assert_eq!(
            texts,
            vec!["x = 1", "call foo(a, & ! first\n    & b)", "y = 2"]
        );
    }

    #[test]
    fn comment_and_blank_lines_inside_continuation() {
        let source = "call f(a, &\n  ! explain b\n\n  & b)\n! after\n";
        let texts: Vec<_> = logical_lines(source).iter().map(|l| l.text).collect();
        assert_eq!(texts, vec!["call f(a, &\n  ! explain b\n\n  & b)", "! after"]);
    }

    #[test]
    fn ampersand_in_string_or_comment_does_not_continue() {
        assert!(!continues("print *, 'a &'"));
        assert!(!continues("x = 1 ! see &"));
        assert!(continues("call f(1, &   "));
    }

    #[test]
    fn missing_final_newline_and_crlf() {
        let lines = logical_lines("a = 1\r\nb = 2");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "a = 1");
        assert_eq!(lines[1].text, "b = 2");
    }

    #[test]
    fn label_is_skipped() {
        let source = "  100 call done";
        let line = logical_lines(source)[0];
        assert_eq!(&source[statement_start(&line)..], "call done");
    }
}
