//! Lexical noise: blanks, `!` comments and `&` line continuations.

use pest::Parser;

use super::parser::{FortranParser, Rule};

/// Skip blanks, comments and continuations starting at `pos`.
///
/// Returns the first position that is not noise. Never fails, never consumes
/// identifier characters, and is idempotent: skipping again from the result
/// returns the result. Positions past the end or inside a UTF-8 sequence are
/// returned unchanged.
pub fn skip_noise(input: &str, pos: usize) -> usize {
    let Some(rest) = input.get(pos..) else {
        return pos;
    };
    FortranParser::parse(Rule::noise, rest)
        .ok()
        .and_then(|mut pairs| pairs.next())
        .map_or(pos, |pair| pos + pair.as_span().end())
}

/// Skip noise and line breaks, i.e. everything allowed to trail a statement.
pub(crate) fn skip_trailing(input: &str, mut pos: usize) -> usize {
    loop {
        pos = skip_noise(input, pos);
        match input.as_bytes().get(pos) {
            Some(b'\n') | Some(b'\r') => pos += 1,
            _ => return pos,
        }
    }
}

/// Pull `end` back over any noise that trails the last token in
/// `from..end`. Only meaningful for text without string literals.
pub(crate) fn trim_trailing(input: &str, from: usize, end: usize) -> usize {
    let mut token_end = from;
    let mut pos = from;
    loop {
        pos = skip_noise(input, pos);
        if pos >= end {
            return token_end;
        }
        let width = input[pos..].chars().next().map_or(1, char::len_utf8);
        pos += width;
        token_end = pos;
    }
}

/// Deepest parenthesis nesting, ignoring string literals and comments.
pub(crate) fn nesting_depth(input: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0;
    let mut quote = None;
    let mut in_comment = false;

    for c in input.chars() {
        match (quote, c) {
            _ if in_comment => in_comment = c != '\n',
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '!') => in_comment = true,
            (None, '(') => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            (None, ')') => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}
