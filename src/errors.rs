//! Error handling for fragment parsing.
//!
//! There is one error type, [`ParseError`], carrying an [`ErrorKind`], the
//! source it refers to and diagnostic metadata. It renders through `miette`.

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::syntax::{RuleName, Span};

// ============================================================================
// SOURCE CONTEXT
// ============================================================================

/// The text an error points into, with a display name.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    pub fn from_fragment(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Convert to NamedSource for use with miette error reporting
    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug)]
pub struct ParseError {
    /// What went wrong
    pub kind: ErrorKind,
    /// Where it happened
    pub source_info: SourceInfo,
    pub diagnostic_info: DiagnosticInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// The start rule did not match. `furthest` is the byte offset of the
    /// furthest position the grammar reached before giving up.
    #[error("no {rule} here: gave up at offset {furthest}{}", expected_suffix(.expected))]
    Mismatch {
        rule: RuleName,
        furthest: usize,
        expected: Vec<RuleName>,
    },

    #[error("{rule} matched {consumed} of {total} bytes")]
    Incomplete {
        rule: RuleName,
        consumed: usize,
        total: usize,
    },

    #[error("parentheses nested {depth} deep, limit is {limit}")]
    NestingTooDeep { depth: usize, limit: usize },

    #[error("unknown rule `{name}`")]
    UnknownRule { name: String },

    #[error("invalid {literal_type} literal '{value}'")]
    InvalidLiteral { literal_type: String, value: String },

    #[error("cannot lower {rule}: expected {expected}")]
    MalformedTree { rule: RuleName, expected: String },
}

fn expected_suffix(expected: &[RuleName]) -> String {
    if expected.is_empty() {
        return String::new();
    }
    let names: Vec<_> = expected.iter().map(|rule| rule.as_str()).collect();
    format!(", expected {}", names.join(" | "))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The input did not fit the grammar
    Grammar,
    /// The caller asked for something that does not exist
    Lookup,
    /// A match tree could not be turned into the typed AST
    Lowering,
}

#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub source: Arc<NamedSource<String>>,
    pub primary_span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct DiagnosticInfo {
    pub help: Option<String>,
    pub error_code: String,
}

impl ErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Mismatch { .. } | Self::Incomplete { .. } | Self::NestingTooDeep { .. } => {
                ErrorCategory::Grammar
            }
            Self::UnknownRule { .. } => ErrorCategory::Lookup,
            Self::InvalidLiteral { .. } | Self::MalformedTree { .. } => ErrorCategory::Lowering,
        }
    }

    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::Mismatch { .. } => "mismatch",
            Self::Incomplete { .. } => "incomplete",
            Self::NestingTooDeep { .. } => "nesting_too_deep",
            Self::UnknownRule { .. } => "unknown_rule",
            Self::InvalidLiteral { .. } => "invalid_literal",
            Self::MalformedTree { .. } => "malformed_tree",
        }
    }

    fn phase(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Grammar => "parse",
            ErrorCategory::Lookup => "lookup",
            ErrorCategory::Lowering => "lower",
        }
    }

    fn help(&self) -> Option<String> {
        match self {
            Self::Incomplete { .. } => {
                Some("only a prefix matched; parse a shorter fragment or pick another start rule".into())
            }
            Self::NestingTooDeep { .. } => Some("raise ParseOptions::max_nesting if this input is trusted".into()),
            Self::UnknownRule { .. } => Some("rule names are kebab-case, e.g. `subroutine-call`".into()),
            _ => None,
        }
    }
}

// ============================================================================
// ERROR CONSTRUCTION
// ============================================================================

/// Anything that knows the source an error refers to can build one.
pub trait ErrorReporting {
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> ParseError;

    fn malformed_tree(&self, rule: RuleName, expected: &str, span: Span) -> ParseError {
        self.report(
            ErrorKind::MalformedTree {
                rule,
                expected: expected.into(),
            },
            span.into(),
        )
    }

    fn invalid_literal(&self, literal_type: &str, value: &str, span: Span) -> ParseError {
        self.report(
            ErrorKind::InvalidLiteral {
                literal_type: literal_type.into(),
                value: value.into(),
            },
            span.into(),
        )
    }
}

impl ErrorReporting for SourceContext {
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> ParseError {
        let error_code = format!("fortran::{}::{}", kind.phase(), kind.code_suffix());
        let help = kind.help();

        ParseError {
            kind,
            source_info: SourceInfo {
                source: self.to_named_source(),
                primary_span: span,
            },
            diagnostic_info: DiagnosticInfo { help, error_code },
        }
    }
}

/// Placeholder span for errors not tied to a source location.
pub fn unspanned() -> SourceSpan {
    SourceSpan::from(0..0)
}

// ============================================================================
// TRAIT IMPLEMENTATIONS
// ============================================================================

impl std::error::Error for ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl Diagnostic for ParseError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.diagnostic_info.error_code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diagnostic_info
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = vec![LabeledSpan::new_with_span(
            Some(self.primary_label().into()),
            self.source_info.primary_span,
        )];
        Some(Box::new(labels.into_iter()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&*self.source_info.source)
    }
}

impl ParseError {
    /// Byte offset the error points at.
    pub fn offset(&self) -> usize {
        self.source_info.primary_span.offset()
    }

    fn primary_label(&self) -> &'static str {
        match &self.kind {
            ErrorKind::Mismatch { .. } => "parsing stopped here",
            ErrorKind::Incomplete { .. } => "not consumed",
            ErrorKind::NestingTooDeep { .. } => "nesting limit exceeded",
            ErrorKind::UnknownRule { .. } => "unknown rule",
            ErrorKind::InvalidLiteral { .. } => "invalid literal",
            ErrorKind::MalformedTree { .. } => "unexpected shape",
        }
    }
}
