//! Grammar engine for Fortran fragments.
//!
//! The grammar lives in `syntax/grammar.pest`. This module exposes the entry
//! points, the rule names and the match tree; everything about pest stays
//! private.

mod matches;
mod noise;
mod parser;
mod rules;

pub use matches::{Match, Span};
pub use noise::skip_noise;
pub use parser::{parse, parse_with};
pub use rules::RuleName;

pub(crate) use parser::parse_range;
