//! Structural parsing of Fortran source fragments.
//!
//! Pick a start rule, hand over some text, get back either a [`Match`] tree
//! or a [`ParseError`] saying how far the grammar got. The grammar knows
//! calls, assignments, array access and simple operator chains, and it
//! skips blanks, `!` comments and `&` continuations between tokens.
//!
//! ```rust
//! use fortran_fragments::{parse, RuleName};
//!
//! let call = parse("call log(x, 'done')", RuleName::SubroutineCall).unwrap();
//! assert_eq!(call.child(RuleName::Name).unwrap().as_str(), "log");
//! ```
//!
//! The [`ast`] module lowers match trees into typed nodes, and [`scan`] finds
//! statements in whole source files.

pub use crate::errors::{ErrorKind, ParseError};
pub use crate::options::ParseOptions;
pub use crate::syntax::{parse, parse_with, skip_noise, Match, RuleName, Span};

pub mod ast;
pub mod errors;
pub mod options;
pub mod scan;
pub mod syntax;
