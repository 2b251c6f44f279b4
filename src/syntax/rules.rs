//! Public names for the grammar rules.
//!
//! Every rule that leaves a node in the match tree has a [`RuleName`]. Any of
//! them can be used as a start rule, which allows parsing sub-fragments such
//! as a single argument list or an array index region.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::parser::Rule;
use crate::errors::{unspanned, ErrorKind, ErrorReporting, ParseError, SourceContext};

macro_rules! rule_names {
    ($( $(#[$doc:meta])* $variant:ident => $pest:ident, $text:literal, $atomic:literal; )*) => {
        /// A grammar rule that produces nodes in the match tree.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum RuleName {
            $( $(#[$doc])* $variant, )*
        }

        impl RuleName {
            /// Every visible rule, in grammar order.
            pub const ALL: &'static [RuleName] = &[ $( RuleName::$variant, )* ];

            /// Kebab-case rule name, e.g. `"subroutine-call"`.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( RuleName::$variant => $text, )*
                }
            }

            /// Atomic rules never swallow lexical noise.
            pub const fn is_atomic(self) -> bool {
                match self {
                    $( RuleName::$variant => $atomic, )*
                }
            }

            pub(crate) const fn to_pest(self) -> Rule {
                match self {
                    $( RuleName::$variant => Rule::$pest, )*
                }
            }

            pub(crate) fn from_pest(rule: Rule) -> Option<RuleName> {
                match rule {
                    $( Rule::$pest => Some(RuleName::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

rule_names! {
    Digits => digits, "digits", true;
    Name => name, "name", true;
    /// `_kind` suffix on a numeric literal.
    PrecisionSpec => precision_spec, "precision-spec", true;
    Integer => integer, "integer", true;
    Float => float, "float", true;
    Sign => sign, "sign", false;
    Number => number, "number", true;
    String => string, "string", true;
    BooleanValue => boolean_value, "boolean-value", true;
    Boolean => boolean, "boolean", false;

    Power => power, "power", false;
    Multiplication => multiplication, "multiplication", false;
    Division => division, "division", false;
    Addition => addition, "addition", false;
    Subtraction => subtraction, "subtraction", false;
    ArithmeticOperator => arithmetic_operator, "arithmetic-operator", false;

    Equality => equality, "equality", false;
    Inequality => inequality, "inequality", false;
    LessEqual => less_equal, "less-equal", false;
    GreaterEqual => greater_equal, "greater-equal", false;
    Less => less, "less", false;
    Greater => greater, "greater", false;
    RelationalOperator => relational_operator, "relational-operator", false;

    LogicalAnd => logical_and, "logical-and", false;
    LogicalOr => logical_or, "logical-or", false;
    LogicalEqv => logical_eqv, "logical-eqv", false;
    LogicalNeqv => logical_neqv, "logical-neqv", false;
    LogicalOperator => logical_operator, "logical-operator", false;
    LogicalNot => logical_not, "logical-not", false;
    LogicalPrefixOperator => logical_prefix_operator, "logical-prefix-operator", false;

    LowerBound => lower_bound, "lower-bound", false;
    UpperBound => upper_bound, "upper-bound", false;
    /// Slice notation, `[lower]:[upper]`.
    ArrayIndexRegion => array_index_region, "array-index-region", false;
    ArrayIndex => array_index, "array-index", false;
    IndexedArray => indexed_array, "indexed-array", false;
    AccessedVariable => accessed_variable, "accessed-variable", false;
    Booleans => booleans, "booleans", false;
    Strings => strings, "strings", false;
    Numbers => numbers, "numbers", false;
    /// `(/ ... /)` array constructor.
    InPlaceArray => in_place_array, "in-place-array", false;
    AtomicValue => atomic_value, "atomic-value", false;
    FunctionCall => function_call, "function-call", false;
    /// Any expression usable where a value is expected.
    ValueReturningCode => value_returning_code, "value-returning-code", false;

    ArithmeticStatement => arithmetic_statement, "arithmetic-statement", false;
    RelationalStatement => relational_statement, "relational-statement", false;
    LogicalStatement => logical_statement, "logical-statement", false;
    Argument => argument, "argument", false;
    Arguments => arguments, "arguments", false;
    Assignment => assignment, "assignment", false;
    CallKeyword => call_keyword, "call-keyword", true;
    SubroutineCall => subroutine_call, "subroutine-call", false;
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleName {
    type Err = ParseError;

    /// Accepts the kebab-case name; snake_case spellings are tolerated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('_', "-").to_ascii_lowercase();
        RuleName::ALL
            .iter()
            .copied()
            .find(|rule| rule.as_str() == wanted)
            .ok_or_else(|| {
                SourceContext::from_fragment("rule name", s).report(
                    ErrorKind::UnknownRule {
                        name: s.to_string(),
                    },
                    unspanned(),
                )
            })
    }
}
