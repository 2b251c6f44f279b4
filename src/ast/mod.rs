//! Typed AST for Fortran fragments.
//!
//! Every grammar rule with a meaning of its own has a dedicated type here,
//! carrying exactly its children. Operator chains stay flat: a chain records
//! its operands and operators left to right and imposes no precedence.

// ============================================================================
// IMPORTS
// ============================================================================

use serde::{Deserialize, Serialize};

pub use crate::syntax::Span;

pub mod builder;

pub use builder::{
    build, parse_arithmetic, parse_assignment, parse_expression, parse_logical, parse_node,
    parse_node_with, parse_relational, parse_subroutine_call,
};

// ============================================================================
// LITERALS
// ============================================================================

/// Wrapper for carrying source span information with any value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sign {
    Plus,
    Minus,
}

/// A plain name: variable, array, function or subroutine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegerLiteral {
    pub digits: String,
    /// Kind suffix without the underscore, e.g. `prec` in `10_prec`.
    pub precision: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloatLiteral {
    pub whole: String,
    pub fraction: String,
    pub precision: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberLiteral {
    Integer(IntegerLiteral),
    Float(FloatLiteral),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Number {
    pub sign: Option<Sign>,
    pub literal: NumberLiteral,
    /// Numeric value with the sign applied; the kind suffix is ignored.
    pub value: f64,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringLiteral {
    /// Text between the quotes.
    pub value: String,
    pub quote: char,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boolean {
    /// Written with a leading `.not.`
    pub negated: bool,
    /// The literal as written, `.true.` or `.false.`
    pub literal: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Number(Number),
    String(StringLiteral),
    Boolean(Boolean),
}

/// Contents of a `(/ ... /)` constructor. Lists are homogeneous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArrayItems {
    Booleans(Vec<Boolean>),
    Strings(Vec<StringLiteral>),
    Numbers(Vec<Number>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InPlaceArray {
    pub items: ArrayItems,
    pub span: Span,
}

// ============================================================================
// VARIABLE ACCESS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bound {
    Integer(IntegerLiteral),
    Name(Identifier),
}

/// `lower:upper`; an absent end means the whole dimension on that side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRegion {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrayIndex {
    Region(IndexRegion),
    Integer(IntegerLiteral),
    Name(Identifier),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedArray {
    pub name: Identifier,
    pub indices: Vec<ArrayIndex>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableRef {
    Indexed(IndexedArray),
    Plain(Identifier),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessedVariable {
    pub sign: Option<Sign>,
    pub target: VariableRef,
    pub span: Span,
}

impl AccessedVariable {
    pub fn name(&self) -> &str {
        match &self.target {
            VariableRef::Indexed(array) => &array.name.name,
            VariableRef::Plain(ident) => &ident.name,
        }
    }
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: Identifier,
    pub arguments: Vec<Expr>,
    pub span: Span,
}

/// A value-returning expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Call(FunctionCall),
    Array(InPlaceArray),
    Literal(Literal),
    Variable(AccessedVariable),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Call(call) => call.span,
            Expr::Array(array) => array.span,
            Expr::Literal(Literal::Number(n)) => n.span,
            Expr::Literal(Literal::String(s)) => s.span,
            Expr::Literal(Literal::Boolean(b)) => b.span,
            Expr::Variable(var) => var.span,
        }
    }

    /// Call nesting depth: 0 for anything that is not a function call.
    pub fn call_depth(&self) -> usize {
        match self {
            Expr::Call(call) => 1 + call.arguments.iter().map(Expr::call_depth).max().unwrap_or(0),
            _ => 0,
        }
    }
}

// ============================================================================
// OPERATORS AND CHAINS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithmeticOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationalOperator {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOperator {
    And,
    Or,
    Eqv,
    Neqv,
}

/// Operand, then zero or more operator/operand pairs, in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain<Op, T> {
    pub first: T,
    pub rest: Vec<(Spanned<Op>, T)>,
    pub span: Span,
}

impl<Op: Copy, T> Chain<Op, T> {
    pub fn operators(&self) -> impl Iterator<Item = Op> + '_ {
        self.rest.iter().map(|(op, _)| op.value)
    }

    pub fn operands(&self) -> impl Iterator<Item = &T> + '_ {
        std::iter::once(&self.first).chain(self.rest.iter().map(|(_, operand)| operand))
    }

    /// A chain without operators is just its operand.
    pub fn is_single(&self) -> bool {
        self.rest.is_empty()
    }
}

pub type ArithmeticStatement = Chain<ArithmeticOperator, Expr>;
pub type RelationalStatement = Chain<RelationalOperator, ArithmeticStatement>;
pub type LogicalStatement = Chain<LogicalOperator, RelationalStatement>;

// ============================================================================
// STATEMENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub target: AccessedVariable,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubroutineCall {
    pub name: Identifier,
    /// `None` for `call foo`, `Some(vec![])` for `call foo()`.
    pub arguments: Option<Vec<Expr>>,
    pub span: Span,
}

// ============================================================================
// NODE
// ============================================================================

/// The lowered form of any match, one case per rule family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Identifier(Identifier),
    Sign(Spanned<Sign>),
    /// A kind suffix on its own.
    Precision(Spanned<String>),
    /// Bare digit run.
    Digits(Spanned<String>),
    Integer(IntegerLiteral),
    Float(FloatLiteral),
    Number(Number),
    String(StringLiteral),
    Boolean(Boolean),
    ArithmeticOperator(Spanned<ArithmeticOperator>),
    RelationalOperator(Spanned<RelationalOperator>),
    LogicalOperator(Spanned<LogicalOperator>),
    /// `.not.`
    LogicalPrefix(Span),
    Bound(Bound),
    IndexRegion(IndexRegion),
    ArrayIndex(ArrayIndex),
    IndexedArray(IndexedArray),
    AccessedVariable(AccessedVariable),
    ArrayItems(Spanned<ArrayItems>),
    InPlaceArray(InPlaceArray),
    FunctionCall(FunctionCall),
    Expr(Expr),
    Arguments(Spanned<Vec<Expr>>),
    ArithmeticStatement(ArithmeticStatement),
    RelationalStatement(RelationalStatement),
    LogicalStatement(LogicalStatement),
    Assignment(Assignment),
    /// The `call` keyword
    CallKeyword(Span),
    SubroutineCall(SubroutineCall),
}
