//! # AST Builder
//!
//! Lowers a [`Match`] tree into the typed AST. The grammar fixes the shape
//! of every match, so lowering only fails on sub-trees the caller assembled
//! or picked in a way the grammar never produces.

use super::*;
use crate::errors::{ErrorReporting, ParseError, SourceContext};
use crate::options::ParseOptions;
use crate::syntax::{self, Match, RuleName as R};

// ============================================================================
// PUBLIC API
// ============================================================================

/// Lower any match into its [`Node`].
pub fn build(m: &Match<'_>) -> Result<Node, ParseError> {
    Lowering::new(m.input(), &ParseOptions::default()).node(m)
}

/// Parse `input` from `rule` and lower the result.
pub fn parse_node(input: &str, rule: R) -> Result<Node, ParseError> {
    parse_node_with(input, rule, &ParseOptions::default())
}

/// Like [`parse_node`], with explicit options. Grammar and lowering errors
/// are both reported under `options.source_name`.
pub fn parse_node_with(input: &str, rule: R, options: &ParseOptions) -> Result<Node, ParseError> {
    let m = syntax::parse_with(input, rule, options)?;
    Lowering::new(input, options).node(&m)
}

/// Parse a value-returning expression.
pub fn parse_expression(input: &str) -> Result<Expr, ParseError> {
    let m = syntax::parse(input, R::ValueReturningCode)?;
    Lowering::new(input, &ParseOptions::default()).expr(&m)
}

pub fn parse_subroutine_call(input: &str) -> Result<SubroutineCall, ParseError> {
    let m = syntax::parse(input, R::SubroutineCall)?;
    Lowering::new(input, &ParseOptions::default()).subroutine_call(&m)
}

pub fn parse_assignment(input: &str) -> Result<Assignment, ParseError> {
    let m = syntax::parse(input, R::Assignment)?;
    Lowering::new(input, &ParseOptions::default()).assignment(&m)
}

pub fn parse_arithmetic(input: &str) -> Result<ArithmeticStatement, ParseError> {
    let m = syntax::parse(input, R::ArithmeticStatement)?;
    Lowering::new(input, &ParseOptions::default()).arithmetic(&m)
}

pub fn parse_relational(input: &str) -> Result<RelationalStatement, ParseError> {
    let m = syntax::parse(input, R::RelationalStatement)?;
    Lowering::new(input, &ParseOptions::default()).relational(&m)
}

pub fn parse_logical(input: &str) -> Result<LogicalStatement, ParseError> {
    let m = syntax::parse(input, R::LogicalStatement)?;
    Lowering::new(input, &ParseOptions::default()).logical(&m)
}

// ============================================================================
// LOWERING
// ============================================================================

type Lowered<T> = Result<T, ParseError>;

struct Lowering {
    source: SourceContext,
}

fn spanned<T>(value: T, span: Span) -> Spanned<T> {
    Spanned { value, span }
}

impl Lowering {
    fn new(input: &str, options: &ParseOptions) -> Self {
        Self {
            source: SourceContext::from_fragment(options.source_name.clone(), input),
        }
    }

    fn node(&self, m: &Match<'_>) -> Lowered<Node> {
        let span = m.span();
        let node = match m.rule() {
            R::Digits => Node::Digits(spanned(m.as_str().to_string(), span)),
            R::Name => Node::Identifier(self.identifier(m)?),
            R::PrecisionSpec => Node::Precision(spanned(self.precision(m)?, span)),
            R::Integer => Node::Integer(self.integer(m)?),
            R::Float => Node::Float(self.float(m)?),
            R::Sign => Node::Sign(spanned(self.sign(m)?, span)),
            R::Number => Node::Number(self.number(m)?),
            R::String => Node::String(self.string(m)?),
            R::BooleanValue | R::Boolean => Node::Boolean(self.boolean(m)?),

            R::Power
            | R::Multiplication
            | R::Division
            | R::Addition
            | R::Subtraction
            | R::ArithmeticOperator => Node::ArithmeticOperator(self.arithmetic_operator(m)?),

            R::Equality
            | R::Inequality
            | R::LessEqual
            | R::GreaterEqual
            | R::Less
            | R::Greater
            | R::RelationalOperator => Node::RelationalOperator(self.relational_operator(m)?),

            R::LogicalAnd
            | R::LogicalOr
            | R::LogicalEqv
            | R::LogicalNeqv
            | R::LogicalOperator => Node::LogicalOperator(self.logical_operator(m)?),

            R::LogicalNot | R::LogicalPrefixOperator => Node::LogicalPrefix(span),

            R::LowerBound | R::UpperBound => Node::Bound(self.bound(m)?),
            R::ArrayIndexRegion => Node::IndexRegion(self.region(m)?),
            R::ArrayIndex => Node::ArrayIndex(self.array_index(m)?),
            R::IndexedArray => Node::IndexedArray(self.indexed_array(m)?),
            R::AccessedVariable => Node::AccessedVariable(self.accessed_variable(m)?),
            R::Booleans | R::Strings | R::Numbers => Node::ArrayItems(spanned(self.array_items(m)?, span)),
            R::InPlaceArray => Node::InPlaceArray(self.in_place_array(m)?),
            R::FunctionCall => Node::FunctionCall(self.function_call(m)?),
            R::ValueReturningCode | R::AtomicValue | R::Argument => Node::Expr(self.expr(m)?),

            R::ArithmeticStatement => Node::ArithmeticStatement(self.arithmetic(m)?),
            R::RelationalStatement => Node::RelationalStatement(self.relational(m)?),
            R::LogicalStatement => Node::LogicalStatement(self.logical(m)?),
            R::Arguments => Node::Arguments(spanned(self.arguments(m)?, span)),
            R::Assignment => Node::Assignment(self.assignment(m)?),
            R::CallKeyword => Node::CallKeyword(span),
            R::SubroutineCall => Node::SubroutineCall(self.subroutine_call(m)?),
        };
        Ok(node)
    }

    // ------------------------------------------------------------------------
    // Shape helpers
    // ------------------------------------------------------------------------

    fn unexpected(&self, m: &Match<'_>, expected: &str) -> ParseError {
        self.source.malformed_tree(m.rule(), expected, m.span())
    }

    fn expect(&self, m: &Match<'_>, rule: R) -> Lowered<()> {
        if m.rule() == rule {
            Ok(())
        } else {
            Err(self.unexpected(m, rule.as_str()))
        }
    }

    fn required<'m, 'i>(&self, m: &'m Match<'i>, rule: R) -> Lowered<&'m Match<'i>> {
        m.child(rule).ok_or_else(|| self.unexpected(m, rule.as_str()))
    }

    fn first_child<'m, 'i>(&self, m: &'m Match<'i>, expected: &str) -> Lowered<&'m Match<'i>> {
        m.children().first().ok_or_else(|| self.unexpected(m, expected))
    }

    // ------------------------------------------------------------------------
    // Literals
    // ------------------------------------------------------------------------

    fn identifier(&self, m: &Match<'_>) -> Lowered<Identifier> {
        self.expect(m, R::Name)?;
        Ok(Identifier {
            name: m.as_str().to_string(),
            span: m.span(),
        })
    }

    fn precision(&self, m: &Match<'_>) -> Lowered<String> {
        self.expect(m, R::PrecisionSpec)?;
        Ok(self.first_child(m, "a kind name or digits")?.as_str().to_string())
    }

    fn optional_precision(&self, m: &Match<'_>) -> Lowered<Option<String>> {
        m.child(R::PrecisionSpec).map(|p| self.precision(p)).transpose()
    }

    fn integer(&self, m: &Match<'_>) -> Lowered<IntegerLiteral> {
        self.expect(m, R::Integer)?;
        Ok(IntegerLiteral {
            digits: self.required(m, R::Digits)?.as_str().to_string(),
            precision: self.optional_precision(m)?,
            span: m.span(),
        })
    }

    fn float(&self, m: &Match<'_>) -> Lowered<FloatLiteral> {
        self.expect(m, R::Float)?;
        let mut parts = m.children_named(R::Digits);
        let (Some(whole), Some(fraction)) = (parts.next(), parts.next()) else {
            return Err(self.unexpected(m, "digits on both sides of the point"));
        };
        Ok(FloatLiteral {
            whole: whole.as_str().to_string(),
            fraction: fraction.as_str().to_string(),
            precision: self.optional_precision(m)?,
            span: m.span(),
        })
    }

    fn sign(&self, m: &Match<'_>) -> Lowered<Sign> {
        match m.as_str() {
            "+" => Ok(Sign::Plus),
            "-" => Ok(Sign::Minus),
            _ => Err(self.unexpected(m, "`+` or `-`")),
        }
    }

    fn optional_sign(&self, m: &Match<'_>) -> Lowered<Option<Sign>> {
        m.child(R::Sign).map(|s| self.sign(s)).transpose()
    }

    fn number(&self, m: &Match<'_>) -> Lowered<Number> {
        self.expect(m, R::Number)?;
        let sign = self.optional_sign(m)?;

        let (literal, text) = if let Some(float) = m.child(R::Float) {
            let float = self.float(float)?;
            let text = format!("{}.{}", float.whole, float.fraction);
            (NumberLiteral::Float(float), text)
        } else {
            let integer = self.integer(self.required(m, R::Integer)?)?;
            let text = integer.digits.clone();
            (NumberLiteral::Integer(integer), text)
        };

        let magnitude: f64 = text
            .parse()
            .map_err(|_| self.source.invalid_literal("number", m.as_str(), m.span()))?;
        let value = match sign {
            Some(Sign::Minus) => -magnitude,
            _ => magnitude,
        };

        Ok(Number {
            sign,
            literal,
            value,
            span: m.span(),
        })
    }

    fn string(&self, m: &Match<'_>) -> Lowered<StringLiteral> {
        self.expect(m, R::String)?;
        let text = m.as_str();
        let quote = text.chars().next().filter(|q| matches!(q, '"' | '\''));
        match quote {
            Some(quote) if text.len() >= 2 && text.ends_with(quote) => Ok(StringLiteral {
                value: text[1..text.len() - 1].to_string(),
                quote,
                span: m.span(),
            }),
            _ => Err(self.source.invalid_literal("string", text, m.span())),
        }
    }

    fn boolean(&self, m: &Match<'_>) -> Lowered<Boolean> {
        let (negated, value) = match m.rule() {
            R::BooleanValue => (false, m),
            R::Boolean => (
                m.child(R::LogicalPrefixOperator).is_some(),
                self.required(m, R::BooleanValue)?,
            ),
            _ => return Err(self.unexpected(m, "boolean")),
        };
        let literal = if value.as_str().eq_ignore_ascii_case(".true.") {
            true
        } else if value.as_str().eq_ignore_ascii_case(".false.") {
            false
        } else {
            return Err(self.source.invalid_literal("boolean", value.as_str(), value.span()));
        };
        Ok(Boolean {
            negated,
            literal,
            span: m.span(),
        })
    }

    // ------------------------------------------------------------------------
    // Operators
    // ------------------------------------------------------------------------

    fn arithmetic_operator(&self, m: &Match<'_>) -> Lowered<Spanned<ArithmeticOperator>> {
        let op = match m.rule() {
            R::ArithmeticOperator => return self.arithmetic_operator(self.first_child(m, "operator")?),
            R::Power => ArithmeticOperator::Power,
            R::Multiplication => ArithmeticOperator::Multiply,
            R::Division => ArithmeticOperator::Divide,
            R::Addition => ArithmeticOperator::Add,
            R::Subtraction => ArithmeticOperator::Subtract,
            _ => return Err(self.unexpected(m, "arithmetic operator")),
        };
        Ok(spanned(op, m.span()))
    }

    fn relational_operator(&self, m: &Match<'_>) -> Lowered<Spanned<RelationalOperator>> {
        let op = match m.rule() {
            R::RelationalOperator => return self.relational_operator(self.first_child(m, "operator")?),
            R::Equality => RelationalOperator::Equal,
            R::Inequality => RelationalOperator::NotEqual,
            R::LessEqual => RelationalOperator::LessEqual,
            R::GreaterEqual => RelationalOperator::GreaterEqual,
            R::Less => RelationalOperator::Less,
            R::Greater => RelationalOperator::Greater,
            _ => return Err(self.unexpected(m, "relational operator")),
        };
        Ok(spanned(op, m.span()))
    }

    fn logical_operator(&self, m: &Match<'_>) -> Lowered<Spanned<LogicalOperator>> {
        let op = match m.rule() {
            R::LogicalOperator => return self.logical_operator(self.first_child(m, "operator")?),
            R::LogicalAnd => LogicalOperator::And,
            R::LogicalOr => LogicalOperator::Or,
            R::LogicalEqv => LogicalOperator::Eqv,
            R::LogicalNeqv => LogicalOperator::Neqv,
            _ => return Err(self.unexpected(m, "logical operator")),
        };
        Ok(spanned(op, m.span()))
    }

    // ------------------------------------------------------------------------
    // Variable access
    // ------------------------------------------------------------------------

    fn bound(&self, m: &Match<'_>) -> Lowered<Bound> {
        let inner = self.first_child(m, "integer or name")?;
        match inner.rule() {
            R::Integer => Ok(Bound::Integer(self.integer(inner)?)),
            R::Name => Ok(Bound::Name(self.identifier(inner)?)),
            _ => Err(self.unexpected(inner, "integer or name")),
        }
    }

    fn region(&self, m: &Match<'_>) -> Lowered<IndexRegion> {
        self.expect(m, R::ArrayIndexRegion)?;
        Ok(IndexRegion {
            lower: m.child(R::LowerBound).map(|b| self.bound(b)).transpose()?,
            upper: m.child(R::UpperBound).map(|b| self.bound(b)).transpose()?,
            span: m.span(),
        })
    }

    fn array_index(&self, m: &Match<'_>) -> Lowered<ArrayIndex> {
        self.expect(m, R::ArrayIndex)?;
        let inner = self.first_child(m, "index")?;
        match inner.rule() {
            R::ArrayIndexRegion => Ok(ArrayIndex::Region(self.region(inner)?)),
            R::Integer => Ok(ArrayIndex::Integer(self.integer(inner)?)),
            R::Name => Ok(ArrayIndex::Name(self.identifier(inner)?)),
            _ => Err(self.unexpected(inner, "region, integer or name")),
        }
    }

    fn indexed_array(&self, m: &Match<'_>) -> Lowered<IndexedArray> {
        self.expect(m, R::IndexedArray)?;
        Ok(IndexedArray {
            name: self.identifier(self.required(m, R::Name)?)?,
            indices: m
                .children_named(R::ArrayIndex)
                .map(|index| self.array_index(index))
                .collect::<Lowered<Vec<_>>>()?,
            span: m.span(),
        })
    }

    fn accessed_variable(&self, m: &Match<'_>) -> Lowered<AccessedVariable> {
        self.expect(m, R::AccessedVariable)?;
        let target = match m.child(R::IndexedArray) {
            Some(array) => VariableRef::Indexed(self.indexed_array(array)?),
            None => VariableRef::Plain(self.identifier(self.required(m, R::Name)?)?),
        };
        Ok(AccessedVariable {
            sign: self.optional_sign(m)?,
            target,
            span: m.span(),
        })
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    fn array_items(&self, m: &Match<'_>) -> Lowered<ArrayItems> {
        let items = match m.rule() {
            R::Booleans => ArrayItems::Booleans(
                m.children_named(R::Boolean)
                    .map(|b| self.boolean(b))
                    .collect::<Lowered<_>>()?,
            ),
            R::Strings => ArrayItems::Strings(
                m.children_named(R::String)
                    .map(|s| self.string(s))
                    .collect::<Lowered<_>>()?,
            ),
            R::Numbers => ArrayItems::Numbers(
                m.children_named(R::Number)
                    .map(|n| self.number(n))
                    .collect::<Lowered<_>>()?,
            ),
            _ => return Err(self.unexpected(m, "booleans, strings or numbers")),
        };
        Ok(items)
    }

    fn in_place_array(&self, m: &Match<'_>) -> Lowered<InPlaceArray> {
        self.expect(m, R::InPlaceArray)?;
        Ok(InPlaceArray {
            items: self.array_items(self.first_child(m, "a literal list")?)?,
            span: m.span(),
        })
    }

    fn function_call(&self, m: &Match<'_>) -> Lowered<FunctionCall> {
        self.expect(m, R::FunctionCall)?;
        Ok(FunctionCall {
            name: self.identifier(self.required(m, R::Name)?)?,
            arguments: m
                .child(R::Arguments)
                .map(|args| self.arguments(args))
                .transpose()?
                .unwrap_or_default(),
            span: m.span(),
        })
    }

    fn arguments(&self, m: &Match<'_>) -> Lowered<Vec<Expr>> {
        self.expect(m, R::Arguments)?;
        m.children_named(R::Argument).map(|arg| self.expr(arg)).collect()
    }

    fn expr(&self, m: &Match<'_>) -> Lowered<Expr> {
        let expr = match m.rule() {
            R::ValueReturningCode | R::AtomicValue | R::Argument => {
                return self.expr(self.first_child(m, "an expression")?)
            }
            R::FunctionCall => Expr::Call(self.function_call(m)?),
            R::InPlaceArray => Expr::Array(self.in_place_array(m)?),
            R::Number => Expr::Literal(Literal::Number(self.number(m)?)),
            R::String => Expr::Literal(Literal::String(self.string(m)?)),
            R::Boolean => Expr::Literal(Literal::Boolean(self.boolean(m)?)),
            R::AccessedVariable => Expr::Variable(self.accessed_variable(m)?),
            _ => return Err(self.unexpected(m, "an expression")),
        };
        Ok(expr)
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    /// Operands and operators alternate, starting and ending with an operand.
    fn chain<Op, T>(
        &self,
        m: &Match<'_>,
        operand_rule: R,
        operator_rule: R,
        operand: impl Fn(&Self, &Match<'_>) -> Lowered<T>,
        operator: impl Fn(&Self, &Match<'_>) -> Lowered<Spanned<Op>>,
    ) -> Lowered<Chain<Op, T>> {
        let mut first = None;
        let mut rest = Vec::new();
        let mut pending = None;

        for child in m.children() {
            let rule = child.rule();
            if rule == operator_rule && first.is_some() && pending.is_none() {
                pending = Some(operator(self, child)?);
            } else if rule == operand_rule {
                let value = operand(self, child)?;
                match (first.is_none(), pending.take()) {
                    (true, _) => first = Some(value),
                    (false, Some(op)) => rest.push((op, value)),
                    (false, None) => return Err(self.unexpected(child, "an operator between operands")),
                }
            } else {
                return Err(self.unexpected(child, operand_rule.as_str()));
            }
        }

        match (first, pending) {
            (Some(first), None) => Ok(Chain {
                first,
                rest,
                span: m.span(),
            }),
            _ => Err(self.unexpected(m, "an operand after every operator")),
        }
    }

    fn arithmetic(&self, m: &Match<'_>) -> Lowered<ArithmeticStatement> {
        self.expect(m, R::ArithmeticStatement)?;
        self.chain(
            m,
            R::ValueReturningCode,
            R::ArithmeticOperator,
            Self::expr,
            Self::arithmetic_operator,
        )
    }

    fn relational(&self, m: &Match<'_>) -> Lowered<RelationalStatement> {
        self.expect(m, R::RelationalStatement)?;
        self.chain(
            m,
            R::ArithmeticStatement,
            R::RelationalOperator,
            Self::arithmetic,
            Self::relational_operator,
        )
    }

    fn logical(&self, m: &Match<'_>) -> Lowered<LogicalStatement> {
        self.expect(m, R::LogicalStatement)?;
        self.chain(
            m,
            R::RelationalStatement,
            R::LogicalOperator,
            Self::relational,
            Self::logical_operator,
        )
    }

    fn assignment(&self, m: &Match<'_>) -> Lowered<Assignment> {
        self.expect(m, R::Assignment)?;
        Ok(Assignment {
            target: self.accessed_variable(self.required(m, R::AccessedVariable)?)?,
            value: self.expr(self.required(m, R::ValueReturningCode)?)?,
            span: m.span(),
        })
    }

    fn subroutine_call(&self, m: &Match<'_>) -> Lowered<SubroutineCall> {
        self.expect(m, R::SubroutineCall)?;
        let name = self.identifier(self.required(m, R::Name)?)?;
        // spans end at the last token, so anything past the name is `(...)`
        let arguments = match m.child(R::Arguments) {
            Some(args) => Some(self.arguments(args)?),
            None if m.span().end > name.span.end => Some(Vec::new()),
            None => None,
        };
        Ok(SubroutineCall {
            name,
            arguments,
            span: m.span(),
        })
    }
}
