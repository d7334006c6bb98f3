// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Parametric expressions.

Field values such as a population size or a connection probability may be
literals (`5`, `0.5`) or formulas over the network parameters (`"2*N"`,
`"p_conn / (1 + dist)"`). [`EvaluableExpression`] keeps the literal or the
expression text verbatim, so it serializes back exactly as written, and
evaluation is an explicit call against a parameter mapping.

## Grammar

```text
or_expr    := and_expr (("or" | "||") and_expr)*
and_expr   := not_expr (("and" | "&&") not_expr)*
not_expr   := ("not" | "!") not_expr | comparison
comparison := arith (("==" | "!=" | "<=" | ">=" | "<" | ">") arith)?
arith      := term (("+" | "-") term)*
term       := factor (("*" | "/" | "//" | "%") factor)*
factor     := ("-" | "+") factor | power
power      := atom ("**" factor)?
atom       := number | "(" or_expr ")" | name "(" args ")" | name
```

```rust
use neuromllite_base::expression::evaluate;
use serde_json::json;

let params = json!({"x": 3, "scale": "2*x"});
let params = params.as_object().unwrap();
assert_eq!(evaluate("2*x", params).unwrap().as_f64(), 6.0);
assert_eq!(evaluate("scale + 1", params).unwrap().as_f64(), 7.0);
assert!(evaluate("y", params).is_err());
```
*/

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::{all_consuming, map, map_res, not, opt, recognize, value},
    error::{ErrorKind, ParseError, VerboseError, VerboseErrorKind},
    multi::{many0, separated_list0},
    number::complete::recognize_float,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};
use serde_json::{Map, Value};
use std::cell::Cell;
use std::fmt;

use crate::error::{ModelError, ModelResult};

/// Parameter mapping expressions are evaluated against
pub type Parameters = Map<String, Value>;

/// How deep string-valued parameters may refer to further parameters
const MAX_PARAMETER_DEPTH: usize = 32;

/// Bound on parser recursion (brackets, unary operators, exponent chains)
const MAX_NESTING: usize = 128;

/// A literal value or an unevaluated expression string
#[derive(Debug, Clone)]
pub enum EvaluableExpression {
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Expression text, stored verbatim
    Text(String),
    /// Mappings and sequences, kept as given but not evaluable
    Structured(Value),
}

/// Result of evaluating an expression
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EvaluatedValue {
    Number(f64),
    Bool(bool),
}

impl EvaluatedValue {
    /// Numeric view; booleans count as 1 and 0
    pub fn as_f64(&self) -> f64 {
        match self {
            EvaluatedValue::Number(n) => *n,
            EvaluatedValue::Bool(true) => 1.0,
            EvaluatedValue::Bool(false) => 0.0,
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            EvaluatedValue::Number(n) => *n != 0.0,
            EvaluatedValue::Bool(b) => *b,
        }
    }

    /// The value as a non-negative whole number, e.g. for counts
    pub fn as_count(&self) -> Option<usize> {
        let n = self.as_f64();
        if n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n < usize::MAX as f64 {
            Some(n as usize)
        } else {
            None
        }
    }
}

impl fmt::Display for EvaluatedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluatedValue::Number(n) => write!(f, "{}", n),
            EvaluatedValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl EvaluableExpression {
    /// Build from a structured-text value; strings become expression text
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Bool(b) => EvaluableExpression::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => EvaluableExpression::Int(i),
                None => EvaluableExpression::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => EvaluableExpression::Text(s.clone()),
            other => EvaluableExpression::Structured(other.clone()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            EvaluableExpression::Int(i) => Value::from(*i),
            EvaluableExpression::Float(f) => {
                serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number)
            }
            EvaluableExpression::Bool(b) => Value::Bool(*b),
            EvaluableExpression::Text(s) => Value::String(s.clone()),
            EvaluableExpression::Structured(v) => v.clone(),
        }
    }

    /// True for numeric and boolean literals
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            EvaluableExpression::Int(_) | EvaluableExpression::Float(_) | EvaluableExpression::Bool(_)
        )
    }

    /// Evaluate against a parameter mapping
    pub fn evaluate(&self, parameters: &Parameters) -> ModelResult<EvaluatedValue> {
        match self {
            EvaluableExpression::Int(i) => Ok(EvaluatedValue::Number(*i as f64)),
            EvaluableExpression::Float(f) => Ok(EvaluatedValue::Number(*f)),
            EvaluableExpression::Bool(b) => Ok(EvaluatedValue::Bool(*b)),
            EvaluableExpression::Text(text) => evaluate(text, parameters),
            EvaluableExpression::Structured(v) => Err(ModelError::evaluation(
                &v.to_string(),
                "mappings and sequences are not evaluable",
            )),
        }
    }

    pub fn evaluate_f64(&self, parameters: &Parameters) -> ModelResult<f64> {
        self.evaluate(parameters).map(|v| v.as_f64())
    }

    /// Equality under a parameter context
    ///
    /// Two expressions are equal if they evaluate to the same value; when
    /// either side cannot be evaluated the literal comparison is used.
    pub fn eq_in(&self, other: &EvaluableExpression, parameters: &Parameters) -> bool {
        match (self.evaluate(parameters), other.evaluate(parameters)) {
            (Ok(a), Ok(b)) => a == b || a.as_f64() == b.as_f64(),
            _ => self == other,
        }
    }
}

// Context-free equality: numeric literals compare by value, text by string
impl PartialEq for EvaluableExpression {
    fn eq(&self, other: &Self) -> bool {
        use EvaluableExpression::*;
        match (self, other) {
            (Int(a), Int(b)) => a == b,
            (Int(a), Float(b)) | (Float(b), Int(a)) => (*a as f64) == *b,
            (Float(a), Float(b)) => a == b,
            (Bool(a), Bool(b)) => a == b,
            (Text(a), Text(b)) => a == b,
            (Structured(a), Structured(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for EvaluableExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluableExpression::Int(i) => write!(f, "{}", i),
            EvaluableExpression::Float(v) => write!(f, "{:?}", v),
            EvaluableExpression::Bool(b) => write!(f, "{}", b),
            EvaluableExpression::Text(s) => write!(f, "{}", s),
            EvaluableExpression::Structured(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for EvaluableExpression {
    fn from(v: i64) -> Self {
        EvaluableExpression::Int(v)
    }
}

impl From<i32> for EvaluableExpression {
    fn from(v: i32) -> Self {
        EvaluableExpression::Int(v as i64)
    }
}

impl From<f64> for EvaluableExpression {
    fn from(v: f64) -> Self {
        EvaluableExpression::Float(v)
    }
}

impl From<bool> for EvaluableExpression {
    fn from(v: bool) -> Self {
        EvaluableExpression::Bool(v)
    }
}

impl From<&str> for EvaluableExpression {
    fn from(v: &str) -> Self {
        EvaluableExpression::Text(v.to_string())
    }
}

impl From<String> for EvaluableExpression {
    fn from(v: String) -> Self {
        EvaluableExpression::Text(v)
    }
}

/// Evaluate expression text against a parameter mapping
///
/// Names resolve to parameters; a string-valued parameter is evaluated as an
/// expression in turn. Fails with [`ModelError::Evaluation`] on malformed
/// syntax, unresolved names, unknown functions and domain errors.
pub fn evaluate(expression: &str, parameters: &Parameters) -> ModelResult<EvaluatedValue> {
    evaluate_at_depth(expression, parameters, 0)
}

fn evaluate_at_depth(
    expression: &str,
    parameters: &Parameters,
    depth: usize,
) -> ModelResult<EvaluatedValue> {
    let ast = parse(expression)?;
    let evaluator = Evaluator {
        text: expression,
        parameters,
        depth,
    };
    evaluator.eval(&ast)
}

// ============================================================================
// AST
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Bool(bool),
    Var(String),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

impl Expr {
    fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }
}

// ============================================================================
// Parser
// ============================================================================

type PResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

fn parse(text: &str) -> ModelResult<Expr> {
    match all_consuming(ws(or_expr))(text) {
        Ok((_, expr)) => Ok(expr),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e))
            if e.errors
                .iter()
                .any(|(_, kind)| *kind == VerboseErrorKind::Nom(ErrorKind::TooLarge)) =>
        {
            Err(ModelError::evaluation(
                text,
                format!("expression nested deeper than {} levels", MAX_NESTING),
            ))
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let position = e
                .errors
                .first()
                .map(|(rest, _)| text.len() - rest.len())
                .unwrap_or(0);
            Err(ModelError::evaluation(
                text,
                format!("malformed expression near position {}", position),
            ))
        }
        Err(nom::Err::Incomplete(_)) => Err(ModelError::evaluation(text, "incomplete expression")),
    }
}

thread_local! {
    static NESTING: Cell<usize> = const { Cell::new(0) };
}

/// Holds one level of parser nesting until dropped
struct NestingGuard;

impl NestingGuard {
    fn enter(input: &str) -> Result<Self, nom::Err<VerboseError<&str>>> {
        let depth = NESTING.with(|n| {
            n.set(n.get() + 1);
            n.get()
        });
        let guard = NestingGuard;
        if depth > MAX_NESTING {
            return Err(nom::Err::Failure(VerboseError::from_error_kind(
                input,
                ErrorKind::TooLarge,
            )));
        }
        Ok(guard)
    }
}

impl Drop for NestingGuard {
    fn drop(&mut self) {
        NESTING.with(|n| n.set(n.get().saturating_sub(1)));
    }
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    F: FnMut(&'a str) -> PResult<'a, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// A word operator that is not the prefix of a longer name
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    terminated(tag(word), not(alt((alphanumeric1, tag("_")))))
}

fn identifier<'a>(input: &'a str) -> PResult<'a, &'a str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

fn or_expr<'a>(input: &'a str) -> PResult<'a, Expr> {
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(preceded(ws(alt((keyword("or"), tag("||")))), and_expr))(input)?;
    Ok((
        input,
        rest.into_iter()
            .fold(first, |acc, rhs| Expr::binary(BinaryOp::Or, acc, rhs)),
    ))
}

fn and_expr<'a>(input: &'a str) -> PResult<'a, Expr> {
    let (input, first) = not_expr(input)?;
    let (input, rest) = many0(preceded(ws(alt((keyword("and"), tag("&&")))), not_expr))(input)?;
    Ok((
        input,
        rest.into_iter()
            .fold(first, |acc, rhs| Expr::binary(BinaryOp::And, acc, rhs)),
    ))
}

fn not_expr<'a>(input: &'a str) -> PResult<'a, Expr> {
    let _guard = NestingGuard::enter(input)?;
    alt((
        map(
            preceded(
                ws(alt((keyword("not"), terminated(tag("!"), not(char('=')))))),
                not_expr,
            ),
            |e| Expr::Not(Box::new(e)),
        ),
        comparison,
    ))(input)
}

fn comparison_op<'a>(input: &'a str) -> PResult<'a, BinaryOp> {
    alt((
        value(BinaryOp::Eq, tag("==")),
        value(BinaryOp::Ne, tag("!=")),
        value(BinaryOp::Le, tag("<=")),
        value(BinaryOp::Ge, tag(">=")),
        value(BinaryOp::Lt, tag("<")),
        value(BinaryOp::Gt, tag(">")),
    ))(input)
}

fn comparison<'a>(input: &'a str) -> PResult<'a, Expr> {
    let (input, lhs) = arith(input)?;
    let (input, rhs) = opt(pair(ws(comparison_op), arith))(input)?;
    Ok((
        input,
        match rhs {
            Some((op, rhs)) => Expr::binary(op, lhs, rhs),
            None => lhs,
        },
    ))
}

fn arith<'a>(input: &'a str) -> PResult<'a, Expr> {
    let (input, first) = term(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            value(BinaryOp::Add, char('+')),
            value(BinaryOp::Sub, char('-')),
        ))),
        term,
    ))(input)?;
    Ok((
        input,
        rest.into_iter()
            .fold(first, |acc, (op, rhs)| Expr::binary(op, acc, rhs)),
    ))
}

fn term<'a>(input: &'a str) -> PResult<'a, Expr> {
    let (input, first) = factor(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            value(BinaryOp::Mul, terminated(char('*'), not(char('*')))),
            value(BinaryOp::FloorDiv, tag("//")),
            value(BinaryOp::Div, char('/')),
            value(BinaryOp::Mod, char('%')),
        ))),
        factor,
    ))(input)?;
    Ok((
        input,
        rest.into_iter()
            .fold(first, |acc, (op, rhs)| Expr::binary(op, acc, rhs)),
    ))
}

fn factor<'a>(input: &'a str) -> PResult<'a, Expr> {
    let _guard = NestingGuard::enter(input)?;
    alt((
        map(preceded(ws(char('-')), factor), |e| Expr::Neg(Box::new(e))),
        preceded(ws(char('+')), factor),
        power,
    ))(input)
}

fn power<'a>(input: &'a str) -> PResult<'a, Expr> {
    let (input, base) = atom(input)?;
    let (input, exponent) = opt(preceded(ws(tag("**")), factor))(input)?;
    Ok((
        input,
        match exponent {
            Some(exponent) => Expr::binary(BinaryOp::Pow, base, exponent),
            None => base,
        },
    ))
}

fn atom<'a>(input: &'a str) -> PResult<'a, Expr> {
    ws(alt((
        map_res(recognize_float, |s: &str| s.parse::<f64>().map(Expr::Number)),
        delimited(char('('), or_expr, ws(char(')'))),
        call_or_name,
    )))(input)
}

fn call_or_name<'a>(input: &'a str) -> PResult<'a, Expr> {
    let (input, name) = identifier(input)?;
    let (input, args) = opt(delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), or_expr),
        ws(char(')')),
    ))(input)?;
    let expr = match args {
        Some(args) => Expr::Call(name.to_string(), args),
        None => match name {
            "True" | "true" => Expr::Bool(true),
            "False" | "false" => Expr::Bool(false),
            _ => Expr::Var(name.to_string()),
        },
    };
    Ok((input, expr))
}

// ============================================================================
// Evaluation
// ============================================================================

struct Evaluator<'a> {
    text: &'a str,
    parameters: &'a Parameters,
    depth: usize,
}

impl<'a> Evaluator<'a> {
    fn fail(&self, reason: impl Into<String>) -> ModelError {
        ModelError::evaluation(self.text, reason)
    }

    fn eval(&self, expr: &Expr) -> ModelResult<EvaluatedValue> {
        match expr {
            Expr::Number(n) => Ok(EvaluatedValue::Number(*n)),
            Expr::Bool(b) => Ok(EvaluatedValue::Bool(*b)),
            Expr::Var(name) => self.lookup(name),
            Expr::Neg(inner) => Ok(EvaluatedValue::Number(-self.eval(inner)?.as_f64())),
            Expr::Not(inner) => Ok(EvaluatedValue::Bool(!self.eval(inner)?.truthy())),
            Expr::Binary(BinaryOp::And, lhs, rhs) => {
                let lhs = self.eval(lhs)?.truthy();
                Ok(EvaluatedValue::Bool(lhs && self.eval(rhs)?.truthy()))
            }
            Expr::Binary(BinaryOp::Or, lhs, rhs) => {
                let lhs = self.eval(lhs)?.truthy();
                Ok(EvaluatedValue::Bool(lhs || self.eval(rhs)?.truthy()))
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                self.apply(*op, lhs, rhs)
            }
            Expr::Call(name, args) => {
                let args = args
                    .iter()
                    .map(|a| self.eval(a).map(|v| v.as_f64()))
                    .collect::<ModelResult<Vec<f64>>>()?;
                self.call(name, &args)
            }
        }
    }

    fn lookup(&self, name: &str) -> ModelResult<EvaluatedValue> {
        match self.parameters.get(name) {
            None => Err(self.fail(format!("unresolved name '{}'", name))),
            Some(Value::Bool(b)) => Ok(EvaluatedValue::Bool(*b)),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(EvaluatedValue::Number)
                .ok_or_else(|| self.fail(format!("parameter '{}' is not a finite number", name))),
            Some(Value::String(text)) => {
                if self.depth >= MAX_PARAMETER_DEPTH {
                    return Err(self.fail(format!(
                        "parameter '{}' is nested too deeply (circular reference?)",
                        name
                    )));
                }
                evaluate_at_depth(text, self.parameters, self.depth + 1)
            }
            Some(_) => Err(self.fail(format!("parameter '{}' is not a scalar", name))),
        }
    }

    fn apply(
        &self,
        op: BinaryOp,
        lhs: EvaluatedValue,
        rhs: EvaluatedValue,
    ) -> ModelResult<EvaluatedValue> {
        use EvaluatedValue::{Bool, Number};

        if let (Bool(a), Bool(b)) = (lhs, rhs) {
            match op {
                BinaryOp::Eq => return Ok(Bool(a == b)),
                BinaryOp::Ne => return Ok(Bool(a != b)),
                _ => {}
            }
        }

        let (a, b) = (lhs.as_f64(), rhs.as_f64());
        let result = match op {
            BinaryOp::Add => Number(a + b),
            BinaryOp::Sub => Number(a - b),
            BinaryOp::Mul => Number(a * b),
            BinaryOp::Div => {
                if b == 0.0 {
                    return Err(self.fail("division by zero"));
                }
                Number(a / b)
            }
            BinaryOp::FloorDiv => {
                if b == 0.0 {
                    return Err(self.fail("division by zero"));
                }
                Number((a / b).floor())
            }
            BinaryOp::Mod => {
                if b == 0.0 {
                    return Err(self.fail("modulo by zero"));
                }
                // Result takes the sign of the divisor
                Number(a - b * (a / b).floor())
            }
            BinaryOp::Pow => Number(a.powf(b)),
            BinaryOp::Eq => Bool(a == b),
            BinaryOp::Ne => Bool(a != b),
            BinaryOp::Lt => Bool(a < b),
            BinaryOp::Le => Bool(a <= b),
            BinaryOp::Gt => Bool(a > b),
            BinaryOp::Ge => Bool(a >= b),
            BinaryOp::And | BinaryOp::Or => unreachable!("logical operators short-circuit in eval"),
        };

        match result {
            Number(n) if n.is_nan() => Err(self.fail("math domain error")),
            other => Ok(other),
        }
    }

    fn call(&self, name: &str, args: &[f64]) -> ModelResult<EvaluatedValue> {
        let unary = |f: fn(f64) -> f64| -> ModelResult<f64> {
            match args {
                [x] => Ok(f(*x)),
                _ => Err(self.fail(format!(
                    "{}() takes exactly one argument ({} given)",
                    name,
                    args.len()
                ))),
            }
        };

        let result = match name {
            "sin" => unary(f64::sin)?,
            "cos" => unary(f64::cos)?,
            "tan" => unary(f64::tan)?,
            "asin" => unary(f64::asin)?,
            "acos" => unary(f64::acos)?,
            "atan" => unary(f64::atan)?,
            "exp" => unary(f64::exp)?,
            "log10" => unary(f64::log10)?,
            "sqrt" => unary(f64::sqrt)?,
            "abs" => unary(f64::abs)?,
            "floor" => unary(f64::floor)?,
            "ceil" => unary(f64::ceil)?,
            "int" => unary(f64::trunc)?,
            "float" => unary(|x| x)?,
            "round" => unary(round_half_even)?,
            "log" => match args {
                [x] => x.ln(),
                [x, base] => x.ln() / base.ln(),
                _ => return Err(self.fail("log() takes one or two arguments")),
            },
            "pow" => match args {
                [x, y] => x.powf(*y),
                _ => return Err(self.fail("pow() takes exactly two arguments")),
            },
            "min" | "max" => {
                if args.is_empty() {
                    return Err(self.fail(format!("{}() expects at least one argument", name)));
                }
                let fold: fn(f64, f64) -> f64 = if name == "min" { f64::min } else { f64::max };
                args[1..].iter().fold(args[0], |acc, x| fold(acc, *x))
            }
            _ => return Err(self.fail(format!("unknown function '{}'", name))),
        };

        if result.is_nan() {
            return Err(self.fail("math domain error"));
        }
        Ok(EvaluatedValue::Number(result))
    }
}

/// Round to nearest, ties to even
fn round_half_even(x: f64) -> f64 {
    if (x - x.trunc()).abs() == 0.5 {
        2.0 * (x / 2.0).round()
    } else {
        x.round()
    }
}
