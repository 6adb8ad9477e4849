//! Restricted expression language for hidden-dependency rules.
//!
//! Rules are stored as data, so their condition and quantity expressions are
//! evaluated by this small interpreter instead of anything general purpose.
//! The grammar, lowest precedence first:
//!
//! ```text
//! expr     := coalesce
//! coalesce := or ("??" or)*
//! or       := and ("||" and)*
//! and      := cmp ("&&" cmp)*
//! cmp      := sum (("==" | "!=" | "<" | "<=" | ">" | ">=") sum)?
//! sum      := term (("+" | "-") term)*
//! term     := unary (("*" | "/" | "%") unary)*
//! unary    := ("!" | "-") unary | primary
//! primary  := NUMBER | STRING | true | false | null | path | "(" expr ")"
//! path     := IDENT ("." IDENT)*
//! ```
//!
//! Paths are looked up in the resource metadata; a leading `metadata.`
//! segment is optional and missing fields evaluate to `null`. Strings that
//! look like numbers are coerced when used in arithmetic or ordering.

use std::cmp::Ordering;

use stratus_diagram::Metadata;
use winnow::{
    ascii::{digit1, multispace0},
    combinator::{alt, cut_err, delimited, opt, preceded, repeat, terminated},
    error::{ModalResult, StrContext, StrContextValue},
    token::{any, none_of, one_of, take_while},
    Parser as _,
};

use crate::error::{CoreError, CoreResult};

/// Upper bound on a quantity expression result.
pub const MAX_QUANTITY: u32 = 256;

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Value {
    fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::String(s.clone()),
            other => Value::String(other.to_string()),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
        }
    }

    /// Numeric view of the value, coercing numeric strings.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinaryOp {
    Coalesce,
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Coalesce => "??",
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Field(Vec<String>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

type Input<'a> = &'a str;

/// Parse an unsigned decimal number such as `3` or `1.5`.
fn number(input: &mut Input<'_>) -> ModalResult<f64> {
    (digit1, opt(('.', digit1)))
        .take()
        .parse_to()
        .context(StrContext::Label("number"))
        .parse_next(input)
}

fn quote_mark(input: &mut Input<'_>) -> ModalResult<char> {
    one_of(['"', '\'']).parse_next(input)
}

/// Parse a single or double quoted string, with backslash escapes.
fn string_literal(input: &mut Input<'_>) -> ModalResult<String> {
    let quote = quote_mark.parse_next(input)?;

    cut_err(terminated(
        repeat(0.., alt((preceded('\\', any), none_of([quote, '\\'])))).fold(
            String::new,
            |mut acc, ch| {
                acc.push(ch);
                acc
            },
        ),
        quote,
    ))
    .context(StrContext::Label("string literal"))
    .parse_next(input)
}

fn identifier<'a>(input: &mut Input<'a>) -> ModalResult<&'a str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .context(StrContext::Label("identifier"))
        .parse_next(input)
}

/// Parse a keyword literal or a dotted field path.
fn path_or_keyword(input: &mut Input<'_>) -> ModalResult<Expr> {
    let head = identifier.parse_next(input)?;

    let expr = match head {
        "true" => Expr::Literal(Value::Bool(true)),
        "false" => Expr::Literal(Value::Bool(false)),
        "null" => Expr::Literal(Value::Null),
        _ => {
            let rest: Vec<&str> = repeat(
                0..,
                preceded((multispace0, '.', multispace0), cut_err(identifier)),
            )
            .parse_next(input)?;

            let mut path = vec![head.to_string()];
            path.extend(rest.into_iter().map(str::to_string));
            Expr::Field(path)
        }
    };

    Ok(expr)
}

fn parenthesized(input: &mut Input<'_>) -> ModalResult<Expr> {
    delimited(
        '(',
        cut_err(coalesce),
        cut_err(preceded(multispace0, ')')).context(StrContext::Expected(StrContextValue::CharLiteral(')'))),
    )
    .parse_next(input)
}

fn primary(input: &mut Input<'_>) -> ModalResult<Expr> {
    preceded(
        multispace0,
        alt((
            number.map(|n| Expr::Literal(Value::Number(n))),
            string_literal.map(|s| Expr::Literal(Value::String(s))),
            path_or_keyword,
            parenthesized,
        )),
    )
    .context(StrContext::Label("operand"))
    .parse_next(input)
}

fn unary_operator(input: &mut Input<'_>) -> ModalResult<UnaryOp> {
    alt(('!'.value(UnaryOp::Not), '-'.value(UnaryOp::Neg))).parse_next(input)
}

fn unary(input: &mut Input<'_>) -> ModalResult<Expr> {
    match opt(preceded(multispace0, unary_operator)).parse_next(input)? {
        Some(op) => {
            let operand = cut_err(unary).parse_next(input)?;
            Ok(Expr::Unary(op, Box::new(operand)))
        }
        None => primary(input),
    }
}

/// Left-associative chain of `operand (operator operand)*`.
fn binary_chain(
    input: &mut Input<'_>,
    operator: fn(&mut Input<'_>) -> ModalResult<BinaryOp>,
    operand: fn(&mut Input<'_>) -> ModalResult<Expr>,
) -> ModalResult<Expr> {
    let mut left = operand(input)?;
    while let Some(op) = opt(preceded(multispace0, operator)).parse_next(input)? {
        let right = cut_err(operand).parse_next(input)?;
        left = Expr::Binary(op, Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn term_operator(input: &mut Input<'_>) -> ModalResult<BinaryOp> {
    alt((
        '*'.value(BinaryOp::Mul),
        '/'.value(BinaryOp::Div),
        '%'.value(BinaryOp::Rem),
    ))
    .parse_next(input)
}

fn term(input: &mut Input<'_>) -> ModalResult<Expr> {
    binary_chain(input, term_operator, unary)
}

fn sum_operator(input: &mut Input<'_>) -> ModalResult<BinaryOp> {
    alt(('+'.value(BinaryOp::Add), '-'.value(BinaryOp::Sub))).parse_next(input)
}

fn sum(input: &mut Input<'_>) -> ModalResult<Expr> {
    binary_chain(input, sum_operator, term)
}

fn comparison_operator(input: &mut Input<'_>) -> ModalResult<BinaryOp> {
    alt((
        "==".value(BinaryOp::Eq),
        "!=".value(BinaryOp::Ne),
        "<=".value(BinaryOp::Le),
        ">=".value(BinaryOp::Ge),
        "<".value(BinaryOp::Lt),
        ">".value(BinaryOp::Gt),
    ))
    .parse_next(input)
}

/// Comparisons do not chain: `a < b < c` is rejected.
fn comparison(input: &mut Input<'_>) -> ModalResult<Expr> {
    let left = sum(input)?;
    match opt(preceded(multispace0, comparison_operator)).parse_next(input)? {
        Some(op) => {
            let right = cut_err(sum).parse_next(input)?;
            Ok(Expr::Binary(op, Box::new(left), Box::new(right)))
        }
        None => Ok(left),
    }
}

fn and_operator(input: &mut Input<'_>) -> ModalResult<BinaryOp> {
    "&&".value(BinaryOp::And).parse_next(input)
}

fn and(input: &mut Input<'_>) -> ModalResult<Expr> {
    binary_chain(input, and_operator, comparison)
}

fn or_operator(input: &mut Input<'_>) -> ModalResult<BinaryOp> {
    "||".value(BinaryOp::Or).parse_next(input)
}

fn or(input: &mut Input<'_>) -> ModalResult<Expr> {
    binary_chain(input, or_operator, and)
}

fn coalesce_operator(input: &mut Input<'_>) -> ModalResult<BinaryOp> {
    "??".value(BinaryOp::Coalesce).parse_next(input)
}

fn coalesce(input: &mut Input<'_>) -> ModalResult<Expr> {
    binary_chain(input, coalesce_operator, or)
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    ast: Expr,
}

impl Expression {
    /// Parse an expression.
    pub fn parse(source: &str) -> CoreResult<Self> {
        let ast = terminated(coalesce, multispace0).parse(source).map_err(|e| {
            let reason = e.inner().to_string();
            let reason = if reason.is_empty() {
                "unexpected input".to_string()
            } else {
                reason
            };
            CoreError::expression(source, format!("{} at offset {}", reason, e.offset()))
        })?;

        Ok(Self {
            source: source.to_string(),
            ast,
        })
    }

    /// The source text of the expression.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against resource metadata.
    pub fn evaluate(&self, metadata: &Metadata) -> CoreResult<Value> {
        eval(&self.ast, metadata).map_err(|e| CoreError::expression(&self.source, e))
    }

    /// Evaluate and interpret the result by truthiness.
    pub fn evaluate_bool(&self, metadata: &Metadata) -> CoreResult<bool> {
        Ok(self.evaluate(metadata)?.is_truthy())
    }

    /// Evaluate to a non-negative integer count.
    pub fn evaluate_quantity(&self, metadata: &Metadata) -> CoreResult<u32> {
        let value = self.evaluate(metadata)?;
        let number = value.as_number().ok_or_else(|| {
            CoreError::expression(&self.source, format!("expected a number, got {}", value))
        })?;

        if !number.is_finite() || number < 0.0 || number.fract() != 0.0 {
            return Err(CoreError::expression(
                &self.source,
                format!("quantity must be a non-negative integer, got {}", number),
            ));
        }
        if number > f64::from(MAX_QUANTITY) {
            return Err(CoreError::expression(
                &self.source,
                format!("quantity {} exceeds the limit of {}", number, MAX_QUANTITY),
            ));
        }

        Ok(number as u32)
    }
}

fn lookup(metadata: &Metadata, path: &[String]) -> Value {
    let path = match path {
        [first, rest @ ..] if first == "metadata" && !rest.is_empty() => rest,
        other => other,
    };

    let Some((first, rest)) = path.split_first() else {
        return Value::Null;
    };
    let mut current = match metadata.get(first) {
        Some(value) => value,
        None => return Value::Null,
    };
    for segment in rest {
        current = match current.get(segment) {
            Some(value) => value,
            None => return Value::Null,
        };
    }
    Value::from_json(current)
}

fn eval(expr: &Expr, metadata: &Metadata) -> Result<Value, String> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Field(path) => Ok(lookup(metadata, path)),
        Expr::Unary(UnaryOp::Not, inner) => Ok(Value::Bool(!eval(inner, metadata)?.is_truthy())),
        Expr::Unary(UnaryOp::Neg, inner) => {
            let value = eval(inner, metadata)?;
            value
                .as_number()
                .map(|n| Value::Number(-n))
                .ok_or_else(|| format!("cannot negate {}", value.type_name()))
        }
        Expr::Binary(BinaryOp::Coalesce, left, right) => match eval(left, metadata)? {
            Value::Null => eval(right, metadata),
            value => Ok(value),
        },
        Expr::Binary(BinaryOp::Or, left, right) => {
            if eval(left, metadata)?.is_truthy() {
                Ok(Value::Bool(true))
            } else {
                Ok(Value::Bool(eval(right, metadata)?.is_truthy()))
            }
        }
        Expr::Binary(BinaryOp::And, left, right) => {
            if !eval(left, metadata)?.is_truthy() {
                Ok(Value::Bool(false))
            } else {
                Ok(Value::Bool(eval(right, metadata)?.is_truthy()))
            }
        }
        Expr::Binary(op, left, right) => {
            let left = eval(left, metadata)?;
            let right = eval(right, metadata)?;
            apply(*op, &left, &right)
        }
    }
}

fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(_), _) | (_, Value::Number(_)) => match (left.as_number(), right.as_number()) {
            (Some(l), Some(r)) => l == r,
            _ => false,
        },
        _ => left == right,
    }
}

fn compare(left: &Value, right: &Value) -> Result<Option<Ordering>, String> {
    if matches!(left, Value::Null) || matches!(right, Value::Null) {
        return Ok(None);
    }
    if let (Value::String(l), Value::String(r)) = (left, right) {
        if l.trim().parse::<f64>().is_err() || r.trim().parse::<f64>().is_err() {
            return Ok(Some(l.cmp(r)));
        }
    }
    match (left.as_number(), right.as_number()) {
        (Some(l), Some(r)) => Ok(l.partial_cmp(&r)),
        _ => Err(format!(
            "cannot order {} and {}",
            left.type_name(),
            right.type_name()
        )),
    }
}

fn apply(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, String> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(loosely_equal(left, right))),
        BinaryOp::Ne => Ok(Value::Bool(!loosely_equal(left, right))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let result = match compare(left, right)? {
                None => false,
                Some(ordering) => match op {
                    BinaryOp::Lt => ordering == Ordering::Less,
                    BinaryOp::Le => ordering != Ordering::Greater,
                    BinaryOp::Gt => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                },
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            if let (BinaryOp::Add, Value::String(l), Value::String(r)) = (op, left, right) {
                if l.trim().parse::<f64>().is_err() || r.trim().parse::<f64>().is_err() {
                    return Ok(Value::String(format!("{}{}", l, r)));
                }
            }
            let (l, r) = match (left.as_number(), right.as_number()) {
                (Some(l), Some(r)) => (l, r),
                _ => {
                    return Err(format!(
                        "cannot apply '{}' to {} and {}",
                        op.symbol(),
                        left.type_name(),
                        right.type_name()
                    ))
                }
            };
            match op {
                BinaryOp::Add => Ok(Value::Number(l + r)),
                BinaryOp::Sub => Ok(Value::Number(l - r)),
                BinaryOp::Mul => Ok(Value::Number(l * r)),
                BinaryOp::Div | BinaryOp::Rem if r == 0.0 => Err("division by zero".to_string()),
                BinaryOp::Div => Ok(Value::Number(l / r)),
                _ => Ok(Value::Number(l % r)),
            }
        }
        BinaryOp::Coalesce | BinaryOp::Or | BinaryOp::And => {
            Err(format!("operator '{}' evaluated eagerly", op.symbol()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(value: serde_json::Value) -> Metadata {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_field_lookup_with_and_without_prefix() {
        let md = metadata(json!({"size_gb": 100, "tier": {"name": "gold"}}));

        let a = Expression::parse("metadata.size_gb").unwrap();
        let b = Expression::parse("size_gb").unwrap();
        let nested = Expression::parse("metadata.tier.name").unwrap();

        assert_eq!(a.evaluate(&md).unwrap(), Value::Number(100.0));
        assert_eq!(b.evaluate(&md).unwrap(), Value::Number(100.0));
        assert_eq!(nested.evaluate(&md).unwrap(), Value::String("gold".into()));
    }

    #[test]
    fn test_missing_field_is_null() {
        let expr = Expression::parse("metadata.missing").unwrap();
        assert_eq!(expr.evaluate(&Metadata::new()).unwrap(), Value::Null);
    }

    #[test]
    fn test_precedence() {
        let expr = Expression::parse("1 + 2 * 3 == 7 && !(2 > 3)").unwrap();
        assert!(expr.evaluate_bool(&Metadata::new()).unwrap());
    }

    #[test]
    fn test_numeric_string_coercion() {
        let md = metadata(json!({"count": "3"}));
        let expr = Expression::parse("metadata.count * 2").unwrap();
        assert_eq!(expr.evaluate_quantity(&md).unwrap(), 6);

        let cmp = Expression::parse("metadata.count >= 3").unwrap();
        assert!(cmp.evaluate_bool(&md).unwrap());
    }

    #[test]
    fn test_coalesce_default() {
        let expr = Expression::parse("metadata.replicas ?? 1").unwrap();
        assert_eq!(expr.evaluate_quantity(&Metadata::new()).unwrap(), 1);
        assert_eq!(
            expr.evaluate_quantity(&metadata(json!({"replicas": 4}))).unwrap(),
            4
        );
    }

    #[test]
    fn test_string_equality() {
        let md = metadata(json!({"engine": "postgres"}));
        let expr = Expression::parse("metadata.engine == 'postgres' || metadata.engine == \"mysql\"").unwrap();
        assert!(expr.evaluate_bool(&md).unwrap());
    }

    #[test]
    fn test_escaped_quote_and_whitespace() {
        let md = metadata(json!({"name": "it's"}));
        let expr = Expression::parse("  metadata . name == 'it\\'s'  ").unwrap();
        assert!(expr.evaluate_bool(&md).unwrap());
    }

    #[test]
    fn test_parse_error_reports_offset() {
        let err = Expression::parse("1 + )").unwrap_err();
        assert!(err.to_string().contains("offset"), "got: {}", err);
    }

    #[test]
    fn test_null_comparison_is_false() {
        let expr = Expression::parse("metadata.extra_gb > 0").unwrap();
        assert!(!expr.evaluate_bool(&Metadata::new()).unwrap());
    }

    #[test]
    fn test_quantity_rejects_fraction_and_negative() {
        let md = Metadata::new();
        assert!(Expression::parse("1.5").unwrap().evaluate_quantity(&md).is_err());
        assert!(Expression::parse("-1").unwrap().evaluate_quantity(&md).is_err());
        assert!(Expression::parse("1000").unwrap().evaluate_quantity(&md).is_err());
    }

    #[test]
    fn test_division_by_zero() {
        let err = Expression::parse("4 / 0").unwrap().evaluate(&Metadata::new()).unwrap_err();
        assert!(err.to_string().contains("division by zero"));
    }

    #[test]
    fn test_parse_errors() {
        for source in ["", "1 +", "(1", "a.", "1 2", "@", "'open", "1 < 2 < 3", "!= 1"] {
            assert!(Expression::parse(source).is_err(), "expected error for {:?}", source);
        }
    }
}
