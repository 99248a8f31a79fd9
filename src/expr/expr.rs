// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use crate::expr::errors::EvalError;
use crate::expr::lexer::{Token, TokenKind};
use crate::{Context, Number, Value};
use std::cmp::Ordering;

/// The name environment an expression evaluates against.
///
/// The renderer supplies an implementation that resolves context names and
/// the `render`/`list`/`ctx` built-ins; a bare [`Context`] works for plain
/// value lookups.
pub trait Env {
    /// Resolves `name` to a value, or `None` when it is unbound.
    fn lookup(&self, name: &str) -> Option<Value>;

    /// Calls the named callable with the given arguments.
    ///
    /// Only built-ins are callable; the default implementation rejects
    /// everything.
    fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        let _ = args;
        Err(EvalError::NotCallable(format!("{:?}", name)))
    }
}

impl Env for Context {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// Unary operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// `+x`
    Pos,
    /// `-x`
    Neg,
    /// `not x`
    Not,
}

/// Binary operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum BinaryOp {
    Dot,
    Pow,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Add,
    Sub,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    In,
    NotIn,
    And,
    Or,
    Assign,
}

/// An expression AST node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A number, string or identifier token.
    Literal(Token),
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// The left operand.
        lhs: Box<Expr>,
        /// The right operand.
        rhs: Box<Expr>,
    },
    /// `body if cond else orelse`.
    IfElse {
        /// The value when the condition holds.
        body: Box<Expr>,
        /// The condition.
        cond: Box<Expr>,
        /// The value when the condition fails.
        orelse: Box<Expr>,
    },
    /// A call, `callee(args...)`. Only built-ins are callable.
    Call {
        /// The callee expression.
        callee: Box<Expr>,
        /// The argument expressions, in order.
        args: Vec<Expr>,
    },
    /// An index access, `base[index]`.
    Index {
        /// The indexed expression.
        base: Box<Expr>,
        /// The index expression.
        index: Box<Expr>,
    },
}

impl Expr {
    /// Evaluates the expression against `env`.
    pub fn evaluate(&self, env: &mut dyn Env) -> Result<Value, EvalError> {
        match self {
            Expr::Literal(token) => evaluate_literal(token, env),
            Expr::Unary { op, operand } => {
                let value = operand.evaluate(env)?;
                evaluate_unary(*op, value)
            }
            Expr::Binary { op, lhs, rhs } => evaluate_binary(*op, lhs, rhs, env),
            Expr::IfElse { body, cond, orelse } => {
                if cond.evaluate(env)?.is_truthy() {
                    body.evaluate(env)
                } else {
                    orelse.evaluate(env)
                }
            }
            Expr::Call { callee, args } => {
                if let Expr::Literal(Token {
                    kind: TokenKind::Identifier(name),
                    ..
                }) = callee.as_ref()
                {
                    let mut values = Vec::with_capacity(args.len());
                    for arg in args {
                        values.push(arg.evaluate(env)?);
                    }
                    env.call(name, values)
                } else {
                    let value = callee.evaluate(env)?;
                    Err(EvalError::NotCallable(value.type_name().to_owned()))
                }
            }
            Expr::Index { base, index } => {
                let base = base.evaluate(env)?;
                let index = index.evaluate(env)?;
                evaluate_index(base, index)
            }
        }
    }
}

fn evaluate_literal(token: &Token, env: &mut dyn Env) -> Result<Value, EvalError> {
    match &token.kind {
        TokenKind::Number(text) => {
            if text.contains('.') {
                let float: f64 = text
                    .parse()
                    .map_err(|_| EvalError::Type(format!("invalid number literal {:?}", text)))?;
                Ok(Value::Number(Number::from(float)))
            } else if let Ok(int) = text.parse::<i64>() {
                Ok(Value::Number(Number::from(int)))
            } else if let Ok(int) = text.parse::<u64>() {
                Ok(Value::Number(Number::from(int)))
            } else {
                let float: f64 = text
                    .parse()
                    .map_err(|_| EvalError::Type(format!("invalid number literal {:?}", text)))?;
                Ok(Value::Number(Number::from(float)))
            }
        }
        TokenKind::Str { value, .. } => Ok(Value::String(value.clone())),
        TokenKind::Identifier(name) => env
            .lookup(name)
            .ok_or_else(|| EvalError::Name(name.clone())),
        _ => Err(EvalError::Type("unexpected token in expression".to_owned())),
    }
}

/// A number lowered out of [`Value`] for arithmetic.
#[derive(Copy, Clone)]
enum Num {
    Int(i64),
    Float(f64),
}

fn as_num(value: &Value) -> Option<Num> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(int) = n.as_i64() {
        Some(Num::Int(int))
    } else if let Some(int) = n.as_u64() {
        Some(Num::Float(int as f64))
    } else {
        n.as_f64().map(Num::Float)
    }
}

fn num_value(num: Num) -> Value {
    match num {
        Num::Int(int) => Value::Number(Number::from(int)),
        Num::Float(float) => Value::Number(Number::from(float)),
    }
}

fn as_f64(num: Num) -> f64 {
    match num {
        Num::Int(int) => int as f64,
        Num::Float(float) => float,
    }
}

fn evaluate_unary(op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        UnaryOp::Pos => match as_num(&value) {
            Some(_) => Ok(value),
            None => Err(EvalError::Type(format!(
                "bad operand type for unary +: {}",
                value.type_name()
            ))),
        },
        UnaryOp::Neg => match as_num(&value) {
            Some(Num::Int(int)) => match int.checked_neg() {
                Some(neg) => Ok(num_value(Num::Int(neg))),
                None => Ok(num_value(Num::Float(-(int as f64)))),
            },
            Some(Num::Float(float)) => Ok(num_value(Num::Float(-float))),
            None => Err(EvalError::Type(format!(
                "bad operand type for unary -: {}",
                value.type_name()
            ))),
        },
    }
}

fn evaluate_binary(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    env: &mut dyn Env,
) -> Result<Value, EvalError> {
    // Short-circuiting forms first; everything else evaluates both sides.
    match op {
        BinaryOp::And => {
            let left = lhs.evaluate(env)?;
            return if left.is_truthy() {
                rhs.evaluate(env)
            } else {
                Ok(left)
            };
        }
        BinaryOp::Or => {
            let left = lhs.evaluate(env)?;
            return if left.is_truthy() {
                Ok(left)
            } else {
                rhs.evaluate(env)
            };
        }
        BinaryOp::Assign => return Err(EvalError::Assignment),
        BinaryOp::Dot => {
            let left = lhs.evaluate(env)?;
            let Expr::Literal(Token {
                kind: TokenKind::Identifier(name),
                ..
            }) = rhs
            else {
                return Err(EvalError::Type(
                    "the right operand of '.' must be an identifier".to_owned(),
                ));
            };
            return evaluate_attr(left, name);
        }
        _ => {}
    }
    let left = lhs.evaluate(env)?;
    let right = rhs.evaluate(env)?;
    match op {
        BinaryOp::Pow
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::FloorDiv
        | BinaryOp::Mod
        | BinaryOp::Add
        | BinaryOp::Sub => evaluate_arith(op, left, right),
        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
            let ordering = compare(&left, &right).ok_or_else(|| {
                EvalError::Type(format!(
                    "{:?} not supported between instances of {} and {}",
                    comparison_symbol(op),
                    left.type_name(),
                    right.type_name()
                ))
            })?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Gt => ordering == Ordering::Greater,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Ge => ordering != Ordering::Less,
                _ => unreachable!(),
            }))
        }
        BinaryOp::Eq => Ok(Value::Bool(value_eq(&left, &right))),
        BinaryOp::Ne => Ok(Value::Bool(!value_eq(&left, &right))),
        BinaryOp::In => evaluate_membership(&left, &right).map(Value::Bool),
        BinaryOp::NotIn => evaluate_membership(&left, &right).map(|found| Value::Bool(!found)),
        BinaryOp::And | BinaryOp::Or | BinaryOp::Assign | BinaryOp::Dot => unreachable!(),
    }
}

fn comparison_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Lt => "<",
        BinaryOp::Gt => ">",
        BinaryOp::Le => "<=",
        BinaryOp::Ge => ">=",
        _ => unreachable!(),
    }
}

fn evaluate_attr(value: Value, name: &str) -> Result<Value, EvalError> {
    match &value {
        Value::Mapping(mapping) => {
            if let Some(found) = mapping.get(&Value::String(name.to_owned())) {
                return Ok(found.clone());
            }
        }
        Value::Tagged(tagged) => return evaluate_attr(tagged.value.clone(), name),
        _ => {}
    }
    Err(EvalError::Type(format!(
        "{} has no attribute or key {:?}",
        value.type_name(),
        name
    )))
}

fn evaluate_arith(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    // String and sequence forms of + and *.
    match (&op, &left, &right) {
        (BinaryOp::Add, Value::String(a), Value::String(b)) => {
            return Ok(Value::String(format!("{}{}", a, b)));
        }
        (BinaryOp::Add, Value::Sequence(a), Value::Sequence(b)) => {
            let mut items = a.clone();
            items.extend(b.iter().cloned());
            return Ok(Value::Sequence(items));
        }
        (BinaryOp::Mul, Value::String(s), n) | (BinaryOp::Mul, n, Value::String(s)) => {
            if let Some(Num::Int(count)) = as_num(n) {
                let count = usize::try_from(count).unwrap_or(0);
                return Ok(Value::String(s.repeat(count)));
            }
        }
        _ => {}
    }
    let (Some(a), Some(b)) = (as_num(&left), as_num(&right)) else {
        return Err(EvalError::Type(format!(
            "unsupported operand types: {} and {}",
            left.type_name(),
            right.type_name()
        )));
    };
    let result = match (op, a, b) {
        (BinaryOp::Add, Num::Int(x), Num::Int(y)) => match x.checked_add(y) {
            Some(sum) => Num::Int(sum),
            None => Num::Float(x as f64 + y as f64),
        },
        (BinaryOp::Add, x, y) => Num::Float(as_f64(x) + as_f64(y)),
        (BinaryOp::Sub, Num::Int(x), Num::Int(y)) => match x.checked_sub(y) {
            Some(diff) => Num::Int(diff),
            None => Num::Float(x as f64 - y as f64),
        },
        (BinaryOp::Sub, x, y) => Num::Float(as_f64(x) - as_f64(y)),
        (BinaryOp::Mul, Num::Int(x), Num::Int(y)) => match x.checked_mul(y) {
            Some(product) => Num::Int(product),
            None => Num::Float(x as f64 * y as f64),
        },
        (BinaryOp::Mul, x, y) => Num::Float(as_f64(x) * as_f64(y)),
        (BinaryOp::Div, x, y) => {
            let divisor = as_f64(y);
            if divisor == 0.0 {
                return Err(EvalError::ZeroDivision);
            }
            Num::Float(as_f64(x) / divisor)
        }
        (BinaryOp::FloorDiv, Num::Int(x), Num::Int(y)) => {
            if y == 0 {
                return Err(EvalError::ZeroDivision);
            }
            Num::Int(floor_div(x, y))
        }
        (BinaryOp::FloorDiv, x, y) => {
            let divisor = as_f64(y);
            if divisor == 0.0 {
                return Err(EvalError::ZeroDivision);
            }
            Num::Float((as_f64(x) / divisor).floor())
        }
        (BinaryOp::Mod, Num::Int(x), Num::Int(y)) => {
            if y == 0 {
                return Err(EvalError::ZeroDivision);
            }
            Num::Int(floor_mod(x, y))
        }
        (BinaryOp::Mod, x, y) => {
            let divisor = as_f64(y);
            if divisor == 0.0 {
                return Err(EvalError::ZeroDivision);
            }
            let dividend = as_f64(x);
            Num::Float(dividend - divisor * (dividend / divisor).floor())
        }
        (BinaryOp::Pow, Num::Int(x), Num::Int(y)) if y >= 0 => match u32::try_from(y)
            .ok()
            .and_then(|exponent| x.checked_pow(exponent))
        {
            Some(power) => Num::Int(power),
            None => Num::Float((x as f64).powf(y as f64)),
        },
        (BinaryOp::Pow, x, y) => Num::Float(as_f64(x).powf(as_f64(y))),
        _ => unreachable!(),
    };
    Ok(num_value(result))
}

/// Floor division with Python's sign convention (`-7 // 2 == -4`).
fn floor_div(a: i64, b: i64) -> i64 {
    let quotient = a / b;
    if a % b != 0 && (a < 0) != (b < 0) {
        quotient - 1
    } else {
        quotient
    }
}

/// Modulo with Python's sign convention (the result follows the divisor).
fn floor_mod(a: i64, b: i64) -> i64 {
    let remainder = a % b;
    if remainder != 0 && (remainder < 0) != (b < 0) {
        remainder + b
    } else {
        remainder
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (as_num(left), as_num(right)) {
        return match (a, b) {
            (Num::Int(x), Num::Int(y)) => Some(x.cmp(&y)),
            (x, y) => as_f64(x).partial_cmp(&as_f64(y)),
        };
    }
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Equality with numeric promotion, so `1 == 1.0` holds like it does in the
/// source language of the expressions.
pub(crate) fn value_eq(left: &Value, right: &Value) -> bool {
    if let (Some(a), Some(b)) = (as_num(left), as_num(right)) {
        return match (a, b) {
            (Num::Int(x), Num::Int(y)) => x == y,
            (x, y) => as_f64(x) == as_f64(y),
        };
    }
    left == right
}

fn evaluate_membership(needle: &Value, haystack: &Value) -> Result<bool, EvalError> {
    match haystack {
        Value::String(text) => match needle {
            Value::String(part) => Ok(text.contains(part.as_str())),
            _ => Err(EvalError::Type(format!(
                "'in <string>' requires string as left operand, not {}",
                needle.type_name()
            ))),
        },
        Value::Sequence(items) => Ok(items.iter().any(|item| value_eq(item, needle))),
        Value::Mapping(mapping) => Ok(mapping.keys().any(|key| value_eq(key, needle))),
        _ => Err(EvalError::Type(format!(
            "argument of type {} is not a container",
            haystack.type_name()
        ))),
    }
}

fn evaluate_index(base: Value, index: Value) -> Result<Value, EvalError> {
    match &base {
        Value::Mapping(mapping) => {
            for (key, value) in mapping.iter() {
                if value_eq(key, &index) {
                    return Ok(value.clone());
                }
            }
            Err(EvalError::Type(format!("key not found: {}", index)))
        }
        Value::Sequence(items) => {
            let at = sequence_index(&index, items.len())?;
            Ok(items[at].clone())
        }
        Value::String(text) => {
            let chars: Vec<char> = text.chars().collect();
            let at = sequence_index(&index, chars.len())?;
            Ok(Value::String(chars[at].to_string()))
        }
        _ => Err(EvalError::Type(format!(
            "{} is not indexable",
            base.type_name()
        ))),
    }
}

/// Resolves a (possibly negative) index against a length.
fn sequence_index(index: &Value, len: usize) -> Result<usize, EvalError> {
    let Some(Num::Int(at)) = as_num(index) else {
        return Err(EvalError::Type(format!(
            "indices must be integers, not {}",
            index.type_name()
        )));
    };
    let resolved = if at < 0 { at + len as i64 } else { at };
    if resolved < 0 || resolved as usize >= len {
        return Err(EvalError::Type("index out of range".to_owned()));
    }
    Ok(resolved as usize)
}
