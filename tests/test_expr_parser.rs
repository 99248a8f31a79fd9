// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use enyaml::expr::{parse, BinaryOp, EvalError, Expr, Token, TokenKind, UnaryOp};
use enyaml::{Context, Mapping, Value};

fn num(text: &str, start: usize, end: usize) -> Expr {
    Expr::Literal(Token::new(TokenKind::Number(text.to_owned()), start, end))
}

fn eval(source: &str, ctx: &mut Context) -> Result<Value, EvalError> {
    parse(source).expect("expression parses").evaluate(ctx)
}

#[test]
fn test_empty_expression() {
    let err = parse("").unwrap_err();
    assert_eq!(err.column(), 1);
}

#[test]
fn test_empty_expression_paren() {
    let err = parse("()").unwrap_err();
    assert_eq!(err.column(), 2);
}

#[test]
fn test_bare_literal() {
    assert_eq!(parse("1").unwrap(), num("1", 0, 1));
}

#[test]
fn test_paren_literal() {
    assert_eq!(parse("(1)").unwrap(), num("1", 1, 2));
}

#[test]
fn test_negation() {
    assert_eq!(
        parse("-1").unwrap(),
        Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(num("1", 1, 2)),
        }
    );
}

#[test]
fn test_multiple_negations() {
    assert_eq!(
        parse("--1").unwrap(),
        Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(num("1", 2, 3)),
            }),
        }
    );
}

#[test]
fn test_addition() {
    assert_eq!(
        parse("1+2").unwrap(),
        Expr::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(num("1", 0, 1)),
            rhs: Box::new(num("2", 2, 3)),
        }
    );
}

#[test]
fn test_multiple_additions() {
    assert_eq!(
        parse("1+2+3").unwrap(),
        Expr::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(Expr::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(num("1", 0, 1)),
                rhs: Box::new(num("2", 2, 3)),
            }),
            rhs: Box::new(num("3", 4, 5)),
        }
    );
}

#[test]
fn test_add_and_mult() {
    assert_eq!(
        parse("1+2*3").unwrap(),
        Expr::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(num("1", 0, 1)),
            rhs: Box::new(Expr::Binary {
                op: BinaryOp::Mul,
                lhs: Box::new(num("2", 2, 3)),
                rhs: Box::new(num("3", 4, 5)),
            }),
        }
    );
}

#[test]
fn test_mult_and_add() {
    assert_eq!(
        parse("1*2+3").unwrap(),
        Expr::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(Expr::Binary {
                op: BinaryOp::Mul,
                lhs: Box::new(num("1", 0, 1)),
                rhs: Box::new(num("2", 2, 3)),
            }),
            rhs: Box::new(num("3", 4, 5)),
        }
    );
}

#[test]
fn test_mult_and_add_paren() {
    assert_eq!(
        parse("1*(2+3)").unwrap(),
        Expr::Binary {
            op: BinaryOp::Mul,
            lhs: Box::new(num("1", 0, 1)),
            rhs: Box::new(Expr::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(num("2", 3, 4)),
                rhs: Box::new(num("3", 5, 6)),
            }),
        }
    );
}

#[test]
fn test_missing_close_paren() {
    let err = parse("(1").unwrap_err();
    assert_eq!(err.column(), 3);
}

#[test]
fn test_missing_open_paren() {
    let err = parse("1)").unwrap_err();
    assert_eq!(err.column(), 2);
}

#[test]
fn test_word_operator_needs_whitespace() {
    assert!(parse("1and 2").is_err());
    assert!(parse("not(1)").is_err());
}

#[test]
fn test_arithmetic_laws() {
    let mut ctx = Context::new();
    assert_eq!(eval("1+2*3", &mut ctx).unwrap(), Value::from(7));
    assert_eq!(eval("1*(2+3)", &mut ctx).unwrap(), Value::from(5));
    assert_eq!(eval("--1", &mut ctx).unwrap(), Value::from(1));
    assert_eq!(eval("not 0", &mut ctx).unwrap(), Value::Bool(true));
    assert_eq!(eval("2 ^ 10", &mut ctx).unwrap(), Value::from(1024));
}

#[test]
fn test_division_semantics() {
    let mut ctx = Context::new();
    // True division always yields a float; floor division and modulo
    // follow the divisor's sign.
    assert_eq!(eval("1 / 2", &mut ctx).unwrap(), Value::from(0.5));
    assert_eq!(eval("7 // 2", &mut ctx).unwrap(), Value::from(3));
    assert_eq!(eval("-7 // 2", &mut ctx).unwrap(), Value::from(-4));
    assert_eq!(eval("7 % 3", &mut ctx).unwrap(), Value::from(1));
    assert_eq!(eval("-7 % 3", &mut ctx).unwrap(), Value::from(2));
    assert_eq!(
        eval("1 // 0", &mut ctx).unwrap_err(),
        EvalError::ZeroDivision
    );
}

#[test]
fn test_string_operations() {
    let mut ctx = Context::new();
    assert_eq!(eval("'a' + 'b'", &mut ctx).unwrap(), Value::from("ab"));
    assert_eq!(eval("'ab' * 3", &mut ctx).unwrap(), Value::from("ababab"));
    assert_eq!(eval("'x' in 'xyz'", &mut ctx).unwrap(), Value::Bool(true));
    assert_eq!(
        eval("'q' not in 'xyz'", &mut ctx).unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn test_boolean_operators_yield_operands() {
    let mut ctx = Context::new();
    assert_eq!(eval("0 or 5", &mut ctx).unwrap(), Value::from(5));
    assert_eq!(eval("2 and 5", &mut ctx).unwrap(), Value::from(5));
    assert_eq!(eval("0 and 5", &mut ctx).unwrap(), Value::from(0));
}

#[test]
fn test_ternary() {
    let mut ctx = Context::new();
    assert_eq!(eval("1 if 0 else 2", &mut ctx).unwrap(), Value::from(2));
    assert_eq!(eval("1 if 3 else 2", &mut ctx).unwrap(), Value::from(1));
}

#[test]
fn test_name_lookup() {
    let mut ctx = Context::new();
    ctx.set("x", Value::from(5));
    assert_eq!(eval("x + 1", &mut ctx).unwrap(), Value::from(6));
    assert_eq!(
        eval("nope", &mut ctx).unwrap_err(),
        EvalError::Name("nope".to_owned())
    );
}

#[test]
fn test_attribute_and_index_access() {
    let mut ctx = Context::new();
    let mut inner = Mapping::new();
    inner.insert(Value::from("b"), Value::from(1));
    ctx.set("a", Value::Mapping(inner));
    ctx.set("xs", Value::Sequence(vec![Value::from(10), Value::from(20)]));
    assert_eq!(eval("a.b", &mut ctx).unwrap(), Value::from(1));
    assert_eq!(eval("xs[1]", &mut ctx).unwrap(), Value::from(20));
    assert_eq!(eval("xs[-1]", &mut ctx).unwrap(), Value::from(20));
    assert!(eval("a.c", &mut ctx).is_err());
}

#[test]
fn test_membership_in_collections() {
    let mut ctx = Context::new();
    ctx.set("xs", Value::Sequence(vec![Value::from(1), Value::from(2)]));
    assert_eq!(eval("2 in xs", &mut ctx).unwrap(), Value::Bool(true));
    assert_eq!(eval("5 in xs", &mut ctx).unwrap(), Value::Bool(false));
    assert_eq!(eval("5 not in xs", &mut ctx).unwrap(), Value::Bool(true));
}

#[test]
fn test_assignment_parses_but_does_not_evaluate() {
    let mut ctx = Context::new();
    assert_eq!(eval("a = 1", &mut ctx).unwrap_err(), EvalError::Assignment);
}

#[test]
fn test_double_quoted_escapes() {
    let mut ctx = Context::new();
    assert_eq!(
        eval("\"a\\nb\\tc\"", &mut ctx).unwrap(),
        Value::from("a\nb\tc")
    );
    assert!(parse("\"a\\qb\"").is_err());
    // Reserved escapes are rejected, not silently mangled.
    assert!(parse("\"\\x41\"").is_err());
    assert!(parse("\"\\u0041\"").is_err());
}

#[test]
fn test_single_quoted_escapes_are_literal() {
    let mut ctx = Context::new();
    assert_eq!(eval(r"'a\nb'", &mut ctx).unwrap(), Value::from("a\\nb"));
    assert_eq!(eval(r"'it\'s'", &mut ctx).unwrap(), Value::from("it's"));
}

#[test]
fn test_unterminated_string() {
    assert!(parse("'abc").is_err());
    assert!(parse("\"abc").is_err());
}

#[test]
fn test_float_literals() {
    let mut ctx = Context::new();
    assert_eq!(eval("1.5 + 1", &mut ctx).unwrap(), Value::from(2.5));
    assert_eq!(eval(".5 * 2", &mut ctx).unwrap(), Value::from(1.0));
    assert!(parse("1.2.3").is_err());
}

#[test]
fn test_calls_require_builtins() {
    let mut ctx = Context::new();
    ctx.set("x", Value::from(1));
    // A bare Context exposes no callables.
    assert!(matches!(
        eval("x(1)", &mut ctx).unwrap_err(),
        EvalError::NotCallable(_)
    ));
}
