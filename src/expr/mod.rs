// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

//! The embedded expression language.
//!
//! `!$` nodes, `!for` headers and `!if` guards evaluate small Python-like
//! expressions against the render [`Context`](crate::Context). The language
//! is fully self-contained: [`lexer`] tokenizes, [`parser`] builds an
//! [`Expr`] AST by precedence climbing, and [`Expr::evaluate`] walks the
//! tree against an [`Env`]. There is no host-language evaluation anywhere.
//!
//! ```
//! use enyaml::{expr, Context, Value};
//!
//! let mut ctx = Context::new();
//! ctx.set("n", Value::from(3));
//! let ast = expr::parse("1 + 2 * n").unwrap();
//! assert_eq!(ast.evaluate(&mut ctx).unwrap(), Value::from(7));
//! ```

/// Expression error types.
pub mod errors;
/// The expression evaluator and AST.
pub mod expr;
/// The expression lexer.
pub mod lexer;
/// The expression parser.
pub mod parser;

pub use self::errors::{EvalError, ExprSyntaxError};
pub use self::expr::{BinaryOp, Env, Expr, UnaryOp};
pub use self::lexer::{Group, Lexer, Op, Token, TokenKind};
pub use self::parser::Parser;

/// Parses `source` into an expression AST.
pub fn parse(source: &str) -> Result<Expr, ExprSyntaxError> {
    Parser::new(source).get_expr()
}
