// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use crate::expr::errors::ExprSyntaxError;
use crate::expr::expr::{BinaryOp, Expr, UnaryOp};
use crate::expr::lexer::{Group, Lexer, Op, Token, TokenKind};

/// Precedence-climbing expression parser.
///
/// One token of lookahead over the [`Lexer`]; every production recurses
/// with the precedence of the operator it just consumed, so the table in
/// [`infix_precedence`] fully determines grouping.
pub struct Parser {
    lexer: Lexer,
    token: Option<Token>,
}

/// The infix binding power of a token, or `-1` when it cannot continue an
/// expression. `Op::Not` binds at the comparison level because in tail
/// position it can only start `not in`.
fn infix_precedence(kind: &TokenKind) -> i8 {
    match kind {
        TokenKind::Op(op) => match op {
            Op::Dot => 11,
            Op::Pow => 10,
            Op::Mul | Op::Div | Op::FloorDiv | Op::Mod => 8,
            Op::Add | Op::Sub => 7,
            Op::Lt | Op::Gt | Op::Le | Op::Ge | Op::Eq | Op::Ne | Op::In | Op::Not => 6,
            Op::And => 4,
            Op::Or => 3,
            Op::If => 1,
            Op::Assign => 0,
            Op::Else => -1,
        },
        // Postfix call and index forms.
        TokenKind::Open(Group::Paren) | TokenKind::Open(Group::Bracket) => 11,
        _ => -1,
    }
}

fn binary_op(op: Op) -> Option<BinaryOp> {
    Some(match op {
        Op::Dot => BinaryOp::Dot,
        Op::Pow => BinaryOp::Pow,
        Op::Mul => BinaryOp::Mul,
        Op::Div => BinaryOp::Div,
        Op::FloorDiv => BinaryOp::FloorDiv,
        Op::Mod => BinaryOp::Mod,
        Op::Add => BinaryOp::Add,
        Op::Sub => BinaryOp::Sub,
        Op::Lt => BinaryOp::Lt,
        Op::Gt => BinaryOp::Gt,
        Op::Le => BinaryOp::Le,
        Op::Ge => BinaryOp::Ge,
        Op::Eq => BinaryOp::Eq,
        Op::Ne => BinaryOp::Ne,
        Op::In => BinaryOp::In,
        Op::And => BinaryOp::And,
        Op::Or => BinaryOp::Or,
        Op::Assign => BinaryOp::Assign,
        _ => return None,
    })
}

fn binary_precedence(op: BinaryOp) -> i8 {
    match op {
        BinaryOp::Dot => 11,
        BinaryOp::Pow => 10,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod => 8,
        BinaryOp::Add | BinaryOp::Sub => 7,
        BinaryOp::Lt
        | BinaryOp::Gt
        | BinaryOp::Le
        | BinaryOp::Ge
        | BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::In
        | BinaryOp::NotIn => 6,
        BinaryOp::And => 4,
        BinaryOp::Or => 3,
        BinaryOp::Assign => 0,
    }
}

impl Parser {
    /// Creates a parser over `source`.
    pub fn new(source: &str) -> Self {
        Parser {
            lexer: Lexer::new(source),
            token: None,
        }
    }

    fn syntax_error(&self, msg: &str, offset: Option<usize>) -> ExprSyntaxError {
        let offset = offset
            .or_else(|| self.token.as_ref().map(|t| t.start))
            .unwrap_or_else(|| self.lexer.text().chars().count());
        ExprSyntaxError::new(msg, offset, self.lexer.text())
    }

    fn peek(&mut self) -> Result<Option<&Token>, ExprSyntaxError> {
        if self.token.is_none() {
            self.token = self.lexer.next_token()?;
        }
        Ok(self.token.as_ref())
    }

    fn bump(&mut self) -> Result<Option<Token>, ExprSyntaxError> {
        self.peek()?;
        Ok(self.token.take())
    }

    /// Parses the whole source as a single expression.
    pub fn get_expr(&mut self) -> Result<Expr, ExprSyntaxError> {
        let expr = self.get_sub_expr(-1)?;
        if self.peek()?.is_some() {
            return Err(self.syntax_error("expecting single expression", None));
        }
        Ok(expr)
    }

    fn get_sub_expr(&mut self, precedence: i8) -> Result<Expr, ExprSyntaxError> {
        let mut lhs = self.handle_head()?;
        loop {
            let continue_with = match self.peek()? {
                Some(token) => infix_precedence(&token.kind) > precedence,
                None => false,
            };
            if !continue_with {
                break;
            }
            let Some(expr) = lhs else {
                return Err(self.syntax_error("expecting expression", None));
            };
            lhs = Some(self.handle_tail(expr)?);
        }
        lhs.ok_or_else(|| self.syntax_error("expecting expression", None))
    }

    fn handle_head(&mut self) -> Result<Option<Expr>, ExprSyntaxError> {
        let Some(token) = self.peek()? else {
            return Ok(None);
        };
        match &token.kind {
            TokenKind::Identifier(_) | TokenKind::Number(_) | TokenKind::Str { .. } => {
                let token = self.bump()?.unwrap();
                Ok(Some(Expr::Literal(token)))
            }
            TokenKind::Op(_) => self.handle_unary_op().map(Some),
            TokenKind::Open(Group::Paren) => self.handle_paren().map(Some),
            TokenKind::Close(Group::Paren) => {
                let start = token.start;
                Err(self.syntax_error("closing parenthesis without opening", Some(start)))
            }
            _ => Ok(None),
        }
    }

    fn handle_tail(&mut self, lhs: Expr) -> Result<Expr, ExprSyntaxError> {
        let token = self.peek()?.expect("tail called without a token");
        match token.kind.clone() {
            TokenKind::Op(Op::If) => self.handle_ternary_op(lhs),
            TokenKind::Op(Op::Not) => {
                let not_token = self.bump()?.unwrap();
                match self.peek()? {
                    Some(Token {
                        kind: TokenKind::Op(Op::In),
                        ..
                    }) => {
                        self.bump()?;
                        let rhs = self.get_sub_expr(6)?;
                        Ok(Expr::Binary {
                            op: BinaryOp::NotIn,
                            lhs: Box::new(lhs),
                            rhs: Box::new(rhs),
                        })
                    }
                    _ => Err(self.syntax_error("not a binary operator", Some(not_token.start))),
                }
            }
            TokenKind::Op(op) => {
                let op_token = self.bump()?.unwrap();
                let Some(op) = binary_op(op) else {
                    return Err(self.syntax_error("not a binary operator", Some(op_token.start)));
                };
                if op == BinaryOp::Dot {
                    match self.peek()? {
                        Some(Token {
                            kind: TokenKind::Identifier(_),
                            ..
                        }) => {}
                        _ => return Err(self.syntax_error("expecting identifier", None)),
                    }
                }
                let rhs = self.get_sub_expr(binary_precedence(op))?;
                Ok(Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                })
            }
            TokenKind::Open(Group::Paren) => self.handle_call(lhs),
            TokenKind::Open(Group::Bracket) => self.handle_index(lhs),
            _ => unreachable!("precedence gate admitted a non-operator"),
        }
    }

    fn handle_paren(&mut self) -> Result<Expr, ExprSyntaxError> {
        self.bump()?;
        let expr = self.get_sub_expr(-1)?;
        match self.peek()? {
            Some(Token {
                kind: TokenKind::Close(Group::Paren),
                ..
            }) => {
                self.bump()?;
                Ok(expr)
            }
            _ => Err(self.syntax_error("expecting closing parenthesis", None)),
        }
    }

    fn handle_unary_op(&mut self) -> Result<Expr, ExprSyntaxError> {
        let token = self.bump()?.unwrap();
        let (op, precedence) = match token.kind {
            TokenKind::Op(Op::Add) => (UnaryOp::Pos, 9),
            TokenKind::Op(Op::Sub) => (UnaryOp::Neg, 9),
            TokenKind::Op(Op::Not) => (UnaryOp::Not, 5),
            _ => return Err(self.syntax_error("not a unary operator", Some(token.start))),
        };
        let operand = self.get_sub_expr(precedence)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn handle_ternary_op(&mut self, lhs: Expr) -> Result<Expr, ExprSyntaxError> {
        self.bump()?;
        let cond = self.get_sub_expr(1)?;
        match self.peek()? {
            Some(Token {
                kind: TokenKind::Op(Op::Else),
                ..
            }) => {
                self.bump()?;
            }
            _ => return Err(self.syntax_error("expecting else", None)),
        }
        let orelse = self.get_sub_expr(1)?;
        Ok(Expr::IfElse {
            body: Box::new(lhs),
            cond: Box::new(cond),
            orelse: Box::new(orelse),
        })
    }

    fn handle_call(&mut self, callee: Expr) -> Result<Expr, ExprSyntaxError> {
        self.bump()?;
        let mut args = Vec::new();
        if !matches!(
            self.peek()?,
            Some(Token {
                kind: TokenKind::Close(Group::Paren),
                ..
            })
        ) {
            loop {
                args.push(self.get_sub_expr(-1)?);
                match self.peek()? {
                    Some(Token {
                        kind: TokenKind::Comma,
                        ..
                    }) => {
                        self.bump()?;
                    }
                    _ => break,
                }
            }
        }
        match self.peek()? {
            Some(Token {
                kind: TokenKind::Close(Group::Paren),
                ..
            }) => {
                self.bump()?;
            }
            _ => return Err(self.syntax_error("expecting closing parenthesis", None)),
        }
        Ok(Expr::Call {
            callee: Box::new(callee),
            args,
        })
    }

    fn handle_index(&mut self, base: Expr) -> Result<Expr, ExprSyntaxError> {
        self.bump()?;
        let index = self.get_sub_expr(-1)?;
        match self.peek()? {
            Some(Token {
                kind: TokenKind::Close(Group::Bracket),
                ..
            }) => {
                self.bump()?;
            }
            _ => return Err(self.syntax_error("expecting closing bracket", None)),
        }
        Ok(Expr::Index {
            base: Box::new(base),
            index: Box::new(index),
        })
    }
}
