// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use std::error::Error as StdError;
use std::fmt::{self, Display};

/// A malformed expression.
///
/// Carries the offending source text and the 0-based character offset of
/// the problem; [`ExprSyntaxError::column`] exposes the 1-based column that
/// error messages show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExprSyntaxError {
    message: String,
    offset: usize,
    text: String,
}

impl ExprSyntaxError {
    /// Creates a syntax error at the given 0-based offset of `text`.
    pub fn new(message: impl Into<String>, offset: usize, text: impl Into<String>) -> Self {
        ExprSyntaxError {
            message: message.into(),
            offset,
            text: text.into(),
        }
    }

    /// The 1-based column of the problem.
    pub fn column(&self) -> usize {
        self.offset + 1
    }

    /// The 0-based character offset of the problem.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The offending expression source.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The problem description.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ExprSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at column {} in expression {:?}",
            self.message,
            self.column(),
            self.text
        )
    }
}

impl StdError for ExprSyntaxError {}

/// A runtime failure while evaluating a well-formed expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalError {
    /// An identifier that no scope binds.
    Name(String),
    /// An operation applied to values it does not support.
    Type(String),
    /// Division or modulo by zero.
    ZeroDivision,
    /// A call on something that is not a built-in.
    NotCallable(String),
    /// The `=` operator, which parses but is not implemented.
    Assignment,
}

impl Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Name(name) => write!(f, "name {:?} is not defined", name),
            EvalError::Type(msg) => f.write_str(msg),
            EvalError::ZeroDivision => f.write_str("division by zero"),
            EvalError::NotCallable(what) => {
                write!(f, "{} is not callable", what)
            }
            EvalError::Assignment => f.write_str("assignment is not supported in expressions"),
        }
    }
}

impl StdError for EvalError {}
