// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use crate::{
    expr::errors::ExprSyntaxError,
    libyml::{emitter, error as libyml},
    modules::path::Path,
};
use serde::{de, ser};
use std::{
    error::Error as StdError,
    fmt::{self, Debug, Display},
    io, result, string,
    sync::Arc,
};

/// An error that happened loading, rendering or emitting a template.
pub struct Error(Box<ErrorImpl>);

/// Alias for a `Result` with the error type `enyaml::Error`.
pub type Result<T> = result::Result<T, Error>;

/// The internal representation of an error.
#[derive(Debug)]
pub enum ErrorImpl {
    /// A generic error message with an optional position.
    Message(String, Option<Pos>),
    /// An error originating from the `libyml` substrate (malformed YAML).
    Libyml(libyml::Error),
    /// An I/O error.
    Io(io::Error),
    /// Event text that was not valid UTF-8.
    FromUtf8(string::FromUtf8Error),
    /// An alias referring to an anchor that was never declared.
    UnknownAnchor(libyml::Mark),
    /// A tag shorthand whose handle is not defined.
    UnknownTagHandle(String, Option<libyml::Mark>),
    /// An unusable template tag: unknown basetag, or a basetag applied to
    /// the wrong structural kind.
    Tag(String, Option<libyml::Mark>),
    /// A malformed expression inside `!$`, `!$f` or a `!for` header.
    ExprSyntax(ExprSyntaxError, Option<libyml::Mark>),
    /// A semantic violation during rendering.
    Render(String, Option<libyml::Mark>),
    /// An attempt to construct a template node that was never rendered.
    ConstructTemplate(Option<libyml::Mark>),
    /// More than one document produced output for a single-document render.
    MoreThanOneDocument(Option<libyml::Mark>),
    /// Documents nested deeper than the composer allows.
    RecursionLimitExceeded(libyml::Mark),
    /// A shared error, reported once and replayed on later pulls.
    Shared(Arc<ErrorImpl>),
}

/// A position in the input together with the path of the node being
/// processed when the error happened.
#[derive(Debug)]
pub struct Pos {
    /// The mark representing the position.
    mark: libyml::Mark,
    /// The path to the position.
    path: String,
}

/// The input location that an error occurred.
#[derive(Debug)]
pub struct Location {
    /// The byte index of the error.
    index: usize,
    /// The line of the error.
    line: usize,
    /// The column of the error.
    column: usize,
}

impl Location {
    /// The byte index of the error.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The line of the error.
    pub fn line(&self) -> usize {
        self.line
    }

    /// The column of the error.
    pub fn column(&self) -> usize {
        self.column
    }

    // This is to keep decoupled with the substrate crate.
    #[doc(hidden)]
    fn from_mark(mark: libyml::Mark) -> Self {
        Location {
            index: mark.index() as usize,
            // `line` and `column` from libyml are 0-indexed but all error
            // messages add +1 to this value.
            line: mark.line() as usize + 1,
            column: mark.column() as usize + 1,
        }
    }
}

impl Error {
    /// Returns the Location from the error if one exists.
    ///
    /// Not all types of errors have a location so this can return `None`.
    pub fn location(&self) -> Option<Location> {
        self.0.location()
    }

    /// Converts this error into a shared, reference-counted form.
    pub fn shared(self) -> Arc<ErrorImpl> {
        if let ErrorImpl::Shared(err) = *self.0 {
            err
        } else {
            Arc::from(self.0)
        }
    }
}

/// Creates a new `Error` from an `ErrorImpl`.
pub fn new(inner: ErrorImpl) -> Error {
    Error(Box::new(inner))
}

/// Creates a new `Error` from a shared `ErrorImpl`.
pub fn shared(shared: Arc<ErrorImpl>) -> Error {
    Error(Box::new(ErrorImpl::Shared(shared)))
}

/// Creates a render error at the given mark.
pub(crate) fn render(msg: impl Into<String>, mark: Option<libyml::Mark>) -> Error {
    new(ErrorImpl::Render(msg.into(), mark))
}

/// Creates a tag error at the given mark.
pub(crate) fn tag(msg: impl Into<String>, mark: Option<libyml::Mark>) -> Error {
    new(ErrorImpl::Tag(msg.into(), mark))
}

/// Fixes the mark and path in an error.
pub(crate) fn fix_mark(mut error: Error, mark: libyml::Mark, path: Path<'_>) -> Error {
    if let ErrorImpl::Message(_, none @ None) = error.0.as_mut() {
        *none = Some(Pos {
            mark,
            path: path.to_string(),
        });
    }
    error
}

impl From<libyml::Error> for Error {
    fn from(err: libyml::Error) -> Self {
        Error(Box::new(ErrorImpl::Libyml(err)))
    }
}

impl From<emitter::Error> for Error {
    fn from(err: emitter::Error) -> Self {
        match err {
            emitter::Error::Libyml(err) => Self::from(err),
            emitter::Error::Io(err) => new(ErrorImpl::Io(err)),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        new(ErrorImpl::Io(err))
    }
}

impl From<string::FromUtf8Error> for Error {
    fn from(err: string::FromUtf8Error) -> Self {
        new(ErrorImpl::FromUtf8(err))
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display(f)
    }
}

// Remove two layers of verbosity from the debug representation. Humans often
// end up seeing this representation because it is what unwrap() shows.
impl Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.debug(f)
    }
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error(Box::new(ErrorImpl::Message(msg.to_string(), None)))
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error(Box::new(ErrorImpl::Message(msg.to_string(), None)))
    }
}

impl ErrorImpl {
    fn location(&self) -> Option<Location> {
        self.mark().map(Location::from_mark)
    }

    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ErrorImpl::Io(err) => err.source(),
            ErrorImpl::FromUtf8(err) => err.source(),
            ErrorImpl::Shared(err) => err.source(),
            _ => None,
        }
    }

    fn mark(&self) -> Option<libyml::Mark> {
        match self {
            ErrorImpl::Message(_, Some(Pos { mark, path: _ })) => Some(*mark),
            ErrorImpl::UnknownAnchor(mark) | ErrorImpl::RecursionLimitExceeded(mark) => Some(*mark),
            ErrorImpl::UnknownTagHandle(_, mark)
            | ErrorImpl::Tag(_, mark)
            | ErrorImpl::ExprSyntax(_, mark)
            | ErrorImpl::Render(_, mark)
            | ErrorImpl::ConstructTemplate(mark)
            | ErrorImpl::MoreThanOneDocument(mark) => *mark,
            ErrorImpl::Libyml(err) => Some(err.mark()),
            ErrorImpl::Shared(err) => err.mark(),
            _ => None,
        }
    }

    fn message_no_mark(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorImpl::Message(msg, None) => f.write_str(msg),
            ErrorImpl::Message(msg, Some(Pos { mark: _, path })) => {
                if path != "." {
                    write!(f, "{}: ", path)?;
                }
                f.write_str(msg)
            }
            ErrorImpl::Libyml(_) => unreachable!(),
            ErrorImpl::Io(err) => Display::fmt(err, f),
            ErrorImpl::FromUtf8(err) => Display::fmt(err, f),
            ErrorImpl::UnknownAnchor(_mark) => f.write_str("unknown anchor"),
            ErrorImpl::UnknownTagHandle(handle, _mark) => {
                write!(f, "undefined tag handle {:?}", handle)
            }
            ErrorImpl::Tag(msg, _mark) => f.write_str(msg),
            ErrorImpl::ExprSyntax(err, _mark) => Display::fmt(err, f),
            ErrorImpl::Render(msg, _mark) => f.write_str(msg),
            ErrorImpl::ConstructTemplate(_mark) => {
                f.write_str("cannot construct an unrendered template node")
            }
            ErrorImpl::MoreThanOneDocument(_mark) => {
                f.write_str("expected a single document in the stream")
            }
            ErrorImpl::RecursionLimitExceeded(_mark) => f.write_str("recursion limit exceeded"),
            ErrorImpl::Shared(_) => unreachable!(),
        }
    }

    fn display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorImpl::Libyml(err) => Display::fmt(err, f),
            ErrorImpl::Shared(err) => err.display(f),
            _ => {
                self.message_no_mark(f)?;
                if let Some(mark) = self.mark() {
                    if mark.line() != 0 || mark.column() != 0 {
                        write!(f, " at {}", mark)?;
                    }
                }
                Ok(())
            }
        }
    }

    fn debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorImpl::Libyml(err) => Debug::fmt(err, f),
            ErrorImpl::Shared(err) => err.debug(f),
            _ => {
                f.write_str("Error(")?;
                struct MessageNoMark<'a>(&'a ErrorImpl);
                impl Display for MessageNoMark<'_> {
                    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        self.0.message_no_mark(f)
                    }
                }
                let msg = MessageNoMark(self).to_string();
                Debug::fmt(&msg, f)?;
                if let Some(mark) = self.mark() {
                    write!(f, ", line: {}, column: {}", mark.line() + 1, mark.column() + 1,)?;
                }
                f.write_str(")")
            }
        }
    }
}
