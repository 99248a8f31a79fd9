// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use crate::libyml::cstr::CStr;
use std::{
    fmt::{self, Debug, Display},
    mem::MaybeUninit,
    ptr::NonNull,
};
#[allow(clippy::unsafe_removed_from_name)]
use libyml as sys;

/// A type alias for a `Result` with an `Error` as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// An error reported by the underlying `libyml` parser or emitter.
///
/// Carries the substrate's problem text together with the marks libyml
/// attaches to it, so malformed input is reported with its position.
pub struct Error {
    kind: sys::YamlErrorTypeT,
    problem: CStr<'static>,
    problem_offset: u64,
    problem_mark: Mark,
    context: Option<CStr<'static>>,
    context_mark: Mark,
}

impl Error {
    /// Constructs an `Error` from a `YamlParserT` pointer.
    ///
    /// # Safety
    ///
    /// This function is unsafe because it dereferences raw pointers and
    /// assumes the validity of the parser pointer.
    pub unsafe fn parse_error(parser: *const sys::YamlParserT) -> Self {
        Error {
            kind: unsafe { (&(*parser)).error },
            problem: match NonNull::new(unsafe { (&(*parser)).problem as *mut _ }) {
                Some(problem) => CStr::from_ptr(problem),
                None => CStr::from_bytes_with_nul(b"libyml parser failed but there is no error\0"),
            },
            problem_offset: unsafe { (&(*parser)).problem_offset },
            problem_mark: Mark {
                sys: unsafe { (&(*parser)).problem_mark },
            },
            #[allow(clippy::manual_map)]
            context: match NonNull::new(unsafe { (&(*parser)).context as *mut _ }) {
                Some(context) => Some(CStr::from_ptr(context)),
                None => None,
            },
            context_mark: Mark {
                sys: unsafe { (&(*parser)).context_mark },
            },
        }
    }

    /// Constructs an `Error` from a `YamlEmitterT` pointer.
    ///
    /// # Safety
    ///
    /// This function is unsafe because it dereferences raw pointers and
    /// assumes the validity of the emitter pointer.
    pub unsafe fn emit_error(emitter: *const sys::YamlEmitterT) -> Self {
        Error {
            kind: unsafe { (&(*emitter)).error },
            problem: match NonNull::new(unsafe { (&(*emitter)).problem as *mut _ }) {
                Some(problem) => CStr::from_ptr(problem),
                None => CStr::from_bytes_with_nul(b"libyml emitter failed but there is no error\0"),
            },
            problem_offset: 0,
            problem_mark: Mark {
                sys: unsafe { MaybeUninit::<sys::YamlMarkT>::zeroed().assume_init() },
            },
            context: None,
            context_mark: Mark {
                sys: unsafe { MaybeUninit::<sys::YamlMarkT>::zeroed().assume_init() },
            },
        }
    }

    /// Returns the mark indicating the position of the problem.
    pub fn mark(&self) -> Mark {
        self.problem_mark
    }
}

impl Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.problem)?;
        if self.problem_mark.sys.line != 0 || self.problem_mark.sys.column != 0 {
            write!(formatter, " at {}", self.problem_mark)?;
        } else if self.problem_offset != 0 {
            write!(formatter, " at position {}", self.problem_offset)?;
        }
        if let Some(context) = &self.context {
            write!(formatter, ", {}", context)?;
            if (self.context_mark.sys.line != 0 || self.context_mark.sys.column != 0)
                && (self.context_mark.sys.line != self.problem_mark.sys.line
                    || self.context_mark.sys.column != self.problem_mark.sys.column)
            {
                write!(formatter, " at {}", self.context_mark)?;
            }
        }
        Ok(())
    }
}

impl Debug for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formatter = formatter.debug_struct("Error");
        if let Some(kind) = match self.kind {
            sys::YamlMemoryError => Some("MEMORY"),
            sys::YamlReaderError => Some("READER"),
            sys::YamlScannerError => Some("SCANNER"),
            sys::YamlParserError => Some("PARSER"),
            sys::YamlComposerError => Some("COMPOSER"),
            sys::YamlWriterError => Some("WRITER"),
            sys::YamlEmitterError => Some("EMITTER"),
            _ => None,
        } {
            formatter.field("kind", &format_args!("{}", kind));
        }
        formatter.field("problem", &self.problem);
        if self.problem_mark.sys.line != 0 || self.problem_mark.sys.column != 0 {
            formatter.field("problem_mark", &self.problem_mark);
        } else if self.problem_offset != 0 {
            formatter.field("problem_offset", &self.problem_offset);
        }
        if let Some(context) = &self.context {
            formatter.field("context", context);
            if self.context_mark.sys.line != 0 || self.context_mark.sys.column != 0 {
                formatter.field("context_mark", &self.context_mark);
            }
        }
        formatter.finish()
    }
}

/// A position in the YAML input.
///
/// Every composed template node keeps the mark of the event it was built
/// from, and every template error reports one.
#[derive(Copy, Clone)]
pub struct Mark {
    pub(super) sys: sys::YamlMarkT,
}

impl Mark {
    /// Retrieves the byte index of the mark.
    pub fn index(&self) -> u64 {
        self.sys.index
    }

    /// Retrieves the 0-based line number of the mark.
    pub fn line(&self) -> u64 {
        self.sys.line
    }

    /// Retrieves the 0-based column number of the mark.
    pub fn column(&self) -> u64 {
        self.sys.column
    }
}

impl Display for Mark {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sys.line != 0 || self.sys.column != 0 {
            write!(
                formatter,
                "line {} column {}",
                self.sys.line + 1,
                self.sys.column + 1,
            )
        } else {
            write!(formatter, "position {}", self.sys.index)
        }
    }
}

impl Debug for Mark {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formatter = formatter.debug_struct("Mark");
        if self.sys.line != 0 || self.sys.column != 0 {
            formatter.field("line", &(self.sys.line + 1));
            formatter.field("column", &(self.sys.column + 1));
        } else {
            formatter.field("index", &self.sys.index);
        }
        formatter.finish()
    }
}
