// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use std::fmt::{self, Display};

/// `Path` represents the location of a node inside a document, like
/// `services.web.ports[0]`.
///
/// Construction and rendering thread a `Path` through their recursion so
/// errors name the offending node rather than just a line number.
#[derive(Copy, Clone, Debug)]
pub enum Path<'a> {
    /// The document root.
    Root,
    /// An item of a sequence.
    Seq {
        /// The parent path.
        parent: &'a Path<'a>,
        /// The index within the sequence.
        index: usize,
    },
    /// A value (or key) of a mapping.
    Map {
        /// The parent path.
        parent: &'a Path<'a>,
        /// The key within the map.
        key: &'a str,
    },
    /// A position whose key could not be rendered as text.
    Unknown {
        /// The parent path.
        parent: &'a Path<'a>,
    },
}

impl Display for Path<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Parent<'a>(&'a Path<'a>);

        impl Display for Parent<'_> {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.0 {
                    Path::Root => Ok(()),
                    path => write!(formatter, "{}.", path),
                }
            }
        }

        match self {
            Path::Root => formatter.write_str("."),
            Path::Seq { parent, index } => {
                write!(formatter, r"{}\[{}\]", Parent(parent), index)
            }
            Path::Map { parent, key } => {
                write!(formatter, "{}{}", Parent(parent), key)
            }
            Path::Unknown { parent } => {
                write!(formatter, "{}?", Parent(parent))
            }
        }
    }
}
