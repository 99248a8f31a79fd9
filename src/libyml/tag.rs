// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use crate::libyml::cstr;
use std::{
    fmt::{self, Debug},
    ops::Deref,
    str,
};

/// A raw tag as produced by the substrate parser.
///
/// Tags arrive as byte strings; the loader converts them to UTF-8 before
/// any template classification happens.
#[derive(Ord, PartialOrd, Eq, PartialEq)]
pub struct Tag(pub(in crate::libyml) Box<[u8]>);

impl Tag {
    /// The canonical tag for null values.
    pub const NULL: &'static str = "tag:yaml.org,2002:null";

    /// The canonical tag for boolean values.
    pub const BOOL: &'static str = "tag:yaml.org,2002:bool";

    /// The canonical tag for integer values.
    pub const INT: &'static str = "tag:yaml.org,2002:int";

    /// The canonical tag for floating-point values.
    pub const FLOAT: &'static str = "tag:yaml.org,2002:float";

    /// The canonical tag for string values.
    pub const STR: &'static str = "tag:yaml.org,2002:str";

    /// The canonical tag for sequences.
    pub const SEQ: &'static str = "tag:yaml.org,2002:seq";

    /// The canonical tag for mappings.
    pub const MAP: &'static str = "tag:yaml.org,2002:map";

    /// Checks whether the tag starts with the given prefix.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix.as_bytes())
    }

    /// Returns the tag text, or `None` when the substrate produced a tag
    /// that is not valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        str::from_utf8(&self.0).ok()
    }
}

impl PartialEq<str> for Tag {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes().into()
    }
}

impl Deref for Tag {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Debug for Tag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        cstr::debug_lossy(&self.0, formatter)
    }
}
