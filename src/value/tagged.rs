// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use crate::Value;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt::{self, Display};

/// A custom tag attached to a [`Value`].
///
/// Stored without the leading `!`; [`Display`] adds it back.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    /// The tag text, without a leading `!`.
    pub string: String,
}

impl Tag {
    /// Creates a tag, stripping one leading `!` if present.
    ///
    /// # Panics
    ///
    /// Panics if the tag text is empty.
    pub fn new(string: impl Into<String>) -> Self {
        let string = string.into();
        assert!(!string.is_empty(), "empty YAML tag is not allowed");
        Tag {
            string: nobang(&string).to_owned(),
        }
    }
}

impl TryFrom<&[u8]> for Tag {
    type Error = std::str::Utf8Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Ok(Tag::new(std::str::from_utf8(bytes)?))
    }
}

impl PartialEq<str> for Tag {
    fn eq(&self, other: &str) -> bool {
        self.string == nobang(other)
    }
}

impl PartialEq<&str> for Tag {
    fn eq(&self, other: &&str) -> bool {
        self.string == nobang(other)
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "!{}", self.string)
    }
}

/// A value together with its custom tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaggedValue {
    /// The tag.
    pub tag: Tag,
    /// The tagged value.
    pub value: Value,
}

impl TaggedValue {
    /// Returns a deep copy of this tagged value.
    pub fn copy(&self) -> TaggedValue {
        self.clone()
    }
}

impl Serialize for TaggedValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Foreign serializers see a tagged value as a single-entry map
        // keyed by the `!tag` spelling.
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.tag.to_string(), &self.value)?;
        map.end()
    }
}

/// Removes one leading `!` from a tag spelling.
pub fn nobang(tag: &str) -> &str {
    tag.strip_prefix('!').unwrap_or(tag)
}
