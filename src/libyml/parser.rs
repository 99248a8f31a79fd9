// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use crate::libyml::{
    cstr::{self, CStr},
    error::{Error, Mark, Result},
    tag::Tag,
    util::Owned,
};
use std::{
    borrow::Cow,
    fmt::{self, Debug},
    mem::MaybeUninit,
    ptr::{addr_of_mut, NonNull},
    slice,
};
#[allow(clippy::unsafe_removed_from_name)]
use libyml as sys;

/// Event-level YAML parser.
///
/// Wraps the `libyml` parser and yields a sequence of [`Event`]s with their
/// source [`Mark`]s. The template loader sits on top of this stream and
/// rewrites tags before composition; the parser itself knows nothing about
/// templates.
///
/// The `'input` lifetime ties the parser to the input data being parsed.
#[derive(Debug)]
pub struct Parser<'input> {
    /// The pinned parser state.
    ///
    /// Pinning keeps the underlying `YamlParserT` at a fixed memory
    /// location, which libyml requires once the parser is initialized.
    pin: Owned<ParserPinned<'input>>,
}

/// The pinned libyml parser state together with the input it borrows.
#[derive(Debug)]
pub struct ParserPinned<'input> {
    /// The underlying `YamlParserT` struct from the `libyml` library.
    sys: sys::YamlParserT,

    /// The input data being parsed, borrowed or owned.
    input: Cow<'input, [u8]>,
}

/// A YAML event encountered during parsing.
#[derive(Debug)]
pub enum Event {
    /// Indicates the start of a YAML stream.
    StreamStart,

    /// Indicates the end of a YAML stream.
    StreamEnd,

    /// Indicates the start of a YAML document.
    DocumentStart,

    /// Indicates the end of a YAML document.
    DocumentEnd,

    /// An alias referring to a previously anchored node.
    Alias(Anchor),

    /// A scalar value together with its tag, style and anchor.
    Scalar(Scalar),

    /// The start of a sequence, with its tag, style and anchor.
    SequenceStart(SequenceStart),

    /// The end of a sequence.
    SequenceEnd,

    /// The start of a mapping, with its tag, style and anchor.
    MappingStart(MappingStart),

    /// The end of a mapping.
    MappingEnd,
}

/// A scalar value in a YAML document.
pub struct Scalar {
    /// The anchor declared on the scalar, if any.
    pub anchor: Option<Anchor>,

    /// The tag attached to the scalar, if any. Untagged plain scalars are
    /// resolved later by the implicit resolver.
    pub tag: Option<Tag>,

    /// The scalar text, as raw bytes.
    pub value: Box<[u8]>,

    /// How the scalar was written in the source.
    pub style: ScalarStyle,
}

/// The start of a sequence in a YAML document.
#[derive(Debug)]
pub struct SequenceStart {
    /// The anchor declared on the sequence, if any.
    pub anchor: Option<Anchor>,

    /// The tag attached to the sequence, if any.
    pub tag: Option<Tag>,

    /// Whether the sequence was written in flow style (`[a, b]`).
    pub flow: bool,
}

/// The start of a mapping in a YAML document.
#[derive(Debug)]
pub struct MappingStart {
    /// The anchor declared on the mapping, if any.
    pub anchor: Option<Anchor>,

    /// The tag attached to the mapping, if any.
    pub tag: Option<Tag>,

    /// Whether the mapping was written in flow style (`{a: b}`).
    pub flow: bool,
}

/// A named reference to a node, declared with `&name`.
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq)]
pub struct Anchor(pub(crate) Box<[u8]>);

/// The style a scalar was written in.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ScalarStyle {
    /// A plain, unquoted scalar.
    Plain,

    /// A single-quoted scalar.
    SingleQuoted,

    /// A double-quoted scalar.
    DoubleQuoted,

    /// A literal block scalar (`|`).
    Literal,

    /// A folded block scalar (`>`).
    Folded,
}

impl<'input> Parser<'input> {
    /// Creates a new `Parser` over the given input bytes.
    ///
    /// # Panics
    ///
    /// Panics if libyml fails to allocate its parser state.
    pub fn new(input: Cow<'input, [u8]>) -> Parser<'input> {
        let owned = Owned::<ParserPinned<'input>>::new_uninit();
        let pin = unsafe {
            let parser = addr_of_mut!((*owned.ptr).sys);
            if sys::yaml_parser_initialize(parser).fail {
                panic!("malloc error: {}", Error::parse_error(parser));
            }
            sys::yaml_parser_set_encoding(parser, sys::YamlUtf8Encoding);
            sys::yaml_parser_set_input_string(parser, input.as_ptr(), input.len() as u64);
            addr_of_mut!((*owned.ptr).input).write(input);
            Owned::assume_init(owned)
        };
        Parser { pin }
    }

    /// Parses the next YAML event from the input.
    ///
    /// Returns the parsed [`Event`] and the mark of its first character, or
    /// an [`Error`] when the input is malformed.
    pub fn parse_next_event(&mut self) -> Result<(Event, Mark)> {
        let mut event = MaybeUninit::<sys::YamlEventT>::uninit();
        unsafe {
            let parser = addr_of_mut!((*self.pin.ptr).sys);
            if (&(*parser)).error != sys::YamlNoError {
                return Err(Error::parse_error(parser));
            }
            let event = event.as_mut_ptr();
            if sys::yaml_parser_parse(parser, event).fail {
                return Err(Error::parse_error(parser));
            }
            let ret = convert_event(&*event);
            let mark = Mark {
                sys: (*event).start_mark,
            };
            sys::yaml_event_delete(event);
            Ok((ret, mark))
        }
    }
}

unsafe fn convert_event(sys: &sys::YamlEventT) -> Event {
    match sys.type_ {
        sys::YamlStreamStartEvent => Event::StreamStart,
        sys::YamlStreamEndEvent => Event::StreamEnd,
        sys::YamlDocumentStartEvent => Event::DocumentStart,
        sys::YamlDocumentEndEvent => Event::DocumentEnd,
        sys::YamlAliasEvent => {
            Event::Alias(unsafe { optional_anchor(sys.data.alias.anchor) }.unwrap())
        }
        sys::YamlScalarEvent => {
            let value_slice =
                slice::from_raw_parts(sys.data.scalar.value, sys.data.scalar.length as usize);
            Event::Scalar(Scalar {
                anchor: optional_anchor(sys.data.scalar.anchor),
                tag: optional_tag(sys.data.scalar.tag),
                value: Box::from(value_slice),
                style: match sys.data.scalar.style {
                    sys::YamlScalarStyleT::YamlPlainScalarStyle => ScalarStyle::Plain,
                    sys::YamlScalarStyleT::YamlSingleQuotedScalarStyle => ScalarStyle::SingleQuoted,
                    sys::YamlScalarStyleT::YamlDoubleQuotedScalarStyle => ScalarStyle::DoubleQuoted,
                    sys::YamlScalarStyleT::YamlLiteralScalarStyle => ScalarStyle::Literal,
                    sys::YamlScalarStyleT::YamlFoldedScalarStyle => ScalarStyle::Folded,
                    _ => unreachable!(),
                },
            })
        }
        sys::YamlSequenceStartEvent => Event::SequenceStart(SequenceStart {
            anchor: unsafe { optional_anchor(sys.data.sequence_start.anchor) },
            tag: unsafe { optional_tag(sys.data.sequence_start.tag) },
            flow: matches!(
                sys.data.sequence_start.style,
                sys::YamlSequenceStyleT::YamlFlowSequenceStyle
            ),
        }),
        sys::YamlSequenceEndEvent => Event::SequenceEnd,
        sys::YamlMappingStartEvent => Event::MappingStart(MappingStart {
            anchor: unsafe { optional_anchor(sys.data.mapping_start.anchor) },
            tag: unsafe { optional_tag(sys.data.mapping_start.tag) },
            flow: matches!(
                sys.data.mapping_start.style,
                sys::YamlMappingStyleT::YamlFlowMappingStyle
            ),
        }),
        sys::YamlMappingEndEvent => Event::MappingEnd,
        sys::YamlNoEvent => unreachable!(),
        _ => unreachable!(),
    }
}

unsafe fn optional_anchor(anchor: *const u8) -> Option<Anchor> {
    let ptr = NonNull::new(anchor as *mut i8)?;
    let cstr = CStr::from_ptr(ptr);
    Some(Anchor(Box::from(cstr.to_bytes())))
}

unsafe fn optional_tag(tag: *const u8) -> Option<Tag> {
    let ptr = NonNull::new(tag as *mut i8)?;
    let cstr = CStr::from_ptr(ptr);
    Some(Tag(Box::from(cstr.to_bytes())))
}

impl Debug for Scalar {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Scalar {
            anchor,
            tag,
            value,
            style,
        } = self;

        struct LossySlice<'a>(&'a [u8]);

        impl Debug for LossySlice<'_> {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                cstr::debug_lossy(self.0, formatter)
            }
        }

        formatter
            .debug_struct("Scalar")
            .field("anchor", anchor)
            .field("tag", tag)
            .field("value", &LossySlice(value))
            .field("style", style)
            .finish()
    }
}

impl Debug for Anchor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        cstr::debug_lossy(&self.0, formatter)
    }
}

impl Drop for ParserPinned<'_> {
    fn drop(&mut self) {
        unsafe { sys::yaml_parser_delete(&mut self.sys) }
    }
}
