// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use crate::libyml::error as substrate;
use crate::libyml::util::Owned;
use std::ffi::c_void;
use std::io;
use std::mem::{self, MaybeUninit};
use std::ptr::{self, addr_of_mut};
use std::slice;
#[allow(clippy::unsafe_removed_from_name)]
use libyml as sys;

/// Errors that can occur during YAML emission.
#[derive(Debug)]
pub enum Error {
    /// An error reported by libyml.
    Libyml(substrate::Error),
    /// An I/O error from the output writer.
    Io(io::Error),
}

/// Event-level YAML emitter.
///
/// Wraps the `libyml` emitter. The template dumper serializes node trees
/// into this event stream; the emitter itself only turns events into text.
pub struct Emitter<'a> {
    pin: Owned<EmitterPinned<'a>>,
}

struct EmitterPinned<'a> {
    sys: sys::YamlEmitterT,
    write: Box<dyn io::Write + 'a>,
    write_error: Option<io::Error>,
}

/// An event to be emitted.
#[derive(Debug)]
pub enum Event<'a> {
    /// Start of a YAML stream.
    StreamStart,
    /// End of a YAML stream.
    StreamEnd,
    /// Start of a YAML document. `true` lets the emitter omit the `---`
    /// marker; pass `false` for every document after the first.
    DocumentStart(bool),
    /// End of a YAML document.
    DocumentEnd,
    /// Scalar value.
    Scalar(Scalar<'a>),
    /// Start of a sequence.
    SequenceStart(Sequence),
    /// End of a sequence.
    SequenceEnd,
    /// Start of a mapping.
    MappingStart(Mapping),
    /// End of a mapping.
    MappingEnd,
}

/// A scalar to be emitted.
#[derive(Debug)]
pub struct Scalar<'a> {
    /// Tag to emit, or `None` for an implicitly resolvable scalar.
    pub tag: Option<String>,
    /// The scalar text.
    pub value: &'a str,
    /// Requested scalar style.
    pub style: ScalarStyle,
}

/// Requested style for an emitted scalar.
#[derive(Debug, Copy, Clone)]
pub enum ScalarStyle {
    /// Let the emitter choose.
    Any,
    /// Plain, unquoted.
    Plain,
    /// Single quoted.
    SingleQuoted,
    /// Double quoted.
    DoubleQuoted,
    /// Literal block style.
    Literal,
    /// Folded block style.
    Folded,
}

/// Requested style for an emitted collection.
#[derive(Debug, Copy, Clone)]
pub enum CollectionStyle {
    /// Let the emitter choose.
    Any,
    /// Block style.
    Block,
    /// Flow style (`[a, b]` / `{a: b}`).
    Flow,
}

/// A sequence start to be emitted.
#[derive(Debug)]
pub struct Sequence {
    /// Tag to emit, or `None` for a plain sequence.
    pub tag: Option<String>,
    /// Requested collection style.
    pub style: CollectionStyle,
}

/// A mapping start to be emitted.
#[derive(Debug)]
pub struct Mapping {
    /// Tag to emit, or `None` for a plain mapping.
    pub tag: Option<String>,
    /// Requested collection style.
    pub style: CollectionStyle,
}

impl<'a> Emitter<'a> {
    /// Creates a new YAML emitter writing to `write`.
    ///
    /// # Panics
    ///
    /// Panics if libyml fails to allocate its emitter state.
    pub fn new(write: Box<dyn io::Write + 'a>) -> Emitter<'a> {
        let owned = Owned::<EmitterPinned<'a>>::new_uninit();
        let pin = unsafe {
            let emitter = addr_of_mut!((*owned.ptr).sys);
            if sys::yaml_emitter_initialize(emitter).fail {
                panic!("malloc error: {}", substrate::Error::emit_error(emitter));
            }
            sys::yaml_emitter_set_unicode(emitter, true);
            sys::yaml_emitter_set_width(emitter, -1);
            addr_of_mut!((*owned.ptr).write).write(write);
            addr_of_mut!((*owned.ptr).write_error).write(None);
            sys::yaml_emitter_set_output(emitter, write_handler, owned.ptr.cast());
            Owned::assume_init(owned)
        };
        Emitter { pin }
    }

    /// Emits a single YAML event.
    pub fn emit(&mut self, event: Event<'_>) -> Result<(), Error> {
        let mut sys_event = MaybeUninit::<sys::YamlEventT>::uninit();
        let sys_event = sys_event.as_mut_ptr();
        unsafe {
            let emitter = addr_of_mut!((*self.pin.ptr).sys);
            let initialize_status = match event {
                Event::StreamStart => {
                    sys::yaml_stream_start_event_initialize(sys_event, sys::YamlUtf8Encoding)
                }
                Event::StreamEnd => sys::yaml_stream_end_event_initialize(sys_event),
                Event::DocumentStart(implicit) => {
                    let version_directive = ptr::null_mut();
                    let tag_directives_start = ptr::null_mut();
                    let tag_directives_end = ptr::null_mut();
                    sys::yaml_document_start_event_initialize(
                        sys_event,
                        version_directive,
                        tag_directives_start,
                        tag_directives_end,
                        implicit,
                    )
                }
                Event::DocumentEnd => {
                    let implicit = true;
                    sys::yaml_document_end_event_initialize(sys_event, implicit)
                }
                Event::Scalar(mut scalar) => {
                    let anchor = ptr::null();
                    let tag = scalar.tag.as_mut().map_or_else(ptr::null, |tag| {
                        tag.push('\0');
                        tag.as_ptr()
                    });
                    let value = scalar.value.as_ptr();
                    let length = scalar.value.len() as i32;
                    let plain_implicit = tag.is_null();
                    let quoted_implicit = tag.is_null();
                    let style = match scalar.style {
                        ScalarStyle::Any => sys::YamlScalarStyleT::YamlAnyScalarStyle,
                        ScalarStyle::Plain => sys::YamlScalarStyleT::YamlPlainScalarStyle,
                        ScalarStyle::SingleQuoted => {
                            sys::YamlScalarStyleT::YamlSingleQuotedScalarStyle
                        }
                        ScalarStyle::DoubleQuoted => {
                            sys::YamlScalarStyleT::YamlDoubleQuotedScalarStyle
                        }
                        ScalarStyle::Literal => sys::YamlScalarStyleT::YamlLiteralScalarStyle,
                        ScalarStyle::Folded => sys::YamlScalarStyleT::YamlFoldedScalarStyle,
                    };
                    sys::yaml_scalar_event_initialize(
                        sys_event,
                        sys::api::ScalarEventData {
                            anchor,
                            tag,
                            value,
                            length,
                            plain_implicit,
                            quoted_implicit,
                            style,
                            _marker: core::marker::PhantomData,
                        },
                    )
                }
                Event::SequenceStart(mut sequence) => {
                    let anchor = ptr::null();
                    let tag = sequence.tag.as_mut().map_or_else(ptr::null, |tag| {
                        tag.push('\0');
                        tag.as_ptr()
                    });
                    let implicit = tag.is_null();
                    let style = match sequence.style {
                        CollectionStyle::Any => sys::YamlSequenceStyleT::YamlAnySequenceStyle,
                        CollectionStyle::Block => sys::YamlSequenceStyleT::YamlBlockSequenceStyle,
                        CollectionStyle::Flow => sys::YamlSequenceStyleT::YamlFlowSequenceStyle,
                    };
                    sys::yaml_sequence_start_event_initialize(
                        sys_event, anchor, tag, implicit, style,
                    )
                }
                Event::SequenceEnd => sys::yaml_sequence_end_event_initialize(sys_event),
                Event::MappingStart(mut mapping) => {
                    let anchor = ptr::null();
                    let tag = mapping.tag.as_mut().map_or_else(ptr::null, |tag| {
                        tag.push('\0');
                        tag.as_ptr()
                    });
                    let implicit = tag.is_null();
                    let style = match mapping.style {
                        CollectionStyle::Any => sys::YamlMappingStyleT::YamlAnyMappingStyle,
                        CollectionStyle::Block => sys::YamlMappingStyleT::YamlBlockMappingStyle,
                        CollectionStyle::Flow => sys::YamlMappingStyleT::YamlFlowMappingStyle,
                    };
                    sys::yaml_mapping_start_event_initialize(sys_event, anchor, tag, implicit, style)
                }
                Event::MappingEnd => sys::yaml_mapping_end_event_initialize(sys_event),
            };
            if initialize_status.fail {
                return Err(Error::Libyml(substrate::Error::emit_error(emitter)));
            }
            if sys::yaml_emitter_emit(emitter, sys_event).fail {
                return Err(self.error());
            }
        }
        Ok(())
    }

    /// Flushes buffered output to the writer.
    pub fn flush(&mut self) -> Result<(), Error> {
        unsafe {
            let emitter = addr_of_mut!((*self.pin.ptr).sys);
            if sys::yaml_emitter_flush(emitter).fail {
                return Err(self.error());
            }
        }
        Ok(())
    }

    /// Retrieves the inner writer from the YAML emitter.
    #[allow(unused_mut)]
    pub fn into_inner(mut self) -> Box<dyn io::Write + 'a> {
        let sink = Box::new(io::sink());
        unsafe { mem::replace(&mut (*self.pin.ptr).write, sink) }
    }

    fn error(&mut self) -> Error {
        let emitter = unsafe { &mut *self.pin.ptr };
        if let Some(write_error) = emitter.write_error.take() {
            Error::Io(write_error)
        } else {
            Error::Libyml(unsafe { substrate::Error::emit_error(&emitter.sys) })
        }
    }
}

unsafe fn write_handler(data: *mut c_void, buffer: *mut u8, size: u64) -> i32 {
    let data = data.cast::<EmitterPinned<'_>>();
    match io::Write::write_all(unsafe { &mut *(*data).write }, unsafe {
        slice::from_raw_parts(buffer, size as usize)
    }) {
        Ok(()) => 1,
        Err(err) => {
            unsafe {
                (*data).write_error = Some(err);
            }
            0
        }
    }
}

impl Drop for EmitterPinned<'_> {
    fn drop(&mut self) {
        unsafe { sys::yaml_emitter_delete(&mut self.sys) }
    }
}
