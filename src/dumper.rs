// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use crate::libyml::emitter::{
    CollectionStyle, Emitter, Event, Mapping as MappingEvent, Scalar as ScalarEvent, ScalarStyle,
    Sequence as SequenceEvent,
};
use crate::libyml::parser;
use crate::libyml::tag::Tag;
use crate::modules::error::Result;
use crate::node::{node_from_value, ForForm, Node, NodeKind, TagProps};
use crate::tag::shorthand;
use crate::value::tagged::TaggedValue;
use crate::{resolver, Value};
use std::collections::BTreeMap;
use std::io;

/// A custom representer for one exact tag.
pub type RepresenterFn = Box<dyn Fn(&TaggedValue) -> Result<Node> + Send + Sync>;

/// A custom representer for every tag under a prefix.
pub type MultiRepresenterFn = Box<dyn Fn(&str, &TaggedValue) -> Result<Node> + Send + Sync>;

/// Registration surface for representation on the template dumper.
///
/// Representers apply to [`Value::Tagged`] values whose tag matches; a
/// custom representer chooses the node a tagged value becomes.
#[derive(Default)]
pub struct DumperConfig {
    representers: BTreeMap<String, RepresenterFn>,
    multi_representers: Vec<(String, MultiRepresenterFn)>,
}

impl DumperConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        DumperConfig::default()
    }

    /// Registers a representer for an exact tag (without the leading `!`).
    pub fn add_representer(&mut self, tag: impl Into<String>, representer: RepresenterFn) {
        self.representers.insert(tag.into(), representer);
    }

    /// Registers a representer for every tag starting with `prefix`.
    pub fn add_multi_representer(
        &mut self,
        prefix: impl Into<String>,
        representer: MultiRepresenterFn,
    ) {
        self.multi_representers.push((prefix.into(), representer));
    }

    /// Builds the node a value is emitted as.
    pub fn represent(&self, value: &Value) -> Result<Node> {
        if let Value::Tagged(tagged) = value {
            if let Some(representer) = self.representers.get(&tagged.tag.string) {
                return representer(tagged);
            }
            if let Some((_, representer)) = self
                .multi_representers
                .iter()
                .find(|(prefix, _)| tagged.tag.string.starts_with(prefix.as_str()))
            {
                return representer(&tagged.tag.string, tagged);
            }
        }
        Ok(node_from_value(value, None, None))
    }
}

/// Emits values and node trees back to YAML text.
///
/// Template nodes are restored to their `!basetag[~][:subtag]` shorthand
/// form; plain nodes drop every tag the implicit resolver would put back
/// on its own, so rendered output reads like ordinary YAML.
pub struct TemplateDumper<'a> {
    emitter: Emitter<'a>,
    config: DumperConfig,
    documents: usize,
    opened: bool,
}

impl<'a> TemplateDumper<'a> {
    /// Creates a dumper with the default configuration.
    pub fn new(writer: Box<dyn io::Write + 'a>) -> Self {
        Self::with_config(writer, DumperConfig::default())
    }

    /// Creates a dumper with a custom [`DumperConfig`].
    pub fn with_config(writer: Box<dyn io::Write + 'a>, config: DumperConfig) -> Self {
        TemplateDumper {
            emitter: Emitter::new(writer),
            config,
            documents: 0,
            opened: false,
        }
    }

    /// The dumper's configuration.
    pub fn config(&self) -> &DumperConfig {
        &self.config
    }

    /// Emits one value as a document.
    pub fn dump(&mut self, value: &Value) -> Result<()> {
        let node = self.config.represent(value)?;
        self.serialize(&node)
    }

    /// Emits one node tree as a document.
    pub fn serialize(&mut self, node: &Node) -> Result<()> {
        if !self.opened {
            self.emitter.emit(Event::StreamStart)?;
            self.opened = true;
        }
        self.emitter.emit(Event::DocumentStart(self.documents == 0))?;
        self.documents += 1;
        self.serialize_node(node)?;
        self.emitter.emit(Event::DocumentEnd)?;
        Ok(())
    }

    /// Ends the stream and flushes the writer.
    pub fn finish(&mut self) -> Result<()> {
        if !self.opened {
            self.emitter.emit(Event::StreamStart)?;
            self.opened = true;
        }
        self.emitter.emit(Event::StreamEnd)?;
        self.emitter.flush()?;
        Ok(())
    }

    /// Retrieves the inner writer.
    pub fn into_inner(self) -> Box<dyn io::Write + 'a> {
        self.emitter.into_inner()
    }

    fn serialize_node(&mut self, node: &Node) -> Result<()> {
        match &node.tag {
            TagProps::Template {
                subtag,
                skip_render,
            } => {
                let tag = template_tag(node, subtag.as_deref(), *skip_render);
                self.serialize_template(node, tag)
            }
            TagProps::Plain(tag) => self.serialize_plain(node, tag.as_deref()),
        }
    }

    /// Emits a template node in its shorthand tag form.
    fn serialize_template(&mut self, node: &Node, tag: Option<String>) -> Result<()> {
        match &node.kind {
            NodeKind::Scalar { value, style } => self.emit_scalar(tag, value, node_style(*style)),
            NodeKind::Expr { source } | NodeKind::Fmt { source } | NodeKind::ForHeader { source } => {
                self.emit_scalar(tag, source, ScalarStyle::Any)
            }
            NodeKind::Sequence { items, flow } => {
                self.emit_sequence(tag, items, collection_style(*flow))
            }
            NodeKind::If { branches } => self.emit_sequence(tag, branches, CollectionStyle::Any),
            NodeKind::Mapping { entries, flow } => {
                self.emit_mapping(tag, entries, collection_style(*flow))
            }
            NodeKind::Set { entries } => self.emit_mapping(tag, entries, CollectionStyle::Any),
            NodeKind::For { entries, form } => match form {
                ForForm::Mapping => self.emit_mapping(tag, entries, CollectionStyle::Any),
                ForForm::Sequence => {
                    // Canonical sequence-of-single-mapping form.
                    self.emitter.emit(Event::SequenceStart(SequenceEvent {
                        tag,
                        style: CollectionStyle::Any,
                    }))?;
                    self.emit_mapping(None, entries, CollectionStyle::Any)?;
                    self.emitter.emit(Event::SequenceEnd)?;
                    Ok(())
                }
            },
        }
    }

    /// Emits a plain node, dropping tags the implicit resolver recomputes.
    fn serialize_plain(&mut self, node: &Node, tag: Option<&str>) -> Result<()> {
        match &node.kind {
            NodeKind::Scalar { value, style } => {
                let (tag, style) = plain_scalar_form(tag, value, *style);
                self.emit_scalar(tag, value, style)
            }
            NodeKind::Sequence { items, flow } => {
                let tag = collection_tag(tag, Tag::SEQ);
                self.emit_sequence(tag, items, collection_style(*flow))
            }
            NodeKind::Mapping { entries, flow } => {
                let tag = collection_tag(tag, Tag::MAP);
                self.emit_mapping(tag, entries, collection_style(*flow))
            }
            _ => unreachable!("template kinds always carry template tags"),
        }
    }

    fn emit_scalar(&mut self, tag: Option<String>, value: &str, style: ScalarStyle) -> Result<()> {
        self.emitter.emit(Event::Scalar(ScalarEvent {
            tag,
            value,
            style,
        }))?;
        Ok(())
    }

    fn emit_sequence(
        &mut self,
        tag: Option<String>,
        items: &[Node],
        style: CollectionStyle,
    ) -> Result<()> {
        self.emitter
            .emit(Event::SequenceStart(SequenceEvent { tag, style }))?;
        for item in items {
            self.serialize_node(item)?;
        }
        self.emitter.emit(Event::SequenceEnd)?;
        Ok(())
    }

    fn emit_mapping(
        &mut self,
        tag: Option<String>,
        entries: &[(Node, Node)],
        style: CollectionStyle,
    ) -> Result<()> {
        self.emitter
            .emit(Event::MappingStart(MappingEvent { tag, style }))?;
        for (key, value) in entries {
            self.serialize_node(key)?;
            self.serialize_node(value)?;
        }
        self.emitter.emit(Event::MappingEnd)?;
        Ok(())
    }
}

/// The shorthand tag a template node re-emits with, or `None` for a bare
/// transparent template.
fn template_tag(node: &Node, subtag: Option<&str>, skip_render: bool) -> Option<String> {
    // A subtag equal to the default tag for the kind carries no
    // information and is dropped.
    let subtag = subtag.filter(|subtag| *subtag != node.default_tag());
    let basetag = node.basetag();
    if basetag == "tmpl" && !skip_render && subtag.is_none() {
        return None;
    }
    let mut tag = String::from("!");
    tag.push_str(basetag);
    if skip_render {
        tag.push('~');
    }
    if let Some(subtag) = subtag {
        tag.push(':');
        tag.push_str(&shorthand(subtag));
    }
    Some(tag)
}

/// Decides the tag and style a plain scalar is emitted with.
fn plain_scalar_form(
    tag: Option<&str>,
    value: &str,
    style: parser::ScalarStyle,
) -> (Option<String>, ScalarStyle) {
    let Some(tag) = tag else {
        return (None, node_style(style));
    };
    let resolved = resolver::resolve_plain(value);
    if tag == Tag::STR {
        if resolved == Tag::STR || style != parser::ScalarStyle::Plain {
            // Already reads back as a string.
            return (None, node_style(style));
        }
        // Quote a string that would otherwise resolve as something else.
        return (None, ScalarStyle::SingleQuoted);
    }
    if tag == resolved {
        return (None, ScalarStyle::Plain);
    }
    (Some(tag.to_owned()), node_style(style))
}

fn collection_tag(tag: Option<&str>, default: &str) -> Option<String> {
    match tag {
        None => None,
        Some(tag) if tag == default => None,
        Some(tag) => Some(tag.to_owned()),
    }
}

fn node_style(style: parser::ScalarStyle) -> ScalarStyle {
    match style {
        parser::ScalarStyle::Plain => ScalarStyle::Plain,
        parser::ScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
        parser::ScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
        parser::ScalarStyle::Literal => ScalarStyle::Literal,
        parser::ScalarStyle::Folded => ScalarStyle::Folded,
    }
}

fn collection_style(flow: bool) -> CollectionStyle {
    if flow {
        CollectionStyle::Flow
    } else {
        CollectionStyle::Block
    }
}
