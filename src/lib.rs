// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

//! # EnYAML
//!
//! ## Template-native YAML rendering for [Rust][00].
//!
//! ## Overview
//!
//! `enyaml` is a template engine whose surface syntax is ordinary YAML:
//! any valid YAML document is a valid template, and nodes without template
//! tags pass through rendering unchanged. Templating is driven entirely by
//! tags in the reserved `tag:enyaml.org,2022:` namespace, which the `!`
//! shorthand resolves to:
//!
//! - `!$` evaluates an embedded expression against the render context
//! - `!$f` interpolates `{name}` placeholders from the context
//! - `!set` merges a mapping into the context and vanishes from output
//! - `!if` picks the first branch whose test is truthy
//! - `!for` loops over a sequence, string or mapping key-set
//!
//! Rendering walks the composed node tree depth-first, maintains a stack
//! of variable scopes, and produces a plain YAML node tree that constructs
//! into a [`Value`] or dumps back to YAML text. A `~` flag on any template
//! tag (`!$~`, `!for~`, …) inhibits rendering and round-trips the node
//! through emission in template form.
//!
//! ## Examples
//!
//! Expressions adopt their native YAML type:
//!
//! ```
//! fn main() -> Result<(), enyaml::Error> {
//!     let mut ctx = enyaml::Context::new();
//!     let value = enyaml::render("x: !$ 1 + 1", &mut ctx)?;
//!     assert_eq!(value["x"], 2);
//!     Ok(())
//! }
//! ```
//!
//! A `!set`-only document feeds the documents after it:
//!
//! ```
//! fn main() -> Result<(), enyaml::Error> {
//!     let template = "---\n!set\nname: Guido\n---\ngreeting: !$f 'Hello, {name}'\n";
//!     let mut ctx = enyaml::Context::new();
//!     let value = enyaml::render(template, &mut ctx)?;
//!     assert_eq!(value["greeting"], "Hello, Guido");
//!     Ok(())
//! }
//! ```
//!
//! Loops bind names per element and can filter:
//!
//! ```
//! fn main() -> Result<(), enyaml::Error> {
//!     let mut ctx = enyaml::Context::new();
//!     ctx.set("ports", enyaml::to_value(&[8080u16, 8081, 9090])?);
//!     let value = enyaml::render(
//!         "!for [{!$ ports: p, ret: !$f 'port-{p}', if: !$ p < 9000}]",
//!         &mut ctx,
//!     )?;
//!     assert_eq!(value[0], "port-8080");
//!     assert_eq!(value[1], "port-8081");
//!     Ok(())
//! }
//! ```
//!
//! [00]: https://www.rust-lang.org/ "Rust"

#![deny(missing_docs)]

use std::io;

pub use crate::context::{Context, Scope};
pub use crate::dumper::{DumperConfig, TemplateDumper};
pub use crate::loader::{LoaderConfig, PathSegment, Progress, TemplateLoader};
pub use crate::mapping::Mapping;
pub use crate::modules::error::{Error, ErrorImpl, Location, Result};
pub use crate::node::{ForForm, Node, NodeKind, TagProps};
pub use crate::number::Number;
#[doc(inline)]
pub use crate::value::{from_value, to_value, Sequence, Value};

/// The `context` module contains the scoped variable context.
mod context;

/// The `dumper` module contains the template-aware dumper.
pub mod dumper;

/// The `expr` module contains the embedded expression language.
pub mod expr;

/// The `libyml` module contains the substrate parser and emitter.
pub mod libyml;

/// The `loader` module contains the template-aware loader.
pub mod loader;

/// The `macros` module contains the crate's helper macros.
pub mod macros;

/// The `mapping` module contains the `Mapping` type for YAML mappings.
mod mapping;

/// The `modules` module contains the library's error plumbing.
pub mod modules;

/// The `node` module contains the template node model.
mod node;

/// The `number` module contains the `Number` type for YAML numbers.
mod number;

/// The `render` module contains the template tree walk.
mod render;

/// The `resolver` module contains implicit scalar resolution.
mod resolver;

/// The `tag` module contains the template tag codec.
pub mod tag;

/// The `value` module contains the `Value` type for YAML values.
pub mod value;

/// Loads and renders a single-document template from a string.
///
/// The input may hold several documents as long as only the last one
/// produces output; leading `!set`-only documents feed the context.
/// Renders to [`Value::Null`] when the stream is empty.
pub fn render(input: &str, ctx: &mut Context) -> Result<Value> {
    TemplateLoader::new(Progress::Str(input))?.render_single(ctx)
}

/// Like [`render`], reading the template from `rdr`.
pub fn render_from_reader<R>(rdr: R, ctx: &mut Context) -> Result<Value>
where
    R: io::Read,
{
    let mut buffer = Vec::new();
    let mut rdr = rdr;
    rdr.read_to_end(&mut buffer)?;
    let mut loader = TemplateLoader::new(Progress::Slice(&buffer))?;
    loader.render_single(ctx)
}

/// Renders every document of a template stream lazily.
///
/// Documents that produce no output (`!set`-only documents) are consumed
/// silently; context updates persist across documents. After the first
/// error the iterator fuses.
pub fn render_all<'input, 'ctx>(
    input: &'input str,
    ctx: &'ctx mut Context,
) -> Result<RenderAll<'input, 'ctx>> {
    Ok(RenderAll {
        loader: TemplateLoader::new(Progress::Str(input))?,
        ctx,
        failed: false,
    })
}

/// The lazy iterator returned by [`render_all`].
pub struct RenderAll<'input, 'ctx> {
    loader: TemplateLoader<'input>,
    ctx: &'ctx mut Context,
    failed: bool,
}

impl Iterator for RenderAll<'_, '_> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.loader.render_next(self.ctx) {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => None,
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Loads a single document without rendering it.
///
/// Template constructs (`!$`, `!$f`, `!set`, `!if`, `!for`) are an error
/// unless flagged unrendered (`~`); use [`render`] for templates meant to
/// be evaluated.
pub fn load(input: &str) -> Result<Value> {
    let mut loader = TemplateLoader::new(Progress::Str(input))?;
    let value = match loader.next_document()? {
        Some(node) => Some(loader.config().construct(&node)?),
        None => None,
    };
    if loader.check_document()? {
        return Err(crate::modules::error::new(ErrorImpl::MoreThanOneDocument(
            None,
        )));
    }
    Ok(value.unwrap_or(Value::Null))
}

/// Loads every document of a stream without rendering.
pub fn load_all(input: &str) -> Result<Vec<Value>> {
    let mut loader = TemplateLoader::new(Progress::Str(input))?;
    let mut values = Vec::new();
    while let Some(node) = loader.next_document()? {
        values.push(loader.config().construct(&node)?);
    }
    Ok(values)
}

/// Composes a single document into its node tree without constructing or
/// rendering. `Ok(None)` for an empty stream.
pub fn compose(input: &str) -> Result<Option<Node>> {
    let mut loader = TemplateLoader::new(Progress::Str(input))?;
    let node = loader.next_document()?;
    if loader.check_document()? {
        return Err(crate::modules::error::new(ErrorImpl::MoreThanOneDocument(
            None,
        )));
    }
    Ok(node)
}

/// Composes every document of a stream into node trees.
pub fn compose_all(input: &str) -> Result<Vec<Node>> {
    let mut loader = TemplateLoader::new(Progress::Str(input))?;
    let mut nodes = Vec::new();
    while let Some(node) = loader.next_document()? {
        nodes.push(node);
    }
    Ok(nodes)
}

/// Parses the input into its raw event stream, with the mark of each
/// event.
pub fn parse(input: &str) -> Result<Vec<(libyml::parser::Event, libyml::error::Mark)>> {
    let mut parser = libyml::parser::Parser::new(std::borrow::Cow::Borrowed(input.as_bytes()));
    let mut events = Vec::new();
    loop {
        let (event, mark) = parser.parse_next_event()?;
        let done = matches!(event, libyml::parser::Event::StreamEnd);
        events.push((event, mark));
        if done {
            return Ok(events);
        }
    }
}

/// Dumps one value as a YAML document.
pub fn dump(value: &Value) -> Result<String> {
    dump_all([value])
}

/// Dumps a stream of values as YAML documents separated by `---`.
pub fn dump_all<'v, I>(values: I) -> Result<String>
where
    I: IntoIterator<Item = &'v Value>,
{
    let mut buffer = Vec::new();
    {
        let mut dumper = TemplateDumper::new(Box::new(&mut buffer));
        for value in values {
            dumper.dump(value)?;
        }
        dumper.finish()?;
    }
    Ok(String::from_utf8(buffer)?)
}

/// Dumps one value into a writer.
pub fn to_writer<W>(writer: W, value: &Value) -> Result<()>
where
    W: io::Write,
{
    let mut writer = writer;
    let mut dumper = TemplateDumper::new(Box::new(&mut writer));
    dumper.dump(value)?;
    dumper.finish()
}

/// Serializes one node tree as a YAML document, template tags restored.
pub fn serialize(node: &Node) -> Result<String> {
    serialize_all([node])
}

/// Serializes a stream of node trees as YAML documents.
pub fn serialize_all<'n, I>(nodes: I) -> Result<String>
where
    I: IntoIterator<Item = &'n Node>,
{
    let mut buffer = Vec::new();
    {
        let mut dumper = TemplateDumper::new(Box::new(&mut buffer));
        for node in nodes {
            dumper.serialize(node)?;
        }
        dumper.finish()?;
    }
    Ok(String::from_utf8(buffer)?)
}

/// Emits a raw event stream as YAML text. The events must form a complete
/// stream, `StreamStart` through `StreamEnd`.
pub fn emit<'a, I>(events: I) -> Result<String>
where
    I: IntoIterator<Item = libyml::emitter::Event<'a>>,
{
    let mut buffer = Vec::new();
    {
        let mut emitter = libyml::emitter::Emitter::new(Box::new(&mut buffer));
        for event in events {
            emitter.emit(event)?;
        }
        emitter.flush()?;
    }
    Ok(String::from_utf8(buffer)?)
}
