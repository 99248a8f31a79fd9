// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use crate::libyml::error::Mark;
use crate::libyml::parser::{Event, Parser};
use crate::libyml::tag::Tag;
use crate::modules::error::{self, ErrorImpl, Result};
use crate::modules::path::Path;
use crate::node::{ForForm, Node, NodeKind, TagProps};
use crate::render::Renderer;
use crate::tag::{resolve_subtag_handle, split_tag, TAG_PREFIX};
use crate::value::tagged::{Tag as ValueTag, TaggedValue};
use crate::{resolver, Context, Mapping, Value};
use log::trace;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io;

/// Nesting deeper than this is rejected while composing.
const RECURSION_LIMIT: usize = 128;

/// YAML input for a [`TemplateLoader`].
pub enum Progress<'input> {
    /// A borrowed string slice.
    Str(&'input str),
    /// A borrowed byte slice.
    Slice(&'input [u8]),
    /// A boxed reader; the input is read to the end up front.
    Read(Box<dyn io::Read + 'input>),
}

/// A custom constructor for one exact tag.
pub type ConstructorFn = Box<dyn Fn(&Node) -> Result<Value> + Send + Sync>;

/// A custom constructor for every tag under a prefix.
pub type MultiConstructorFn = Box<dyn Fn(&str, &Node) -> Result<Value> + Send + Sync>;

/// A predicate deciding whether a plain scalar resolves to a custom tag.
pub type ImplicitMatchFn = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// One segment of a path-resolver pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    /// A mapping key with this text.
    Key(String),
    /// A sequence index.
    Index(usize),
    /// Any single key or index.
    Any,
}

/// Registration surface for type handling on the template loader.
///
/// Mirrors the classic YAML loader extension points: exact-tag and
/// prefix-tag constructors, implicit resolvers for plain scalars, and path
/// resolvers assigning tags by document position.
#[derive(Default)]
pub struct LoaderConfig {
    constructors: BTreeMap<String, ConstructorFn>,
    multi_constructors: Vec<(String, MultiConstructorFn)>,
    implicit_resolvers: Vec<(String, ImplicitMatchFn)>,
    path_resolvers: Vec<(String, Vec<PathSegment>)>,
}

impl LoaderConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        LoaderConfig::default()
    }

    /// Registers a constructor for an exact tag.
    pub fn add_constructor(&mut self, tag: impl Into<String>, constructor: ConstructorFn) {
        self.constructors.insert(tag.into(), constructor);
    }

    /// Registers a constructor for every tag starting with `prefix`.
    pub fn add_multi_constructor(
        &mut self,
        prefix: impl Into<String>,
        constructor: MultiConstructorFn,
    ) {
        self.multi_constructors.push((prefix.into(), constructor));
    }

    /// Registers an implicit resolver: a plain, untagged scalar matching
    /// `matches` resolves to `tag`.
    pub fn add_implicit_resolver(&mut self, tag: impl Into<String>, matches: ImplicitMatchFn) {
        self.implicit_resolvers.push((tag.into(), matches));
    }

    /// Registers a path resolver: an untagged plain scalar at a position
    /// matching `path` resolves to `tag`.
    pub fn add_path_resolver(&mut self, tag: impl Into<String>, path: Vec<PathSegment>) {
        self.path_resolvers.push((tag.into(), path));
    }

    fn resolve_by_path(&self, path: &[OwnedSegment]) -> Option<&str> {
        'patterns: for (tag, pattern) in &self.path_resolvers {
            if pattern.len() != path.len() {
                continue;
            }
            for (wanted, actual) in pattern.iter().zip(path) {
                let matched = match (wanted, actual) {
                    (PathSegment::Any, _) => true,
                    (PathSegment::Key(key), OwnedSegment::Key(actual)) => key == actual,
                    (PathSegment::Index(index), OwnedSegment::Index(actual)) => index == actual,
                    _ => false,
                };
                if !matched {
                    continue 'patterns;
                }
            }
            return Some(tag);
        }
        None
    }

    fn resolve_implicit(&self, scalar: &str) -> Option<&str> {
        self.implicit_resolvers
            .iter()
            .find(|(_, matches)| matches(scalar))
            .map(|(tag, _)| tag.as_str())
    }

    /// Constructs a node tree into a [`Value`].
    ///
    /// Transparent (`tmpl`) template nodes construct as their plain
    /// shapes; every other template node is only constructible when
    /// flagged unrendered (`~`), in which case it becomes
    /// [`Value::Template`].
    pub fn construct(&self, node: &Node) -> Result<Value> {
        self.construct_node(node, &Path::Root)
    }

    fn construct_node(&self, node: &Node, path: &Path<'_>) -> Result<Value> {
        if let TagProps::Template {
            subtag,
            skip_render,
        } = &node.tag
        {
            if *skip_render {
                return Ok(Value::Template(Box::new(node.clone())));
            }
            // Transparent templates construct as their plain shapes; the
            // other template kinds have no constructed form.
            let plain_tag = match &node.kind {
                NodeKind::Scalar { value, .. } => subtag
                    .clone()
                    .unwrap_or_else(|| resolver::resolve_plain(value).to_owned()),
                NodeKind::Sequence { .. } => {
                    subtag.clone().unwrap_or_else(|| Tag::SEQ.to_owned())
                }
                NodeKind::Mapping { .. } => subtag.clone().unwrap_or_else(|| Tag::MAP.to_owned()),
                _ => return Err(error::new(ErrorImpl::ConstructTemplate(node.mark))),
            };
            let mut stripped = node.clone();
            stripped.tag = TagProps::Plain(Some(plain_tag));
            return self.construct_node(&stripped, path);
        }
        let TagProps::Plain(tag) = &node.tag else {
            unreachable!("template nodes are handled above");
        };
        if let Some(tag) = tag {
            if let Some(constructor) = self.constructors.get(tag) {
                return constructor(node);
            }
            if let Some((_, constructor)) = self
                .multi_constructors
                .iter()
                .find(|(prefix, _)| tag.starts_with(prefix.as_str()))
            {
                return constructor(tag, node);
            }
        }
        match &node.kind {
            NodeKind::Scalar { value, style } => self.construct_scalar(node, tag.as_deref(), value, *style, path),
            NodeKind::Sequence { items, .. } => {
                let mut seq = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let item_path = Path::Seq { parent: path, index };
                    seq.push(self.construct_node(item, &item_path)?);
                }
                self.apply_collection_tag(tag.as_deref(), Tag::SEQ, Value::Sequence(seq))
            }
            NodeKind::Mapping { entries, .. } => {
                let mut mapping = Mapping::with_capacity(entries.len());
                for (key_node, value_node) in entries {
                    let key = self.construct_node(key_node, path)?;
                    let key_text = key.as_scalar_key();
                    let value = match &key_text {
                        Some(text) => {
                            let value_path = Path::Map { parent: path, key: text };
                            self.construct_node(value_node, &value_path)?
                        }
                        None => {
                            let value_path = Path::Unknown { parent: path };
                            self.construct_node(value_node, &value_path)?
                        }
                    };
                    mapping.insert(key, value);
                }
                self.apply_collection_tag(tag.as_deref(), Tag::MAP, Value::Mapping(mapping))
            }
            _ => unreachable!("template kinds always carry template tags"),
        }
    }

    fn construct_scalar(
        &self,
        node: &Node,
        tag: Option<&str>,
        value: &str,
        style: crate::libyml::parser::ScalarStyle,
        path: &Path<'_>,
    ) -> Result<Value> {
        use crate::libyml::parser::ScalarStyle;
        let Some(tag) = tag else {
            // Only plain scalars are implicitly resolved; quoted and block
            // scalars are strings.
            if style != ScalarStyle::Plain {
                return Ok(Value::String(value.to_owned()));
            }
            if let Some(custom) = self.resolve_implicit(value) {
                let custom = custom.to_owned();
                let mut tagged = node.clone();
                tagged.tag = TagProps::Plain(Some(custom));
                return self.construct_node(&tagged, path);
            }
            return Ok(resolver::untagged_value(value));
        };
        match resolver::tagged_scalar_value(tag, value) {
            Ok(Some(constructed)) => Ok(constructed),
            Ok(None) => Ok(Value::Tagged(Box::new(TaggedValue {
                tag: ValueTag::new(tag),
                value: resolver::untagged_value(value),
            }))),
            Err(message) => {
                let err = error::new(ErrorImpl::Message(message, None));
                Err(match node.mark {
                    Some(mark) => error::fix_mark(err, mark, *path),
                    None => err,
                })
            }
        }
    }

    fn apply_collection_tag(
        &self,
        tag: Option<&str>,
        default: &str,
        value: Value,
    ) -> Result<Value> {
        match tag {
            None => Ok(value),
            Some(tag) if tag == default => Ok(value),
            Some(tag) => Ok(Value::Tagged(Box::new(TaggedValue {
                tag: ValueTag::new(tag),
                value,
            }))),
        }
    }
}

/// Loads template documents from a YAML stream.
///
/// Sits on the substrate parser, rewrites tags in the template namespace,
/// and composes [`Node`] trees. One loader serves a whole stream;
/// [`TemplateLoader::render_next`] consumes documents until one produces
/// output.
pub struct TemplateLoader<'input> {
    parser: Parser<'input>,
    config: LoaderConfig,
    peeked: Option<(Event, Mark)>,
    anchors: BTreeMap<Box<[u8]>, Node>,
    done: bool,
}

enum ClassifiedTag {
    Plain(Option<String>),
    Template {
        basetag: String,
        subtag: Option<String>,
        skip_render: bool,
    },
}

impl<'input> TemplateLoader<'input> {
    /// Creates a loader with the default configuration.
    pub fn new(progress: Progress<'input>) -> Result<Self> {
        Self::with_config(progress, LoaderConfig::default())
    }

    /// Creates a loader with a custom [`LoaderConfig`].
    pub fn with_config(progress: Progress<'input>, config: LoaderConfig) -> Result<Self> {
        let input = match progress {
            Progress::Str(s) => Cow::Borrowed(s.as_bytes()),
            Progress::Slice(bytes) => Cow::Borrowed(bytes),
            Progress::Read(mut rdr) => {
                let mut buffer = Vec::new();
                if let Err(io_error) = rdr.read_to_end(&mut buffer) {
                    return Err(error::new(ErrorImpl::Io(io_error)));
                }
                Cow::Owned(buffer)
            }
        };
        Ok(TemplateLoader {
            parser: Parser::new(input),
            config,
            peeked: None,
            anchors: BTreeMap::new(),
            done: false,
        })
    }

    /// The loader's configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    fn next_event(&mut self) -> Result<(Event, Mark)> {
        if let Some(event) = self.peeked.take() {
            return Ok(event);
        }
        Ok(self.parser.parse_next_event()?)
    }

    fn peek_event(&mut self) -> Result<&(Event, Mark)> {
        if self.peeked.is_none() {
            self.peeked = Some(self.parser.parse_next_event()?);
        }
        Ok(self.peeked.as_ref().expect("event was just peeked"))
    }

    /// Composes the next document into a node tree. `Ok(None)` at the end
    /// of the stream.
    pub fn next_document(&mut self) -> Result<Option<Node>> {
        if self.done {
            return Ok(None);
        }
        loop {
            match self.next_event()? {
                (Event::StreamStart, _) => {}
                (Event::StreamEnd, _) => {
                    self.done = true;
                    return Ok(None);
                }
                (Event::DocumentStart, _) => break,
                (event, mark) => {
                    let message = format!("unexpected event between documents: {:?}", event);
                    return Err(error::fix_mark(
                        error::new(ErrorImpl::Message(message, None)),
                        mark,
                        Path::Root,
                    ));
                }
            }
        }
        self.anchors.clear();
        let mut path = Vec::new();
        let root = self.compose_node(0, &mut path)?;
        match self.next_event()? {
            (Event::DocumentEnd, _) => {}
            (event, mark) => {
                let message = format!("expected end of document, found {:?}", event);
                return Err(error::fix_mark(
                    error::new(ErrorImpl::Message(message, None)),
                    mark,
                    Path::Root,
                ));
            }
        }
        trace!("composed document rooted at {:?} node", root.basetag());
        Ok(Some(root))
    }

    /// Whether another document follows in the stream.
    pub fn check_document(&mut self) -> Result<bool> {
        if self.done {
            return Ok(false);
        }
        loop {
            match self.peek_event()? {
                (Event::StreamStart, _) => {
                    self.next_event()?;
                }
                (Event::StreamEnd, _) => {
                    self.next_event()?;
                    self.done = true;
                    return Ok(false);
                }
                _ => return Ok(true),
            }
        }
    }

    /// Renders documents until one produces output and constructs its
    /// value. Documents that render to nothing (`!set`-only documents) are
    /// consumed silently. `Ok(None)` when the stream runs out first.
    pub fn render_next(&mut self, ctx: &mut Context) -> Result<Option<Value>> {
        while let Some(node) = self.next_document()? {
            let rendered = Renderer::new(&self.config).render(&node, ctx)?;
            if let Some(result) = rendered {
                return Ok(Some(self.config.construct(&result)?));
            }
            trace!("document produced no output; continuing");
        }
        Ok(None)
    }

    /// Renders a single-document stream.
    ///
    /// The stream may hold several documents as long as everything after
    /// the first output-producing one is absent; a trailing document is
    /// [`ErrorImpl::MoreThanOneDocument`].
    pub fn render_single(&mut self, ctx: &mut Context) -> Result<Value> {
        let value = self.render_next(ctx)?;
        if self.check_document()? {
            let mark = self.peeked.as_ref().map(|(_, mark)| *mark);
            return Err(error::new(ErrorImpl::MoreThanOneDocument(mark)));
        }
        Ok(value.unwrap_or(Value::Null))
    }

    /// Constructs a composed node with this loader's configuration.
    pub fn construct(&self, node: &Node) -> Result<Value> {
        self.config.construct(node)
    }

    fn compose_node(&mut self, depth: usize, path: &mut Vec<OwnedSegment>) -> Result<Node> {
        if depth > RECURSION_LIMIT {
            let mark = self.peek_event()?.1;
            return Err(error::new(ErrorImpl::RecursionLimitExceeded(mark)));
        }
        let (event, mark) = self.next_event()?;
        match event {
            Event::Alias(anchor) => match self.anchors.get(&anchor.0) {
                Some(node) => Ok(node.clone()),
                None => Err(error::new(ErrorImpl::UnknownAnchor(mark))),
            },
            Event::Scalar(scalar) => {
                let value = String::from_utf8(scalar.value.into_vec())?;
                let tag = tag_text(scalar.tag)?;
                let node =
                    self.promote_scalar(value, scalar.style, tag, mark, path)?;
                if let Some(anchor) = scalar.anchor {
                    self.anchors.insert(anchor.0, node.clone());
                }
                Ok(node)
            }
            Event::SequenceStart(start) => {
                let tag = tag_text(start.tag)?;
                let classified = self.classify_collection_tag(tag, mark)?;
                let mut items = Vec::new();
                loop {
                    if matches!(self.peek_event()?.0, Event::SequenceEnd) {
                        self.next_event()?;
                        break;
                    }
                    path.push(OwnedSegment::Index(items.len()));
                    let item = self.compose_node(depth + 1, path);
                    path.pop();
                    items.push(item?);
                }
                let node = self.promote_sequence(classified, items, start.flow, mark)?;
                if let Some(anchor) = start.anchor {
                    self.anchors.insert(anchor.0, node.clone());
                }
                Ok(node)
            }
            Event::MappingStart(start) => {
                let tag = tag_text(start.tag)?;
                let classified = self.classify_collection_tag(tag, mark)?;
                let mut entries = Vec::new();
                loop {
                    if matches!(self.peek_event()?.0, Event::MappingEnd) {
                        self.next_event()?;
                        break;
                    }
                    path.push(OwnedSegment::Unknown);
                    let key = self.compose_node(depth + 1, path);
                    path.pop();
                    let key = key?;
                    let segment = match &key.kind {
                        NodeKind::Scalar { value, .. } => OwnedSegment::Key(value.clone()),
                        _ => OwnedSegment::Unknown,
                    };
                    path.push(segment);
                    let value = self.compose_node(depth + 1, path);
                    path.pop();
                    entries.push((key, value?));
                }
                let node = self.promote_mapping(classified, entries, start.flow, mark)?;
                if let Some(anchor) = start.anchor {
                    self.anchors.insert(anchor.0, node.clone());
                }
                Ok(node)
            }
            event => {
                let message = format!("unexpected event while composing: {:?}", event);
                Err(error::fix_mark(
                    error::new(ErrorImpl::Message(message, None)),
                    mark,
                    Path::Root,
                ))
            }
        }
    }

    /// Classifies a scalar event's tag. Scalars stay plain unless they are
    /// explicitly tagged into the template namespace.
    fn classify_scalar_tag(
        &self,
        tag: Option<String>,
        mark: Mark,
    ) -> Result<ClassifiedTag> {
        let Some(tag) = tag else {
            return Ok(ClassifiedTag::Plain(None));
        };
        if tag == "!" {
            // A non-specific tag pins the scalar to a string.
            return Ok(ClassifiedTag::Plain(Some(Tag::STR.to_owned())));
        }
        let canonical = if let Some(suffix) = tag.strip_prefix(TAG_PREFIX) {
            format!("{}{}", TAG_PREFIX, suffix)
        } else if let Some(suffix) = tag.strip_prefix('!') {
            // The `!` handle is reserved to the template namespace.
            format!("{}{}", TAG_PREFIX, suffix)
        } else {
            return Ok(ClassifiedTag::Plain(Some(tag)));
        };
        self.split_template_tag(&canonical, mark)
    }

    /// Classifies a collection event's tag. Every collection becomes at
    /// least a transparent template; foreign tags become the subtag of a
    /// transparent template.
    fn classify_collection_tag(
        &self,
        tag: Option<String>,
        mark: Mark,
    ) -> Result<ClassifiedTag> {
        let Some(tag) = tag else {
            return Ok(ClassifiedTag::Template {
                basetag: "tmpl".to_owned(),
                subtag: None,
                skip_render: false,
            });
        };
        if tag == "!" {
            return Ok(ClassifiedTag::Template {
                basetag: "tmpl".to_owned(),
                subtag: None,
                skip_render: false,
            });
        }
        let canonical = if let Some(suffix) = tag.strip_prefix(TAG_PREFIX) {
            format!("{}{}", TAG_PREFIX, suffix)
        } else if let Some(suffix) = tag.strip_prefix('!') {
            format!("{}{}", TAG_PREFIX, suffix)
        } else {
            // A foreign tag rides along as the subtag of a transparent
            // template.
            return Ok(ClassifiedTag::Template {
                basetag: "tmpl".to_owned(),
                subtag: Some(tag),
                skip_render: false,
            });
        };
        self.split_template_tag(&canonical, mark)
    }

    fn split_template_tag(&self, canonical: &str, mark: Mark) -> Result<ClassifiedTag> {
        let (basetag, subtag, skip_render) =
            split_tag(canonical).expect("canonical tag carries the template prefix");
        let basetag = if basetag.is_empty() {
            "tmpl".to_owned()
        } else {
            basetag
        };
        let subtag = match subtag {
            None => None,
            Some(subtag) => match resolve_subtag_handle(&subtag) {
                Ok(resolved) => Some(resolved),
                Err(handle) => {
                    return Err(error::new(ErrorImpl::UnknownTagHandle(handle, Some(mark))));
                }
            },
        };
        Ok(ClassifiedTag::Template {
            basetag,
            subtag,
            skip_render,
        })
    }

    fn promote_scalar(
        &self,
        value: String,
        style: crate::libyml::parser::ScalarStyle,
        tag: Option<String>,
        mark: Mark,
        path: &[OwnedSegment],
    ) -> Result<Node> {
        match self.classify_scalar_tag(tag, mark)? {
            ClassifiedTag::Plain(mut tag) => {
                if tag.is_none() && style == crate::libyml::parser::ScalarStyle::Plain {
                    if let Some(resolved) = self.config.resolve_by_path(path) {
                        tag = Some(resolved.to_owned());
                    }
                }
                Ok(Node {
                    kind: NodeKind::Scalar { value, style },
                    tag: TagProps::Plain(tag),
                    mark: Some(mark),
                })
            }
            ClassifiedTag::Template {
                basetag,
                subtag,
                skip_render,
            } => {
                let kind = match basetag.as_str() {
                    "tmpl" => NodeKind::Scalar { value, style },
                    "$" => NodeKind::Expr { source: value },
                    "$f" => NodeKind::Fmt { source: value },
                    "for" => NodeKind::ForHeader { source: value },
                    "set" | "if" => {
                        return Err(error::tag(
                            format!("cannot apply !{} to a scalar", basetag),
                            Some(mark),
                        ));
                    }
                    other => {
                        return Err(error::tag(
                            format!("unknown template tag !{}", other),
                            Some(mark),
                        ));
                    }
                };
                Ok(Node {
                    kind,
                    tag: TagProps::Template {
                        subtag,
                        skip_render,
                    },
                    mark: Some(mark),
                })
            }
        }
    }

    fn promote_sequence(
        &self,
        classified: ClassifiedTag,
        items: Vec<Node>,
        flow: bool,
        mark: Mark,
    ) -> Result<Node> {
        let ClassifiedTag::Template {
            basetag,
            subtag,
            skip_render,
        } = classified
        else {
            unreachable!("collections always classify as templates");
        };
        let kind = match basetag.as_str() {
            "tmpl" => NodeKind::Sequence { items, flow },
            "if" => NodeKind::If { branches: items },
            "for" => {
                let mut items = items;
                let entries = match (items.len(), items.pop()) {
                    (
                        1,
                        Some(Node {
                            kind: NodeKind::Mapping { entries, .. },
                            ..
                        }),
                    ) => entries,
                    _ => {
                        return Err(error::tag(
                            "a sequence-form !for must contain a single mapping".to_owned(),
                            Some(mark),
                        ));
                    }
                };
                NodeKind::For {
                    entries,
                    form: ForForm::Sequence,
                }
            }
            "$" | "$f" | "set" => {
                return Err(error::tag(
                    format!("cannot apply !{} to a sequence", basetag),
                    Some(mark),
                ));
            }
            other => {
                return Err(error::tag(
                    format!("unknown template tag !{}", other),
                    Some(mark),
                ));
            }
        };
        Ok(Node {
            kind,
            tag: TagProps::Template {
                subtag,
                skip_render,
            },
            mark: Some(mark),
        })
    }

    fn promote_mapping(
        &self,
        classified: ClassifiedTag,
        entries: Vec<(Node, Node)>,
        flow: bool,
        mark: Mark,
    ) -> Result<Node> {
        let ClassifiedTag::Template {
            basetag,
            subtag,
            skip_render,
        } = classified
        else {
            unreachable!("collections always classify as templates");
        };
        let kind = match basetag.as_str() {
            "tmpl" => NodeKind::Mapping { entries, flow },
            "set" => NodeKind::Set { entries },
            "for" => NodeKind::For {
                entries,
                form: ForForm::Mapping,
            },
            "$" | "$f" | "if" => {
                return Err(error::tag(
                    format!("cannot apply !{} to a mapping", basetag),
                    Some(mark),
                ));
            }
            other => {
                return Err(error::tag(
                    format!("unknown template tag !{}", other),
                    Some(mark),
                ));
            }
        };
        Ok(Node {
            kind,
            tag: TagProps::Template {
                subtag,
                skip_render,
            },
            mark: Some(mark),
        })
    }
}

/// A composed position, used to match path resolvers.
enum OwnedSegment {
    Key(String),
    Index(usize),
    Unknown,
}

fn tag_text(tag: Option<crate::libyml::tag::Tag>) -> Result<Option<String>> {
    match tag {
        None => Ok(None),
        Some(tag) => {
            let bytes: &[u8] = &tag;
            Ok(Some(String::from_utf8(bytes.to_vec())?))
        }
    }
}
