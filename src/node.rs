// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use crate::libyml::error::Mark;
use crate::libyml::parser::ScalarStyle;
use crate::libyml::tag::Tag;
use crate::Value;
use std::hash::{Hash, Hasher};

/// A composed YAML node, plain or template.
///
/// The loader produces `Node` trees from the event stream, the renderer
/// consumes template trees and produces plain ones, and the dumper emits
/// either kind back to YAML. Source marks survive until rendering is done
/// so every error can point into the input.
#[derive(Clone, Debug)]
pub struct Node {
    /// The node payload.
    pub kind: NodeKind,
    /// The node's tag, plain or template.
    pub tag: TagProps,
    /// Where in the input the node started, when it came from a parse.
    pub mark: Option<Mark>,
}

/// The tag situation of a node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TagProps {
    /// A non-template node. `None` means the tag is left to the implicit
    /// resolver.
    Plain(Option<String>),
    /// A template node.
    Template {
        /// The YAML tag the rendered result should take, if the template
        /// carried one.
        subtag: Option<String>,
        /// Whether rendering is inhibited (`~` flag on the basetag).
        skip_render: bool,
    },
}

/// The payload of a node, one variant per template construct plus the three
/// structural kinds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A scalar.
    Scalar {
        /// The scalar text.
        value: String,
        /// How the scalar was written.
        style: ScalarStyle,
    },
    /// A sequence.
    Sequence {
        /// The items, in order.
        items: Vec<Node>,
        /// Whether the sequence was written in flow style.
        flow: bool,
    },
    /// A mapping.
    Mapping {
        /// The entries, in order.
        entries: Vec<(Node, Node)>,
        /// Whether the mapping was written in flow style.
        flow: bool,
    },
    /// A `!$` expression scalar.
    Expr {
        /// The expression source.
        source: String,
    },
    /// A `!$f` format-string scalar.
    Fmt {
        /// The format string.
        source: String,
    },
    /// A `!set` mapping; contributes to the context and produces no output.
    Set {
        /// The entries to merge into the context.
        entries: Vec<(Node, Node)>,
    },
    /// An `!if` sequence of `[test, result, ..., default?]` branches.
    If {
        /// The branch nodes.
        branches: Vec<Node>,
    },
    /// A `!for` loop in sequence or mapping form.
    For {
        /// The loop body entries: the items entry plus optional `ret` and
        /// `if` entries.
        entries: Vec<(Node, Node)>,
        /// Which result shape the loop produces.
        form: ForForm,
    },
    /// A `!for` header scalar (`names in expr`), valid only as the sole
    /// key of a mapping.
    ForHeader {
        /// The header text.
        source: String,
    },
}

/// The two collection forms of `!for`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ForForm {
    /// `!for [ {…} ]`: renders to a sequence that splices into an
    /// enclosing sequence.
    Sequence,
    /// `!for {…}`: renders to the merge of the per-iteration mappings.
    Mapping,
}

impl Node {
    /// Creates a node.
    pub fn new(kind: NodeKind, tag: TagProps, mark: Option<Mark>) -> Self {
        Node { kind, tag, mark }
    }

    /// Creates a plain scalar node with an optional explicit tag.
    pub fn plain_scalar(value: impl Into<String>, tag: Option<String>, mark: Option<Mark>) -> Self {
        Node {
            kind: NodeKind::Scalar {
                value: value.into(),
                style: ScalarStyle::Plain,
            },
            tag: TagProps::Plain(tag),
            mark,
        }
    }

    /// Whether the node carries a template tag.
    pub fn is_template(&self) -> bool {
        matches!(self.tag, TagProps::Template { .. })
    }

    /// Whether the node is flagged unrendered (`~`).
    pub fn skip_render(&self) -> bool {
        matches!(
            self.tag,
            TagProps::Template {
                skip_render: true,
                ..
            }
        )
    }

    /// The template subtag, when there is one.
    pub fn subtag(&self) -> Option<&str> {
        match &self.tag {
            TagProps::Template { subtag, .. } => subtag.as_deref(),
            TagProps::Plain(_) => None,
        }
    }

    /// The basetag a template node re-emits with.
    pub(crate) fn basetag(&self) -> &'static str {
        match &self.kind {
            NodeKind::Scalar { .. } | NodeKind::Sequence { .. } | NodeKind::Mapping { .. } => {
                "tmpl"
            }
            NodeKind::Expr { .. } => "$",
            NodeKind::Fmt { .. } => "$f",
            NodeKind::Set { .. } => "set",
            NodeKind::If { .. } => "if",
            NodeKind::For { .. } | NodeKind::ForHeader { .. } => "for",
        }
    }

    /// The default tag for the node's structural kind.
    pub(crate) fn default_tag(&self) -> &'static str {
        match &self.kind {
            NodeKind::Scalar { .. }
            | NodeKind::Expr { .. }
            | NodeKind::Fmt { .. }
            | NodeKind::ForHeader { .. } => Tag::STR,
            NodeKind::Sequence { .. } | NodeKind::If { .. } => Tag::SEQ,
            NodeKind::Mapping { .. } | NodeKind::Set { .. } => Tag::MAP,
            NodeKind::For { form, .. } => match form {
                ForForm::Sequence => Tag::SEQ,
                ForForm::Mapping => Tag::MAP,
            },
        }
    }
}

// Marks never participate in equality; two nodes parsed from different
// positions can still be the same node.
impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool {
        self.kind == other.kind && self.tag == other.tag
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.tag.hash(state);
    }
}

/// Builds the plain node tree representing `value`.
///
/// Tags are assigned from the value's native type (or `subtag` at the top
/// level), never re-resolved from text, so a string that happens to look
/// like a number stays a string.
pub(crate) fn node_from_value(value: &Value, subtag: Option<String>, mark: Option<Mark>) -> Node {
    let tag = |native: &str| Some(subtag.clone().unwrap_or_else(|| native.to_owned()));
    match value {
        Value::Null => Node::plain_scalar("null", tag(Tag::NULL), mark),
        Value::Bool(true) => Node::plain_scalar("true", tag(Tag::BOOL), mark),
        Value::Bool(false) => Node::plain_scalar("false", tag(Tag::BOOL), mark),
        Value::Number(n) => {
            let native = if n.is_f64() { Tag::FLOAT } else { Tag::INT };
            Node::plain_scalar(n.to_string(), tag(native), mark)
        }
        Value::String(s) => Node::plain_scalar(s.clone(), tag(Tag::STR), mark),
        Value::Sequence(seq) => Node {
            kind: NodeKind::Sequence {
                items: seq
                    .iter()
                    .map(|item| node_from_value(item, None, mark))
                    .collect(),
                flow: false,
            },
            tag: TagProps::Plain(tag(Tag::SEQ)),
            mark,
        },
        Value::Mapping(mapping) => Node {
            kind: NodeKind::Mapping {
                entries: mapping
                    .iter()
                    .map(|(key, value)| {
                        (
                            node_from_value(key, None, mark),
                            node_from_value(value, None, mark),
                        )
                    })
                    .collect(),
                flow: false,
            },
            tag: TagProps::Plain(tag(Tag::MAP)),
            mark,
        },
        Value::Tagged(tagged) => {
            let mut node = node_from_value(&tagged.value, None, mark);
            // URI tags emit as themselves; everything else is a local tag.
            let text = if tagged.tag.string.contains(':') {
                tagged.tag.string.clone()
            } else {
                format!("!{}", tagged.tag.string)
            };
            node.tag = TagProps::Plain(Some(text));
            node
        }
        Value::Template(node) => node.as_ref().clone(),
    }
}
