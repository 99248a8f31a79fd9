// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use crate::expr::{self, EvalError, Env};
use crate::libyml::error::Mark;
use crate::libyml::tag::Tag;
use crate::loader::LoaderConfig;
use crate::modules::error::{self, ErrorImpl, Result};
use crate::node::{node_from_value, ForForm, Node, NodeKind, TagProps};
use crate::{resolver, Context, Mapping, Scope, Value};
use log::debug;

/// The outcome of rendering one node.
pub(crate) enum Rendered {
    /// The node contributes nothing to the enclosing container.
    Dropped,
    /// An ordinary rendered node.
    Node(Node),
    /// A sequence whose items splice into an enclosing sequence. Anywhere
    /// else it behaves like a plain sequence node.
    ForResult(Node),
}

impl Rendered {
    fn into_node(self) -> Option<Node> {
        match self {
            Rendered::Dropped => None,
            Rendered::Node(node) | Rendered::ForResult(node) => Some(node),
        }
    }
}

/// The template tree walk.
///
/// Renders depth-first, left to right; context updates made by `!set`
/// nodes are visible to everything rendered after them.
pub(crate) struct Renderer<'a> {
    config: &'a LoaderConfig,
}

impl<'a> Renderer<'a> {
    pub(crate) fn new(config: &'a LoaderConfig) -> Self {
        Renderer { config }
    }

    /// Renders a document root. `Ok(None)` means the document produces no
    /// output (a `!set`-only document).
    pub(crate) fn render(&self, node: &Node, ctx: &mut Context) -> Result<Option<Node>> {
        Ok(self.maybe_render(node, ctx)?.into_node())
    }

    /// Renders template nodes, passes everything else through untouched.
    /// Skip-render templates are structural copies, template identity and
    /// all.
    fn maybe_render(&self, node: &Node, ctx: &mut Context) -> Result<Rendered> {
        if node.is_template() && !node.skip_render() {
            self.render_node(node, ctx)
        } else {
            Ok(Rendered::Node(node.clone()))
        }
    }

    /// Renders a template node even when it is flagged skip-render; used
    /// by the `render` built-in. Descendants keep their own flags.
    fn render_forced(&self, node: &Node, ctx: &mut Context) -> Result<Rendered> {
        if node.is_template() {
            self.render_node(node, ctx)
        } else {
            Ok(Rendered::Node(node.clone()))
        }
    }

    fn render_node(&self, node: &Node, ctx: &mut Context) -> Result<Rendered> {
        let subtag = node.subtag().map(str::to_owned);
        match &node.kind {
            NodeKind::Scalar { value, style } => {
                let tag = subtag.unwrap_or_else(|| resolver::resolve_plain(value).to_owned());
                Ok(Rendered::Node(Node {
                    kind: NodeKind::Scalar {
                        value: value.clone(),
                        style: *style,
                    },
                    tag: TagProps::Plain(Some(tag)),
                    mark: node.mark,
                }))
            }
            NodeKind::Sequence { items, flow } => {
                let mut rendered = Vec::with_capacity(items.len());
                for item in items {
                    match self.maybe_render(item, ctx)? {
                        Rendered::Dropped => {}
                        Rendered::ForResult(result) => match result.kind {
                            NodeKind::Sequence { items, .. } => rendered.extend(items),
                            _ => unreachable!("for results are sequences"),
                        },
                        Rendered::Node(item) => rendered.push(item),
                    }
                }
                Ok(Rendered::Node(Node {
                    kind: NodeKind::Sequence {
                        items: rendered,
                        flow: *flow,
                    },
                    tag: TagProps::Plain(Some(subtag.unwrap_or_else(|| Tag::SEQ.to_owned()))),
                    mark: node.mark,
                }))
            }
            NodeKind::Mapping { entries, flow } => {
                self.render_mapping_entries(entries, *flow, subtag, node.mark, ctx)
            }
            NodeKind::Expr { source } => {
                let value = self.eval(source, node.mark, ctx)?;
                match value {
                    Value::Template(template) => self.maybe_render(&template, ctx),
                    plain => Ok(Rendered::Node(node_from_value(&plain, subtag, node.mark))),
                }
            }
            NodeKind::Fmt { source } => {
                let formatted = self.format_string(source, node.mark, ctx)?;
                let tag = subtag.unwrap_or_else(|| resolver::resolve_plain(&formatted).to_owned());
                Ok(Rendered::Node(Node::plain_scalar(
                    formatted,
                    Some(tag),
                    node.mark,
                )))
            }
            NodeKind::Set { entries } => self.render_set(entries, node.mark, ctx),
            NodeKind::If { branches } => self.render_if(branches, node.mark, ctx),
            NodeKind::For { entries, form } => {
                self.render_for(entries, *form, subtag, node.mark, ctx)
            }
            NodeKind::ForHeader { .. } => Err(error::render(
                "a !for header is only valid as a mapping key",
                node.mark,
            )),
        }
    }

    fn render_mapping_entries(
        &self,
        entries: &[(Node, Node)],
        flow: bool,
        subtag: Option<String>,
        mark: Option<Mark>,
        ctx: &mut Context,
    ) -> Result<Rendered> {
        if let Some((header, body)) = entries
            .iter()
            .find(|(key, _)| matches!(key.kind, NodeKind::ForHeader { .. }))
        {
            if entries.len() > 1 {
                return Err(error::render("not expecting other items", header.mark));
            }
            return self.render_for_header(header, body, ctx);
        }
        let mut rendered = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let key = self.maybe_render(key, ctx)?.into_node();
            let value = self.maybe_render(value, ctx)?.into_node();
            if let (Some(key), Some(value)) = (key, value) {
                rendered.push((key, value));
            }
        }
        Ok(Rendered::Node(Node {
            kind: NodeKind::Mapping {
                entries: rendered,
                flow,
            },
            tag: TagProps::Plain(Some(subtag.unwrap_or_else(|| Tag::MAP.to_owned()))),
            mark,
        }))
    }

    fn render_set(
        &self,
        entries: &[(Node, Node)],
        mark: Option<Mark>,
        ctx: &mut Context,
    ) -> Result<Rendered> {
        let rendered = self.render_mapping_entries(entries, false, None, mark, ctx)?;
        let Some(Node {
            kind: NodeKind::Mapping { entries, .. },
            ..
        }) = rendered.into_node()
        else {
            return Err(error::render(
                "cannot update the context from a non-mapping result",
                mark,
            ));
        };
        for (key_node, value_node) in &entries {
            let key = self.config.construct(key_node)?;
            let Some(name) = key.as_scalar_key() else {
                return Err(error::render(
                    format!("context keys must be scalars, found {}", key.type_name()),
                    key_node.mark,
                ));
            };
            let value = self.config.construct(value_node)?;
            debug!("context set {:?}", name);
            ctx.set(name, value);
        }
        Ok(Rendered::Dropped)
    }

    fn render_if(
        &self,
        branches: &[Node],
        mark: Option<Mark>,
        ctx: &mut Context,
    ) -> Result<Rendered> {
        if branches.len() < 2 {
            return Err(error::render(
                "!if needs at least a test and a result",
                mark,
            ));
        }
        let mut index = 0;
        loop {
            match branches.len() - index {
                0 => return Ok(Rendered::Dropped),
                // A trailing odd element is the default branch.
                1 => return self.maybe_render(&branches[index], ctx),
                _ => {
                    let test = match self.maybe_render(&branches[index], ctx)?.into_node() {
                        Some(node) => self.config.construct(&node)?.is_truthy(),
                        None => false,
                    };
                    if test {
                        return self.maybe_render(&branches[index + 1], ctx);
                    }
                    index += 2;
                }
            }
        }
    }

    fn render_for(
        &self,
        entries: &[(Node, Node)],
        form: ForForm,
        subtag: Option<String>,
        mark: Option<Mark>,
        ctx: &mut Context,
    ) -> Result<Rendered> {
        let mut items_entry = None;
        let mut ret_template = None;
        let mut guard_template = None;
        for (key, value) in entries {
            match scalar_key_text(key) {
                Some("ret") => ret_template = Some(value),
                Some("if") => guard_template = Some(value),
                _ => {
                    if items_entry.is_some() {
                        return Err(error::render("items already set", key.mark));
                    }
                    items_entry = Some((key, value));
                }
            }
        }
        let Some((items_node, names_node)) = items_entry else {
            return Err(error::render("!for has no items expression", mark));
        };
        let Some(ret_template) = ret_template else {
            return Err(error::render("!for has no 'ret' template", mark));
        };
        let names = self.name_list(names_node, ctx)?;
        let Some(items_rendered) = self.maybe_render(items_node, ctx)?.into_node() else {
            return Err(error::render(
                "the items expression produced no value",
                items_node.mark,
            ));
        };
        let elements = iterate(self.config.construct(&items_rendered)?, items_node.mark)?;

        let mut collected = Vec::new();
        for element in elements {
            self.iteration(
                &names,
                element,
                guard_template,
                ret_template,
                mark,
                ctx,
                &mut collected,
            )?;
        }
        self.finish_for(form, collected, subtag, mark)
    }

    fn render_for_header(
        &self,
        header: &Node,
        body: &Node,
        ctx: &mut Context,
    ) -> Result<Rendered> {
        let NodeKind::ForHeader { source } = &header.kind else {
            unreachable!("caller matched a for header");
        };
        let Some((names, items_expr)) = parse_for_header(source) else {
            return Err(error::render("invalid for expression", header.mark));
        };
        let elements = iterate(self.eval(items_expr, header.mark, ctx)?, header.mark)?;
        let names: Vec<String> = names.iter().map(|name| (*name).to_owned()).collect();
        let mut collected = Vec::new();
        for element in elements {
            self.iteration(
                &names,
                element,
                None,
                body,
                header.mark,
                ctx,
                &mut collected,
            )?;
        }
        let subtag = header.subtag().map(str::to_owned);
        self.finish_for(ForForm::Sequence, collected, subtag, header.mark)
    }

    /// One loop iteration: an inner write scope, an `item` scope at
    /// position 1 for the duration of the destructuring bind, then the
    /// guard and the body. Both scopes are released on every exit path.
    #[allow(clippy::too_many_arguments)]
    fn iteration(
        &self,
        names: &[String],
        element: Value,
        guard: Option<&Node>,
        body: &Node,
        mark: Option<Mark>,
        ctx: &mut Context,
        collected: &mut Vec<Node>,
    ) -> Result<()> {
        ctx.scoped(Scope::new(), 0, |ctx| {
            let mut item_scope = Scope::new();
            item_scope.insert("item".to_owned(), element);
            ctx.scoped(item_scope, 1, |ctx| {
                let item = ctx.get("item").cloned().expect("item was just bound");
                bind_names(names, item, mark, ctx)
            })?;
            let keep = match guard {
                None => true,
                Some(guard) => match self.maybe_render(guard, ctx)?.into_node() {
                    Some(node) => self.config.construct(&node)?.is_truthy(),
                    None => false,
                },
            };
            if keep {
                if let Some(node) = self.maybe_render(body, ctx)?.into_node() {
                    collected.push(node);
                }
            }
            Ok(())
        })
    }

    fn finish_for(
        &self,
        form: ForForm,
        collected: Vec<Node>,
        subtag: Option<String>,
        mark: Option<Mark>,
    ) -> Result<Rendered> {
        match form {
            ForForm::Sequence => Ok(Rendered::ForResult(Node {
                kind: NodeKind::Sequence {
                    items: collected,
                    flow: false,
                },
                tag: TagProps::Plain(Some(subtag.unwrap_or_else(|| Tag::SEQ.to_owned()))),
                mark,
            })),
            ForForm::Mapping => {
                let mut merged = Vec::new();
                for node in collected {
                    match node.kind {
                        NodeKind::Mapping { entries, .. } => merged.extend(entries),
                        _ => {
                            return Err(error::render(
                                "every 'ret' of a mapping-form !for must render to a mapping",
                                node.mark,
                            ));
                        }
                    }
                }
                Ok(Rendered::Node(Node {
                    kind: NodeKind::Mapping {
                        entries: merged,
                        flow: false,
                    },
                    tag: TagProps::Plain(Some(subtag.unwrap_or_else(|| Tag::MAP.to_owned()))),
                    mark,
                }))
            }
        }
    }

    /// Renders and constructs the name-list side of a `!for` items entry.
    fn name_list(&self, names_node: &Node, ctx: &mut Context) -> Result<Vec<String>> {
        let Some(rendered) = self.maybe_render(names_node, ctx)?.into_node() else {
            return Err(error::render(
                "the name list produced no value",
                names_node.mark,
            ));
        };
        let value = self.config.construct(&rendered)?;
        let names = match &value {
            Value::String(name) => vec![name.clone()],
            Value::Sequence(items) => {
                let mut names = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str() {
                        Some(name) => names.push(name.to_owned()),
                        None => {
                            return Err(error::render(
                                "loop names must be strings",
                                names_node.mark,
                            ));
                        }
                    }
                }
                names
            }
            other => {
                return Err(error::render(
                    format!("invalid loop name list: {}", other.type_name()),
                    names_node.mark,
                ));
            }
        };
        if names.is_empty() {
            return Err(error::render("empty loop name list", names_node.mark));
        }
        Ok(names)
    }

    fn eval(&self, source: &str, mark: Option<Mark>, ctx: &mut Context) -> Result<Value> {
        let ast = expr::parse(source)
            .map_err(|err| error::new(ErrorImpl::ExprSyntax(err, mark)))?;
        let mut env = RenderEnv {
            renderer: self,
            ctx,
        };
        ast.evaluate(&mut env)
            .map_err(|err| error::render(err.to_string(), mark))
    }

    /// `{name}` interpolation over the context plus the built-in names.
    /// `{{` and `}}` escape braces; anything fancier than a bare name is
    /// rejected.
    fn format_string(&self, source: &str, mark: Option<Mark>, ctx: &mut Context) -> Result<String> {
        let mut out = String::with_capacity(source.len());
        let mut chars = source.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '{' => {
                    if chars.peek() == Some(&'{') {
                        chars.next();
                        out.push('{');
                        continue;
                    }
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(inner) => name.push(inner),
                            None => {
                                return Err(error::render(
                                    "unmatched '{' in format string",
                                    mark,
                                ));
                            }
                        }
                    }
                    if name.contains([':', '!', '.', '[']) {
                        return Err(error::render(
                            format!("unsupported format field {:?}", name),
                            mark,
                        ));
                    }
                    out.push_str(&self.format_name(&name, mark, ctx)?);
                }
                '}' => {
                    if chars.peek() == Some(&'}') {
                        chars.next();
                        out.push('}');
                    } else {
                        return Err(error::render(
                            "single '}' in format string",
                            mark,
                        ));
                    }
                }
                other => out.push(other),
            }
        }
        Ok(out)
    }

    fn format_name(&self, name: &str, mark: Option<Mark>, ctx: &mut Context) -> Result<String> {
        if let Some(value) = ctx.get(name) {
            return Ok(value.to_string());
        }
        match name {
            "ctx" => Ok(Value::Mapping(context_snapshot(ctx)).to_string()),
            "render" | "list" => Ok(format!("<built-in {}>", name)),
            _ => Err(error::render(
                format!("name {:?} is not defined", name),
                mark,
            )),
        }
    }
}

/// The expression environment the renderer exposes: context names shadow
/// the built-ins `ctx`, `render` and `list`.
struct RenderEnv<'r, 'c> {
    renderer: &'r Renderer<'r>,
    ctx: &'c mut Context,
}

impl Env for RenderEnv<'_, '_> {
    fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.ctx.get(name) {
            return Some(value.clone());
        }
        match name {
            "ctx" => Some(Value::Mapping(context_snapshot(self.ctx))),
            _ => None,
        }
    }

    fn call(&mut self, name: &str, mut args: Vec<Value>) -> std::result::Result<Value, EvalError> {
        match name {
            "list" => {
                if args.len() != 1 {
                    return Err(EvalError::Type(format!(
                        "list() takes one argument, got {}",
                        args.len()
                    )));
                }
                match args.pop().expect("argument count was checked") {
                    Value::Sequence(items) => Ok(Value::Sequence(items)),
                    Value::String(text) => Ok(Value::Sequence(
                        text.chars().map(|ch| Value::String(ch.to_string())).collect(),
                    )),
                    Value::Mapping(mapping) => {
                        Ok(Value::Sequence(mapping.keys().cloned().collect()))
                    }
                    other => Err(EvalError::Type(format!(
                        "{} is not iterable",
                        other.type_name()
                    ))),
                }
            }
            "render" => {
                if args.is_empty() || args.len() > 2 {
                    return Err(EvalError::Type(format!(
                        "render() takes one or two arguments, got {}",
                        args.len()
                    )));
                }
                let local = match args.pop() {
                    Some(local) if args.len() == 1 => match local {
                        Value::Mapping(mapping) => {
                            let mut scope = Scope::new();
                            for (key, value) in mapping {
                                let Some(name) = key.as_scalar_key() else {
                                    return Err(EvalError::Type(
                                        "render() scope keys must be scalars".to_owned(),
                                    ));
                                };
                                scope.insert(name, value);
                            }
                            scope
                        }
                        other => {
                            return Err(EvalError::Type(format!(
                                "render() scope must be a mapping, not {}",
                                other.type_name()
                            )));
                        }
                    },
                    Some(only) => {
                        args.push(only);
                        Scope::new()
                    }
                    None => Scope::new(),
                };
                let Some(Value::Template(template)) = args.pop() else {
                    return Err(EvalError::Type(
                        "render() takes an unrendered template node".to_owned(),
                    ));
                };
                let renderer = self.renderer;
                self.ctx
                    .scoped(local, 0, |ctx| -> std::result::Result<Value, EvalError> {
                        let rendered = renderer
                            .render_forced(&template, ctx)
                            .map_err(|err| EvalError::Type(err.to_string()))?;
                        match rendered.into_node() {
                            Some(node) => renderer
                                .config
                                .construct(&node)
                                .map_err(|err| EvalError::Type(err.to_string())),
                            None => Ok(Value::Null),
                        }
                    })
            }
            other => match self.lookup(other) {
                Some(value) => Err(EvalError::NotCallable(value.type_name().to_owned())),
                None => Err(EvalError::Name(other.to_owned())),
            },
        }
    }
}

fn context_snapshot(ctx: &Context) -> Mapping {
    ctx.flatten()
        .into_iter()
        .map(|(name, value)| (Value::String(name), value))
        .collect()
}

/// The key text of a scalar entry key, template-transparent or plain.
fn scalar_key_text(node: &Node) -> Option<&str> {
    match &node.kind {
        NodeKind::Scalar { value, .. } => Some(value),
        _ => None,
    }
}

/// Parses a `names in expr` loop header. Names are comma-separated
/// identifiers starting at the first character.
fn parse_for_header(source: &str) -> Option<(Vec<&str>, &str)> {
    let mut names = Vec::new();
    let mut rest = source;
    loop {
        let end = rest
            .char_indices()
            .take_while(|(i, ch)| {
                if *i == 0 {
                    ch.is_ascii_alphabetic() || *ch == '_'
                } else {
                    ch.is_ascii_alphanumeric() || *ch == '_'
                }
            })
            .count();
        if end == 0 {
            return None;
        }
        names.push(&rest[..end]);
        rest = &rest[end..];
        let trimmed = rest.trim_start();
        if let Some(after_comma) = trimmed.strip_prefix(',') {
            rest = after_comma.trim_start();
            continue;
        }
        break;
    }
    // The names must be followed by whitespace, `in`, and whitespace.
    let trimmed = rest.strip_prefix(|ch: char| ch.is_whitespace())?;
    let trimmed = trimmed.trim_start();
    let after_in = trimmed.strip_prefix("in")?;
    let expr = after_in.strip_prefix(|ch: char| ch.is_whitespace())?;
    Some((names, expr.trim()))
}

/// The elements a `!for` loop walks: sequence items, string characters or
/// mapping keys.
fn iterate(value: Value, mark: Option<Mark>) -> Result<Vec<Value>> {
    match value {
        Value::Sequence(items) => Ok(items),
        Value::String(text) => Ok(text
            .chars()
            .map(|ch| Value::String(ch.to_string()))
            .collect()),
        Value::Mapping(mapping) => Ok(mapping.keys().cloned().collect()),
        other => Err(error::render(
            format!("{} is not iterable", other.type_name()),
            mark,
        )),
    }
}

/// Destructures `element` against the loop's name list: one name binds the
/// element itself, several names unpack a sequence (or a string, by
/// characters) of matching length.
fn bind_names(
    names: &[String],
    element: Value,
    mark: Option<Mark>,
    ctx: &mut Context,
) -> Result<()> {
    if names.len() == 1 {
        ctx.set(names[0].clone(), element);
        return Ok(());
    }
    let parts: Vec<Value> = match element {
        Value::Sequence(items) => items,
        Value::String(text) => text
            .chars()
            .map(|ch| Value::String(ch.to_string()))
            .collect(),
        other => {
            return Err(error::render(
                format!("cannot unpack {} into {} names", other.type_name(), names.len()),
                mark,
            ));
        }
    };
    if parts.len() != names.len() {
        return Err(error::render(
            format!(
                "cannot unpack {} values into {} names",
                parts.len(),
                names.len()
            ),
            mark,
        ));
    }
    for (name, part) in names.iter().zip(parts) {
        ctx.set(name.clone(), part);
    }
    Ok(())
}
