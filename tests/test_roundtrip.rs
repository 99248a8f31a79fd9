// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use anyhow::Result;
use enyaml::{compose, dump, load, render, serialize, Context, Value};
use indoc::indoc;

/// Plain documents render to themselves: load → render → dump equals
/// load → dump.
#[test]
fn test_plain_documents_survive_rendering() -> Result<()> {
    let inputs = [
        "a: 1\n",
        "- 1\n- two\n- 3.5\n",
        "a:\n  b:\n  - x\n  - 'y'\nc: true\n",
        "'0123': quoted digits\n",
    ];
    for input in inputs {
        let loaded = dump(&load(input)?)?;
        let mut ctx = Context::new();
        let rendered = dump(&render(input, &mut ctx)?)?;
        assert_eq!(loaded, rendered, "mismatch for input {:?}", input);
    }
    Ok(())
}

/// A skip-render template keeps its tag (including `~`) through
/// emission and re-loads as the same node.
#[test]
fn test_skip_render_templates_round_trip() -> Result<()> {
    let inputs = [
        "!$~ 1 + 1\n",
        "!$f~ 'Hello, {name}'\n",
        "!set~ {x: 1}\n",
        "!if~ [true, a, b]\n",
        "!for~ [{!$ xs: x, ret: !$ x}]\n",
        "!$~:!!int 1 + 1\n",
    ];
    for input in inputs {
        let node = compose(input)?.expect("one document");
        let emitted = serialize(&node)?;
        let reloaded = compose(&emitted)?.expect("one document");
        assert_eq!(node, reloaded, "round trip changed {:?}", input);
    }
    Ok(())
}

#[test]
fn test_skip_render_tag_text_is_preserved() -> Result<()> {
    let emitted = serialize(&compose("!$~ 1 + 1\n")?.unwrap())?;
    assert!(emitted.contains("!$~"), "emitted: {:?}", emitted);
    let emitted = serialize(&compose("!for~ [{!$ xs: x, ret: !$ x}]\n")?.unwrap())?;
    assert!(emitted.contains("!for~"), "emitted: {:?}", emitted);
    Ok(())
}

/// Unrendered template documents re-emit in template form even without
/// the `~` flag; rendering is what strips the tags.
#[test]
fn test_templates_round_trip_before_rendering() -> Result<()> {
    let inputs = [
        "x: !$ 1 + 1\n",
        "greeting: !$f 'Hello, {name}'\n",
        "!if [false, foo, true, bar]\n",
        indoc! {"
            !for
            !$ people: name
            ret:
              !$ name: 1
        "},
    ];
    for input in inputs {
        let node = compose(input)?.expect("one document");
        let emitted = serialize(&node)?;
        let reloaded = compose(&emitted)?.expect("one document");
        assert_eq!(node, reloaded, "round trip changed {:?}", input);
    }
    Ok(())
}

#[test]
fn test_rendered_scalars_emit_their_resolved_forms() -> Result<()> {
    assert_eq!(dump(&Value::from(2))?, "2\n");
    assert_eq!(dump(&Value::from("123"))?, "'123'\n");
    assert_eq!(dump(&Value::from("plain"))?, "plain\n");
    assert_eq!(dump(&Value::Bool(true))?, "true\n");
    assert_eq!(dump(&Value::Null)?, "null\n");
    Ok(())
}

#[test]
fn test_rendered_template_value_dumps_in_template_form() -> Result<()> {
    let mut ctx = Context::new();
    let value = render("x: !$f~ 'Hi {who}'", &mut ctx)?;
    let emitted = dump(&value)?;
    assert!(emitted.contains("!$f~"), "emitted: {:?}", emitted);
    Ok(())
}

#[test]
fn test_flow_style_survives_serialization() -> Result<()> {
    let node = compose("a: [1, 2]\n")?.unwrap();
    let emitted = serialize(&node)?;
    assert!(emitted.contains("[1, 2]"), "emitted: {:?}", emitted);
    Ok(())
}

#[test]
fn test_render_then_dump_end_to_end() -> Result<()> {
    let template = indoc! {"
        ---
        !set
        name: world
        ---
        greeting: !$f 'hello {name}'
        count: !$ 40 + 2
    "};
    let mut ctx = Context::new();
    let value = render(template, &mut ctx)?;
    let emitted = dump(&value)?;
    assert_eq!(emitted, "greeting: hello world\ncount: 42\n");
    Ok(())
}
