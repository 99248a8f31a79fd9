// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use anyhow::Result;
use enyaml::{render, render_all, to_value, Context, Value};
use indoc::indoc;

#[test]
fn test_set_document_feeds_format_string() -> Result<()> {
    let template = indoc! {"
        ---
        !set
        name: Guido
        ---
        greeting: !$f 'Hello, {name}'
    "};
    let mut ctx = Context::new();
    let value = render(template, &mut ctx)?;
    assert_eq!(value["greeting"], "Hello, Guido");
    assert_eq!(value.as_mapping().unwrap().len(), 1);
    Ok(())
}

#[test]
fn test_if_picks_first_truthy_branch() -> Result<()> {
    let mut ctx = Context::new();
    let value = render("thisisbar: !if [false, foo, true, bar]", &mut ctx)?;
    assert_eq!(value["thisisbar"], "bar");
    Ok(())
}

#[test]
fn test_if_falls_back_to_default() -> Result<()> {
    let mut ctx = Context::new();
    let value = render("thisisdefault: !if [false, foo, false, bar, dflt]", &mut ctx)?;
    assert_eq!(value["thisisdefault"], "dflt");
    Ok(())
}

#[test]
fn test_if_without_match_drops_the_entry() -> Result<()> {
    let mut ctx = Context::new();
    let value = render("omitted: !if [false, foo]", &mut ctx)?;
    assert!(value.as_mapping().unwrap().is_empty());
    Ok(())
}

#[test]
fn test_if_needs_two_branches() {
    let mut ctx = Context::new();
    let err = render("x: !if [foo]", &mut ctx).unwrap_err();
    assert!(err.to_string().contains("test and a result"));
}

#[test]
fn test_for_sequence_form_with_guard() -> Result<()> {
    let mut ctx = Context::new();
    ctx.set("myseq", to_value(&["a", "OMIT", "b"])?);
    let value = render(
        r#"!for [{!$ myseq: i, ret: !$f "This is {i}", if: !$ "i != 'OMIT'"}]"#,
        &mut ctx,
    )?;
    let items = value.as_sequence().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0], "This is a");
    assert_eq!(items[1], "This is b");
    Ok(())
}

#[test]
fn test_for_mapping_form_merges_results() -> Result<()> {
    let template = indoc! {"
        !for
        !$ people: name
        ret:
          !$ name: 1
    "};
    let mut ctx = Context::new();
    ctx.set("people", to_value(&["Alice", "Bob"])?);
    let value = render(template, &mut ctx)?;
    let mapping = value.as_mapping().unwrap();
    assert_eq!(mapping.len(), 2);
    assert_eq!(value["Alice"], 1);
    assert_eq!(value["Bob"], 1);
    Ok(())
}

#[test]
fn test_expression_results_keep_their_type() -> Result<()> {
    let mut ctx = Context::new();
    let value = render("x: !$ 1 + 1", &mut ctx)?;
    assert_eq!(value["x"], 2);
    assert!(value["x"].as_i64().is_some(), "expected an integer, not a string");
    Ok(())
}

#[test]
fn test_expression_string_stays_a_string() -> Result<()> {
    let mut ctx = Context::new();
    let value = render(r#"x: !$ "'2'""#, &mut ctx)?;
    assert_eq!(value["x"], "2");
    Ok(())
}

#[test]
fn test_for_result_splices_into_enclosing_sequence() -> Result<()> {
    let template = indoc! {"
        - a
        - !for [{!$ xs: x, ret: !$ x}]
        - b
    "};
    let mut ctx = Context::new();
    ctx.set("xs", to_value(&["m", "n"])?);
    let value = render(template, &mut ctx)?;
    let items = value.as_sequence().unwrap();
    assert_eq!(items.len(), 4);
    assert_eq!(items[1], "m");
    assert_eq!(items[2], "n");
    Ok(())
}

#[test]
fn test_for_header_key_replaces_the_mapping() -> Result<()> {
    let mut ctx = Context::new();
    ctx.set("xs", to_value(&[1, 2, 3])?);
    let value = render("{!for 'x in xs': !$ x * 10}", &mut ctx)?;
    let items = value.as_sequence().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0], 10);
    assert_eq!(items[2], 30);
    Ok(())
}

#[test]
fn test_for_header_with_sibling_entries_is_an_error() {
    let mut ctx = Context::new();
    ctx.set("xs", to_value(&[1]).unwrap());
    let err = render("{!for 'x in xs': !$ x, other: 1}", &mut ctx).unwrap_err();
    assert!(err.to_string().contains("not expecting other items"));
}

#[test]
fn test_for_bindings_stay_inside_the_loop() -> Result<()> {
    let mut ctx = Context::new();
    ctx.set("xs", to_value(&[1, 2])?);
    render("!for [{!$ xs: v, ret: !$ v}]", &mut ctx)?;
    assert!(!ctx.contains_key("v"));
    assert!(!ctx.contains_key("item"));
    Ok(())
}

#[test]
fn test_for_destructures_name_lists() -> Result<()> {
    let template = "!for [{!$ pairs: [k, v], ret: !$f '{k}={v}'}]";
    let mut ctx = Context::new();
    ctx.set("pairs", to_value(&[("a", 1), ("b", 2)])?);
    let value = render(template, &mut ctx)?;
    let items = value.as_sequence().unwrap();
    assert_eq!(items[0], "a=1");
    assert_eq!(items[1], "b=2");
    Ok(())
}

#[test]
fn test_destructuring_mismatch_is_an_error() {
    let mut ctx = Context::new();
    ctx.set("pairs", to_value(&[("a", 1, 9)]).unwrap());
    let err = render("!for [{!$ pairs: [k, v], ret: !$ k}]", &mut ctx).unwrap_err();
    assert!(err.to_string().contains("cannot unpack"));
}

#[test]
fn test_set_updates_are_visible_to_later_siblings() -> Result<()> {
    let template = indoc! {"
        - !set {y: 9}
        - !$ y
    "};
    let mut ctx = Context::new();
    let value = render(template, &mut ctx)?;
    let items = value.as_sequence().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0], 9);
    Ok(())
}

#[test]
fn test_set_persists_across_documents_of_render_all() -> Result<()> {
    let template = indoc! {"
        ---
        !set
        x: 1
        ---
        !$ x
        ---
        !$ x + 1
    "};
    let mut ctx = Context::new();
    let values: Result<Vec<Value>, _> = render_all(template, &mut ctx)?.collect();
    let values = values?;
    assert_eq!(values.len(), 2);
    assert_eq!(values[0], 1);
    assert_eq!(values[1], 2);
    assert_eq!(ctx.get("x"), Some(&Value::from(1)));
    Ok(())
}

#[test]
fn test_render_rejects_trailing_documents() {
    let mut ctx = Context::new();
    let err = render("---\na: 1\n---\nb: 2\n", &mut ctx).unwrap_err();
    assert!(err.to_string().contains("single document"));
}

#[test]
fn test_render_of_empty_stream_is_null() -> Result<()> {
    let mut ctx = Context::new();
    assert!(render("", &mut ctx)?.is_null());
    Ok(())
}

#[test]
fn test_skip_render_constructs_to_a_template_value() -> Result<()> {
    let mut ctx = Context::new();
    let value = render("x: !$~ 1 + 1", &mut ctx)?;
    assert!(matches!(value["x"], Value::Template(_)));
    Ok(())
}

#[test]
fn test_render_builtin_instantiates_stored_templates() -> Result<()> {
    let template = indoc! {"
        ---
        !set
        tmpl: !$f~ 'Hi {who}'
        who: Bob
        ---
        !$ render(tmpl)
    "};
    let mut ctx = Context::new();
    let value = render(template, &mut ctx)?;
    assert_eq!(value, "Hi Bob");
    Ok(())
}

#[test]
fn test_list_builtin() -> Result<()> {
    let mut ctx = Context::new();
    let value = render("!$ list('abc')", &mut ctx)?;
    let items = value.as_sequence().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0], "a");
    Ok(())
}

#[test]
fn test_unknown_name_is_a_render_error() {
    let mut ctx = Context::new();
    let err = render("x: !$ nope", &mut ctx).unwrap_err();
    assert!(err.to_string().contains("not defined"));
}

#[test]
fn test_expression_syntax_error_carries_position() {
    let mut ctx = Context::new();
    let err = render("x: !$ (1", &mut ctx).unwrap_err();
    assert!(err.to_string().contains("closing parenthesis"));
}

#[test]
fn test_unknown_template_tag_is_a_load_error() {
    let mut ctx = Context::new();
    let err = render("x: !bogus 1", &mut ctx).unwrap_err();
    assert!(err.to_string().contains("unknown template tag"));
}

#[test]
fn test_template_tag_on_wrong_kind_is_a_load_error() {
    let mut ctx = Context::new();
    let err = render("!if {a: b}", &mut ctx).unwrap_err();
    assert!(err.to_string().contains("cannot apply !if"));
}

#[test]
fn test_subtag_forces_the_result_tag() -> Result<()> {
    let mut ctx = Context::new();
    // The subtag names the type the rendered result should take.
    let value = render("x: !$:!!str 1 + 1", &mut ctx)?;
    assert_eq!(value["x"], "2");
    Ok(())
}

#[test]
fn test_for_iterates_mapping_keys() -> Result<()> {
    let mut ctx = Context::new();
    let mut mapping = enyaml::Mapping::new();
    mapping.insert(Value::from("a"), Value::from(1));
    mapping.insert(Value::from("b"), Value::from(2));
    ctx.set("table", Value::Mapping(mapping));
    let value = render("!for [{!$ table: k, ret: !$ k}]", &mut ctx)?;
    let items = value.as_sequence().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0], "a");
    Ok(())
}
