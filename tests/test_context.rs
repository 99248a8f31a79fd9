// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use enyaml::{Context, Scope, Value};

#[test]
fn test_scope_updates_are_discarded_on_pop() {
    let mut ctx = Context::new();
    ctx.set("foo", Value::from(1));
    ctx.push(Scope::new(), 0);
    ctx.set("foo", Value::from(2));
    ctx.set("bar", Value::from(3));
    assert_eq!(ctx.get("foo"), Some(&Value::from(2)));
    assert_eq!(ctx.get("bar"), Some(&Value::from(3)));
    ctx.pop(0);
    assert_eq!(ctx.get("foo"), Some(&Value::from(1)));
    assert_eq!(ctx.get("bar"), None);
    assert!(!ctx.contains_key("bar"));
}

#[test]
fn test_push_with_initial_scope() {
    let mut ctx = Context::new();
    ctx.set("foo", Value::from(1));
    let mut scope = Scope::new();
    scope.insert("bar".to_owned(), Value::from(1));
    ctx.push(scope, 0);
    assert_eq!(ctx.get("foo"), Some(&Value::from(1)));
    assert_eq!(ctx.get("bar"), Some(&Value::from(1)));
    ctx.pop(0);
    assert_eq!(ctx.get("bar"), None);
}

#[test]
fn test_push_at_position_one() {
    // A scope at position 1 is visible for lookups but writes still land
    // in the innermost scope.
    let mut ctx = Context::new();
    ctx.set("foo", Value::from(1));
    ctx.push(Scope::new(), 0);
    let mut outer = Scope::new();
    outer.insert("baz".to_owned(), Value::from(1));
    ctx.push(outer, 1);
    let baz = ctx.get("baz").cloned().unwrap();
    ctx.set("bar", baz);
    ctx.pop(1);
    assert_eq!(ctx.get("baz"), None);
    assert_eq!(ctx.get("bar"), Some(&Value::from(1)));
    ctx.pop(0);
    assert_eq!(ctx.get("bar"), None);
    assert_eq!(ctx.get("foo"), Some(&Value::from(1)));
}

#[test]
fn test_scoped_releases_on_error() {
    let mut ctx = Context::new();
    let depth = ctx.depth();
    let result: Result<(), &str> = ctx.scoped(Scope::new(), 0, |ctx| {
        ctx.set("tmp", Value::from(1));
        Err("boom")
    });
    assert!(result.is_err());
    assert_eq!(ctx.depth(), depth);
    assert_eq!(ctx.get("tmp"), None);
}

#[test]
fn test_inner_scope_shadows_outer() {
    let mut ctx = Context::new();
    ctx.set("name", Value::from("outer"));
    ctx.scoped(Scope::new(), 0, |ctx| {
        ctx.set("name", Value::from("inner"));
        assert_eq!(ctx.get("name"), Some(&Value::from("inner")));
    });
    assert_eq!(ctx.get("name"), Some(&Value::from("outer")));
}

#[test]
fn test_flatten_applies_shadowing() {
    let mut ctx = Context::new();
    ctx.set("a", Value::from(1));
    ctx.set("b", Value::from(1));
    ctx.push(Scope::new(), 0);
    ctx.set("a", Value::from(2));
    let flat = ctx.flatten();
    assert_eq!(flat.get("a"), Some(&Value::from(2)));
    assert_eq!(flat.get("b"), Some(&Value::from(1)));
    ctx.pop(0);
}
