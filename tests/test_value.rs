// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use anyhow::Result;
use enyaml::value::tagged::{nobang, Tag, TaggedValue};
use enyaml::{from_value, load, to_value, Mapping, Number, Value};
use serde_derive::{Deserialize, Serialize};

#[test]
fn test_number_display() {
    assert_eq!(Number::from(42).to_string(), "42");
    assert_eq!(Number::from(-7).to_string(), "-7");
    assert_eq!(Number::from(1.5).to_string(), "1.5");
    assert_eq!(Number::from(f64::NAN).to_string(), ".nan");
    assert_eq!(Number::from(f64::INFINITY).to_string(), ".inf");
    assert_eq!(Number::from(f64::NEG_INFINITY).to_string(), "-.inf");
}

#[test]
fn test_nan_equals_itself() {
    let nan = Value::Number(Number::from(f64::NAN));
    assert_eq!(nan, nan.clone());
}

#[test]
fn test_numeric_comparisons() {
    let value: Value = 10.into();
    assert_eq!(value, 10);
    assert_eq!(value, 10u8);
    assert_eq!(value, 10i64);
    let value: Value = 1.5.into();
    assert_eq!(value, 1.5f64);
}

#[test]
fn test_leading_zero_digits_load_as_strings() -> Result<()> {
    let value = load("01")?;
    assert!(value.is_string());
    Ok(())
}

#[test]
fn test_load_resolves_core_schema() -> Result<()> {
    assert!(load("null")?.is_null());
    assert!(load("~")?.is_null());
    assert_eq!(load("true")?, true);
    assert_eq!(load("0x1F")?, 31);
    assert_eq!(load("-7")?, -7);
    assert_eq!(load(".inf")?.as_f64(), Some(f64::INFINITY));
    assert_eq!(load("hello")?, "hello");
    // Quoted scalars never resolve to other types.
    assert_eq!(load("'5'")?, "5");
    Ok(())
}

#[test]
fn test_truthiness() {
    assert!(!Value::Null.is_truthy());
    assert!(!Value::Bool(false).is_truthy());
    assert!(!Value::from(0).is_truthy());
    assert!(!Value::from("").is_truthy());
    assert!(!Value::Sequence(Vec::new()).is_truthy());
    assert!(Value::from(0.5).is_truthy());
    assert!(Value::from("x").is_truthy());
}

#[test]
fn test_tag_new() {
    let tag = Tag::new("foo");
    assert_eq!(tag.string, "foo");
}

#[test]
fn test_nobang() {
    assert_eq!(nobang("!foo"), "foo");
    assert_eq!(nobang("foo"), "foo");
}

#[test]
fn test_tagged_value_copy() {
    let tag = Tag::new("foo");
    let value = Value::String("bar".to_owned());
    let tagged_value = TaggedValue { tag, value };
    let copied = tagged_value.copy();
    assert_eq!(tagged_value, copied);
}

#[test]
fn test_custom_tags_load_as_tagged_values() -> Result<()> {
    // Foreign tags on collections ride along as subtags of transparent
    // templates and come back out as tagged values.
    let value = load("!!set {a: null}")?;
    match &value {
        Value::Tagged(tagged) => {
            assert_eq!(tagged.tag.string, "tag:yaml.org,2002:set");
        }
        other => panic!("expected a tagged value, got {}", other.type_name()),
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Service {
    name: String,
    port: u16,
    replicas: Option<u32>,
}

#[test]
fn test_to_value_and_from_value_round_trip() -> Result<()> {
    let service = Service {
        name: "web".to_owned(),
        port: 8080,
        replicas: None,
    };
    let value = to_value(&service)?;
    assert_eq!(value["name"], "web");
    assert_eq!(value["port"], 8080);
    assert!(value["replicas"].is_null());
    let back: Service = from_value(value)?;
    assert_eq!(back, service);
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
enum Kind {
    Plain,
    Named(String),
}

#[test]
fn test_enum_values_round_trip_through_tags() -> Result<()> {
    let value = to_value(&Kind::Plain)?;
    assert_eq!(value, "Plain");
    let named = to_value(&Kind::Named("x".to_owned()))?;
    assert!(matches!(named, Value::Tagged(_)));
    let back: Kind = from_value(named)?;
    assert_eq!(back, Kind::Named("x".to_owned()));
    let back: Kind = from_value(value)?;
    assert_eq!(back, Kind::Plain);
    Ok(())
}

#[test]
fn test_mapping_preserves_insertion_order() {
    let mut mapping = Mapping::new();
    mapping.insert(Value::from("z"), Value::from(1));
    mapping.insert(Value::from("a"), Value::from(2));
    let keys: Vec<_> = mapping.keys().cloned().collect();
    assert_eq!(keys, vec![Value::from("z"), Value::from("a")]);
}

#[test]
fn test_index_misses_yield_null() {
    let value = Value::from("scalar");
    assert!(value["anything"].is_null());
    assert!(value[3].is_null());
}

#[test]
fn test_display_for_format_strings() {
    assert_eq!(Value::Null.to_string(), "null");
    assert_eq!(Value::from(3).to_string(), "3");
    assert_eq!(
        Value::Sequence(vec![Value::from(1), Value::from("a")]).to_string(),
        "[1, a]"
    );
}
