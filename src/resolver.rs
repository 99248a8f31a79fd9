// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

//! Implicit resolution of plain scalars.
//!
//! Core-schema rules: `null`, `true`/`false`, integers (with `0x`/`0o`/`0b`
//! radix prefixes), floats including `.inf`/`.nan`, and strings for
//! everything else. A leading-zero digit string is a string, not a number.

use crate::libyml::tag::Tag;
use crate::{Number, Value};
use std::num::ParseIntError;

/// Resolves the tag a plain, untagged scalar would get.
pub(crate) fn resolve_plain(scalar: &str) -> &'static str {
    if scalar.is_empty() || parse_null(scalar) {
        Tag::NULL
    } else if parse_bool(scalar).is_some() {
        Tag::BOOL
    } else if parse_unsigned_int(scalar, u64::from_str_radix).is_some()
        || parse_negative_int(scalar, i64::from_str_radix).is_some()
    {
        Tag::INT
    } else if !digits_but_not_number(scalar) && parse_f64(scalar).is_some() {
        Tag::FLOAT
    } else {
        Tag::STR
    }
}

/// Constructs the value of a plain, untagged scalar.
pub(crate) fn untagged_value(scalar: &str) -> Value {
    if scalar.is_empty() || parse_null(scalar) {
        return Value::Null;
    }
    if let Some(boolean) = parse_bool(scalar) {
        return Value::Bool(boolean);
    }
    if let Some(int) = parse_unsigned_int(scalar, u64::from_str_radix) {
        return Value::Number(Number::from(int));
    }
    if let Some(int) = parse_negative_int(scalar, i64::from_str_radix) {
        return Value::Number(Number::from(int));
    }
    if !digits_but_not_number(scalar) {
        if let Some(float) = parse_f64(scalar) {
            return Value::Number(Number::from(float));
        }
    }
    Value::String(scalar.to_owned())
}

/// Constructs a scalar value for an explicit core-schema tag. Returns
/// `Err` with a message when the text does not fit the tag; unknown tags
/// return `Ok(None)` so the caller can fall back to a tagged value.
pub(crate) fn tagged_scalar_value(tag: &str, scalar: &str) -> Result<Option<Value>, String> {
    match tag {
        Tag::NULL => Ok(Some(Value::Null)),
        Tag::BOOL => match parse_bool(scalar) {
            Some(boolean) => Ok(Some(Value::Bool(boolean))),
            None => Err(format!("invalid boolean: {:?}", scalar)),
        },
        Tag::INT => {
            if let Some(int) = parse_unsigned_int(scalar, u64::from_str_radix) {
                Ok(Some(Value::Number(Number::from(int))))
            } else if let Some(int) = parse_signed_int(scalar, i64::from_str_radix) {
                Ok(Some(Value::Number(Number::from(int))))
            } else {
                Err(format!("invalid integer: {:?}", scalar))
            }
        }
        Tag::FLOAT => match parse_f64(scalar) {
            Some(float) => Ok(Some(Value::Number(Number::from(float)))),
            None => Err(format!("invalid float: {:?}", scalar)),
        },
        Tag::STR => Ok(Some(Value::String(scalar.to_owned()))),
        _ => Ok(None),
    }
}

pub(crate) fn parse_null(scalar: &str) -> bool {
    matches!(scalar, "null" | "Null" | "NULL" | "~")
}

pub(crate) fn parse_bool(scalar: &str) -> Option<bool> {
    match scalar {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

pub(crate) fn parse_unsigned_int<T>(
    scalar: &str,
    from_str_radix: fn(&str, radix: u32) -> Result<T, ParseIntError>,
) -> Option<T> {
    let unpositive = scalar.strip_prefix('+').unwrap_or(scalar);
    if let Some(rest) = unpositive.strip_prefix("0x") {
        if rest.starts_with(['+', '-']) {
            return None;
        }
        if let Ok(int) = from_str_radix(rest, 16) {
            return Some(int);
        }
    }
    if let Some(rest) = unpositive.strip_prefix("0o") {
        if rest.starts_with(['+', '-']) {
            return None;
        }
        if let Ok(int) = from_str_radix(rest, 8) {
            return Some(int);
        }
    }
    if let Some(rest) = unpositive.strip_prefix("0b") {
        if rest.starts_with(['+', '-']) {
            return None;
        }
        if let Ok(int) = from_str_radix(rest, 2) {
            return Some(int);
        }
    }
    if unpositive.starts_with(['+', '-']) {
        return None;
    }
    if digits_but_not_number(scalar) {
        return None;
    }
    from_str_radix(unpositive, 10).ok()
}

pub(crate) fn parse_signed_int<T>(
    scalar: &str,
    from_str_radix: fn(&str, radix: u32) -> Result<T, ParseIntError>,
) -> Option<T> {
    let unpositive = if let Some(unpositive) = scalar.strip_prefix('+') {
        if unpositive.starts_with(['+', '-']) {
            return None;
        }
        unpositive
    } else {
        scalar
    };
    if let Some(rest) = unpositive.strip_prefix("0x") {
        if rest.starts_with(['+', '-']) {
            return None;
        }
        if let Ok(int) = from_str_radix(rest, 16) {
            return Some(int);
        }
    }
    if let Some(rest) = scalar.strip_prefix("-0x") {
        let negative = format!("-{}", rest);
        if let Ok(int) = from_str_radix(&negative, 16) {
            return Some(int);
        }
    }
    if let Some(rest) = unpositive.strip_prefix("0o") {
        if rest.starts_with(['+', '-']) {
            return None;
        }
        if let Ok(int) = from_str_radix(rest, 8) {
            return Some(int);
        }
    }
    if let Some(rest) = scalar.strip_prefix("-0o") {
        let negative = format!("-{}", rest);
        if let Ok(int) = from_str_radix(&negative, 8) {
            return Some(int);
        }
    }
    if let Some(rest) = unpositive.strip_prefix("0b") {
        if rest.starts_with(['+', '-']) {
            return None;
        }
        if let Ok(int) = from_str_radix(rest, 2) {
            return Some(int);
        }
    }
    if let Some(rest) = scalar.strip_prefix("-0b") {
        let negative = format!("-{}", rest);
        if let Ok(int) = from_str_radix(&negative, 2) {
            return Some(int);
        }
    }
    if digits_but_not_number(scalar) {
        return None;
    }
    from_str_radix(unpositive, 10).ok()
}

pub(crate) fn parse_negative_int<T>(
    scalar: &str,
    from_str_radix: fn(&str, radix: u32) -> Result<T, ParseIntError>,
) -> Option<T> {
    if !scalar.starts_with('-') {
        return None;
    }
    if let Some(rest) = scalar.strip_prefix("-0x") {
        let negative = format!("-{}", rest);
        if let Ok(int) = from_str_radix(&negative, 16) {
            return Some(int);
        }
    }
    if let Some(rest) = scalar.strip_prefix("-0o") {
        let negative = format!("-{}", rest);
        if let Ok(int) = from_str_radix(&negative, 8) {
            return Some(int);
        }
    }
    if let Some(rest) = scalar.strip_prefix("-0b") {
        let negative = format!("-{}", rest);
        if let Ok(int) = from_str_radix(&negative, 2) {
            return Some(int);
        }
    }
    if digits_but_not_number(scalar) {
        return None;
    }
    from_str_radix(scalar, 10).ok()
}

pub(crate) fn parse_f64(scalar: &str) -> Option<f64> {
    let unpositive = if let Some(unpositive) = scalar.strip_prefix('+') {
        if unpositive.starts_with(['+', '-']) {
            return None;
        }
        unpositive
    } else {
        scalar
    };
    if let ".inf" | ".Inf" | ".INF" = unpositive {
        return Some(f64::INFINITY);
    }
    if let "-.inf" | "-.Inf" | "-.INF" = scalar {
        return Some(f64::NEG_INFINITY);
    }
    if let ".nan" | ".NaN" | ".NAN" = scalar {
        return Some(f64::NAN.copysign(1.0));
    }
    if let Ok(float) = unpositive.parse::<f64>() {
        if float.is_finite() {
            return Some(float);
        }
    }
    None
}

// Leading zero(s) followed by numeric characters is a string according to
// the YAML 1.2 spec. https://yaml.org/spec/1.2/spec.html#id2761292
pub(crate) fn digits_but_not_number(scalar: &str) -> bool {
    let scalar = scalar.strip_prefix(['-', '+']).unwrap_or(scalar);
    scalar.len() > 1
        && scalar.starts_with('0')
        && scalar[1..].bytes().all(|b| b.is_ascii_digit())
}
