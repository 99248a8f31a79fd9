// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

//! Comparisons between [`Value`] and plain Rust scalars.
//!
//! Rendered output is usually checked against literals, so `Value`
//! compares directly with strings, booleans and numbers, in both
//! directions. A value of a different kind never compares equal; there is
//! no coercion through string forms.

use crate::partialeq_numeric;
use crate::Value;

impl PartialEq<str> for Value {
    /// String content comparison, without unwrapping the variant.
    ///
    /// ```
    /// fn main() -> Result<(), enyaml::Error> {
    ///     let mut ctx = enyaml::Context::new();
    ///     ctx.set("name", enyaml::Value::from("world"));
    ///     let value = enyaml::render("!$f 'hello {name}'", &mut ctx)?;
    ///     assert!(value == *"hello world");
    ///     Ok(())
    /// }
    /// ```
    fn eq(&self, other: &str) -> bool {
        matches!(self, Value::String(s) if s == other)
    }
}

impl PartialEq<&str> for Value {
    /// The form `assert_eq!` reaches for with string literals.
    ///
    /// ```
    /// # use enyaml::Value;
    /// assert_eq!(Value::from("rendered"), "rendered");
    /// assert_ne!(Value::from(7), "7");
    /// ```
    fn eq(&self, other: &&str) -> bool {
        matches!(self, Value::String(s) if s == *other)
    }
}

impl PartialEq<Value> for str {
    fn eq(&self, other: &Value) -> bool {
        matches!(other, Value::String(s) if s == self)
    }
}

impl PartialEq<Value> for &str {
    fn eq(&self, other: &Value) -> bool {
        matches!(other, Value::String(s) if s == *self)
    }
}

impl PartialEq<String> for Value {
    /// ```
    /// # use enyaml::Value;
    /// assert_eq!(Value::from("lorem"), "lorem".to_string());
    /// ```
    fn eq(&self, other: &String) -> bool {
        matches!(self, Value::String(s) if s == other)
    }
}

impl PartialEq<Value> for String {
    fn eq(&self, other: &Value) -> bool {
        matches!(other, Value::String(s) if s == self)
    }
}

impl PartialEq<bool> for Value {
    /// ```
    /// fn main() -> Result<(), enyaml::Error> {
    ///     let mut ctx = enyaml::Context::new();
    ///     let value = enyaml::render("!$ 1 < 2", &mut ctx)?;
    ///     assert_eq!(value, true);
    ///     Ok(())
    /// }
    /// ```
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

impl PartialEq<Value> for bool {
    fn eq(&self, other: &Value) -> bool {
        other.as_bool() == Some(*self)
    }
}

partialeq_numeric! {
    u8 => as_u64 as u64,
    u16 => as_u64 as u64,
    u32 => as_u64 as u64,
    u64 => as_u64 as u64,
    usize => as_u64 as u64,
    i8 => as_i64 as i64,
    i16 => as_i64 as i64,
    i32 => as_i64 as i64,
    i64 => as_i64 as i64,
    isize => as_i64 as i64,
    f32 => as_f64 as f64,
    f64 => as_f64 as f64,
}
