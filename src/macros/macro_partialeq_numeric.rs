// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

/// Implements `PartialEq` between `Value` and the primitive number types,
/// in both directions, so rendered output can be asserted against plain
/// Rust numbers.
///
/// Each entry names the primitive, the `Value` accessor to compare
/// through, and the 64-bit type the primitive widens to. A primitive that
/// does not fit its widened type (or a value of the wrong numeric kind)
/// simply compares unequal.
///
/// ```
/// fn main() -> Result<(), enyaml::Error> {
///     let mut ctx = enyaml::Context::new();
///     let value = enyaml::render("!$ 6 * 7", &mut ctx)?;
///     assert_eq!(value, 42);
///     assert_eq!(42u8, value);
///     assert_ne!(value, 42.5);
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! partialeq_numeric {
    ($($ty:ty => $accessor:ident as $base:ty),* $(,)?) => {
        $(
            impl PartialEq<$ty> for Value {
                fn eq(&self, other: &$ty) -> bool {
                    match <$base>::try_from(*other) {
                        Ok(widened) => self.$accessor() == Some(widened),
                        Err(_) => false,
                    }
                }
            }

            impl PartialEq<Value> for $ty {
                fn eq(&self, other: &Value) -> bool {
                    other == self
                }
            }

            impl PartialEq<$ty> for &Value {
                fn eq(&self, other: &$ty) -> bool {
                    PartialEq::eq(*self, other)
                }
            }
        )*
    };
}
