// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

/// Implements `From` conversions from the primitive number types into
/// `Value`, routing through [`Number`](crate::Number) so integers and
/// floats land in the right representation.
///
/// Handy when seeding a render context:
///
/// ```
/// use enyaml::{Context, Value};
///
/// let mut ctx = Context::new();
/// ctx.set("retries", Value::from(3u8));
/// ctx.set("timeout", Value::from(2.5f32));
/// assert_eq!(ctx.get("retries"), Some(&Value::from(3)));
/// assert!(ctx.get("timeout").unwrap().is_f64());
/// ```
#[macro_export]
macro_rules! from_number {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(number: $ty) -> Self {
                    Value::Number($crate::Number::from(number))
                }
            }
        )*
    };
}
