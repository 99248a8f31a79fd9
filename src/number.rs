// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};

/// A YAML number, either an integer or a float.
///
/// Integers keep their exact 64-bit representation; everything else is an
/// IEEE double. Display output is valid YAML, including `.inf`, `-.inf`
/// and `.nan` for the non-finite floats.
#[derive(Clone, Copy, PartialEq)]
pub struct Number {
    n: N,
}

#[derive(Clone, Copy)]
enum N {
    /// A non-negative integer.
    PosInt(u64),
    /// A negative integer.
    NegInt(i64),
    /// A float, possibly infinite or NaN.
    Float(f64),
}

impl Number {
    /// Returns true if the number can be represented as an `i64`.
    pub fn is_i64(&self) -> bool {
        match self.n {
            N::PosInt(v) => v <= i64::MAX as u64,
            N::NegInt(_) => true,
            N::Float(_) => false,
        }
    }

    /// Returns true if the number is a non-negative integer.
    pub fn is_u64(&self) -> bool {
        matches!(self.n, N::PosInt(_))
    }

    /// Returns true if the number is a float.
    pub fn is_f64(&self) -> bool {
        matches!(self.n, N::Float(_))
    }

    /// The number as an `i64`, when it fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self.n {
            N::PosInt(v) => i64::try_from(v).ok(),
            N::NegInt(v) => Some(v),
            N::Float(_) => None,
        }
    }

    /// The number as a `u64`, when it is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match self.n {
            N::PosInt(v) => Some(v),
            N::NegInt(_) | N::Float(_) => None,
        }
    }

    /// The number as an `f64`. Lossless for floats, best-effort for large
    /// integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self.n {
            N::PosInt(v) => Some(v as f64),
            N::NegInt(v) => Some(v as f64),
            N::Float(v) => Some(v),
        }
    }

    /// Returns true if the number is NaN.
    pub fn is_nan(&self) -> bool {
        matches!(self.n, N::Float(v) if v.is_nan())
    }

    /// Returns true if the number is positive or negative infinity.
    pub fn is_infinite(&self) -> bool {
        matches!(self.n, N::Float(v) if v.is_infinite())
    }
}

impl Display for Number {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.n {
            N::PosInt(v) => {
                let mut buffer = itoa::Buffer::new();
                formatter.write_str(buffer.format(v))
            }
            N::NegInt(v) => {
                let mut buffer = itoa::Buffer::new();
                formatter.write_str(buffer.format(v))
            }
            N::Float(v) if v.is_nan() => formatter.write_str(".nan"),
            N::Float(v) if v == f64::INFINITY => formatter.write_str(".inf"),
            N::Float(v) if v == f64::NEG_INFINITY => formatter.write_str("-.inf"),
            N::Float(v) => {
                let mut buffer = ryu::Buffer::new();
                formatter.write_str(buffer.format_finite(v))
            }
        }
    }
}

impl Debug for Number {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, formatter)
    }
}

impl PartialEq for N {
    fn eq(&self, other: &N) -> bool {
        match (*self, *other) {
            (N::PosInt(a), N::PosInt(b)) => a == b,
            (N::NegInt(a), N::NegInt(b)) => a == b,
            // NaN compares equal to itself so numbers can be mapping keys.
            (N::Float(a), N::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => false,
        }
    }
}

impl Eq for Number {}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.n {
            N::PosInt(v) => v.hash(state),
            N::NegInt(v) => v.hash(state),
            N::Float(v) => {
                let bits = if v.is_nan() {
                    f64::NAN.copysign(1.0).to_bits()
                } else {
                    v.to_bits()
                };
                bits.hash(state);
            }
        }
    }
}

macro_rules! from_unsigned {
    ($($ty:ty)*) => {
        $(
            impl From<$ty> for Number {
                fn from(u: $ty) -> Self {
                    Number { n: N::PosInt(u as u64) }
                }
            }
        )*
    };
}

macro_rules! from_signed {
    ($($ty:ty)*) => {
        $(
            impl From<$ty> for Number {
                fn from(i: $ty) -> Self {
                    let n = if i < 0 {
                        N::NegInt(i as i64)
                    } else {
                        N::PosInt(i as u64)
                    };
                    Number { n }
                }
            }
        )*
    };
}

from_unsigned!(u8 u16 u32 u64 usize);
from_signed!(i8 i16 i32 i64 isize);

impl From<f32> for Number {
    fn from(f: f32) -> Self {
        Number {
            n: N::Float(f as f64),
        }
    }
}

impl From<f64> for Number {
    fn from(f: f64) -> Self {
        Number { n: N::Float(f) }
    }
}

impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.n {
            N::PosInt(v) => serializer.serialize_u64(v),
            N::NegInt(v) => serializer.serialize_i64(v),
            N::Float(v) => serializer.serialize_f64(v),
        }
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D>(deserializer: D) -> Result<Number, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NumberVisitor;

        impl Visitor<'_> for NumberVisitor {
            type Value = Number;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a YAML number")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Number, E> {
                Ok(Number::from(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Number, E> {
                Ok(Number::from(value))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Number, E> {
                Ok(Number::from(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Number, E>
            where
                E: de::Error,
            {
                Err(de::Error::invalid_type(Unexpected::Str(value), &self))
            }
        }

        deserializer.deserialize_any(NumberVisitor)
    }
}
