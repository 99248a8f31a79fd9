// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

/// The `macro_from_number` module contains macros for converting number
/// types into `Value`.
pub mod macro_from_number;

/// The `macro_partialeq_numeric` module contains macros generating numeric
/// `PartialEq` implementations for `Value`.
pub mod macro_partialeq_numeric;
