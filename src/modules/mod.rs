// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

/// The `error` module contains the library's error types.
pub mod error;

/// The `path` module tracks positions inside composed documents for error
/// reporting.
pub mod path;
