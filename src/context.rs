// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2024 EnYAML, Template-Native YAML for Rust. All rights reserved.

use crate::Value;
use indexmap::IndexMap;

/// A single scope of named values.
pub type Scope = IndexMap<String, Value>;

/// A stack of scopes behaving as one logical mapping.
///
/// Lookups search from the innermost scope (index 0) outward; writes always
/// land in the innermost scope. Scopes pushed during rendering are removed
/// when their template construct finishes, discarding every modification
/// made while they were active.
///
/// # Examples
///
/// ```
/// use enyaml::{Context, Scope, Value};
///
/// let mut ctx = Context::new();
/// ctx.set("foo", Value::from(1));
/// ctx.push(Scope::new(), 0);
/// ctx.set("foo", Value::from(2));
/// ctx.set("bar", Value::from(3));
/// assert_eq!(ctx.get("foo"), Some(&Value::from(2)));
/// ctx.pop(0);
/// assert_eq!(ctx.get("foo"), Some(&Value::from(1)));
/// assert_eq!(ctx.get("bar"), None);
/// ```
#[derive(Clone, Debug)]
pub struct Context {
    maps: Vec<Scope>,
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}

impl Context {
    /// Creates a context with a single empty scope.
    pub fn new() -> Self {
        Context {
            maps: vec![Scope::new()],
        }
    }

    /// Creates a context whose outermost scope is `scope`.
    pub fn with_scope(scope: Scope) -> Self {
        Context { maps: vec![scope] }
    }

    /// Looks `name` up, searching scopes from the innermost outward.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.maps.iter().find_map(|scope| scope.get(name))
    }

    /// Returns whether any scope binds `name`.
    pub fn contains_key(&self, name: &str) -> bool {
        self.maps.iter().any(|scope| scope.contains_key(name))
    }

    /// Binds `name` in the innermost scope.
    ///
    /// # Panics
    ///
    /// Panics if every scope has been popped.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.maps[0].insert(name.into(), value);
    }

    /// Inserts `scope` at position `pos` in the stack. The innermost
    /// position is `0`.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is greater than the number of scopes.
    pub fn push(&mut self, scope: Scope, pos: usize) {
        self.maps.insert(pos, scope);
    }

    /// Removes and returns the scope at position `pos`.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is out of bounds.
    pub fn pop(&mut self, pos: usize) -> Scope {
        self.maps.remove(pos)
    }

    /// Runs `f` with `scope` pushed at `pos`, removing the scope again on
    /// the way out. The scope is released on every exit path, including
    /// when `f` returns an error.
    pub fn scoped<R>(&mut self, scope: Scope, pos: usize, f: impl FnOnce(&mut Context) -> R) -> R {
        self.push(scope, pos);
        let result = f(self);
        self.pop(pos);
        result
    }

    /// Returns the number of scopes on the stack.
    pub fn depth(&self) -> usize {
        self.maps.len()
    }

    /// Collapses the visible bindings into a single scope, with inner
    /// bindings shadowing outer ones.
    pub fn flatten(&self) -> Scope {
        let mut flat = Scope::new();
        for scope in self.maps.iter().rev() {
            for (name, value) in scope {
                flat.insert(name.clone(), value.clone());
            }
        }
        flat
    }
}
