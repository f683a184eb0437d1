//! Resolution Context
//!
//! The bookkeeping for one top-level resolution: a memo of computed values,
//! the set of names already settled (computed or known absent), and an
//! explicit stack of in-flight names.
//!
//! # Why a stack
//!
//! Resolution never recurses. Each unmet dependency pushes the current name
//! and moves on, so graph depth is bounded by heap rather than the call
//! stack, and a failure can report every name that was in flight.
//!
//! A context is created per request and dropped when the request returns.

use std::collections::{HashMap, HashSet};

use crate::provider::{value, Args, Value};
use crate::scope::{Scope, SELF_NAME};
use crate::spec::DependencySpec;

/// Per-request state of one call to [`resolve`](super::resolve).
pub struct ResolutionContext {
    /// Computed values by name.
    memo: HashMap<String, Value>,

    /// Names that need no further work. Optional names that resolved to
    /// nothing are here but not in `memo`.
    cached: HashSet<String>,

    /// Names waiting on the current one. Starts with the target itself.
    stack: Vec<String>,

    /// The name being worked on.
    current: String,

    /// Whether `current` was reached through a parameter with a default.
    optional: bool,
}

impl ResolutionContext {
    /// Seed a context for resolving `target` on `scope`.
    ///
    /// The scope itself is pre-resolved under `__self__`.
    pub fn new(scope: &Scope, target: &str) -> Self {
        let mut memo = HashMap::new();
        memo.insert(SELF_NAME.to_string(), value(scope.clone()));

        let mut cached = HashSet::new();
        cached.insert(SELF_NAME.to_string());

        Self {
            memo,
            cached,
            stack: vec![target.to_string()],
            current: target.to_string(),
            optional: false,
        }
    }

    /// The name being worked on.
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Whether the current name may resolve to nothing.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether `name` has a computed value.
    pub fn is_resolved(&self, name: &str) -> bool {
        self.memo.contains_key(name)
    }

    /// Whether `name` is settled, with or without a value.
    pub fn is_cached(&self, name: &str) -> bool {
        self.cached.contains(name)
    }

    /// Depth of the pending stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The first parameter of `spec` not yet settled, with whether it is
    /// optional for `spec`.
    pub fn next_unmet<'s>(&self, spec: &'s DependencySpec) -> Option<(&'s str, bool)> {
        spec.params()
            .iter()
            .enumerate()
            .find(|(_, name)| !self.cached.contains(name.as_str()))
            .map(|(index, name)| (name.as_str(), spec.is_optional(index)))
    }

    /// Suspend the current name and start on `next`.
    pub fn push(&mut self, next: &str, optional: bool) {
        let suspended = std::mem::replace(&mut self.current, next.to_string());
        self.stack.push(suspended);
        self.optional = optional;
    }

    /// Record `value` for the current name and resume whatever was waiting.
    pub fn settle(&mut self, value: Value) {
        self.memo.insert(self.current.clone(), value);
        self.settle_absent();
    }

    /// Mark the current name settled without a value and resume.
    pub fn settle_absent(&mut self) {
        self.cached.insert(self.current.clone());
        if let Some(previous) = self.stack.pop() {
            self.current = previous;
        }
        self.optional = false;
    }

    /// Keyword arguments for `spec`: only its parameters that have values.
    pub fn args_for(&self, spec: &DependencySpec) -> Args {
        let mut args = Args::new();
        for name in spec.params() {
            if let Some(v) = self.memo.get(name) {
                args.insert(name.clone(), v.clone());
            }
        }
        args
    }

    /// Names that led to the current one, from the target down to the
    /// direct consumer. Empty when the target itself is current.
    pub fn chain(&self) -> Vec<String> {
        self.stack.iter().skip(1).cloned().collect()
    }

    /// Consume the context, yielding the value computed for `name`.
    pub fn into_value(mut self, name: &str) -> Option<Value> {
        self.memo.remove(name)
    }
}
