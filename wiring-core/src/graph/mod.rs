//! Dependency Graph
//!
//! This module turns a flat namespace of providers into the validated,
//! merged graph a scope resolves against.
//!
//! # Overview
//!
//! The graph maps each name to its [`DependencySpec`]. Edges run from a name
//! to every parameter of its spec that is itself a graph key.
//!
//! A graph is built by layering:
//!
//! 1. Parent graphs, lowest priority first; later parents shadow earlier ones.
//! 2. The scope's own entries, which always win by name.
//!
//! The merged result is then checked for self-loops and longer cycles. The
//! same checks run whenever an override produces a replacement graph, so
//! acyclicity holds for every graph a scope ever owns.
//!
//! # Immutability
//!
//! Graphs are never changed in place. Overrides go through
//! [`DependencyGraph::with_replaced`], which copies the mapping, so scopes
//! that share an ancestor graph never observe each other's replacements.

mod checks;
mod describe;

pub use checks::{check_circles, check_loops};
pub use describe::{EntryDescription, EntryKind, GraphDescription};

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::Result;
use crate::spec::DependencySpec;

/// Validated, immutable name-to-spec mapping owned by a scope.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    entries: IndexMap<String, Arc<DependencySpec>>,
}

impl DependencyGraph {
    /// An empty graph: the root every scope hierarchy starts from.
    pub fn new() -> Self {
        Self::default()
    }

    /// The spec bound to `name`.
    pub fn get(&self, name: &str) -> Option<&Arc<DependencySpec>> {
        self.entries.get(name)
    }

    /// Whether `name` has an entry.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the graph has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DependencySpec)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Copy this graph with the entry for `spec.name()` swapped out, then
    /// validate the copy.
    ///
    /// `self` is left untouched.
    pub fn with_replaced(&self, scope: &str, spec: DependencySpec) -> Result<DependencyGraph> {
        let mut entries = self.entries.clone();
        entries.insert(spec.name().to_string(), Arc::new(spec));

        let graph = DependencyGraph { entries };
        graph.validate(scope)?;
        Ok(graph)
    }

    /// Run the self-loop and circularity checks.
    pub fn validate(&self, scope: &str) -> Result<()> {
        check_loops(scope, self)?;
        check_circles(scope, self)
    }

    /// A serializable snapshot of this graph's shape.
    pub fn describe(&self, scope: &str) -> GraphDescription {
        GraphDescription::from_graph(scope, self)
    }
}

/// Merge parent graphs and a scope's own entries into one validated graph.
///
/// `parents` are ordered lowest priority first. `own` entries always win.
pub fn build_graph<'a, P>(
    scope: &str,
    parents: P,
    own: impl IntoIterator<Item = DependencySpec>,
) -> Result<DependencyGraph>
where
    P: IntoIterator<Item = &'a DependencyGraph>,
{
    let mut entries: IndexMap<String, Arc<DependencySpec>> = IndexMap::new();

    for parent in parents {
        for (name, spec) in &parent.entries {
            entries.insert(name.clone(), Arc::clone(spec));
        }
    }

    for spec in own {
        entries.insert(spec.name().to_string(), Arc::new(spec));
    }

    let graph = DependencyGraph { entries };
    graph.validate(scope)?;

    debug!(scope, entries = graph.len(), "dependency graph built");
    Ok(graph)
}
