//! Scopes
//!
//! A [`Scope`] is a named owner of one dependency graph. Scopes are defined
//! through a [`ScopeBuilder`], which collects declarations, validates their
//! names, compiles them into specs and layers them over any parent scopes.
//! Graph errors surface from [`ScopeBuilder::build`], never on first use.
//!
//! A `Scope` is a cheap handle: clones share the same underlying scope, and
//! the graph a scope owns can only change through an override raised while
//! resolving on it.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{DependencyError, Result};
use crate::graph::{build_graph, DependencyGraph, GraphDescription};
use crate::provider::{downcast, Provider, Value};
use crate::resolve::resolve;
use crate::spec::{make_dependency_spec, DependencySpec};

/// Reserved name under which every scope resolves to itself.
pub const SELF_NAME: &str = "__self__";

struct ScopeInner {
    name: String,
    graph: RwLock<Arc<DependencyGraph>>,
}

/// Handle to a scope.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    /// Start declaring a new scope.
    pub fn builder(name: impl Into<String>) -> ScopeBuilder {
        ScopeBuilder::new(name)
    }

    fn from_graph(name: String, graph: DependencyGraph) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                name,
                graph: RwLock::new(Arc::new(graph)),
            }),
        }
    }

    /// The scope name used in error messages.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The graph this scope currently owns.
    pub fn graph(&self) -> Arc<DependencyGraph> {
        Arc::clone(&self.inner.graph.read())
    }

    /// Swap in a replacement graph produced by an override.
    ///
    /// A plain write: concurrent overrides on one scope race, last one wins.
    pub(crate) fn install(&self, graph: Arc<DependencyGraph>) {
        *self.inner.graph.write() = graph;
    }

    /// Compute `name`.
    pub fn resolve(&self, name: &str) -> Result<Value> {
        resolve(self.graph(), self, name)
    }

    /// Compute `name` and clone it out as a `T`.
    pub fn get<T>(&self, name: &str) -> Result<T>
    where
        T: Any + Clone,
    {
        let value = self.resolve(name)?;
        downcast::<T>(name, &value).cloned()
    }

    /// Whether `name` has an entry in this scope's graph.
    pub fn contains(&self, name: &str) -> bool {
        self.graph().contains(name)
    }

    /// Entry names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.graph().names().map(str::to_string).collect();
        names.sort();
        names
    }

    /// A new scope with some entries overridden.
    pub fn derive<I, N>(&self, overrides: I) -> Result<Scope>
    where
        I: IntoIterator<Item = (N, Provider)>,
        N: Into<String>,
    {
        overrides
            .into_iter()
            .fold(Scope::builder(self.name()).extends(self), |builder, (name, provider)| {
                builder.provider(name, provider)
            })
            .build()
    }

    /// A new scope holding both graphs. Entries of `self` win over `other`.
    pub fn merge(&self, other: &Scope) -> Result<Scope> {
        Scope::builder(self.name()).extends(self).extends(other).build()
    }

    /// Whether both handles point at the same scope.
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// A serializable view of the current graph.
    pub fn describe(&self) -> GraphDescription {
        self.graph().describe(self.name())
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("name", &self.name())
            .field("entries", &self.graph().len())
            .finish()
    }
}

/// Collects a scope's declarations before its graph is built.
pub struct ScopeBuilder {
    name: String,
    parents: Vec<Scope>,
    declarations: Vec<(String, Provider)>,
}

impl ScopeBuilder {
    /// An empty builder for a scope called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            declarations: Vec::new(),
        }
    }

    /// Inherit another scope's entries.
    ///
    /// Parents declared first take precedence over parents declared later.
    pub fn extends(mut self, parent: &Scope) -> Self {
        self.parents.push(parent.clone());
        self
    }

    /// Bind `name` to a plain value.
    pub fn value<T>(self, name: impl Into<String>, v: T) -> Self
    where
        T: Any + Send + Sync,
    {
        self.provider(name, Provider::value(v))
    }

    /// Bind `name` to any provider. A later binding of the same name wins.
    pub fn provider(mut self, name: impl Into<String>, provider: Provider) -> Self {
        self.declarations.push((name.into(), provider));
        self
    }

    /// The declarations collected so far, in order.
    pub fn declarations(&self) -> &[(String, Provider)] {
        &self.declarations
    }

    /// Validate, compile and merge everything into a new scope.
    pub fn build(self) -> Result<Scope> {
        let ScopeBuilder {
            name,
            parents,
            declarations,
        } = self;

        let specs = declarations
            .into_iter()
            .map(|(entry, provider)| {
                check_name(&entry)?;
                make_dependency_spec(&entry, provider)
            })
            .collect::<Result<Vec<DependencySpec>>>()?;

        // Graph layering is lowest priority first.
        let graphs: Vec<Arc<DependencyGraph>> = parents.iter().rev().map(Scope::graph).collect();
        let graph = build_graph(&name, graphs.iter().map(Arc::as_ref), specs)?;

        Ok(Scope::from_graph(name, graph))
    }
}

/// Reject names the engine reserves.
pub fn check_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| DependencyError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name == SELF_NAME {
        return Err(invalid("'__self__' is reserved for the scope itself"));
    }
    if name.starts_with("__") && name.ends_with("__") {
        return Err(invalid("double-underscore names are reserved"));
    }
    Ok(())
}
