//! Providers
//!
//! A provider is what a name is bound to inside a scope: either a plain
//! value or a factory. Factories declare the names they consume through an
//! explicit, ordered signature, since closures carry no parameter names.
//!
//! When invoked, a factory receives an [`Args`] map holding exactly the
//! resolved values its parameters asked for, and answers with a
//! [`ProviderOutcome`]: a value, or a request to replace its own graph entry.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, DependencyError, Result};

/// A resolved, type-erased value.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Wrap a concrete value.
pub fn value<T>(v: T) -> Value
where
    T: Any + Send + Sync,
{
    Arc::new(v)
}

/// Signature of a factory body.
pub type FactoryFn = dyn Fn(&Args) -> std::result::Result<ProviderOutcome, BoxError> + Send + Sync;

/// One formal parameter of a factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: String,
    has_default: bool,
}

impl Param {
    /// A parameter that must be supplied from the graph.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            has_default: false,
        }
    }

    /// A parameter the factory can default on its own.
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            has_default: true,
        }
    }

    /// The entry this parameter asks for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the factory can run without this parameter.
    pub fn has_default(&self) -> bool {
        self.has_default
    }
}

impl From<&str> for Param {
    fn from(name: &str) -> Self {
        Param::required(name)
    }
}

impl From<String> for Param {
    fn from(name: String) -> Self {
        Param::required(name)
    }
}

/// A raw provider bound to a name.
#[derive(Clone)]
pub enum Provider {
    /// A leaf: resolves to itself.
    Value(Value),

    /// A callable with an ordered parameter list.
    Factory {
        params: Vec<Param>,
        body: Arc<FactoryFn>,
    },
}

impl Provider {
    /// Bind a plain value.
    pub fn value<T>(v: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Provider::Value(Arc::new(v))
    }

    /// Bind an already type-erased value.
    pub fn erased(v: Value) -> Self {
        Provider::Value(v)
    }

    /// Bind a factory that may answer with a value or a replacement.
    pub fn factory<P, F>(params: P, body: F) -> Self
    where
        P: IntoIterator,
        P::Item: Into<Param>,
        F: Fn(&Args) -> std::result::Result<ProviderOutcome, BoxError> + Send + Sync + 'static,
    {
        Provider::Factory {
            params: params.into_iter().map(Into::into).collect(),
            body: Arc::new(body),
        }
    }

    /// Bind a factory that always produces a value of type `T`.
    pub fn from_fn<P, F, T>(params: P, body: F) -> Self
    where
        P: IntoIterator,
        P::Item: Into<Param>,
        F: Fn(&Args) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        Provider::factory(params, move |args| body(args).map(ProviderOutcome::value))
    }

    /// Whether this is a factory rather than a plain value.
    pub fn is_factory(&self) -> bool {
        matches!(self, Provider::Factory { .. })
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Value(_) => f.write_str("Provider::Value(..)"),
            Provider::Factory { params, .. } => f
                .debug_struct("Provider::Factory")
                .field("params", params)
                .finish(),
        }
    }
}

/// What a factory hands back to the resolver.
pub enum ProviderOutcome {
    /// The computed value for the name being resolved.
    Value(Value),

    /// Replace the name's own graph entry with this provider and retry.
    Replace(Provider),
}

impl ProviderOutcome {
    /// Answer with a computed value.
    pub fn value<T>(v: T) -> Self
    where
        T: Any + Send + Sync,
    {
        ProviderOutcome::Value(Arc::new(v))
    }

    /// Ask for the entry to be replaced with `provider`.
    pub fn replace(provider: Provider) -> Self {
        ProviderOutcome::Replace(provider)
    }
}

impl fmt::Debug for ProviderOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderOutcome::Value(_) => f.write_str("ProviderOutcome::Value(..)"),
            ProviderOutcome::Replace(p) => f.debug_tuple("ProviderOutcome::Replace").field(p).finish(),
        }
    }
}

/// Resolved arguments handed to a factory, keyed by parameter name.
///
/// Optional parameters that resolved to nothing are simply absent.
#[derive(Default, Clone)]
pub struct Args {
    values: HashMap<String, Value>,
}

impl Args {
    /// An empty argument map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply the value for `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Whether `name` was supplied.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of supplied arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no arguments were supplied.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The type-erased value for `name`, if supplied.
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Borrow the value for `name` as a `T`.
    pub fn get<T>(&self, name: &str) -> Result<&T>
    where
        T: Any,
    {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| DependencyError::MissingArgument {
                name: name.to_string(),
            })?;
        downcast(name, value)
    }

    /// Clone the value for `name`, or fall back to `default` when absent.
    pub fn get_or<T>(&self, name: &str, default: T) -> Result<T>
    where
        T: Any + Clone,
    {
        match self.values.get(name) {
            Some(value) => downcast::<T>(name, value).cloned(),
            None => Ok(default),
        }
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.values.keys().collect();
        names.sort();
        f.debug_struct("Args").field("names", &names).finish()
    }
}

pub(crate) fn downcast<'a, T>(name: &str, value: &'a Value) -> Result<&'a T>
where
    T: Any,
{
    value
        .downcast_ref::<T>()
        .ok_or_else(|| DependencyError::TypeMismatch {
            name: name.to_string(),
            expected: type_name::<T>(),
        })
}
