//! Dependency Specs
//!
//! A [`DependencySpec`] is the compiled form of one provider: its name, the
//! ordered names it consumes, and how many of them are required.
//!
//! Parameter order is significant. The resolver walks `params` front to back
//! when looking for the next unmet dependency, so it fixes the order in which
//! independent siblings are built.

use std::collections::HashSet;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::error::{DependencyError, Result};
use crate::provider::{FactoryFn, Param, Provider, Value};

/// Parameter names of one spec. Most providers take a handful.
pub type ParamNames = SmallVec<[String; 4]>;

/// How a spec produces its value.
#[derive(Clone)]
pub enum SpecKind {
    Value(Value),
    Factory(Arc<FactoryFn>),
}

/// Compiled description of one provider. Immutable once built.
#[derive(Clone)]
pub struct DependencySpec {
    name: String,
    kind: SpecKind,
    params: ParamNames,
    required: usize,
}

impl DependencySpec {
    /// The entry name this spec is bound to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The compiled provider.
    pub fn kind(&self) -> &SpecKind {
        &self.kind
    }

    /// All parameter names, in declaration order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Number of leading parameters that must come from the graph.
    pub fn required_count(&self) -> usize {
        self.required
    }

    /// Whether the parameter at `index` may be left unsupplied.
    pub fn is_optional(&self, index: usize) -> bool {
        index >= self.required
    }

    /// Whether the entry is computed rather than stored.
    pub fn is_factory(&self) -> bool {
        matches!(self.kind, SpecKind::Factory(_))
    }

    /// Whether this spec names `dependency` among its parameters.
    pub fn depends_on(&self, dependency: &str) -> bool {
        self.params.iter().any(|p| p == dependency)
    }
}

impl std::fmt::Debug for DependencySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencySpec")
            .field("name", &self.name)
            .field("factory", &self.is_factory())
            .field("params", &self.params)
            .field("required", &self.required)
            .finish()
    }
}

/// Compile a raw provider bound to `name`.
///
/// Plain values become leaves. Factories must list their required
/// parameters before their optional ones, with no name repeated.
pub fn make_dependency_spec(name: &str, provider: Provider) -> Result<DependencySpec> {
    match provider {
        Provider::Value(v) => Ok(DependencySpec {
            name: name.to_string(),
            kind: SpecKind::Value(v),
            params: ParamNames::new(),
            required: 0,
        }),
        Provider::Factory { params, body } => {
            let (names, required) = introspect(name, &params)?;
            Ok(DependencySpec {
                name: name.to_string(),
                kind: SpecKind::Factory(body),
                params: names,
                required,
            })
        }
    }
}

fn introspect(name: &str, params: &[Param]) -> Result<(ParamNames, usize)> {
    let malformed = |reason: String| DependencyError::MalformedProvider {
        name: name.to_string(),
        reason,
    };

    let mut seen = HashSet::with_capacity(params.len());
    let mut names = ParamNames::with_capacity(params.len());
    let mut required = 0;
    let mut defaults_started = false;

    for param in params {
        if param.name().is_empty() {
            return Err(malformed("empty parameter name".to_string()));
        }
        if !seen.insert(param.name()) {
            return Err(malformed(format!("duplicate parameter '{}'", param.name())));
        }
        if param.has_default() {
            defaults_started = true;
        } else if defaults_started {
            return Err(malformed(format!(
                "required parameter '{}' follows a parameter with a default",
                param.name()
            )));
        } else {
            required += 1;
        }
        names.push(param.name().to_string());
    }

    Ok((names, required))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderOutcome;

    fn noop(params: Vec<Param>) -> Provider {
        Provider::factory(params, |_| Ok(ProviderOutcome::value(())))
    }

    #[test]
    fn value_is_a_leaf() {
        let spec = make_dependency_spec("port", Provider::value(80u16)).unwrap();
        assert_eq!(spec.name(), "port");
        assert!(spec.params().is_empty());
        assert_eq!(spec.required_count(), 0);
        assert!(!spec.is_factory());
    }

    #[test]
    fn factory_counts_leading_required() {
        let spec = make_dependency_spec(
            "foo",
            noop(vec![
                Param::required("bar"),
                Param::required("qux"),
                Param::optional("baz"),
            ]),
        )
        .unwrap();

        assert_eq!(spec.params(), ["bar", "qux", "baz"]);
        assert_eq!(spec.required_count(), 2);
        assert!(!spec.is_optional(1));
        assert!(spec.is_optional(2));
        assert!(spec.depends_on("qux"));
        assert!(!spec.depends_on("foo"));
    }

    #[test]
    fn required_after_optional_is_malformed() {
        let err = make_dependency_spec(
            "foo",
            noop(vec![Param::optional("a"), Param::required("b")]),
        )
        .unwrap_err();
        assert!(matches!(err, DependencyError::MalformedProvider { ref name, .. } if name == "foo"));
    }

    #[test]
    fn duplicate_parameter_is_malformed() {
        let err = make_dependency_spec("foo", noop(vec!["a".into(), "a".into()])).unwrap_err();
        assert!(err.to_string().contains("duplicate parameter 'a'"));
    }

    #[test]
    fn empty_parameter_is_malformed() {
        let err = make_dependency_spec("foo", noop(vec!["".into()])).unwrap_err();
        assert!(err.is_build_error());
    }
}
