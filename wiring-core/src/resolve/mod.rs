//! Resolution
//!
//! Lazily computes one name against a scope's graph.
//!
//! # Algorithm
//!
//! Starting from the requested name, the resolver repeatedly looks at the
//! current name:
//!
//! 1. No graph entry: if the name was reached through a parameter with a
//!    default, it settles as absent and the consumer's own default applies.
//!    Otherwise resolution fails, naming the consumer that needed it.
//!
//! 2. Every parameter settled: the provider runs with the parameters that
//!    have values. A value settles the name and resumes its consumer. A
//!    replacement swaps the name's graph entry and retries it in place.
//!
//! 3. Otherwise: the first unsettled parameter, in declaration order,
//!    becomes current and the consumer waits on the stack.
//!
//! Graphs are validated acyclic, so every push moves toward a leaf and the
//! loop terminates unless a provider keeps asking to be replaced.
//!
//! # Overrides
//!
//! A replacement never touches the graph it came from. The resolver builds
//! a validated copy with the one entry swapped and installs it on the scope
//! being resolved. Sibling scopes that share the old graph keep it. The
//! copy is taken from the scope's live graph, so a replacement installed by
//! a nested resolve on the same scope survives an outer one.
//!
//! Nothing is cached across requests: each call gets a fresh
//! [`ResolutionContext`].

mod context;

pub use context::ResolutionContext;

use std::sync::Arc;

use tracing::{debug, debug_span, trace};

use crate::error::{DependencyError, Result};
use crate::graph::DependencyGraph;
use crate::provider::{ProviderOutcome, Value};
use crate::scope::Scope;
use crate::spec::{make_dependency_spec, SpecKind};

/// Compute `target` against `graph`, on behalf of `scope`.
///
/// If a provider asks to be replaced, the validated replacement graph is
/// installed on `scope` before the provider is retried.
pub fn resolve(graph: Arc<DependencyGraph>, scope: &Scope, target: &str) -> Result<Value> {
    let _span = debug_span!("resolve", scope = scope.name(), name = target).entered();

    // When resolving against the scope's own graph, overrides build on
    // whatever the scope holds at that moment, which may include entries
    // replaced by a nested resolve on the same scope.
    let tracks_scope = Arc::ptr_eq(&graph, &scope.graph());
    let mut graph = graph;
    let mut ctx = ResolutionContext::new(scope, target);

    while !ctx.is_resolved(target) {
        let Some(spec) = graph.get(ctx.current()).cloned() else {
            if ctx.is_optional() {
                trace!(name = ctx.current(), "optional dependency absent");
                ctx.settle_absent();
                continue;
            }

            let err = DependencyError::Unresolved {
                scope: scope.name().to_string(),
                name: ctx.current().to_string(),
                chain: ctx.chain(),
            };
            debug!(%err, "resolution failed");
            return Err(err);
        };

        if let Some((next, optional)) = ctx.next_unmet(&spec) {
            trace!(from = spec.name(), to = next, optional, depth = ctx.depth(), "push");
            ctx.push(next, optional);
            continue;
        }

        let outcome = match spec.kind() {
            SpecKind::Value(v) => ProviderOutcome::Value(Arc::clone(v)),
            SpecKind::Factory(body) => body(&ctx.args_for(&spec)).map_err(passthrough)?,
        };

        match outcome {
            ProviderOutcome::Value(v) => {
                trace!(name = spec.name(), "resolved");
                ctx.settle(v);
            }
            ProviderOutcome::Replace(provider) => {
                debug!(name = spec.name(), "provider replaced itself");
                let replacement = make_dependency_spec(spec.name(), provider)?;
                let base = if tracks_scope { scope.graph() } else { Arc::clone(&graph) };
                let replaced = Arc::new(base.with_replaced(scope.name(), replacement)?);
                scope.install(Arc::clone(&replaced));
                graph = replaced;
            }
        }
    }

    ctx.into_value(target)
        .ok_or_else(|| DependencyError::Unresolved {
            scope: scope.name().to_string(),
            name: target.to_string(),
            chain: Vec::new(),
        })
}

/// Provider errors surface as-is. Engine errors raised inside a provider
/// (a nested resolve, a missing argument) are unboxed rather than wrapped.
fn passthrough(err: crate::error::BoxError) -> DependencyError {
    match err.downcast::<DependencyError>() {
        Ok(inner) => *inner,
        Err(other) => DependencyError::Provider(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Param, Provider};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn plus_one() -> Provider {
        Provider::from_fn(["bar"], |args| Ok(*args.get::<i32>("bar")? + 1))
    }

    #[test]
    fn resolves_through_a_dependency() {
        let scope = Scope::builder("Container")
            .provider("foo", plus_one())
            .value("bar", 1i32)
            .build()
            .unwrap();

        let v = resolve(scope.graph(), &scope, "foo").unwrap();
        assert_eq!(*v.downcast_ref::<i32>().unwrap(), 2);
    }

    #[test]
    fn siblings_resolve_in_declaration_order() {
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let record = |name: &'static str| {
            let order = Arc::clone(&order);
            Provider::from_fn(Vec::<Param>::new(), move |_| {
                order.lock().push(name);
                Ok(())
            })
        };

        let scope = Scope::builder("Container")
            .provider("top", Provider::from_fn(["second", "first"], |_| Ok(())))
            .provider("first", record("first"))
            .provider("second", record("second"))
            .build()
            .unwrap();

        resolve(scope.graph(), &scope, "top").unwrap();
        assert_eq!(*order.lock(), vec!["second", "first"]);
    }

    #[test]
    fn shared_dependency_runs_once_per_request() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let scope = Scope::builder("Container")
            .provider(
                "shared",
                Provider::from_fn(Vec::<Param>::new(), move |_| {
                    calls_clone.fetch_add(1, Ordering::SeqCst);
                    Ok(7i32)
                }),
            )
            .provider("left", Provider::from_fn(["shared"], |a| Ok(*a.get::<i32>("shared")?)))
            .provider("right", Provider::from_fn(["shared"], |a| Ok(*a.get::<i32>("shared")?)))
            .provider(
                "top",
                Provider::from_fn(["left", "right"], |a| {
                    Ok(*a.get::<i32>("left")? + *a.get::<i32>("right")?)
                }),
            )
            .build()
            .unwrap();

        assert_eq!(scope.get::<i32>("top").unwrap(), 14);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // A second request starts from a clean memo.
        assert_eq!(scope.get::<i32>("top").unwrap(), 14);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unresolved_names_the_consumer() {
        let scope = Scope::builder("Container")
            .provider("foo", plus_one())
            .build()
            .unwrap();

        let err = resolve(scope.graph(), &scope, "foo").unwrap_err();
        match err {
            DependencyError::Unresolved { scope, name, chain } => {
                assert_eq!(scope, "Container");
                assert_eq!(name, "bar");
                assert_eq!(chain, vec!["foo"]);
            }
            other => panic!("expected an unresolved error, got {other:?}"),
        }
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        let depth = 20_000;
        let mut builder = Scope::builder("Chain").value("n0", 0u64);
        for i in 1..=depth {
            let prev = format!("n{}", i - 1);
            let key = prev.clone();
            builder = builder.provider(
                format!("n{i}"),
                Provider::from_fn([prev], move |a| Ok(*a.get::<u64>(&key)? + 1)),
            );
        }
        let scope = builder.build().unwrap();

        assert_eq!(scope.get::<u64>(&format!("n{depth}")).unwrap(), depth);
    }

    #[test]
    fn provider_errors_pass_through() {
        #[derive(Debug)]
        struct Boom;
        impl std::fmt::Display for Boom {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("boom")
            }
        }
        impl std::error::Error for Boom {}

        let scope = Scope::builder("Container")
            .provider(
                "foo",
                Provider::factory(Vec::<Param>::new(), |_| Err(Boom.into())),
            )
            .build()
            .unwrap();

        let err = scope.resolve("foo").unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(err.provider_error::<Boom>().is_some());
    }
}
