//! Wiring Core
//!
//! This crate provides a declarative dependency-resolution engine. A scope
//! declares named providers (values or factories); factories name the
//! entries they need; the engine builds and validates one dependency graph
//! per scope and lazily computes any requested name on demand.
//!
//! It implements:
//!
//! - Provider compilation into dependency specs
//! - Graph merging across parent scopes, with self-loop and cycle checks
//! - Stack-based lazy resolution with optional-parameter fallback
//! - In-flight overrides that replace a provider's own graph entry
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `provider`: Raw providers, resolved arguments and provider outcomes
//! - `spec`: Compiling a provider into a `DependencySpec`
//! - `graph`: Building and validating a `DependencyGraph`
//! - `resolve`: The resolver and its per-request context
//! - `scope`: Scope handles, declaration and derivation
//!
//! # Example
//!
//! ```rust
//! use wiring_core::{Param, Provider, Scope};
//!
//! let scope = Scope::builder("Container")
//!     .provider(
//!         "foo",
//!         Provider::from_fn([Param::required("bar"), Param::optional("baz")], |args| {
//!             Ok(*args.get::<i32>("bar")? + args.get_or("baz", 10i32)?)
//!         }),
//!     )
//!     .value("bar", 5i32)
//!     .build()?;
//!
//! assert_eq!(scope.get::<i32>("foo")?, 15);
//!
//! let child = scope.derive([("baz", Provider::value(1i32))])?;
//! assert_eq!(child.get::<i32>("foo")?, 6);
//! # Ok::<(), wiring_core::DependencyError>(())
//! ```

pub mod error;
pub mod graph;
pub mod provider;
pub mod resolve;
pub mod scope;
pub mod spec;

pub use error::{BoxError, DependencyError, Result};
pub use graph::{build_graph, DependencyGraph, GraphDescription};
pub use provider::{value, Args, Param, Provider, ProviderOutcome, Value};
pub use resolve::{resolve, ResolutionContext};
pub use scope::{Scope, ScopeBuilder, SELF_NAME};
pub use spec::{make_dependency_spec, DependencySpec};
