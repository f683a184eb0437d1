//! Error Types
//!
//! Every failure the engine reports is a [`DependencyError`]. Build-time
//! variants surface when a scope is defined (or when an override installs a
//! replacement graph); resolution-time variants surface on access.

use thiserror::Error;

/// Boxed error returned by user-supplied providers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DependencyError>;

/// The single error kind surfaced to callers.
#[derive(Debug, Error)]
pub enum DependencyError {
    /// An entry depends on its own name.
    #[error("'{scope}' has loops: '{name}' depends on itself")]
    Loop { scope: String, name: String },

    /// A cycle of two or more entries.
    ///
    /// `cycle` starts and ends with the same name.
    #[error("'{scope}' has a circular dependency: {}", .cycle.join(" -> "))]
    Circle { scope: String, cycle: Vec<String> },

    /// A provider signature could not be turned into a dependency spec.
    #[error("'{name}' is not a valid provider: {reason}")]
    MalformedProvider { name: String, reason: String },

    /// A declared name was rejected before the graph was built.
    #[error("invalid dependency name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// A required name has no graph entry.
    ///
    /// `chain` holds the names in flight when resolution failed, from the
    /// requested target down to the direct consumer of `name`.
    #[error("{}", unresolved_message(.scope, .name, .chain))]
    Unresolved {
        scope: String,
        name: String,
        chain: Vec<String>,
    },

    /// A provider asked for an argument that was not supplied.
    #[error("missing argument '{name}'")]
    MissingArgument { name: String },

    /// A resolved value is not of the requested type.
    #[error("'{name}' is not a value of type {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    /// An error raised by a provider, passed through untouched.
    #[error(transparent)]
    Provider(BoxError),
}

fn unresolved_message(scope: &str, name: &str, chain: &[String]) -> String {
    match chain.last() {
        Some(consumer) => format!(
            "'{}' can not resolve attribute '{}' while building '{}'",
            scope, name, consumer
        ),
        None => format!("'{}' can not resolve attribute '{}'", scope, name),
    }
}

impl DependencyError {
    /// The name whose build required the unresolved one, if any.
    pub fn required_by(&self) -> Option<&str> {
        match self {
            DependencyError::Unresolved { chain, .. } => chain.last().map(String::as_str),
            _ => None,
        }
    }

    /// True for errors reported while a graph is being built or validated.
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            DependencyError::Loop { .. }
                | DependencyError::Circle { .. }
                | DependencyError::MalformedProvider { .. }
                | DependencyError::InvalidName { .. }
        )
    }

    /// Downcast a passed-through provider error.
    pub fn provider_error<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            DependencyError::Provider(source) => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_message_names_consumer() {
        let err = DependencyError::Unresolved {
            scope: "Container".to_string(),
            name: "db".to_string(),
            chain: vec!["app".to_string(), "repo".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "'Container' can not resolve attribute 'db' while building 'repo'"
        );
        assert_eq!(err.required_by(), Some("repo"));
    }

    #[test]
    fn unresolved_message_without_chain() {
        let err = DependencyError::Unresolved {
            scope: "Container".to_string(),
            name: "db".to_string(),
            chain: Vec::new(),
        };
        assert_eq!(err.to_string(), "'Container' can not resolve attribute 'db'");
        assert_eq!(err.required_by(), None);
    }

    #[test]
    fn circle_message_lists_cycle() {
        let err = DependencyError::Circle {
            scope: "Container".to_string(),
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(
            err.to_string(),
            "'Container' has a circular dependency: a -> b -> a"
        );
        assert!(err.is_build_error());
    }

    #[test]
    fn provider_errors_pass_through() {
        let source: BoxError = "database is down".into();
        let err = DependencyError::Provider(source);
        assert_eq!(err.to_string(), "database is down");
        assert!(!err.is_build_error());
    }
}
