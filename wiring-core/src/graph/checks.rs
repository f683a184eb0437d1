//! Graph Checks
//!
//! Two checks guard every graph a scope owns:
//!
//! - [`check_loops`] rejects an entry that names itself as a parameter.
//! - [`check_circles`] rejects any longer cycle.
//!
//! # Algorithm
//!
//! Circularity uses Kahn's algorithm over the graph restricted to edges
//! whose target is itself a graph key:
//!
//! 1. Count, for each entry, how many of its parameters are graph keys.
//! 2. Drain entries whose count is zero, decrementing their dependents.
//! 3. Anything left over sits on or behind a cycle.
//!
//! Every leftover entry has at least one leftover dependency, so walking
//! leftover dependencies from any leftover entry must revisit a name. The
//! walk from that first revisit is the cycle reported.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{DependencyError, Result};

use super::DependencyGraph;

/// Reject entries that depend directly on themselves.
pub fn check_loops(scope: &str, graph: &DependencyGraph) -> Result<()> {
    for (name, spec) in graph.iter() {
        if spec.depends_on(name) {
            return Err(DependencyError::Loop {
                scope: scope.to_string(),
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Reject cycles of two or more entries.
pub fn check_circles(scope: &str, graph: &DependencyGraph) -> Result<()> {
    let mut in_degree: HashMap<&str, usize> = HashMap::with_capacity(graph.len());
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut queue = VecDeque::new();

    for (name, spec) in graph.iter() {
        let mut degree = 0;
        for param in spec.params() {
            if graph.contains(param) {
                degree += 1;
                dependents.entry(param.as_str()).or_default().push(name);
            }
        }
        in_degree.insert(name, degree);
        if degree == 0 {
            queue.push_back(name);
        }
    }

    let mut drained = 0;
    while let Some(name) = queue.pop_front() {
        drained += 1;
        for &dependent in dependents.get(name).map(Vec::as_slice).unwrap_or_default() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    queue.push_back(dependent);
                }
            }
        }
    }

    if drained == graph.len() {
        return Ok(());
    }

    let remaining: HashSet<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree > 0)
        .map(|(name, _)| *name)
        .collect();

    Err(DependencyError::Circle {
        scope: scope.to_string(),
        cycle: find_cycle(graph, &remaining),
    })
}

fn find_cycle(graph: &DependencyGraph, remaining: &HashSet<&str>) -> Vec<String> {
    // Start from the first leftover in declaration order so reports are stable.
    let Some(start) = graph.names().find(|name| remaining.contains(name)) else {
        return Vec::new();
    };

    let mut path: Vec<&str> = vec![start];
    let mut position: HashMap<&str, usize> = HashMap::from([(start, 0)]);
    let mut current = start;

    loop {
        let next = graph.get(current).and_then(|spec| {
            spec.params()
                .iter()
                .map(String::as_str)
                .find(|param| remaining.contains(param))
        });
        let Some(next) = next else {
            return path.iter().map(|s| s.to_string()).collect();
        };

        if let Some(&at) = position.get(next) {
            let mut cycle: Vec<String> = path[at..].iter().map(|s| s.to_string()).collect();
            cycle.push(next.to_string());
            return cycle;
        }

        position.insert(next, path.len());
        path.push(next);
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::provider::{Provider, ProviderOutcome};
    use crate::spec::{make_dependency_spec, DependencySpec};

    fn needs(name: &str, params: &[&str]) -> DependencySpec {
        let provider = Provider::factory(params.to_vec(), |_| Ok(ProviderOutcome::value(())));
        make_dependency_spec(name, provider).unwrap()
    }

    #[test]
    fn self_loop_is_rejected() {
        let err = build_graph("Scope", [], [needs("foo", &["foo"])]).unwrap_err();
        match err {
            DependencyError::Loop { scope, name } => {
                assert_eq!(scope, "Scope");
                assert_eq!(name, "foo");
            }
            other => panic!("expected a loop error, got {other:?}"),
        }
    }

    #[test]
    fn optional_self_reference_is_still_a_loop() {
        let provider = Provider::factory(
            [crate::provider::Param::optional("foo")],
            |_| Ok(ProviderOutcome::value(())),
        );
        let spec = make_dependency_spec("foo", provider).unwrap();
        let err = build_graph("Scope", [], [spec]).unwrap_err();
        assert!(matches!(err, DependencyError::Loop { .. }));
    }

    #[test]
    fn two_node_cycle_is_reported() {
        let err = build_graph("Scope", [], [needs("a", &["b"]), needs("b", &["a"])]).unwrap_err();
        match err {
            DependencyError::Circle { scope, cycle } => {
                assert_eq!(scope, "Scope");
                assert_eq!(cycle, vec!["a", "b", "a"]);
            }
            other => panic!("expected a circle error, got {other:?}"),
        }
    }

    #[test]
    fn longer_cycle_behind_a_tail_is_reported() {
        let err = build_graph(
            "Scope",
            [],
            [
                needs("entry", &["x"]),
                needs("x", &["y"]),
                needs("y", &["z"]),
                needs("z", &["x"]),
            ],
        )
        .unwrap_err();
        match err {
            DependencyError::Circle { cycle, .. } => assert_eq!(cycle, vec!["x", "y", "z", "x"]),
            other => panic!("expected a circle error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_parameters_are_not_edges() {
        let graph = build_graph("Scope", [], [needs("a", &["missing", "b"]), needs("b", &[])]);
        assert!(graph.is_ok());
    }

    #[test]
    fn diamond_is_acyclic() {
        let graph = build_graph(
            "Scope",
            [],
            [
                needs("top", &["left", "right"]),
                needs("left", &["bottom"]),
                needs("right", &["bottom"]),
                needs("bottom", &[]),
            ],
        );
        assert!(graph.is_ok());
    }
}
