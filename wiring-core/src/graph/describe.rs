//! Graph Descriptions
//!
//! A serializable snapshot of a graph's shape, for diagnostics.

use serde::{Deserialize, Serialize};

use super::DependencyGraph;

/// Kind of provider behind an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Value,
    Factory,
}

/// One graph entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDescription {
    pub name: String,
    pub kind: EntryKind,
    /// Parameter names in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
    /// Leading parameters that must be supplied
    #[serde(default)]
    pub required: usize,
}

/// Shape of a scope's graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDescription {
    pub scope: String,
    pub entries: Vec<EntryDescription>,
}

impl GraphDescription {
    /// Describe every entry of `graph`, in declaration order.
    pub fn from_graph(scope: &str, graph: &DependencyGraph) -> Self {
        let entries = graph
            .iter()
            .map(|(name, spec)| EntryDescription {
                name: name.to_string(),
                kind: if spec.is_factory() {
                    EntryKind::Factory
                } else {
                    EntryKind::Value
                },
                params: spec.params().to_vec(),
                required: spec.required_count(),
            })
            .collect();

        Self {
            scope: scope.to_string(),
            entries,
        }
    }

    /// Look up one entry by name.
    pub fn entry(&self, name: &str) -> Option<&EntryDescription> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
