//! Mappings from template nodes to problem-graph nodes.
//!
//! A [`Mapping`] is the output of a successful embedding: an ordered
//! bijection from template node ids (the algebraic symbol names) to graph
//! [`NodeId`]s. Mappings are ephemeral -- produced by the matcher, consumed
//! by the solver and the explanation layer within one solve.

use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// An ordered template-node-id -> graph-node-id bijection.
///
/// Entries preserve the template's node declaration order, which keeps
/// reported mappings and instantiated equations stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    entries: Vec<(String, NodeId)>,
}

impl Mapping {
    pub fn new() -> Self {
        Mapping::default()
    }

    pub fn from_pairs(entries: Vec<(String, NodeId)>) -> Self {
        Mapping { entries }
    }

    pub fn insert(&mut self, symbol: impl Into<String>, node: NodeId) {
        self.entries.push((symbol.into(), node));
    }

    /// Looks up the graph node a template symbol maps to.
    pub fn get(&self, symbol: &str) -> Option<NodeId> {
        self.entries
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, id)| *id)
    }

    /// Whether any entry maps to this graph node.
    pub fn maps_to(&self, node: NodeId) -> bool {
        self.entries.iter().any(|(_, id)| *id == node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.entries.iter().map(|(s, id)| (s.as_str(), *id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_and_order() {
        let mut mapping = Mapping::new();
        mapping.insert("L", NodeId(0));
        mapping.insert("I", NodeId(1));
        mapping.insert("Z", NodeId(2));

        assert_eq!(mapping.get("I"), Some(NodeId(1)));
        assert_eq!(mapping.get("X"), None);
        assert!(mapping.maps_to(NodeId(2)));
        assert!(!mapping.maps_to(NodeId(9)));

        let symbols: Vec<_> = mapping.iter().map(|(s, _)| s.to_string()).collect();
        assert_eq!(symbols, vec!["L", "I", "Z"]);
    }
}
