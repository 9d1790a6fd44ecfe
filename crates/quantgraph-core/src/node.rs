//! Quantity nodes: the attributed vertices of a problem graph.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::kind::QuantityKind;
use crate::value::Number;

/// A quantity extracted from a problem statement.
///
/// `value` is `None` while the quantity is unknown; the solver fills unknowns
/// in its result map, never in the graph. `role` is an optional qualifier
/// distinguishing same-kind nodes (`gap`, `two_sides`, ...). `attrs` is a
/// small open-ended bag for extraction metadata such as source units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantityNode {
    pub kind: QuantityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attrs: IndexMap<String, serde_json::Value>,
}

impl QuantityNode {
    pub fn new(kind: QuantityKind, value: Option<Number>) -> Self {
        QuantityNode {
            kind,
            value,
            role: None,
            attrs: IndexMap::new(),
        }
    }

    /// Whether this node currently holds a value.
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Merges a repeated add's role and attributes into this node. Supplied
    /// fields win; absent fields leave existing data untouched.
    pub fn merge(&mut self, role: Option<&str>, attrs: &IndexMap<String, serde_json::Value>) {
        if let Some(r) = role {
            self.role = Some(r.to_string());
        }
        for (k, v) in attrs {
            self.attrs.insert(k.clone(), v.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::QuantityFamily;

    #[test]
    fn merge_overwrites_supplied_fields_only() {
        let mut node = QuantityNode::new(QuantityFamily::Length.into(), Some(Number::Int(5)));
        node.role = Some("gap".into());
        node.attrs.insert("unit".into(), serde_json::json!("m"));

        let mut extra = IndexMap::new();
        extra.insert("source".into(), serde_json::json!("regex"));
        node.merge(None, &extra);

        assert_eq!(node.role.as_deref(), Some("gap"));
        assert_eq!(node.attrs.len(), 2);

        node.merge(Some("delta"), &IndexMap::new());
        assert_eq!(node.role.as_deref(), Some("delta"));
    }

    #[test]
    fn serde_omits_empty_fields() {
        let node = QuantityNode::new(QuantityFamily::TreeCount.into(), None);
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(json, "{\"kind\":\"tree_count\"}");
    }
}
