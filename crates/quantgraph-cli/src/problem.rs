//! The JSON problem description format.
//!
//! A problem file is the serialized output contract of upstream extraction:
//! quantity nodes, relation edges (endpoints given as kind references),
//! the detected `(topic, mode)`, and the asked-for target kind. Building a
//! graph from it exercises exactly the public construction interface --
//! nodes first, then edges, then pattern and target -- and finishes with
//! the same wrap-up normalization extraction performs.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use quantgraph_core::edge::{RelationKind, RelationOp};
use quantgraph_core::error::CoreError;
use quantgraph_core::graph::ProblemGraph;
use quantgraph_core::kind::QuantityKind;
use quantgraph_core::pattern::Topic;
use quantgraph_core::value::Number;

/// A problem description as produced by upstream extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// The quantity kind the question asks for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub lock_mode: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flags: BTreeMap<String, bool>,
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSpec {
    /// Endpoint kind reference, resolved to the most recent node of that
    /// kind (or family).
    pub u: String,
    pub v: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
}

/// Builds a problem graph through the public construction interface.
pub fn build_graph(spec: &ProblemSpec) -> Result<ProblemGraph, CoreError> {
    let mut graph = ProblemGraph::new();

    for node in &spec.nodes {
        let kind: QuantityKind = node.kind.parse()?;
        graph.add_node_full(kind, node.value, node.role.as_deref(), IndexMap::new());
    }

    for edge in &spec.edges {
        let u: QuantityKind = edge.u.parse()?;
        let v: QuantityKind = edge.v.parse()?;
        let kind: RelationKind = edge.kind.parse()?;
        let op: Option<RelationOp> = match &edge.op {
            Some(raw) => Some(raw.parse()?),
            None => None,
        };
        graph.add_edge(u, v, kind, op)?;
    }

    if let (Some(topic), Some(mode)) = (&spec.topic, &spec.mode) {
        let topic: Topic = topic.parse()?;
        graph.set_pattern(topic, mode, false);
    }
    if spec.lock_mode {
        graph.lock_pattern();
    }
    if let Some(target) = &spec.target {
        graph.set_target(target.parse()?);
    }
    for (name, value) in &spec.flags {
        graph.set_flag(name, *value);
    }

    graph.finalize();
    Ok(graph)
}
