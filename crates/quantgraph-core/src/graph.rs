//! ProblemGraph: the attributed multigraph built from one word problem.
//!
//! [`ProblemGraph`] is the single entry point for constructing and querying a
//! problem. Upstream extraction populates it through the builder methods
//! (`add_node`, `add_edge`, `set_pattern`, ...); once matching begins the
//! graph is read-only by convention -- the matcher and solver borrow it
//! immutably.
//!
//! # Builder invariants
//!
//! - Node ids are unique and issued by the graph.
//! - `add_node` is idempotent: a repeated add with the same kind and a
//!   numerically equal value (both-unset counts as equal) returns the
//!   existing id and merges any newly supplied role/attributes. An add that
//!   supplies a value for an existing valueless node of that kind fills the
//!   value in place instead of creating a duplicate.
//! - Edge endpoints may be literal node ids or kind references; a kind
//!   reference resolves to the most recently created node of that kind,
//!   falling back to the most recent member of the family for unindexed
//!   references to indexable families. Failed resolution is an error.
//! - `set_pattern` canonicalizes the mode and respects `lock_mode`.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use petgraph::stable_graph::StableGraph;
use petgraph::visit::EdgeRef;
use petgraph::Directed;
use serde::{Deserialize, Serialize};

use crate::edge::{RelationEdge, RelationKind, RelationOp};
use crate::error::CoreError;
use crate::id::{EdgeId, NodeId};
use crate::kind::{QuantityFamily, QuantityKind};
use crate::node::QuantityNode;
use crate::pattern::{canonical_mode, Topic};
use crate::value::Number;

/// An `add_edge` endpoint: a literal node id or a kind reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef {
    Id(NodeId),
    Kind(QuantityKind),
}

impl From<NodeId> for NodeRef {
    fn from(id: NodeId) -> Self {
        NodeRef::Id(id)
    }
}

impl From<QuantityKind> for NodeRef {
    fn from(kind: QuantityKind) -> Self {
        NodeRef::Kind(kind)
    }
}

impl From<QuantityFamily> for NodeRef {
    fn from(family: QuantityFamily) -> Self {
        NodeRef::Kind(family.into())
    }
}

/// Value predicate for [`ProblemGraph::has_node`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueFilter {
    /// Match regardless of value.
    Ignore,
    /// Match only nodes holding some value.
    Known,
    /// Match only nodes holding this exact value (numeric equality).
    Equals(Number),
}

/// Graph-level metadata: the selected template family plus cross-cutting
/// modifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphMeta {
    /// The problem topic, if detected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<Topic>,
    /// The canonicalized mode within the topic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// The mode as originally supplied, before canonicalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_raw: Option<String>,
    /// Once set, further `set_pattern` calls are ignored unless overridden.
    #[serde(default)]
    pub lock_mode: bool,
    /// The quantity kind the problem asks for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<QuantityKind>,
    /// Cross-cutting boolean modifiers (`two_sides`, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flags: BTreeMap<String, bool>,
}

/// The attributed problem multigraph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemGraph {
    graph: StableGraph<QuantityNode, RelationEdge, Directed, u32>,
    /// Most recently created node per exact kind.
    latest: HashMap<QuantityKind, NodeId>,
    /// Most recently created node per family, across indexes.
    latest_family: HashMap<QuantityFamily, NodeId>,
    pub meta: GraphMeta,
}

impl Default for ProblemGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ProblemGraph {
    /// Creates an empty problem graph.
    pub fn new() -> Self {
        ProblemGraph {
            graph: StableGraph::new(),
            latest: HashMap::new(),
            latest_family: HashMap::new(),
            meta: GraphMeta::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Builder methods
    // -----------------------------------------------------------------------

    /// Adds a quantity node, reusing or filling an existing node per the
    /// builder invariants. Returns the node's id.
    pub fn add_node(&mut self, kind: QuantityKind, value: Option<Number>) -> NodeId {
        self.add_node_full(kind, value, None, IndexMap::new())
    }

    /// Like [`add_node`](Self::add_node), additionally carrying a role
    /// qualifier and open attributes. On reuse the supplied role/attrs are
    /// merged into the existing node, never dropped.
    pub fn add_node_full(
        &mut self,
        kind: QuantityKind,
        value: Option<Number>,
        role: Option<&str>,
        attrs: IndexMap<String, serde_json::Value>,
    ) -> NodeId {
        // First matching node in insertion order wins: an equal value (or
        // both unset) reuses the node, a valueless node gets filled.
        let existing = self.graph.node_indices().find(|&idx| {
            let node = &self.graph[idx];
            node.kind == kind
                && (node.value == value || (node.value.is_none() && value.is_some()))
        });
        if let Some(idx) = existing {
            let node = &mut self.graph[idx];
            if node.value.is_none() {
                node.value = value;
            }
            node.merge(role, &attrs);
            return NodeId::from(idx);
        }

        let mut node = QuantityNode::new(kind, value);
        node.merge(role, &attrs);
        let id = NodeId::from(self.graph.add_node(node));
        self.latest.insert(kind, id);
        self.latest_family.insert(kind.family, id);
        id
    }

    /// Adds a relation edge between two endpoints, each given as a node id
    /// or a kind reference resolved to the most recent node of that kind.
    pub fn add_edge(
        &mut self,
        u: impl Into<NodeRef>,
        v: impl Into<NodeRef>,
        kind: RelationKind,
        op: Option<RelationOp>,
    ) -> Result<EdgeId, CoreError> {
        let u = self.resolve(u.into())?;
        let v = self.resolve(v.into())?;
        let idx = self
            .graph
            .add_edge(u.into(), v.into(), RelationEdge::new(kind, op));
        Ok(EdgeId::from(idx))
    }

    /// Resolves an endpoint reference to a node id.
    pub fn resolve(&self, reference: NodeRef) -> Result<NodeId, CoreError> {
        match reference {
            NodeRef::Id(id) => {
                if self.graph.node_weight(id.into()).is_some() {
                    Ok(id)
                } else {
                    Err(CoreError::UnresolvedReference {
                        reference: format!("NodeId({})", id),
                    })
                }
            }
            NodeRef::Kind(kind) => {
                if let Some(&id) = self.latest.get(&kind) {
                    return Ok(id);
                }
                // An unindexed reference to an indexable family falls back to
                // the family's most recent member (length -> length2).
                if kind.index.is_none() && kind.family.is_indexable() {
                    if let Some(&id) = self.latest_family.get(&kind.family) {
                        return Ok(id);
                    }
                }
                Err(CoreError::UnresolvedReference {
                    reference: kind.to_string(),
                })
            }
        }
    }

    /// Sets the graph's `(topic, mode)`. The mode is canonicalized and its
    /// original spelling preserved in `mode_raw`. While `lock_mode` is set
    /// the call is silently ignored unless `override_lock` is passed.
    pub fn set_pattern(&mut self, topic: Topic, mode: &str, override_lock: bool) {
        if self.meta.lock_mode && !override_lock {
            return;
        }
        self.meta.topic = Some(topic);
        self.meta.mode = Some(canonical_mode(topic, mode));
        self.meta.mode_raw = Some(mode.to_string());
    }

    /// Suppresses further automatic pattern changes.
    pub fn lock_pattern(&mut self) {
        self.meta.lock_mode = true;
    }

    /// Records the quantity kind the problem asks for.
    pub fn set_target(&mut self, kind: QuantityKind) {
        self.meta.target = Some(kind);
    }

    /// Sets a cross-cutting boolean modifier.
    pub fn set_flag(&mut self, name: &str, value: bool) {
        self.meta.flags.insert(name.to_string(), value);
    }

    /// Reads a cross-cutting modifier; unset flags are `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.meta.flags.get(name).copied().unwrap_or(false)
    }

    /// Construction wrap-up: re-canonicalizes the mode and wires the
    /// conventional `divides` edge between the most recent length and
    /// interval when both exist and the edge is absent.
    pub fn finalize(&mut self) {
        if let (Some(topic), Some(mode)) = (self.meta.topic, self.meta.mode.clone()) {
            self.meta.mode = Some(canonical_mode(topic, &mode));
        }
        let length = self.latest_family.get(&QuantityFamily::Length).copied();
        let interval = self.latest_family.get(&QuantityFamily::Interval).copied();
        if let (Some(l), Some(i)) = (length, interval) {
            if self.edges_between(l, i).next().is_none() {
                let _ = self.add_edge(l, i, RelationKind::Divides, None);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Query methods
    // -----------------------------------------------------------------------

    /// Looks up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&QuantityNode> {
        self.graph.node_weight(id.into())
    }

    /// Iterates all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &QuantityNode)> {
        self.graph
            .node_indices()
            .map(move |idx| (NodeId::from(idx), &self.graph[idx]))
    }

    /// Iterates all edges as `(from, to, edge)` triples.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, &RelationEdge)> {
        self.graph.edge_references().map(|e| {
            (
                NodeId::from(e.source()),
                NodeId::from(e.target()),
                e.weight(),
            )
        })
    }

    /// Iterates the parallel edges from `u` to `v`.
    pub fn edges_between(&self, u: NodeId, v: NodeId) -> impl Iterator<Item = &RelationEdge> {
        self.graph
            .edges_connecting(u.into(), v.into())
            .map(|e| e.weight())
    }

    /// Existence predicate over kind and value.
    pub fn has_node(&self, kind: Option<QuantityKind>, filter: ValueFilter) -> bool {
        self.nodes().any(|(_, node)| {
            if let Some(k) = kind {
                if node.kind != k {
                    return false;
                }
            }
            match filter {
                ValueFilter::Ignore => true,
                ValueFilter::Known => node.value.is_some(),
                ValueFilter::Equals(v) => node.value == Some(v),
            }
        })
    }

    /// The most recently created node of exactly this kind.
    pub fn most_recent_of(&self, kind: QuantityKind) -> Option<NodeId> {
        self.latest.get(&kind).copied()
    }

    /// The most recently created node of any kind within the family.
    pub fn most_recent_of_family(&self, family: QuantityFamily) -> Option<NodeId> {
        self.latest_family.get(&family).copied()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
