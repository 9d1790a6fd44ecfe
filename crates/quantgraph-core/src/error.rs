//! Core error types for quantgraph-core.
//!
//! Uses `thiserror` for structured, matchable error variants. Schema
//! violations (unknown vocabulary names, unresolvable references) are fatal
//! for the current solve and surface immediately; "no match" and "no
//! solution" are ordinary outcomes, not errors, and have no variants here.

use thiserror::Error;

use crate::id::NodeId;

/// Errors produced by the problem-graph data model and its vocabularies.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A quantity-kind name outside the registered families, or an index on
    /// a family that does not admit one.
    #[error("unknown quantity kind: '{name}'")]
    UnknownKind { name: String },

    /// A topic name outside the known topic set.
    #[error("unknown topic: '{name}'")]
    UnknownTopic { name: String },

    /// A relation-kind name outside the edge vocabulary.
    #[error("unknown relation kind: '{name}'")]
    UnknownRelation { name: String },

    /// A relation-operator name outside the operator vocabulary.
    #[error("unknown relation op: '{name}'")]
    UnknownOp { name: String },

    /// An `add_edge` endpoint reference that resolves to no node.
    #[error("unresolved node reference: '{reference}' (add the node first)")]
    UnresolvedReference { reference: String },

    /// A node id that is not present in the graph.
    #[error("node not found: NodeId({id})", id = id.0)]
    NodeNotFound { id: NodeId },
}
