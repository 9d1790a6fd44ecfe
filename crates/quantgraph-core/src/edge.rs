//! Relation edges between quantity nodes.
//!
//! A [`RelationEdge`] carries the relation's semantics ([`RelationKind`]) and
//! an optional operator tag ([`RelationOp`]) that further disambiguates it
//! (`plus1` vs `minus1` on a count relation, for instance). The problem
//! graph is a directed multigraph: several relations may connect the same
//! pair of nodes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The semantics of a relation edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// The source quantity is divided by the target quantity.
    Divides,
    Adds,
    Subtracts,
    Multiplies,
    /// Ties a measure pair to the count derived from it.
    CountRelation,
    /// Ties rates and time to a total amount of work.
    WorkRelation,
}

impl RelationKind {
    pub fn name(&self) -> &'static str {
        match self {
            RelationKind::Divides => "divides",
            RelationKind::Adds => "adds",
            RelationKind::Subtracts => "subtracts",
            RelationKind::Multiplies => "multiplies",
            RelationKind::CountRelation => "count_relation",
            RelationKind::WorkRelation => "work_relation",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RelationKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "divides" => Ok(RelationKind::Divides),
            "adds" => Ok(RelationKind::Adds),
            "subtracts" => Ok(RelationKind::Subtracts),
            "multiplies" => Ok(RelationKind::Multiplies),
            "count_relation" => Ok(RelationKind::CountRelation),
            "work_relation" => Ok(RelationKind::WorkRelation),
            other => Err(CoreError::UnknownRelation {
                name: other.to_string(),
            }),
        }
    }
}

/// Operator tags refining a relation edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationOp {
    Add,
    Sub,
    /// One more than the segment count (both endpoints planted).
    Plus1,
    /// One fewer than the segment count (neither endpoint planted).
    Minus1,
    /// Exactly the segment count (one endpoint planted, or a closed loop).
    Equal,
    FloorDiv,
    /// Four corner plantings shared between rectangle sides.
    Corners4,
}

impl RelationOp {
    pub fn name(&self) -> &'static str {
        match self {
            RelationOp::Add => "add",
            RelationOp::Sub => "sub",
            RelationOp::Plus1 => "plus1",
            RelationOp::Minus1 => "minus1",
            RelationOp::Equal => "equal",
            RelationOp::FloorDiv => "floor_div",
            RelationOp::Corners4 => "corners4",
        }
    }
}

impl fmt::Display for RelationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RelationOp {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "add" => Ok(RelationOp::Add),
            "sub" => Ok(RelationOp::Sub),
            "plus1" => Ok(RelationOp::Plus1),
            "minus1" => Ok(RelationOp::Minus1),
            "equal" => Ok(RelationOp::Equal),
            "floor_div" => Ok(RelationOp::FloorDiv),
            "corners4" => Ok(RelationOp::Corners4),
            other => Err(CoreError::UnknownOp {
                name: other.to_string(),
            }),
        }
    }
}

/// An edge in the problem graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationEdge {
    pub kind: RelationKind,
    /// Optional operator tag. `None` on a graph edge means the relation is
    /// untagged; templates treat an undeclared op as a wildcard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<RelationOp>,
}

impl RelationEdge {
    pub fn new(kind: RelationKind, op: Option<RelationOp>) -> Self {
        RelationEdge { kind, op }
    }
}
