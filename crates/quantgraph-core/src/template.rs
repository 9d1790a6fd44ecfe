//! Templates: pre-authored structural patterns with their equation sets.
//!
//! Templates arrive from the store as raw [`TemplateSpec`] records (the
//! on-disk JSON shape) and are compiled exactly once into [`Template`]
//! values: vocabulary strings become typed kinds and operators, formulas and
//! guards become ASTs, and cross-references (edge endpoints, declared
//! unknowns) are checked. Compilation failures name the offending template.
//!
//! Templates are immutable after load.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::edge::{RelationKind, RelationOp};
use crate::error::CoreError;
use crate::formula::{parse_equation, Equation, FormulaParseError};
use crate::guard::{Guard, GuardParseError};
use crate::kind::QuantityKind;
use crate::pattern::{canonical_mode, Topic};

// ---------------------------------------------------------------------------
// Raw store records
// ---------------------------------------------------------------------------

/// The on-disk template record, exactly as authored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSpec {
    pub id: String,
    pub topic: String,
    pub mode: String,
    pub nodes: Vec<TemplateNodeSpec>,
    #[serde(default)]
    pub edges: Vec<TemplateEdgeSpec>,
    pub formula: Vec<String>,
    #[serde(default)]
    pub unknowns: Vec<String>,
    #[serde(default)]
    pub guards: Vec<String>,
    #[serde(default)]
    pub forbid_roles: Vec<ForbidRoleSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateNodeSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateEdgeSpec {
    pub u: String,
    pub v: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForbidRoleSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub role: String,
}

// ---------------------------------------------------------------------------
// Compiled form
// ---------------------------------------------------------------------------

/// A compiled template node. The id doubles as the algebraic symbol name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateNode {
    pub id: String,
    pub kind: QuantityKind,
    /// When declared, the mapped graph node's role must equal this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// A compiled template edge; endpoints are indices into the node list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateEdge {
    pub u: usize,
    pub v: usize,
    pub kind: RelationKind,
    /// When declared, the graph edge's op must equal this; `None` matches
    /// any op.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<RelationOp>,
    /// Optional edges produce a reduced template variant without them.
    #[serde(default)]
    pub optional: bool,
}

/// A forbidden `(kind, role)` pair: its presence anywhere in the problem
/// graph vetoes the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForbidRole {
    pub kind: QuantityKind,
    pub role: String,
}

/// A compiled, immutable template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub topic: Topic,
    pub mode: String,
    pub nodes: Vec<TemplateNode>,
    pub edges: Vec<TemplateEdge>,
    /// Raw formula strings, kept for explanation output.
    pub formulas: Vec<String>,
    /// Parsed equation set, index-aligned with `formulas`.
    pub equations: Vec<Equation>,
    /// Declared unknown node ids. The solver treats the graph's actual
    /// known/unknown state as ground truth and these as a supplement.
    pub unknowns: Vec<String>,
    pub guards: Vec<Guard>,
    pub forbid_roles: Vec<ForbidRole>,
}

impl Template {
    /// Compiles a raw spec. All vocabulary, formula, and guard parsing
    /// happens here, once, at load time.
    pub fn compile(spec: TemplateSpec) -> Result<Template, TemplateError> {
        let in_template = |source: CoreError| TemplateError::Vocabulary {
            template: spec.id.clone(),
            source,
        };

        let topic: Topic = spec.topic.parse().map_err(in_template)?;
        let mode = canonical_mode(topic, &spec.mode);

        let mut nodes = Vec::with_capacity(spec.nodes.len());
        for node in &spec.nodes {
            if nodes.iter().any(|n: &TemplateNode| n.id == node.id) {
                return Err(TemplateError::DuplicateNode {
                    template: spec.id.clone(),
                    id: node.id.clone(),
                });
            }
            nodes.push(TemplateNode {
                id: node.id.clone(),
                kind: node.kind.parse().map_err(in_template)?,
                role: node.role.clone(),
            });
        }

        let node_index = |id: &str| nodes.iter().position(|n| n.id == id);

        let mut edges = Vec::with_capacity(spec.edges.len());
        for edge in &spec.edges {
            let u = node_index(&edge.u).ok_or_else(|| TemplateError::UnknownEndpoint {
                template: spec.id.clone(),
                endpoint: edge.u.clone(),
            })?;
            let v = node_index(&edge.v).ok_or_else(|| TemplateError::UnknownEndpoint {
                template: spec.id.clone(),
                endpoint: edge.v.clone(),
            })?;
            let op = match &edge.op {
                Some(raw) => Some(raw.parse().map_err(in_template)?),
                None => None,
            };
            edges.push(TemplateEdge {
                u,
                v,
                kind: edge.kind.parse().map_err(in_template)?,
                op,
                optional: edge.optional,
            });
        }

        for unknown in &spec.unknowns {
            if node_index(unknown).is_none() {
                return Err(TemplateError::UnknownUnknown {
                    template: spec.id.clone(),
                    id: unknown.clone(),
                });
            }
        }

        let mut equations = Vec::with_capacity(spec.formula.len());
        for formula in &spec.formula {
            let eq = parse_equation(formula).map_err(|source| TemplateError::Formula {
                template: spec.id.clone(),
                formula: formula.clone(),
                source,
            })?;
            equations.push(eq);
        }

        let mut guards = Vec::with_capacity(spec.guards.len());
        for guard in &spec.guards {
            let parsed = Guard::parse(guard).map_err(|source| TemplateError::Guard {
                template: spec.id.clone(),
                guard: guard.clone(),
                source,
            })?;
            guards.push(parsed);
        }

        let mut forbid_roles = Vec::with_capacity(spec.forbid_roles.len());
        for forbid in &spec.forbid_roles {
            forbid_roles.push(ForbidRole {
                kind: forbid.kind.parse().map_err(in_template)?,
                role: forbid.role.clone(),
            });
        }

        Ok(Template {
            id: spec.id,
            topic,
            mode,
            nodes,
            edges,
            formulas: spec.formula,
            equations,
            unknowns: spec.unknowns,
            guards,
            forbid_roles,
        })
    }

    /// Looks up a template node by id.
    pub fn node(&self, id: &str) -> Option<&TemplateNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Whether any edge is declared optional.
    pub fn has_optional_edges(&self) -> bool {
        self.edges.iter().any(|e| e.optional)
    }
}

/// Template compilation failures, raised at load time.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template '{template}': {source}")]
    Vocabulary {
        template: String,
        #[source]
        source: CoreError,
    },

    #[error("template '{template}': duplicate node id '{id}'")]
    DuplicateNode { template: String, id: String },

    #[error("template '{template}': edge endpoint '{endpoint}' is not a declared node")]
    UnknownEndpoint { template: String, endpoint: String },

    #[error("template '{template}': unknown '{id}' is not a declared node")]
    UnknownUnknown { template: String, id: String },

    #[error("template '{template}': formula '{formula}': {source}")]
    Formula {
        template: String,
        formula: String,
        #[source]
        source: FormulaParseError,
    },

    #[error("template '{template}': guard '{guard}': {source}")]
    Guard {
        template: String,
        guard: String,
        #[source]
        source: GuardParseError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_json(json: &str) -> TemplateSpec {
        serde_json::from_str(json).unwrap()
    }

    const BOTH_ENDS: &str = r#"{
        "id": "tree.both_ends_quantity",
        "topic": "tree",
        "mode": "both_ends_quantity",
        "nodes": [
            {"id": "L", "type": "length"},
            {"id": "I", "type": "interval"},
            {"id": "Z", "type": "tree_count"}
        ],
        "edges": [
            {"u": "L", "v": "I", "type": "divides"}
        ],
        "formula": ["Z = L / I + 1"],
        "unknowns": ["Z"],
        "forbid_roles": [{"type": "tree_count", "role": "two_sides"}]
    }"#;

    #[test]
    fn compiles_a_full_spec() {
        let tpl = Template::compile(spec_json(BOTH_ENDS)).unwrap();
        assert_eq!(tpl.topic, Topic::Tree);
        assert_eq!(tpl.nodes.len(), 3);
        assert_eq!(tpl.edges.len(), 1);
        assert_eq!(tpl.edges[0].kind, RelationKind::Divides);
        assert_eq!(tpl.equations.len(), 1);
        assert_eq!(tpl.forbid_roles[0].role, "two_sides");
        assert!(!tpl.has_optional_edges());
        assert!(tpl.node("Z").is_some());
        assert!(tpl.node("X").is_none());
    }

    #[test]
    fn mode_is_canonicalized_at_compile_time() {
        let spec = spec_json(
            r#"{"id": "t", "topic": "tree", "mode": "loop_closed_distance",
                "nodes": [{"id": "L", "type": "length"}], "formula": []}"#,
        );
        let tpl = Template::compile(spec).unwrap();
        assert_eq!(tpl.mode, "loop_closed");
    }

    #[test]
    fn rejects_unknown_vocabulary() {
        let spec = spec_json(
            r#"{"id": "t", "topic": "tree", "mode": "m",
                "nodes": [{"id": "A", "type": "bogus"}], "formula": []}"#,
        );
        assert!(matches!(
            Template::compile(spec),
            Err(TemplateError::Vocabulary { .. })
        ));
    }

    #[test]
    fn rejects_dangling_edge_endpoint() {
        let spec = spec_json(
            r#"{"id": "t", "topic": "tree", "mode": "m",
                "nodes": [{"id": "L", "type": "length"}],
                "edges": [{"u": "L", "v": "I", "type": "divides"}],
                "formula": []}"#,
        );
        assert!(matches!(
            Template::compile(spec),
            Err(TemplateError::UnknownEndpoint { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_node_ids() {
        let spec = spec_json(
            r#"{"id": "t", "topic": "tree", "mode": "m",
                "nodes": [{"id": "L", "type": "length"}, {"id": "L", "type": "interval"}],
                "formula": []}"#,
        );
        assert!(matches!(
            Template::compile(spec),
            Err(TemplateError::DuplicateNode { .. })
        ));
    }

    #[test]
    fn rejects_undeclared_unknown() {
        let spec = spec_json(
            r#"{"id": "t", "topic": "tree", "mode": "m",
                "nodes": [{"id": "L", "type": "length"}],
                "formula": [], "unknowns": ["Z"]}"#,
        );
        assert!(matches!(
            Template::compile(spec),
            Err(TemplateError::UnknownUnknown { .. })
        ));
    }

    #[test]
    fn rejects_malformed_formula_and_guard() {
        let spec = spec_json(
            r#"{"id": "t", "topic": "tree", "mode": "m",
                "nodes": [{"id": "L", "type": "length"}],
                "formula": ["L + 1"]}"#,
        );
        assert!(matches!(
            Template::compile(spec),
            Err(TemplateError::Formula { .. })
        ));

        let spec = spec_json(
            r#"{"id": "t", "topic": "tree", "mode": "m",
                "nodes": [{"id": "L", "type": "length"}],
                "formula": [], "guards": ["L ~ 3"]}"#,
        );
        assert!(matches!(
            Template::compile(spec),
            Err(TemplateError::Guard { .. })
        ));
    }

    #[test]
    fn optional_edge_flag_is_carried() {
        let spec = spec_json(
            r#"{"id": "t", "topic": "tree", "mode": "loop_closed",
                "nodes": [{"id": "L", "type": "length"}, {"id": "I", "type": "interval"}],
                "edges": [{"u": "L", "v": "I", "type": "divides", "optional": true}],
                "formula": []}"#,
        );
        let tpl = Template::compile(spec).unwrap();
        assert!(tpl.has_optional_edges());
    }
}
