//! Subgraph embedding enumeration.
//!
//! Finds every injective mapping from a template's nodes to problem-graph
//! nodes satisfying the node predicate (equal kind; equal role when the
//! template declares one) and the edge predicate (a graph edge of equal kind
//! between the mapped endpoints; a declared template op must match exactly,
//! an undeclared op is a wildcard).
//!
//! Enumeration order is deterministic: template nodes are processed in
//! declaration order and graph candidates in node-id order, so the same
//! graph and template always yield the same mapping sequence.

use smallvec::SmallVec;

use quantgraph_core::graph::ProblemGraph;
use quantgraph_core::id::NodeId;
use quantgraph_core::mapping::Mapping;
use quantgraph_core::template::{Template, TemplateEdge};

/// Enumerates all embeddings of the template (or, with
/// `include_optional == false`, of its reduced variant without optional
/// edges) into the graph.
pub fn enumerate(
    graph: &ProblemGraph,
    template: &Template,
    include_optional: bool,
) -> Vec<Mapping> {
    if template.nodes.is_empty() {
        return Vec::new();
    }

    // Candidate graph nodes per template node, in node-id order.
    let candidates: Vec<Vec<NodeId>> = template
        .nodes
        .iter()
        .map(|tnode| {
            graph
                .nodes()
                .filter(|(_, gnode)| {
                    if gnode.kind != tnode.kind {
                        return false;
                    }
                    match &tnode.role {
                        Some(role) => gnode.role.as_deref() == Some(role.as_str()),
                        None => true,
                    }
                })
                .map(|(id, _)| id)
                .collect()
        })
        .collect();

    if candidates.iter().any(|c| c.is_empty()) {
        return Vec::new();
    }

    let edges: Vec<&TemplateEdge> = template
        .edges
        .iter()
        .filter(|e| include_optional || !e.optional)
        .collect();

    let mut assignment: SmallVec<[NodeId; 8]> = SmallVec::new();
    let mut results = Vec::new();
    extend(graph, template, &candidates, &edges, &mut assignment, &mut results);
    results
}

fn extend(
    graph: &ProblemGraph,
    template: &Template,
    candidates: &[Vec<NodeId>],
    edges: &[&TemplateEdge],
    assignment: &mut SmallVec<[NodeId; 8]>,
    results: &mut Vec<Mapping>,
) {
    let position = assignment.len();
    if position == candidates.len() {
        let mapping = Mapping::from_pairs(
            template
                .nodes
                .iter()
                .zip(assignment.iter())
                .map(|(tnode, id)| (tnode.id.clone(), *id))
                .collect(),
        );
        results.push(mapping);
        return;
    }

    for &candidate in &candidates[position] {
        if assignment.contains(&candidate) {
            continue; // injectivity
        }
        assignment.push(candidate);
        if edges_satisfied(graph, edges, assignment, position) {
            extend(graph, template, candidates, edges, assignment, results);
        }
        assignment.pop();
    }
}

/// Checks every template edge whose endpoints are both assigned and whose
/// later endpoint is the just-assigned position.
fn edges_satisfied(
    graph: &ProblemGraph,
    edges: &[&TemplateEdge],
    assignment: &SmallVec<[NodeId; 8]>,
    position: usize,
) -> bool {
    edges.iter().all(|edge| {
        if edge.u.max(edge.v) != position {
            return true;
        }
        let u = assignment[edge.u];
        let v = assignment[edge.v];
        graph.edges_between(u, v).any(|gedge| {
            gedge.kind == edge.kind && edge.op.map_or(true, |op| gedge.op == Some(op))
        })
    })
}
