//! Diagram export: Mermaid and Graphviz DOT renderings of a problem graph.
//!
//! Matched nodes are highlighted and solved values inlined next to the
//! unknowns they answer, so a rendered diagram doubles as a worked
//! explanation of the solve. Output is deterministic for a given graph.

use std::collections::BTreeMap;
use std::fmt::Write;

use quantgraph_core::graph::ProblemGraph;
use quantgraph_core::id::NodeId;
use quantgraph_core::mapping::Mapping;
use quantgraph_core::value::Number;

/// Per-node display data assembled from the graph and an optional solve.
struct NodeLabel {
    id: NodeId,
    text: String,
    matched: bool,
}

fn node_labels(
    graph: &ProblemGraph,
    mapping: Option<&Mapping>,
    solved: Option<&BTreeMap<String, Number>>,
) -> Vec<NodeLabel> {
    graph
        .nodes()
        .map(|(id, node)| {
            let symbol = mapping.and_then(|m| {
                m.iter()
                    .find(|(_, mapped)| *mapped == id)
                    .map(|(sym, _)| sym.to_string())
            });
            let mut text = node.kind.to_string();
            if let Some(role) = &node.role {
                let _ = write!(text, " ({})", role);
            }
            match node.value {
                Some(value) => {
                    let _ = write!(text, " = {}", value);
                }
                None => {
                    let answer = symbol
                        .as_deref()
                        .and_then(|sym| solved.and_then(|s| s.get(sym)));
                    match answer {
                        Some(value) => {
                            let _ = write!(text, " = ? -> {}", value);
                        }
                        None => text.push_str(" = ?"),
                    }
                }
            }
            NodeLabel {
                id,
                text,
                matched: mapping.map_or(false, |m| m.maps_to(id)),
            }
        })
        .collect()
}

/// Renders the graph as a Mermaid flowchart.
pub fn to_mermaid(
    graph: &ProblemGraph,
    mapping: Option<&Mapping>,
    solved: Option<&BTreeMap<String, Number>>,
) -> String {
    let mut out = String::from("graph LR\n");
    for label in node_labels(graph, mapping, solved) {
        let _ = writeln!(out, "    n{}[\"{}\"]", label.id, label.text);
        if label.matched {
            let _ = writeln!(out, "    class n{} matched", label.id);
        }
    }
    for (u, v, edge) in graph.edges() {
        let tag = match edge.op {
            Some(op) => format!("{}/{}", edge.kind, op),
            None => edge.kind.to_string(),
        };
        let _ = writeln!(out, "    n{} -->|{}| n{}", u, tag, v);
    }
    out.push_str("    classDef matched stroke-width:3px\n");
    out
}

/// Renders the graph as Graphviz DOT.
pub fn to_dot(
    graph: &ProblemGraph,
    mapping: Option<&Mapping>,
    solved: Option<&BTreeMap<String, Number>>,
) -> String {
    let mut out = String::from("digraph problem {\n    rankdir=LR;\n");
    for label in node_labels(graph, mapping, solved) {
        let style = if label.matched {
            ", penwidth=2, color=blue"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "    n{} [label=\"{}\"{}];",
            label.id,
            label.text.replace('"', "\\\""),
            style
        );
    }
    for (u, v, edge) in graph.edges() {
        let tag = match edge.op {
            Some(op) => format!("{}/{}", edge.kind, op),
            None => edge.kind.to_string(),
        };
        let _ = writeln!(out, "    n{} -> n{} [label=\"{}\"];", u, v, tag);
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use quantgraph_core::kind::QuantityFamily::*;

    fn sample() -> (ProblemGraph, Mapping, BTreeMap<String, Number>) {
        let mut graph = ProblemGraph::new();
        let l = graph.add_node(Length.into(), Some(Number::Int(120)));
        let i = graph.add_node(Interval.into(), Some(Number::Int(15)));
        let z = graph.add_node(TreeCount.into(), None);
        graph
            .add_edge(l, i, quantgraph_core::RelationKind::Divides, None)
            .unwrap();

        let mut mapping = Mapping::new();
        mapping.insert("L", l);
        mapping.insert("I", i);
        mapping.insert("Z", z);

        let mut solved = BTreeMap::new();
        solved.insert("Z".to_string(), Number::Int(9));
        (graph, mapping, solved)
    }

    #[test]
    fn mermaid_inlines_solved_values() {
        let (graph, mapping, solved) = sample();
        let text = to_mermaid(&graph, Some(&mapping), Some(&solved));
        assert!(text.starts_with("graph LR\n"));
        assert!(text.contains("n0[\"length = 120\"]"));
        assert!(text.contains("n2[\"tree_count = ? -> 9\"]"));
        assert!(text.contains("n0 -->|divides| n1"));
        assert!(text.contains("class n2 matched"));
    }

    #[test]
    fn mermaid_without_solve_marks_unknowns() {
        let (graph, _, _) = sample();
        let text = to_mermaid(&graph, None, None);
        assert!(text.contains("n2[\"tree_count = ?\"]"));
        assert!(!text.contains("class n2 matched"));
    }

    #[test]
    fn dot_is_well_formed() {
        let (graph, mapping, solved) = sample();
        let text = to_dot(&graph, Some(&mapping), Some(&solved));
        assert!(text.starts_with("digraph problem {"));
        assert!(text.trim_end().ends_with('}'));
        assert!(text.contains("n0 -> n1 [label=\"divides\"];"));
        assert!(text.contains("penwidth=2"));
    }
}
