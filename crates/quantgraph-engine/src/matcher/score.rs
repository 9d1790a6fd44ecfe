//! Candidate scoring: picking the best interpretation of an ambiguous graph.
//!
//! Every surviving (template, mapping) pair gets an additive score; the
//! matcher keeps the highest. The weights are hand-tuned heuristics carried
//! over from the original rule set; they are exposed as a configurable
//! [`ScoreWeights`] value rather than hard-coded, since their exact
//! magnitudes are a tuning choice, not a correctness requirement.

use serde::{Deserialize, Serialize};

use quantgraph_core::graph::ProblemGraph;
use quantgraph_core::mapping::Mapping;
use quantgraph_core::template::Template;

/// Additive scoring weights. Higher totals win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Some unknown maps to a node of the graph's declared target kind.
    pub target_hit: i64,
    /// An unknown maps to a node with no value (genuinely unknown).
    pub unknown_open: i64,
    /// An unknown maps to a node that already has a value (suspicious).
    pub unknown_filled: i64,
    /// A non-unknown template node maps to a valued node (known context).
    pub known_context: i64,
    /// A count-kind node maps to a value greater than one (reads as a
    /// total, not a per-unit phrase).
    pub count_total: i64,
    /// A count-kind node maps to exactly one while another count node in
    /// the graph exceeds one (almost certainly a "one per interval"
    /// phrasing, not the problem's total).
    pub count_unit_penalty: i64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights {
            target_hit: 1000,
            unknown_open: 50,
            unknown_filled: -200,
            known_context: 10,
            count_total: 200,
            count_unit_penalty: -2000,
        }
    }
}

/// Scores one (template, mapping) hit against the graph.
pub fn score_match(
    graph: &ProblemGraph,
    template: &Template,
    mapping: &Mapping,
    weights: &ScoreWeights,
) -> i64 {
    let mut score = 0;

    // Target kind strongly dominates: answer what the problem asks for.
    if let Some(target) = graph.meta.target {
        let hits_target = template.unknowns.iter().any(|u| {
            mapping
                .get(u)
                .and_then(|id| graph.node(id))
                .map_or(false, |node| node.kind == target)
        });
        if hits_target {
            score += weights.target_hit;
        }
    }

    // Unknowns should be genuinely unknown in the graph.
    for unknown in &template.unknowns {
        let has_value = mapping
            .get(unknown)
            .and_then(|id| graph.node(id))
            .map_or(false, |node| node.has_value());
        score += if has_value {
            weights.unknown_filled
        } else {
            weights.unknown_open
        };
    }

    // Known context: the more of the template's remaining nodes carry
    // values, the better the fit.
    for tnode in &template.nodes {
        if template.unknowns.contains(&tnode.id) {
            continue;
        }
        let has_value = mapping
            .get(&tnode.id)
            .and_then(|id| graph.node(id))
            .map_or(false, |node| node.has_value());
        if has_value {
            score += weights.known_context;
        }
    }

    // Count disambiguation: prefer totals, punish "one per unit" readings.
    let any_count_above_one = graph.nodes().any(|(_, node)| {
        node.kind.is_count() && node.value.map_or(false, |v| v.as_f64() > 1.0)
    });
    for (symbol, node_id) in mapping.iter() {
        let is_count = template
            .node(symbol)
            .map_or(false, |tnode| tnode.kind.is_count());
        if !is_count {
            continue;
        }
        let Some(value) = graph.node(node_id).and_then(|n| n.value) else {
            continue;
        };
        let value = value.as_f64();
        if value == 1.0 && any_count_above_one {
            score += weights.count_unit_penalty;
        } else if value > 1.0 {
            score += weights.count_total;
        }
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use quantgraph_core::kind::QuantityFamily::*;
    use quantgraph_core::template::TemplateSpec;
    use quantgraph_core::value::Number;

    fn template(json: &str) -> Template {
        Template::compile(serde_json::from_str::<TemplateSpec>(json).unwrap()).unwrap()
    }

    const BOTH_ENDS: &str = r#"{
        "id": "tree.both_ends_quantity", "topic": "tree", "mode": "both_ends_quantity",
        "nodes": [
            {"id": "L", "type": "length"},
            {"id": "I", "type": "interval"},
            {"id": "Z", "type": "tree_count"}
        ],
        "edges": [],
        "formula": ["Z = L / I + 1"],
        "unknowns": ["Z"]
    }"#;

    fn mapping_for(graph: &ProblemGraph, template: &Template) -> Mapping {
        crate::matcher::embed::enumerate(graph, template, true)
            .into_iter()
            .next()
            .expect("embedding")
    }

    #[test]
    fn target_and_known_context_add_up() {
        let mut g = ProblemGraph::new();
        g.add_node(Length.into(), Some(Number::Int(120)));
        g.add_node(Interval.into(), Some(Number::Int(15)));
        g.add_node(TreeCount.into(), None);
        g.set_target(TreeCount.into());

        let tpl = template(BOTH_ENDS);
        let mapping = mapping_for(&g, &tpl);
        let score = score_match(&g, &tpl, &mapping, &ScoreWeights::default());
        // target 1000 + open unknown 50 + two known nodes 20.
        assert_eq!(score, 1070);
    }

    #[test]
    fn filled_unknown_is_penalized() {
        let mut g = ProblemGraph::new();
        g.add_node(Length.into(), Some(Number::Int(120)));
        g.add_node(Interval.into(), Some(Number::Int(15)));
        g.add_node(TreeCount.into(), Some(Number::Int(9)));

        let tpl = template(BOTH_ENDS);
        let mapping = mapping_for(&g, &tpl);
        let score = score_match(&g, &tpl, &mapping, &ScoreWeights::default());
        // filled unknown -200 + two known nodes 20 + count total 200.
        assert_eq!(score, 20);
    }

    #[test]
    fn count_of_one_is_punished_when_a_total_exists() {
        let mut g = ProblemGraph::new();
        g.add_node(Interval.into(), Some(Number::Int(5)));
        g.add_node(TreeCount.into(), Some(Number::Int(25)));
        g.add_node(TreeCount.into(), Some(Number::Int(1)));
        g.add_node(Length.into(), None);

        let tpl = template(
            r#"{
                "id": "tree.both_ends_distance", "topic": "tree", "mode": "both_ends_distance",
                "nodes": [
                    {"id": "L", "type": "length"},
                    {"id": "I", "type": "interval"},
                    {"id": "Z", "type": "tree_count"}
                ],
                "edges": [],
                "formula": ["L = I * (Z - 1)"],
                "unknowns": ["L"]
            }"#,
        );

        let mappings = crate::matcher::embed::enumerate(&g, &tpl, true);
        assert_eq!(mappings.len(), 2);

        let weights = ScoreWeights::default();
        let scored: Vec<i64> = mappings
            .iter()
            .map(|m| score_match(&g, &tpl, m, &weights))
            .collect();

        let (total, unit): (usize, usize) = {
            let first_val = g
                .node(mappings[0].get("Z").unwrap())
                .unwrap()
                .value
                .unwrap();
            if first_val == Number::Int(25) {
                (0, 1)
            } else {
                (1, 0)
            }
        };
        assert!(scored[total] > scored[unit]);
        assert!(scored[unit] < 0);
    }

    #[test]
    fn weights_are_configurable() {
        let mut g = ProblemGraph::new();
        g.add_node(Length.into(), Some(Number::Int(120)));
        g.add_node(Interval.into(), Some(Number::Int(15)));
        g.add_node(TreeCount.into(), None);

        let tpl = template(BOTH_ENDS);
        let mapping = mapping_for(&g, &tpl);
        let weights = ScoreWeights {
            known_context: 0,
            unknown_open: 7,
            ..ScoreWeights::default()
        };
        assert_eq!(score_match(&g, &tpl, &mapping, &weights), 7);
    }
}
