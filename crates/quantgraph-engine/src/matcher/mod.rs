//! The template matcher.
//!
//! Finds all (template, mapping) pairs whose structural pattern embeds in a
//! problem graph, filters them by forbidden roles and guards, scores the
//! survivors, and returns the single best. `None` is the ordinary "no
//! template applies" outcome, never an error.
//!
//! # Determinism
//!
//! Repeated calls over the same graph and library return the identical
//! result. Candidates are visited in template-id order (guaranteed by the
//! library), variants full-before-reduced, and embeddings in enumeration
//! order; only a strictly greater score displaces the incumbent, so score
//! ties resolve to the earliest candidate in that ordering.

pub mod embed;
pub mod score;

pub use score::{score_match, ScoreWeights};

use std::collections::HashMap;

use quantgraph_core::graph::ProblemGraph;
use quantgraph_core::library::TemplateLibrary;
use quantgraph_core::mapping::Mapping;
use quantgraph_core::template::Template;

/// A scored match: the chosen template and its node mapping.
#[derive(Debug, Clone)]
pub struct Match<'t> {
    pub template: &'t Template,
    pub mapping: Mapping,
    pub score: i64,
}

/// Matches problem graphs against a fixed template library.
#[derive(Debug, Clone)]
pub struct Matcher<'lib> {
    library: &'lib TemplateLibrary,
    weights: ScoreWeights,
}

impl<'lib> Matcher<'lib> {
    pub fn new(library: &'lib TemplateLibrary) -> Self {
        Matcher {
            library,
            weights: ScoreWeights::default(),
        }
    }

    pub fn with_weights(library: &'lib TemplateLibrary, weights: ScoreWeights) -> Self {
        Matcher { library, weights }
    }

    /// Returns the best-scoring (template, mapping) pair, or `None` when no
    /// registered template embeds in the graph.
    pub fn best_match(&self, graph: &ProblemGraph) -> Option<Match<'lib>> {
        let topic = graph.meta.topic?;
        let mode = graph.meta.mode.as_deref()?;

        let mut best: Option<Match<'lib>> = None;
        let mut candidates = 0usize;
        let mut hits = 0usize;

        for template in self.library.candidates(topic, mode) {
            candidates += 1;

            // Hard veto, independent of structure: a forbidden (kind, role)
            // anywhere in the graph discards the template outright.
            if violates_forbid_roles(graph, template) {
                continue;
            }

            // The template itself, then -- when it declares optional edges --
            // the reduced variant without them.
            let variants: &[bool] = if template.has_optional_edges() {
                &[true, false]
            } else {
                &[true]
            };

            for &include_optional in variants {
                for mapping in embed::enumerate(graph, template, include_optional) {
                    if !guards_pass(graph, template, &mapping) {
                        continue;
                    }
                    hits += 1;
                    let score = score_match(graph, template, &mapping, &self.weights);
                    let replaces = best.as_ref().map_or(true, |b| score > b.score);
                    if replaces {
                        best = Some(Match {
                            template,
                            mapping,
                            score,
                        });
                    }
                }
            }
        }

        match &best {
            Some(m) => tracing::debug!(
                template = %m.template.id,
                score = m.score,
                candidates,
                hits,
                "matched template"
            ),
            None => tracing::debug!(candidates, hits, topic = %topic, mode, "no template matched"),
        }
        best
    }
}

/// Whether any `forbid_roles` entry of the template matches a `(kind, role)`
/// pair present anywhere in the graph.
fn violates_forbid_roles(graph: &ProblemGraph, template: &Template) -> bool {
    if template.forbid_roles.is_empty() {
        return false;
    }
    graph.nodes().any(|(_, node)| {
        template.forbid_roles.iter().any(|forbid| {
            node.kind == forbid.kind && node.role.as_deref() == Some(forbid.role.as_str())
        })
    })
}

/// Evaluates the template's guards against the mapped node values. A guard
/// over a missing or unset value is false, discarding the embedding.
fn guards_pass(graph: &ProblemGraph, template: &Template, mapping: &Mapping) -> bool {
    if template.guards.is_empty() {
        return true;
    }
    let mut env: HashMap<String, f64> = HashMap::new();
    for (symbol, node_id) in mapping.iter() {
        if let Some(value) = graph.node(node_id).and_then(|n| n.value) {
            env.insert(symbol.to_string(), value.as_f64());
        }
    }
    template.guards.iter().all(|guard| guard.eval(&env))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quantgraph_core::edge::RelationKind;
    use quantgraph_core::kind::QuantityFamily::*;
    use quantgraph_core::pattern::Topic;
    use quantgraph_core::template::TemplateSpec;
    use quantgraph_core::value::Number;

    fn library(specs: &[&str]) -> TemplateLibrary {
        let specs = specs
            .iter()
            .map(|s| serde_json::from_str::<TemplateSpec>(s).unwrap())
            .collect();
        TemplateLibrary::from_specs(specs).unwrap()
    }

    const BOTH_ENDS: &str = r#"{
        "id": "tree.both_ends_quantity", "topic": "tree", "mode": "both_ends_quantity",
        "nodes": [
            {"id": "L", "type": "length"},
            {"id": "I", "type": "interval"},
            {"id": "Z", "type": "tree_count"}
        ],
        "edges": [{"u": "L", "v": "I", "type": "divides"}],
        "formula": ["Z = L / I + 1"],
        "unknowns": ["Z"],
        "forbid_roles": [{"type": "tree_count", "role": "two_sides"}]
    }"#;

    const BOTH_ENDS_TWO_SIDES: &str = r#"{
        "id": "tree.both_ends_two_sides", "topic": "tree", "mode": "both_ends_quantity",
        "nodes": [
            {"id": "L", "type": "length"},
            {"id": "I", "type": "interval"},
            {"id": "Z", "type": "tree_count", "role": "two_sides"}
        ],
        "edges": [{"u": "L", "v": "I", "type": "divides"}],
        "formula": ["Z = (L / I + 1) * 2"],
        "unknowns": ["Z"]
    }"#;

    const CHASE: &str = r#"{
        "id": "trip.chase", "topic": "trip", "mode": "chase",
        "nodes": [
            {"id": "Vf", "type": "speed"},
            {"id": "Vs", "type": "speed"},
            {"id": "G", "type": "length", "role": "gap"},
            {"id": "T", "type": "time"}
        ],
        "edges": [],
        "formula": ["G = (Vf - Vs) * T"],
        "unknowns": ["T"],
        "guards": ["Vf>Vs"]
    }"#;

    fn both_ends_graph() -> ProblemGraph {
        let mut g = ProblemGraph::new();
        g.add_node(Length.into(), Some(Number::Int(120)));
        g.add_node(Interval.into(), Some(Number::Int(15)));
        g.add_node(TreeCount.into(), None);
        g.add_edge(Length, Interval, RelationKind::Divides, None)
            .unwrap();
        g.set_pattern(Topic::Tree, "both_ends_quantity", false);
        g.set_target(TreeCount.into());
        g
    }

    #[test]
    fn matches_the_registered_template() {
        let lib = library(&[BOTH_ENDS, BOTH_ENDS_TWO_SIDES]);
        let matcher = Matcher::new(&lib);
        let g = both_ends_graph();

        let m = matcher.best_match(&g).expect("match");
        assert_eq!(m.template.id, "tree.both_ends_quantity");
        assert_eq!(m.mapping.len(), 3);
    }

    #[test]
    fn no_registered_mode_returns_none() {
        let lib = library(&[BOTH_ENDS]);
        let matcher = Matcher::new(&lib);

        let mut g = both_ends_graph();
        g.set_pattern(Topic::Tree, "adjacent_share", false);
        assert!(matcher.best_match(&g).is_none());

        let empty = ProblemGraph::new();
        assert!(matcher.best_match(&empty).is_none());
    }

    #[test]
    fn forbidden_role_vetoes_even_a_structural_match() {
        let lib = library(&[BOTH_ENDS, BOTH_ENDS_TWO_SIDES]);
        let matcher = Matcher::new(&lib);

        let mut g = ProblemGraph::new();
        g.add_node(Length.into(), Some(Number::Int(100)));
        g.add_node(Interval.into(), Some(Number::Int(10)));
        g.add_node_full(TreeCount.into(), None, Some("two_sides"), Default::default());
        g.add_edge(Length, Interval, RelationKind::Divides, None)
            .unwrap();
        g.set_pattern(Topic::Tree, "both_ends_quantity", false);

        let m = matcher.best_match(&g).expect("match");
        // The plain template embeds structurally but is vetoed by the
        // two_sides role; only the two-sides template survives.
        assert_eq!(m.template.id, "tree.both_ends_two_sides");
    }

    #[test]
    fn guards_orient_same_kind_nodes() {
        let lib = library(&[CHASE]);
        let matcher = Matcher::new(&lib);

        let mut g = ProblemGraph::new();
        g.add_node(Speed.into(), Some(Number::Int(6)));
        g.add_node(Speed.into(), Some(Number::Int(8)));
        g.add_node_full(
            Length.into(),
            Some(Number::Int(10)),
            Some("gap"),
            Default::default(),
        );
        g.add_node(Time.into(), None);
        g.set_pattern(Topic::Trip, "chase", false);

        let m = matcher.best_match(&g).expect("match");
        // Only the Vf=8, Vs=6 orientation passes the Vf>Vs guard.
        assert_eq!(
            g.node(m.mapping.get("Vf").unwrap()).unwrap().value,
            Some(Number::Int(8))
        );
        assert_eq!(
            g.node(m.mapping.get("Vs").unwrap()).unwrap().value,
            Some(Number::Int(6))
        );
    }

    #[test]
    fn guard_over_unset_value_discards_the_embedding() {
        let lib = library(&[CHASE]);
        let matcher = Matcher::new(&lib);

        let mut g = ProblemGraph::new();
        g.add_node(Speed.into(), Some(Number::Int(8)));
        g.add_node(Speed.into(), None);
        g.add_node_full(
            Length.into(),
            Some(Number::Int(10)),
            Some("gap"),
            Default::default(),
        );
        g.add_node(Time.into(), None);
        g.set_pattern(Topic::Trip, "chase", false);

        // Either orientation needs both speeds valued for the guard.
        assert!(matcher.best_match(&g).is_none());
    }

    #[test]
    fn optional_edge_template_matches_without_the_edge() {
        let loop_closed = r#"{
            "id": "tree.loop_closed", "topic": "tree", "mode": "loop_closed",
            "nodes": [
                {"id": "L", "type": "length"},
                {"id": "I", "type": "interval"},
                {"id": "Z", "type": "tree_count"}
            ],
            "edges": [{"u": "L", "v": "I", "type": "divides", "optional": true}],
            "formula": ["Z = L / I"],
            "unknowns": ["Z"]
        }"#;
        let lib = library(&[loop_closed]);
        let matcher = Matcher::new(&lib);

        let mut g = ProblemGraph::new();
        g.add_node(Length.into(), Some(Number::Int(60)));
        g.add_node(Interval.into(), Some(Number::Int(5)));
        g.add_node(TreeCount.into(), None);
        g.set_pattern(Topic::Tree, "loop_closed", false);

        let m = matcher.best_match(&g).expect("reduced variant");
        assert_eq!(m.template.id, "tree.loop_closed");
    }

    #[test]
    fn repeated_matching_is_deterministic() {
        let lib = library(&[BOTH_ENDS, BOTH_ENDS_TWO_SIDES, CHASE]);
        let matcher = Matcher::new(&lib);
        let g = both_ends_graph();

        let first = matcher.best_match(&g).expect("match");
        for _ in 0..20 {
            let again = matcher.best_match(&g).expect("match");
            assert_eq!(again.template.id, first.template.id);
            assert_eq!(again.mapping, first.mapping);
            assert_eq!(again.score, first.score);
        }
    }

    #[test]
    fn ties_break_by_template_id() {
        // Two structurally identical templates; the lexicographically first
        // id must win regardless of library load order.
        let a = r#"{
            "id": "tree.alpha", "topic": "tree", "mode": "linear",
            "nodes": [{"id": "L", "type": "length"}],
            "formula": ["L = 1"], "unknowns": ["L"]
        }"#;
        let b = r#"{
            "id": "tree.beta", "topic": "tree", "mode": "linear",
            "nodes": [{"id": "L", "type": "length"}],
            "formula": ["L = 1"], "unknowns": ["L"]
        }"#;

        let mut g = ProblemGraph::new();
        g.add_node(Length.into(), None);
        g.set_pattern(Topic::Tree, "linear", false);

        for specs in [&[a, b][..], &[b, a][..]] {
            let lib = library(specs);
            let matcher = Matcher::new(&lib);
            let m = matcher.best_match(&g).expect("match");
            assert_eq!(m.template.id, "tree.alpha");
        }
    }
}
