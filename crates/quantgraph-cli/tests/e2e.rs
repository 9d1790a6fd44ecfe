//! End-to-end: problem file -> graph -> match -> solve, over the built-in
//! template library.

use std::collections::BTreeMap;

use quantgraph_cli::problem::{build_graph, ProblemSpec};
use quantgraph_core::value::Number;
use quantgraph_engine::{solve, Matcher};
use quantgraph_store::builtin_library;

/// Runs the full pipeline on a problem JSON string. `None` means no
/// template matched.
fn run(json: &str) -> Option<(String, BTreeMap<String, Number>)> {
    let library = builtin_library().expect("built-in templates");
    let spec: ProblemSpec = serde_json::from_str(json).expect("problem json");
    let graph = build_graph(&spec).expect("problem graph");

    let matcher = Matcher::new(&library);
    let matched = matcher.best_match(&graph)?;
    let values = solve(matched.template, &matched.mapping, &graph);
    Some((matched.template.id.clone(), values))
}

#[test]
fn both_ends_path_plants_nine_trees() {
    let (template, values) = run(include_str!("data/both_ends.json")).expect("match");
    assert_eq!(template, "tree.both_ends_quantity");
    assert_eq!(values["Z"], Number::Int(9));
}

#[test]
fn open_ended_path_plants_five_trees() {
    let (template, values) = run(include_str!("data/none_end.json")).expect("match");
    assert_eq!(template, "tree.none_end_quantity");
    assert_eq!(values["Z"], Number::Int(5));
}

#[test]
fn one_end_path_has_ten_segments() {
    let (template, values) = run(include_str!("data/one_end_segments.json")).expect("match");
    assert_eq!(template, "tree.one_end_segments");
    assert_eq!(values["N"], Number::Int(10));
}

#[test]
fn chase_takes_two_and_a_half_hours() {
    let (template, values) = run(include_str!("data/chase.json")).expect("match");
    assert_eq!(template, "trip.chase");
    assert_eq!(values["T"], Number::Float(2.5));
}

#[test]
fn two_sides_role_selects_the_doubled_template() {
    let (template, values) = run(r#"{
        "topic": "tree",
        "mode": "both_ends_quantity",
        "target": "tree_count",
        "nodes": [
            {"type": "length", "value": 100},
            {"type": "interval", "value": 10},
            {"type": "tree_count", "role": "two_sides"}
        ]
    }"#)
    .expect("match");
    assert_eq!(template, "tree.both_ends_two_sides");
    assert_eq!(values["Z"], Number::Int(22));
}

#[test]
fn loop_length_is_solved_from_count_and_interval() {
    // The loop template declares the count unknown; this graph knows the
    // count and asks for the length instead.
    let (template, values) = run(r#"{
        "topic": "tree",
        "mode": "loop_closed",
        "target": "length",
        "nodes": [
            {"type": "tree_count", "value": 12},
            {"type": "interval", "value": 5},
            {"type": "length"}
        ]
    }"#)
    .expect("match");
    assert_eq!(template, "tree.loop_closed");
    assert_eq!(values["L"], Number::Int(60));
}

#[test]
fn interval_comparison_reports_the_count_difference() {
    let (template, values) = run(r#"{
        "topic": "tree",
        "mode": "both_ends_compare",
        "target": "count_diff",
        "nodes": [
            {"type": "length", "value": 60},
            {"type": "interval1", "value": 5},
            {"type": "interval2", "value": 6},
            {"type": "count_diff"}
        ],
        "edges": [
            {"u": "length", "v": "interval1", "type": "divides"},
            {"u": "length", "v": "interval2", "type": "divides"}
        ]
    }"#)
    .expect("match");
    assert_eq!(template, "tree.both_ends_compare");
    // 13 trees at 5m spacing vs 11 at 6m.
    assert_eq!(values["D"], Number::Int(2));
}

#[test]
fn unregistered_mode_reports_no_match_without_panicking() {
    assert!(run(r#"{
        "topic": "tree",
        "mode": "rectangle_closed",
        "nodes": [
            {"type": "length", "value": 40},
            {"type": "interval", "value": 5},
            {"type": "tree_count"}
        ]
    }"#)
    .is_none());
}

#[test]
fn dataset_items_reproduce_their_expected_answers() {
    #[derive(serde::Deserialize)]
    struct Item {
        problem: ProblemSpec,
        #[serde(default)]
        answer: Option<Number>,
    }

    let items: Vec<Item> =
        serde_json::from_str(include_str!("data/dataset.json")).expect("dataset");
    let library = builtin_library().expect("built-in templates");
    let matcher = Matcher::new(&library);

    let mut checked = 0;
    for item in items {
        let graph = build_graph(&item.problem).expect("problem graph");
        let matched = matcher.best_match(&graph);
        match item.answer {
            Some(want) => {
                let matched = matched.expect("expected-answer items must match");
                let values = solve(matched.template, &matched.mapping, &graph);
                assert!(
                    values.values().any(|got| *got == want),
                    "expected {} in {:?}",
                    want,
                    values
                );
                checked += 1;
            }
            None => assert!(matched.is_none(), "unmatched item found a template"),
        }
    }
    assert_eq!(checked, 3);
}

#[test]
fn repeated_runs_are_deterministic_end_to_end() {
    let first = run(include_str!("data/both_ends.json"));
    for _ in 0..5 {
        assert_eq!(run(include_str!("data/both_ends.json")), first);
    }
}
