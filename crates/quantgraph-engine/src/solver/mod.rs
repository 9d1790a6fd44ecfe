//! The equation solver: from a chosen (template, mapping) to numeric values.
//!
//! # Pipeline
//!
//! 1. Collect known substitutions from the mapped graph nodes, collapsing
//!    integral floats to exact integers first.
//! 2. Determine the unknown symbols from the graph's actual known/unknown
//!    state -- the template's declared `unknowns` are a supplement, never
//!    the authority.
//! 3. Substitute the knowns into the pre-parsed equations and solve by
//!    propagation: any equation reduced to a single free symbol is solved
//!    and its result substituted into the rest, until nothing changes.
//! 4. A single-equation system that resisted propagation is retried symbol
//!    by symbol (determined unknowns first, then the equation's free
//!    symbols), accepting the first success.
//! 5. Post-process each solved value by the kind of the graph node it maps
//!    to: count kinds are rounded to whole numbers via an exact-rational
//!    detour, everything else is returned as solved.
//!
//! "No solution" is an ordinary outcome: [`solve`] returns an empty map and
//! never panics or errors for it.

mod algebra;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use quantgraph_core::formula::Equation;
use quantgraph_core::graph::ProblemGraph;
use quantgraph_core::mapping::Mapping;
use quantgraph_core::template::Template;
use quantgraph_core::value::Number;

/// The result map plus explanation material.
#[derive(Debug, Clone, Default)]
pub struct SolveReport {
    /// Solved values keyed by template node id. Empty when unsolvable.
    pub values: BTreeMap<String, Number>,
    /// The equations after substituting all known values.
    pub instantiated: Vec<String>,
    /// The unknown symbols the solver targeted, in stable order.
    pub unknowns: Vec<String>,
}

/// Solves the template's equation set for the unknown quantities.
///
/// Returns an empty map when the system has no (numeric) solution.
pub fn solve(
    template: &Template,
    mapping: &Mapping,
    graph: &ProblemGraph,
) -> BTreeMap<String, Number> {
    solve_report(template, mapping, graph).values
}

/// Like [`solve`], additionally exposing the instantiated equations and the
/// targeted unknowns for explanation output.
pub fn solve_report(template: &Template, mapping: &Mapping, graph: &ProblemGraph) -> SolveReport {
    // Known substitutions from mapped node values. Integral floats collapse
    // to integers so they do not smear through the equations.
    let mut knowns: HashMap<String, Number> = HashMap::new();
    for (symbol, node_id) in mapping.iter() {
        if let Some(value) = graph.node(node_id).and_then(|n| n.value) {
            knowns.insert(symbol.to_string(), value.coerced());
        }
    }

    let equations: Vec<Equation> = template
        .equations
        .iter()
        .map(|eq| eq.substituted(&knowns))
        .collect();
    let instantiated: Vec<String> = equations.iter().map(|eq| eq.to_string()).collect();
    tracing::debug!(
        template = %template.id,
        instantiated = ?instantiated,
        "instantiated equations"
    );

    // The graph's known/unknown state is ground truth: every mapped node
    // without a value is an unknown. Declared unknowns join only while
    // still unresolved.
    let mut unknown_ids: BTreeSet<String> = BTreeSet::new();
    for (symbol, node_id) in mapping.iter() {
        if graph.node(node_id).map_or(false, |n| n.value.is_none()) {
            unknown_ids.insert(symbol.to_string());
        }
    }
    for declared in &template.unknowns {
        if let Some(node_id) = mapping.get(declared) {
            if graph.node(node_id).map_or(false, |n| n.value.is_none()) {
                unknown_ids.insert(declared.clone());
            }
        }
    }

    let mut values: BTreeMap<String, Number> = BTreeMap::new();

    if !unknown_ids.is_empty() {
        let resolved = propagate(&equations);
        if unknown_ids.iter().all(|u| resolved.contains_key(u)) {
            for unknown in &unknown_ids {
                values.insert(unknown.clone(), resolved[unknown]);
            }
        }
    }

    // Single-equation fallback: try candidate symbols one by one.
    if values.is_empty() && equations.len() == 1 {
        let candidates: Vec<String> = if unknown_ids.is_empty() {
            equations[0].free_symbols().into_iter().collect()
        } else {
            unknown_ids.iter().cloned().collect()
        };
        for symbol in candidates {
            if let Some(value) = algebra::solve_for(&equations[0], &symbol) {
                values.insert(symbol, value);
                break;
            }
        }
    }

    if values.is_empty() {
        tracing::debug!(template = %template.id, "equation system unsolved");
        return SolveReport {
            values,
            instantiated,
            unknowns: unknown_ids.into_iter().collect(),
        };
    }

    // Type-aware post-processing, keyed by the kind of the mapped graph node.
    let values = values
        .into_iter()
        .map(|(symbol, value)| {
            let is_count = mapping
                .get(&symbol)
                .and_then(|id| graph.node(id))
                .map_or(false, |node| node.kind.is_count());
            let value = if is_count {
                round_count(value)
            } else {
                value.coerced()
            };
            (symbol, value)
        })
        .collect();

    SolveReport {
        values,
        instantiated,
        unknowns: unknown_ids.into_iter().collect(),
    }
}

/// Propagation solving: repeatedly pick an equation with exactly one free
/// symbol, solve it, and substitute the result everywhere.
fn propagate(equations: &[Equation]) -> HashMap<String, Number> {
    let mut resolved: HashMap<String, Number> = HashMap::new();
    loop {
        let mut progress = false;
        for equation in equations {
            let bound = equation.substituted(&resolved);
            let free = bound.free_symbols();
            if free.len() != 1 {
                continue;
            }
            let symbol = free.into_iter().next().unwrap_or_default();
            if resolved.contains_key(&symbol) {
                continue;
            }
            if let Some(value) = algebra::solve_for(&bound, &symbol) {
                resolved.insert(symbol, value);
                progress = true;
            }
        }
        if !progress {
            return resolved;
        }
    }
}

/// Rounds a count value to a whole number. A nearby exact rational is
/// preferred over a raw float round; a non-finite value is returned raw.
fn round_count(value: Number) -> Number {
    match value {
        Number::Int(_) => value,
        Number::Float(f) if f.is_finite() => {
            let rounded = match nearest_rational(f) {
                Some((num, den)) => (num as f64 / den as f64).round() as i64,
                None => f.round() as i64,
            };
            Number::Int(rounded)
        }
        Number::Float(_) => value,
    }
}

/// Continued-fraction approximation of `f` with a bounded denominator.
/// Returns `None` when the value has no small-denominator neighbor.
fn nearest_rational(f: f64) -> Option<(i64, i64)> {
    const MAX_DENOMINATOR: i64 = 1_000_000;
    const TOLERANCE: f64 = 1e-9;

    if f.abs() > i64::MAX as f64 / 2.0 {
        return None;
    }

    let (mut h_prev, mut h) = (1i64, f.trunc() as i64);
    let (mut k_prev, mut k) = (0i64, 1i64);
    let mut rest = f - f.trunc();

    for _ in 0..64 {
        if (f - h as f64 / k as f64).abs() <= TOLERANCE * f.abs().max(1.0) {
            return Some((h, k));
        }
        if rest.abs() < f64::EPSILON {
            break;
        }
        let recip = 1.0 / rest;
        let a = recip.trunc() as i64;
        rest = recip - recip.trunc();

        let h_next = a.checked_mul(h)?.checked_add(h_prev)?;
        let k_next = a.checked_mul(k)?.checked_add(k_prev)?;
        if k_next > MAX_DENOMINATOR {
            break;
        }
        (h_prev, h) = (h, h_next);
        (k_prev, k) = (k, k_next);
    }

    ((f - h as f64 / k as f64).abs() <= TOLERANCE * f.abs().max(1.0)).then_some((h, k))
}
