//! Arithmetic word-problem solver CLI.
//!
//! Provides the `quantgraph` binary with subcommands for solving a single
//! problem file, batch-running a dataset with expected answers, and listing
//! the loaded template library.
//!
//! Problem files carry the serialized problem graph (the output contract of
//! upstream extraction); templates come from the built-in set or from a
//! `--templates` directory of JSON files.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use quantgraph_cli::problem::{build_graph, ProblemSpec};
use quantgraph_cli::render;
use quantgraph_core::graph::ProblemGraph;
use quantgraph_core::library::TemplateLibrary;
use quantgraph_core::value::Number;
use quantgraph_engine::{solve_report, Matcher};
use quantgraph_store::{builtin_library, load_library, DirSource};

/// Graph-template solver for arithmetic word problems.
#[derive(Parser)]
#[command(name = "quantgraph", about = "Graph-template solver for arithmetic word problems")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Solve a single problem file.
    Solve {
        /// Path to the problem JSON file.
        #[arg(short, long)]
        problem: PathBuf,

        /// Template directory (default: the built-in set).
        #[arg(short, long)]
        templates: Option<PathBuf>,

        /// Print formulas, instantiated equations, and the node mapping.
        #[arg(long)]
        explain: bool,

        /// Emit a diagram of the matched graph to stdout.
        #[arg(long, value_enum)]
        export: Option<ExportFormat>,
    },

    /// Run a dataset of problems with expected answers.
    Batch {
        /// Path to the dataset JSON file.
        #[arg(short, long)]
        dataset: PathBuf,

        /// Template directory (default: the built-in set).
        #[arg(short, long)]
        templates: Option<PathBuf>,
    },

    /// List the loaded templates.
    Templates {
        /// Template directory (default: the built-in set).
        #[arg(short, long)]
        templates: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Mermaid,
    Dot,
}

/// One dataset entry: a problem plus an optional expected answer.
#[derive(Deserialize)]
struct DatasetItem {
    problem: ProblemSpec,
    #[serde(default)]
    answer: Option<Number>,
    #[serde(default)]
    note: Option<String>,
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    // Exit codes: 0 = ran (unsolved problems are outcomes, not errors),
    // 1 = bad input file, 2 = template library failure.
    let exit_code = match cli.command {
        Commands::Solve {
            problem,
            templates,
            explain,
            export,
        } => run_solve(&problem, templates.as_deref(), explain, export),
        Commands::Batch { dataset, templates } => run_batch(&dataset, templates.as_deref()),
        Commands::Templates { templates } => run_templates(templates.as_deref()),
    };
    process::exit(exit_code);
}

fn load_templates(dir: Option<&std::path::Path>) -> Result<TemplateLibrary, i32> {
    let loaded = match dir {
        Some(dir) => load_library(&DirSource::new(dir)),
        None => builtin_library(),
    };
    match loaded {
        Ok(library) => {
            tracing::info!(templates = library.len(), "template library loaded");
            Ok(library)
        }
        Err(e) => {
            eprintln!("Error: failed to load templates: {}", e);
            Err(2)
        }
    }
}

fn read_problem(path: &std::path::Path) -> Result<ProblemGraph, i32> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: failed to read '{}': {}", path.display(), e);
        1
    })?;
    let spec: ProblemSpec = serde_json::from_str(&text).map_err(|e| {
        eprintln!("Error: failed to parse '{}': {}", path.display(), e);
        1
    })?;
    build_graph(&spec).map_err(|e| {
        eprintln!("Error: invalid problem '{}': {}", path.display(), e);
        1
    })
}

fn run_solve(
    problem: &std::path::Path,
    templates: Option<&std::path::Path>,
    explain: bool,
    export: Option<ExportFormat>,
) -> i32 {
    let library = match load_templates(templates) {
        Ok(lib) => lib,
        Err(code) => return code,
    };
    let graph = match read_problem(problem) {
        Ok(graph) => graph,
        Err(code) => return code,
    };

    let matcher = Matcher::new(&library);
    let matched = match matcher.best_match(&graph) {
        Some(m) => m,
        None => {
            println!(
                "no template matches (topic={}, mode={})",
                graph.meta.topic.map_or("?".into(), |t| t.to_string()),
                graph.meta.mode.as_deref().unwrap_or("?"),
            );
            if let Some(format) = export {
                print_diagram(format, &graph, None, None);
            }
            return 0;
        }
    };

    let report = solve_report(matched.template, &matched.mapping, &graph);
    if report.values.is_empty() {
        println!(
            "matched template '{}' but the equation system is unsolved",
            matched.template.id
        );
    } else {
        println!("template: {}", matched.template.id);
        for (symbol, value) in &report.values {
            let kind = matched
                .mapping
                .get(symbol)
                .and_then(|id| graph.node(id))
                .map(|n| n.kind.to_string());
            match kind {
                Some(kind) => println!("{} ({}) = {}", symbol, kind, value),
                None => println!("{} = {}", symbol, value),
            }
        }
    }

    if explain {
        println!();
        println!("formulas:     {}", matched.template.formulas.join(" ; "));
        println!("instantiated: {}", report.instantiated.join(" ; "));
        let mapping: Vec<String> = matched
            .mapping
            .iter()
            .map(|(sym, id)| format!("{}->n{}", sym, id))
            .collect();
        println!("mapping:      {}", mapping.join(", "));
        println!("score:        {}", matched.score);
    }

    if let Some(format) = export {
        print_diagram(format, &graph, Some(&matched.mapping), Some(&report.values));
    }
    0
}

fn print_diagram(
    format: ExportFormat,
    graph: &ProblemGraph,
    mapping: Option<&quantgraph_core::Mapping>,
    solved: Option<&BTreeMap<String, Number>>,
) {
    let text = match format {
        ExportFormat::Mermaid => render::to_mermaid(graph, mapping, solved),
        ExportFormat::Dot => render::to_dot(graph, mapping, solved),
    };
    println!();
    print!("{}", text);
}

fn run_batch(dataset: &std::path::Path, templates: Option<&std::path::Path>) -> i32 {
    let library = match load_templates(templates) {
        Ok(lib) => lib,
        Err(code) => return code,
    };
    let text = match std::fs::read_to_string(dataset) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: failed to read '{}': {}", dataset.display(), e);
            return 1;
        }
    };
    let items: Vec<DatasetItem> = match serde_json::from_str(&text) {
        Ok(items) => items,
        Err(e) => {
            eprintln!("Error: failed to parse '{}': {}", dataset.display(), e);
            return 1;
        }
    };

    let matcher = Matcher::new(&library);
    let total = items.len();
    let mut solved_count = 0usize;
    let mut correct = 0usize;
    let mut expected = 0usize;

    for (index, item) in items.into_iter().enumerate() {
        let label = item
            .note
            .unwrap_or_else(|| format!("#{}", index + 1));
        let graph = match build_graph(&item.problem) {
            Ok(graph) => graph,
            Err(e) => {
                println!("{}: invalid problem: {}", label, e);
                continue;
            }
        };
        let Some(matched) = matcher.best_match(&graph) else {
            println!("{}: no template matches", label);
            continue;
        };
        let values = quantgraph_engine::solve(matched.template, &matched.mapping, &graph);
        if values.is_empty() {
            println!("{}: matched '{}' but unsolved", label, matched.template.id);
            continue;
        }
        solved_count += 1;
        let answer = primary_answer(&graph, &matched.mapping, &values);
        match (item.answer, answer) {
            (Some(want), Some(got)) => {
                expected += 1;
                if want == got {
                    correct += 1;
                    println!("{}: {} (correct)", label, got);
                } else {
                    println!("{}: {} (expected {})", label, got, want);
                }
            }
            (_, Some(got)) => println!("{}: {}", label, got),
            _ => println!("{}: solved {:?}", label, values),
        }
    }

    println!();
    println!(
        "solved {}/{}; {}/{} expected answers correct",
        solved_count, total, correct, expected
    );
    0
}

/// The value reported as "the" answer: the one mapped to the target kind
/// when a target is declared, otherwise the first solved value.
fn primary_answer(
    graph: &ProblemGraph,
    mapping: &quantgraph_core::Mapping,
    values: &BTreeMap<String, Number>,
) -> Option<Number> {
    if let Some(target) = graph.meta.target {
        for (symbol, value) in values {
            let kind = mapping.get(symbol).and_then(|id| graph.node(id)).map(|n| n.kind);
            if kind == Some(target) {
                return Some(*value);
            }
        }
    }
    values.values().next().copied()
}

fn run_templates(templates: Option<&std::path::Path>) -> i32 {
    let library = match load_templates(templates) {
        Ok(lib) => lib,
        Err(code) => return code,
    };
    for template in library.iter() {
        println!(
            "{:<28} {}/{} unknowns=[{}] nodes={} edges={}",
            template.id,
            template.topic,
            template.mode,
            template.unknowns.join(","),
            template.nodes.len(),
            template.edges.len(),
        );
    }
    println!();
    println!("{} templates", library.len());
    0
}
