//! The quantgraph solving engine: template matching and equation solving.
//!
//! Given a [`ProblemGraph`](quantgraph_core::ProblemGraph) and a read-only
//! [`TemplateLibrary`](quantgraph_core::TemplateLibrary), the engine selects
//! the best-fitting template interpretation of the graph
//! ([`matcher`]) and solves the template's equation set for the unknown
//! quantities ([`solver`]).
//!
//! Both stages are pure with respect to the graph: matching and solving
//! borrow it immutably, so independent solves may run concurrently against
//! one shared library.

pub mod matcher;
pub mod solver;

pub use matcher::{Match, Matcher, ScoreWeights};
pub use solver::{solve, solve_report, SolveReport};
