//! Template store for quantgraph.
//!
//! Provides the [`TemplateSource`] trait defining the loading contract,
//! plus two first-class backends: [`DirSource`] (a directory of JSON files)
//! and [`BuiltinSource`] (the embedded standard set). Loading happens once
//! at process start; the resulting
//! [`TemplateLibrary`](quantgraph_core::TemplateLibrary) is immutable.
//!
//! # Modules
//!
//! - [`error`]: StoreError enum with all failure modes
//! - [`source`]: TemplateSource trait and the directory backend
//! - [`builtin`]: the embedded template set

pub mod builtin;
pub mod error;
pub mod source;

// Re-export key types for ergonomic use.
pub use builtin::{builtin_library, BuiltinSource};
pub use error::StoreError;
pub use source::{load_library, DirSource, TemplateSource};
