//! Store error types for quantgraph-store.
//!
//! [`StoreError`] covers all anticipated failure modes of template loading:
//! filesystem access, malformed JSON (naming the offending file), and
//! template compilation.

use std::path::PathBuf;

use thiserror::Error;

use quantgraph_core::template::TemplateError;

/// Errors produced while loading a template store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading a template file or directory failed.
    #[error("failed to read '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A template file is not valid JSON of the expected shape.
    #[error("failed to parse '{path}': {source}", path = path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An embedded template set is malformed. Indicates a packaging defect.
    #[error("built-in template set '{name}' is malformed: {source}")]
    Builtin {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A template record failed to compile.
    #[error(transparent)]
    Template(#[from] TemplateError),
}
