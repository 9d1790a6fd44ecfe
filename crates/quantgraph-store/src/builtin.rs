//! The built-in template set, embedded at compile time.
//!
//! Ships the standard topics (tree planting, travel, work rate) so the
//! engine is usable without an external template directory. The JSON assets
//! live under `templates/` and use the same record shape as any
//! [`DirSource`](crate::DirSource) file.

use serde::Deserialize;

use quantgraph_core::library::TemplateLibrary;
use quantgraph_core::template::TemplateSpec;

use crate::error::StoreError;
use crate::source::{load_library, TemplateSource};

const SETS: [(&str, &str); 3] = [
    ("tree.json", include_str!("../templates/tree.json")),
    ("trip.json", include_str!("../templates/trip.json")),
    ("work.json", include_str!("../templates/work.json")),
];

/// The embedded template collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSource;

impl TemplateSource for BuiltinSource {
    fn load(&self) -> Result<Vec<TemplateSpec>, StoreError> {
        let mut specs = Vec::new();
        for (name, text) in SETS {
            #[derive(Deserialize)]
            #[serde(untagged)]
            enum OneOrMany {
                Many(Vec<TemplateSpec>),
                One(Box<TemplateSpec>),
            }
            let parsed: OneOrMany = serde_json::from_str(text)
                .map_err(|source| StoreError::Builtin { name, source })?;
            match parsed {
                OneOrMany::Many(batch) => specs.extend(batch),
                OneOrMany::One(spec) => specs.push(*spec),
            }
        }
        Ok(specs)
    }
}

/// Compiles the embedded template set into a ready-to-use library.
pub fn builtin_library() -> Result<TemplateLibrary, StoreError> {
    load_library(&BuiltinSource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quantgraph_core::pattern::Topic;

    #[test]
    fn builtin_set_compiles() {
        let library = builtin_library().unwrap();
        assert!(library.len() >= 10);
    }

    #[test]
    fn builtin_set_covers_the_standard_modes() {
        let library = builtin_library().unwrap();
        for (topic, mode) in [
            (Topic::Tree, "both_ends_quantity"),
            (Topic::Tree, "none_end_quantity"),
            (Topic::Tree, "one_end_quantity"),
            (Topic::Tree, "loop_closed"),
            (Topic::Tree, "both_ends_distance"),
            (Topic::Trip, "join"),
            (Topic::Trip, "chase"),
            (Topic::Work, "coop"),
        ] {
            assert!(
                library.candidates(topic, mode).count() > 0,
                "missing templates for ({}, {})",
                topic,
                mode
            );
        }
    }

    #[test]
    fn one_end_mode_offers_count_and_segment_readings() {
        let library = builtin_library().unwrap();
        let ids: Vec<_> = library
            .candidates(Topic::Tree, "one_end_quantity")
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["tree.one_end_quantity", "tree.one_end_segments"]);
    }
}
