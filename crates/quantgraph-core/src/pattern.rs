//! Problem topics and mode canonicalization.
//!
//! A problem's `(topic, mode)` pair selects which template family the matcher
//! searches. Topics form a closed enum; modes stay free-form strings because
//! upstream extraction refines them incrementally, but known synonyms are
//! collapsed to one canonical name before storage so that the template
//! library only needs to register the canonical spelling.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The known problem topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Planting problems: trees along paths, rings, rectangles.
    Tree,
    /// Travel problems: meeting and chasing.
    Trip,
    /// Work-rate problems.
    Work,
}

impl Topic {
    pub fn name(&self) -> &'static str {
        match self {
            Topic::Tree => "tree",
            Topic::Trip => "trip",
            Topic::Work => "work",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Topic {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "tree" => Ok(Topic::Tree),
            "trip" => Ok(Topic::Trip),
            "work" => Ok(Topic::Work),
            other => Err(CoreError::UnknownTopic {
                name: other.to_string(),
            }),
        }
    }
}

/// Collapses known mode synonyms to the canonical name the template library
/// registers. Unknown modes pass through unchanged.
pub fn canonical_mode(topic: Topic, mode: &str) -> String {
    let canonical = match (topic, mode) {
        (Topic::Tree, "loop_closed_distance") => "loop_closed",
        (Topic::Tree, "loop_closed_count") => "loop_closed",
        (Topic::Tree, "loop_closed_len") => "loop_closed",
        _ => mode,
    };
    canonical.to_string()
}
