//! The quantity vocabulary: what kinds of values a problem graph may hold.
//!
//! [`QuantityKind`] is a closed tagged vocabulary rather than an open string
//! set: every kind belongs to a known [`QuantityFamily`], and the measure
//! families (`length`, `interval`, ...) additionally admit a numeric index so
//! that multi-segment problems can distinguish `length1` from `length2`
//! without widening the vocabulary at runtime.
//!
//! String forms (used by template files and problem files) are the family
//! name in snake_case with an optional trailing index: `length`, `length2`,
//! `tree_count`. Unknown names and indexes on non-indexable families are
//! schema violations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The closed set of quantity families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityFamily {
    /// A measured length or distance.
    Length,
    /// The spacing between adjacent plantings.
    Interval,
    Width,
    Height,
    /// A travel speed.
    Speed,
    Time,
    /// A work rate (work units per time unit).
    Rate,
    /// A total amount of work.
    Work,
    /// A count of planted trees.
    TreeCount,
    /// A count of segments between plantings.
    SegmentCount,
    /// The difference between two counts.
    CountDiff,
}

impl QuantityFamily {
    /// All families, in declaration order.
    pub const ALL: [QuantityFamily; 11] = [
        QuantityFamily::Length,
        QuantityFamily::Interval,
        QuantityFamily::Width,
        QuantityFamily::Height,
        QuantityFamily::Speed,
        QuantityFamily::Time,
        QuantityFamily::Rate,
        QuantityFamily::Work,
        QuantityFamily::TreeCount,
        QuantityFamily::SegmentCount,
        QuantityFamily::CountDiff,
    ];

    /// The canonical snake_case name.
    pub fn name(&self) -> &'static str {
        match self {
            QuantityFamily::Length => "length",
            QuantityFamily::Interval => "interval",
            QuantityFamily::Width => "width",
            QuantityFamily::Height => "height",
            QuantityFamily::Speed => "speed",
            QuantityFamily::Time => "time",
            QuantityFamily::Rate => "rate",
            QuantityFamily::Work => "work",
            QuantityFamily::TreeCount => "tree_count",
            QuantityFamily::SegmentCount => "segment_count",
            QuantityFamily::CountDiff => "count_diff",
        }
    }

    /// Whether members of this family may carry a numeric index
    /// (`length1`, `interval2`, ...).
    pub fn is_indexable(&self) -> bool {
        matches!(
            self,
            QuantityFamily::Length
                | QuantityFamily::Interval
                | QuantityFamily::Width
                | QuantityFamily::Height
                | QuantityFamily::Rate
        )
    }

    /// Whether this family denotes a whole-number cardinality. Solved values
    /// of count kinds are rounded to integers during post-processing.
    pub fn is_count(&self) -> bool {
        matches!(
            self,
            QuantityFamily::TreeCount | QuantityFamily::SegmentCount | QuantityFamily::CountDiff
        )
    }
}

impl fmt::Display for QuantityFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A concrete quantity kind: a family plus an optional index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct QuantityKind {
    pub family: QuantityFamily,
    /// `Some(n)` only for indexable families; `None` is the plain kind.
    pub index: Option<u32>,
}

impl QuantityKind {
    /// The plain (unindexed) kind of a family.
    pub fn of(family: QuantityFamily) -> Self {
        QuantityKind {
            family,
            index: None,
        }
    }

    /// An indexed member of a family. Callers must only use indexable
    /// families; [`FromStr`] enforces this at the string boundary.
    pub fn indexed(family: QuantityFamily, index: u32) -> Self {
        QuantityKind {
            family,
            index: Some(index),
        }
    }

    /// Shortcut for the count predicate on the underlying family.
    pub fn is_count(&self) -> bool {
        self.family.is_count()
    }
}

impl From<QuantityFamily> for QuantityKind {
    fn from(family: QuantityFamily) -> Self {
        QuantityKind::of(family)
    }
}

impl fmt::Display for QuantityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(n) => write!(f, "{}{}", self.family.name(), n),
            None => f.write_str(self.family.name()),
        }
    }
}

impl FromStr for QuantityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .rfind(|c: char| !c.is_ascii_digit())
            .map(|i| i + 1)
            .unwrap_or(0);
        let (base, digits) = trimmed.split_at(split);

        let family = QuantityFamily::ALL
            .iter()
            .copied()
            .find(|f| f.name() == base)
            .ok_or_else(|| CoreError::UnknownKind {
                name: trimmed.to_string(),
            })?;

        if digits.is_empty() {
            return Ok(QuantityKind::of(family));
        }
        if !family.is_indexable() {
            return Err(CoreError::UnknownKind {
                name: trimmed.to_string(),
            });
        }
        let index: u32 = digits.parse().map_err(|_| CoreError::UnknownKind {
            name: trimmed.to_string(),
        })?;
        Ok(QuantityKind::indexed(family, index))
    }
}

// Serde bridges: kinds travel as their string form so they can key JSON maps.

impl From<QuantityKind> for String {
    fn from(kind: QuantityKind) -> String {
        kind.to_string()
    }
}

impl TryFrom<String> for QuantityKind {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_kinds() {
        let k: QuantityKind = "length".parse().unwrap();
        assert_eq!(k, QuantityKind::of(QuantityFamily::Length));
        let k: QuantityKind = "tree_count".parse().unwrap();
        assert_eq!(k.family, QuantityFamily::TreeCount);
        assert!(k.is_count());
    }

    #[test]
    fn parse_indexed_kinds() {
        let k: QuantityKind = "length2".parse().unwrap();
        assert_eq!(k, QuantityKind::indexed(QuantityFamily::Length, 2));
        let k: QuantityKind = "interval1".parse().unwrap();
        assert_eq!(k.family, QuantityFamily::Interval);
        assert_eq!(k.index, Some(1));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!("velocity".parse::<QuantityKind>().is_err());
        assert!("".parse::<QuantityKind>().is_err());
    }

    #[test]
    fn index_on_non_indexable_family_is_rejected() {
        assert!("tree_count2".parse::<QuantityKind>().is_err());
        assert!("time1".parse::<QuantityKind>().is_err());
    }

    #[test]
    fn display_roundtrips_through_parse() {
        for s in ["length", "length3", "segment_count", "rate2"] {
            let k: QuantityKind = s.parse().unwrap();
            assert_eq!(k.to_string(), s);
            assert_eq!(s.parse::<QuantityKind>().unwrap(), k);
        }
    }

    #[test]
    fn serde_uses_string_form() {
        let k = QuantityKind::indexed(QuantityFamily::Interval, 2);
        let json = serde_json::to_string(&k).unwrap();
        assert_eq!(json, "\"interval2\"");
        let back: QuantityKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, k);
    }

    #[test]
    fn count_predicate_covers_count_families() {
        assert!(QuantityFamily::TreeCount.is_count());
        assert!(QuantityFamily::SegmentCount.is_count());
        assert!(QuantityFamily::CountDiff.is_count());
        assert!(!QuantityFamily::Length.is_count());
        assert!(!QuantityFamily::Speed.is_count());
    }
}
