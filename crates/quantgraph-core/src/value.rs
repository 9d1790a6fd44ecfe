//! Numeric values carried by quantity nodes and equation results.
//!
//! [`Number`] keeps integers and floats as distinct variants so that exact
//! integer arithmetic survives equation solving wherever possible, while
//! still admitting fractional intermediate results. Equality is numeric,
//! not structural: `Int(5) == Float(5.0)`.

use std::fmt;
use std::ops::Neg;

use serde::{Deserialize, Serialize};

/// A quantity value: an exact integer or a float.
///
/// Serialized untagged, so `5` parses as `Int(5)` and `5.5` as `Float(5.5)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Returns the value as `f64`.
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(v) => *v as f64,
            Number::Float(v) => *v,
        }
    }

    /// Collapses a mathematically integral float down to `Int` (20.0 -> 20).
    ///
    /// Integral floats outside the `i64` range are left untouched.
    pub fn coerced(self) -> Number {
        match self {
            Number::Float(v)
                if v.is_finite() && v.fract() == 0.0 && v.abs() <= i64::MAX as f64 =>
            {
                Number::Int(v as i64)
            }
            other => other,
        }
    }

    /// Returns `true` for the `Int` variant.
    pub fn is_int(&self) -> bool {
        matches!(self, Number::Int(_))
    }

    pub fn add(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => match a.checked_add(b) {
                Some(v) => Number::Int(v),
                None => Number::Float(a as f64 + b as f64),
            },
            (a, b) => Number::Float(a.as_f64() + b.as_f64()),
        }
    }

    pub fn sub(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => match a.checked_sub(b) {
                Some(v) => Number::Int(v),
                None => Number::Float(a as f64 - b as f64),
            },
            (a, b) => Number::Float(a.as_f64() - b.as_f64()),
        }
    }

    pub fn mul(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => match a.checked_mul(b) {
                Some(v) => Number::Int(v),
                None => Number::Float(a as f64 * b as f64),
            },
            (a, b) => Number::Float(a.as_f64() * b.as_f64()),
        }
    }

    /// Division. Exact integer division stays `Int`; anything else is
    /// `Float`. Returns `None` on division by zero.
    pub fn div(self, rhs: Number) -> Option<Number> {
        match (self, rhs) {
            (_, b) if b.as_f64() == 0.0 => None,
            (Number::Int(a), Number::Int(b)) if a % b == 0 => Some(Number::Int(a / b)),
            (a, b) => Some(Number::Float(a.as_f64() / b.as_f64())),
        }
    }
}

impl Neg for Number {
    type Output = Number;

    fn neg(self) -> Number {
        match self {
            Number::Int(v) => match v.checked_neg() {
                Some(n) => Number::Int(n),
                None => Number::Float(-(v as f64)),
            },
            Number::Float(v) => Number::Float(-v),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number::Int(v)
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Float(v)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{}", v),
            Number::Float(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_equality_across_variants() {
        assert_eq!(Number::Int(5), Number::Float(5.0));
        assert_ne!(Number::Int(5), Number::Float(5.5));
        assert_eq!(Number::Float(2.5), Number::Float(2.5));
    }

    #[test]
    fn coerced_collapses_integral_floats() {
        assert!(Number::Float(20.0).coerced().is_int());
        assert_eq!(Number::Float(20.0).coerced(), Number::Int(20));
        assert!(!Number::Float(20.5).coerced().is_int());
        assert!(Number::Int(3).coerced().is_int());
    }

    #[test]
    fn exact_integer_division_stays_int() {
        assert_eq!(Number::Int(120).div(Number::Int(15)), Some(Number::Int(8)));
        assert_eq!(
            Number::Int(7).div(Number::Int(2)),
            Some(Number::Float(3.5))
        );
        assert_eq!(Number::Int(1).div(Number::Int(0)), None);
    }

    #[test]
    fn arithmetic_preserves_int_when_exact() {
        let a = Number::Int(6);
        let b = Number::Int(4);
        assert_eq!(a.add(b), Number::Int(10));
        assert_eq!(a.sub(b), Number::Int(2));
        assert_eq!(a.mul(b), Number::Int(24));
        assert_eq!(a.add(Number::Float(0.5)), Number::Float(6.5));
    }

    #[test]
    fn serde_untagged_roundtrip() {
        let i: Number = serde_json::from_str("5").unwrap();
        assert!(i.is_int());
        let f: Number = serde_json::from_str("5.5").unwrap();
        assert!(!f.is_int());
        assert_eq!(serde_json::to_string(&Number::Int(9)).unwrap(), "9");
    }
}
