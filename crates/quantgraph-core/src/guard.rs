//! Guard expressions: per-embedding admission checks.
//!
//! Templates may declare guards such as `"Vf>Vs"` that an embedding must
//! satisfy before it becomes a candidate. Guards are parsed once at
//! template-load time into a small typed AST (comparator plus two operand
//! references); evaluation never fails -- a missing or unset operand simply
//! makes the guard false.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Comparison operators, two-character forms first so `>=` is not read
/// as `>` followed by garbage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cmp {
    Ge,
    Le,
    Eq,
    Ne,
    Gt,
    Lt,
}

impl Cmp {
    const ALL: [(Cmp, &'static str); 6] = [
        (Cmp::Ge, ">="),
        (Cmp::Le, "<="),
        (Cmp::Eq, "=="),
        (Cmp::Ne, "!="),
        (Cmp::Gt, ">"),
        (Cmp::Lt, "<"),
    ];

    fn symbol(&self) -> &'static str {
        Cmp::ALL
            .iter()
            .find(|(c, _)| c == self)
            .map(|(_, s)| *s)
            .unwrap_or(">")
    }

    fn apply(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Cmp::Ge => lhs >= rhs,
            Cmp::Le => lhs <= rhs,
            Cmp::Eq => lhs == rhs,
            Cmp::Ne => lhs != rhs,
            Cmp::Gt => lhs > rhs,
            Cmp::Lt => lhs < rhs,
        }
    }
}

/// One side of a guard: a template-node symbol or a numeric literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GuardOperand {
    Sym(String),
    Num(f64),
}

impl GuardOperand {
    fn resolve(&self, env: &HashMap<String, f64>) -> Option<f64> {
        match self {
            GuardOperand::Sym(s) => env.get(s).copied(),
            GuardOperand::Num(n) => Some(*n),
        }
    }
}

impl fmt::Display for GuardOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardOperand::Sym(s) => f.write_str(s),
            GuardOperand::Num(n) => write!(f, "{}", n),
        }
    }
}

/// A parsed guard expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guard {
    pub lhs: GuardOperand,
    pub cmp: Cmp,
    pub rhs: GuardOperand,
}

impl Guard {
    /// Parses a guard string such as `"Vf>Vs"` or `"DT>=0"`.
    pub fn parse(expr: &str) -> Result<Guard, GuardParseError> {
        for (cmp, symbol) in Cmp::ALL {
            if let Some(pos) = expr.find(symbol) {
                let lhs = parse_operand(&expr[..pos], expr)?;
                let rhs = parse_operand(&expr[pos + symbol.len()..], expr)?;
                return Ok(Guard { lhs, cmp, rhs });
            }
        }
        Err(GuardParseError::MissingComparator {
            expr: expr.to_string(),
        })
    }

    /// Evaluates against the mapped node values. Unresolvable operands make
    /// the guard false, never an error.
    pub fn eval(&self, env: &HashMap<String, f64>) -> bool {
        match (self.lhs.resolve(env), self.rhs.resolve(env)) {
            (Some(l), Some(r)) => self.cmp.apply(l, r),
            _ => false,
        }
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.lhs, self.cmp.symbol(), self.rhs)
    }
}

fn parse_operand(text: &str, expr: &str) -> Result<GuardOperand, GuardParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(GuardParseError::EmptyOperand {
            expr: expr.to_string(),
        });
    }
    if let Ok(n) = text.parse::<f64>() {
        return Ok(GuardOperand::Num(n));
    }
    let is_ident = text
        .chars()
        .enumerate()
        .all(|(i, c)| c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()));
    if is_ident {
        Ok(GuardOperand::Sym(text.to_string()))
    } else {
        Err(GuardParseError::BadOperand {
            operand: text.to_string(),
            expr: expr.to_string(),
        })
    }
}

/// Guard parse failures, reported at template-load time.
#[derive(Debug, Error)]
pub enum GuardParseError {
    #[error("guard has no comparator: '{expr}'")]
    MissingComparator { expr: String },

    #[error("guard operand is empty in '{expr}'")]
    EmptyOperand { expr: String },

    #[error("guard operand '{operand}' in '{expr}' is neither a symbol nor a number")]
    BadOperand { operand: String, expr: String },
}
