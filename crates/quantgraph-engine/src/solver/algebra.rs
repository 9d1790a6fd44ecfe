//! Single-equation solving primitives.
//!
//! Template equation sets are tiny (one to three linear or low-degree
//! equations), so a full computer-algebra system is unnecessary. An equation
//! with exactly one unresolved symbol is solved in two stages:
//!
//! 1. **Isolation**: when the symbol occurs exactly once, inverse operations
//!    are applied step by step. This works in exact [`Number`] arithmetic,
//!    so integer problems stay integral, and it handles a symbol in a
//!    denominator (`Z = L / I` solved for `I`).
//! 2. **Linear extraction**: interpret both sides as `a*x + b` with float
//!    coefficients and read off `x = -b/a`. Handles repeated occurrences
//!    of `x`.

use quantgraph_core::formula::{BinOp, Equation, Expr};
use quantgraph_core::value::Number;

/// Solves an equation for `sym`, which must be its only free symbol.
/// Returns `None` when the equation cannot be solved by either stage.
pub(crate) fn solve_for(equation: &Equation, sym: &str) -> Option<Number> {
    let occurrences = equation.lhs.occurrences(sym) + equation.rhs.occurrences(sym);
    if occurrences == 1 {
        if let Some(value) = solve_by_isolation(equation, sym) {
            return Some(value);
        }
    }
    solve_linear(equation, sym)
}

// ---------------------------------------------------------------------------
// Stage 2: linear-coefficient extraction
// ---------------------------------------------------------------------------

fn solve_linear(equation: &Equation, sym: &str) -> Option<Number> {
    let (la, lb) = linear_coeffs(&equation.lhs, sym)?;
    let (ra, rb) = linear_coeffs(&equation.rhs, sym)?;
    // a*x + b = 0 with a = la - ra, b = lb - rb.
    let a = la - ra;
    let b = lb - rb;
    if a == 0.0 {
        return None;
    }
    let value = -b / a;
    if !value.is_finite() {
        return None;
    }
    Some(Number::Float(value).coerced())
}

/// Interprets `expr` as `a*sym + b`. Any other free symbol, or a nonlinear
/// use of `sym` (products of two sym-carrying factors, sym in a
/// denominator), yields `None`.
fn linear_coeffs(expr: &Expr, sym: &str) -> Option<(f64, f64)> {
    match expr {
        Expr::Num(n) => Some((0.0, n.as_f64())),
        Expr::Sym(s) => {
            if s == sym {
                Some((1.0, 0.0))
            } else {
                None
            }
        }
        Expr::Neg(inner) => {
            let (a, b) = linear_coeffs(inner, sym)?;
            Some((-a, -b))
        }
        Expr::Bin(op, l, r) => {
            let (la, lb) = linear_coeffs(l, sym)?;
            let (ra, rb) = linear_coeffs(r, sym)?;
            match op {
                BinOp::Add => Some((la + ra, lb + rb)),
                BinOp::Sub => Some((la - ra, lb - rb)),
                BinOp::Mul => {
                    if la == 0.0 {
                        Some((lb * ra, lb * rb))
                    } else if ra == 0.0 {
                        Some((la * rb, lb * rb))
                    } else {
                        None
                    }
                }
                BinOp::Div => {
                    if ra == 0.0 && rb != 0.0 {
                        Some((la / rb, lb / rb))
                    } else {
                        None
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Stage 1: inverse-operation isolation
// ---------------------------------------------------------------------------

fn solve_by_isolation(equation: &Equation, sym: &str) -> Option<Number> {
    let empty = std::collections::HashMap::new();
    let (mut carrier, mut value) = match (
        equation.lhs.occurrences(sym),
        equation.rhs.occurrences(sym),
    ) {
        (1, 0) => (&equation.lhs, equation.rhs.eval(&empty)?),
        (0, 1) => (&equation.rhs, equation.lhs.eval(&empty)?),
        _ => return None,
    };

    loop {
        match carrier {
            Expr::Sym(s) if s == sym => return Some(value.coerced()),
            Expr::Sym(_) | Expr::Num(_) => return None,
            Expr::Neg(inner) => {
                value = -value;
                carrier = inner;
            }
            Expr::Bin(op, l, r) => {
                let sym_on_left = l.occurrences(sym) == 1;
                let (next, other) = if sym_on_left { (l, r) } else { (r, l) };
                let other = other.eval(&empty)?;
                value = match (op, sym_on_left) {
                    (BinOp::Add, _) => value.sub(other),
                    (BinOp::Sub, true) => value.add(other),
                    (BinOp::Sub, false) => other.sub(value),
                    (BinOp::Mul, _) => value.div(other)?,
                    (BinOp::Div, true) => value.mul(other),
                    // c / x = v  =>  x = c / v
                    (BinOp::Div, false) => other.div(value)?,
                };
                carrier = next;
            }
        }
    }
}
