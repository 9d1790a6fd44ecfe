//! Equation ASTs and the formula parser.
//!
//! Template formulas are authored as `"lhs = rhs"` strings over the
//! template's node ids (`"Z = L / I + 1"`). They are parsed exactly once at
//! template-load time into [`Equation`] values; the solver then works on the
//! AST and never re-parses.
//!
//! The expression grammar is deliberately small: numbers, symbols, unary
//! minus, the four arithmetic operators, and parentheses.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::Number;

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            BinOp::Add | BinOp::Sub => 1,
            BinOp::Mul | BinOp::Div => 2,
        }
    }
}

/// An arithmetic expression over template-node symbols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Num(Number),
    Sym(String),
    Neg(Box<Expr>),
    Bin(BinOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Collects the free symbols of this expression.
    pub fn free_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Num(_) => {}
            Expr::Sym(s) => {
                out.insert(s.clone());
            }
            Expr::Neg(inner) => inner.free_symbols(out),
            Expr::Bin(_, l, r) => {
                l.free_symbols(out);
                r.free_symbols(out);
            }
        }
    }

    /// Counts occurrences of one symbol.
    pub fn occurrences(&self, sym: &str) -> usize {
        match self {
            Expr::Num(_) => 0,
            Expr::Sym(s) => usize::from(s == sym),
            Expr::Neg(inner) => inner.occurrences(sym),
            Expr::Bin(_, l, r) => l.occurrences(sym) + r.occurrences(sym),
        }
    }

    /// Returns a copy with every bound symbol replaced by its value.
    pub fn substituted(&self, env: &HashMap<String, Number>) -> Expr {
        match self {
            Expr::Num(n) => Expr::Num(*n),
            Expr::Sym(s) => match env.get(s) {
                Some(v) => Expr::Num(*v),
                None => Expr::Sym(s.clone()),
            },
            Expr::Neg(inner) => Expr::Neg(Box::new(inner.substituted(env))),
            Expr::Bin(op, l, r) => Expr::Bin(
                *op,
                Box::new(l.substituted(env)),
                Box::new(r.substituted(env)),
            ),
        }
    }

    /// Evaluates a closed expression. `None` when a symbol remains free or a
    /// division by zero occurs.
    pub fn eval(&self, env: &HashMap<String, Number>) -> Option<Number> {
        match self {
            Expr::Num(n) => Some(*n),
            Expr::Sym(s) => env.get(s).copied(),
            Expr::Neg(inner) => inner.eval(env).map(|v| -v),
            Expr::Bin(op, l, r) => {
                let a = l.eval(env)?;
                let b = r.eval(env)?;
                match op {
                    BinOp::Add => Some(a.add(b)),
                    BinOp::Sub => Some(a.sub(b)),
                    BinOp::Mul => Some(a.mul(b)),
                    BinOp::Div => a.div(b),
                }
            }
        }
    }

    fn fmt_prec(&self, f: &mut fmt::Formatter<'_>, parent: u8) -> fmt::Result {
        match self {
            Expr::Num(n) => write!(f, "{}", n),
            Expr::Sym(s) => f.write_str(s),
            Expr::Neg(inner) => {
                f.write_str("-")?;
                inner.fmt_prec(f, 3)
            }
            Expr::Bin(op, l, r) => {
                let prec = op.precedence();
                let needs_parens = prec < parent;
                if needs_parens {
                    f.write_str("(")?;
                }
                l.fmt_prec(f, prec)?;
                write!(f, " {} ", op.symbol())?;
                // The right operand of `-` and `/` binds one level tighter.
                let right_min = match op {
                    BinOp::Sub | BinOp::Div => prec + 1,
                    _ => prec,
                };
                r.fmt_prec(f, right_min)?;
                if needs_parens {
                    f.write_str(")")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_prec(f, 0)
    }
}

/// One template equation, `lhs = rhs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equation {
    pub lhs: Expr,
    pub rhs: Expr,
}

impl Equation {
    /// Free symbols across both sides.
    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.lhs.free_symbols(&mut out);
        self.rhs.free_symbols(&mut out);
        out
    }

    /// Substitutes bound symbols on both sides.
    pub fn substituted(&self, env: &HashMap<String, Number>) -> Equation {
        Equation {
            lhs: self.lhs.substituted(env),
            rhs: self.rhs.substituted(env),
        }
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}

/// Formula parse failures, reported at template-load time.
#[derive(Debug, Error)]
pub enum FormulaParseError {
    #[error("formula must contain exactly one '=': '{formula}'")]
    EqualsCount { formula: String },

    #[error("unexpected character '{ch}' at byte {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("malformed number '{text}'")]
    BadNumber { text: String },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token '{token}'")]
    UnexpectedToken { token: String },
}

/// Parses a `"lhs = rhs"` formula string.
pub fn parse_equation(formula: &str) -> Result<Equation, FormulaParseError> {
    let mut sides = formula.split('=');
    let (lhs, rhs) = match (sides.next(), sides.next(), sides.next()) {
        (Some(l), Some(r), None) => (l, r),
        _ => {
            return Err(FormulaParseError::EqualsCount {
                formula: formula.to_string(),
            })
        }
    };
    Ok(Equation {
        lhs: parse_expr(lhs)?,
        rhs: parse_expr(rhs)?,
    })
}

/// Parses a single expression.
pub fn parse_expr(input: &str) -> Result<Expr, FormulaParseError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(tok) => Err(FormulaParseError::UnexpectedToken {
            token: tok.describe(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(Number),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Num(n) => n.to_string(),
            Token::Ident(s) => s.clone(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Slash => "/".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, FormulaParseError> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < bytes.len()
                    && ((bytes[i] as char).is_ascii_digit() || bytes[i] == b'.')
                {
                    i += 1;
                }
                let text = &input[start..i];
                let num = if text.contains('.') {
                    text.parse::<f64>().map(Number::Float)
                } else {
                    text.parse::<i64>().map(Number::Int)
                };
                match num {
                    Ok(n) => tokens.push(Token::Num(n)),
                    Err(_) => {
                        return Err(FormulaParseError::BadNumber {
                            text: text.to_string(),
                        })
                    }
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len()
                    && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                tokens.push(Token::Ident(input[start..i].to_string()));
            }
            other => {
                return Err(FormulaParseError::UnexpectedChar { ch: other, pos: i });
            }
        }
    }
    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Recursive-descent parser
// ---------------------------------------------------------------------------

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expr(&mut self) -> Result<Expr, FormulaParseError> {
        let mut lhs = self.term()?;
        while let Some(tok) = self.peek() {
            let op = match tok {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.next();
            let rhs = self.term()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, FormulaParseError> {
        let mut lhs = self.factor()?;
        while let Some(tok) = self.peek() {
            let op = match tok {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                _ => break,
            };
            self.next();
            let rhs = self.factor()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn factor(&mut self) -> Result<Expr, FormulaParseError> {
        match self.next() {
            Some(Token::Num(n)) => Ok(Expr::Num(n)),
            Some(Token::Ident(s)) => Ok(Expr::Sym(s)),
            Some(Token::Minus) => Ok(Expr::Neg(Box::new(self.factor()?))),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(tok) => Err(FormulaParseError::UnexpectedToken {
                        token: tok.describe(),
                    }),
                    None => Err(FormulaParseError::UnexpectedEnd),
                }
            }
            Some(tok) => Err(FormulaParseError::UnexpectedToken {
                token: tok.describe(),
            }),
            None => Err(FormulaParseError::UnexpectedEnd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, Number)]) -> HashMap<String, Number> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn parses_basic_precedence() {
        let eq = parse_equation("Z = L / I + 1").unwrap();
        assert_eq!(eq.to_string(), "Z = L / I + 1");

        let eq = parse_equation("L = I * (Z - 1)").unwrap();
        assert_eq!(eq.to_string(), "L = I * (Z - 1)");
    }

    #[test]
    fn parses_unary_minus() {
        let e = parse_expr("-Z + 3").unwrap();
        assert_eq!(e.to_string(), "-Z + 3");
        assert_eq!(
            e.eval(&env(&[("Z", Number::Int(1))])),
            Some(Number::Int(2))
        );
    }

    #[test]
    fn rejects_malformed_formulas() {
        assert!(matches!(
            parse_equation("Z == L"),
            Err(FormulaParseError::EqualsCount { .. })
        ));
        assert!(parse_equation("Z = L +").is_err());
        assert!(parse_equation("Z = (L").is_err());
        assert!(parse_equation("Z = L ^ I").is_err());
        assert!(parse_equation("no equals here").is_err());
    }

    #[test]
    fn eval_keeps_exact_integers() {
        let eq = parse_equation("Z = L / I + 1").unwrap();
        let bound = eq.substituted(&env(&[
            ("L", Number::Int(120)),
            ("I", Number::Int(15)),
        ]));
        assert_eq!(bound.rhs.eval(&HashMap::new()), Some(Number::Int(9)));
    }

    #[test]
    fn eval_returns_none_for_free_symbols_and_zero_division() {
        let e = parse_expr("L / I").unwrap();
        assert_eq!(e.eval(&env(&[("L", Number::Int(10))])), None);
        assert_eq!(
            e.eval(&env(&[("L", Number::Int(10)), ("I", Number::Int(0))])),
            None
        );
    }

    #[test]
    fn free_symbols_and_occurrences() {
        let eq = parse_equation("D = (L / I1 + 1) - (L / I2 + 1)").unwrap();
        let syms = eq.free_symbols();
        assert_eq!(
            syms.into_iter().collect::<Vec<_>>(),
            vec!["D", "I1", "I2", "L"]
        );
        assert_eq!(eq.rhs.occurrences("L"), 2);
        assert_eq!(eq.lhs.occurrences("L"), 0);
    }

    #[test]
    fn substitution_is_partial() {
        let e = parse_expr("(Va + Vb) * T").unwrap();
        let sub = e.substituted(&env(&[("Va", Number::Int(60))]));
        assert_eq!(sub.to_string(), "(60 + Vb) * T");
    }

    #[test]
    fn display_parenthesizes_only_where_needed() {
        let e = parse_expr("(Z - 1) * I").unwrap();
        assert_eq!(e.to_string(), "(Z - 1) * I");
        let e = parse_expr("Z - (1 * I)").unwrap();
        assert_eq!(e.to_string(), "Z - 1 * I");
        let e = parse_expr("L / (I + 1)").unwrap();
        assert_eq!(e.to_string(), "L / (I + 1)");
    }
}
