//! Numeric comparison expressions such as `>=3`, `<10` or `5`.
//!
//! Used by the `interval:` and `stability:` query operators. A malformed
//! expression never matches.

use std::fmt;

/// Comparison operator. Defaults to `=` when an expression has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "=",
        };
        f.write_str(symbol)
    }
}

/// A parsed comparison expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub op: CompareOp,
    pub rhs: f64,
}

impl Comparison {
    /// Parse `("<"|">"|"<="|">="|"=")? NUMBER`. Returns `None` for anything
    /// else.
    pub fn parse(expr: &str) -> Option<Self> {
        let expr = expr.trim();

        // Two-character operators must be tried before their prefixes.
        let (op, rest) = [
            (">=", CompareOp::Ge),
            ("<=", CompareOp::Le),
            (">", CompareOp::Gt),
            ("<", CompareOp::Lt),
            ("=", CompareOp::Eq),
        ]
        .into_iter()
        .find_map(|(symbol, op)| expr.strip_prefix(symbol).map(|rest| (op, rest)))
        .unwrap_or((CompareOp::Eq, expr));

        if !is_plain_number(rest) {
            return None;
        }

        rest.parse::<f64>().ok().map(|rhs| Comparison { op, rhs })
    }

    /// Does `value` satisfy this comparison? Equality is exact.
    pub fn matches(&self, value: f64) -> bool {
        match self.op {
            CompareOp::Lt => value < self.rhs,
            CompareOp::Le => value <= self.rhs,
            CompareOp::Gt => value > self.rhs,
            CompareOp::Ge => value >= self.rhs,
            CompareOp::Eq => value == self.rhs,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.rhs)
    }
}

/// Evaluate `expr` against `value`. Malformed expressions yield `false`.
pub fn compare(value: f64, expr: &str) -> bool {
    Comparison::parse(expr).is_some_and(|cmp| cmp.matches(value))
}

/// Optional minus sign, digits, and at most one decimal point with at least
/// one digit somewhere. Rejects `inf`, `nan`, exponents and stray characters
/// that `f64::from_str` would otherwise accept.
fn is_plain_number(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let mut seen_dot = false;
    let mut seen_digit = false;

    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }

    seen_digit
}
