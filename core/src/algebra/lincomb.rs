//! Sparse linear combinations with exact rational coefficients

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a formal symbol inside one elimination table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// Column of a row.
///
/// `Var` sorts before `Prime`, so the smallest term of a row is a variable
/// whenever the row still has one. `Prime(p)` stands for `log p` and only
/// appears in the ratio domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Var(SymbolId),
    Prime(u64),
}

impl Term {
    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }
}

/// `Σ coef·term + constant` with no zero coefficients stored
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinComb {
    terms: BTreeMap<Term, BigRational>,
    constant: BigRational,
}

impl Default for LinComb {
    fn default() -> Self {
        Self::zero()
    }
}

impl LinComb {
    pub fn zero() -> Self {
        Self {
            terms: BTreeMap::new(),
            constant: BigRational::zero(),
        }
    }

    pub fn var(id: SymbolId) -> Self {
        Self::term(Term::Var(id), BigRational::one())
    }

    pub fn term(term: Term, coef: BigRational) -> Self {
        let mut comb = Self::zero();
        if !coef.is_zero() {
            comb.terms.insert(term, coef);
        }
        comb
    }

    pub fn constant_only(constant: BigRational) -> Self {
        Self {
            terms: BTreeMap::new(),
            constant,
        }
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Term, &BigRational)> {
        self.terms.iter()
    }

    pub fn coeff(&self, term: &Term) -> Option<&BigRational> {
        self.terms.get(term)
    }

    pub fn constant(&self) -> &BigRational {
        &self.constant
    }

    pub fn set_constant(&mut self, constant: BigRational) {
        self.constant = constant;
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty() && self.constant.is_zero()
    }

    /// True when at least one variable symbol has a non-zero coefficient
    pub fn has_vars(&self) -> bool {
        self.terms.keys().any(Term::is_var)
    }

    /// Variable symbols with non-zero coefficient, ascending
    pub fn vars(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.terms.keys().filter_map(|t| match t {
            Term::Var(id) => Some(*id),
            Term::Prime(_) => None,
        })
    }

    /// Smallest term and its coefficient
    pub fn leading(&self) -> Option<(Term, &BigRational)> {
        self.terms.iter().next().map(|(t, c)| (*t, c))
    }

    /// `self += factor * other`
    pub fn add_scaled(&mut self, other: &LinComb, factor: &BigRational) {
        if factor.is_zero() {
            return;
        }
        for (term, coef) in &other.terms {
            let delta = coef * factor;
            let sum = match self.terms.get(term) {
                Some(existing) => existing + &delta,
                None => delta,
            };
            if sum.is_zero() {
                self.terms.remove(term);
            } else {
                self.terms.insert(*term, sum);
            }
        }
        self.constant = &self.constant + &other.constant * factor;
    }

    pub fn scale(&mut self, factor: &BigRational) {
        if factor.is_zero() {
            *self = Self::zero();
            return;
        }
        for coef in self.terms.values_mut() {
            *coef = &*coef * factor;
        }
        self.constant = &self.constant * factor;
    }

    /// Sign of the leading coefficient, or of the constant when there are no terms
    pub fn leading_sign_negative(&self) -> bool {
        match self.leading() {
            Some((_, c)) => c.is_negative(),
            None => self.constant.is_negative(),
        }
    }

    /// Evaluates the combination with `values[i]` standing for symbol `i`
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        let mut total = to_f64(&self.constant);
        for (term, coef) in &self.terms {
            let x = match term {
                Term::Var(id) => values.get(id.0 as usize).copied().unwrap_or(f64::NAN),
                Term::Prime(p) => (*p as f64).ln(),
            };
            total += to_f64(coef) * x;
        }
        total
    }

    /// Renders the combination with a caller-supplied symbol namer
    pub fn render(&self, name: impl Fn(SymbolId) -> String) -> String {
        let mut out = String::new();
        for (term, coef) in &self.terms {
            let label = match term {
                Term::Var(id) => name(*id),
                Term::Prime(p) => format!("log {}", p),
            };
            push_term(&mut out, coef, &label);
        }
        if !self.constant.is_zero() || out.is_empty() {
            if out.is_empty() {
                out.push_str(&self.constant.to_string());
            } else if self.constant.is_negative() {
                out.push_str(&format!(" - {}", -&self.constant));
            } else {
                out.push_str(&format!(" + {}", self.constant));
            }
        }
        out
    }
}

fn push_term(out: &mut String, coef: &BigRational, label: &str) {
    let magnitude = coef.abs();
    let body = if magnitude.is_one() {
        label.to_string()
    } else {
        format!("{}·{}", magnitude, label)
    };
    if out.is_empty() {
        if coef.is_negative() {
            out.push('-');
        }
        out.push_str(&body);
    } else if coef.is_negative() {
        out.push_str(" - ");
        out.push_str(&body);
    } else {
        out.push_str(" + ");
        out.push_str(&body);
    }
}

impl fmt::Display for LinComb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(|id| id.to_string()))
    }
}

pub(crate) fn to_f64(r: &BigRational) -> f64 {
    r.to_f64().unwrap_or(f64::NAN)
}

pub(crate) fn rational(n: i64, d: i64) -> BigRational {
    BigRational::new(BigInt::from(n), BigInt::from(d))
}
