//! Reduced row-echelon elimination table

use super::domain::{Domain, Expr};
use super::lincomb::{LinComb, SymbolId, Term};
use super::AlgebraError;
use crate::oracle::ATOM;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Zero};
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// Set of independent linear equations `row = 0` over one domain's symbols.
///
/// Rows are keyed by their pivot, the smallest variable they contain. In the
/// ratio and length domains every pivot has coefficient 1 and appears in no
/// other row. Angle rows only hold modulo the integers, so there the rows are
/// a lattice basis in Hermite normal form: a pivot carries a positive lead and
/// every other row keeps that column within `[0, lead)`. Either way the
/// residue of an expression depends only on what was inserted, not on order.
#[derive(Debug, Clone)]
pub struct EliminationTable<D: Domain> {
    names: Vec<String>,
    values: Vec<f64>,
    rows: BTreeMap<Term, LinComb>,
    encountered: FxHashSet<SymbolId>,
    unit: f64,
    _domain: PhantomData<D>,
}

impl<D: Domain> Default for EliminationTable<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Domain> EliminationTable<D> {
    pub fn new() -> Self {
        Self::with_unit(1.0)
    }

    /// Table whose numeric residuals are measured in multiples of `unit`
    pub fn with_unit(unit: f64) -> Self {
        Self {
            names: Vec::new(),
            values: Vec::new(),
            rows: BTreeMap::new(),
            encountered: FxHashSet::default(),
            unit: if unit > 0.0 && unit.is_finite() { unit } else { 1.0 },
            _domain: PhantomData,
        }
    }

    /// Allocate a fresh symbol carrying a numeric value
    pub fn new_var(&mut self, value: f64, name: impl Into<String>) -> Expr<D> {
        let id = SymbolId(self.names.len() as u32);
        self.names.push(name.into());
        self.values.push(value);
        Expr::var(id)
    }

    pub fn num_symbols(&self) -> usize {
        self.names.len()
    }

    /// Number of independent rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn name(&self, id: SymbolId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    /// Rows in pivot order
    pub fn rows(&self) -> impl Iterator<Item = (&Term, &LinComb)> {
        self.rows.iter()
    }

    /// Residue of `expr` modulo the current rows
    pub fn reduce(&self, expr: &Expr<D>) -> Expr<D> {
        let mut out = expr.comb().clone();
        if D::MODULAR {
            self.reduce_lattice(&mut out, None);
            return Expr::from_comb(out);
        }
        for (term, coef) in expr.comb().terms() {
            if let Some(row) = self.rows.get(term) {
                out.add_scaled(row, &-coef.clone());
            }
        }
        Expr::from_comb(out)
    }

    /// True when `expr = 0` follows from the inserted rows
    pub fn is_zero(&self, expr: &Expr<D>) -> bool {
        self.reduce(expr).is_zero()
    }

    /// True when some symbol of `expr` appeared in an inserted row
    pub fn was_encountered(&self, expr: &Expr<D>) -> bool {
        expr.vars().any(|v| self.encountered.contains(&v))
    }

    /// Numeric value of `expr` from the symbols' values
    pub fn value(&self, expr: &Expr<D>) -> f64 {
        expr.comb().evaluate(&self.values)
    }

    /// Normalized distance of `expr` from zero
    pub fn residual(&self, expr: &Expr<D>) -> f64 {
        D::wrap(self.value(expr)) / self.unit
    }

    pub fn is_numerically_zero(&self, expr: &Expr<D>) -> bool {
        let r = self.residual(expr);
        r * r < ATOM
    }

    /// Add `expr = 0`.
    ///
    /// Returns `Ok(false)` when the equation was already implied. A new row
    /// must be numerically zero and must still contain a variable.
    pub fn insert(&mut self, expr: &Expr<D>) -> Result<bool, AlgebraError> {
        self.encountered.extend(expr.vars());

        let reduced = self.reduce(expr);
        if reduced.is_zero() {
            return Ok(false);
        }

        let residual = self.residual(&reduced);
        if !(residual * residual < ATOM) {
            return Err(AlgebraError::Inconsistent {
                domain: D::NAME,
                expr: self.describe(&reduced),
                residual,
            });
        }

        let (pivot, lead) = match reduced.comb().leading() {
            Some((pivot @ Term::Var(_), lead)) => (pivot, lead.clone()),
            _ => {
                return Err(AlgebraError::Contradiction {
                    domain: D::NAME,
                    expr: self.describe(&reduced),
                })
            }
        };

        if D::MODULAR {
            self.insert_lattice(reduced.into_comb())?;
            return Ok(true);
        }

        let row = if lead.is_one() {
            reduced.into_comb()
        } else {
            reduced.scaled(&lead.recip()).into_comb()
        };

        for existing in self.rows.values_mut() {
            if let Some(coef) = existing.coeff(&pivot).cloned() {
                existing.add_scaled(&row, &-coef);
                D::canonicalize(existing);
            }
        }
        debug_assert!(self.rows.values().all(|r| r.coeff(&pivot).map_or(true, Zero::is_zero)));
        self.rows.insert(pivot, row);
        Ok(true)
    }

    /// Subtracts integer multiples of the rows pivoted after `after`, leaving
    /// each pivot coefficient of `comb` within `[0, lead)`.
    ///
    /// A row only touches columns from its pivot on, so one ascending pass
    /// over the pivots is enough.
    fn reduce_lattice(&self, comb: &mut LinComb, after: Option<Term>) {
        let mut cursor = after;
        loop {
            let next = comb
                .terms()
                .find(|(term, _)| cursor.map_or(true, |c| **term > c) && self.rows.contains_key(*term))
                .map(|(term, coef)| (*term, coef.clone()));
            let (pivot, coef) = match next {
                Some(found) => found,
                None => break,
            };
            let row = &self.rows[&pivot];
            if let Some(lead) = row.coeff(&pivot) {
                let times = (coef / lead).floor();
                comb.add_scaled(row, &-times);
                D::canonicalize(comb);
            }
            cursor = Some(pivot);
        }
    }

    /// Adds a reduced row to the lattice basis.
    ///
    /// When the pivot is already taken, the two rows are replaced by a
    /// unimodular combination: one row whose lead is the gcd of both leads,
    /// and a remainder without the pivot that is inserted in turn.
    fn insert_lattice(&mut self, mut row: LinComb) -> Result<(), AlgebraError> {
        loop {
            let pivot = match row.leading() {
                Some((pivot @ Term::Var(_), _)) => pivot,
                _ if row.is_zero() => return Ok(()),
                _ => {
                    return Err(AlgebraError::Contradiction {
                        domain: D::NAME,
                        expr: self.describe(&Expr::from_comb(row.clone())),
                    })
                }
            };
            positive_lead(&mut row);
            D::canonicalize(&mut row);

            let remainder = match self.rows.remove(&pivot) {
                Some(existing) => {
                    let (basis, rest) = Self::combine(&existing, &row, &pivot);
                    row = basis;
                    Some(rest)
                }
                None => None,
            };
            self.reduce_lattice(&mut row, Some(pivot));
            self.rows.insert(pivot, row);
            self.tidy_before(pivot);

            match remainder {
                Some(rest) => row = self.reduce(&Expr::from_comb(rest)).into_comb(),
                None => return Ok(()),
            }
        }
    }

    /// `(u·a + v·b, (lb/g)·a − (la/g)·b)` for leads `la`, `lb` at `pivot`
    /// and `u·la + v·lb = g`, with integer `u`, `v`.
    fn combine(a: &LinComb, b: &LinComb, pivot: &Term) -> (LinComb, LinComb) {
        let la = a.coeff(pivot).cloned().unwrap_or_else(BigRational::zero);
        let lb = b.coeff(pivot).cloned().unwrap_or_else(BigRational::zero);
        let common = BigRational::from_integer(la.denom().lcm(lb.denom()));
        let na = (&la * &common).to_integer();
        let nb = (&lb * &common).to_integer();
        let egcd = na.extended_gcd(&nb);
        let int = |n| BigRational::from_integer(n);

        let mut basis = LinComb::zero();
        basis.add_scaled(a, &int(egcd.x));
        basis.add_scaled(b, &int(egcd.y));
        positive_lead(&mut basis);
        D::canonicalize(&mut basis);

        let mut rest = LinComb::zero();
        rest.add_scaled(a, &int(&nb / &egcd.gcd));
        rest.add_scaled(b, &-int(&na / &egcd.gcd));
        D::canonicalize(&mut rest);
        (basis, rest)
    }

    /// Re-reduces the rows pivoted before `pivot` that use its column
    fn tidy_before(&mut self, pivot: Term) {
        let stale: Vec<Term> = self
            .rows
            .range(..pivot)
            .filter(|(_, row)| row.coeff(&pivot).is_some())
            .map(|(key, _)| *key)
            .collect();
        for key in stale {
            if let Some(mut row) = self.rows.remove(&key) {
                self.reduce_lattice(&mut row, Some(key));
                self.rows.insert(key, row);
            }
        }
    }

    /// Human-readable form using symbol names
    pub fn describe(&self, expr: &Expr<D>) -> String {
        expr.comb().render(|id| {
            self.name(id)
                .map(str::to_string)
                .unwrap_or_else(|| id.to_string())
        })
    }
}

fn positive_lead(row: &mut LinComb) {
    if row.leading_sign_negative() {
        row.scale(&-BigRational::one());
    }
}
