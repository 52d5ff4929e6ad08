//! Typed expressions for the angle, ratio and length domains

use super::lincomb::{LinComb, SymbolId, Term};
use super::ConstantError;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, Neg, Sub};

/// A family of formal symbols sharing one elimination table
pub trait Domain: Clone + fmt::Debug + PartialEq + Eq + std::hash::Hash + Send + Sync + 'static {
    /// Short name used in diagnostics
    const NAME: &'static str;

    /// Rows hold modulo the integers, so they may only be combined with
    /// integer multipliers
    const MODULAR: bool = false;

    /// Bring the constant part into canonical form
    fn canonicalize(comb: &mut LinComb);

    /// Distance of a raw numeric value from zero in this domain
    fn wrap(raw: f64) -> f64 {
        raw
    }
}

/// Directions of lines, in units of π and defined modulo π
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AngleDomain;

/// Logarithms of lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RatioDomain;

/// Lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LengthDomain;

impl Domain for AngleDomain {
    const NAME: &'static str = "angle";
    const MODULAR: bool = true;

    fn canonicalize(comb: &mut LinComb) {
        let c = comb.constant().clone();
        if !c.is_zero() {
            comb.set_constant(&c - c.floor());
        }
    }

    fn wrap(raw: f64) -> f64 {
        raw - raw.round()
    }
}

impl Domain for RatioDomain {
    const NAME: &'static str = "ratio";

    fn canonicalize(_comb: &mut LinComb) {}
}

impl Domain for LengthDomain {
    const NAME: &'static str = "length";

    fn canonicalize(_comb: &mut LinComb) {}
}

/// Linear expression over the symbols of one domain
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expr<D> {
    comb: LinComb,
    _domain: PhantomData<D>,
}

pub type AngleExpr = Expr<AngleDomain>;
pub type RatioExpr = Expr<RatioDomain>;
pub type LengthExpr = Expr<LengthDomain>;

impl<D: Domain> Expr<D> {
    pub fn zero() -> Self {
        Self::from_comb(LinComb::zero())
    }

    pub fn var(id: SymbolId) -> Self {
        Self::from_comb(LinComb::var(id))
    }

    pub fn from_comb(mut comb: LinComb) -> Self {
        D::canonicalize(&mut comb);
        Self {
            comb,
            _domain: PhantomData,
        }
    }

    pub fn comb(&self) -> &LinComb {
        &self.comb
    }

    pub fn into_comb(self) -> LinComb {
        self.comb
    }

    pub fn is_zero(&self) -> bool {
        self.comb.is_zero()
    }

    pub fn has_vars(&self) -> bool {
        self.comb.has_vars()
    }

    pub fn vars(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.comb.vars()
    }

    pub fn scaled(&self, factor: &BigRational) -> Self {
        let mut comb = self.comb.clone();
        comb.scale(factor);
        Self::from_comb(comb)
    }

    /// `e` and `-e` state the same equation; pick the one with a positive lead.
    pub fn sign_normalized(self) -> Self {
        if self.comb.leading_sign_negative() {
            -self
        } else {
            self
        }
    }
}

impl AngleExpr {
    /// Constant direction `c·π`
    pub fn constant(c: BigRational) -> Self {
        Self::from_comb(LinComb::constant_only(c))
    }

    /// A right angle, `π/2`
    pub fn right() -> Self {
        Self::constant(BigRational::new(BigInt::one(), BigInt::from(2)))
    }

    /// The constant part when no variable is left
    pub fn as_constant(&self) -> Option<&BigRational> {
        if self.has_vars() {
            None
        } else {
            Some(self.comb.constant())
        }
    }
}

impl RatioExpr {
    /// `log r` for a positive rational `r`, as a sum of prime logarithms.
    ///
    /// Numerator and denominator must each fit in `u64` and factor by trial
    /// division up to [`TRIAL_DIVISION_BOUND`].
    pub fn constant(r: &BigRational) -> Result<Self, ConstantError> {
        if !r.is_positive() {
            return Err(ConstantError::NotPositive(r.to_string()));
        }
        let mut comb = LinComb::zero();
        for (part, sign) in [(r.numer(), BigRational::one()), (r.denom(), -BigRational::one())] {
            let n = part.to_u64().ok_or_else(|| ConstantError::TooWide(r.to_string()))?;
            let factors = prime_exponents(n).map_err(|cofactor| ConstantError::Unfactored {
                value: r.to_string(),
                cofactor,
            })?;
            for (p, e) in factors {
                comb.add_scaled(&LinComb::term(Term::Prime(p), BigRational::from_integer(e.into())), &sign);
            }
        }
        Ok(Self::from_comb(comb))
    }

    /// Splits into the variable part and `exp` of the constant part.
    ///
    /// The rational factor is `None` when some prime carries a fractional
    /// exponent.
    pub fn split_constant(&self) -> (RatioExpr, Option<BigRational>) {
        let mut vars = LinComb::zero();
        let mut factor = Some(BigRational::one());
        for (term, coef) in self.comb.terms() {
            match term {
                Term::Var(_) => vars.add_scaled(&LinComb::term(*term, coef.clone()), &BigRational::one()),
                Term::Prime(p) => {
                    factor = match (factor, coef.is_integer()) {
                        (Some(f), true) => coef.to_integer().to_i32().map(|e| f * prime_power(*p, e)),
                        _ => None,
                    };
                }
            }
        }
        (Self::from_comb(vars), factor)
    }
}

impl LengthExpr {
    pub fn constant(c: BigRational) -> Self {
        Self::from_comb(LinComb::constant_only(c))
    }

    /// Divides by the magnitude of the leading coefficient and returns it
    pub fn split_leading(&self) -> Option<(LengthExpr, BigRational)> {
        let (_, lead) = self.comb.leading()?;
        let magnitude = lead.abs();
        Some((self.scaled(&magnitude.recip()), magnitude))
    }
}

/// Largest trial divisor; cofactors below its square are prime
pub const TRIAL_DIVISION_BOUND: u64 = 1 << 20;

/// Prime factorization of `n`, or the cofactor left when the bound is hit
fn prime_exponents(mut n: u64) -> Result<Vec<(u64, i64)>, u64> {
    let mut factors = Vec::new();
    let mut p = 2u64;
    while p * p <= n {
        if p > TRIAL_DIVISION_BOUND {
            return Err(n);
        }
        let mut e = 0i64;
        while n % p == 0 {
            n /= p;
            e += 1;
        }
        if e > 0 {
            factors.push((p, e));
        }
        p += if p == 2 { 1 } else { 2 };
    }
    if n > 1 {
        factors.push((n, 1));
    }
    Ok(factors)
}

fn prime_power(p: u64, e: i32) -> BigRational {
    let base = BigRational::from_integer(BigInt::from(p));
    let mut out = BigRational::one();
    for _ in 0..e.unsigned_abs() {
        out = out * &base;
    }
    if e < 0 {
        out.recip()
    } else {
        out
    }
}

impl<D: Domain> Add for Expr<D> {
    type Output = Expr<D>;

    fn add(self, rhs: Expr<D>) -> Expr<D> {
        &self + &rhs
    }
}

impl<D: Domain> Add<&Expr<D>> for &Expr<D> {
    type Output = Expr<D>;

    fn add(self, rhs: &Expr<D>) -> Expr<D> {
        let mut comb = self.comb.clone();
        comb.add_scaled(&rhs.comb, &BigRational::one());
        Expr::from_comb(comb)
    }
}

impl<D: Domain> Sub for Expr<D> {
    type Output = Expr<D>;

    fn sub(self, rhs: Expr<D>) -> Expr<D> {
        &self - &rhs
    }
}

impl<D: Domain> Sub<&Expr<D>> for &Expr<D> {
    type Output = Expr<D>;

    fn sub(self, rhs: &Expr<D>) -> Expr<D> {
        let mut comb = self.comb.clone();
        comb.add_scaled(&rhs.comb, &-BigRational::one());
        Expr::from_comb(comb)
    }
}

impl<D: Domain> Neg for Expr<D> {
    type Output = Expr<D>;

    fn neg(self) -> Expr<D> {
        -&self
    }
}

impl<D: Domain> Neg for &Expr<D> {
    type Output = Expr<D>;

    fn neg(self) -> Expr<D> {
        self.scaled(&-BigRational::one())
    }
}

impl<D: Domain> fmt::Display for Expr<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.comb)
    }
}
