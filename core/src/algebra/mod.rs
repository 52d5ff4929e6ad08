//! Exact elimination over formal symbols
//!
//! Three tables share one generic core:
//! - **angle**: directions of lines, in units of π, constants reduced mod 1
//! - **ratio**: logarithms of lengths, rational constants as prime exponents
//! - **length**: lengths themselves, plain rational constants
//!
//! Ratio and length tables keep their rows in fully reduced row-echelon form.
//! Angle rows hold mod 1 and are kept as an integer lattice in Hermite normal
//! form. Either way two expressions are equal modulo the table iff they reduce
//! to the same residue.

mod domain;
mod lincomb;
mod table;

pub use domain::{
    AngleDomain, AngleExpr, Domain, Expr, LengthDomain, LengthExpr, RatioDomain, RatioExpr,
    TRIAL_DIVISION_BOUND,
};
pub use lincomb::{LinComb, SymbolId, Term};
pub use table::EliminationTable;

use thiserror::Error;

/// Failure while inserting a row into an elimination table
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlgebraError {
    /// The reduced row is symbolically new but numerically non-zero
    #[error("{domain} row `{expr}` is numerically non-zero (residual {residual:e})")]
    Inconsistent {
        domain: &'static str,
        expr: String,
        residual: f64,
    },

    /// The reduced row has no variables left but is not zero
    #[error("{domain} row reduces to the non-zero constant `{expr}`")]
    Contradiction { domain: &'static str, expr: String },
}

/// A rational constant that cannot be written as a sum of prime logarithms
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstantError {
    #[error("`{0}` is not positive")]
    NotPositive(String),

    #[error("`{0}` does not fit in 64 bits")]
    TooWide(String),

    /// Trial division stopped at its bound with a composite-or-prime cofactor left
    #[error("`{value}` leaves the unfactored cofactor {cofactor}")]
    Unfactored { value: String, cofactor: u64 },
}
