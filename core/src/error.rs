//! Error taxonomy for a deduction run

use crate::algebra::AlgebraError;
use crate::loader::LoadError;
use thiserror::Error;

/// A construction or predicate that is undefined on the given diagram
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructionError {
    #[error("points {0} and {1} coincide but must be distinct")]
    CoincidentPoints(String, String),

    #[error("lines {0} and {1} are parallel, their intersection is undefined")]
    ParallelLines(String, String),

    #[error("points {0}, {1}, {2} are collinear, no circle passes through them")]
    CollinearPoints(String, String, String),

    #[error("circle centred at {0} has zero radius")]
    ZeroRadius(String),

    #[error("construction of {0} is tangent, there is no second intersection")]
    Tangent(String),

    #[error("point {0} is used before it is constructed")]
    UndefinedPoint(String),

    #[error("construction of {0} produced a non-finite coordinate")]
    NonFinite(String),

    #[error("{0} needs at least three distinct points")]
    TooFewPoints(String),
}

/// Errors raised while building or running a deduction
#[derive(Error, Debug)]
pub enum DdarError {
    #[error("construction error: {0}")]
    Construction(#[from] ConstructionError),

    #[error("contradiction: {0}")]
    Contradiction(String),

    /// Oracle and tables disagree on a nondegenerate configuration
    #[error("consistency fault in {domain} table: `{expr}` has residual {residual:e}")]
    ConsistencyFault {
        domain: &'static str,
        expr: String,
        residual: f64,
    },

    #[error("unknown point `{0}`")]
    UnknownPoint(String),

    #[error("invalid predicate: {0}")]
    InvalidPredicate(String),

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl DdarError {
    /// Errors that end a run with a `ConstructionError` verdict instead of failing it
    pub fn is_verdict(&self) -> bool {
        matches!(self, DdarError::Construction(_) | DdarError::Contradiction(_))
    }
}

impl From<AlgebraError> for DdarError {
    fn from(err: AlgebraError) -> Self {
        match err {
            AlgebraError::Inconsistent {
                domain,
                expr,
                residual,
            } => DdarError::ConsistencyFault {
                domain,
                expr,
                residual,
            },
            AlgebraError::Contradiction { domain, expr } => {
                DdarError::Contradiction(format!("{} table derives {} = 0", domain, expr))
            }
        }
    }
}

pub type DdarResult<T> = Result<T, DdarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algebra_errors_map_to_run_errors() {
        let fault: DdarError = AlgebraError::Inconsistent {
            domain: "angle",
            expr: "x0".into(),
            residual: 0.25,
        }
        .into();
        assert!(matches!(fault, DdarError::ConsistencyFault { .. }));
        assert!(!fault.is_verdict());

        let contra: DdarError = AlgebraError::Contradiction {
            domain: "ratio",
            expr: "log 2".into(),
        }
        .into();
        assert!(contra.is_verdict());
        assert!(contra.to_string().contains("log 2"));
    }
}
