//! Fact normalization and predicate translation
//!
//! Surface predicates are rewritten into kernel facts here, once, so that
//! premise assertion and goal checking agree on what a predicate means.

use crate::algebra::{AngleExpr, LengthExpr, RatioExpr};
use crate::error::{DdarError, DdarResult};
use crate::ir::{Fact, GeoState, PointId, Predicate};
use num_bigint::BigInt;
use num_rational::BigRational;
use rustc_hash::FxHashSet;

/// Replace points by their representatives, dropping repeats, keeping order
pub fn canonical_points(state: &GeoState, points: &[PointId]) -> Vec<PointId> {
    let mut seen = FxHashSet::default();
    points
        .iter()
        .map(|&p| state.registry.point_rep(p))
        .filter(|p| seen.insert(*p))
        .collect()
}

fn half_turns(degrees: &BigRational) -> BigRational {
    degrees / BigRational::from_integer(BigInt::from(180))
}

fn log_constant(value: &BigRational, pred: &Predicate) -> DdarResult<RatioExpr> {
    RatioExpr::constant(value)
        .map_err(|err| DdarError::InvalidPredicate(format!("{} constant rejected: {}", pred.name(), err)))
}

/// Kernel facts that together state `pred`.
///
/// Fails for `acompute`, which only makes sense as a goal.
pub fn predicate_facts(state: &GeoState, pred: &Predicate) -> DdarResult<Vec<Fact>> {
    let facts = match pred {
        Predicate::Collinear(points) => vec![Fact::Collinear(points.clone())],
        Predicate::Parallel([a, b, c, d]) => vec![Fact::AngleZero(state.dir(*a, *b)? - state.dir(*c, *d)?)],
        Predicate::Perpendicular([a, b, c, d]) => {
            vec![Fact::AngleZero(state.dir(*a, *b)? - state.dir(*c, *d)? - AngleExpr::right())]
        }
        Predicate::Congruent([a, b, c, d]) => {
            vec![Fact::RatioZero(state.log_len(*a, *b)? - state.log_len(*c, *d)?)]
        }
        Predicate::EqualAngle(p) => {
            let first = state.dir(p[0], p[1])? - state.dir(p[2], p[3])?;
            let second = state.dir(p[4], p[5])? - state.dir(p[6], p[7])?;
            vec![Fact::AngleZero(first - second)]
        }
        Predicate::EqualRatio(p) => {
            let first = state.log_len(p[0], p[1])? - state.log_len(p[2], p[3])?;
            let second = state.log_len(p[4], p[5])? - state.log_len(p[6], p[7])?;
            vec![Fact::RatioZero(first - second)]
        }
        Predicate::AngleConst {
            points: [a, b, c, d],
            degrees,
        } => {
            let angle = state.dir(*a, *b)? - state.dir(*c, *d)?;
            vec![Fact::AngleZero(angle - AngleExpr::constant(half_turns(degrees)))]
        }
        Predicate::RatioConst {
            points: [a, b, c, d],
            ratio,
        } => {
            let r = state.log_len(*a, *b)? - state.log_len(*c, *d)?;
            vec![Fact::RatioZero(r - log_constant(ratio, pred)?)]
        }
        Predicate::AngleSum { terms, degrees } => {
            let mut sum = AngleExpr::constant(half_turns(degrees));
            for (k, a, b) in terms {
                sum = sum + state.dir(*a, *b)?.scaled(k);
            }
            vec![Fact::AngleZero(sum)]
        }
        Predicate::RatioProduct { terms, constant } => {
            let mut sum = log_constant(constant, pred)?;
            for (k, a, b) in terms {
                sum = sum + state.log_len(*a, *b)?.scaled(k);
            }
            vec![Fact::RatioZero(sum)]
        }
        Predicate::LengthSum { terms } => {
            let mut sum = LengthExpr::zero();
            for (k, a, b) in terms {
                sum = sum + state.len(*a, *b)?.scaled(k);
            }
            vec![Fact::LengthZero(sum)]
        }
        Predicate::Cyclic(points) => vec![Fact::Concyclic {
            points: points.clone(),
            centers: vec![],
        }],
        Predicate::CyclicWithCenters { centers, points } => {
            if state.oracle.distinct_triple(points).is_some() {
                vec![Fact::Concyclic {
                    points: points.clone(),
                    centers: centers.clone(),
                }]
            } else {
                // too few points to pin a circle: every point is equidistant from every center
                let (Some(&p0), Some(&c0)) = (points.first(), centers.first()) else {
                    return Ok(vec![]);
                };
                let radius = state.log_len(p0, c0)?;
                let mut facts = Vec::new();
                for &p in points {
                    for &c in centers {
                        facts.push(Fact::RatioZero(&radius - &state.log_len(p, c)?));
                    }
                }
                facts
            }
        }
        Predicate::Midpoint { mid, a, b } => vec![
            Fact::Collinear(vec![*mid, *a, *b]),
            Fact::RatioZero(state.log_len(*mid, *a)? - state.log_len(*mid, *b)?),
        ],
        Predicate::Overlap(a, b) => vec![Fact::SamePoint(*a, *b)],
        Predicate::AngleCompute(_) => {
            return Err(DdarError::InvalidPredicate(
                "acompute can only be used as a goal".to_string(),
            ))
        }
    };
    Ok(facts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CoordinateStore, Point2D, SymbolTable};
    use crate::oracle::Oracle;

    fn state() -> GeoState {
        let mut symbols = SymbolTable::new();
        let mut coords = CoordinateStore::new();
        for (name, x, y) in [("a", 0.0, 0.0), ("b", 2.0, 0.0), ("c", 0.0, 2.0), ("m", 1.0, 0.0)] {
            symbols.get_or_intern_point(name);
            coords.push(Point2D::new(x, y));
        }
        let labels = vec!["a".into(), "b".into(), "c".into(), "m".into()];
        GeoState::new(symbols, Oracle::new(coords, labels))
    }

    fn p(i: u32) -> PointId {
        PointId(i)
    }

    #[test]
    fn test_perpendicular_translates_to_angle_row() {
        let s = state();
        let facts = predicate_facts(&s, &Predicate::Perpendicular([p(0), p(1), p(0), p(2)])).unwrap();
        assert_eq!(facts.len(), 1);
        match &facts[0] {
            Fact::AngleZero(e) => assert!(s.angles.is_numerically_zero(e)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_midpoint_translates_to_two_facts() {
        let s = state();
        let facts = predicate_facts(&s, &Predicate::Midpoint { mid: p(3), a: p(0), b: p(1) }).unwrap();
        assert_eq!(facts.len(), 2);
        assert!(matches!(facts[0], Fact::Collinear(_)));
        match &facts[1] {
            Fact::RatioZero(e) => assert!(s.ratios.is_numerically_zero(e)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_ratio_constant_must_be_positive() {
        let s = state();
        let pred = Predicate::RatioConst {
            points: [p(0), p(1), p(0), p(3)],
            ratio: BigRational::from_integer(BigInt::from(-2)),
        };
        assert!(matches!(predicate_facts(&s, &pred), Err(DdarError::InvalidPredicate(_))));

        let pred = Predicate::RatioConst {
            points: [p(0), p(1), p(0), p(3)],
            ratio: BigRational::from_integer(BigInt::from(2)),
        };
        match &predicate_facts(&s, &pred).unwrap()[0] {
            Fact::RatioZero(e) => assert!(s.ratios.is_numerically_zero(e)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unfactorable_ratio_constant_is_rejected() {
        let s = state();
        let pred = Predicate::RatioConst {
            points: [p(0), p(1), p(0), p(3)],
            ratio: BigRational::from_integer(BigInt::from((1u64 << 61) - 1)),
        };
        match predicate_facts(&s, &pred) {
            Err(DdarError::InvalidPredicate(msg)) => assert!(msg.contains("unfactored cofactor"), "{}", msg),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_acompute_is_goal_only() {
        let s = state();
        let pred = Predicate::AngleCompute([p(0), p(1), p(0), p(2)]);
        assert!(predicate_facts(&s, &pred).is_err());
    }
}
