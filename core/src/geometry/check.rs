//! Geometric detection and checking
//!
//! Symbolic queries answer from the registry and the elimination tables;
//! `admits` answers from the numeric oracle alone.

use super::normalize::{canonical_points, predicate_facts};
use crate::algebra::AngleExpr;
use crate::error::{ConstructionError, DdarResult};
use crate::ir::{Fact, GeoState, PointId, Predicate};
use num_bigint::BigInt;
use num_rational::BigRational;

/// Detection operations on geometric states
pub trait Detect {
    /// All points are known to lie on one line
    fn check_collinear(&self, points: &[PointId]) -> bool;

    /// All points are known to lie on one circle centred at every center.
    ///
    /// Fails when fewer than three points are numerically distinct.
    fn check_concyclic(&self, points: &[PointId], centers: &[PointId]) -> DdarResult<bool>;

    /// The two points were merged
    fn check_equal_points(&self, a: PointId, b: PointId) -> bool;

    /// The fact is already entailed by the registry and tables
    fn holds(&self, fact: &Fact) -> DdarResult<bool>;

    /// The fact is numerically true on the diagram
    fn admits(&self, fact: &Fact) -> bool;

    /// The predicate is symbolically entailed
    fn check_pred(&self, pred: &Predicate) -> DdarResult<bool>;

    /// Angle from `c d` to `a b` in degrees, when the tables fix it
    fn compute_angle(&self, points: [PointId; 4]) -> DdarResult<Option<BigRational>>;

    /// The goal, if any, is symbolically entailed
    fn is_goal_satisfied(&self) -> DdarResult<bool>;
}

impl GeoState {
    /// First three points that are pairwise distinct in the current state
    pub(crate) fn distinct_triple(&self, points: &[PointId]) -> Option<[PointId; 3]> {
        let mut picked: Vec<PointId> = Vec::with_capacity(3);
        for &p in points {
            if picked.iter().all(|&q| !self.identical(p, q)) {
                picked.push(p);
                if picked.len() == 3 {
                    return Some([picked[0], picked[1], picked[2]]);
                }
            }
        }
        None
    }

    /// Inscribed angle over the arc `a b`, seen from a defining point of the circle
    pub(crate) fn arc(&self, defining: &[PointId; 3], a: PointId, b: PointId) -> DdarResult<AngleExpr> {
        let c = defining
            .iter()
            .copied()
            .find(|&c| !self.identical(a, c) && !self.identical(b, c))
            .ok_or_else(|| ConstructionError::CoincidentPoints(self.label(a), self.label(b)))?;
        Ok(self.dir(b, c)? - self.dir(a, c)?)
    }
}

impl Detect for GeoState {
    fn check_collinear(&self, points: &[PointId]) -> bool {
        let points = canonical_points(self, points);
        for (i, &a) in points.iter().enumerate() {
            for &b in &points[i + 1..] {
                if let Some(line) = self.registry.line_of(a, b).and_then(|id| self.registry.line(id)) {
                    return points.iter().all(|p| line.points.contains(p));
                }
            }
        }
        false
    }

    fn check_concyclic(&self, points: &[PointId], centers: &[PointId]) -> DdarResult<bool> {
        let points = canonical_points(self, points);
        let centers = canonical_points(self, centers);
        let Some([a, b, c]) = self.distinct_triple(&points) else {
            let labels: Vec<String> = points.iter().map(|&p| self.label(p)).collect();
            return Err(ConstructionError::TooFewPoints(format!("cyclic {}", labels.join(" "))).into());
        };
        let Some(circle) = self
            .registry
            .circle_through(a, b, c)
            .and_then(|id| self.registry.circle(id))
        else {
            return Ok(false);
        };
        Ok(centers.iter().all(|o| circle.centers.contains(o)) && points.iter().all(|p| circle.points.contains(p)))
    }

    fn check_equal_points(&self, a: PointId, b: PointId) -> bool {
        self.registry.same_point(a, b)
    }

    fn holds(&self, fact: &Fact) -> DdarResult<bool> {
        Ok(match fact {
            Fact::Collinear(points) => self.check_collinear(points),
            Fact::Concyclic { points, centers } => self.check_concyclic(points, centers)?,
            Fact::Similar(t1, t2) => {
                let rep = |t: &[PointId; 3]| t.map(|p| self.registry.point_rep(p));
                self.known_similar.contains(&(rep(t1), rep(t2)))
            }
            Fact::SamePoint(a, b) => self.check_equal_points(*a, *b),
            Fact::AngleZero(e) => self.angles.is_zero(e),
            Fact::RatioZero(e) => self.ratios.is_zero(e),
            Fact::LengthZero(e) => self.lengths.is_zero(e),
        })
    }

    fn admits(&self, fact: &Fact) -> bool {
        match fact {
            Fact::Collinear(points) => self.oracle.is_collinear(points),
            Fact::Concyclic { points, centers } => self.oracle.is_concyclic(points, centers),
            Fact::Similar(t1, t2) => self.oracle.is_similar(*t1, *t2),
            Fact::SamePoint(a, b) => self.oracle.identical(*a, *b),
            Fact::AngleZero(e) => self.angles.is_numerically_zero(e),
            Fact::RatioZero(e) => self.ratios.is_numerically_zero(e),
            Fact::LengthZero(e) => self.lengths.is_numerically_zero(e),
        }
    }

    fn check_pred(&self, pred: &Predicate) -> DdarResult<bool> {
        match pred {
            Predicate::AngleCompute(points) => Ok(self.compute_angle(*points)?.is_some()),
            Predicate::Cyclic(points) => self.check_concyclic(points, &[]),
            Predicate::CyclicWithCenters { centers, points } if self.distinct_triple(points).is_some() => {
                self.check_concyclic(points, centers)
            }
            Predicate::Overlap(a, b) => Ok(self.check_equal_points(*a, *b)),
            _ => {
                for fact in predicate_facts(self, pred)? {
                    if !self.holds(&fact)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    fn compute_angle(&self, [a, b, c, d]: [PointId; 4]) -> DdarResult<Option<BigRational>> {
        let angle = self.dir(a, b)? - self.dir(c, d)?;
        let reduced = self.angles.reduce(&angle);
        Ok(reduced
            .as_constant()
            .map(|half_turns| half_turns * BigRational::from_integer(BigInt::from(180))))
    }

    fn is_goal_satisfied(&self) -> DdarResult<bool> {
        match &self.goal {
            Some(goal) => self.check_pred(&goal.target),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DdarError;
    use crate::ir::{CoordinateStore, Point2D, SymbolTable};
    use crate::oracle::Oracle;

    fn state(points: &[(&str, f64, f64)]) -> GeoState {
        let mut symbols = SymbolTable::new();
        let mut coords = CoordinateStore::new();
        for &(name, x, y) in points {
            symbols.get_or_intern_point(name);
            coords.push(Point2D::new(x, y));
        }
        let labels = points.iter().map(|p| p.0.to_string()).collect();
        GeoState::new(symbols, Oracle::new(coords, labels))
    }

    fn p(i: u32) -> PointId {
        PointId(i)
    }

    #[test]
    fn test_fresh_state_knows_only_pairs() {
        let s = state(&[("a", 0.0, 0.0), ("b", 1.0, 0.0), ("c", 2.0, 0.0), ("d", 0.0, 1.0)]);
        assert!(s.check_collinear(&[p(0), p(1)]));
        assert!(!s.check_collinear(&[p(0), p(1), p(2)]));
        assert!(s.admits(&Fact::Collinear(vec![p(0), p(1), p(2)])));
        assert!(!s.admits(&Fact::Collinear(vec![p(0), p(1), p(3)])));
        assert!(!s.check_concyclic(&[p(0), p(1), p(3)], &[]).unwrap());
    }

    #[test]
    fn test_concyclic_needs_three_points() {
        let s = state(&[("a", 0.0, 0.0), ("b", 1.0, 0.0), ("c", 0.0, 0.0)]);
        let err = s.check_concyclic(&[p(0), p(1), p(2)], &[]).unwrap_err();
        assert!(matches!(err, DdarError::Construction(ConstructionError::TooFewPoints(_))));
    }

    #[test]
    fn test_compute_angle_reads_reduced_constant() {
        let mut s = state(&[("a", 0.0, 0.0), ("b", 1.0, 0.0), ("c", 0.0, 1.0)]);
        let goal = [p(0), p(2), p(0), p(1)];
        assert_eq!(s.compute_angle(goal).unwrap(), None);

        let perp = s.dir(p(0), p(2)).unwrap() - s.dir(p(0), p(1)).unwrap() - AngleExpr::right();
        s.angles.insert(&perp).unwrap();
        assert_eq!(
            s.compute_angle(goal).unwrap(),
            Some(BigRational::from_integer(BigInt::from(90)))
        );
        assert!(s.check_pred(&Predicate::AngleCompute(goal)).unwrap());
        assert!(s.check_pred(&Predicate::Perpendicular(goal)).unwrap());
    }
}
