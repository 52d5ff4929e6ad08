//! Numeric coordinate oracle
//!
//! Holds one floating-point coordinate per point and evaluates predicates
//! with a tolerance. It never looks at symbolic state; the chainer uses it
//! to discard numerically false candidates, to validate premises, and to
//! re-check a goal the tables claim to have proven.

mod construct;

pub use crate::ir::ATOM;
pub use construct::Construction;

use crate::error::ConstructionError;
use crate::ir::{ops, CoordinateStore, NumCircle, NumLine, Point2D, PointId, Predicate};
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive};

#[derive(Debug, Clone)]
pub struct Oracle {
    coords: CoordinateStore,
    labels: Vec<String>,
    scale: f64,
}

type Check = Result<bool, ConstructionError>;

impl Oracle {
    /// Oracle over explicit coordinates; `labels[i]` names `PointId(i)`
    pub fn new(coords: CoordinateStore, labels: Vec<String>) -> Self {
        let scale = coords.diameter();
        Self {
            coords,
            labels,
            scale,
        }
    }

    pub fn num_points(&self) -> usize {
        self.coords.len()
    }

    /// Diameter of the point set; lengths are measured against it
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn label(&self, p: PointId) -> String {
        self.labels
            .get(p.0 as usize)
            .cloned()
            .unwrap_or_else(|| p.to_string())
    }

    pub fn coord(&self, p: PointId) -> Point2D {
        self.coords
            .get(p)
            .unwrap_or(Point2D::new(f64::NAN, f64::NAN))
    }

    pub fn distance(&self, a: PointId, b: PointId) -> f64 {
        self.coord(a).distance(&self.coord(b))
    }

    /// Direction of line `a b` in units of π, in `[0, 1)`
    pub fn direction(&self, a: PointId, b: PointId) -> f64 {
        (self.coord(b) - self.coord(a)).direction()
    }

    pub fn identical(&self, a: PointId, b: PointId) -> bool {
        a == b || ops::is_zero(self.distance(a, b), self.scale)
    }

    pub fn is_zero_length(&self, value: f64) -> bool {
        ops::is_zero(value, self.scale)
    }

    pub fn orientation(&self, a: PointId, b: PointId, c: PointId) -> i8 {
        ops::orientation(self.coord(a), self.coord(b), self.coord(c), self.scale)
    }

    /// Orientation of `a b` seen from an arbitrary location
    pub fn orientation_about(&self, a: PointId, b: PointId, center: Point2D) -> i8 {
        ops::orientation(self.coord(a), self.coord(b), center, self.scale)
    }

    pub fn line(&self, a: PointId, b: PointId) -> Option<NumLine> {
        if self.identical(a, b) {
            return None;
        }
        NumLine::through(self.coord(a), self.coord(b))
    }

    /// The two mutually farthest points of a set, found from its first point
    pub fn farthest_pair(&self, points: &[PointId]) -> Option<(PointId, PointId)> {
        let &first = points.first()?;
        let far = |from: PointId| {
            points
                .iter()
                .copied()
                .fold(from, |best, p| if self.distance(from, p) > self.distance(from, best) { p } else { best })
        };
        let b = far(first);
        let c = far(b);
        Some((b, c))
    }

    pub fn on_line(&self, line: &NumLine, p: PointId) -> bool {
        ops::is_zero(line.distance(self.coord(p)), self.scale)
    }

    pub fn on_circle(&self, circle: &NumCircle, p: PointId) -> bool {
        ops::is_zero(circle.distance(self.coord(p)), self.scale)
    }

    /// All points on one line; sets of coincident points count as collinear
    pub fn is_collinear(&self, points: &[PointId]) -> bool {
        match self.farthest_pair(points).and_then(|(b, c)| self.line(b, c)) {
            Some(line) => points.iter().all(|&p| self.on_line(&line, p)),
            None => true,
        }
    }

    /// First three mutually distinct points, in order
    pub fn distinct_triple(&self, points: &[PointId]) -> Option<[PointId; 3]> {
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

    /// Points on one circle whose center coincides with every given center
    pub fn is_concyclic(&self, points: &[PointId], centers: &[PointId]) -> bool {
        let Some([a, b, c]) = self.distinct_triple(points) else {
            return false;
        };
        let Some(circle) = NumCircle::through(self.coord(a), self.coord(b), self.coord(c)) else {
            return false;
        };
        points.iter().all(|&p| self.on_circle(&circle, p))
            && centers
                .iter()
                .all(|&o| self.is_zero_length(self.coord(o).distance(&circle.center)))
    }

    /// Triangles with proportional sides, matched vertex by vertex
    pub fn is_similar(&self, t1: [PointId; 3], t2: [PointId; 3]) -> bool {
        let sides = |t: [PointId; 3]| {
            [
                self.distance(t[0], t[1]),
                self.distance(t[1], t[2]),
                self.distance(t[2], t[0]),
            ]
        };
        let (s1, s2) = (sides(t1), sides(t2));
        if s1.iter().chain(s2.iter()).any(|&s| self.is_zero_length(s)) {
            return false;
        }
        let k = s1[0] / s2[0];
        (1..3).all(|i| is_zero_log((s1[i] / s2[i] / k).ln()))
    }

    fn require_distinct(&self, a: PointId, b: PointId) -> Result<(), ConstructionError> {
        if self.identical(a, b) {
            Err(ConstructionError::CoincidentPoints(self.label(a), self.label(b)))
        } else {
            Ok(())
        }
    }

    fn pair_direction(&self, a: PointId, b: PointId) -> Result<f64, ConstructionError> {
        self.require_distinct(a, b)?;
        Ok(self.direction(a, b))
    }

    fn pair_log(&self, a: PointId, b: PointId) -> Result<f64, ConstructionError> {
        self.require_distinct(a, b)?;
        Ok(self.distance(a, b).ln())
    }

    /// Evaluate a predicate on the diagram.
    ///
    /// Predicates that need two coincident points to be distinct are
    /// undefined and report a `ConstructionError`.
    pub fn evaluate(&self, pred: &Predicate) -> Check {
        match pred {
            Predicate::Collinear(points) => Ok(self.is_collinear(points)),
            Predicate::Parallel([a, b, c, d]) => {
                let x = self.pair_direction(*a, *b)? - self.pair_direction(*c, *d)?;
                Ok(ops::is_zero_angle(x))
            }
            Predicate::Perpendicular([a, b, c, d]) => {
                let x = self.pair_direction(*a, *b)? - self.pair_direction(*c, *d)? - 0.5;
                Ok(ops::is_zero_angle(x))
            }
            Predicate::Congruent([a, b, c, d]) => {
                self.require_distinct(*a, *b)?;
                self.require_distinct(*c, *d)?;
                Ok(self.is_zero_length(self.distance(*a, *b) - self.distance(*c, *d)))
            }
            Predicate::EqualAngle(p) => {
                let x = self.pair_direction(p[0], p[1])? - self.pair_direction(p[2], p[3])?
                    - self.pair_direction(p[4], p[5])?
                    + self.pair_direction(p[6], p[7])?;
                Ok(ops::is_zero_angle(x))
            }
            Predicate::EqualRatio(p) => {
                let x = self.pair_log(p[0], p[1])? - self.pair_log(p[2], p[3])? - self.pair_log(p[4], p[5])?
                    + self.pair_log(p[6], p[7])?;
                Ok(is_zero_log(x))
            }
            Predicate::AngleConst {
                points: [a, b, c, d],
                degrees,
            } => {
                let x = self.pair_direction(*a, *b)? - self.pair_direction(*c, *d)? - degrees_to_half_turns(degrees);
                Ok(ops::is_zero_angle(x))
            }
            Predicate::RatioConst {
                points: [a, b, c, d],
                ratio,
            } => {
                if !ratio.is_positive() {
                    return Ok(false);
                }
                let x = self.pair_log(*a, *b)? - self.pair_log(*c, *d)? - to_f64(ratio).ln();
                Ok(is_zero_log(x))
            }
            Predicate::AngleSum { terms, degrees } => {
                let mut x = degrees_to_half_turns(degrees);
                for (coef, a, b) in terms {
                    x += to_f64(coef) * self.pair_direction(*a, *b)?;
                }
                Ok(ops::is_zero_angle(x))
            }
            Predicate::RatioProduct { terms, constant } => {
                if !constant.is_positive() {
                    return Ok(false);
                }
                let mut x = to_f64(constant).ln();
                for (coef, a, b) in terms {
                    x += to_f64(coef) * self.pair_log(*a, *b)?;
                }
                Ok(is_zero_log(x))
            }
            Predicate::LengthSum { terms } => {
                let mut x = 0.0;
                for (coef, a, b) in terms {
                    self.require_distinct(*a, *b)?;
                    x += to_f64(coef) * self.distance(*a, *b);
                }
                Ok(self.is_zero_length(x))
            }
            Predicate::Cyclic(points) => {
                if self.distinct_triple(points).is_none() {
                    return Err(ConstructionError::TooFewPoints(format!("cyclic {}", self.labels_of(points))));
                }
                Ok(self.is_concyclic(points, &[]))
            }
            Predicate::CyclicWithCenters { centers, points } => {
                if self.distinct_triple(points).is_some() {
                    return Ok(self.is_concyclic(points, centers));
                }
                let (Some(&p0), Some(&c0)) = (points.first(), centers.first()) else {
                    return Ok(true);
                };
                let r = self.pair_log(p0, c0)?;
                for &p in points {
                    for &c in centers {
                        if !is_zero_log(self.pair_log(p, c)? - r) {
                            return Ok(false);
                        }
                    }
                }
                Ok(true)
            }
            Predicate::Midpoint { mid, a, b } => {
                self.require_distinct(*a, *b)?;
                let m = self.coord(*a).midpoint(&self.coord(*b));
                Ok(self.is_zero_length(self.coord(*mid).distance(&m)))
            }
            Predicate::Overlap(a, b) => Ok(self.identical(*a, *b)),
            Predicate::AngleCompute([a, b, c, d]) => {
                self.require_distinct(*a, *b)?;
                self.require_distinct(*c, *d)?;
                Ok(true)
            }
        }
    }

    fn labels_of(&self, points: &[PointId]) -> String {
        points.iter().map(|&p| self.label(p)).collect::<Vec<_>>().join(" ")
    }
}

fn is_zero_log(x: f64) -> bool {
    x * x < ATOM
}

fn to_f64(r: &BigRational) -> f64 {
    r.to_f64().unwrap_or(f64::NAN)
}

fn degrees_to_half_turns(degrees: &BigRational) -> f64 {
    to_f64(degrees) / 180.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn oracle(points: &[(f64, f64)]) -> Oracle {
        let mut coords = CoordinateStore::new();
        let mut labels = Vec::new();
        for (i, &(x, y)) in points.iter().enumerate() {
            coords.push(Point2D::new(x, y));
            labels.push(format!("p{}", i));
        }
        Oracle::new(coords, labels)
    }

    fn p(i: u32) -> PointId {
        PointId(i)
    }

    #[test]
    fn test_scale_is_diameter() {
        let o = oracle(&[(0.0, 0.0), (3.0, 4.0), (1.0, 1.0)]);
        assert_eq!(o.scale(), 5.0);
        assert_eq!(oracle(&[(2.0, 2.0)]).scale(), 1.0);
    }

    #[test]
    fn test_parallel_and_perpendicular() {
        let o = oracle(&[(0.0, 0.0), (1.0, 0.0), (2.0, -1.0), (2.0, 1.0), (3.0, 0.5), (5.0, 0.5)]);
        assert!(o.evaluate(&Predicate::Perpendicular([p(0), p(1), p(2), p(3)])).unwrap());
        assert!(o.evaluate(&Predicate::Parallel([p(0), p(1), p(5), p(4)])).unwrap());
        assert!(!o.evaluate(&Predicate::Parallel([p(0), p(1), p(2), p(3)])).unwrap());
    }

    #[test]
    fn test_coincident_pair_is_construction_error() {
        let o = oracle(&[(0.0, 0.0), (0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        let err = o.evaluate(&Predicate::Perpendicular([p(0), p(1), p(2), p(3)])).unwrap_err();
        assert_eq!(err, ConstructionError::CoincidentPoints("p0".into(), "p1".into()));
        assert!(o.evaluate(&Predicate::Overlap(p(0), p(1))).unwrap());
    }

    #[test]
    fn test_constants() {
        let o = oracle(&[(0.0, 0.0), (2.0, 0.0), (0.0, 0.0), (1.0, 3f64.sqrt())]);
        let sixty = Predicate::AngleConst {
            points: [p(2), p(3), p(0), p(1)],
            degrees: BigRational::from_integer(BigInt::from(60)),
        };
        assert!(o.evaluate(&sixty).unwrap());

        let ratio = Predicate::RatioConst {
            points: [p(0), p(1), p(2), p(3)],
            ratio: BigRational::from_integer(BigInt::from(1)),
        };
        assert!(o.evaluate(&ratio).unwrap());
    }

    #[test]
    fn test_concyclic_with_center() {
        let o = oracle(&[(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0), (0.0, 0.0), (0.5, 0.5)]);
        assert!(o.is_concyclic(&[p(0), p(1), p(2), p(3)], &[p(4)]));
        assert!(!o.is_concyclic(&[p(0), p(1), p(2), p(5)], &[]));
        assert!(!o.is_concyclic(&[p(0), p(1), p(2)], &[p(5)]));
        assert!(o.evaluate(&Predicate::Cyclic(vec![p(0), p(0), p(1)])).is_err());
    }

    #[test]
    fn test_similar() {
        let o = oracle(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (5.0, 5.0), (7.0, 5.0), (5.0, 7.0)]);
        assert!(o.is_similar([p(0), p(1), p(2)], [p(3), p(4), p(5)]));
        assert!(!o.is_similar([p(0), p(1), p(2)], [p(4), p(3), p(5)]));
    }
}
