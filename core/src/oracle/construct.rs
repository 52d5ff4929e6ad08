//! Closed-form placement of constructed points

use super::Oracle;
use crate::error::ConstructionError;
use crate::ir::{ops, CoordinateStore, NumLine, Point2D, PointId};
use serde::{Deserialize, Serialize};

/// How a point's coordinate is obtained from earlier points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Construction {
    Free { x: f64, y: f64 },
    Midpoint(PointId, PointId),
    /// Perpendicular foot of `point` on line `a b`
    Foot { point: PointId, a: PointId, b: PointId },
    /// Line `a b` meets line `c d`
    Intersection([PointId; 4]),
    Circumcenter(PointId, PointId, PointId),
    /// Reflection of `point` over line `a b`
    Mirror { point: PointId, a: PointId, b: PointId },
    /// Second intersection of line `a b` with the circle centred at `center` through `a`
    LineCircle { a: PointId, b: PointId, center: PointId },
    /// Second intersection of the circles centred at `first` and `second` through `through`
    CircleCircle { first: PointId, second: PointId, through: PointId },
}

struct Placer<'a> {
    placed: &'a [Point2D],
    labels: &'a [String],
    scale: f64,
    target: PointId,
}

impl Placer<'_> {
    fn label(&self, p: PointId) -> String {
        self.labels
            .get(p.0 as usize)
            .cloned()
            .unwrap_or_else(|| p.to_string())
    }

    fn at(&self, p: PointId) -> Result<Point2D, ConstructionError> {
        if p >= self.target {
            return Err(ConstructionError::UndefinedPoint(self.label(p)));
        }
        self.placed
            .get(p.0 as usize)
            .copied()
            .ok_or_else(|| ConstructionError::UndefinedPoint(self.label(p)))
    }

    fn line(&self, a: PointId, b: PointId) -> Result<NumLine, ConstructionError> {
        let (pa, pb) = (self.at(a)?, self.at(b)?);
        if ops::is_zero(pa.distance(&pb), self.scale) {
            return Err(ConstructionError::CoincidentPoints(self.label(a), self.label(b)));
        }
        NumLine::through(pa, pb).ok_or_else(|| ConstructionError::CoincidentPoints(self.label(a), self.label(b)))
    }

    fn place(&self, step: &Construction) -> Result<Point2D, ConstructionError> {
        match *step {
            Construction::Free { x, y } => Ok(Point2D::new(x, y)),
            Construction::Midpoint(a, b) => Ok(self.at(a)?.midpoint(&self.at(b)?)),
            Construction::Foot { point, a, b } => Ok(self.line(a, b)?.foot(self.at(point)?)),
            Construction::Mirror { point, a, b } => {
                let p = self.at(point)?;
                let foot = self.line(a, b)?.foot(p);
                Ok(foot * 2.0 - p)
            }
            Construction::Intersection([a, b, c, d]) => {
                let (l1, l2) = (self.line(a, b)?, self.line(c, d)?);
                l1.intersect(&l2).ok_or_else(|| {
                    ConstructionError::ParallelLines(
                        format!("{}{}", self.label(a), self.label(b)),
                        format!("{}{}", self.label(c), self.label(d)),
                    )
                })
            }
            Construction::Circumcenter(a, b, c) => {
                let (pa, pb, pc) = (self.at(a)?, self.at(b)?, self.at(c)?);
                if ops::are_collinear(pa, pb, pc, self.scale) {
                    return Err(ConstructionError::CollinearPoints(self.label(a), self.label(b), self.label(c)));
                }
                crate::ir::NumCircle::through(pa, pb, pc)
                    .map(|circle| circle.center)
                    .ok_or_else(|| ConstructionError::CollinearPoints(self.label(a), self.label(b), self.label(c)))
            }
            Construction::LineCircle { a, b, center } => {
                let line = self.line(a, b)?;
                let (pa, o) = (self.at(a)?, self.at(center)?);
                if ops::is_zero(pa.distance(&o), self.scale) {
                    return Err(ConstructionError::ZeroRadius(self.label(center)));
                }
                // a + t·dir lies on the circle iff t² + 2t·dir·(a - o) = 0
                let t = -2.0 * line.dir.dot(&(pa - o));
                if ops::is_zero(t, self.scale) {
                    return Err(ConstructionError::Tangent(self.label(self.target)));
                }
                Ok(pa + line.dir * t)
            }
            Construction::CircleCircle { first, second, through } => {
                let (o1, p) = (self.at(first)?, self.at(through)?);
                if ops::is_zero(o1.distance(&p), self.scale) {
                    return Err(ConstructionError::ZeroRadius(self.label(first)));
                }
                let axis = self.line(first, second)?;
                if ops::is_zero(axis.distance(p), self.scale) {
                    return Err(ConstructionError::Tangent(self.label(self.target)));
                }
                Ok(axis.foot(p) * 2.0 - p)
            }
        }
    }
}

impl Oracle {
    /// Place every point in order; `steps[i]` constructs `PointId(i)`
    pub fn from_constructions(steps: &[Construction], labels: Vec<String>) -> Result<Oracle, ConstructionError> {
        // free points fix the scale used by degeneracy tests of later steps
        let mut free = CoordinateStore::new();
        for step in steps {
            if let Construction::Free { x, y } = *step {
                free.push(Point2D::new(x, y));
            }
        }
        let scale = free.diameter();

        let mut placed: Vec<Point2D> = Vec::with_capacity(steps.len());
        for (i, step) in steps.iter().enumerate() {
            let placer = Placer {
                placed: &placed,
                labels: &labels,
                scale,
                target: PointId(i as u32),
            };
            let p = placer.place(step)?;
            if !p.is_finite() {
                return Err(ConstructionError::NonFinite(placer.label(placer.target)));
            }
            placed.push(p);
        }

        let mut coords = CoordinateStore::new();
        for p in placed {
            coords.push(p);
        }
        Ok(Oracle::new(coords, labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("p{}", i)).collect()
    }

    fn free(x: f64, y: f64) -> Construction {
        Construction::Free { x, y }
    }

    fn close(a: Point2D, b: Point2D) -> bool {
        a.distance(&b) < 1e-9
    }

    #[test]
    fn test_basic_constructions() {
        let steps = vec![
            free(0.0, 0.0),
            free(4.0, 0.0),
            free(1.0, 3.0),
            Construction::Midpoint(PointId(0), PointId(1)),
            Construction::Foot { point: PointId(2), a: PointId(0), b: PointId(1) },
            Construction::Mirror { point: PointId(2), a: PointId(0), b: PointId(1) },
            Construction::Circumcenter(PointId(0), PointId(1), PointId(2)),
        ];
        let o = Oracle::from_constructions(&steps, labels(steps.len())).unwrap();

        assert!(close(o.coord(PointId(3)), Point2D::new(2.0, 0.0)));
        assert!(close(o.coord(PointId(4)), Point2D::new(1.0, 0.0)));
        assert!(close(o.coord(PointId(5)), Point2D::new(1.0, -3.0)));
        let center = o.coord(PointId(6));
        let r = center.distance(&o.coord(PointId(0)));
        assert!((center.distance(&o.coord(PointId(1))) - r).abs() < 1e-9);
        assert!((center.distance(&o.coord(PointId(2))) - r).abs() < 1e-9);
    }

    #[test]
    fn test_second_intersections() {
        let steps = vec![
            free(0.0, 0.0),
            free(1.0, 0.0),
            free(0.5, 0.0),
            free(-1.0, 0.0),
            // line 0-1 through circle at 3 radius 1 → meets again at (-2, 0)
            Construction::LineCircle { a: PointId(0), b: PointId(1), center: PointId(3) },
            free(0.5, 1.0),
            Construction::CircleCircle { first: PointId(0), second: PointId(1), through: PointId(5) },
        ];
        let o = Oracle::from_constructions(&steps, labels(steps.len())).unwrap();
        assert!(close(o.coord(PointId(4)), Point2D::new(-2.0, 0.0)));
        assert!(close(o.coord(PointId(6)), Point2D::new(0.5, -1.0)));
    }

    #[test]
    fn test_degenerate_constructions() {
        let parallel = vec![
            free(0.0, 0.0),
            free(1.0, 0.0),
            free(0.0, 1.0),
            free(1.0, 1.0),
            Construction::Intersection([PointId(0), PointId(1), PointId(2), PointId(3)]),
        ];
        assert!(matches!(
            Oracle::from_constructions(&parallel, labels(5)),
            Err(ConstructionError::ParallelLines(_, _))
        ));

        let collinear = vec![
            free(0.0, 0.0),
            free(1.0, 0.0),
            free(2.0, 0.0),
            Construction::Circumcenter(PointId(0), PointId(1), PointId(2)),
        ];
        assert!(matches!(
            Oracle::from_constructions(&collinear, labels(4)),
            Err(ConstructionError::CollinearPoints(_, _, _))
        ));

        let forward = vec![free(0.0, 0.0), Construction::Midpoint(PointId(0), PointId(2)), free(1.0, 1.0)];
        assert_eq!(
            Oracle::from_constructions(&forward, labels(3)).unwrap_err(),
            ConstructionError::UndefinedPoint("p2".into())
        );

        let zero = vec![free(0.0, 0.0), free(1.0, 0.0), Construction::LineCircle { a: PointId(0), b: PointId(1), center: PointId(0) }];
        assert_eq!(
            Oracle::from_constructions(&zero, labels(3)).unwrap_err(),
            ConstructionError::ZeroRadius("p0".into())
        );

        let nan = vec![free(f64::NAN, 0.0)];
        assert!(matches!(
            Oracle::from_constructions(&nan, labels(1)),
            Err(ConstructionError::NonFinite(_))
        ));
    }
}
