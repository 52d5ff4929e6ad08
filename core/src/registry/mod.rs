//! Geometric object registry
//!
//! Union-find identity over points, lines and circles. Lookups go through
//! `find`, so every merge is visible to every later query regardless of the
//! order merges happened in. Object data lives only at representatives.

mod union_find;

pub use union_find::UnionFind;

use crate::algebra::AngleExpr;
use crate::error::{DdarError, DdarResult};
use crate::ir::{CircleId, LineId, NumCircle, NumLine, PointId};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

/// A maximal known set of collinear points
#[derive(Debug, Clone)]
pub struct LineData {
    pub points: Vec<PointId>,
    /// The pair whose direction symbol names the line
    pub main_pair: (PointId, PointId),
    pub direction: AngleExpr,
    pub value: NumLine,
}

/// A maximal known set of concyclic points
#[derive(Debug, Clone)]
pub struct CircleData {
    /// Three pairwise-distinct points fixing the circle
    pub defining: [PointId; 3],
    pub points: Vec<PointId>,
    pub centers: Vec<PointId>,
    pub value: NumCircle,
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    points: UnionFind,
    active: Vec<PointId>,
    distinct: FxHashSet<(PointId, PointId)>,
    lines: UnionFind,
    line_data: Vec<Option<LineData>>,
    pair_line: FxHashMap<(PointId, PointId), LineId>,
    circles: UnionFind,
    circle_data: Vec<Option<CircleData>>,
    triple_circle: FxHashMap<[PointId; 3], CircleId>,
}

fn ordered(a: PointId, b: PointId) -> (PointId, PointId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- points -------------------------------------------------------

    pub fn add_point(&mut self) -> PointId {
        let id = PointId(self.points.push() as u32);
        self.active.push(id);
        id
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn point_rep(&self, p: PointId) -> PointId {
        PointId(self.points.find(p.0 as usize) as u32)
    }

    pub fn same_point(&self, a: PointId, b: PointId) -> bool {
        self.points.same(a.0 as usize, b.0 as usize)
    }

    /// Points that have not been merged into another, in creation order
    pub fn active_points(&self) -> &[PointId] {
        &self.active
    }

    /// Record that `a` and `b` must never be merged
    pub fn assert_distinct(&mut self, a: PointId, b: PointId) {
        let (a, b) = (self.point_rep(a), self.point_rep(b));
        self.distinct.insert(ordered(a, b));
    }

    pub fn are_distinct(&self, a: PointId, b: PointId) -> bool {
        let (a, b) = (self.point_rep(a), self.point_rep(b));
        self.distinct.contains(&ordered(a, b))
    }

    /// Identify `absorb` with `keep`.
    ///
    /// Lines and circles are expected to already contain `keep` wherever
    /// they contain `absorb`; the absorbed point is dropped from their
    /// membership and from the active list.
    pub fn merge_points(&mut self, keep: PointId, absorb: PointId) -> DdarResult<bool> {
        let (keep, absorb) = (self.point_rep(keep), self.point_rep(absorb));
        if keep == absorb {
            return Ok(false);
        }
        if self.distinct.contains(&ordered(keep, absorb)) {
            return Err(DdarError::Contradiction(format!(
                "{} and {} were asserted distinct but are proven equal",
                keep, absorb
            )));
        }

        self.points.union_into(keep.0 as usize, absorb.0 as usize);
        self.active.retain(|&p| p != absorb);

        let inherited: Vec<_> = self
            .distinct
            .iter()
            .filter_map(|&(x, y)| {
                if x == absorb {
                    Some(ordered(keep, y))
                } else if y == absorb {
                    Some(ordered(x, keep))
                } else {
                    None
                }
            })
            .collect();
        self.distinct.extend(inherited);

        for line in self.line_data.iter_mut().flatten() {
            line.points.retain(|&p| p != absorb);
            if line.main_pair.0 == absorb {
                line.main_pair.0 = keep;
            }
            if line.main_pair.1 == absorb {
                line.main_pair.1 = keep;
            }
        }
        for circle in self.circle_data.iter_mut().flatten() {
            circle.points.retain(|&p| p != absorb);
            for c in circle.centers.iter_mut() {
                if *c == absorb {
                    *c = keep;
                }
            }
            circle.centers.sort();
            circle.centers.dedup();
            for d in circle.defining.iter_mut() {
                if *d == absorb {
                    *d = keep;
                }
            }
        }

        debug!(keep = keep.0, absorb = absorb.0, "merged points");
        Ok(true)
    }

    pub fn point_merges(&self) -> usize {
        self.points.merge_count()
    }

    // ---- lines --------------------------------------------------------

    /// Register the two-point line of a pair
    pub fn new_line(&mut self, a: PointId, b: PointId, direction: AngleExpr, value: NumLine) -> LineId {
        let id = LineId(self.lines.push() as u32);
        self.line_data.push(Some(LineData {
            points: vec![a, b],
            main_pair: (a, b),
            direction,
            value,
        }));
        self.pair_line.insert(ordered(a, b), id);
        id
    }

    fn line_rep(&self, id: LineId) -> LineId {
        LineId(self.lines.find(id.0 as usize) as u32)
    }

    /// The line currently holding the pair `a b`
    pub fn line_of(&self, a: PointId, b: PointId) -> Option<LineId> {
        let key = ordered(self.point_rep(a), self.point_rep(b));
        self.pair_line.get(&key).map(|&id| self.line_rep(id))
    }

    pub fn line(&self, id: LineId) -> Option<&LineData> {
        self.line_data
            .get(self.line_rep(id).0 as usize)
            .and_then(Option::as_ref)
    }

    /// Fold `absorbed` into `main` and install the merged data
    pub fn merge_lines(&mut self, main: LineId, absorbed: &[LineId], data: LineData) -> LineId {
        let main = self.line_rep(main);
        for &other in absorbed {
            let other = self.line_rep(other);
            if other != main {
                self.lines.union_into(main.0 as usize, other.0 as usize);
                self.line_data[other.0 as usize] = None;
            }
        }
        self.line_data[main.0 as usize] = Some(data);
        main
    }

    /// Representative lines, in creation order
    pub fn live_lines(&self) -> impl Iterator<Item = (LineId, &LineData)> {
        self.line_data
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.as_ref().map(|d| (LineId(i as u32), d)))
    }

    // ---- circles ------------------------------------------------------

    /// Create a circle absorbing `absorbed` and index it by `triples`
    pub fn new_circle(
        &mut self,
        data: CircleData,
        absorbed: &[CircleId],
        triples: impl IntoIterator<Item = [PointId; 3]>,
    ) -> CircleId {
        let id = CircleId(self.circles.push() as u32);
        self.circle_data.push(Some(data));
        for &other in absorbed {
            let other = self.circle_rep(other);
            if other != id {
                self.circles.union_into(id.0 as usize, other.0 as usize);
                self.circle_data[other.0 as usize] = None;
            }
        }
        for mut t in triples {
            t.sort();
            self.triple_circle.insert(t, id);
        }
        id
    }

    fn circle_rep(&self, id: CircleId) -> CircleId {
        CircleId(self.circles.find(id.0 as usize) as u32)
    }

    /// The circle through three points, if one is known
    pub fn circle_through(&self, a: PointId, b: PointId, c: PointId) -> Option<CircleId> {
        let mut key = [self.point_rep(a), self.point_rep(b), self.point_rep(c)];
        key.sort();
        self.triple_circle.get(&key).map(|&id| self.circle_rep(id))
    }

    pub fn circle(&self, id: CircleId) -> Option<&CircleData> {
        self.circle_data
            .get(self.circle_rep(id).0 as usize)
            .and_then(Option::as_ref)
    }

    /// Representative circles, in creation order
    pub fn live_circles(&self) -> impl Iterator<Item = (CircleId, &CircleData)> {
        self.circle_data
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.as_ref().map(|d| (CircleId(i as u32), d)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Point2D;

    fn line_value() -> NumLine {
        NumLine::through(Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0)).unwrap()
    }

    #[test]
    fn test_point_merge_is_transitive() {
        let mut reg = Registry::new();
        let a = reg.add_point();
        let b = reg.add_point();
        let c = reg.add_point();

        reg.merge_points(a, b).unwrap();
        reg.merge_points(b, c).unwrap();
        assert!(reg.same_point(a, c));
        assert_eq!(reg.active_points(), &[a]);
        assert!(!reg.merge_points(c, a).unwrap());
    }

    #[test]
    fn test_merging_distinct_points_is_contradiction() {
        let mut reg = Registry::new();
        let a = reg.add_point();
        let b = reg.add_point();
        let c = reg.add_point();
        reg.assert_distinct(a, c);

        reg.merge_points(b, a).unwrap();
        let err = reg.merge_points(c, b).unwrap_err();
        assert!(matches!(err, DdarError::Contradiction(_)));
    }

    #[test]
    fn test_line_lookup_through_merges() {
        let mut reg = Registry::new();
        let a = reg.add_point();
        let b = reg.add_point();
        let c = reg.add_point();
        let ab = reg.new_line(a, b, AngleExpr::zero(), line_value());
        let bc = reg.new_line(b, c, AngleExpr::zero(), line_value());

        let data = LineData {
            points: vec![a, b, c],
            main_pair: (a, b),
            direction: AngleExpr::zero(),
            value: line_value(),
        };
        let merged = reg.merge_lines(ab, &[bc], data);

        assert_eq!(reg.line_of(c, b), Some(merged));
        assert_eq!(reg.line(bc).map(|l| l.points.len()), Some(3));
        assert_eq!(reg.live_lines().count(), 1);
    }

    #[test]
    fn test_circle_lookup_is_order_free() {
        let mut reg = Registry::new();
        let pts: Vec<_> = (0..4).map(|_| reg.add_point()).collect();
        let data = CircleData {
            defining: [pts[0], pts[1], pts[2]],
            points: pts.clone(),
            centers: vec![],
            value: NumCircle::new(Point2D::new(0.0, 0.0), 1.0),
        };
        let id = reg.new_circle(data, &[], vec![[pts[2], pts[0], pts[1]]]);

        assert_eq!(reg.circle_through(pts[1], pts[2], pts[0]), Some(id));
        assert_eq!(reg.circle_through(pts[1], pts[2], pts[3]), None);
    }
}
