//! Geometric constructions
//!
//! Assert facts into the registry and the elimination tables. Every `force_*`
//! operation is idempotent: it returns `Ok(false)` when the fact was already
//! known and leaves the state untouched.

use super::normalize::{canonical_points, predicate_facts};
use crate::algebra::LengthExpr;
use crate::error::{ConstructionError, DdarError, DdarResult};
use crate::ir::{similar_permutations, CircleId, Fact, GeoState, LineId, NumCircle, PointId, Predicate, Provenance};
use crate::registry::{CircleData, LineData};
use rustc_hash::FxHashSet;
use tracing::debug;

/// Assertion operations on geometric states
pub trait Construct {
    /// Assert every kernel fact of a surface predicate
    fn force_pred(&mut self, pred: &Predicate, provenance: Provenance) -> DdarResult<bool>;

    /// Assert one kernel fact without recording it
    fn force_fact(&mut self, fact: &Fact) -> DdarResult<bool>;

    /// Assert a fact and record it in the fact store
    fn assert_fact(&mut self, fact: Fact, provenance: Provenance) -> DdarResult<bool>;

    /// Require two points to stay distinct for the rest of the run
    fn force_distinct(&mut self, a: PointId, b: PointId) -> DdarResult<()>;

    fn force_collinear(&mut self, points: &[PointId]) -> DdarResult<bool>;

    fn force_concyclic(&mut self, points: &[PointId], centers: &[PointId]) -> DdarResult<bool>;

    /// Triangles similar with vertices matched in order
    fn force_similar(&mut self, t1: [PointId; 3], t2: [PointId; 3]) -> DdarResult<bool>;

    /// Merge `b` into `a`
    fn force_equal_points(&mut self, a: PointId, b: PointId) -> DdarResult<bool>;
}

fn labels(state: &GeoState, points: &[PointId]) -> String {
    points.iter().map(|&p| state.label(p)).collect::<Vec<_>>().join(" ")
}

impl Construct for GeoState {
    fn force_pred(&mut self, pred: &Predicate, provenance: Provenance) -> DdarResult<bool> {
        let mut changed = false;
        for fact in predicate_facts(self, pred)? {
            changed |= self.assert_fact(fact, provenance)?;
        }
        Ok(changed)
    }

    fn force_fact(&mut self, fact: &Fact) -> DdarResult<bool> {
        match fact {
            Fact::Collinear(points) => self.force_collinear(points),
            Fact::Concyclic { points, centers } => self.force_concyclic(points, centers),
            Fact::Similar(t1, t2) => self.force_similar(*t1, *t2),
            Fact::SamePoint(a, b) => self.force_equal_points(*a, *b),
            Fact::AngleZero(e) => Ok(self.angles.insert(e)?),
            Fact::RatioZero(e) => Ok(self.ratios.insert(e)?),
            Fact::LengthZero(e) => Ok(self.lengths.insert(e)?),
        }
    }

    fn assert_fact(&mut self, fact: Fact, provenance: Provenance) -> DdarResult<bool> {
        let changed = self.force_fact(&fact)?;
        if changed || provenance == Provenance::Premise {
            debug!(fact = %fact, ?provenance, changed, "asserted");
            self.facts.insert_with_provenance(fact, provenance);
        }
        Ok(changed)
    }

    fn force_distinct(&mut self, a: PointId, b: PointId) -> DdarResult<()> {
        if self.oracle.identical(a, b) {
            return Err(ConstructionError::CoincidentPoints(self.label(a), self.label(b)).into());
        }
        self.registry.assert_distinct(a, b);
        Ok(())
    }

    fn force_collinear(&mut self, points: &[PointId]) -> DdarResult<bool> {
        let points = canonical_points(self, points);
        if points.len() < 2 {
            return Ok(false);
        }
        let Some((b, c)) = self.oracle.farthest_pair(&points) else {
            return Ok(false);
        };
        let main_id = self
            .registry
            .line_of(b, c)
            .ok_or_else(|| ConstructionError::CoincidentPoints(self.label(b), self.label(c)))?;
        let Some(main) = self.registry.line(main_id).cloned() else {
            return Ok(false);
        };
        if !points.iter().all(|&p| self.oracle.on_line(&main.value, p)) {
            return Err(DdarError::Contradiction(format!(
                "points not numerically collinear: {}",
                labels(self, &points)
            )));
        }
        if points.iter().all(|p| main.points.contains(p)) {
            return Ok(false);
        }

        // every line through two of the points joins the merged line
        let mut stack = points;
        let mut members = main.points.clone();
        let mut member_set: FxHashSet<PointId> = members.iter().copied().collect();
        let mut lines: Vec<LineId> = vec![main_id];
        let mut line_set: FxHashSet<LineId> = lines.iter().copied().collect();
        let mut directions = Vec::new();
        while let Some(x) = stack.pop() {
            if member_set.contains(&x) {
                continue;
            }
            for i in 0..members.len() {
                let y = members[i];
                if self.identical(x, y) {
                    continue;
                }
                let Some(id) = self.registry.line_of(x, y) else {
                    continue;
                };
                if !line_set.insert(id) {
                    continue;
                }
                if let Some(line) = self.registry.line(id) {
                    stack.extend(line.points.iter().copied());
                    directions.push(line.direction.clone());
                }
                lines.push(id);
            }
            members.push(x);
            member_set.insert(x);
        }

        let coord = |p: PointId| main.value.position(self.oracle.coord(p));
        members.sort_by(|&p, &q| coord(p).total_cmp(&coord(q)));

        // signed positions along the line, measured from its first point
        let first = members[0];
        let last = members[members.len() - 1];
        for (i, &p) in members.iter().enumerate().skip(1) {
            for &q in &members[i + 1..] {
                if self.identical(p, q) {
                    continue;
                }
                let position = |x: PointId| -> DdarResult<LengthExpr> {
                    if self.identical(first, x) {
                        Ok(self.len(first, last)? - self.len(last, x)?)
                    } else {
                        self.len(first, x)
                    }
                };
                let segment = position(p)? + self.len(p, q)? - position(q)?;
                self.lengths.insert(&segment)?;
            }
        }

        for direction in directions {
            self.angles.insert(&(&main.direction - &direction))?;
        }

        debug!(line = %main_id, merged = lines.len() - 1, points = members.len(), "merged lines");
        let data = LineData {
            points: members,
            main_pair: main.main_pair,
            direction: main.direction,
            value: main.value,
        };
        self.registry.merge_lines(main_id, &lines[1..], data);
        Ok(true)
    }

    fn force_concyclic(&mut self, points: &[PointId], centers: &[PointId]) -> DdarResult<bool> {
        let mut stack = canonical_points(self, points);
        let mut centers = canonical_points(self, centers);
        let mut members: Vec<PointId> = Vec::new();
        let mut member_set: FxHashSet<PointId> = FxHashSet::default();
        let mut circles: Vec<CircleId> = Vec::new();
        let mut circle_set: FxHashSet<CircleId> = FxHashSet::default();

        while let Some(a) = stack.pop() {
            if member_set.contains(&a) {
                continue;
            }
            for i in 0..members.len() {
                for j in i + 1..members.len() {
                    let (b, c) = (members[i], members[j]);
                    if self.identical(a, b) || self.identical(a, c) || self.identical(b, c) {
                        continue;
                    }
                    let Some(id) = self.registry.circle_through(a, b, c) else {
                        continue;
                    };
                    if circle_set.contains(&id) {
                        continue;
                    }
                    let Some(circle) = self.registry.circle(id) else {
                        continue;
                    };
                    if circles.is_empty() {
                        let covered = members
                            .iter()
                            .chain(stack.iter())
                            .chain(std::iter::once(&a))
                            .all(|p| circle.points.contains(p));
                        if covered && centers.iter().all(|o| circle.centers.contains(o)) {
                            return Ok(false);
                        }
                    }
                    stack.extend(circle.points.iter().copied());
                    circles.push(id);
                    circle_set.insert(id);
                }
            }
            members.push(a);
            member_set.insert(a);
        }

        let (defining, value) = match circles.first().and_then(|&id| self.registry.circle(id)) {
            Some(circle) => (circle.defining, circle.value),
            None => {
                let defining = self
                    .distinct_triple(&members)
                    .ok_or_else(|| ConstructionError::TooFewPoints(format!("cyclic {}", labels(self, &members))))?;
                let value = match centers.first() {
                    Some(&o) => {
                        let radius = self.oracle.distance(o, members[0]);
                        if self.oracle.is_zero_length(radius) {
                            return Err(ConstructionError::ZeroRadius(self.label(o)).into());
                        }
                        NumCircle::new(self.oracle.coord(o), radius)
                    }
                    None => {
                        let [a, b, c] = defining;
                        NumCircle::through(self.oracle.coord(a), self.oracle.coord(b), self.oracle.coord(c))
                            .ok_or_else(|| ConstructionError::CollinearPoints(self.label(a), self.label(b), self.label(c)))?
                    }
                };
                (defining, value)
            }
        };

        if !members.iter().all(|&p| self.oracle.on_circle(&value, p)) {
            let mut message = format!("points not numerically concyclic: {}", labels(self, &members));
            if !centers.is_empty() {
                message.push_str(&format!(" centers {}", labels(self, &centers)));
            }
            return Err(DdarError::Contradiction(message));
        }

        for &id in &circles {
            if let Some(circle) = self.registry.circle(id) {
                centers.extend(circle.centers.iter().copied());
            }
        }
        centers.sort();
        centers.dedup();

        // inscribed angles over every chord
        let [_, b, c] = defining;
        for (i, &p) in members.iter().enumerate() {
            for &q in &members[i + 1..] {
                if self.identical(p, q) {
                    continue;
                }
                let (x, y) = if defining.contains(&p) { (q, p) } else { (p, q) };
                if defining.contains(&x) {
                    continue;
                }
                let y2 = if self.identical(x, c) { b } else { c };
                let angle = self.dir(x, y2)? - self.dir(x, y)?;
                let arc = self.arc(&defining, y, y2)?;
                self.angles.insert(&(angle - arc))?;
            }
        }

        if let Some(&center) = centers.first() {
            let radius = self.log_len(members[0], center)?;
            for &x in &members[1..] {
                let other = self.log_len(x, center)?;
                self.ratios.insert(&(&radius - &other))?;
            }
        }

        let mut triples = Vec::new();
        for (i, &x) in members.iter().enumerate() {
            for (j, &y) in members.iter().enumerate().skip(i + 1) {
                if self.identical(x, y) {
                    continue;
                }
                for &z in &members[j + 1..] {
                    if !self.identical(x, z) && !self.identical(y, z) {
                        triples.push([x, y, z]);
                    }
                }
            }
        }

        debug!(merged = circles.len(), points = members.len(), centers = centers.len(), "new circle");
        let data = CircleData {
            defining,
            points: members,
            centers,
            value,
        };
        self.registry.new_circle(data, &circles, triples);
        Ok(true)
    }

    fn force_similar(&mut self, t1: [PointId; 3], t2: [PointId; 3]) -> DdarResult<bool> {
        let t1 = t1.map(|p| self.registry.point_rep(p));
        let t2 = t2.map(|p| self.registry.point_rep(p));
        if self.known_similar.contains(&(t1, t2)) {
            return Ok(false);
        }

        let [a, b, c] = t1;
        let [x, y, z] = t2;
        let t1_ang1 = self.angle_between(a, b, a, c)?;
        let t1_ang2 = self.angle_between(a, b, b, c)?;
        let t1_rat1 = self.ratio_between(a, b, a, c)?;
        let t1_rat2 = self.ratio_between(a, b, b, c)?;
        let mut t2_ang1 = self.angle_between(x, y, x, z)?;
        let mut t2_ang2 = self.angle_between(x, y, y, z)?;
        let t2_rat1 = self.ratio_between(x, y, x, z)?;
        let t2_rat2 = self.ratio_between(x, y, y, z)?;
        if self.oracle.orientation(a, b, c) != self.oracle.orientation(x, y, z) {
            t2_ang1 = -t2_ang1;
            t2_ang2 = -t2_ang2;
        }

        self.known_similar.extend(similar_permutations(t1, t2));

        let mut changed = self.angles.insert(&(t1_ang1 - t2_ang1))?;
        changed |= self.angles.insert(&(t1_ang2 - t2_ang2))?;
        changed |= self.ratios.insert(&(t1_rat1 - t2_rat1))?;
        changed |= self.ratios.insert(&(t1_rat2 - t2_rat2))?;
        Ok(changed)
    }

    fn force_equal_points(&mut self, a: PointId, b: PointId) -> DdarResult<bool> {
        let (a, b) = (self.registry.point_rep(a), self.registry.point_rep(b));
        if a == b {
            return Ok(false);
        }
        if self.registry.are_distinct(a, b) {
            return Err(DdarError::Contradiction(format!(
                "{} and {} were asserted distinct but are proven equal",
                self.label(a),
                self.label(b)
            )));
        }

        // objects through exactly one of the two points gain the other
        let lines: Vec<Vec<PointId>> = self
            .registry
            .live_lines()
            .filter_map(|(_, line)| widened(&line.points, a, b))
            .collect();
        for points in lines {
            self.force_collinear(&points)?;
        }
        let circles: Vec<(Vec<PointId>, Vec<PointId>)> = self
            .registry
            .live_circles()
            .filter_map(|(_, circle)| widened(&circle.points, a, b).map(|points| (points, circle.centers.clone())))
            .collect();
        for (points, centers) in circles {
            self.force_concyclic(&points, &centers)?;
        }

        let others: Vec<PointId> = self.registry.active_points().to_vec();
        for x in others {
            if x == a || x == b || self.identical(x, a) || self.identical(x, b) {
                continue;
            }
            let equal = self.log_len(x, a)? - self.log_len(x, b)?;
            self.ratios.insert(&equal)?;
        }

        self.registry.merge_points(a, b)
    }
}

/// Membership extended by whichever of `a`, `b` is missing, if exactly one is
fn widened(points: &[PointId], a: PointId, b: PointId) -> Option<Vec<PointId>> {
    let (has_a, has_b) = (points.contains(&a), points.contains(&b));
    if has_a == has_b {
        return None;
    }
    let mut out = points.to_vec();
    out.push(if has_a { b } else { a });
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Detect;
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
    fn test_collinear_merges_lines_and_glues_directions() {
        let mut s = state(&[("a", 0.0, 0.0), ("b", 1.0, 0.0), ("c", 3.0, 0.0), ("d", 0.0, 1.0)]);
        assert!(s.force_collinear(&[p(0), p(1), p(2)]).unwrap());
        assert!(!s.force_collinear(&[p(2), p(0), p(1)]).unwrap());

        assert!(s.check_collinear(&[p(0), p(1), p(2)]));
        assert!(s.angles.is_zero(&(s.dir(p(0), p(1)).unwrap() - s.dir(p(1), p(2)).unwrap())));
        // |ab| + |bc| = |ac|
        let sum = s.len(p(0), p(1)).unwrap() + s.len(p(1), p(2)).unwrap() - s.len(p(0), p(2)).unwrap();
        assert!(s.lengths.is_zero(&sum));
        assert_eq!(s.registry.live_lines().count(), 4);
    }

    #[test]
    fn test_collinear_rejects_false_premise() {
        let mut s = state(&[("a", 0.0, 0.0), ("b", 1.0, 0.0), ("d", 0.0, 1.0)]);
        let err = s.force_collinear(&[p(0), p(1), p(2)]).unwrap_err();
        assert!(matches!(err, DdarError::Contradiction(_)));
    }

    #[test]
    fn test_concyclic_with_center() {
        let mut s = state(&[
            ("a", 1.0, 0.0),
            ("b", 0.0, 1.0),
            ("c", -1.0, 0.0),
            ("d", 0.0, -1.0),
            ("o", 0.0, 0.0),
        ]);
        assert!(s.force_concyclic(&[p(0), p(1), p(2)], &[]).unwrap());
        assert!(s.force_concyclic(&[p(0), p(1), p(2), p(3)], &[p(4)]).unwrap());
        assert!(!s.force_concyclic(&[p(3), p(2), p(0)], &[p(4)]).unwrap());

        assert!(s.check_concyclic(&[p(0), p(1), p(2), p(3)], &[p(4)]).unwrap());
        assert_eq!(s.registry.live_circles().count(), 1);
        let radii = s.log_len(p(4), p(0)).unwrap() - s.log_len(p(4), p(2)).unwrap();
        assert!(s.ratios.is_zero(&radii));
        // angles inscribed over chord a c are equal
        let at_b = s.angle_between(p(1), p(0), p(1), p(2)).unwrap();
        let at_d = s.angle_between(p(3), p(0), p(3), p(2)).unwrap();
        assert!(s.angles.is_zero(&(at_b - at_d)));
    }

    #[test]
    fn test_concyclic_zero_radius() {
        let mut s = state(&[("a", 1.0, 0.0), ("b", 0.0, 1.0), ("c", -1.0, 0.0)]);
        let err = s.force_concyclic(&[p(0), p(1), p(2)], &[p(2)]).unwrap_err();
        assert!(matches!(err, DdarError::Construction(ConstructionError::ZeroRadius(_))));
    }

    #[test]
    fn test_similar_is_recorded_once() {
        let mut s = state(&[
            ("a", 0.0, 0.0),
            ("b", 2.0, 0.0),
            ("c", 0.0, 1.0),
            ("x", 5.0, 5.0),
            ("y", 9.0, 5.0),
            ("z", 5.0, 7.0),
        ]);
        assert!(s.force_similar([p(0), p(1), p(2)], [p(3), p(4), p(5)]).unwrap());
        assert!(!s.force_similar([p(4), p(3), p(5)], [p(1), p(0), p(2)]).unwrap());
        assert!(s.holds(&Fact::Similar([p(2), p(0), p(1)], [p(5), p(3), p(4)])).unwrap());

        let r1 = s.ratio_between(p(0), p(1), p(0), p(2)).unwrap();
        let r2 = s.ratio_between(p(3), p(4), p(3), p(5)).unwrap();
        assert!(s.ratios.is_zero(&(r1 - r2)));
    }

    #[test]
    fn test_equal_points_merge() {
        let mut s = state(&[("a", 0.0, 0.0), ("b", 2.0, 0.0), ("m", 1.0, 0.0), ("n", 1.0, 0.0), ("c", 1.0, 3.0)]);
        s.force_collinear(&[p(0), p(1), p(2)]).unwrap();
        assert!(s.force_equal_points(p(2), p(3)).unwrap());
        assert!(!s.force_equal_points(p(3), p(2)).unwrap());

        assert!(s.check_equal_points(p(2), p(3)));
        assert!(s.check_collinear(&[p(0), p(3), p(1)]));
        assert!(!s.registry.active_points().contains(&p(3)));
        assert_eq!(s.log_len(p(3), p(4)).unwrap(), s.log_len(p(2), p(4)).unwrap());
    }

    #[test]
    fn test_distinct_points() {
        let mut s = state(&[("a", 0.0, 0.0), ("b", 0.0, 0.0), ("c", 1.0, 0.0)]);
        assert!(matches!(
            s.force_distinct(p(0), p(1)),
            Err(DdarError::Construction(ConstructionError::CoincidentPoints(_, _)))
        ));
        s.force_distinct(p(0), p(2)).unwrap();
        assert!(matches!(s.force_equal_points(p(2), p(0)), Err(DdarError::Contradiction(_))));
    }
}
