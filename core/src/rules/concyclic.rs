//! Concyclic points from equal inscribed angles

use super::{PairCache, Rule, RuleKind};
use crate::algebra::AngleExpr;
use crate::error::DdarResult;
use crate::ir::{ops, Fact, GeoState, PointId};
use rustc_hash::FxHashMap;

/// For each chord `a b`, points seeing it under the same angle are concyclic
/// with `a b`; a zero angle puts the point on line `a b`; a point equidistant
/// from `a` and `b` whose half angle matches is a center.
pub struct ConcyclicAngles;

#[derive(Default)]
struct AngleGroup {
    points: Vec<PointId>,
    centers: Vec<PointId>,
}

/// Groups keyed by reduced angle, in first-seen order
#[derive(Default)]
struct AngleGroups {
    index: FxHashMap<AngleExpr, usize>,
    groups: Vec<AngleGroup>,
}

impl AngleGroups {
    fn slot(&mut self, key: AngleExpr) -> &mut AngleGroup {
        let groups = &mut self.groups;
        let i = *self.index.entry(key).or_insert_with(|| {
            groups.push(AngleGroup::default());
            groups.len() - 1
        });
        &mut self.groups[i]
    }
}

impl Rule for ConcyclicAngles {
    fn id(&self) -> &'static str {
        "concyclic_angles"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::ConcyclicAngles
    }

    fn propose(&self, state: &GeoState) -> DdarResult<Vec<Fact>> {
        let cache = PairCache::build(state)?;
        let points = state.registry.active_points();
        let half = AngleExpr::right();
        let mut out = Vec::new();

        for &a in points {
            for &b in points {
                if a == b {
                    continue;
                }
                let mut groups = AngleGroups::default();
                let mut on_line = Vec::new();
                let (pa, pb) = (state.oracle.coord(a), state.oracle.coord(b));

                for &c in points {
                    if state.identical(a, c) || state.identical(b, c) {
                        continue;
                    }
                    let Some(angle) = cache.angle(c, a, c, b) else {
                        continue;
                    };
                    if angle.is_zero() {
                        on_line.push(c);
                    }
                    if state.identical(a, b) {
                        continue;
                    }
                    if !ops::are_collinear(pa, pb, state.oracle.coord(c), state.oracle.scale()) {
                        groups.slot(angle).points.push(c);
                    }
                    if cache.ratio(c, a, c, b).is_some_and(|r| r.is_zero()) {
                        if let Some(halfang) = cache.angle(a, c, a, b) {
                            groups.slot(halfang + half.clone()).centers.push(c);
                        }
                    }
                }

                for c in on_line {
                    out.push(Fact::Collinear(vec![a, b, c]));
                }
                for g in groups.groups {
                    if g.points.len() >= 2 || (!g.centers.is_empty() && !g.points.is_empty()) {
                        let mut all = vec![a, b];
                        all.extend(g.points);
                        out.push(Fact::Concyclic {
                            points: all,
                            centers: g.centers,
                        });
                    }
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Construct, Detect};
    use crate::ir::{Predicate, Provenance};
    use crate::rules::testing::state;

    fn p(i: u32) -> PointId {
        PointId(i)
    }

    #[test]
    fn test_equal_angles_give_circle() {
        // a b c d on the unit circle
        let s0 = 0.6f64;
        let c0 = 0.8f64;
        let mut s = state(&[("a", 1.0, 0.0), ("b", -1.0, 0.0), ("c", c0, s0), ("d", -c0, s0)]);
        let (a, b, c, d) = (p(0), p(1), p(2), p(3));
        let eq = Predicate::EqualAngle([c, a, c, b, d, a, d, b]);
        s.force_pred(&eq, Provenance::Premise).unwrap();

        let candidates = ConcyclicAngles.propose(&s).unwrap();
        let expected = Fact::Concyclic {
            points: vec![a, b, c, d],
            centers: vec![],
        }
        .normalize();
        assert!(candidates.iter().any(|f| f.clone().normalize() == expected));
        assert!(candidates.iter().all(|f| s.admits(f)));
    }
}
