//! Point merging
//!
//! Two numerically coincident points that both lie on two objects meeting
//! transversally must be the same point. A circle known to have two centers
//! also forces those centers together.

use super::circles::small_circles;
use super::{Rule, RuleKind};
use crate::error::DdarResult;
use crate::ir::{Fact, GeoState, PointId};
use crate::oracle::ATOM;
use rustc_hash::FxHashMap;

pub struct PointMerge;

/// Some two of the directions, in units of π, differ modulo π
fn crossing_angles_differ(dirs: &[f64]) -> bool {
    let Some((&d0, rest)) = dirs.split_first() else {
        return false;
    };
    rest.iter().any(|&d1| {
        let delta = (d0 - d1 + 0.5).rem_euclid(1.0) - 0.5;
        delta * delta >= ATOM
    })
}

impl Rule for PointMerge {
    fn id(&self) -> &'static str {
        "point_merge"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::PointMerge
    }

    fn propose(&self, state: &GeoState) -> DdarResult<Vec<Fact>> {
        let points = state.registry.active_points();
        let mut pairs: Vec<(PointId, PointId)> = Vec::new();
        for (i, &a) in points.iter().enumerate() {
            for &b in &points[i + 1..] {
                if state.identical(a, b) {
                    pairs.push((a, b));
                }
            }
        }
        if pairs.is_empty() {
            return Ok(Vec::new());
        }
        let slot: FxHashMap<(PointId, PointId), usize> = pairs.iter().enumerate().map(|(i, &p)| (p, i)).collect();
        let mut dirs: Vec<Vec<f64>> = vec![Vec::new(); pairs.len()];

        let mut visit = |members: &[PointId], dir_at: &dyn Fn(PointId) -> f64| {
            for &a in members {
                for &b in members {
                    if let Some(&i) = slot.get(&(a, b)) {
                        dirs[i].push(dir_at(a));
                    }
                }
            }
        };
        for (_, line) in state.registry.live_lines() {
            visit(&line.points, &|_| line.value.direction());
        }
        for small in small_circles(state)? {
            let center = small.value.center;
            visit(&small.points, &|a| (state.oracle.coord(a) - center).direction() + 0.5);
        }
        for (_, circle) in state.registry.live_circles() {
            let center = circle.value.center;
            visit(&circle.points, &|a| (state.oracle.coord(a) - center).direction() + 0.5);
        }

        let mut out = Vec::new();
        for (_, circle) in state.registry.live_circles() {
            if let Some((&first, rest)) = circle.centers.split_first() {
                out.extend(rest.iter().map(|&other| Fact::SamePoint(first, other)));
            }
        }
        for (&(a, b), d) in pairs.iter().zip(&dirs) {
            if crossing_angles_differ(d) {
                out.push(Fact::SamePoint(a, b));
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
    fn test_crossing_angles() {
        assert!(!crossing_angles_differ(&[0.25]));
        assert!(!crossing_angles_differ(&[0.0, 1.0 - 1e-9]));
        assert!(crossing_angles_differ(&[0.0, 0.5]));
    }

    #[test]
    fn test_coincident_points_on_two_lines_merge() {
        // m and n are both the intersection of ab and cd
        let mut s = state(&[
            ("a", 0.0, 0.0),
            ("b", 2.0, 2.0),
            ("c", 0.0, 2.0),
            ("d", 2.0, 0.0),
            ("m", 1.0, 1.0),
            ("n", 1.0, 1.0),
        ]);
        let (a, b, c, d, m, n) = (p(0), p(1), p(2), p(3), p(4), p(5));
        s.force_pred(&Predicate::Collinear(vec![a, b, m]), Provenance::Premise).unwrap();
        s.force_pred(&Predicate::Collinear(vec![c, d, m]), Provenance::Premise).unwrap();
        s.force_pred(&Predicate::Collinear(vec![a, b, n]), Provenance::Premise).unwrap();
        assert!(PointMerge.propose(&s).unwrap().is_empty());

        s.force_pred(&Predicate::Collinear(vec![c, d, n]), Provenance::Premise).unwrap();
        let candidates = PointMerge.propose(&s).unwrap();
        assert_eq!(candidates, vec![Fact::SamePoint(m, n)]);
        assert!(s.admits(&candidates[0]));
    }
}
