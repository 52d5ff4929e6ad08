//! Circles from equal distances

use super::{PairCache, Rule, RuleKind};
use crate::algebra::RatioExpr;
use crate::error::DdarResult;
use crate::ir::{Fact, GeoState, NumCircle, PointId};
use rustc_hash::FxHashMap;

/// Points at one proven distance from a center, too few to fix a circle
#[derive(Debug, Clone)]
pub struct SmallCircle {
    pub points: Vec<PointId>,
    pub center: PointId,
    pub value: NumCircle,
}

/// Points grouped by their reduced distance from `center`, in first-seen order
fn distance_groups(state: &GeoState, cache: &PairCache<'_>, center: PointId) -> Vec<Vec<PointId>> {
    let mut index: FxHashMap<&RatioExpr, usize> = FxHashMap::default();
    let mut groups: Vec<Vec<PointId>> = Vec::new();
    for &b in state.registry.active_points() {
        if state.identical(center, b) {
            continue;
        }
        let Some(dist) = cache.log(center, b) else {
            continue;
        };
        match index.get(dist) {
            Some(&i) => groups[i].push(b),
            None => {
                index.insert(dist, groups.len());
                groups.push(vec![b]);
            }
        }
    }
    groups.retain(|g| g.len() > 1);
    groups
}

/// Equal-distance groups with fewer than three distinct points
pub fn small_circles(state: &GeoState) -> DdarResult<Vec<SmallCircle>> {
    let cache = PairCache::build(state)?;
    let mut out = Vec::new();
    for &center in state.registry.active_points() {
        for points in distance_groups(state, &cache, center) {
            if state.distinct_triple(&points).is_some() {
                continue;
            }
            let o = state.oracle.coord(center);
            let value = NumCircle::new(o, state.oracle.distance(center, points[0]));
            out.push(SmallCircle { points, center, value });
        }
    }
    Ok(out)
}

/// Three or more points equidistant from a center lie on a circle around it
pub struct EqualDistanceCircles;

impl Rule for EqualDistanceCircles {
    fn id(&self) -> &'static str {
        "equal_distance_circles"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::EqualDistanceCircles
    }

    fn propose(&self, state: &GeoState) -> DdarResult<Vec<Fact>> {
        let cache = PairCache::build(state)?;
        let mut out = Vec::new();
        for &center in state.registry.active_points() {
            for points in distance_groups(state, &cache, center) {
                if state.distinct_triple(&points).is_some() {
                    out.push(Fact::Concyclic {
                        points,
                        centers: vec![center],
                    });
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
    fn test_three_equal_radii_make_a_circle() {
        let mut s = state(&[("o", 0.0, 0.0), ("a", 2.0, 0.0), ("b", 0.0, 2.0), ("c", -2.0, 0.0)]);
        let (o, a, b, c) = (p(0), p(1), p(2), p(3));
        s.force_pred(&Predicate::Congruent([o, a, o, b]), Provenance::Premise).unwrap();
        assert!(EqualDistanceCircles.propose(&s).unwrap().is_empty());
        assert_eq!(small_circles(&s).unwrap().len(), 1);

        s.force_pred(&Predicate::Congruent([o, b, o, c]), Provenance::Premise).unwrap();
        let candidates = EqualDistanceCircles.propose(&s).unwrap();
        assert_eq!(
            candidates,
            vec![Fact::Concyclic {
                points: vec![a, b, c],
                centers: vec![o],
            }]
        );
        assert!(s.admits(&candidates[0]));
        assert!(small_circles(&s).unwrap().is_empty());
    }
}
