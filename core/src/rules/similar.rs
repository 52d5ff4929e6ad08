//! Similar triangle detection
//!
//! Every non-degenerate triangle `a b c` whose base `a b` touched some
//! inserted row is indexed by four signatures built from reduced
//! expressions. Two triangles with the same signature are similar.

use super::{PairCache, Rule, RuleKind};
use crate::algebra::{AngleExpr, RatioExpr};
use crate::error::DdarResult;
use crate::ir::{Fact, GeoState, PointId};
use crate::oracle::ATOM;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::hash_map::Entry;
use std::hash::Hash;

type Triangle = [PointId; 3];

/// SSS, AA, SAS and SSA similarity
pub struct SimilarTriangles;

/// Record `t` under `key`, or pair it with the triangle already there
fn match_or_insert<K: Eq + Hash>(index: &mut FxHashMap<K, Triangle>, key: K, t: Triangle, out: &mut Vec<Fact>) -> bool {
    match index.entry(key) {
        Entry::Occupied(e) => {
            out.push(Fact::Similar(*e.get(), t));
            true
        }
        Entry::Vacant(e) => {
            e.insert(t);
            false
        }
    }
}

impl Rule for SimilarTriangles {
    fn id(&self) -> &'static str {
        "similar_triangles"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::SimilarTriangles
    }

    fn propose(&self, state: &GeoState) -> DdarResult<Vec<Fact>> {
        let cache = PairCache::build(state)?;
        let points = state.registry.active_points();
        let scale = state.oracle.scale();

        let mut sss: FxHashMap<(RatioExpr, RatioExpr), Triangle> = FxHashMap::default();
        let mut aa: FxHashMap<(AngleExpr, AngleExpr), Triangle> = FxHashMap::default();
        let mut sas: FxHashMap<(AngleExpr, RatioExpr, i8), Triangle> = FxHashMap::default();
        let mut ssa: FxHashMap<(AngleExpr, RatioExpr, i8), Triangle> = FxHashMap::default();
        let mut ssa_seen: FxHashSet<Triangle> = FxHashSet::default();
        let mut out = Vec::new();

        for &a in points {
            for &b in points {
                if state.identical(a, b) {
                    continue;
                }
                let touched = state.angles.was_encountered(&state.dir(a, b)?)
                    || state.ratios.was_encountered(&state.log_len(a, b)?);
                if !touched {
                    continue;
                }
                for &c in points {
                    if state.identical(a, c) || state.identical(b, c) {
                        continue;
                    }
                    let orient = state.oracle.orientation(a, b, c);
                    if orient == 0 {
                        continue;
                    }
                    let (Some(rat1), Some(ang1), Some(rat2), Some(ang2)) = (
                        cache.ratio(a, b, a, c),
                        cache.angle(a, b, a, c),
                        cache.ratio(c, b, c, a),
                        cache.angle(c, b, c, a),
                    ) else {
                        continue;
                    };
                    let t = [a, b, c];

                    match_or_insert(&mut sss, (rat1.clone(), rat2.clone()), t, &mut out);

                    if !match_or_insert(&mut aa, (ang1.clone(), ang2.clone()), t, &mut out) {
                        aa.insert((cache.negated(&ang1), cache.negated(&ang2)), t);
                    }

                    if !match_or_insert(&mut sas, (ang1.clone(), rat1.clone(), orient), t, &mut out) {
                        sas.insert((cache.negated(&ang1), rat1.clone(), -orient), t);
                    }

                    // the side opposite the known angle must be the longer one
                    for (t1, ang, rat, o) in [([a, b, c], &ang1, &rat2, orient), ([c, b, a], &ang2, &rat1, -orient)] {
                        let [a1, b1, c1] = t1;
                        let excess = (state.oracle.distance(c1, b1) - state.oracle.distance(c1, a1)) / scale;
                        if excess <= ATOM || !ssa_seen.insert(t1) {
                            continue;
                        }
                        if !match_or_insert(&mut ssa, (ang.clone(), rat.clone(), o), t1, &mut out) {
                            ssa.insert((cache.negated(ang), rat.clone(), -o), t1);
                        }
                    }
                }
            }
        }

        out.retain(|fact| match fact {
            Fact::Similar(t1, t2) => !state.known_similar.contains(&(*t1, *t2)),
            _ => true,
        });
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
    fn test_no_rows_no_candidates() {
        let s = state(&[("a", 0.0, 0.0), ("b", 2.0, 0.0), ("c", 0.5, 1.0)]);
        assert!(SimilarTriangles.propose(&s).unwrap().is_empty());
    }

    #[test]
    fn test_parallel_cut_gives_similar_triangles() {
        // d on ab, e on ac, de parallel to bc
        let mut s = state(&[
            ("a", 0.0, 0.0),
            ("b", 4.0, 0.0),
            ("c", 1.0, 3.0),
            ("d", 2.0, 0.0),
            ("e", 0.5, 1.5),
        ]);
        let (a, b, c, d, e) = (p(0), p(1), p(2), p(3), p(4));
        s.force_pred(&Predicate::Collinear(vec![a, d, b]), Provenance::Premise).unwrap();
        s.force_pred(&Predicate::Collinear(vec![a, e, c]), Provenance::Premise).unwrap();
        s.force_pred(&Predicate::Parallel([d, e, b, c]), Provenance::Premise).unwrap();

        let candidates = SimilarTriangles.propose(&s).unwrap();
        assert!(!candidates.is_empty());
        for fact in &candidates {
            assert!(s.admits(fact), "{} should hold numerically", fact);
        }
        let target = Fact::Similar([a, d, e], [a, b, c]).normalize();
        assert!(candidates.iter().any(|f| f.clone().normalize() == target));
    }
}
