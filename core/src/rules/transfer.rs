//! Transfers between the ratio, length and angle tables

use super::{Rule, RuleKind};
use crate::algebra::{AngleExpr, LengthExpr, RatioExpr};
use crate::error::{DdarError, DdarResult};
use crate::ir::{Fact, GeoState};
use crate::oracle::ATOM;
use rustc_hash::FxHashMap;
use tracing::error;

/// Segments whose log-lengths differ by a constant have proportional
/// lengths, and segments with proportional lengths have log-lengths that
/// differ by a constant.
pub struct LengthRatioTransfer;

impl LengthRatioTransfer {
    fn check_agreement(state: &GeoState, length: &LengthExpr, log: &RatioExpr) -> DdarResult<()> {
        let residual = (state.lengths.value(length) - state.ratios.value(log).exp()) / state.oracle.scale();
        if residual * residual < ATOM {
            return Ok(());
        }
        let expr = format!("{} vs exp({})", state.lengths.describe(length), state.ratios.describe(log));
        error!(%expr, residual, "length and ratio tables disagree");
        Err(DdarError::ConsistencyFault {
            domain: "length",
            expr,
            residual,
        })
    }
}

impl Rule for LengthRatioTransfer {
    fn id(&self) -> &'static str {
        "length_ratio_transfer"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::LengthRatioTransfer
    }

    fn propose(&self, state: &GeoState) -> DdarResult<Vec<Fact>> {
        let points = state.registry.active_points();
        let mut log_to_len: FxHashMap<RatioExpr, LengthExpr> = FxHashMap::default();
        let mut len_to_log: FxHashMap<LengthExpr, RatioExpr> = FxHashMap::default();
        let mut out = Vec::new();

        for (i, &a) in points.iter().enumerate() {
            for &b in &points[i + 1..] {
                if state.identical(a, b) {
                    continue;
                }
                let log = state.ratios.reduce(&state.log_len(a, b)?);
                let len = state.lengths.reduce(&state.len(a, b)?);

                // log = log_n + log(log_coef), len = len_coef · len_n
                let (log_n, Some(log_coef)) = log.split_constant() else {
                    continue;
                };
                let Some((len_n, len_coef)) = len.split_leading() else {
                    continue;
                };
                let Ok(shift) = RatioExpr::constant(&len_coef) else {
                    continue;
                };
                let log1 = &log - &shift;
                let len1 = len.scaled(&log_coef.recip());
                Self::check_agreement(state, &len_n, &log1)?;
                Self::check_agreement(state, &len1, &log_n)?;

                match log_to_len.get(&log_n) {
                    Some(len2) => out.push(Fact::LengthZero(len2 - &len1)),
                    None => {
                        log_to_len.insert(log_n, len1);
                    }
                }
                match len_to_log.get(&len_n) {
                    Some(log2) => out.push(Fact::RatioZero(log2 - &log1)),
                    None => {
                        len_to_log.insert(len_n, log1);
                    }
                }
            }
        }
        Ok(out)
    }
}

/// Chords of one circle subtending equal arcs have equal lengths, and
/// equal chords subtend equal arcs.
pub struct ArcChordTransfer;

impl Rule for ArcChordTransfer {
    fn id(&self) -> &'static str {
        "arc_chord_transfer"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::ArcChordTransfer
    }

    fn propose(&self, state: &GeoState) -> DdarResult<Vec<Fact>> {
        let mut out = Vec::new();
        for (_, circle) in state.registry.live_circles() {
            if circle.points.len() <= 3 {
                continue;
            }
            let mut arc_to_chord: FxHashMap<AngleExpr, RatioExpr> = FxHashMap::default();
            let mut chord_to_arc: FxHashMap<RatioExpr, AngleExpr> = FxHashMap::default();
            for &a in &circle.points {
                for &b in &circle.points {
                    if state.oracle.orientation_about(a, b, circle.value.center) != 1 {
                        continue;
                    }
                    let arc = state.arc(&circle.defining, a, b)?;
                    let chord = state.log_len(a, b)?;
                    let arc_key = state.angles.reduce(&arc);
                    let chord_key = state.ratios.reduce(&chord);

                    match arc_to_chord.get(&arc_key) {
                        Some(other) => out.push(Fact::RatioZero(&chord - other)),
                        None => {
                            arc_to_chord.insert(arc_key, chord.clone());
                        }
                    }
                    match chord_to_arc.get(&chord_key) {
                        Some(other) => out.push(Fact::AngleZero(&arc - other)),
                        None => {
                            chord_to_arc.insert(chord_key, arc);
                        }
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
    use crate::ir::{PointId, Predicate, Provenance};
    use crate::rules::testing::state;
    use num_bigint::BigInt;
    use num_rational::BigRational;

    fn p(i: u32) -> PointId {
        PointId(i)
    }

    #[test]
    fn test_ratio_constant_transfers_to_lengths() {
        let mut s = state(&[("a", 0.0, 0.0), ("b", 2.0, 0.0), ("c", 0.0, 1.0), ("d", 0.0, 3.0)]);
        let (a, b, c, d) = (p(0), p(1), p(2), p(3));
        let two = BigRational::from_integer(BigInt::from(2));
        s.force_pred(&Predicate::RatioConst { points: [a, b, a, c], ratio: two.clone() }, Provenance::Premise)
            .unwrap();
        s.force_pred(&Predicate::RatioConst { points: [c, d, a, c], ratio: two }, Provenance::Premise)
            .unwrap();

        let candidates = LengthRatioTransfer.propose(&s).unwrap();
        assert!(candidates.iter().any(|f| matches!(f, Fact::LengthZero(_))));
        assert!(candidates.iter().all(|f| s.admits(f)));
        for fact in &candidates {
            s.force_fact(fact).unwrap();
        }
        let ab_cd = s.len(a, b).unwrap() - s.len(c, d).unwrap();
        assert!(s.lengths.is_zero(&ab_cd));
    }

    #[test]
    fn test_equal_chords_give_equal_arcs() {
        // square on the unit circle
        let mut s = state(&[("a", 1.0, 0.0), ("b", 0.0, 1.0), ("c", -1.0, 0.0), ("d", 0.0, -1.0)]);
        let (a, b, c, d) = (p(0), p(1), p(2), p(3));
        s.force_pred(&Predicate::Cyclic(vec![a, b, c, d]), Provenance::Premise).unwrap();
        s.force_pred(&Predicate::Congruent([a, b, b, c]), Provenance::Premise).unwrap();

        let candidates = ArcChordTransfer.propose(&s).unwrap();
        assert!(candidates.iter().any(|f| matches!(f, Fact::AngleZero(_))));
        assert!(candidates.iter().all(|f| s.admits(f)));
    }
}
