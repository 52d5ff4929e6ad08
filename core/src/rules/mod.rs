//! Deduction rules for geometric reasoning
//!
//! Each rule is a read-only matcher over the current state. It proposes
//! candidate facts; the chainer filters them through the numeric oracle and
//! asserts the survivors. Rules never mutate the state themselves.

pub mod circles;
pub mod concyclic;
pub mod merge;
pub mod similar;
pub mod transfer;

pub use circles::{small_circles, EqualDistanceCircles, SmallCircle};
pub use concyclic::ConcyclicAngles;
pub use merge::PointMerge;
pub use similar::SimilarTriangles;
pub use transfer::{ArcChordTransfer, LengthRatioTransfer};

use crate::algebra::{AngleDomain, AngleExpr, EliminationTable, RatioExpr};
use crate::error::DdarResult;
use crate::ir::{Fact, GeoState, PointId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag of each registered rule family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    SimilarTriangles,
    ConcyclicAngles,
    EqualDistanceCircles,
    PointMerge,
    LengthRatioTransfer,
    ArcChordTransfer,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleKind::SimilarTriangles => "similar_triangles",
            RuleKind::ConcyclicAngles => "concyclic_angles",
            RuleKind::EqualDistanceCircles => "equal_distance_circles",
            RuleKind::PointMerge => "point_merge",
            RuleKind::LengthRatioTransfer => "length_ratio_transfer",
            RuleKind::ArcChordTransfer => "arc_chord_transfer",
        };
        f.write_str(name)
    }
}

/// Rule trait - all deduction rules implement this
pub trait Rule: Send + Sync {
    /// Unique identifier for this rule
    fn id(&self) -> &'static str;

    fn kind(&self) -> RuleKind;

    /// Candidate conclusions for the current state.
    ///
    /// Candidates may be numerically false or already known; the caller
    /// filters both. Errors are reserved for oracle/table disagreement.
    fn propose(&self, state: &GeoState) -> DdarResult<Vec<Fact>>;
}

/// Get all available deduction rules, in application order
pub fn all_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(SimilarTriangles),
        Box::new(ConcyclicAngles),
        Box::new(EqualDistanceCircles),
        Box::new(PointMerge),
        Box::new(LengthRatioTransfer),
        Box::new(ArcChordTransfer),
    ]
}

/// Ordered collection of rules applied once per round
pub struct RuleCatalogue {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleCatalogue {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Every rule family, in the standard order
    pub fn standard() -> Self {
        Self { rules: all_rules() }
    }

    pub fn register(&mut self, rule: Box<dyn Rule>) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Same rules, applied in the opposite order
    pub fn reversed(mut self) -> Self {
        self.rules.reverse();
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn kinds(&self) -> Vec<RuleKind> {
        self.rules.iter().map(|r| r.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleCatalogue {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for RuleCatalogue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rules.iter().map(|r| r.id())).finish()
    }
}

fn ordered(a: PointId, b: PointId) -> (PointId, PointId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Reduced direction and log-length of every pair of active points.
///
/// Reduced expressions are canonical, so equal quantities share one key.
/// Angle residues are not closed under subtraction (pivot coefficients may
/// leave `[0, lead)`), so derived angles are reduced again before use.
#[derive(Debug, Clone)]
pub struct PairCache<'a> {
    angles: &'a EliminationTable<AngleDomain>,
    dirs: FxHashMap<(PointId, PointId), AngleExpr>,
    logs: FxHashMap<(PointId, PointId), RatioExpr>,
}

impl<'a> PairCache<'a> {
    pub fn build(state: &'a GeoState) -> DdarResult<Self> {
        let points = state.registry.active_points();
        let mut cache = Self {
            angles: &state.angles,
            dirs: FxHashMap::default(),
            logs: FxHashMap::default(),
        };
        for (i, &a) in points.iter().enumerate() {
            for &b in &points[i + 1..] {
                if state.identical(a, b) {
                    continue;
                }
                cache.dirs.insert((a, b), state.angles.reduce(&state.dir(a, b)?));
                cache.logs.insert((a, b), state.ratios.reduce(&state.log_len(a, b)?));
            }
        }
        Ok(cache)
    }

    pub fn dir(&self, a: PointId, b: PointId) -> Option<&AngleExpr> {
        self.dirs.get(&ordered(a, b))
    }

    pub fn log(&self, a: PointId, b: PointId) -> Option<&RatioExpr> {
        self.logs.get(&ordered(a, b))
    }

    /// Reduced `dir(c d) − dir(a b)`
    pub fn angle(&self, a: PointId, b: PointId, c: PointId, d: PointId) -> Option<AngleExpr> {
        Some(self.angles.reduce(&(self.dir(c, d)? - self.dir(a, b)?)))
    }

    /// Reduced `−angle`
    pub fn negated(&self, angle: &AngleExpr) -> AngleExpr {
        self.angles.reduce(&-angle)
    }

    /// Reduced `log|c d| − log|a b|`
    pub fn ratio(&self, a: PointId, b: PointId, c: PointId, d: PointId) -> Option<RatioExpr> {
        Some(self.log(c, d)? - self.log(a, b)?)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::ir::{CoordinateStore, GeoState, Point2D, SymbolTable};
    use crate::oracle::Oracle;

    pub fn state(points: &[(&str, f64, f64)]) -> GeoState {
        let mut symbols = SymbolTable::new();
        let mut coords = CoordinateStore::new();
        for &(name, x, y) in points {
            symbols.get_or_intern_point(name);
            coords.push(Point2D::new(x, y));
        }
        let labels = points.iter().map(|p| p.0.to_string()).collect();
        GeoState::new(symbols, Oracle::new(coords, labels))
    }
}
