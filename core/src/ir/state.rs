//! Per-run deduction state
//!
//! A `GeoState` bundles everything one run owns: point labels, the numeric
//! oracle, the object registry, the three elimination tables, the fact store
//! and the goal. Runs never share state.

use super::facts::{FactStore, Predicate};
use super::symbols::{PointId, SymbolTable};
use crate::algebra::{AngleDomain, AngleExpr, EliminationTable, LengthDomain, LengthExpr, RatioDomain, RatioExpr};
use crate::error::{ConstructionError, DdarError, DdarResult};
use crate::oracle::Oracle;
use crate::registry::Registry;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Target of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    /// Statement that must follow from the premises
    pub target: Predicate,
}

impl Goal {
    /// Create a goal with a single target statement
    pub fn single(target: Predicate) -> Self {
        Self { target }
    }
}

/// Metadata about a problem
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Unique identifier for the problem
    pub problem_id: String,

    /// Optional free-text description
    pub description: Option<String>,
}

impl Metadata {
    /// Create new metadata with a problem ID
    pub fn new(problem_id: impl Into<String>) -> Self {
        Self {
            problem_id: problem_id.into(),
            description: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Formal symbols of one unordered point pair
#[derive(Debug, Clone)]
pub struct PairSymbols {
    pub dir: AngleExpr,
    pub log_len: RatioExpr,
    pub len: LengthExpr,
}

/// Complete state of one deduction run
#[derive(Debug, Clone)]
pub struct GeoState {
    /// Point labels
    pub symbols: SymbolTable,

    /// Numeric coordinates, independent of symbolic state
    pub oracle: Oracle,

    /// Union-find identity over points, lines and circles
    pub registry: Registry,

    pub angles: EliminationTable<AngleDomain>,
    pub ratios: EliminationTable<RatioDomain>,
    pub lengths: EliminationTable<LengthDomain>,

    /// Recorded facts with provenance
    pub facts: FactStore,

    /// Target statement, if any
    pub goal: Option<Goal>,

    /// Problem metadata
    pub metadata: Metadata,

    pairs: FxHashMap<(PointId, PointId), PairSymbols>,
    pub(crate) known_similar: FxHashSet<([PointId; 3], [PointId; 3])>,
}

fn ordered(a: PointId, b: PointId) -> (PointId, PointId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl GeoState {
    /// Seed the registry and tables from the oracle's coordinates.
    ///
    /// Every pair of numerically distinct points gets a direction, a
    /// log-length and a length symbol and starts on its own two-point line.
    pub fn new(symbols: SymbolTable, oracle: Oracle) -> Self {
        let mut registry = Registry::new();
        let mut angles = EliminationTable::new();
        let mut ratios = EliminationTable::new();
        let mut lengths = EliminationTable::with_unit(oracle.scale());
        let mut pairs = FxHashMap::default();

        let points: Vec<PointId> = symbols.points().collect();
        for _ in &points {
            registry.add_point();
        }
        for (i, &a) in points.iter().enumerate() {
            for &b in &points[i + 1..] {
                let Some(line) = oracle.line(a, b) else {
                    continue;
                };
                let name = format!("{}{}", symbols.label(a), symbols.label(b));
                let distance = oracle.distance(a, b);
                let dir = angles.new_var(oracle.direction(a, b), format!("d({})", name));
                let log_len = ratios.new_var(distance.ln(), format!("log|{}|", name));
                let len = lengths.new_var(distance, format!("|{}|", name));
                registry.new_line(a, b, dir.clone(), line);
                pairs.insert((a, b), PairSymbols { dir, log_len, len });
            }
        }
        debug!(points = points.len(), pairs = pairs.len(), "seeded state");

        Self {
            symbols,
            oracle,
            registry,
            angles,
            ratios,
            lengths,
            facts: FactStore::new(),
            goal: None,
            metadata: Metadata::default(),
            pairs,
            known_similar: FxHashSet::default(),
        }
    }

    pub fn with_goal(mut self, goal: Goal) -> Self {
        self.goal = Some(goal);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn label(&self, p: PointId) -> String {
        self.symbols.label(p)
    }

    fn pair(&self, a: PointId, b: PointId) -> Option<&PairSymbols> {
        let (a, b) = (self.registry.point_rep(a), self.registry.point_rep(b));
        self.pairs.get(&ordered(a, b))
    }

    fn missing_pair(&self, a: PointId, b: PointId) -> DdarError {
        DdarError::Construction(ConstructionError::CoincidentPoints(self.label(a), self.label(b)))
    }

    /// The two points are merged or numerically coincide
    pub fn identical(&self, a: PointId, b: PointId) -> bool {
        self.pair(a, b).is_none()
    }

    /// Direction symbol of line `a b`
    pub fn dir(&self, a: PointId, b: PointId) -> DdarResult<AngleExpr> {
        self.pair(a, b)
            .map(|s| s.dir.clone())
            .ok_or_else(|| self.missing_pair(a, b))
    }

    /// Log-length symbol of segment `a b`
    pub fn log_len(&self, a: PointId, b: PointId) -> DdarResult<RatioExpr> {
        self.pair(a, b)
            .map(|s| s.log_len.clone())
            .ok_or_else(|| self.missing_pair(a, b))
    }

    /// Length symbol of segment `a b`
    pub fn len(&self, a: PointId, b: PointId) -> DdarResult<LengthExpr> {
        self.pair(a, b)
            .map(|s| s.len.clone())
            .ok_or_else(|| self.missing_pair(a, b))
    }

    /// `dir(c d) − dir(a b)`
    pub fn angle_between(&self, a: PointId, b: PointId, c: PointId, d: PointId) -> DdarResult<AngleExpr> {
        Ok(self.dir(c, d)? - self.dir(a, b)?)
    }

    /// `log|c d| − log|a b|`
    pub fn ratio_between(&self, a: PointId, b: PointId, c: PointId, d: PointId) -> DdarResult<RatioExpr> {
        Ok(self.log_len(c, d)? - self.log_len(a, b)?)
    }

    /// Get the number of recorded facts
    pub fn num_facts(&self) -> usize {
        self.facts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CoordinateStore, Point2D};

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

    #[test]
    fn test_metadata() {
        let meta = Metadata::new("problem_123").with_description("two lines");

        assert_eq!(meta.problem_id, "problem_123");
        assert_eq!(meta.description.as_deref(), Some("two lines"));
    }

    #[test]
    fn test_pairs_get_symbols_and_lines() {
        let s = state(&[("a", 0.0, 0.0), ("b", 1.0, 0.0), ("c", 0.0, 1.0)]);
        let (a, b, c) = (PointId(0), PointId(1), PointId(2));

        assert_eq!(s.angles.num_symbols(), 3);
        assert_eq!(s.ratios.num_symbols(), 3);
        assert_eq!(s.lengths.num_symbols(), 3);
        assert_eq!(s.registry.live_lines().count(), 3);
        assert_eq!(s.dir(a, b).unwrap(), s.dir(b, a).unwrap());
        assert!(s.angles.is_numerically_zero(&(s.angle_between(a, b, a, c).unwrap() - AngleExpr::right())));
    }

    #[test]
    fn test_coincident_points_have_no_pair() {
        let s = state(&[("a", 0.0, 0.0), ("b", 0.0, 0.0), ("c", 1.0, 0.0)]);
        let (a, b) = (PointId(0), PointId(1));

        assert!(s.identical(a, b));
        assert!(s.identical(a, a));
        assert!(matches!(
            s.dir(a, b),
            Err(DdarError::Construction(ConstructionError::CoincidentPoints(_, _)))
        ));
    }

    #[test]
    fn test_single_point_state_is_empty() {
        let s = state(&[("a", 0.3, 0.7)]);
        assert_eq!(s.angles.num_symbols(), 0);
        assert_eq!(s.registry.live_lines().count(), 0);
        assert_eq!(s.num_facts(), 0);
    }
}
