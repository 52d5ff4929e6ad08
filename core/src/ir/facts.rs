//! Predicates, kernel facts and fact storage
//!
//! A `Predicate` is a statement in the surface language used for premises
//! and goals. A `Fact` is what the engine actually asserts: a structural
//! fact about lines/circles/triangles/points, or a linear equation in one of
//! the three elimination tables.

use super::symbols::{PointId, SymbolTable};
use crate::algebra::{AngleExpr, LengthExpr, RatioExpr};
use num_rational::BigRational;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Surface statement about named points
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// `coll`: all points on one line
    Collinear(Vec<PointId>),
    /// `para a b c d`: ab ∥ cd
    Parallel([PointId; 4]),
    /// `perp a b c d`: ab ⊥ cd
    Perpendicular([PointId; 4]),
    /// `cong a b c d`: |ab| = |cd|
    Congruent([PointId; 4]),
    /// `eqangle`: ∠(ab, cd) = ∠(ef, gh), directed and modulo π
    EqualAngle([PointId; 8]),
    /// `eqratio`: |ab|/|cd| = |ef|/|gh|
    EqualRatio([PointId; 8]),
    /// `aconst a b c d θ`: direction(ab) − direction(cd) = θ degrees
    AngleConst { points: [PointId; 4], degrees: BigRational },
    /// `rconst a b c d r`: |ab|/|cd| = r
    RatioConst { points: [PointId; 4], ratio: BigRational },
    /// `angeq`: Σ k·direction(pair) + θ degrees = 0
    AngleSum {
        terms: Vec<(BigRational, PointId, PointId)>,
        degrees: BigRational,
    },
    /// `distmeq`: Π |pair|^k · c = 1
    RatioProduct {
        terms: Vec<(BigRational, PointId, PointId)>,
        constant: BigRational,
    },
    /// `distseq`: Σ k·|pair| = 0
    LengthSum { terms: Vec<(BigRational, PointId, PointId)> },
    /// `cyclic`: all points on one circle
    Cyclic(Vec<PointId>),
    /// `cyclic_with_centers`: points on one circle centred at every center
    CyclicWithCenters { centers: Vec<PointId>, points: Vec<PointId> },
    /// `midp m a b`
    Midpoint { mid: PointId, a: PointId, b: PointId },
    /// `overlap a b`: the two points are the same
    Overlap(PointId, PointId),
    /// `acompute a b c d`: the angle between ab and cd is determined
    AngleCompute([PointId; 4]),
}

impl Predicate {
    /// Keyword in the problem language
    pub fn name(&self) -> &'static str {
        match self {
            Predicate::Collinear(_) => "coll",
            Predicate::Parallel(_) => "para",
            Predicate::Perpendicular(_) => "perp",
            Predicate::Congruent(_) => "cong",
            Predicate::EqualAngle(_) => "eqangle",
            Predicate::EqualRatio(_) => "eqratio",
            Predicate::AngleConst { .. } => "aconst",
            Predicate::RatioConst { .. } => "rconst",
            Predicate::AngleSum { .. } => "angeq",
            Predicate::RatioProduct { .. } => "distmeq",
            Predicate::LengthSum { .. } => "distseq",
            Predicate::Cyclic(_) => "cyclic",
            Predicate::CyclicWithCenters { .. } => "cyclic_with_centers",
            Predicate::Midpoint { .. } => "midp",
            Predicate::Overlap(_, _) => "overlap",
            Predicate::AngleCompute(_) => "acompute",
        }
    }

    /// Every point argument, in order
    pub fn points(&self) -> Vec<PointId> {
        match self {
            Predicate::Collinear(ps) | Predicate::Cyclic(ps) => ps.clone(),
            Predicate::Parallel(ps)
            | Predicate::Perpendicular(ps)
            | Predicate::Congruent(ps)
            | Predicate::AngleCompute(ps)
            | Predicate::AngleConst { points: ps, .. }
            | Predicate::RatioConst { points: ps, .. } => ps.to_vec(),
            Predicate::EqualAngle(ps) | Predicate::EqualRatio(ps) => ps.to_vec(),
            Predicate::AngleSum { terms, .. }
            | Predicate::RatioProduct { terms, .. }
            | Predicate::LengthSum { terms } => terms.iter().flat_map(|(_, a, b)| [*a, *b]).collect(),
            Predicate::CyclicWithCenters { centers, points } => centers.iter().chain(points).copied().collect(),
            Predicate::Midpoint { mid, a, b } => vec![*mid, *a, *b],
            Predicate::Overlap(a, b) => vec![*a, *b],
        }
    }

    /// `name p q r …` with point labels
    pub fn describe(&self, symbols: &SymbolTable) -> String {
        let labels: Vec<String> = self.points().into_iter().map(|p| symbols.label(p)).collect();
        let mut out = format!("{} {}", self.name(), labels.join(" "));
        match self {
            Predicate::AngleConst { degrees, .. } => out.push_str(&format!(" {}", degrees)),
            Predicate::RatioConst { ratio, .. } => out.push_str(&format!(" {}", ratio)),
            Predicate::AngleSum { terms, degrees } => {
                for (k, _, _) in terms {
                    out.push_str(&format!(" {}", k));
                }
                out.push_str(&format!(" {}", degrees));
            }
            Predicate::RatioProduct { terms, constant } => {
                for (k, _, _) in terms {
                    out.push_str(&format!(" {}", k));
                }
                out.push_str(&format!(" {}", constant));
            }
            Predicate::LengthSum { terms } => {
                for (k, _, _) in terms {
                    out.push_str(&format!(" {}", k));
                }
            }
            _ => {}
        }
        out
    }
}

/// Kernel-level fact asserted into the registry or a table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fact {
    Collinear(Vec<PointId>),
    Concyclic { points: Vec<PointId>, centers: Vec<PointId> },
    /// Triangles similar with vertices matched in order
    Similar([PointId; 3], [PointId; 3]),
    SamePoint(PointId, PointId),
    AngleZero(AngleExpr),
    RatioZero(RatioExpr),
    LengthZero(LengthExpr),
}

/// The six simultaneous vertex permutations of a triangle pair
const TRIANGLE_PERMUTATIONS: [[usize; 3]; 6] = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

/// All 12 spellings of one similarity: 6 vertex orders, both triangle orders
pub fn similar_permutations(t1: [PointId; 3], t2: [PointId; 3]) -> impl Iterator<Item = ([PointId; 3], [PointId; 3])> {
    TRIANGLE_PERMUTATIONS.into_iter().flat_map(move |[i, j, k]| {
        let p1 = [t1[i], t1[j], t1[k]];
        let p2 = [t2[i], t2[j], t2[k]];
        [(p1, p2), (p2, p1)]
    })
}

impl Fact {
    /// Normalize the fact to canonical form for deduplication
    pub fn normalize(self) -> Self {
        match self {
            Fact::Collinear(mut points) => {
                points.sort();
                points.dedup();
                Fact::Collinear(points)
            }
            Fact::Concyclic {
                mut points,
                mut centers,
            } => {
                points.sort();
                points.dedup();
                centers.sort();
                centers.dedup();
                Fact::Concyclic { points, centers }
            }
            Fact::Similar(t1, t2) => {
                let (t1, t2) = similar_permutations(t1, t2)
                    .min()
                    .unwrap_or((t1, t2));
                Fact::Similar(t1, t2)
            }
            Fact::SamePoint(a, b) => {
                if a <= b {
                    Fact::SamePoint(a, b)
                } else {
                    Fact::SamePoint(b, a)
                }
            }
            Fact::AngleZero(e) => Fact::AngleZero(e.sign_normalized()),
            Fact::RatioZero(e) => Fact::RatioZero(e.sign_normalized()),
            Fact::LengthZero(e) => Fact::LengthZero(e.sign_normalized()),
        }
    }

    /// Get the type of this fact for indexing
    pub fn fact_type(&self) -> FactType {
        match self {
            Fact::Collinear(_) => FactType::Collinear,
            Fact::Concyclic { .. } => FactType::Concyclic,
            Fact::Similar(_, _) => FactType::Similar,
            Fact::SamePoint(_, _) => FactType::SamePoint,
            Fact::AngleZero(_) => FactType::AngleZero,
            Fact::RatioZero(_) => FactType::RatioZero,
            Fact::LengthZero(_) => FactType::LengthZero,
        }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids = |ps: &[PointId]| ps.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(" ");
        match self {
            Fact::Collinear(ps) => write!(f, "coll {}", ids(ps)),
            Fact::Concyclic { points, centers } if centers.is_empty() => write!(f, "cyclic {}", ids(points)),
            Fact::Concyclic { points, centers } => write!(f, "cyclic {} / centers {}", ids(points), ids(centers)),
            Fact::Similar(t1, t2) => write!(f, "simtri {} {}", ids(t1), ids(t2)),
            Fact::SamePoint(a, b) => write!(f, "overlap {} {}", a, b),
            Fact::AngleZero(e) => write!(f, "angle {} = 0", e),
            Fact::RatioZero(e) => write!(f, "ratio {} = 0", e),
            Fact::LengthZero(e) => write!(f, "length {} = 0", e),
        }
    }
}

/// Enumeration of fact types for indexing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FactType {
    Collinear,
    Concyclic,
    Similar,
    SamePoint,
    AngleZero,
    RatioZero,
    LengthZero,
}

/// Where a recorded fact came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Provenance {
    Premise,
    Derived { rule: &'static str, round: usize },
}

/// Storage for asserted facts with deduplication and type-based indexing
///
/// Facts are normalized before insertion. Insertion order is kept per type
/// so iteration is deterministic.
#[derive(Debug, Clone, Default)]
pub struct FactStore {
    /// Deduplicated set of all facts
    facts: FxHashSet<Fact>,

    /// Index mapping fact types to facts of that type
    type_index: FxHashMap<FactType, Vec<Fact>>,

    /// Provenance tracking: which rule and round introduced each fact
    provenance: FxHashMap<Fact, Provenance>,
}

impl FactStore {
    /// Create a new empty fact store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fact with provenance information
    ///
    /// Returns true if the fact was newly inserted, false if it already existed.
    pub fn insert_with_provenance(&mut self, fact: Fact, provenance: Provenance) -> bool {
        let fact = fact.normalize();
        if !self.facts.insert(fact.clone()) {
            return false;
        }
        self.type_index
            .entry(fact.fact_type())
            .or_default()
            .push(fact.clone());
        self.provenance.insert(fact, provenance);
        true
    }

    /// Check if the store contains a fact
    pub fn contains(&self, fact: &Fact) -> bool {
        self.facts.contains(&fact.clone().normalize())
    }

    /// Get all facts of a specific type, in insertion order
    pub fn facts_of_type(&self, fact_type: FactType) -> &[Fact] {
        self.type_index
            .get(&fact_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get the total number of facts
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Get the provenance of a fact, if it was recorded
    pub fn provenance(&self, fact: &Fact) -> Option<Provenance> {
        self.provenance.get(&fact.clone().normalize()).copied()
    }
}
