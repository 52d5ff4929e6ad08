//! Problem loader for JSON problem files
//!
//! A problem names its points in order, each placed either at explicit
//! coordinates or by a construction over earlier points, then lists
//! distinctness requirements, premises and an optional goal. Resolving a
//! problem interns the labels, places the points and translates every
//! predicate into point ids.

pub mod json;

pub use json::{load_problem, load_problems, parse_problem};

use crate::error::{DdarError, DdarResult};
use crate::ir::{GeoState, Goal, Metadata, PointId, Predicate, SymbolTable};
use crate::oracle::{Construction, Oracle};
use num_rational::BigRational;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A geometric problem as written in a problem file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryProblem {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Points in construction order
    pub points: Vec<PointSpec>,

    /// Pairs that must not coincide
    #[serde(default)]
    pub distinct: Vec<[String; 2]>,

    #[serde(default)]
    pub premises: Vec<PredicateSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<PredicateSpec>,
}

/// One named point; exactly one of `at` and `construct` is given
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointSpec {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<[f64; 2]>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construct: Option<ConstructionSpec>,
}

/// Construction over earlier point names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionSpec {
    Midpoint([String; 2]),
    /// `[p, a, b]`: foot of p on line ab
    Foot([String; 3]),
    Intersection([String; 4]),
    Circumcenter([String; 3]),
    /// `[p, a, b]`: p reflected over line ab
    Mirror([String; 3]),
    /// `[a, b, o]`
    LineCircle([String; 3]),
    /// `[o1, o2, p]`
    CircleCircle([String; 3]),
}

/// A predicate in the problem language: keyword, points, rational constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredicateSpec {
    pub name: String,
    pub points: Vec<String>,
    #[serde(default)]
    pub constants: Vec<String>,
}

/// Problem loader result
pub type LoadResult<T> = Result<T, LoadError>;

/// Problem loading errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// File not found or unreadable
    FileNotFound(String),

    /// JSON parsing error
    ParseError(String),

    /// Well-formed JSON that is not a valid problem
    InvalidFormat(String),

    /// A label that no point declares
    UnknownPoint(String),

    /// Predicate keyword outside the problem language
    UnsupportedPredicate(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::FileNotFound(path) => write!(f, "File not found: {}", path),
            LoadError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            LoadError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            LoadError::UnknownPoint(name) => write!(f, "Unknown point: {}", name),
            LoadError::UnsupportedPredicate(name) => write!(f, "Unsupported predicate: {}", name),
        }
    }
}

impl std::error::Error for LoadError {}

/// A problem bound to a fresh state, ready to run
#[derive(Debug, Clone)]
pub struct ResolvedProblem {
    pub state: GeoState,
    pub premises: Vec<Predicate>,
    pub distinct: Vec<(PointId, PointId)>,
}

struct Labels<'a> {
    symbols: &'a SymbolTable,
}

impl Labels<'_> {
    fn id(&self, name: &str) -> LoadResult<PointId> {
        self.symbols
            .point(name)
            .ok_or_else(|| LoadError::UnknownPoint(name.to_string()))
    }

    fn ids<const N: usize>(&self, names: &[String; N]) -> LoadResult<[PointId; N]> {
        let mut out = [PointId(0); N];
        for (slot, name) in out.iter_mut().zip(names) {
            *slot = self.id(name)?;
        }
        Ok(out)
    }

    fn all(&self, names: &[String]) -> LoadResult<Vec<PointId>> {
        names.iter().map(|n| self.id(n)).collect()
    }
}

fn rational(text: &str, pred: &str) -> LoadResult<BigRational> {
    BigRational::from_str(text.trim())
        .map_err(|_| LoadError::InvalidFormat(format!("{}: `{}` is not a rational constant", pred, text)))
}

fn arity<const N: usize>(spec: &PredicateSpec, labels: &Labels) -> LoadResult<[PointId; N]> {
    let names: &[String; N] = spec.points.as_slice().try_into().map_err(|_| {
        LoadError::InvalidFormat(format!(
            "{} takes {} points, got {}",
            spec.name,
            N,
            spec.points.len()
        ))
    })?;
    labels.ids(names)
}

fn single_constant(spec: &PredicateSpec) -> LoadResult<BigRational> {
    match spec.constants.as_slice() {
        [c] => rational(c, &spec.name),
        other => Err(LoadError::InvalidFormat(format!(
            "{} takes one constant, got {}",
            spec.name,
            other.len()
        ))),
    }
}

/// `(coef, a, b)` terms from pairs of points and one coefficient per pair
fn weighted_pairs(
    spec: &PredicateSpec,
    coefs: &[String],
    labels: &Labels,
) -> LoadResult<Vec<(BigRational, PointId, PointId)>> {
    if spec.points.len() != 2 * coefs.len() {
        return Err(LoadError::InvalidFormat(format!(
            "{} needs two points per coefficient, got {} points for {} coefficients",
            spec.name,
            spec.points.len(),
            coefs.len()
        )));
    }
    let points = labels.all(&spec.points)?;
    coefs
        .iter()
        .zip(points.chunks_exact(2))
        .map(|(c, pair)| Ok((rational(c, &spec.name)?, pair[0], pair[1])))
        .collect()
}

fn predicate(spec: &PredicateSpec, labels: &Labels) -> LoadResult<Predicate> {
    let pred = match spec.name.as_str() {
        "coll" => Predicate::Collinear(labels.all(&spec.points)?),
        "para" => Predicate::Parallel(arity(spec, labels)?),
        "perp" => Predicate::Perpendicular(arity(spec, labels)?),
        "cong" => Predicate::Congruent(arity(spec, labels)?),
        "eqangle" => Predicate::EqualAngle(arity(spec, labels)?),
        "eqratio" => Predicate::EqualRatio(arity(spec, labels)?),
        "aconst" | "s_angle" => Predicate::AngleConst {
            points: arity(spec, labels)?,
            degrees: single_constant(spec)?,
        },
        "rconst" => Predicate::RatioConst {
            points: arity(spec, labels)?,
            ratio: single_constant(spec)?,
        },
        "angeq" | "distmeq" => {
            let Some((last, coefs)) = spec.constants.split_last() else {
                return Err(LoadError::InvalidFormat(format!("{} needs a trailing constant", spec.name)));
            };
            let terms = weighted_pairs(spec, coefs, labels)?;
            let constant = rational(last, &spec.name)?;
            if spec.name == "angeq" {
                Predicate::AngleSum {
                    terms,
                    degrees: constant,
                }
            } else {
                Predicate::RatioProduct { terms, constant }
            }
        }
        "distseq" => Predicate::LengthSum {
            terms: weighted_pairs(spec, &spec.constants, labels)?,
        },
        "cyclic" => Predicate::Cyclic(labels.all(&spec.points)?),
        "cyclic_with_centers" => {
            let count = single_constant(spec)?
                .to_integer()
                .to_usize()
                .filter(|&n| n <= spec.points.len())
                .ok_or_else(|| LoadError::InvalidFormat("cyclic_with_centers: bad center count".to_string()))?;
            let points = labels.all(&spec.points)?;
            Predicate::CyclicWithCenters {
                centers: points[..count].to_vec(),
                points: points[count..].to_vec(),
            }
        }
        "midp" => {
            let [mid, a, b] = arity(spec, labels)?;
            Predicate::Midpoint { mid, a, b }
        }
        "overlap" => {
            let [a, b] = arity(spec, labels)?;
            Predicate::Overlap(a, b)
        }
        "acompute" => Predicate::AngleCompute(arity(spec, labels)?),
        other => return Err(LoadError::UnsupportedPredicate(other.to_string())),
    };
    Ok(pred)
}

fn construction(point: &PointSpec, labels: &Labels) -> LoadResult<Construction> {
    let construct = match (&point.at, &point.construct) {
        (Some([x, y]), None) => return Ok(Construction::Free { x: *x, y: *y }),
        (None, Some(c)) => c,
        _ => {
            return Err(LoadError::InvalidFormat(format!(
                "point {} needs exactly one of `at` and `construct`",
                point.name
            )))
        }
    };
    Ok(match construct {
        ConstructionSpec::Midpoint(names) => {
            let [a, b] = labels.ids(names)?;
            Construction::Midpoint(a, b)
        }
        ConstructionSpec::Foot(names) => {
            let [point, a, b] = labels.ids(names)?;
            Construction::Foot { point, a, b }
        }
        ConstructionSpec::Intersection(names) => Construction::Intersection(labels.ids(names)?),
        ConstructionSpec::Circumcenter(names) => {
            let [a, b, c] = labels.ids(names)?;
            Construction::Circumcenter(a, b, c)
        }
        ConstructionSpec::Mirror(names) => {
            let [point, a, b] = labels.ids(names)?;
            Construction::Mirror { point, a, b }
        }
        ConstructionSpec::LineCircle(names) => {
            let [a, b, center] = labels.ids(names)?;
            Construction::LineCircle { a, b, center }
        }
        ConstructionSpec::CircleCircle(names) => {
            let [first, second, through] = labels.ids(names)?;
            Construction::CircleCircle { first, second, through }
        }
    })
}

impl GeometryProblem {
    /// Place the points and bind every predicate to point ids.
    ///
    /// Malformed problems fail with a `LoadError`; an undefined construction
    /// fails with a `ConstructionError`.
    pub fn resolve(&self) -> DdarResult<ResolvedProblem> {
        let mut symbols = SymbolTable::new();
        for point in &self.points {
            if symbols.point(&point.name).is_some() {
                return Err(LoadError::InvalidFormat(format!("point {} is declared twice", point.name)).into());
            }
            symbols.get_or_intern_point(&point.name);
        }

        let labels = Labels { symbols: &symbols };
        let steps = self
            .points
            .iter()
            .map(|p| construction(p, &labels))
            .collect::<LoadResult<Vec<_>>>()?;
        let distinct = self
            .distinct
            .iter()
            .map(|pair| labels.ids(pair).map(|[a, b]| (a, b)))
            .collect::<LoadResult<Vec<_>>>()?;
        let premises = self
            .premises
            .iter()
            .map(|p| predicate(p, &labels))
            .collect::<LoadResult<Vec<_>>>()?;
        let goal = self.goal.as_ref().map(|g| predicate(g, &labels)).transpose()?;
        if premises.iter().any(|p| matches!(p, Predicate::AngleCompute(_))) {
            return Err(DdarError::InvalidPredicate("acompute can only be a goal".to_string()));
        }

        let names = self.points.iter().map(|p| p.name.clone()).collect();
        let oracle = Oracle::from_constructions(&steps, names)?;
        let mut metadata = Metadata::new(&self.id);
        if let Some(description) = &self.description {
            metadata = metadata.with_description(description);
        }
        let mut state = GeoState::new(symbols, oracle).with_metadata(metadata);
        if let Some(target) = goal {
            state = state.with_goal(Goal::single(target));
        }
        Ok(ResolvedProblem {
            state,
            premises,
            distinct,
        })
    }
}
