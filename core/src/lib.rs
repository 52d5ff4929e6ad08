//! DDAR Core
//!
//! Deductive database with algebraic reasoning for plane geometry: forward
//! chaining over a rule catalogue, exact elimination over angles, length
//! ratios and lengths, and a floating-point oracle that vets every candidate.

pub mod algebra;  // Exact elimination tables (angle, ratio, length)
pub mod error;    // Error taxonomy
pub mod geometry; // Predicate translation, assertion and symbolic checks
pub mod ir;       // Intermediate representation (symbols, facts, state, coords)
pub mod loader;   // JSON problem files
pub mod oracle;   // Numeric coordinates and tolerance-based predicates
pub mod registry; // Union-find over points, lines and circles
pub mod rules;    // Deduction rules
pub mod search;   // Forward chaining to a fixpoint

pub use error::{ConstructionError, DdarError, DdarResult};
pub use geometry::{Construct, Detect};
pub use ir::*;
pub use loader::{load_problem, load_problems, GeometryProblem, LoadError, LoadResult, ResolvedProblem};
pub use oracle::{Construction, Oracle};
pub use rules::{all_rules, Rule, RuleCatalogue, RuleKind};
pub use search::{run_problem, solve_problem, ChainConfig, ChainStats, ForwardChainer, RunReport, Verdict};
