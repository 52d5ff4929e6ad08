//! Geometry module - semantic operations on a run's state
//!
//! `normalize` turns surface predicates into kernel facts, `constructions`
//! asserts facts and `check` queries them. No rule matching happens here.

pub mod check;
pub mod constructions;
pub mod normalize;

pub use check::Detect;
pub use constructions::Construct;
pub use normalize::{canonical_points, predicate_facts};
