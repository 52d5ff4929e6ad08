//! Intermediate Representation (IR) module
//!
//! This module provides the core data structures of a deduction run:
//! - **symbols**: Type-safe identifiers for points, lines and circles
//! - **facts**: Surface predicates, kernel facts and fact storage
//! - **state**: The per-run bundle of oracle, registry, tables and facts
//! - **coords**: Floating-point geometry used by the oracle
//!
//! # Example
//!
//! ```rust
//! use ddar_core::ir::*;
//! use ddar_core::oracle::Oracle;
//!
//! let mut symbols = SymbolTable::new();
//! let mut coords = CoordinateStore::new();
//! for (name, x, y) in [("a", 0.0, 0.0), ("b", 1.0, 0.0), ("c", 0.0, 1.0)] {
//!     symbols.get_or_intern_point(name);
//!     coords.push(Point2D::new(x, y));
//! }
//! let labels = vec!["a".into(), "b".into(), "c".into()];
//! let state = GeoState::new(symbols, Oracle::new(coords, labels));
//!
//! assert_eq!(state.registry.live_lines().count(), 3);
//! assert_eq!(state.num_facts(), 0);
//! ```

mod coords;
mod facts;
mod state;
mod symbols;

// Re-export all public items for convenient access
pub use coords::{ops, CoordinateStore, NumCircle, NumLine, Point2D, ATOM};
pub use facts::{similar_permutations, Fact, FactStore, FactType, Predicate, Provenance};
pub use state::{GeoState, Goal, Metadata, PairSymbols};
pub use symbols::{CircleId, LineId, PointId, SymbolTable};
