//! Symbol interning for geometric objects
//!
//! Type-safe newtype wrappers for object IDs and a symbol table mapping point
//! labels to dense `PointId`s. Lines and circles are created by the registry
//! and never carry labels.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype wrapper for point identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PointId(pub u32);

/// Newtype wrapper for line identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineId(pub u32);

/// Newtype wrapper for circle identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CircleId(pub u32);

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

impl fmt::Display for CircleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// Symbol table for interning point labels
///
/// Each unique label maps to exactly one ID; IDs are dense and follow
/// declaration order, which makes every index built from them deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolTable {
    point_map: FxHashMap<String, PointId>,
    point_labels: Vec<String>,
}

impl SymbolTable {
    /// Create a new empty symbol table
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a point label, returning its ID (creates new ID if label not seen before)
    pub fn get_or_intern_point(&mut self, label: &str) -> PointId {
        if let Some(&id) = self.point_map.get(label) {
            return id;
        }
        let id = PointId(self.point_labels.len() as u32);
        self.point_map.insert(label.to_string(), id);
        self.point_labels.push(label.to_string());
        id
    }

    /// Look up a label without interning it
    pub fn point(&self, label: &str) -> Option<PointId> {
        self.point_map.get(label).copied()
    }

    /// Get the label for a point ID
    pub fn point_label(&self, id: PointId) -> Option<&str> {
        self.point_labels.get(id.0 as usize).map(String::as_str)
    }

    /// Label for diagnostics, falling back to the raw ID
    pub fn label(&self, id: PointId) -> String {
        self.point_label(id)
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string())
    }

    /// All point IDs in declaration order
    pub fn points(&self) -> impl Iterator<Item = PointId> + '_ {
        (0..self.point_labels.len() as u32).map(PointId)
    }

    /// Get the number of interned points
    pub fn num_points(&self) -> usize {
        self.point_labels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_interning() {
        let mut table = SymbolTable::new();
        let a1 = table.get_or_intern_point("A");
        let b = table.get_or_intern_point("B");
        let a2 = table.get_or_intern_point("A");

        assert_eq!(a1, a2, "Same label should return same ID");
        assert_ne!(a1, b, "Different labels should return different IDs");
        assert_eq!(table.num_points(), 2);
    }

    #[test]
    fn test_point_label_lookup() {
        let mut table = SymbolTable::new();
        let a = table.get_or_intern_point("A");

        assert_eq!(table.point_label(a), Some("A"));
        assert_eq!(table.point("A"), Some(a));
        assert_eq!(table.point("Z"), None);
        assert_eq!(table.label(PointId(9)), "P9");
    }

    #[test]
    fn test_deduplication() {
        let mut table = SymbolTable::new();

        for _ in 0..100 {
            table.get_or_intern_point("A");
            table.get_or_intern_point("B");
            table.get_or_intern_point("C");
        }

        assert_eq!(table.num_points(), 3, "Should deduplicate repeated interning");
        assert_eq!(table.points().collect::<Vec<_>>(), vec![PointId(0), PointId(1), PointId(2)]);
    }
}
