//! Disjoint-set forest with path compression

use std::cell::Cell;

/// Union-find over dense `usize` ids.
///
/// Parents live in `Cell`s so `find` can compress paths through `&self`.
#[derive(Debug, Clone, Default)]
pub struct UnionFind {
    parent: Vec<Cell<usize>>,
    merges: usize,
}

impl UnionFind {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a singleton class and return its id
    pub fn push(&mut self) -> usize {
        let id = self.parent.len();
        self.parent.push(Cell::new(id));
        id
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Representative of `x`'s class
    pub fn find(&self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root].get() != root {
            root = self.parent[root].get();
        }
        let mut cur = x;
        while cur != root {
            let next = self.parent[cur].get();
            self.parent[cur].set(root);
            cur = next;
        }
        root
    }

    pub fn same(&self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }

    /// Join the class of `absorb` into the class of `keep`, whose
    /// representative survives. Returns false when already joined.
    pub fn union_into(&mut self, keep: usize, absorb: usize) -> bool {
        let k = self.find(keep);
        let a = self.find(absorb);
        if k == a {
            return false;
        }
        self.parent[a].set(k);
        self.merges += 1;
        true
    }

    /// Number of successful unions so far
    pub fn merge_count(&self) -> usize {
        self.merges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_union_keeps_representative() {
        let mut uf = UnionFind::new();
        let a = uf.push();
        let b = uf.push();
        let c = uf.push();

        assert!(uf.union_into(a, b));
        assert!(uf.union_into(c, a));
        assert!(!uf.union_into(b, c));
        assert_eq!(uf.find(a), c);
        assert_eq!(uf.find(b), c);
        assert_eq!(uf.merge_count(), 2);
    }

    proptest! {
        #[test]
        fn prop_union_is_transitive(
            n in 2usize..24,
            ops in prop::collection::vec((0usize..24, 0usize..24), 0..40),
        ) {
            let mut uf = UnionFind::new();
            for _ in 0..n {
                uf.push();
            }
            // naive closure: label propagation
            let mut label: Vec<usize> = (0..n).collect();
            for (x, y) in ops {
                let (x, y) = (x % n, y % n);
                uf.union_into(x, y);
                let (keep, gone) = (label[x], label[y]);
                for l in label.iter_mut() {
                    if *l == gone {
                        *l = keep;
                    }
                }
            }
            for i in 0..n {
                for j in 0..n {
                    prop_assert_eq!(uf.same(i, j), label[i] == label[j]);
                }
            }
        }
    }
}
