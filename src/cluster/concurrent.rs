use crate::cluster::union_find::{Fragment, UnionFind};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A union-find forest whose unions may run on many threads at once.
///
/// Parent pointers are atomics, roots are always linked below the root with the smaller index
/// by compare-and-swap, so no cycle can form. Weights are not tracked while unions run, they are
/// recomputed by [`ConcurrentUnionFind::into_forest`].
#[derive(Debug)]
pub struct ConcurrentUnionFind {
    parents: Vec<AtomicUsize>,
}

impl ConcurrentUnionFind {
    /// Make `n` singleton clusters.
    pub fn new(n: usize) -> Self {
        Self {
            parents: (0..n).map(AtomicUsize::new).collect(),
        }
    }

    /// Number of fragments.
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Check if there are no fragments.
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Find the current root of `x`, halving the path on the way.
    pub fn find(&self, x: usize) -> usize {
        let mut node = x;
        loop {
            let parent = self.parents[node].load(Ordering::Acquire);
            if parent == node {
                return node;
            }
            let grandparent = self.parents[parent].load(Ordering::Acquire);
            // Losing this race is fine, another thread moved the pointer closer to the root.
            let _ = self.parents[node].compare_exchange(
                parent,
                grandparent,
                Ordering::AcqRel,
                Ordering::Relaxed,
            );
            node = grandparent;
        }
    }

    /// Join the clusters of `x` and `y`.
    pub fn union(&self, x: usize, y: usize) {
        loop {
            let rx = self.find(x);
            let ry = self.find(y);
            if rx == ry {
                return;
            }
            let (parent, child) = if rx < ry { (rx, ry) } else { (ry, rx) };
            if self.parents[child]
                .compare_exchange(child, parent, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return;
            }
        }
    }

    /// Union every pair in parallel.
    pub fn union_all(&self, pairs: &[(usize, usize)]) {
        pairs.par_iter().for_each(|(x, y)| self.union(*x, *y));
    }

    /// Convert into a sequential forest with every site weighing 1.
    pub fn into_forest(self) -> UnionFind {
        let n = self.parents.len();
        let fragments = self
            .parents
            .into_iter()
            .map(AtomicUsize::into_inner)
            .enumerate()
            .map(|(index, parent)| Fragment {
                parent,
                weight: 0,
                id: index,
            })
            .collect::<Vec<_>>();
        let mut forest = UnionFind::from_parts(fragments, n);
        for index in 0..n {
            let root = forest.find(index);
            forest.fragments[root].weight += 1;
        }
        // Interior nodes point straight at their root after the loop above.
        for index in 0..n {
            if !forest.is_root(index) {
                forest.fragments[index].weight = 1;
            }
        }
        forest
    }
}
