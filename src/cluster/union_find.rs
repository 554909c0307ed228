use crate::cluster::Verify;
use std::cmp::Ordering;

/// A node of the cluster forest.
///
/// A fragment is a lattice site for classical models, or a piece of world line between two
/// operators for the loop algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fragment {
    pub(crate) parent: usize,
    pub(crate) weight: usize,
    pub(crate) id: usize,
}

impl Fragment {
    fn root(index: usize, weight: usize) -> Self {
        Self {
            parent: index,
            weight,
            id: index,
        }
    }
}

/// Disjoint set forest with union by weight and full path compression.
///
/// Fragments are addressed by index, the forest can grow in the middle of a pass with
/// [`UnionFind::add`]. On a union of two roots of equal weight the root with the smaller index
/// becomes the parent.
#[derive(Clone, Debug, Default)]
pub struct UnionFind {
    pub(crate) fragments: Vec<Fragment>,
    total_weight: usize,
}

impl UnionFind {
    /// Make a forest of `n` singleton clusters of weight 1.
    pub fn new(n: usize) -> Self {
        let mut forest = Self::default();
        forest.reset(n);
        forest
    }

    /// Reset to `n` singleton clusters of weight 1, keeping the allocation.
    pub fn reset(&mut self, n: usize) {
        self.fragments.clear();
        self.fragments.extend((0..n).map(|i| Fragment::root(i, 1)));
        self.total_weight = n;
    }

    /// Add a new root fragment with weight 0 and return its index.
    pub fn add(&mut self) -> usize {
        let index = self.fragments.len();
        self.fragments.push(Fragment::root(index, 0));
        index
    }

    /// Number of fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Check if there are no fragments.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Sum of the weights of all clusters.
    pub fn total_weight(&self) -> usize {
        self.total_weight
    }

    /// Check if `x` is the root of its cluster.
    pub fn is_root(&self, x: usize) -> bool {
        self.fragments[x].parent == x
    }

    /// Weight of the subtree under `x`, for a root the weight of the whole cluster.
    pub fn weight(&self, x: usize) -> usize {
        self.fragments[x].weight
    }

    /// Canonical cluster id of `x`, only meaningful after a labeling pass.
    pub fn id(&self, x: usize) -> usize {
        self.fragments[x].id
    }

    /// Find the root of `x` without modifying the forest.
    ///
    /// Panics if the parent chain does not terminate.
    pub fn root_of(&self, x: usize) -> usize {
        let mut node = x;
        let mut steps = 0;
        loop {
            let parent = self.fragments[node].parent;
            if parent == node {
                return node;
            }
            node = parent;
            steps += 1;
            assert!(
                steps <= self.fragments.len(),
                "cycle in cluster forest reached from fragment {}",
                x
            );
        }
    }

    /// Find the root of `x` and point every fragment on the path directly at it.
    pub fn find(&mut self, x: usize) -> usize {
        let root = self.root_of(x);
        let mut node = x;
        while node != root {
            let next = self.fragments[node].parent;
            self.fragments[node].parent = root;
            node = next;
        }
        root
    }

    /// Merge the clusters of `x` and `y`, return the root of the merged cluster.
    ///
    /// If both are already in the same cluster the forest is left as is and the shared root is
    /// returned.
    pub fn union(&mut self, x: usize, y: usize) -> usize {
        let rx = self.find(x);
        let ry = self.find(y);
        if rx == ry {
            return rx;
        }
        let wx = self.fragments[rx].weight;
        let wy = self.fragments[ry].weight;
        let (parent, child) = match wx.cmp(&wy) {
            Ordering::Greater => (rx, ry),
            Ordering::Less => (ry, rx),
            Ordering::Equal if rx < ry => (rx, ry),
            Ordering::Equal => (ry, rx),
        };
        self.fragments[child].parent = parent;
        self.fragments[parent].weight += self.fragments[child].weight;
        parent
    }

    /// Check if `x` and `y` are in the same cluster.
    pub fn connected(&self, x: usize, y: usize) -> bool {
        self.root_of(x) == self.root_of(y)
    }

    /// Iterate over the roots in ascending index order.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.fragments
            .iter()
            .enumerate()
            .filter(|(i, f)| f.parent == *i)
            .map(|(i, _)| i)
    }

    #[cfg(feature = "parallel")]
    pub(crate) fn from_parts(fragments: Vec<Fragment>, total_weight: usize) -> Self {
        Self {
            fragments,
            total_weight,
        }
    }
}

impl Verify for UnionFind {
    fn verify(&self) -> bool {
        let n = self.fragments.len();
        let chains_terminate = (0..n).all(|x| {
            let mut node = x;
            for _ in 0..=n {
                let parent = self.fragments[node].parent;
                if parent >= n {
                    return false;
                }
                if parent == node {
                    return true;
                }
                node = parent;
            }
            false
        });
        if !chains_terminate {
            return false;
        }
        let weights_ordered = self
            .fragments
            .iter()
            .all(|f| f.weight <= self.fragments[f.parent].weight);
        let root_weight: usize = self.roots().map(|r| self.fragments[r].weight).sum();
        weights_ordered && root_weight == self.total_weight
    }
}
