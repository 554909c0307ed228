use crate::cluster::union_find::UnionFind;

/// Moments of the cluster weight distribution gathered during labeling.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClusterMoments {
    /// Number of clusters.
    pub num_clusters: usize,
    /// Sum of squared cluster weights.
    pub weight2: f64,
    /// Sum of the fourth powers of the cluster weights.
    pub weight4: f64,
    /// Weight of the largest cluster.
    pub max_weight: usize,
}

impl ClusterMoments {
    fn accumulate(&mut self, weight: usize) {
        let w = weight as f64;
        let w2 = w * w;
        self.num_clusters += 1;
        self.weight2 += w2;
        self.weight4 += w2 * w2;
        self.max_weight = self.max_weight.max(weight);
    }
}

impl UnionFind {
    /// Assign canonical ids `0..k` to all clusters and return `k`.
    ///
    /// Roots are numbered in ascending index order, then every fragment copies the id of its
    /// root. Must run after the last union of a sweep.
    pub fn label(&mut self) -> usize {
        self.label_with(|_, _| ())
    }

    /// Label clusters as in [`UnionFind::label`], calling `f(id, weight)` once for every root.
    pub fn label_with<F>(&mut self, mut f: F) -> usize
    where
        F: FnMut(usize, usize),
    {
        let mut num_clusters = 0;
        for (index, fragment) in self.fragments.iter_mut().enumerate() {
            if fragment.parent == index {
                fragment.id = num_clusters;
                f(num_clusters, fragment.weight);
                num_clusters += 1;
            }
        }
        for index in 0..self.fragments.len() {
            let root = self.find(index);
            self.fragments[index].id = self.fragments[root].id;
        }
        num_clusters
    }

    /// Label clusters and return the moments of their weights.
    pub fn label_with_moments(&mut self) -> ClusterMoments {
        let mut moments = ClusterMoments::default();
        self.label_with(|_, weight| moments.accumulate(weight));
        moments
    }
}

#[cfg(test)]
mod labeling_tests {
    use super::*;

    #[test]
    fn test_ids_are_contiguous() {
        let mut forest = UnionFind::new(6);
        forest.union(5, 4);
        forest.union(1, 3);
        let nc = forest.label();
        assert_eq!(nc, 4);
        let ids = (0..6).map(|i| forest.id(i)).collect::<Vec<_>>();
        assert_eq!(ids, vec![0, 1, 2, 1, 3, 3]);
    }

    #[test]
    fn test_label_idempotent() {
        let mut forest = UnionFind::new(8);
        forest.union(0, 7);
        forest.union(2, 7);
        forest.union(3, 4);
        forest.label();
        let first = (0..8).map(|i| forest.id(i)).collect::<Vec<_>>();
        forest.label();
        let second = (0..8).map(|i| forest.id(i)).collect::<Vec<_>>();
        assert_eq!(first, second);
    }

    #[test]
    fn test_moments() {
        let mut forest = UnionFind::new(5);
        forest.union(0, 1);
        forest.union(1, 2);
        let moments = forest.label_with_moments();
        assert_eq!(moments.num_clusters, 3);
        assert_eq!(moments.max_weight, 3);
        assert_eq!(moments.weight2, 9.0 + 1.0 + 1.0);
        assert_eq!(moments.weight4, 81.0 + 1.0 + 1.0);
    }

    #[test]
    fn test_weight_sum_over_roots() {
        let mut forest = UnionFind::new(10);
        forest.union(0, 9);
        forest.union(3, 9);
        forest.union(5, 6);
        let mut total = 0;
        forest.label_with(|_, w| total += w);
        assert_eq!(total, 10);
    }
}
