use crate::lattice::Lattice;

/// Every pair of `n` sites is joined by a bond, ordered lexicographically.
///
/// Enumerating the bonds costs O(n^2), cluster updates on this lattice should sample pairs
/// instead (see [`crate::classical::InfiniteRangeIsing`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FullyConnectedLattice {
    num_sites: usize,
}

impl FullyConnectedLattice {
    /// Make a complete graph on `num_sites` sites.
    pub fn new(num_sites: usize) -> Self {
        Self { num_sites }
    }

    fn pair(&self, bond: usize) -> (usize, usize) {
        let mut remaining = bond;
        let mut row_len = self.num_sites - 1;
        let mut i = 0;
        while remaining >= row_len {
            remaining -= row_len;
            row_len -= 1;
            i += 1;
        }
        (i, i + 1 + remaining)
    }
}

impl Lattice for FullyConnectedLattice {
    fn num_sites(&self) -> usize {
        self.num_sites
    }

    fn num_bonds(&self) -> usize {
        self.num_sites * self.num_sites.saturating_sub(1) / 2
    }

    fn source(&self, bond: usize) -> usize {
        self.pair(bond).0
    }

    fn target(&self, bond: usize) -> usize {
        self.pair(bond).1
    }
}
