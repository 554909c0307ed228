use crate::lattice::Lattice;

/// A ring of `length` sites, bond `b` joins site `b` and `b + 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainLattice {
    length: usize,
}

impl ChainLattice {
    /// Make a ring with `length` sites.
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    /// Number of sites in the ring.
    pub fn length(&self) -> usize {
        self.length
    }
}

impl Lattice for ChainLattice {
    fn num_sites(&self) -> usize {
        self.length
    }

    fn num_bonds(&self) -> usize {
        self.length
    }

    fn source(&self, bond: usize) -> usize {
        bond
    }

    fn target(&self, bond: usize) -> usize {
        if bond + 1 == self.length {
            0
        } else {
            bond + 1
        }
    }

    fn site_phase(&self, site: usize) -> f64 {
        if site % 2 == 1 {
            1.0
        } else {
            -1.0
        }
    }
}

#[cfg(test)]
mod chain_tests {
    use super::*;

    #[test]
    fn test_ring() {
        let chain = ChainLattice::new(4);
        let bonds = (0..chain.num_bonds())
            .map(|b| chain.bond(b))
            .collect::<Vec<_>>();
        assert_eq!(bonds, vec![(0, 1), (1, 2), (2, 3), (3, 0)]);
        assert_eq!(chain.site_phase(0), -1.0);
        assert_eq!(chain.site_phase(3), 1.0);
    }
}
