//! Lattice geometries. A lattice is nothing more than a fixed, reproducible ordering of sites
//! and bonds.

/// Periodic chain.
pub mod chain;
/// Complete graph, used by the infinite range model.
pub mod fully_connected;
/// Arbitrary graphs from a list of edges.
pub mod graph;
/// Periodic square lattice.
pub mod square;

pub use chain::ChainLattice;
pub use fully_connected::FullyConnectedLattice;
pub use graph::{Edge, GraphLattice};
pub use square::SquareLattice;

/// Enumerates the sites and bonds of a lattice.
pub trait Lattice {
    /// Number of sites.
    fn num_sites(&self) -> usize;

    /// Number of bonds.
    fn num_bonds(&self) -> usize;

    /// First site of a bond.
    fn source(&self, bond: usize) -> usize;

    /// Second site of a bond.
    fn target(&self, bond: usize) -> usize;

    /// Both sites of a bond.
    fn bond(&self, bond: usize) -> Edge {
        (self.source(bond), self.target(bond))
    }

    /// Sign of a site on the sublattice decomposition, 1 if the lattice has none.
    fn site_phase(&self, _site: usize) -> f64 {
        1.0
    }
}
