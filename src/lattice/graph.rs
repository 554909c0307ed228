use crate::lattice::Lattice;
use smallvec::SmallVec;
use std::cmp::max;
use std::collections::VecDeque;

/// An edge between two sites.
pub type Edge = (usize, usize);

type Incidence = SmallVec<[usize; 4]>;

/// A lattice defined by an explicit list of edges `[(site_a, site_b), ...]`.
#[derive(Clone, Debug)]
pub struct GraphLattice {
    edges: Vec<Edge>,
    incidence: Vec<Incidence>,
}

impl GraphLattice {
    /// Make a lattice from edges, the number of sites is one more than the largest index.
    pub fn from_edges(edges: Vec<Edge>) -> Self {
        let nsites = edges
            .iter()
            .map(|(a, b)| max(*a, *b) + 1)
            .max()
            .unwrap_or(0);
        Self::new(nsites, edges)
    }

    /// Make a lattice with `nsites` sites, some of which may be isolated.
    pub fn new(nsites: usize, edges: Vec<Edge>) -> Self {
        let mut incidence: Vec<Incidence> = vec![SmallVec::new(); nsites];
        edges.iter().enumerate().for_each(|(b, (va, vb))| {
            incidence[*va].push(b);
            if va != vb {
                incidence[*vb].push(b);
            }
        });
        Self { edges, incidence }
    }

    /// Copy the bond list of any lattice.
    pub fn from_lattice<L: Lattice>(lattice: &L) -> Self {
        let edges = (0..lattice.num_bonds()).map(|b| lattice.bond(b)).collect();
        Self::new(lattice.num_sites(), edges)
    }

    /// Bonds touching `site`.
    pub fn bonds_for_site(&self, site: usize) -> &[usize] {
        &self.incidence[site]
    }

    /// Sites sharing a bond with `site`.
    pub fn neighbors(&self, site: usize) -> impl Iterator<Item = usize> + '_ {
        self.incidence[site].iter().map(move |b| {
            let (a, t) = self.edges[*b];
            if a == site {
                t
            } else {
                a
            }
        })
    }

    /// Check if every site can be reached from site 0.
    pub fn is_connected(&self) -> bool {
        let nsites = self.incidence.len();
        if nsites == 0 {
            return true;
        }
        let mut seen = vec![false; nsites];
        let mut frontier = VecDeque::new();
        seen[0] = true;
        frontier.push_back(0);
        let mut count = 1;
        while let Some(site) = frontier.pop_front() {
            for next in self.neighbors(site) {
                if !seen[next] {
                    seen[next] = true;
                    count += 1;
                    frontier.push_back(next);
                }
            }
        }
        count == nsites
    }
}

impl Lattice for GraphLattice {
    fn num_sites(&self) -> usize {
        self.incidence.len()
    }

    fn num_bonds(&self) -> usize {
        self.edges.len()
    }

    fn source(&self, bond: usize) -> usize {
        self.edges[bond].0
    }

    fn target(&self, bond: usize) -> usize {
        self.edges[bond].1
    }
}
