use crate::lattice::Lattice;

/// A periodic `lx` by `ly` square lattice.
///
/// Site `s` sits at `(s % lx, s / lx)`. Bond `2s` joins `s` to its right neighbour and bond
/// `2s + 1` joins it to the neighbour below.
#[derive(Clone, Debug)]
pub struct SquareLattice {
    length_x: usize,
    length_y: usize,
    sources: Vec<usize>,
    targets: Vec<usize>,
    site_phases: Vec<f64>,
}

impl SquareLattice {
    /// Make an `l` by `l` lattice.
    pub fn new(l: usize) -> Self {
        Self::new_rectangular(l, l)
    }

    /// Make an `lx` by `ly` lattice.
    pub fn new_rectangular(length_x: usize, length_y: usize) -> Self {
        let nsites = length_x * length_y;
        let xy_to_index = |x: usize, y: usize| (x % length_x) + (y % length_y) * length_x;
        let (sources, targets): (Vec<_>, Vec<_>) = (0..2 * nsites)
            .map(|b| {
                let s = b / 2;
                let (x, y) = (s % length_x, s / length_x);
                if b % 2 == 0 {
                    (s, xy_to_index(x + 1, y))
                } else {
                    (s, xy_to_index(x, y + 1))
                }
            })
            .unzip();
        let site_phases = (0..nsites)
            .map(|s| {
                let (x, y) = (s % length_x, s / length_x);
                if (x + y) % 2 == 0 {
                    -1.0
                } else {
                    1.0
                }
            })
            .collect();
        Self {
            length_x,
            length_y,
            sources,
            targets,
            site_phases,
        }
    }

    /// Extent along x.
    pub fn length_x(&self) -> usize {
        self.length_x
    }

    /// Extent along y.
    pub fn length_y(&self) -> usize {
        self.length_y
    }
}

impl Lattice for SquareLattice {
    fn num_sites(&self) -> usize {
        self.length_x * self.length_y
    }

    fn num_bonds(&self) -> usize {
        2 * self.num_sites()
    }

    fn source(&self, bond: usize) -> usize {
        self.sources[bond]
    }

    fn target(&self, bond: usize) -> usize {
        self.targets[bond]
    }

    fn site_phase(&self, site: usize) -> f64 {
        self.site_phases[site]
    }
}
