use std::ops::Index;

use rand::Rng;
use tap::Tap;

use crate::error::{Result, SimulationError};

pub type Spin = u16;

/// Lattice coordinate, `(x, y)`. `x` selects the row.
pub type Site = (usize, usize);

/// Square toroidal grid of Potts spins, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lattice {
    side: usize,
    states: Spin,
    cells: Vec<Spin>,
}

impl Lattice {
    /// Every cell holds `spin`.
    pub fn uniform(side: usize, states: Spin, spin: Spin) -> Self {
        assert!(side >= 1, "lattice side must be at least 1");
        assert!(spin < states, "spin {spin} out of range for {states} states");
        let size = side
            .checked_mul(side)
            .unwrap_or_else(|| panic!("lattice side {side} overflows the cell count"));
        Self {
            side,
            states,
            cells: vec![spin; size],
        }
    }

    pub fn random<R: Rng + ?Sized>(side: usize, states: Spin, rng: &mut R) -> Self {
        Self::uniform(side, states, 0).tap_mut(|l| l.randomize(rng))
    }

    /// Builds a lattice from explicit rows; all rows must have the lattice's side length.
    pub fn from_rows(rows: &[Vec<Spin>], states: Spin) -> Result<Self> {
        let side = rows.len();
        if side == 0 {
            return Err(SimulationError::MalformedLattice {
                line: 1,
                reason: "no rows".to_owned(),
            });
        }

        let mut cells = Vec::with_capacity(side * side);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != side {
                return Err(SimulationError::MalformedLattice {
                    line: i + 1,
                    reason: format!("expected {side} columns, found {}", row.len()),
                });
            }
            if let Some(spin) = row.iter().find(|s| **s >= states) {
                return Err(SimulationError::MalformedLattice {
                    line: i + 1,
                    reason: format!("spin {spin} out of range for {states} states"),
                });
            }
            cells.extend_from_slice(row);
        }

        Ok(Self { side, states, cells })
    }

    #[inline(always)]
    pub fn side(&self) -> usize {
        self.side
    }

    #[inline(always)]
    pub fn states(&self) -> Spin {
        self.states
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    #[inline(always)]
    pub fn cells(&self) -> &[Spin] {
        &self.cells
    }

    #[inline(always)]
    pub fn index_of(&self, (x, y): Site) -> usize {
        (x % self.side) * self.side + (y % self.side)
    }

    #[inline(always)]
    pub fn site_of(&self, index: usize) -> Site {
        (index / self.side, index % self.side)
    }

    /// Coordinates wrap around, so any `x` and `y` are accepted.
    #[inline(always)]
    pub fn get(&self, x: usize, y: usize) -> Spin {
        self.cells[self.index_of((x, y))]
    }

    #[inline(always)]
    pub fn set(&mut self, x: usize, y: usize, spin: Spin) {
        assert!(spin < self.states, "spin {spin} out of range for {} states", self.states);
        let index = self.index_of((x, y));
        self.cells[index] = spin;
    }

    /// Toroidal neighbours in fixed order: up, down, left, right.
    #[inline(always)]
    pub fn neighbors(&self, x: usize, y: usize) -> [Site; 4] {
        let l = self.side;
        let (x, y) = (x % l, y % l);
        [
            ((x + l - 1) % l, y),
            ((x + 1) % l, y),
            (x, (y + l - 1) % l),
            (x, (y + 1) % l),
        ]
    }

    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let states = self.states;
        for cell in &mut self.cells {
            *cell = rng.gen_range(0..states);
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Spin]> + '_ {
        self.cells.chunks(self.side)
    }

    /// Every site in sweep order (row-major) with its spin.
    pub fn sites(&self) -> impl Iterator<Item = (Site, Spin)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, s)| (self.site_of(i), *s))
    }
}

impl Index<Site> for Lattice {
    type Output = Spin;

    #[inline(always)]
    fn index(&self, site: Site) -> &Self::Output {
        &self.cells[self.index_of(site)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn neighbors_wrap_around_edges() {
        let lattice = Lattice::uniform(5, 2, 0);

        assert_eq!(lattice.neighbors(0, 0), [(4, 0), (1, 0), (0, 4), (0, 1)]);
        assert_eq!(lattice.neighbors(4, 4), [(3, 4), (0, 4), (4, 3), (4, 0)]);
        assert_eq!(lattice.neighbors(2, 3), [(1, 3), (3, 3), (2, 2), (2, 4)]);
    }

    #[test]
    fn single_cell_is_its_own_neighbor() {
        let lattice = Lattice::uniform(1, 3, 2);
        assert_eq!(lattice.neighbors(0, 0), [(0, 0); 4]);
    }

    #[test]
    fn get_and_set_normalize_coordinates() {
        let mut lattice = Lattice::uniform(3, 4, 0);
        lattice.set(4, 7, 3);

        assert_eq!(lattice.get(1, 1), 3);
        assert_eq!(lattice[(1, 1)], 3);
        assert_eq!(lattice.get(1, 4), 3);
    }

    #[test]
    #[should_panic]
    fn set_rejects_out_of_range_spin() {
        let mut lattice = Lattice::uniform(3, 4, 0);
        lattice.set(0, 0, 4);
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn uniform_rejects_overflowing_side() {
        Lattice::uniform(usize::MAX / 2, 2, 0);
    }

    #[test]
    fn randomize_stays_in_range_and_uses_every_state() {
        let mut rng = StdRng::seed_from_u64(7);
        let lattice = Lattice::random(20, 4, &mut rng);

        assert!(lattice.cells().iter().all(|s| *s < 4));
        for state in 0..4 {
            assert!(lattice.cells().contains(&state));
        }
    }

    #[test]
    fn from_rows_validates_shape_and_range() {
        let lattice = Lattice::from_rows(&[vec![0, 1], vec![1, 0]], 2).unwrap();
        assert_eq!(lattice.get(0, 1), 1);
        assert_eq!(lattice.get(1, 1), 0);

        assert!(matches!(
            Lattice::from_rows(&[vec![0, 1], vec![1]], 2),
            Err(SimulationError::MalformedLattice { line: 2, .. })
        ));
        assert!(matches!(
            Lattice::from_rows(&[vec![0, 2], vec![1, 0]], 2),
            Err(SimulationError::MalformedLattice { line: 1, .. })
        ));
        assert!(Lattice::from_rows(&[], 2).is_err());
    }

    #[test]
    fn sites_follow_row_major_order() {
        let lattice = Lattice::from_rows(&[vec![0, 1], vec![2, 3]], 4).unwrap();
        let sites: Vec<_> = lattice.sites().collect();
        assert_eq!(sites, vec![((0, 0), 0), ((0, 1), 1), ((1, 0), 2), ((1, 1), 3)]);
    }
}
