use crate::energy::EnergyModel;
use crate::lattice::Lattice;

/// Observables derived from one lattice state. Always recomputed from scratch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observables {
    pub magnetization: f64,
    pub energy: f64,
    pub correlation: f64,
}

impl Observables {
    pub fn measure(lattice: &Lattice, model: &EnergyModel) -> Self {
        Self {
            magnetization: magnetization(lattice),
            energy: energy(lattice, model),
            correlation: correlation(lattice),
        }
    }
}

/// Mean deviation of the spins from the mid state `Q / 2`.
pub fn magnetization(lattice: &Lattice) -> f64 {
    let mid = lattice.states() as f64 / 2.0;
    let size = lattice.size() as f64;
    lattice
        .cells()
        .iter()
        .map(|s| (*s as f64 - mid) / size)
        .sum()
}

/// `-J` for every (cell, neighbour) pair sharing a state; each bond is counted from both ends.
pub fn energy(lattice: &Lattice, model: &EnergyModel) -> f64 {
    let mut energy = 0.0;
    for ((x, y), spin) in lattice.sites() {
        for site in lattice.neighbors(x, y) {
            if lattice[site] == spin {
                energy -= model.coupling;
            }
        }
    }
    energy
}

/// Fraction of bonds (right and down neighbour of each cell) whose ends agree.
pub fn correlation(lattice: &Lattice) -> f64 {
    let mut equal = 0usize;
    let mut count = 0usize;
    for ((x, y), spin) in lattice.sites() {
        let [_, down, _, right] = lattice.neighbors(x, y);
        for site in [down, right] {
            if lattice[site] == spin {
                equal += 1;
            }
            count += 1;
        }
    }
    equal as f64 / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn uniform_lattice_is_fully_correlated() {
        let lattice = Lattice::uniform(7, 4, 1);
        let model = EnergyModel::new(1.5);

        assert_relative_eq!(correlation(&lattice), 1.0);
        assert_relative_eq!(energy(&lattice, &model), -1.5 * 4.0 * 49.0);
        assert_relative_eq!(magnetization(&lattice), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn checkerboard_has_no_like_bonds() {
        let lattice = Lattice::from_rows(&[vec![0, 1], vec![1, 0]], 2).unwrap();
        let observables = Observables::measure(&lattice, &EnergyModel::new(1.0));

        assert_relative_eq!(observables.correlation, 0.0);
        assert_relative_eq!(observables.energy, 0.0);
        assert_relative_eq!(observables.magnetization, -0.5);
    }

    #[test]
    fn magnetization_uses_real_mid_state() {
        let lattice = Lattice::uniform(3, 3, 2);
        assert_relative_eq!(magnetization(&lattice), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn stripes_correlate_along_one_axis() {
        let rows: Vec<Vec<u16>> = (0..4).map(|x| vec![(x % 2) as u16; 4]).collect();
        let lattice = Lattice::from_rows(&rows, 2).unwrap();

        assert_relative_eq!(correlation(&lattice), 0.5);
        assert_relative_eq!(energy(&lattice, &EnergyModel::new(1.0)), -32.0);
    }
}
