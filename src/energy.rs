use rand::Rng;

use crate::lattice::{Lattice, Spin};

/// Nearest-neighbour Potts interaction with strength `J`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyModel {
    pub coupling: f64,
}

impl EnergyModel {
    pub fn new(coupling: f64) -> Self {
        Self { coupling }
    }

    /// Energy change for replacing the spin at `(x, y)` by `new`: each neighbour holding
    /// `old` contributes `-J`, each neighbour holding `new` contributes `+J`.
    pub fn energy_delta(&self, lattice: &Lattice, x: usize, y: usize, old: Spin, new: Spin) -> f64 {
        let mut delta = 0.0;
        for site in lattice.neighbors(x, y) {
            let neighbor = lattice[site];
            if neighbor == old {
                delta -= self.coupling;
            }
            if neighbor == new {
                delta += self.coupling;
            }
        }
        delta
    }

    /// Probability that a like-spin bond joins a Wolff cluster, `1 - exp(-J/T)`.
    pub fn bond_probability(&self, temperature: f64) -> f64 {
        if temperature == 0.0 {
            return if self.coupling > 0.0 { 1.0 } else { 0.0 };
        }
        1.0 - (-self.coupling / temperature).exp()
    }
}

/// `exp(-delta/T)`, taking its limit at `T == 0`.
pub fn boltzmann_factor(delta: f64, temperature: f64) -> f64 {
    if temperature == 0.0 {
        return if delta > 0.0 { 0.0 } else { 1.0 };
    }
    (-delta / temperature).exp()
}

/// Metropolis acceptance: downhill moves always pass without consuming a draw,
/// anything else is tested against one fresh uniform draw.
#[inline(always)]
pub fn accepts<R: Rng + ?Sized>(delta: f64, temperature: f64, rng: &mut R) -> bool {
    delta < 0.0 || rng.gen::<f64>() < boltzmann_factor(delta, temperature)
}
