use rand::Rng;

use crate::algorithm::UpdateStrategy;
use crate::energy::{accepts, EnergyModel};
use crate::lattice::Lattice;

/// Single spin-flip attempt at one uniformly random site.
/// A sweep's worth of work takes `L * L` calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct Glauber;

impl UpdateStrategy for Glauber {
    fn step<R: Rng + ?Sized>(
        &self,
        lattice: &mut Lattice,
        model: &EnergyModel,
        temperature: f64,
        rng: &mut R,
    ) {
        let side = lattice.side();
        let x = rng.gen_range(0..side);
        let y = rng.gen_range(0..side);

        let old = lattice.get(x, y);
        let new = rng.gen_range(0..lattice.states());

        let delta = model.energy_delta(lattice, x, y, old, new);
        if accepts(delta, temperature, rng) {
            lattice.set(x, y, new);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn changes_at_most_one_site_per_step() {
        let model = EnergyModel::new(1.0);
        let mut rng = StdRng::seed_from_u64(11);
        let mut lattice = Lattice::random(10, 4, &mut rng);

        for _ in 0..200 {
            let before = lattice.clone();
            Glauber.step(&mut lattice, &model, 2.0, &mut rng);
            let changed = before
                .cells()
                .iter()
                .zip(lattice.cells())
                .filter(|(a, b)| a != b)
                .count();
            assert!(changed <= 1);
        }
    }

    #[test]
    fn high_temperature_eventually_moves() {
        let model = EnergyModel::new(1.0);
        let mut rng = StdRng::seed_from_u64(5);
        let mut lattice = Lattice::uniform(4, 3, 0);
        for _ in 0..500 {
            Glauber.step(&mut lattice, &model, 50.0, &mut rng);
        }
        assert!(lattice.cells().iter().any(|s| *s != 0));
    }
}
