use bitvec::prelude::BitVec;
use rand::Rng;
use tracing::trace;

use crate::algorithm::UpdateStrategy;
use crate::energy::EnergyModel;
use crate::lattice::{Lattice, Site};

/// Cluster update: grow a like-spin cluster from a random seed, then shift every
/// member to the next state (mod Q).
#[derive(Debug, Clone, Copy, Default)]
pub struct Wolff;

impl Wolff {
    /// Returns the cluster's cell indices in the order they joined, seed first.
    /// Growth uses an explicit stack plus a visited bitmap, so each cell joins at most once.
    pub fn grow_cluster<R: Rng + ?Sized>(
        lattice: &Lattice,
        model: &EnergyModel,
        temperature: f64,
        seed: Site,
        rng: &mut R,
    ) -> Vec<usize> {
        let probability = model.bond_probability(temperature);
        let cells = lattice.cells();

        let seed = lattice.index_of(seed);
        let spin = cells[seed];

        let mut in_cluster: BitVec = BitVec::repeat(false, lattice.size());
        in_cluster.set(seed, true);

        let mut members = vec![seed];
        let mut frontier = vec![seed];

        while let Some(index) = frontier.pop() {
            let (x, y) = lattice.site_of(index);
            for site in lattice.neighbors(x, y) {
                let neighbor = lattice.index_of(site);
                if cells[neighbor] == spin && !in_cluster[neighbor] && rng.gen::<f64>() < probability {
                    in_cluster.set(neighbor, true);
                    members.push(neighbor);
                    frontier.push(neighbor);
                }
            }
        }

        members
    }

    /// Performs one cluster update and returns the cluster size.
    pub fn update<R: Rng + ?Sized>(
        &self,
        lattice: &mut Lattice,
        model: &EnergyModel,
        temperature: f64,
        rng: &mut R,
    ) -> usize {
        let side = lattice.side();
        let seed = (rng.gen_range(0..side), rng.gen_range(0..side));

        let cluster = Self::grow_cluster(lattice, model, temperature, seed, rng);
        let states = lattice.states();
        for index in &cluster {
            let (x, y) = lattice.site_of(*index);
            let next = (lattice.get(x, y) + 1) % states;
            lattice.set(x, y, next);
        }

        trace!(?seed, size = cluster.len(), "wolff cluster flipped");
        cluster.len()
    }
}

impl UpdateStrategy for Wolff {
    fn step<R: Rng + ?Sized>(
        &self,
        lattice: &mut Lattice,
        model: &EnergyModel,
        temperature: f64,
        rng: &mut R,
    ) {
        self.update(lattice, model, temperature, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn certain_bonds_absorb_uniform_lattice() {
        let model = EnergyModel::new(1.0);
        let mut rng = StdRng::seed_from_u64(0);
        let mut lattice = Lattice::uniform(12, 4, 2);

        assert_eq!(model.bond_probability(1e-3), 1.0);
        let cluster = Wolff::grow_cluster(&lattice, &model, 1e-3, (3, 7), &mut rng);
        assert_eq!(cluster.len(), 144);
        assert_eq!(cluster[0], lattice.index_of((3, 7)));

        let size = Wolff.update(&mut lattice, &model, 1e-3, &mut rng);
        assert_eq!(size, 144);
        assert_eq!(lattice, Lattice::uniform(12, 4, 3));
    }

    #[test]
    fn cluster_stays_inside_the_seed_domain() {
        // left half 0, right half 1; wraps so both halves are still one strip each
        let rows: Vec<Vec<u16>> = (0..6).map(|_| vec![0, 0, 0, 1, 1, 1]).collect();
        let lattice = Lattice::from_rows(&rows, 2).unwrap();
        let model = EnergyModel::new(1.0);

        let cluster = Wolff::grow_cluster(&lattice, &model, 0.0, (2, 1), &mut StdRng::seed_from_u64(1));
        assert_eq!(cluster.len(), 18);
        assert!(cluster.iter().all(|i| lattice.cells()[*i] == 0));
    }

    #[test]
    fn checkerboard_cluster_is_just_the_seed() {
        let lattice = Lattice::from_rows(&[vec![0, 1], vec![1, 0]], 2).unwrap();
        let model = EnergyModel::new(1.0);

        let cluster = Wolff::grow_cluster(&lattice, &model, 0.0, (0, 0), &mut StdRng::seed_from_u64(2));
        assert_eq!(cluster, vec![0]);
    }

    #[test]
    fn negative_coupling_never_bonds() {
        let mut lattice = Lattice::uniform(5, 3, 0);
        let model = EnergyModel::new(-1.0);

        let size = Wolff.update(&mut lattice, &model, 1.0, &mut StdRng::seed_from_u64(4));
        assert_eq!(size, 1);
        assert_eq!(lattice.cells().iter().filter(|s| **s == 1).count(), 1);
    }

    #[test]
    fn members_are_unique() {
        let model = EnergyModel::new(1.0);
        let mut rng = StdRng::seed_from_u64(8);
        let lattice = Lattice::random(20, 2, &mut rng);

        for _ in 0..20 {
            let seed = (rng.gen_range(0..20), rng.gen_range(0..20));
            let mut cluster = Wolff::grow_cluster(&lattice, &model, 1.2, seed, &mut rng);
            let len = cluster.len();
            cluster.sort_unstable();
            cluster.dedup();
            assert_eq!(cluster.len(), len);
        }
    }
}
