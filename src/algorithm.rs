use rand::Rng;

use crate::energy::EnergyModel;
use crate::glauber::Glauber;
use crate::lattice::Lattice;
use crate::metropolis::Metropolis;
use crate::params::Algorithm;
use crate::wolff::Wolff;

/// One discrete transition of the lattice.
pub trait UpdateStrategy {
    fn step<R: Rng + ?Sized>(
        &self,
        lattice: &mut Lattice,
        model: &EnergyModel,
        temperature: f64,
        rng: &mut R,
    );
}

impl UpdateStrategy for Algorithm {
    #[inline]
    fn step<R: Rng + ?Sized>(
        &self,
        lattice: &mut Lattice,
        model: &EnergyModel,
        temperature: f64,
        rng: &mut R,
    ) {
        match self {
            Algorithm::Metropolis => Metropolis.step(lattice, model, temperature, rng),
            Algorithm::Glauber => Glauber.step(lattice, model, temperature, rng),
            Algorithm::Wolff => Wolff.step(lattice, model, temperature, rng),
        }
    }
}
