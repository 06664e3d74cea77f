use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::algorithm::UpdateStrategy;
use crate::energy::EnergyModel;
use crate::error::{Result, SimulationError};
use crate::lattice::Lattice;
use crate::observables::Observables;
use crate::params::SimulationParameters;

/// The lattice together with everything that drives it.
#[derive(Debug, Clone)]
pub struct Simulation {
    params: SimulationParameters,
    model: EnergyModel,
    lattice: Lattice,
    rng: StdRng,
    steps: u64,
}

/// What the renderer gets after every step.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub step: u64,
    pub lattice: &'a Lattice,
    pub observables: Observables,
}

impl Simulation {
    pub fn new(params: SimulationParameters) -> Result<Self> {
        Self::with_rng(params, StdRng::from_entropy())
    }

    pub fn with_rng(params: SimulationParameters, mut rng: StdRng) -> Result<Self> {
        params.validate()?;
        let lattice = Lattice::random(params.side, params.states, &mut rng);
        Ok(Self {
            model: EnergyModel::new(params.coupling),
            params,
            lattice,
            rng,
            steps: 0,
        })
    }

    /// Starts from a given lattice instead of a random one.
    pub fn with_lattice(params: SimulationParameters, lattice: Lattice, rng: StdRng) -> Result<Self> {
        let mut simulation = Self::with_rng(params, rng)?;
        simulation.load_lattice(lattice)?;
        Ok(simulation)
    }

    #[inline(always)]
    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    #[inline(always)]
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    #[inline(always)]
    pub fn model(&self) -> &EnergyModel {
        &self.model
    }

    /// Steps taken since the last reset.
    #[inline(always)]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn advance(&mut self) {
        self.params.algorithm.step(
            &mut self.lattice,
            &self.model,
            self.params.temperature,
            &mut self.rng,
        );
        self.steps += 1;
    }

    pub fn observables(&self) -> Observables {
        Observables::measure(&self.lattice, &self.model)
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            step: self.steps,
            lattice: &self.lattice,
            observables: self.observables(),
        }
    }

    pub fn reset(&mut self) {
        self.lattice.randomize(&mut self.rng);
        self.steps = 0;
    }

    /// Replaces the parameters and reinitializes the lattice. On error nothing changes.
    pub fn apply(&mut self, params: SimulationParameters) -> Result<()> {
        params.validate()?;
        self.lattice = Lattice::random(params.side, params.states, &mut self.rng);
        self.model = EnergyModel::new(params.coupling);
        self.params = params;
        self.steps = 0;
        Ok(())
    }

    /// Swaps in a lattice of matching shape, e.g. one loaded from CSV.
    pub fn load_lattice(&mut self, lattice: Lattice) -> Result<()> {
        if lattice.side() != self.params.side {
            return Err(SimulationError::invalid(
                "side",
                format!("lattice side {} does not match {}", lattice.side(), self.params.side),
            ));
        }
        if lattice.states() != self.params.states {
            return Err(SimulationError::invalid(
                "states",
                format!("lattice has {} states, expected {}", lattice.states(), self.params.states),
            ));
        }
        self.lattice = lattice;
        self.steps = 0;
        Ok(())
    }
}
