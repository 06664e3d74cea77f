pub mod algorithm;
pub mod energy;
pub mod error;
pub mod export;
pub mod glauber;
pub mod history;
pub mod lattice;
pub mod metropolis;
pub mod observables;
pub mod params;
pub mod runner;
pub mod simulation;
pub mod wolff;

pub use algorithm::UpdateStrategy;
pub use energy::EnergyModel;
pub use error::{Result, SimulationError};
pub use history::ObservableHistory;
pub use lattice::{Lattice, Site, Spin};
pub use observables::Observables;
pub use params::{Algorithm, SimulationParameters};
pub use runner::{RunController, RunState, SnapshotRegisterer, StopHandle, StopReason, Tick};
pub use simulation::{Simulation, Snapshot};
