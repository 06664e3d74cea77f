use std::fmt::Write;

use itertools::{Itertools, MinMaxResult};
use ordered_float::OrderedFloat;

use crate::lattice::Lattice;
use crate::observables::Observables;
use crate::runner::SnapshotRegisterer;
use crate::simulation::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub step: u64,
    pub observables: Observables,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MinimalState {
    pub step: u64,
    pub energy: f64,
    pub lattice: Lattice,
}

/// Records every emitted snapshot's observables and keeps the lowest-energy lattice seen.
#[derive(Debug, Clone, Default)]
pub struct ObservableHistory {
    steps: Vec<Step>,
    minimal_state: Option<MinimalState>,
}

impl ObservableHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    pub fn minimal_state(&self) -> Option<&MinimalState> {
        self.minimal_state.as_ref()
    }

    pub fn clear(&mut self) {
        self.steps.clear();
        self.minimal_state = None;
    }

    /// `(min, max)` of one observable over the recorded steps.
    pub fn range(&self, f: impl Fn(&Observables) -> f64) -> Option<(f64, f64)> {
        match self.steps.iter().map(|s| f(&s.observables)).minmax_by_key(|x| OrderedFloat(*x)) {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(x) => Some((x, x)),
            MinMaxResult::MinMax(min, max) => Some((min, max)),
        }
    }

    /// Mean of one observable over the last `window` steps.
    pub fn tail_mean(&self, window: usize, f: impl Fn(&Observables) -> f64) -> Option<f64> {
        let tail = &self.steps[self.steps.len().saturating_sub(window)..];
        if tail.is_empty() {
            return None;
        }
        Some(tail.iter().map(|s| f(&s.observables)).sum::<f64>() / tail.len() as f64)
    }

    /// `step,magnetization,energy,correlation` lines with a header.
    pub fn to_csv(&self) -> String {
        let mut buffer = String::from("step,magnetization,energy,correlation\n");
        for s in &self.steps {
            let o = s.observables;
            // writing into a String cannot fail
            let _ = writeln!(buffer, "{},{},{},{}", s.step, o.magnetization, o.energy, o.correlation);
        }
        buffer
    }
}

impl SnapshotRegisterer for ObservableHistory {
    fn register(&mut self, snapshot: &Snapshot<'_>) {
        let energy = snapshot.observables.energy;
        if self.minimal_state.as_ref().map_or(f64::MAX, |m| m.energy) > energy {
            self.minimal_state = Some(MinimalState {
                step: snapshot.step,
                energy,
                lattice: snapshot.lattice.clone(),
            });
        }

        self.steps.push(Step {
            step: snapshot.step,
            observables: snapshot.observables,
        });
    }
}
