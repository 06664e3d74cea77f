use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::params::SimulationParameters;
use crate::simulation::{Simulation, Snapshot};

/// Receives every snapshot the controller emits (renderer, recorder, logger...).
pub trait SnapshotRegisterer {
    fn register(&mut self, snapshot: &Snapshot<'_>);
}

impl<F: FnMut(&Snapshot<'_>)> SnapshotRegisterer for F {
    fn register(&mut self, snapshot: &Snapshot<'_>) {
        self(snapshot)
    }
}

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline(always)]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<F: Fn() -> Instant> Clock for F {
    fn now(&self) -> Instant {
        self()
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RunState {
    Idle,
    Running { started_at: Instant },
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StopReason {
    Requested,
    DurationElapsed,
    Reset,
}

/// Outcome of one controller iteration.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Tick {
    /// Not running; nothing was stepped.
    Idle,
    /// Stepped; the next iteration is due at `next_at`.
    Continue { next_at: Instant },
    /// Stepped, and the run duration is now used up.
    Finished,
}

/// Requests an explicit stop from another thread (e.g. a Ctrl-C handler).
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Sender<()>,
}

impl StopHandle {
    pub fn stop(&self) {
        // the controller keeps its own receiver alive, so this only fails once it is gone
        let _ = self.tx.send(());
    }
}

/// Idle -> Running -> Idle state machine around a [`Simulation`].
pub struct RunController<S, C = SystemClock> {
    simulation: Simulation,
    registerer: S,
    clock: C,
    state: RunState,
    stop_tx: Sender<()>,
    stop_rx: Receiver<()>,
}

impl<S: SnapshotRegisterer> RunController<S, SystemClock> {
    pub fn new(simulation: Simulation, registerer: S) -> Self {
        Self::with_clock(simulation, registerer, SystemClock)
    }
}

impl<S: SnapshotRegisterer, C: Clock> RunController<S, C> {
    pub fn with_clock(simulation: Simulation, registerer: S, clock: C) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel();
        Self {
            simulation,
            registerer,
            clock,
            state: RunState::Idle,
            stop_tx,
            stop_rx,
        }
    }

    #[inline(always)]
    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    #[inline(always)]
    pub fn registerer(&self) -> &S {
        &self.registerer
    }

    #[inline(always)]
    pub fn state(&self) -> RunState {
        self.state
    }

    #[inline(always)]
    pub fn is_running(&self) -> bool {
        matches!(self.state, RunState::Running { .. })
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: self.stop_tx.clone(),
        }
    }

    pub fn into_parts(self) -> (Simulation, S) {
        (self.simulation, self.registerer)
    }

    /// Returns `false` without doing anything if a run is already in progress.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }

        self.state = RunState::Running {
            started_at: self.clock.now(),
        };
        let params = self.simulation.params();
        info!(
            algorithm = %params.algorithm,
            temperature = params.temperature,
            coupling = params.coupling,
            side = params.side,
            states = params.states,
            "run started"
        );
        true
    }

    pub fn stop(&mut self) {
        self.halt(StopReason::Requested);
    }

    fn halt(&mut self, reason: StopReason) {
        if let RunState::Running { started_at } = self.state {
            let elapsed = self.clock.now().saturating_duration_since(started_at);
            info!(?reason, steps = self.simulation.steps(), ?elapsed, "run stopped");

            // requests still queued were aimed at the run that just ended
            while self.stop_rx.try_recv().is_ok() {}
        }
        self.state = RunState::Idle;
    }

    /// One iteration: step, measure, emit, then check the elapsed time.
    pub fn tick(&mut self) -> Tick {
        let started_at = match self.state {
            RunState::Idle => return Tick::Idle,
            RunState::Running { started_at } => started_at,
        };

        self.simulation.advance();
        self.emit();

        let now = self.clock.now();
        let (duration, interval) = {
            let params = self.simulation.params();
            (params.duration, params.step_interval)
        };
        if now.saturating_duration_since(started_at) >= duration {
            self.halt(StopReason::DurationElapsed);
            Tick::Finished
        } else {
            Tick::Continue {
                next_at: now + interval,
            }
        }
    }

    /// Drives the run to completion, sleeping the step interval between iterations.
    /// A stop request wakes the wait at once and no further step is taken; one that
    /// arrived before the call ends the run before its first step.
    pub fn run(&mut self) -> StopReason {
        self.start();
        if self.stop_rx.try_recv().is_ok() {
            self.halt(StopReason::Requested);
            return StopReason::Requested;
        }

        loop {
            match self.tick() {
                Tick::Continue { .. } => {}
                Tick::Finished => return StopReason::DurationElapsed,
                Tick::Idle => return StopReason::Requested,
            }

            match self.stop_rx.recv_timeout(self.simulation.params().step_interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    self.halt(StopReason::Requested);
                    return StopReason::Requested;
                }
            }
        }
    }

    /// Stops, re-randomizes the lattice and emits one snapshot without stepping.
    pub fn reset(&mut self) {
        self.halt(StopReason::Reset);
        self.simulation.reset();
        info!("lattice reset");
        self.emit();
    }

    /// Invalid parameters are rejected before anything is touched, including a running run.
    pub fn apply_settings(&mut self, params: SimulationParameters) -> Result<()> {
        if let Err(err) = params.validate() {
            warn!(%err, "settings rejected");
            return Err(err);
        }

        self.halt(StopReason::Reset);
        self.simulation.apply(params)?;
        info!(algorithm = %self.simulation.params().algorithm, "settings applied");
        self.emit();
        Ok(())
    }

    fn emit(&mut self) {
        let snapshot = self.simulation.snapshot();
        debug!(
            step = snapshot.step,
            magnetization = snapshot.observables.magnetization,
            energy = snapshot.observables.energy,
            correlation = snapshot.observables.correlation,
            "snapshot"
        );
        self.registerer.register(&snapshot);
    }
}
