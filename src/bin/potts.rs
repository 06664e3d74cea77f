use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use potts::export::{draw_history_chart, load_lattice_csv, save_lattice_csv, save_lattice_png};
use potts::{Algorithm, ObservableHistory, RunController, Simulation, SimulationParameters};
use rand::rngs::StdRng;
use rand::SeedableRng;
use structopt::StructOpt;
use tracing::info;

#[derive(Debug, StructOpt)]
#[structopt(name = "potts", about = "Potts model simulation on a toroidal lattice")]
struct Args {
    /// JSON file with simulation parameters; flags below override it
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,
    /// temperature T
    #[structopt(short = "t", long)]
    temperature: Option<f64>,
    /// interaction strength J
    #[structopt(short = "j", long)]
    coupling: Option<f64>,
    /// number of Potts states Q
    #[structopt(short = "q", long)]
    states: Option<u16>,
    /// lattice side L
    #[structopt(short = "l", long)]
    side: Option<usize>,
    /// metropolis, glauber or wolff
    #[structopt(short, long)]
    algorithm: Option<Algorithm>,
    /// milliseconds between steps
    #[structopt(long)]
    interval: Option<u64>,
    /// run duration in seconds
    #[structopt(long)]
    duration: Option<u64>,
    /// seed for the random generator
    #[structopt(long)]
    seed: Option<u64>,
    /// initial lattice as CSV
    #[structopt(long, parse(from_os_str))]
    input: Option<PathBuf>,
    /// write the final lattice as CSV
    #[structopt(long, parse(from_os_str))]
    csv: Option<PathBuf>,
    /// write the final lattice as PNG
    #[structopt(long, parse(from_os_str))]
    png: Option<PathBuf>,
    /// pixels per lattice site in the PNG
    #[structopt(long, default_value = "5")]
    cell_size: u32,
    /// write the observable series as CSV
    #[structopt(long, parse(from_os_str))]
    history: Option<PathBuf>,
    /// draw the observable series as PNG chart
    #[structopt(long, parse(from_os_str))]
    chart: Option<PathBuf>,
    #[structopt(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn parameters(&self) -> anyhow::Result<SimulationParameters> {
        let mut params = match &self.config {
            Some(path) => SimulationParameters::from_json(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => SimulationParameters::default(),
        };

        if let Some(t) = self.temperature {
            params.temperature = t;
        }
        if let Some(j) = self.coupling {
            params.coupling = j;
        }
        if let Some(q) = self.states {
            params.states = q;
        }
        if let Some(l) = self.side {
            params.side = l;
        }
        if let Some(a) = self.algorithm {
            params.algorithm = a;
        }
        if let Some(ms) = self.interval {
            params.step_interval = Duration::from_millis(ms);
        }
        if let Some(s) = self.duration {
            params.duration = Duration::from_secs(s);
        }

        Ok(params)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::from_args();

    tracing_subscriber::fmt()
        .with_max_level(
            args.log_level
                .parse::<tracing_subscriber::filter::LevelFilter>()
                .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO),
        )
        .with_target(false)
        .init();

    let mut params = args.parameters()?;
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let simulation = match &args.input {
        Some(path) => {
            let lattice = load_lattice_csv(path, params.states)
                .with_context(|| format!("failed to load lattice {}", path.display()))?;
            params.side = lattice.side();
            Simulation::with_lattice(params, lattice, rng)?
        }
        None => Simulation::with_rng(params, rng)?,
    };

    let mut controller = RunController::new(simulation, ObservableHistory::new());
    let handle = controller.stop_handle();
    ctrlc::set_handler(move || handle.stop()).context("failed to install Ctrl-C handler")?;

    let reason = {
        measure_time::info_time!("simulation run");
        controller.run()
    };

    let (simulation, history) = controller.into_parts();
    if let Some(last) = history.last() {
        info!(
            ?reason,
            steps = last.step,
            magnetization = last.observables.magnetization,
            energy = last.observables.energy,
            correlation = last.observables.correlation,
            "final observables"
        );
    }
    if let Some(minimal) = history.minimal_state() {
        info!(step = minimal.step, energy = minimal.energy, "lowest energy seen");
    }

    if let Some(path) = &args.csv {
        save_lattice_csv(simulation.lattice(), path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "lattice written");
    }
    if let Some(path) = &args.png {
        save_lattice_png(simulation.lattice(), path, args.cell_size)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "snapshot written");
    }
    if let Some(path) = &args.history {
        std::fs::write(path, history.to_csv())
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    if let Some(path) = &args.chart {
        draw_history_chart(&history, path, (1024, 768))
            .with_context(|| format!("failed to draw {}", path.display()))?;
    }

    Ok(())
}
