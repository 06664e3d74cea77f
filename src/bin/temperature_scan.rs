use std::path::{Path, PathBuf};

use plotters::prelude::*;
use potts::{Algorithm, Observables, ObservableHistory, Simulation, SimulationParameters, SnapshotRegisterer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use structopt::StructOpt;
use tracing::{debug, info};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "temperature_scan",
    about = "Equilibrium observables of independent Potts simulations over a temperature range"
)]
struct Args {
    #[structopt(long, default_value = "0.5")]
    from: f64,
    #[structopt(long, default_value = "2.0")]
    to: f64,
    /// number of temperatures
    #[structopt(long, default_value = "16")]
    points: usize,
    /// steps before sampling starts
    #[structopt(long, default_value = "500")]
    equilibration: usize,
    /// steps averaged per temperature
    #[structopt(long, default_value = "500")]
    samples: usize,
    #[structopt(short = "j", long, default_value = "1.0")]
    coupling: f64,
    #[structopt(short = "q", long, default_value = "4")]
    states: u16,
    #[structopt(short = "l", long, default_value = "32")]
    side: usize,
    #[structopt(short, long, default_value = "metropolis")]
    algorithm: Algorithm,
    /// base seed; temperature i uses seed + i
    #[structopt(long)]
    seed: Option<u64>,
    /// draw energy and correlation against temperature
    #[structopt(long, parse(from_os_str))]
    chart: Option<PathBuf>,
    #[structopt(long, default_value = "info")]
    log_level: String,
}

fn temperatures(args: &Args) -> Vec<f64> {
    if args.points <= 1 {
        return vec![args.from];
    }
    let step = (args.to - args.from) / (args.points - 1) as f64;
    (0..args.points).map(|i| args.from + i as f64 * step).collect()
}

fn scan_point(args: &Args, index: usize, temperature: f64) -> anyhow::Result<Observables> {
    let params = SimulationParameters {
        temperature,
        coupling: args.coupling,
        states: args.states,
        side: args.side,
        algorithm: args.algorithm,
        ..Default::default()
    };
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
        None => StdRng::from_entropy(),
    };

    let mut simulation = Simulation::with_rng(params, rng)?;
    for _ in 0..args.equilibration {
        simulation.advance();
    }

    let mut history = ObservableHistory::new();
    for _ in 0..args.samples.max(1) {
        simulation.advance();
        history.register(&simulation.snapshot());
    }

    let window = history.steps().len();
    let mean = |f: fn(&Observables) -> f64| history.tail_mean(window, f).unwrap_or_default();
    let observables = Observables {
        magnetization: mean(|o| o.magnetization),
        energy: mean(|o| o.energy),
        correlation: mean(|o| o.correlation),
    };
    debug!(temperature, ?observables, "temperature done");
    Ok(observables)
}

fn draw_chart(points: &[(f64, Observables)], path: &Path) -> anyhow::Result<()> {
    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically(384);

    let t_min = points.first().map_or(0.0, |p| p.0);
    let t_max = points.last().map_or(1.0, |p| p.0).max(t_min + f64::EPSILON);
    let e_min = points.iter().map(|p| p.1.energy).fold(f64::MAX, f64::min);
    let e_max = points.iter().map(|p| p.1.energy).fold(f64::MIN, f64::max).max(e_min + 1.0);

    let mut ctx = ChartBuilder::on(&upper)
        .caption("Energy", ("sans-serif", 24))
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 30)
        .build_cartesian_2d(t_min..t_max, e_min..e_max)?;
    ctx.configure_mesh().x_desc("T").draw()?;
    ctx.draw_series(LineSeries::new(points.iter().map(|(t, o)| (*t, o.energy)), &RED))?;
    ctx.draw_series(points.iter().map(|(t, o)| Circle::new((*t, o.energy), 3, RED.filled())))?;

    let mut ctx = ChartBuilder::on(&lower)
        .caption("Correlation", ("sans-serif", 24))
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 30)
        .build_cartesian_2d(t_min..t_max, 0.0..1.0)?;
    ctx.configure_mesh().x_desc("T").draw()?;
    ctx.draw_series(LineSeries::new(points.iter().map(|(t, o)| (*t, o.correlation)), &BLUE))?;

    root.present()?;
    Ok(())
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

    let temperatures = temperatures(&args);
    info!(points = temperatures.len(), algorithm = %args.algorithm, "scan started");

    let points = {
        measure_time::info_time!("temperature scan");
        temperatures
            .into_par_iter()
            .enumerate()
            .map(|(i, t)| scan_point(&args, i, t).map(|o| (t, o)))
            .collect::<anyhow::Result<Vec<_>>>()?
    };

    println!("{:>10}\t{:>14}\t{:>14}\t{:>12}", "T", "magnetization", "energy", "correlation");
    for (t, o) in &points {
        println!(
            "{:>10.4}\t{:>14.6}\t{:>14.4}\t{:>12.6}",
            t, o.magnetization, o.energy, o.correlation
        );
    }

    if let Some(path) = &args.chart {
        draw_chart(&points, path)?;
        info!(path = %path.display(), "chart written");
    }

    Ok(())
}
