use std::path::Path;

use image::{Rgb, RgbImage};
use itertools::Itertools;
use plotters::prelude::*;

use crate::error::{Result, SimulationError};
use crate::history::ObservableHistory;
use crate::lattice::{Lattice, Spin};
use crate::observables::Observables;

/// One line per lattice row (first coordinate), spins separated by commas.
pub fn lattice_to_csv(lattice: &Lattice) -> String {
    lattice.rows().map(|row| row.iter().join(",") + "\n").collect()
}

/// Blank lines are skipped; errors report the line number in `text`.
pub fn lattice_from_csv(text: &str, states: Spin) -> Result<Lattice> {
    let mut rows = Vec::new();
    let mut source_lines = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split(',')
            .map(|cell| cell.trim().parse::<Spin>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| SimulationError::MalformedLattice {
                line: i + 1,
                reason: e.to_string(),
            })?;
        rows.push(row);
        source_lines.push(i + 1);
    }

    Lattice::from_rows(&rows, states).map_err(|e| match e {
        SimulationError::MalformedLattice { line, reason } => SimulationError::MalformedLattice {
            line: source_lines.get(line - 1).copied().unwrap_or(line),
            reason,
        },
        other => other,
    })
}

pub fn save_lattice_csv(lattice: &Lattice, path: impl AsRef<Path>) -> Result<()> {
    std::fs::write(path, lattice_to_csv(lattice))?;
    Ok(())
}

pub fn load_lattice_csv(path: impl AsRef<Path>, states: Spin) -> Result<Lattice> {
    let text = std::fs::read_to_string(path)?;
    lattice_from_csv(&text, states)
}

/// Colour of a state: hue `state * 360 / Q` at full saturation and half lightness.
pub fn state_color(spin: Spin, states: Spin) -> Rgb<u8> {
    let hue = spin as f64 * 360.0 / states as f64;
    let h = hue / 60.0;
    let x = 1.0 - (h % 2.0 - 1.0).abs();
    let (r, g, b) = match h as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    let channel = |c: f64| (c * 255.0).round() as u8;
    Rgb([channel(r), channel(g), channel(b)])
}

/// Renders the lattice with `cell_size` pixels per site; the first coordinate runs horizontally.
pub fn render_lattice(lattice: &Lattice, cell_size: u32) -> Result<RgbImage> {
    let cell_size = cell_size.max(1);
    let side = u32::try_from(lattice.side())
        .ok()
        .and_then(|side| side.checked_mul(cell_size))
        .ok_or_else(|| {
            SimulationError::invalid(
                "cell_size",
                format!("{} sites of {cell_size} pixels do not fit an image", lattice.side()),
            )
        })?;

    let states = lattice.states();
    Ok(RgbImage::from_fn(side, side, |px, py| {
        let spin = lattice.get((px / cell_size) as usize, (py / cell_size) as usize);
        state_color(spin, states)
    }))
}

pub fn save_lattice_png(lattice: &Lattice, path: impl AsRef<Path>, cell_size: u32) -> Result<()> {
    render_lattice(lattice, cell_size)?.save(path)?;
    Ok(())
}

fn chart_error(e: impl std::fmt::Display) -> SimulationError {
    SimulationError::Chart(e.to_string())
}

/// Energy, magnetization and correlation against step index, one panel each.
pub fn draw_history_chart(
    history: &ObservableHistory,
    path: impl AsRef<Path>,
    size: (u32, u32),
) -> Result<()> {
    let root = BitMapBackend::new(path.as_ref(), size).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;

    let first = history.steps().first().map_or(0, |s| s.step);
    let last = history.last().map_or(0, |s| s.step).max(first + 1);

    let series: [(&str, fn(&Observables) -> f64, RGBColor); 3] = [
        ("Energy", |o| o.energy, RED),
        ("Magnetization", |o| o.magnetization, BLUE),
        ("Correlation", |o| o.correlation, GREEN),
    ];

    for (area, (name, value, color)) in root.split_evenly((3, 1)).iter().zip(series) {
        let (min, max) = match history.range(value) {
            Some((min, max)) if max - min > f64::EPSILON => (min, max),
            Some((v, _)) => (v - 0.5, v + 0.5),
            None => (0.0, 1.0),
        };

        let mut ctx = ChartBuilder::on(area)
            .caption(name, ("sans-serif", 24))
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 30)
            .build_cartesian_2d(first..last, min..max)
            .map_err(chart_error)?;

        ctx.configure_mesh()
            .x_desc("Step")
            .draw()
            .map_err(chart_error)?;

        ctx.draw_series(LineSeries::new(
            history.steps().iter().map(|s| (s.step, value(&s.observables))),
            &color,
        ))
        .map_err(chart_error)?;
    }

    root.present().map_err(chart_error)?;
    Ok(())
}
