//! Spectra overview figure: one panel per species, log-y.
//!
//! Each panel overlays every centrality class of one species: measured
//! points with statistical error bars, and the fitted curve where a fit for
//! that cell exists. Colors cycle per centrality and are shared across
//! panels.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::domain::{CellFit, Species};
use crate::error::AppError;
use crate::io::spectra::SpectraSet;
use crate::model::BlastWave;
use crate::plot::{draw_err, ensure_parent_dir, series_color};

const CURVE_SAMPLES: usize = 120;

/// Render the six-panel spectra figure to `path`.
pub fn plot_spectra(
    spectra: &SpectraSet,
    fits: &[CellFit],
    model: &BlastWave,
    path: &Path,
    width: u32,
    height: u32,
) -> Result<(), AppError> {
    ensure_parent_dir(path)?;
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| draw_err(path, e))?;

    let panels = root.split_evenly((3, 2));
    for (species, panel) in Species::ALL.into_iter().zip(panels.iter()) {
        draw_species_panel(spectra, fits, model, species, panel)
            .map_err(|e| draw_err(path, e))?;
    }
    root.present().map_err(|e| draw_err(path, e))?;
    Ok(())
}

fn draw_species_panel(
    spectra: &SpectraSet,
    fits: &[CellFit],
    model: &BlastWave,
    species: Species,
    panel: &DrawingArea<BitMapBackend<'_>, Shift>,
) -> Result<(), Box<dyn std::error::Error>> {
    let n_centr = spectra.system.n_centralities();

    // Panel bounds over every centrality of this species.
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for centrality in 0..n_centr {
        for p in spectra.points(species, centrality) {
            x_max = x_max.max(p.x);
            y_min = y_min.min(p.y);
            y_max = y_max.max(p.y);
        }
    }
    if !y_max.is_finite() {
        // species has no data at all; leave the panel blank
        return Ok(());
    }
    let y_floor = y_min * 0.2;
    let x_range = 0.0..x_max * 1.05;
    let y_range = (y_floor..y_max * 5.0).log_scale();

    let mut chart = ChartBuilder::on(panel)
        .margin(8)
        .build_cartesian_2d(x_range, y_range)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(0)
        .y_labels(0)
        .draw()?;

    for centrality in 0..n_centr {
        let points = spectra.points(species, centrality);
        if points.is_empty() {
            continue;
        }
        let color = series_color(centrality);

        // statistical error bars, clipped to the positive log domain
        for p in points {
            let lo = (p.y - p.y_err).max(y_floor);
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(p.x, lo), (p.x, p.y + p.y_err)],
                color.stroke_width(1),
            )))?;
        }
        chart.draw_series(
            points
                .iter()
                .map(|p| Circle::new((p.x, p.y), 2, color.filled())),
        )?;

        let fit = fits
            .iter()
            .find(|f| f.species == species && f.centrality == centrality);
        if let Some(fit) = fit {
            let (x_lo, x_hi) = species.fit_window();
            let curve: Vec<(f64, f64)> = model
                .curve(&fit.params, x_lo, x_hi.min(x_max * 1.05), CURVE_SAMPLES)
                .into_iter()
                .filter(|&(_, y)| y.is_finite() && y > 0.0)
                .collect();
            chart.draw_series(LineSeries::new(curve, color.stroke_width(2)))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BwErrors, BwParams, CollisionSystem};
    use crate::io::spectra::load_spectra;
    use std::io::Write as _;

    #[test]
    fn renders_a_nonempty_png() {
        let dir = std::env::temp_dir().join("bw-plot-spectra-test");
        std::fs::create_dir_all(&dir).unwrap();
        for species in Species::ALL {
            let mut f =
                std::fs::File::create(dir.join(format!("pAl_{}.txt", species.key()))).unwrap();
            for i in 0..6 {
                let pt = 0.4 + 0.2 * i as f64;
                writeln!(f, "0  {pt}  {}  {}", 50.0 / (1.0 + pt), 0.5).unwrap();
            }
        }
        let spectra = load_spectra(&dir, CollisionSystem::PAl).unwrap();
        let model = BlastWave::default();
        let fits = vec![CellFit {
            species: Species::PiPlus,
            centrality: 0,
            params: BwParams {
                norm: 50.0,
                t: 0.12,
                beta: 0.6,
                mass: Species::PiPlus.mass(),
            },
            errors: BwErrors::default(),
            chi2: 1.0,
            ndf: 3,
        }];

        let out = dir.join("spectra.png");
        plot_spectra(&spectra, &fits, &model, &out, 600, 600).unwrap();
        let meta = std::fs::metadata(&out).unwrap();
        assert!(meta.len() > 0);
    }
}
