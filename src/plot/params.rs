//! Parameter-trend figure: T and β versus centrality.
//!
//! Two stacked panels (T on top, β below) with one series per species,
//! plotted against either the centrality midpoint in percent or ⟨N_part⟩.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::domain::{CellFit, CollisionSystem, Species, TrendX};
use crate::error::AppError;
use crate::plot::{draw_err, ensure_parent_dir, series_color};

/// Render the T/β trend figure to `path`.
pub fn plot_trends(
    system: CollisionSystem,
    fits: &[CellFit],
    trend_x: TrendX,
    path: &Path,
    width: u32,
    height: u32,
) -> Result<(), AppError> {
    if fits.is_empty() {
        return Err(AppError::no_data("no fitted cells to plot trends from"));
    }
    ensure_parent_dir(path)?;
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| draw_err(path, e))?;

    let panels = root.split_evenly((2, 1));
    draw_trend_panel(system, fits, trend_x, &panels[0], |f| {
        (f.params.t, f.errors.t)
    })
    .map_err(|e| draw_err(path, e))?;
    draw_trend_panel(system, fits, trend_x, &panels[1], |f| {
        (f.params.beta, f.errors.beta)
    })
    .map_err(|e| draw_err(path, e))?;

    root.present().map_err(|e| draw_err(path, e))?;
    Ok(())
}

fn abscissa(system: CollisionSystem, centrality: usize, trend_x: TrendX) -> f64 {
    match trend_x {
        TrendX::Percent => system.centrality_percent(centrality),
        TrendX::Npart => system.npart(centrality),
    }
}

fn draw_trend_panel(
    system: CollisionSystem,
    fits: &[CellFit],
    trend_x: TrendX,
    panel: &DrawingArea<BitMapBackend<'_>, Shift>,
    value: impl Fn(&CellFit) -> (f64, f64),
) -> Result<(), Box<dyn std::error::Error>> {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for fit in fits {
        let x = abscissa(system, fit.centrality, trend_x);
        let (y, e) = value(fit);
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y - e);
        y_max = y_max.max(y + e);
    }
    let x_pad = (x_max - x_min).max(1e-6) * 0.08;
    let y_pad = (y_max - y_min).max(1e-6) * 0.15;

    let mut chart = ChartBuilder::on(panel).margin(8).build_cartesian_2d(
        x_min - x_pad..x_max + x_pad,
        y_min - y_pad..y_max + y_pad,
    )?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(0)
        .y_labels(0)
        .draw()?;

    for species in Species::ALL {
        let mut series: Vec<(f64, f64, f64)> = fits
            .iter()
            .filter(|f| f.species == species)
            .map(|f| {
                let (y, e) = value(f);
                (abscissa(system, f.centrality, trend_x), y, e)
            })
            .collect();
        if series.is_empty() {
            continue;
        }
        series.sort_by(|a, b| a.0.total_cmp(&b.0));
        let color = series_color(species.index());

        for &(x, y, e) in &series {
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(x, y - e), (x, y + e)],
                color.stroke_width(1),
            )))?;
        }
        chart.draw_series(LineSeries::new(
            series.iter().map(|&(x, y, _)| (x, y)),
            color.stroke_width(1),
        ))?;
        chart.draw_series(
            series
                .iter()
                .map(|&(x, y, _)| Circle::new((x, y), 3, color.filled())),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BwErrors, BwParams};

    fn fits() -> Vec<CellFit> {
        (0..4)
            .flat_map(|centrality| {
                [Species::PiPlus, Species::Proton].map(move |species| CellFit {
                    species,
                    centrality,
                    params: BwParams {
                        norm: 50.0,
                        t: 0.10 + 0.005 * centrality as f64,
                        beta: 0.7 - 0.03 * centrality as f64,
                        mass: species.mass(),
                    },
                    errors: BwErrors {
                        norm: 1.0,
                        t: 0.003,
                        beta: 0.02,
                    },
                    chi2: 5.0,
                    ndf: 6,
                })
            })
            .collect()
    }

    #[test]
    fn renders_for_both_abscissae() {
        let dir = std::env::temp_dir().join("bw-plot-trends-test");
        std::fs::create_dir_all(&dir).unwrap();
        for trend_x in [TrendX::Percent, TrendX::Npart] {
            let out = dir.join(format!("trends-{trend_x:?}.png"));
            plot_trends(CollisionSystem::PAl, &fits(), trend_x, &out, 500, 500).unwrap();
            assert!(std::fs::metadata(&out).unwrap().len() > 0);
        }
    }

    #[test]
    fn empty_fit_list_is_a_no_data_error() {
        let out = std::env::temp_dir().join("bw-plot-trends-empty.png");
        let err = plot_trends(CollisionSystem::PAl, &[], TrendX::Percent, &out, 300, 300)
            .unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
