//! Confidence-region figure for one cell in the (β, T) plane.

use std::path::Path;

use plotters::prelude::*;

use crate::domain::CellFit;
use crate::error::AppError;
use crate::fit::contour::ContourSet;
use crate::plot::{draw_err, ensure_parent_dir, series_color};

/// Render the traced contour levels of one cell to `path`.
///
/// Each level is drawn as a closed polyline, the best fit as a cross. A set
/// with no traced levels is a no-data error; notes alone are not drawable.
pub fn plot_contours(
    best: &CellFit,
    set: &ContourSet,
    path: &Path,
    width: u32,
    height: u32,
) -> Result<(), AppError> {
    if set.levels.is_empty() {
        return Err(AppError::no_data(format!(
            "no contour levels to plot ({} notes)",
            set.notes.len()
        )));
    }
    ensure_parent_dir(path)?;

    let mut b_min = best.params.beta;
    let mut b_max = best.params.beta;
    let mut t_min = best.params.t;
    let mut t_max = best.params.t;
    for level in &set.levels {
        for &(beta, t) in &level.points {
            b_min = b_min.min(beta);
            b_max = b_max.max(beta);
            t_min = t_min.min(t);
            t_max = t_max.max(t);
        }
    }
    let b_pad = (b_max - b_min).max(1e-4) * 0.12;
    let t_pad = (t_max - t_min).max(1e-4) * 0.12;

    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| draw_err(path, e))?;

    let result = (|| -> Result<(), Box<dyn std::error::Error>> {
        let mut chart = ChartBuilder::on(&root).margin(10).build_cartesian_2d(
            b_min - b_pad..b_max + b_pad,
            t_min - t_pad..t_max + t_pad,
        )?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_labels(0)
            .y_labels(0)
            .draw()?;

        for level in &set.levels {
            let color = series_color(level.sigma);
            let mut closed = level.points.clone();
            if let Some(&first) = closed.first() {
                closed.push(first);
            }
            chart.draw_series(LineSeries::new(closed, color.stroke_width(2)))?;
        }
        chart.draw_series(std::iter::once(Cross::new(
            (best.params.beta, best.params.t),
            5,
            BLACK.stroke_width(2),
        )))?;
        Ok(())
    })();
    result.map_err(|e| draw_err(path, e))?;

    root.present().map_err(|e| draw_err(path, e))?;
    Ok(())
}
