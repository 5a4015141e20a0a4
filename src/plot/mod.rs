//! PNG figures: spectra with fitted curves, parameter trends, contours.
//!
//! Rendering is text-free (series, axes, tick structure only); the numbers
//! live in the terminal report and the parameter files. This keeps the
//! Plotters build free of native font dependencies.

pub mod contour;
pub mod params;
pub mod spectra;

pub use contour::*;
pub use params::*;
pub use spectra::*;

use std::fs;
use std::path::Path;

use plotters::style::{Palette, Palette99, PaletteColor};

use crate::error::AppError;

/// Stable color per series index (centrality class or species).
pub(crate) fn series_color(index: usize) -> PaletteColor<Palette99> {
    Palette99::pick(index)
}

pub(crate) fn draw_err(path: &Path, e: impl std::fmt::Display) -> AppError {
    AppError::input(format!("Failed to render '{}': {e}", path.display()))
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::input(format!(
                    "Failed to create plot directory '{}': {e}",
                    parent.display()
                ))
            })?;
        }
    }
    Ok(())
}
