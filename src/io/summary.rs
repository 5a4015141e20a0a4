//! Read/write run summary JSON.
//!
//! The JSON summary is the "portable" representation of a fit run:
//! - run metadata (tool, UTC timestamp, system, init scheme)
//! - every fitted cell with parameters, errors and χ²
//! - skipped cells with reasons
//!
//! The flat text files remain the interchange format with the legacy
//! plotting workflow; the JSON is for downstream tooling.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CellFit, CollisionSystem, InitScheme, SkippedCell};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitRunFile {
    pub tool: String,
    pub generated_utc: DateTime<Utc>,
    pub system: CollisionSystem,
    pub init: InitScheme,
    pub cells: Vec<CellFit>,
    pub skipped: Vec<SkippedCell>,
}

impl FitRunFile {
    pub fn new(
        system: CollisionSystem,
        init: InitScheme,
        cells: Vec<CellFit>,
        skipped: Vec<SkippedCell>,
    ) -> Self {
        Self {
            tool: "bw".to_string(),
            generated_utc: Utc::now(),
            system,
            init,
            cells,
            skipped,
        }
    }
}

/// Write a run summary JSON file.
pub fn write_run_json(path: &Path, run: &FitRunFile) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::input(format!(
            "Failed to create run JSON '{}': {e}",
            path.display()
        ))
    })?;
    serde_json::to_writer_pretty(file, run)
        .map_err(|e| AppError::input(format!("Failed to write run JSON: {e}")))?;
    Ok(())
}

/// Read a run summary JSON file.
pub fn read_run_json(path: &Path) -> Result<FitRunFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::input(format!("Failed to open run JSON '{}': {e}", path.display()))
    })?;
    let run: FitRunFile = serde_json::from_reader(file)
        .map_err(|e| AppError::input(format!("Invalid run JSON: {e}")))?;
    Ok(run)
}
