//! Shared pipeline logic behind the CLI commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load spectra -> resolve seeds -> fit -> collect results
//!
//! The CLI layer then focuses on presentation and file output.

use crate::domain::{
    BwSystematics, CellFit, FitConfig, InitScheme, JointConfig, JointFit, SkippedCell, SystConfig,
};
use crate::error::AppError;
use crate::io::params::{read_cell_params, read_joint_params};
use crate::io::spectra::{load_spectra, SpectraSet};
use crate::model::BlastWave;

/// All computed outputs of a `bw fit` run.
#[derive(Debug)]
pub struct FitRunOutput {
    pub spectra: SpectraSet,
    pub fits: Vec<CellFit>,
    pub skipped: Vec<SkippedCell>,
}

/// All computed outputs of a `bw joint` run.
pub struct JointRunOutput {
    pub spectra: SpectraSet,
    pub fits: Vec<JointFit>,
    pub notes: Vec<String>,
}

/// All computed outputs of a `bw syst` run.
pub struct SystRunOutput {
    pub spectra: SpectraSet,
    pub entries: Vec<(CellFit, BwSystematics)>,
    pub skipped: Vec<SkippedCell>,
}

/// Execute the per-cell fitting pipeline.
pub fn run_fit(config: &FitConfig) -> Result<FitRunOutput, AppError> {
    let spectra = load_spectra(&config.data_dir, config.system)?;
    let model = BlastWave {
        rel_tol: config.rel_tol,
    };

    // Seed files are only read for the schemes that need them.
    let joint = match config.init {
        InitScheme::Global => Some(read_joint_params(&config.joint_params, config.system)?),
        _ => None,
    };
    let prev = match config.init {
        InitScheme::Previous => Some(read_cell_params(&config.params_in, config.system)?),
        _ => None,
    };

    let (fits, skipped) = crate::fit::fit_all_cells(
        &spectra,
        config.init,
        joint.as_deref(),
        prev.as_deref(),
        &model,
        config.max_iters,
    );
    if fits.is_empty() {
        return Err(AppError::no_data(format!(
            "no cell could be fitted ({} skipped)",
            skipped.len()
        )));
    }

    Ok(FitRunOutput {
        spectra,
        fits,
        skipped,
    })
}

/// Execute the joint fitting pipeline.
pub fn run_joint(config: &JointConfig) -> Result<JointRunOutput, AppError> {
    let spectra = load_spectra(&config.data_dir, config.system)?;
    let model = BlastWave {
        rel_tol: config.rel_tol,
    };

    let (fits, notes) = crate::fit::run_joint_fits(&spectra, config, &model);
    if fits.is_empty() {
        return Err(AppError::no_data(format!(
            "no joint fit converged ({} skipped)",
            notes.len()
        )));
    }

    Ok(JointRunOutput {
        spectra,
        fits,
        notes,
    })
}

/// Execute the systematics pipeline.
pub fn run_syst(config: &SystConfig) -> Result<SystRunOutput, AppError> {
    let spectra = load_spectra(&config.data_dir, config.system)?;
    let model = BlastWave {
        rel_tol: config.rel_tol,
    };

    let joint = read_joint_params(&config.joint_params, config.system)?;
    let (entries, skipped) =
        crate::fit::run_systematics(&spectra, &joint, &model, config.max_iters);
    if entries.is_empty() {
        return Err(AppError::no_data(format!(
            "no reference fit succeeded ({} skipped)",
            skipped.len()
        )));
    }

    Ok(SystRunOutput {
        spectra,
        entries,
        skipped,
    })
}
