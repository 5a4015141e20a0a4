//! Flat text parameter files.
//!
//! Three fixed whitespace schemas, all indexed by the `part`/`centr` columns
//! so readers are order-independent:
//!
//! - per-cell:    `part centr norm T T_err beta beta_err`
//! - joint:       `charge centr T beta c_pi c_K c_p`
//! - all-species: `centr T beta c0 c1 c2 c3 c4 c5`
//! - systematic:  `part centr norm T T_err T_syst beta beta_err beta_syst`
//!   (the `*_syst` columns are relative spreads)
//!
//! Cells without a fit are written as zeros; readers map a zero
//! normalization back to "no entry".

use std::fs;
use std::io::Write as _;
use std::path::Path;

use crate::domain::{
    BwErrors, BwParams, BwSystematics, CellFit, CollisionSystem, JointFit, Species,
};
use crate::error::AppError;

/// One parsed per-cell entry.
#[derive(Debug, Clone, Copy)]
pub struct CellParams {
    pub params: BwParams,
    pub errors: BwErrors,
}

/// One parsed systematic entry.
#[derive(Debug, Clone, Copy)]
pub struct CellParamsSyst {
    pub params: BwParams,
    pub errors: BwErrors,
    pub syst: BwSystematics,
}

/// Shared (T, β) + per-species norms from a charge-split joint fit.
#[derive(Debug, Clone, Copy)]
pub struct JointSeed {
    pub t: f64,
    pub beta: f64,
    /// (π, K, p) order for the charge of the row.
    pub norms: [f64; 3],
}

/// Shared (T, β) + all six norms from an all-species joint fit.
#[derive(Debug, Clone, Copy)]
pub struct AllSeed {
    pub t: f64,
    pub beta: f64,
    pub norms: [f64; 6],
}

fn create_out(path: &Path) -> Result<fs::File, AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::input(format!("Failed to create '{}': {e}", parent.display()))
            })?;
        }
    }
    fs::File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create '{}': {e}", path.display())))
}

fn read_rows(path: &Path, n_cols: usize) -> Result<Vec<Vec<f64>>, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::input(format!("Failed to read '{}': {e}", path.display())))?;
    let mut rows = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let values: Option<Vec<f64>> = line.split_whitespace().map(|f| f.parse().ok()).collect();
        let values = values.ok_or_else(|| {
            AppError::input(format!(
                "{}:{}: non-numeric value",
                path.display(),
                idx + 1
            ))
        })?;
        if values.len() != n_cols {
            return Err(AppError::input(format!(
                "{}:{}: expected {n_cols} columns, got {}",
                path.display(),
                idx + 1,
                values.len()
            )));
        }
        rows.push(values);
    }
    Ok(rows)
}

fn cell_index(path: &Path, row: &[f64], n_centr: usize) -> Result<(usize, usize), AppError> {
    let part = row[0] as usize;
    let centr = row[1] as usize;
    if part >= Species::ALL.len() || centr >= n_centr {
        return Err(AppError::input(format!(
            "{}: cell index ({part}, {centr}) out of range",
            path.display()
        )));
    }
    Ok((part, centr))
}

/// Write per-cell parameters as a dense (species × centrality) grid.
pub fn write_cell_params(
    path: &Path,
    system: CollisionSystem,
    fits: &[CellFit],
) -> Result<(), AppError> {
    let mut file = create_out(path)?;
    for species in Species::ALL {
        for centr in 0..system.n_centralities() {
            let fit = fits
                .iter()
                .find(|f| f.species == species && f.centrality == centr);
            let (p, e) = match fit {
                Some(f) => (f.params, f.errors),
                None => (
                    BwParams {
                        norm: 0.0,
                        t: 0.0,
                        beta: 0.0,
                        mass: species.mass(),
                    },
                    BwErrors::default(),
                ),
            };
            writeln!(
                file,
                "{}  {}  {}  {}  {}  {}  {}",
                species.index(),
                centr,
                p.norm,
                p.t,
                e.t,
                p.beta,
                e.beta
            )
            .map_err(|e| AppError::input(format!("Failed to write '{}': {e}", path.display())))?;
        }
    }
    Ok(())
}

/// Read per-cell parameters into a `[species][centrality]` grid.
pub fn read_cell_params(
    path: &Path,
    system: CollisionSystem,
) -> Result<Vec<Vec<Option<CellParams>>>, AppError> {
    let n_centr = system.n_centralities();
    let mut grid = vec![vec![None; n_centr]; Species::ALL.len()];
    for row in read_rows(path, 7)? {
        let (part, centr) = cell_index(path, &row, n_centr)?;
        if row[2] == 0.0 {
            continue;
        }
        grid[part][centr] = Some(CellParams {
            params: BwParams {
                norm: row[2],
                t: row[3],
                beta: row[5],
                mass: Species::ALL[part].mass(),
            },
            errors: BwErrors {
                norm: 0.0,
                t: row[4],
                beta: row[6],
            },
        });
    }
    Ok(grid)
}

/// Write charge-split joint fits (`charge centr T beta c_pi c_K c_p`).
pub fn write_joint_params(path: &Path, fits: &[JointFit]) -> Result<(), AppError> {
    let mut file = create_out(path)?;
    for fit in fits {
        let charge = fit
            .charge
            .ok_or_else(|| AppError::input("charge-split writer got an all-species fit"))?;
        writeln!(
            file,
            "{}  {}  {}  {}  {}  {}  {}",
            charge.index(),
            fit.centrality,
            fit.t,
            fit.beta,
            fit.norms[0],
            fit.norms[1],
            fit.norms[2]
        )
        .map_err(|e| AppError::input(format!("Failed to write '{}': {e}", path.display())))?;
    }
    Ok(())
}

/// Read charge-split joint fits into a `[charge][centrality]` grid.
pub fn read_joint_params(
    path: &Path,
    system: CollisionSystem,
) -> Result<Vec<Vec<Option<JointSeed>>>, AppError> {
    let n_centr = system.n_centralities();
    let mut grid = vec![vec![None; n_centr]; 2];
    for row in read_rows(path, 7)? {
        let charge = row[0] as usize;
        let centr = row[1] as usize;
        if charge >= 2 || centr >= n_centr {
            return Err(AppError::input(format!(
                "{}: joint index ({charge}, {centr}) out of range",
                path.display()
            )));
        }
        grid[charge][centr] = Some(JointSeed {
            t: row[2],
            beta: row[3],
            norms: [row[4], row[5], row[6]],
        });
    }
    Ok(grid)
}

/// Write all-species joint fits (`centr T beta c0..c5`).
pub fn write_all_params(path: &Path, fits: &[JointFit]) -> Result<(), AppError> {
    let mut file = create_out(path)?;
    for fit in fits {
        if fit.norms.len() != 6 {
            return Err(AppError::input(
                "all-species writer expects six normalizations",
            ));
        }
        writeln!(
            file,
            "{}  {}  {}  {}  {}  {}  {}  {}  {}",
            fit.centrality,
            fit.t,
            fit.beta,
            fit.norms[0],
            fit.norms[1],
            fit.norms[2],
            fit.norms[3],
            fit.norms[4],
            fit.norms[5]
        )
        .map_err(|e| AppError::input(format!("Failed to write '{}': {e}", path.display())))?;
    }
    Ok(())
}

/// Read all-species joint fits, indexed by centrality.
pub fn read_all_params(
    path: &Path,
    system: CollisionSystem,
) -> Result<Vec<Option<AllSeed>>, AppError> {
    let n_centr = system.n_centralities();
    let mut out = vec![None; n_centr];
    for row in read_rows(path, 9)? {
        let centr = row[0] as usize;
        if centr >= n_centr {
            return Err(AppError::input(format!(
                "{}: centrality {centr} out of range",
                path.display()
            )));
        }
        out[centr] = Some(AllSeed {
            t: row[1],
            beta: row[2],
            norms: [row[3], row[4], row[5], row[6], row[7], row[8]],
        });
    }
    Ok(out)
}

/// Write per-cell parameters with systematic spreads beside the errors.
pub fn write_syst_params(
    path: &Path,
    system: CollisionSystem,
    entries: &[(CellFit, BwSystematics)],
) -> Result<(), AppError> {
    let mut file = create_out(path)?;
    for species in Species::ALL {
        for centr in 0..system.n_centralities() {
            let entry = entries
                .iter()
                .find(|(f, _)| f.species == species && f.centrality == centr);
            let (p, e, s) = match entry {
                Some((f, s)) => (f.params, f.errors, *s),
                None => (
                    BwParams {
                        norm: 0.0,
                        t: 0.0,
                        beta: 0.0,
                        mass: species.mass(),
                    },
                    BwErrors::default(),
                    BwSystematics::default(),
                ),
            };
            writeln!(
                file,
                "{}  {}  {}  {}  {}  {}  {}  {}  {}",
                species.index(),
                centr,
                p.norm,
                p.t,
                e.t,
                s.t,
                p.beta,
                e.beta,
                s.beta
            )
            .map_err(|e| AppError::input(format!("Failed to write '{}': {e}", path.display())))?;
        }
    }
    Ok(())
}

/// Read the systematic parameter file into a `[species][centrality]` grid.
pub fn read_syst_params(
    path: &Path,
    system: CollisionSystem,
) -> Result<Vec<Vec<Option<CellParamsSyst>>>, AppError> {
    let n_centr = system.n_centralities();
    let mut grid = vec![vec![None; n_centr]; Species::ALL.len()];
    for row in read_rows(path, 9)? {
        let (part, centr) = cell_index(path, &row, n_centr)?;
        if row[2] == 0.0 {
            continue;
        }
        grid[part][centr] = Some(CellParamsSyst {
            params: BwParams {
                norm: row[2],
                t: row[3],
                beta: row[6],
                mass: Species::ALL[part].mass(),
            },
            errors: BwErrors {
                norm: 0.0,
                t: row[4],
                beta: row[7],
            },
            syst: BwSystematics {
                norm: 0.0,
                t: row[5],
                beta: row[8],
            },
        });
    }
    Ok(grid)
}
