//! Per-cell blast-wave fits.
//!
//! One cell is one (species, centrality) spectrum. Cells are independent,
//! so the batch runs in parallel; a cell that cannot be fitted is recorded
//! as skipped and never aborts the run.

use argmin::core::{CostFunction, Executor};
use argmin::solver::neldermead::NelderMead;
use rayon::prelude::*;

use crate::domain::catalog;
use crate::domain::{
    BwErrors, BwParams, CellFit, CollisionSystem, InitScheme, SkippedCell, Species, SpectrumPoint,
};
use crate::error::AppError;
use crate::fit::objective::{chi2, CellBounds, CellCost};
use crate::io::params::{CellParams, JointSeed};
use crate::io::spectra::SpectraSet;
use crate::math::{chi2_errors, default_steps, ParamBounds};
use crate::model::BlastWave;

/// Initial simplex for Nelder-Mead: the seed plus one vertex per dimension,
/// stepped by 5% (with an absolute floor near zero).
pub fn make_simplex(initial_point: &[f64]) -> Vec<Vec<f64>> {
    let n = initial_point.len();
    let mut simplex = Vec::with_capacity(n + 1);
    simplex.push(initial_point.to_vec());
    for i in 0..n {
        let mut next_point = initial_point.to_vec();
        let step = if next_point[i].abs() > 1e-9 {
            next_point[i] * 0.05
        } else {
            0.00025
        };
        next_point[i] += step;
        simplex.push(next_point);
    }
    simplex
}

/// Run Nelder-Mead from `u0`, returning the best unbounded point and cost.
pub fn minimize<C>(cost: C, u0: &[f64], max_iters: u64) -> Result<(Vec<f64>, f64), AppError>
where
    C: CostFunction<Param = Vec<f64>, Output = f64>,
{
    let solver = NelderMead::new(make_simplex(u0));
    let res = Executor::new(cost, solver)
        .configure(|s| s.max_iters(max_iters))
        .run()
        .map_err(|e| AppError::numeric(format!("minimization failed: {e}")))?;
    let best = res
        .state
        .best_param
        .clone()
        .ok_or_else(|| AppError::numeric("minimizer produced no parameters"))?;
    let cost = res.state.best_cost;
    if !cost.is_finite() {
        return Err(AppError::numeric("minimum has non-finite chi2"));
    }
    Ok((best, cost))
}

/// Seed + bounds for one cell. `minimize = false` means evaluate only.
#[derive(Debug, Clone, Copy)]
pub struct CellSeed {
    pub params: BwParams,
    pub bounds: CellBounds,
    pub minimize: bool,
}

fn beta_box(seed: f64, lo_mult: f64, hi_mult: f64) -> ParamBounds {
    let hi = (seed * hi_mult).min(0.99);
    let lo = (seed * lo_mult).min(hi * 0.99);
    ParamBounds::new(lo, hi)
}

fn bounded_seed(species: Species) -> CellSeed {
    let part = species.index();
    CellSeed {
        params: BwParams {
            norm: catalog::NORM_SEED[part],
            t: catalog::BOUNDED_T_SEED,
            beta: catalog::BOUNDED_BETA_SEED,
            mass: species.mass(),
        },
        bounds: CellBounds {
            norm: ParamBounds::new(0.0, catalog::NORM_MAX[part]),
            t: ParamBounds::new(catalog::BOUNDED_T_WINDOW.0, catalog::BOUNDED_T_WINDOW.1),
            beta: ParamBounds::new(catalog::BOUNDED_BETA_WINDOW.0, catalog::BOUNDED_BETA_WINDOW.1),
        },
        minimize: true,
    }
}

/// Resolve the seed for one cell under an init scheme.
///
/// `None` means the seed file has no usable entry (zero normalization) and
/// the cell is skipped, like downstream readers of the zero rows do.
pub fn cell_seed(
    scheme: InitScheme,
    system: CollisionSystem,
    species: Species,
    centrality: usize,
    joint: Option<&[Vec<Option<JointSeed>>]>,
    prev: Option<&[Vec<Option<CellParams>>]>,
) -> Option<CellSeed> {
    match scheme {
        InitScheme::Global => {
            let grid = joint?;
            let seed = grid[species.charge().index()][centrality]?;
            // π/K/p share a norm slot per charge
            let norm = seed.norms[species.index() / 2];
            if norm <= 0.0 || seed.t <= 0.0 || seed.beta <= 0.0 {
                return None;
            }
            let w = catalog::SEED_WINDOWS[system.index()];
            Some(CellSeed {
                params: BwParams {
                    norm,
                    t: seed.t,
                    beta: seed.beta,
                    mass: species.mass(),
                },
                bounds: CellBounds {
                    norm: ParamBounds::new(0.0, norm * w.norm_hi),
                    t: ParamBounds::new(seed.t * w.t.0, seed.t * w.t.1),
                    beta: beta_box(seed.beta, w.beta.0, w.beta.1),
                },
                minimize: true,
            })
        }
        InitScheme::Previous => {
            let grid = prev?;
            let cell = grid[species.index()][centrality]?;
            let p = cell.params;
            if p.norm <= 0.0 || p.t <= 0.0 || p.beta <= 0.0 {
                return None;
            }
            let (lo, hi) = catalog::PREVIOUS_WINDOW;
            Some(CellSeed {
                params: p,
                bounds: CellBounds {
                    norm: ParamBounds::new(p.norm * lo, p.norm * hi),
                    t: ParamBounds::new(p.t * lo, p.t * hi),
                    beta: beta_box(p.beta, lo, hi),
                },
                minimize: true,
            })
        }
        InitScheme::Bounded => Some(bounded_seed(species)),
        InitScheme::Manual => {
            let mut seed = bounded_seed(species);
            if system == CollisionSystem::AuAu {
                seed.params.t = catalog::MANUAL_T_AUAU[centrality];
                seed.params.beta = catalog::MANUAL_BETA_AUAU[centrality];
            }
            seed.minimize = false;
            Some(seed)
        }
    }
}

/// Statistical errors from the χ² curvature at the minimum, in physical
/// space. `None` when the Hessian is degenerate.
fn statistical_errors(
    points: &[SpectrumPoint],
    model: &BlastWave,
    p: &BwParams,
) -> Option<[f64; 3]> {
    let mass = p.mass;
    let f = |q: &[f64]| {
        chi2(
            points,
            model,
            &BwParams {
                norm: q[0],
                t: q[1],
                beta: q[2],
                mass,
            },
        )
    };
    let mut steps = default_steps(&[p.norm, p.t, p.beta]);
    // keep the stencil physical: T > 0, beta < 1
    steps[1] = steps[1].min(p.t * 0.5);
    steps[2] = steps[2].min((1.0 - p.beta) * 0.5).max(1e-9);
    let errs = chi2_errors(f, &[p.norm, p.t, p.beta], &steps)?;
    Some([errs[0], errs[1], errs[2]])
}

/// Fit one cell from an already-resolved seed over pre-windowed points.
pub fn fit_cell(
    species: Species,
    centrality: usize,
    points: &[SpectrumPoint],
    seed: &CellSeed,
    model: &BlastWave,
    max_iters: u64,
) -> Result<CellFit, AppError> {
    if !seed.minimize {
        // Evaluate-only: hand shape parameters, best linear normalization.
        let norm = model.profile_norm(points, seed.params.t, seed.params.beta, seed.params.mass);
        let params = BwParams {
            norm,
            ..seed.params
        };
        return Ok(CellFit {
            species,
            centrality,
            chi2: chi2(points, model, &params),
            ndf: points.len(),
            params,
            errors: BwErrors::default(),
        });
    }

    if points.len() < 4 {
        return Err(AppError::no_data(format!(
            "only {} points in the fit window",
            points.len()
        )));
    }

    let cost = CellCost {
        points,
        model,
        mass: seed.params.mass,
        bounds: seed.bounds,
    };
    let u0 = seed.bounds.to_unbounded(&seed.params);
    let (best_u, best_chi2) = minimize(cost, &u0, max_iters)?;
    let params = seed.bounds.to_physical(&best_u, seed.params.mass);
    let ndf = points.len() - 3;

    let mut errors = match statistical_errors(points, model, &params) {
        Some([norm, t, beta]) => BwErrors { norm, t, beta },
        None => BwErrors::default(),
    };
    // error normalization on chi2/ndf
    if ndf > 0 {
        let scale = (best_chi2 / ndf as f64).sqrt();
        if scale.is_finite() {
            errors.norm *= scale;
            errors.t *= scale;
            errors.beta *= scale;
        }
    }

    Ok(CellFit {
        species,
        centrality,
        params,
        errors,
        chi2: best_chi2,
        ndf,
    })
}

/// Fit every cell of a system in parallel.
pub fn fit_all_cells(
    spectra: &SpectraSet,
    scheme: InitScheme,
    joint: Option<&[Vec<Option<JointSeed>>]>,
    prev: Option<&[Vec<Option<CellParams>>]>,
    model: &BlastWave,
    max_iters: u64,
) -> (Vec<CellFit>, Vec<SkippedCell>) {
    let system = spectra.system;
    let cells: Vec<(Species, usize)> = Species::ALL
        .into_iter()
        .flat_map(|s| (0..system.n_centralities()).map(move |c| (s, c)))
        .collect();

    let results: Vec<Result<CellFit, SkippedCell>> = cells
        .par_iter()
        .map(|&(species, centrality)| {
            let skip = |reason: String| SkippedCell {
                species,
                centrality,
                reason,
            };

            let (x_lo, x_hi) = species.fit_window();
            let points = spectra.points_in_window(species, centrality, x_lo, x_hi);
            if points.is_empty() {
                return Err(skip("no data in the fit window".to_string()));
            }

            let seed = cell_seed(scheme, system, species, centrality, joint, prev)
                .ok_or_else(|| skip("no seed entry in the parameter file".to_string()))?;

            fit_cell(species, centrality, &points, &seed, model, max_iters)
                .map_err(|e| skip(e.to_string()))
        })
        .collect();

    let mut fits = Vec::new();
    let mut skipped = Vec::new();
    for r in results {
        match r {
            Ok(fit) => fits.push(fit),
            Err(s) => skipped.push(s),
        }
    }
    (fits, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_points(truth: &BwParams, model: &BlastWave) -> Vec<SpectrumPoint> {
        (0..12)
            .map(|i| {
                let x = 0.15 + 0.07 * i as f64;
                let y = model.value(x, truth);
                SpectrumPoint {
                    x,
                    y,
                    y_err: 0.03 * y,
                }
            })
            .collect()
    }

    #[test]
    fn bounded_fit_recovers_generating_parameters() {
        let model = BlastWave::default();
        let truth = BwParams {
            norm: 20.0,
            t: 0.115,
            beta: 0.65,
            mass: Species::PiMinus.mass(),
        };
        let points = synthetic_points(&truth, &model);
        let seed = bounded_seed(Species::PiMinus);

        let fit = fit_cell(Species::PiMinus, 0, &points, &seed, &model, 500).unwrap();
        assert!((fit.params.t - truth.t).abs() < 0.01, "T = {}", fit.params.t);
        assert!(
            (fit.params.beta - truth.beta).abs() < 0.05,
            "beta = {}",
            fit.params.beta
        );
        assert!(fit.chi2_ndf() < 1.0);
        assert!(fit.errors.t > 0.0);
        assert!(fit.errors.beta > 0.0);
    }

    #[test]
    fn fitted_parameters_respect_their_boxes() {
        let model = BlastWave::default();
        let truth = BwParams {
            norm: 20.0,
            t: 0.115,
            beta: 0.65,
            mass: Species::PiMinus.mass(),
        };
        let points = synthetic_points(&truth, &model);
        let seed = bounded_seed(Species::PiMinus);
        let fit = fit_cell(Species::PiMinus, 0, &points, &seed, &model, 300).unwrap();
        assert!(seed.bounds.t.contains(fit.params.t));
        assert!(seed.bounds.beta.contains(fit.params.beta));
        assert!(seed.bounds.norm.contains(fit.params.norm));
    }

    #[test]
    fn too_few_points_is_a_no_data_error() {
        let model = BlastWave::default();
        let seed = bounded_seed(Species::KPlus);
        let points = vec![SpectrumPoint {
            x: 0.5,
            y: 1.0,
            y_err: 0.1,
        }];
        let err = fit_cell(Species::KPlus, 0, &points, &seed, &model, 100).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn manual_seed_profiles_the_normalization() {
        let model = BlastWave::default();
        let truth = BwParams {
            norm: 8.0,
            t: catalog::MANUAL_T_AUAU[1],
            beta: catalog::MANUAL_BETA_AUAU[1],
            mass: Species::PiPlus.mass(),
        };
        let points = synthetic_points(&truth, &model);
        let seed = cell_seed(
            InitScheme::Manual,
            CollisionSystem::AuAu,
            Species::PiPlus,
            1,
            None,
            None,
        )
        .unwrap();
        assert!(!seed.minimize);
        let fit = fit_cell(Species::PiPlus, 1, &points, &seed, &model, 0).unwrap();
        assert!((fit.params.norm - truth.norm).abs() / truth.norm < 1e-6);
        assert!(fit.chi2 < 1e-8);
    }

    #[test]
    fn global_seed_uses_the_charge_and_family_slots() {
        let n_centr = CollisionSystem::PAl.n_centralities();
        let mut grid = vec![vec![None; n_centr]; 2];
        grid[1][2] = Some(JointSeed {
            t: 0.11,
            beta: 0.68,
            norms: [90.0, 15.0, 0.5],
        });

        // K- is negative charge, family slot 1
        let seed = cell_seed(
            InitScheme::Global,
            CollisionSystem::PAl,
            Species::KMinus,
            2,
            Some(&grid),
            None,
        )
        .unwrap();
        assert!((seed.params.norm - 15.0).abs() < 1e-12);
        assert!((seed.params.t - 0.11).abs() < 1e-12);

        // missing entry -> no seed
        assert!(cell_seed(
            InitScheme::Global,
            CollisionSystem::PAl,
            Species::KPlus,
            2,
            Some(&grid),
            None,
        )
        .is_none());
    }

    #[test]
    fn seed_beta_bounds_never_cross_one() {
        let n_centr = CollisionSystem::AuAu.n_centralities();
        let mut grid = vec![vec![None; n_centr]; 2];
        grid[0][0] = Some(JointSeed {
            t: 0.1,
            beta: 0.9,
            norms: [50.0, 10.0, 1.0],
        });
        let seed = cell_seed(
            InitScheme::Global,
            CollisionSystem::AuAu,
            Species::PiPlus,
            0,
            Some(&grid),
            None,
        )
        .unwrap();
        assert!(seed.bounds.beta.hi <= 0.99);
        assert!(seed.bounds.beta.lo < seed.bounds.beta.hi);
    }
}
