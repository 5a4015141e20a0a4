//! Joint fits: one (T, β) shared by several species within a centrality.
//!
//! The joint χ² is the sum of the per-species χ² with the shared shape
//! parameters and one normalization per species. Charge-split mode fits the
//! (π, K, p) triplet of one sign; all-species mode fits all six at once with
//! a tighter β box.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;

use crate::domain::catalog;
use crate::domain::{Charge, JointConfig, JointFit, JointMode, Species, SpectrumPoint};
use crate::error::AppError;
use crate::fit::objective::{JointCell, JointCost};
use crate::fit::single::minimize;
use crate::io::spectra::SpectraSet;
use crate::math::{chi2_errors, default_steps, ParamBounds};
use crate::model::BlastWave;

/// Joint fit over explicit per-species point sets.
///
/// Species without points keep their seed normalization during the fit but
/// are reported with norm 0, which downstream readers treat as "no entry".
pub fn fit_joint_cells(
    data: &[(Species, Vec<SpectrumPoint>)],
    charge: Option<Charge>,
    centrality: usize,
    model: &BlastWave,
    starts: usize,
    rng_seed: u64,
    max_iters: u64,
) -> Result<JointFit, AppError> {
    let (t_seed, beta_window) = match charge {
        Some(_) => (catalog::JOINT_T_SEED, catalog::JOINT_BETA_WINDOW),
        None => (catalog::JOINT_ALL_T_SEED, catalog::JOINT_ALL_BETA_WINDOW),
    };
    let t_bounds = ParamBounds::new(catalog::JOINT_T_WINDOW.0, catalog::JOINT_T_WINDOW.1);
    let beta_bounds = ParamBounds::new(beta_window.0, beta_window.1);

    let cells: Vec<JointCell> = data
        .iter()
        .map(|(species, points)| JointCell {
            points: points.clone(),
            mass: species.mass(),
            norm: ParamBounds::new(0.0, catalog::JOINT_NORM_MAX[species.index()]),
        })
        .collect();
    let cost = JointCost {
        cells: &cells,
        model,
        t: t_bounds,
        beta: beta_bounds,
    };

    let n_points = cost.n_points();
    let n_free = 2 + data.iter().filter(|(_, p)| !p.is_empty()).count();
    if n_points <= n_free {
        return Err(AppError::no_data(format!(
            "{n_points} points for {n_free} joint parameters"
        )));
    }

    let norm_seeds: Vec<f64> = data
        .iter()
        .map(|(s, _)| catalog::JOINT_NORM_SEED[s.index()])
        .collect();
    let u0 = cost.to_unbounded(t_seed, catalog::JOINT_BETA_SEED, &norm_seeds);

    // Deterministic multi-start: first start is the catalog seed, the rest
    // jitter it in the unbounded coordinates.
    let charge_bits = charge.map(|c| c.index() as u64 + 1).unwrap_or(0);
    let mut rng = StdRng::seed_from_u64(rng_seed ^ ((centrality as u64) << 8) ^ charge_bits);
    let jitter = Normal::new(0.0, 0.5)
        .map_err(|e| AppError::numeric(format!("bad jitter distribution: {e}")))?;

    let mut best: Option<(Vec<f64>, f64)> = None;
    for start in 0..starts.max(1) {
        let mut u = u0.clone();
        if start > 0 {
            for v in &mut u {
                *v += jitter.sample(&mut rng);
            }
        }
        let start_cost = JointCost {
            cells: &cells,
            model,
            t: t_bounds,
            beta: beta_bounds,
        };
        if let Ok((p, c)) = minimize(start_cost, &u, max_iters) {
            if best.as_ref().map(|(_, bc)| c < *bc).unwrap_or(true) {
                best = Some((p, c));
            }
        }
    }
    let (best_u, best_chi2) =
        best.ok_or_else(|| AppError::numeric("no joint-fit start converged"))?;

    let (t, beta, mut norms) = cost.to_physical(&best_u);

    // Curvature errors in physical space over the full parameter vector.
    let mut phys = vec![t, beta];
    phys.extend(&norms);
    let f = |q: &[f64]| cost.chi2_at(q[0], q[1], &q[2..]);
    let mut steps = default_steps(&phys);
    steps[0] = steps[0].min(t * 0.5);
    steps[1] = steps[1].min((1.0 - beta) * 0.5).max(1e-9);
    let (t_err, beta_err) = match chi2_errors(f, &phys, &steps) {
        Some(errs) => (errs[0], errs[1]),
        None => (0.0, 0.0),
    };

    for (slot, (_, points)) in norms.iter_mut().zip(data) {
        if points.is_empty() {
            *slot = 0.0;
        }
    }

    Ok(JointFit {
        charge,
        centrality,
        t,
        t_err,
        beta,
        beta_err,
        species: data.iter().map(|(s, _)| *s).collect(),
        norms,
        chi2: best_chi2,
        ndf: n_points - n_free,
    })
}

/// Run the configured joint fits over all centralities, in parallel.
///
/// Returns the successful fits and human-readable notes for the skipped
/// (centrality, charge) combinations.
pub fn run_joint_fits(
    spectra: &SpectraSet,
    config: &JointConfig,
    model: &BlastWave,
) -> (Vec<JointFit>, Vec<String>) {
    let charges: Vec<Option<Charge>> = match config.mode {
        JointMode::Pos => vec![Some(Charge::Positive)],
        JointMode::Neg => vec![Some(Charge::Negative)],
        JointMode::Both => vec![Some(Charge::Positive), Some(Charge::Negative)],
        JointMode::All => vec![None],
    };

    let jobs: Vec<(usize, Option<Charge>)> = (0..config.system.n_centralities())
        .flat_map(|centr| charges.iter().map(move |&c| (centr, c)))
        .collect();

    let (x_lo, x_hi) = catalog::JOINT_FIT_WINDOW;
    let results: Vec<Result<JointFit, String>> = jobs
        .par_iter()
        .map(|&(centrality, charge)| {
            let species: Vec<Species> = match charge {
                Some(c) => c.species().to_vec(),
                None => Species::ALL.to_vec(),
            };
            let data: Vec<(Species, Vec<SpectrumPoint>)> = species
                .iter()
                .map(|&s| (s, spectra.points_in_window(s, centrality, x_lo, x_hi)))
                .collect();
            fit_joint_cells(
                &data,
                charge,
                centrality,
                model,
                config.starts,
                config.seed,
                config.max_iters,
            )
            .map_err(|e| {
                let label = charge.map(|c| c.key()).unwrap_or("all");
                format!("centrality {centrality} ({label}): {e}")
            })
        })
        .collect();

    let mut fits = Vec::new();
    let mut notes = Vec::new();
    for r in results {
        match r {
            Ok(fit) => fits.push(fit),
            Err(note) => notes.push(note),
        }
    }
    fits.sort_by_key(|f| (f.centrality, f.charge.map(|c| c.index()).unwrap_or(0)));
    (fits, notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BwParams;

    fn synthetic(species: Species, norm: f64, t: f64, beta: f64, model: &BlastWave) -> Vec<SpectrumPoint> {
        let truth = BwParams {
            norm,
            t,
            beta,
            mass: species.mass(),
        };
        (0..10)
            .map(|i| {
                let x = 0.32 + 0.09 * i as f64;
                let y = model.value(x, &truth);
                SpectrumPoint {
                    x,
                    y,
                    y_err: 0.03 * y,
                }
            })
            .collect()
    }

    #[test]
    fn charge_split_fit_recovers_shared_shape() {
        let model = BlastWave::default();
        let (t_true, beta_true) = (0.11, 0.68);
        let data = vec![
            (
                Species::PiPlus,
                synthetic(Species::PiPlus, 120.0, t_true, beta_true, &model),
            ),
            (
                Species::KPlus,
                synthetic(Species::KPlus, 40.0, t_true, beta_true, &model),
            ),
            (
                Species::Proton,
                synthetic(Species::Proton, 200.0, t_true, beta_true, &model),
            ),
        ];

        let fit = fit_joint_cells(
            &data,
            Some(Charge::Positive),
            0,
            &model,
            2,
            42,
            800,
        )
        .unwrap();

        assert!((fit.t - t_true).abs() < 0.01, "T = {}", fit.t);
        assert!((fit.beta - beta_true).abs() < 0.05, "beta = {}", fit.beta);
        assert_eq!(fit.norms.len(), 3);
        assert!(fit.norms.iter().all(|&n| n > 0.0));
        assert_eq!(fit.ndf, 30 - 5);
    }

    #[test]
    fn species_without_points_get_zero_norm() {
        let model = BlastWave::default();
        let data = vec![
            (
                Species::PiMinus,
                synthetic(Species::PiMinus, 100.0, 0.11, 0.6, &model),
            ),
            (Species::KMinus, Vec::new()),
            (
                Species::AntiProton,
                synthetic(Species::AntiProton, 50.0, 0.11, 0.6, &model),
            ),
        ];
        let fit =
            fit_joint_cells(&data, Some(Charge::Negative), 1, &model, 1, 7, 600).unwrap();
        assert_eq!(fit.norms[1], 0.0);
        assert!(fit.norms[0] > 0.0);
    }

    #[test]
    fn underdetermined_joint_fit_is_a_no_data_error() {
        let model = BlastWave::default();
        let data = vec![
            (
                Species::PiPlus,
                vec![
                    SpectrumPoint {
                        x: 0.4,
                        y: 10.0,
                        y_err: 1.0,
                    },
                    SpectrumPoint {
                        x: 0.6,
                        y: 5.0,
                        y_err: 0.5,
                    },
                ],
            ),
            (Species::KPlus, Vec::new()),
            (Species::Proton, Vec::new()),
        ];
        let err = fit_joint_cells(&data, Some(Charge::Positive), 0, &model, 1, 1, 100)
            .unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn multi_start_is_deterministic_for_a_fixed_seed() {
        let model = BlastWave::default();
        let data = vec![(
            Species::PiPlus,
            synthetic(Species::PiPlus, 120.0, 0.11, 0.68, &model),
        )];
        let a = fit_joint_cells(&data, Some(Charge::Positive), 0, &model, 3, 9, 300).unwrap();
        let b = fit_joint_cells(&data, Some(Charge::Positive), 0, &model, 3, 9, 300).unwrap();
        assert_eq!(a.t.to_bits(), b.t.to_bits());
        assert_eq!(a.beta.to_bits(), b.beta.to_bits());
    }
}
