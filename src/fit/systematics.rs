//! Systematic uncertainties from fit-setup variations.
//!
//! The reference is the globally-seeded fit of every cell. Each variation
//! perturbs the seed or the limit multipliers (or swaps to the bounded
//! scheme entirely), refits, and contributes `(p_var/p_ref − 1)²` to the
//! per-parameter accumulator. The final spread is `sqrt(Σ)/2`, stored as a
//! relative uncertainty beside the statistical errors.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::domain::catalog::BETA_CAP;
use crate::domain::{
    BwParams, BwSystematics, CellFit, InitScheme, SkippedCell, Species,
};
use crate::fit::objective::CellBounds;
use crate::fit::single::{cell_seed, fit_all_cells, fit_cell, CellSeed};
use crate::io::params::JointSeed;
use crate::io::spectra::SpectraSet;
use crate::math::ParamBounds;
use crate::model::BlastWave;

/// Default limit multipliers around a systematic seed.
const LIMIT_MULTS: (f64, f64) = (0.5, 1.5);

/// One fit-setup variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variation {
    TSeedLow,
    TSeedHigh,
    BetaSeedLow,
    BetaSeedHigh,
    NormSeedLow,
    NormSeedHigh,
    LimitsNarrow,
    LimitsWide,
    BoundedRefit,
}

impl Variation {
    pub const ALL: [Variation; 9] = [
        Variation::TSeedLow,
        Variation::TSeedHigh,
        Variation::BetaSeedLow,
        Variation::BetaSeedHigh,
        Variation::NormSeedLow,
        Variation::NormSeedHigh,
        Variation::LimitsNarrow,
        Variation::LimitsWide,
        Variation::BoundedRefit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Variation::TSeedLow => "T seed x0.8",
            Variation::TSeedHigh => "T seed x1.2",
            Variation::BetaSeedLow => "beta seed x0.8",
            Variation::BetaSeedHigh => "beta seed x1.2",
            Variation::NormSeedLow => "norm seed x0.1",
            Variation::NormSeedHigh => "norm seed x10",
            Variation::LimitsNarrow => "limits x0.8",
            Variation::LimitsWide => "limits x1.2",
            Variation::BoundedRefit => "bounded-scheme refit",
        }
    }

    /// Apply the variation to a seed and the limit multipliers.
    fn apply(self, seed: &mut BwParams, lims: &mut (f64, f64)) {
        match self {
            Variation::TSeedLow => seed.t *= 0.8,
            Variation::TSeedHigh => seed.t *= 1.2,
            Variation::BetaSeedLow => seed.beta *= 0.8,
            Variation::BetaSeedHigh => seed.beta *= 1.2,
            Variation::NormSeedLow => seed.norm *= 0.1,
            Variation::NormSeedHigh => seed.norm *= 10.0,
            Variation::LimitsNarrow => {
                lims.0 *= 0.8;
                lims.1 *= 0.8;
            }
            Variation::LimitsWide => {
                lims.0 *= 1.2;
                lims.1 *= 1.2;
            }
            Variation::BoundedRefit => {}
        }
    }
}

/// Boxes for a systematic refit: all three parameters get the multipliers,
/// β additionally capped at 0.95.
fn syst_bounds(seed: &BwParams, lims: (f64, f64)) -> CellBounds {
    let (l, r) = lims;
    let beta_hi = (seed.beta * r).min(BETA_CAP);
    let beta_lo = (seed.beta * l).min(beta_hi * 0.99);
    CellBounds {
        norm: ParamBounds::new(seed.norm * l, seed.norm * r),
        t: ParamBounds::new(seed.t * l, seed.t * r),
        beta: ParamBounds::new(beta_lo, beta_hi),
    }
}

/// Relative spread from the per-variation parameter sets of one cell.
pub(crate) fn spread(reference: &BwParams, varied: &[BwParams]) -> BwSystematics {
    let mut sum = [0.0f64; 3];
    for v in varied {
        let refs = [reference.norm, reference.t, reference.beta];
        let vals = [v.norm, v.t, v.beta];
        for i in 0..3 {
            if refs[i] != 0.0 {
                sum[i] += (vals[i] / refs[i] - 1.0).powi(2);
            }
        }
    }
    BwSystematics {
        norm: sum[0].sqrt() / 2.0,
        t: sum[1].sqrt() / 2.0,
        beta: sum[2].sqrt() / 2.0,
    }
}

fn fit_variation(
    spectra: &SpectraSet,
    joint: &[Vec<Option<JointSeed>>],
    model: &BlastWave,
    max_iters: u64,
    variation: Variation,
) -> Vec<CellFit> {
    if variation == Variation::BoundedRefit {
        return fit_all_cells(spectra, InitScheme::Bounded, None, None, model, max_iters).0;
    }

    let system = spectra.system;
    let cells: Vec<(Species, usize)> = Species::ALL
        .into_iter()
        .flat_map(|s| (0..system.n_centralities()).map(move |c| (s, c)))
        .collect();

    cells
        .par_iter()
        .filter_map(|&(species, centrality)| {
            let base = cell_seed(
                InitScheme::Global,
                system,
                species,
                centrality,
                Some(joint),
                None,
            )?;
            let mut params = base.params;
            params.beta = params.beta.min(BETA_CAP);
            let mut lims = LIMIT_MULTS;
            variation.apply(&mut params, &mut lims);
            params.beta = params.beta.min(BETA_CAP);

            let seed = CellSeed {
                params,
                bounds: syst_bounds(&params, lims),
                minimize: true,
            };
            let (x_lo, x_hi) = species.fit_window();
            let points = spectra.points_in_window(species, centrality, x_lo, x_hi);
            fit_cell(species, centrality, &points, &seed, model, max_iters).ok()
        })
        .collect()
}

/// Full systematic workflow: reference fit, variation refits, spreads.
pub fn run_systematics(
    spectra: &SpectraSet,
    joint: &[Vec<Option<JointSeed>>],
    model: &BlastWave,
    max_iters: u64,
) -> (Vec<(CellFit, BwSystematics)>, Vec<SkippedCell>) {
    let (reference, skipped) = fit_all_cells(
        spectra,
        InitScheme::Global,
        Some(joint),
        None,
        model,
        max_iters,
    );

    let mut varied: HashMap<(usize, usize), Vec<BwParams>> = HashMap::new();
    for variation in Variation::ALL {
        for fit in fit_variation(spectra, joint, model, max_iters, variation) {
            varied
                .entry((fit.species.index(), fit.centrality))
                .or_default()
                .push(fit.params);
        }
    }

    let entries = reference
        .into_iter()
        .map(|fit| {
            let key = (fit.species.index(), fit.centrality);
            let syst = varied
                .get(&key)
                .map(|v| spread(&fit.params, v))
                .unwrap_or_default();
            (fit, syst)
        })
        .collect();
    (entries, skipped)
}
