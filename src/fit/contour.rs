//! (T, β) confidence regions per cell.
//!
//! Contours are traced at the standard two-parameter joint Δχ² levels
//! (2.30 / 6.18 / 11.83 for 1σ/2σ/3σ) with the normalization profiled out
//! analytically, so each contour point is an exact profiled-χ² crossing.
//! Tracing walks rays from the best fit and bisects the crossing on each.
//!
//! A level whose region is not bounded within the physical domain is
//! reported in the notes and skipped; it never fails the run.

use crate::domain::catalog::CHI2_LEVELS_2PAR;
use crate::domain::{BwParams, CellFit, SpectrumPoint};
use crate::fit::objective::chi2;
use crate::model::BlastWave;

/// One traced level: points are (β, T) pairs around the best fit.
#[derive(Debug, Clone)]
pub struct ContourLevel {
    pub sigma: usize,
    pub delta_chi2: f64,
    pub points: Vec<(f64, f64)>,
}

/// All requested levels of one cell.
#[derive(Debug, Clone)]
pub struct ContourSet {
    pub levels: Vec<ContourLevel>,
    pub notes: Vec<String>,
}

/// χ² at (T, β) with the normalization at its analytic optimum.
pub fn profiled_chi2(
    points: &[SpectrumPoint],
    model: &BlastWave,
    t: f64,
    beta: f64,
    mass: f64,
) -> f64 {
    if t <= 0.0 || !(0.0..0.995).contains(&beta) {
        return f64::INFINITY;
    }
    let norm = model.profile_norm(points, t, beta, mass);
    chi2(
        points,
        model,
        &BwParams {
            norm,
            t,
            beta,
            mass,
        },
    )
}

/// Trace contours for one fitted cell over its windowed points.
pub fn trace_contours(
    points: &[SpectrumPoint],
    model: &BlastWave,
    best: &CellFit,
    n_sigma: usize,
    n_rays: usize,
) -> ContourSet {
    let mass = best.params.mass;
    let (t0, b0) = (best.params.t, best.params.beta);
    let chi2_min = profiled_chi2(points, model, t0, b0, mass);

    let mut set = ContourSet {
        levels: Vec::new(),
        notes: Vec::new(),
    };
    if !chi2_min.is_finite() {
        set.notes
            .push("best fit has non-finite profiled chi2".to_string());
        return set;
    }

    // Ray scaling from the statistical errors, with floors for cells where
    // the curvature estimate failed.
    let scale_t = best.errors.t.max(0.005);
    let scale_b = best.errors.beta.max(0.02);
    let n_rays = n_rays.max(4);

    for sigma in 1..=n_sigma.clamp(1, CHI2_LEVELS_2PAR.len()) {
        let delta = CHI2_LEVELS_2PAR[sigma - 1];
        let level = chi2_min + delta;

        let mut level_points = Vec::with_capacity(n_rays);
        let mut missed = 0usize;
        for k in 0..n_rays {
            let theta = std::f64::consts::TAU * k as f64 / n_rays as f64;
            let dt = theta.cos() * scale_t;
            let db = theta.sin() * scale_b;
            match ray_crossing(points, model, mass, (t0, b0), (dt, db), level) {
                Some(s) => level_points.push((b0 + s * db, t0 + s * dt)),
                None => missed += 1,
            }
        }

        if missed * 2 > n_rays {
            set.notes.push(format!(
                "{sigma} sigma region not bounded ({missed}/{n_rays} rays without a crossing)"
            ));
            continue;
        }
        set.levels.push(ContourLevel {
            sigma,
            delta_chi2: delta,
            points: level_points,
        });
    }
    set
}

/// Distance along a ray where the profiled χ² crosses `level`.
fn ray_crossing(
    points: &[SpectrumPoint],
    model: &BlastWave,
    mass: f64,
    origin: (f64, f64),
    dir: (f64, f64),
    level: f64,
) -> Option<f64> {
    let (t0, b0) = origin;
    let (dt, db) = dir;
    let f = |s: f64| profiled_chi2(points, model, t0 + s * dt, b0 + s * db, mass);

    // Bracket: double the step until the level is exceeded. Leaving the
    // physical domain returns +inf, which also terminates the bracket; rays
    // that stay below the level are unbounded.
    let mut hi = 1.0;
    let mut expansions = 0;
    while f(hi) < level {
        hi *= 2.0;
        expansions += 1;
        if expansions > 12 {
            return None;
        }
    }

    let mut lo = 0.0;
    for _ in 0..30 {
        let mid = 0.5 * (lo + hi);
        if f(mid) < level {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Some(0.5 * (lo + hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BwErrors, Species};

    fn best_cell(model: &BlastWave) -> (CellFit, Vec<SpectrumPoint>) {
        let truth = BwParams {
            norm: 20.0,
            t: 0.12,
            beta: 0.65,
            mass: Species::PiPlus.mass(),
        };
        let points: Vec<SpectrumPoint> = (0..5)
            .map(|i| {
                let x = 0.2 + 0.2 * i as f64;
                let y = model.value(x, &truth);
                SpectrumPoint {
                    x,
                    y,
                    y_err: 0.05 * y,
                }
            })
            .collect();
        let fit = CellFit {
            species: Species::PiPlus,
            centrality: 0,
            params: truth,
            errors: BwErrors {
                norm: 0.5,
                t: 0.004,
                beta: 0.02,
            },
            chi2: 0.0,
            ndf: 2,
        };
        (fit, points)
    }

    #[test]
    fn contour_points_sit_on_the_level() {
        let model = BlastWave::default();
        let (best, points) = best_cell(&model);
        let set = trace_contours(&points, &model, &best, 1, 8);

        assert_eq!(set.levels.len(), 1);
        let level = &set.levels[0];
        assert_eq!(level.sigma, 1);
        assert_eq!(level.points.len(), 8);

        let chi2_min =
            profiled_chi2(&points, &model, best.params.t, best.params.beta, best.params.mass);
        for &(beta, t) in &level.points {
            let c = profiled_chi2(&points, &model, t, beta, best.params.mass);
            assert!(
                (c - (chi2_min + level.delta_chi2)).abs() < 0.05,
                "chi2 {c} at ({beta}, {t})"
            );
        }
    }

    #[test]
    fn contours_surround_the_best_fit() {
        let model = BlastWave::default();
        let (best, points) = best_cell(&model);
        let set = trace_contours(&points, &model, &best, 1, 8);
        for &(beta, t) in &set.levels[0].points {
            let d = (beta - best.params.beta).abs() + (t - best.params.t).abs();
            assert!(d > 1e-6);
        }
    }

    #[test]
    fn degenerate_cell_reports_a_note() {
        let model = BlastWave::default();
        let (mut best, points) = best_cell(&model);
        best.params.beta = 1.5; // unphysical center
        let set = trace_contours(&points, &model, &best, 2, 8);
        assert!(set.levels.is_empty());
        assert_eq!(set.notes.len(), 1);
    }
}
