//! χ² objectives for the simplex minimizer.
//!
//! The minimizer works in unbounded coordinates; each cost function maps
//! them through the logistic transform before evaluating the model, so the
//! physical parameters can never leave their boxes.

use argmin::core::{CostFunction, Error};

use crate::domain::{BwParams, SpectrumPoint};
use crate::math::ParamBounds;
use crate::model::BlastWave;

/// Weighted χ² of one point set at physical parameters.
///
/// A non-finite model value poisons the whole sum with +inf so the simplex
/// backs away from the region.
pub fn chi2(points: &[SpectrumPoint], model: &BlastWave, params: &BwParams) -> f64 {
    let mut sum = 0.0;
    for p in points {
        let f = model.value(p.x, params);
        if !f.is_finite() {
            return f64::INFINITY;
        }
        let r = (p.y - f) / p.y_err;
        sum += r * r;
    }
    sum
}

/// Boxes for the three free parameters of a single cell.
#[derive(Debug, Clone, Copy)]
pub struct CellBounds {
    pub norm: ParamBounds,
    pub t: ParamBounds,
    pub beta: ParamBounds,
}

impl CellBounds {
    /// Unbounded `[u_norm, u_T, u_beta]` to physical parameters.
    pub fn to_physical(&self, u: &[f64], mass: f64) -> BwParams {
        BwParams {
            norm: self.norm.to_physical(u[0]),
            t: self.t.to_physical(u[1]),
            beta: self.beta.to_physical(u[2]),
            mass,
        }
    }

    pub fn to_unbounded(&self, p: &BwParams) -> Vec<f64> {
        vec![
            self.norm.to_unbounded(p.norm),
            self.t.to_unbounded(p.t),
            self.beta.to_unbounded(p.beta),
        ]
    }
}

/// Single-cell cost in unbounded coordinates.
pub struct CellCost<'a> {
    pub points: &'a [SpectrumPoint],
    pub model: &'a BlastWave,
    pub mass: f64,
    pub bounds: CellBounds,
}

impl CostFunction for CellCost<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, u: &Self::Param) -> Result<Self::Output, Error> {
        let p = self.bounds.to_physical(u, self.mass);
        Ok(chi2(self.points, self.model, &p))
    }
}

/// One species' slice of a joint fit.
pub struct JointCell {
    pub points: Vec<SpectrumPoint>,
    pub mass: f64,
    pub norm: ParamBounds,
}

/// Joint cost over several species sharing (T, β).
///
/// Parameter packing: `u = [u_T, u_beta, u_c0, .., u_c{k-1}]` with one
/// normalization per cell, mirroring the per-centrality joint χ²
/// `Σ_s χ²_s(c_s, T, β, m_s)`.
pub struct JointCost<'a> {
    pub cells: &'a [JointCell],
    pub model: &'a BlastWave,
    pub t: ParamBounds,
    pub beta: ParamBounds,
}

impl JointCost<'_> {
    pub fn n_params(&self) -> usize {
        2 + self.cells.len()
    }

    /// Unbounded vector to `(T, β, norms)`.
    pub fn to_physical(&self, u: &[f64]) -> (f64, f64, Vec<f64>) {
        let t = self.t.to_physical(u[0]);
        let beta = self.beta.to_physical(u[1]);
        let norms = self
            .cells
            .iter()
            .zip(&u[2..])
            .map(|(cell, &uc)| cell.norm.to_physical(uc))
            .collect();
        (t, beta, norms)
    }

    pub fn to_unbounded(&self, t: f64, beta: f64, norms: &[f64]) -> Vec<f64> {
        let mut u = vec![self.t.to_unbounded(t), self.beta.to_unbounded(beta)];
        u.extend(
            self.cells
                .iter()
                .zip(norms)
                .map(|(cell, &c)| cell.norm.to_unbounded(c)),
        );
        u
    }

    /// χ² at physical shared parameters and per-cell norms.
    pub fn chi2_at(&self, t: f64, beta: f64, norms: &[f64]) -> f64 {
        let mut sum = 0.0;
        for (cell, &norm) in self.cells.iter().zip(norms) {
            let params = BwParams {
                norm,
                t,
                beta,
                mass: cell.mass,
            };
            sum += chi2(&cell.points, self.model, &params);
            if !sum.is_finite() {
                return f64::INFINITY;
            }
        }
        sum
    }

    pub fn n_points(&self) -> usize {
        self.cells.iter().map(|c| c.points.len()).sum()
    }
}

impl CostFunction for JointCost<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, u: &Self::Param) -> Result<Self::Output, Error> {
        let (t, beta, norms) = self.to_physical(u);
        Ok(self.chi2_at(t, beta, &norms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic(model: &BlastWave, truth: &BwParams, n: usize) -> Vec<SpectrumPoint> {
        (1..=n)
            .map(|i| {
                let x = 0.15 + 0.1 * i as f64;
                let y = model.value(x, truth);
                SpectrumPoint {
                    x,
                    y,
                    y_err: 0.03 * y,
                }
            })
            .collect()
    }

    fn truth() -> BwParams {
        BwParams {
            norm: 20.0,
            t: 0.12,
            beta: 0.65,
            mass: 0.13957061,
        }
    }

    #[test]
    fn chi2_vanishes_on_exact_data() {
        let model = BlastWave::default();
        let truth = truth();
        let points = synthetic(&model, &truth, 8);
        assert!(chi2(&points, &model, &truth) < 1e-10);
    }

    #[test]
    fn chi2_grows_away_from_truth() {
        let model = BlastWave::default();
        let truth = truth();
        let points = synthetic(&model, &truth, 8);
        let mut off = truth;
        off.t *= 1.2;
        assert!(chi2(&points, &model, &off) > 1.0);
    }

    #[test]
    fn chi2_is_infinite_for_unphysical_parameters() {
        let model = BlastWave::default();
        let points = synthetic(&model, &truth(), 4);
        let mut bad = truth();
        bad.beta = 1.5;
        assert_eq!(chi2(&points, &model, &bad), f64::INFINITY);
    }

    #[test]
    fn cell_bounds_round_trip() {
        let bounds = CellBounds {
            norm: ParamBounds::new(0.0, 500.0),
            t: ParamBounds::new(0.06, 0.22),
            beta: ParamBounds::new(0.4, 0.8),
        };
        let p = truth();
        let u = bounds.to_unbounded(&p);
        let back = bounds.to_physical(&u, p.mass);
        assert!((back.norm - p.norm).abs() < 1e-9);
        assert!((back.t - p.t).abs() < 1e-12);
        assert!((back.beta - p.beta).abs() < 1e-12);
    }

    #[test]
    fn joint_cost_packs_shared_then_norms() {
        let model = BlastWave::default();
        let truth = truth();
        let cells = vec![
            JointCell {
                points: synthetic(&model, &truth, 5),
                mass: truth.mass,
                norm: ParamBounds::new(0.0, 500.0),
            },
            JointCell {
                points: Vec::new(),
                mass: 0.493667,
                norm: ParamBounds::new(0.0, 100.0),
            },
        ];
        let cost = JointCost {
            cells: &cells,
            model: &model,
            t: ParamBounds::new(0.08, 0.2),
            beta: ParamBounds::new(0.1, 0.99),
        };
        assert_eq!(cost.n_params(), 4);
        assert_eq!(cost.n_points(), 5);

        let u = cost.to_unbounded(truth.t, truth.beta, &[truth.norm, 1.0]);
        let (t, beta, norms) = cost.to_physical(&u);
        assert!((t - truth.t).abs() < 1e-12);
        assert!((beta - truth.beta).abs() < 1e-12);
        assert!((norms[0] - truth.norm).abs() < 1e-9);

        // Empty second cell contributes nothing; exact data -> chi2 ~ 0.
        assert!(cost.chi2_at(t, beta, &norms) < 1e-9);
    }
}
