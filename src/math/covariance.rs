//! Parameter covariance from a χ² surface.
//!
//! For a χ² objective the covariance of the minimizing parameters is
//! `2 · H⁻¹` with `H` the Hessian of χ² at the minimum. The Hessian is
//! formed by central differences; no analytic gradients are needed, which
//! matches the numeric (quadrature-based) model evaluation.

use nalgebra::DMatrix;

/// Central-difference Hessian of `f` at `p`, with per-parameter steps.
pub fn hessian<F>(f: F, p: &[f64], steps: &[f64]) -> DMatrix<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let n = p.len();
    debug_assert_eq!(steps.len(), n);
    let f0 = f(p);
    let mut h = DMatrix::zeros(n, n);
    let mut q = p.to_vec();

    for i in 0..n {
        let hi = steps[i];

        q[i] = p[i] + hi;
        let fp = f(&q);
        q[i] = p[i] - hi;
        let fm = f(&q);
        q[i] = p[i];
        h[(i, i)] = (fp - 2.0 * f0 + fm) / (hi * hi);

        for j in (i + 1)..n {
            let hj = steps[j];

            q[i] = p[i] + hi;
            q[j] = p[j] + hj;
            let fpp = f(&q);
            q[j] = p[j] - hj;
            let fpm = f(&q);
            q[i] = p[i] - hi;
            let fmm = f(&q);
            q[j] = p[j] + hj;
            let fmp = f(&q);
            q[i] = p[i];
            q[j] = p[j];

            let hij = (fpp - fpm - fmp + fmm) / (4.0 * hi * hj);
            h[(i, j)] = hij;
            h[(j, i)] = hij;
        }
    }
    h
}

/// Parameter errors `sqrt(diag(2·H⁻¹))` of a χ² minimum.
///
/// Returns `None` when the Hessian is singular or the resulting variances
/// are not all positive (the minimum is degenerate or the steps were bad).
pub fn chi2_errors<F>(f: F, p: &[f64], steps: &[f64]) -> Option<Vec<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    let h = hessian(f, p, steps);
    let inv = h.try_inverse()?;
    let mut errs = Vec::with_capacity(p.len());
    for i in 0..p.len() {
        let var = 2.0 * inv[(i, i)];
        if !var.is_finite() || var <= 0.0 {
            return None;
        }
        errs.push(var.sqrt());
    }
    Some(errs)
}

/// Reasonable finite-difference steps: relative with an absolute floor.
pub fn default_steps(p: &[f64]) -> Vec<f64> {
    p.iter().map(|v| (v.abs() * 1e-3).max(1e-6)).collect()
}
