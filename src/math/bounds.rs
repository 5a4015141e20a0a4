//! Logistic box-constraint transform for the simplex minimizer.
//!
//! Nelder-Mead is unconstrained, so bounded parameters are fitted in an
//! unbounded coordinate `u` and mapped back through a sigmoid:
//!
//! `x = lo + sigmoid(u) * (hi - lo)`
//!
//! The minimizer can then wander freely while the physical parameter stays
//! strictly inside `(lo, hi)`.

/// A closed parameter interval `[lo, hi]` with `lo < hi`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamBounds {
    pub lo: f64,
    pub hi: f64,
}

impl ParamBounds {
    pub fn new(lo: f64, hi: f64) -> Self {
        debug_assert!(lo < hi, "bounds must be ordered: {lo} >= {hi}");
        Self { lo, hi }
    }

    /// Map an unbounded coordinate into the interval.
    pub fn to_physical(&self, u: f64) -> f64 {
        self.lo + sigmoid(u) * (self.hi - self.lo)
    }

    /// Inverse map; values at/outside the bounds are nudged inside first
    /// so the logit stays finite.
    pub fn to_unbounded(&self, x: f64) -> f64 {
        const MARGIN: f64 = 1e-9;
        let f = ((x - self.lo) / (self.hi - self.lo)).clamp(MARGIN, 1.0 - MARGIN);
        (f / (1.0 - f)).ln()
    }

    pub fn clamp(&self, x: f64) -> f64 {
        x.clamp(self.lo, self.hi)
    }

    pub fn contains(&self, x: f64) -> bool {
        (self.lo..=self.hi).contains(&x)
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }
}

/// Numerically stable sigmoid (no overflow for large |u|).
fn sigmoid(u: f64) -> f64 {
    if u >= 0.0 {
        1.0 / (1.0 + (-u).exp())
    } else {
        let e = u.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_inside_interval() {
        let b = ParamBounds::new(0.06, 0.22);
        for &x in &[0.0601, 0.09, 0.14, 0.2199] {
            let u = b.to_unbounded(x);
            assert!((b.to_physical(u) - x).abs() < 1e-12);
        }
    }

    #[test]
    fn physical_values_stay_bounded() {
        let b = ParamBounds::new(0.1, 0.99);
        for &u in &[-1e3, -10.0, 0.0, 10.0, 1e3] {
            let x = b.to_physical(u);
            assert!(x >= b.lo && x <= b.hi);
        }
    }

    #[test]
    fn midpoint_maps_to_zero() {
        let b = ParamBounds::new(-2.0, 4.0);
        assert!((b.to_unbounded(1.0)).abs() < 1e-12);
        assert!((b.to_physical(0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_inputs_are_nudged_not_nan() {
        let b = ParamBounds::new(0.0, 1.0);
        assert!(b.to_unbounded(-5.0).is_finite());
        assert!(b.to_unbounded(7.0).is_finite());
    }
}
