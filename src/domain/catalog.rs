//! Physics catalog: masses, fit windows, seed tables, centrality binning.
//!
//! All energies/masses in GeV, velocities in units of c, radii in fm.

/// Species count (π⁺, π⁻, K⁺, K⁻, p, p̄).
pub const N_SPECIES: usize = 6;

pub const MASSES: [f64; N_SPECIES] = [
    0.13957061, 0.13957061, 0.493667, 0.493667, 0.938272, 0.938272,
];

/// Per-cell fit windows in mT − m.
pub const FIT_XMIN: [f64; N_SPECIES] = [0.4, 0.2, 0.12, 0.4, 0.2, 0.12];
pub const FIT_XMAX: [f64; N_SPECIES] = [1.0; N_SPECIES];

/// Radial integration range of the blast-wave source (fm).
pub const R_MIN: f64 = 1e-4;
pub const R_MAX: f64 = 13.0;

/// Normalization seeds and upper bounds for per-cell fits (lower bound 0).
pub const NORM_SEED: [f64; N_SPECIES] = [10.0, 10.0, 1.0, 1.0, 0.1, 0.001];
pub const NORM_MAX: [f64; N_SPECIES] = [500.0, 500.0, 50.0, 50.0, 5000.0, 50.0];

/// Normalization seeds and upper bounds for joint fits.
pub const JOINT_NORM_SEED: [f64; N_SPECIES] = [100.0, 100.0, 120.0, 60.0, 0.01, 0.0001];
pub const JOINT_NORM_MAX: [f64; N_SPECIES] = [500.0, 500.0, 100.0, 100.0, 5000.0, 100.0];

/// Hand seeds for the bounded init scheme.
pub const BOUNDED_T_SEED: f64 = 0.09;
pub const BOUNDED_BETA_SEED: f64 = 0.75;
pub const BOUNDED_T_WINDOW: (f64, f64) = (0.06, 0.22);
pub const BOUNDED_BETA_WINDOW: (f64, f64) = (0.4, 0.8);

/// Joint charge-split fit: window, seeds and bounds.
pub const JOINT_FIT_WINDOW: (f64, f64) = (0.3, 1.2);
pub const JOINT_T_SEED: f64 = 0.108;
pub const JOINT_BETA_SEED: f64 = 0.7;
pub const JOINT_T_WINDOW: (f64, f64) = (0.08, 0.2);
pub const JOINT_BETA_WINDOW: (f64, f64) = (0.1, 0.99);

/// Joint all-species fit deviations from the charge-split setup.
pub const JOINT_ALL_T_SEED: f64 = 0.10;
pub const JOINT_ALL_BETA_WINDOW: (f64, f64) = (0.5, 0.95);

/// Hard ceiling on β during systematic refits.
pub const BETA_CAP: f64 = 0.95;

/// Two-parameter joint confidence levels Δχ² for 1σ, 2σ, 3σ.
pub const CHI2_LEVELS_2PAR: [f64; 3] = [2.30, 6.18, 11.83];

/// Bound multipliers applied around a seed taken from a joint-fit file.
#[derive(Debug, Clone, Copy)]
pub struct SeedWindow {
    /// (low, high) multipliers on the T seed.
    pub t: (f64, f64),
    /// (low, high) multipliers on the β seed.
    pub beta: (f64, f64),
    /// Upper-bound multiplier on the normalization seed (lower bound 0).
    pub norm_hi: f64,
}

/// Per-system seed windows for the globally-seeded init scheme.
/// Indexed like `CollisionSystem::index()`.
pub const SEED_WINDOWS: [SeedWindow; 5] = [
    // AuAu
    SeedWindow {
        t: (0.99, 1.5),
        beta: (0.99, 1.5),
        norm_hi: 1000.0,
    },
    // pAl
    SeedWindow {
        t: (0.7, 1.3),
        beta: (0.7, 1.3),
        norm_hi: 300.0,
    },
    // HeAu
    SeedWindow {
        t: (0.7, 1.1),
        beta: (0.7, 1.1),
        norm_hi: 1000.0,
    },
    // CuAu
    SeedWindow {
        t: (0.99, 1.3),
        beta: (0.99, 1.3),
        norm_hi: 300.0,
    },
    // UU
    SeedWindow {
        t: (0.99, 1.3),
        beta: (0.99, 1.3),
        norm_hi: 100.0,
    },
];

/// Bound multipliers for seeds taken from a prior per-cell fit.
pub const PREVIOUS_WINDOW: (f64, f64) = (0.6, 1.5);

/// Centrality class counts per system (AuAu, pAl, HeAu, CuAu, UU).
pub const N_CENTR: [usize; 5] = [12, 4, 5, 5, 4];

pub const CENTR_LABELS: [&[&str]; 5] = [
    &[
        "MB", "0-5%", "5-10%", "10-15%", "15-20%", "20-30%", "30-40%", "40-50%", "50-60%",
        "60-70%", "70-80%", "80-92%",
    ],
    &["0-72%", "0-20%", "20-40%", "40-72%"],
    &["0-88%", "0-20%", "20-40%", "40-60%", "60-88%"],
    &["0-80%", "0-20%", "20-40%", "40-60%", "60-80%"],
    &["0-20%", "20-40%", "40-60%", "60-80%"],
];

/// Centrality interval midpoints in percent (MB classes use the interval
/// midpoint of their coverage).
pub const CENTR_PERCENT: [&[f64]; 5] = [
    &[
        46.0, 2.5, 7.5, 12.5, 17.5, 25.0, 35.0, 45.0, 55.0, 65.0, 75.0, 86.0,
    ],
    &[36.0, 10.0, 30.0, 56.0],
    &[44.0, 10.0, 30.0, 50.0, 74.0],
    &[40.0, 10.0, 30.0, 50.0, 70.0],
    &[10.0, 30.0, 50.0, 70.0],
];

/// Mean participant numbers ⟨N_part⟩ per (system, centrality).
pub const NPART: [&[f64]; 5] = [
    &[
        109.1, 351.4, 299.0, 253.9, 215.3, 166.6, 114.2, 74.4, 45.5, 25.7, 13.4, 6.3,
    ],
    &[3.1, 4.35, 3.3, 2.7],
    &[11.34, 21.84, 15.38, 9.51, 4.87],
    &[57.0, 154.8, 80.4, 34.9, 7.5],
    &[330.0, 159.0, 61.6, 17.8],
];

/// Hand parameters for the manual (no-fit) scheme. Measured AuAu values;
/// other systems fall back to the bounded seeds.
pub const MANUAL_T_AUAU: [f64; 12] = [
    0.132, 0.1078, 0.1098, 0.1133, 0.1165, 0.123, 0.132, 0.142, 0.153, 0.163, 0.168, 0.179,
];
pub const MANUAL_BETA_AUAU: [f64; 12] = [
    0.71, 0.773, 0.769, 0.763, 0.754, 0.738, 0.71, 0.67, 0.614, 0.555, 0.497, 0.399,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_cover_every_centrality() {
        for sys in 0..5 {
            assert_eq!(CENTR_LABELS[sys].len(), N_CENTR[sys]);
            assert_eq!(CENTR_PERCENT[sys].len(), N_CENTR[sys]);
            assert_eq!(NPART[sys].len(), N_CENTR[sys]);
        }
    }

    #[test]
    fn windows_are_ordered() {
        for i in 0..N_SPECIES {
            assert!(FIT_XMIN[i] < FIT_XMAX[i]);
            assert!(NORM_SEED[i] <= NORM_MAX[i]);
            assert!(JOINT_NORM_SEED[i] > 0.0 && JOINT_NORM_MAX[i] > 0.0);
        }
        assert!(BOUNDED_T_WINDOW.0 < BOUNDED_T_SEED && BOUNDED_T_SEED < BOUNDED_T_WINDOW.1);
        assert!(
            BOUNDED_BETA_WINDOW.0 < BOUNDED_BETA_SEED && BOUNDED_BETA_SEED < BOUNDED_BETA_WINDOW.1
        );
        assert!(JOINT_T_WINDOW.0 < JOINT_T_SEED && JOINT_T_SEED < JOINT_T_WINDOW.1);
        assert!(JOINT_ALL_BETA_WINDOW.0 < JOINT_BETA_SEED);
    }

    #[test]
    fn sigma_levels_increase() {
        assert!(CHI2_LEVELS_2PAR.windows(2).all(|w| w[0] < w[1]));
    }
}
