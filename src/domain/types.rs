//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON / flat parameter files
//! - reloaded later for plotting or comparisons

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::catalog;

/// Identified particle species, in the fixed file/index order used everywhere:
/// π⁺, π⁻, K⁺, K⁻, p, p̄.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Species {
    #[serde(rename = "pip")]
    #[value(name = "pip")]
    PiPlus,
    #[serde(rename = "pim")]
    #[value(name = "pim")]
    PiMinus,
    #[serde(rename = "kp")]
    #[value(name = "kp")]
    KPlus,
    #[serde(rename = "km")]
    #[value(name = "km")]
    KMinus,
    #[serde(rename = "p")]
    #[value(name = "p")]
    Proton,
    #[serde(rename = "ap")]
    #[value(name = "ap")]
    AntiProton,
}

impl Species {
    pub const ALL: [Species; 6] = [
        Species::PiPlus,
        Species::PiMinus,
        Species::KPlus,
        Species::KMinus,
        Species::Proton,
        Species::AntiProton,
    ];

    /// Canonical array index (matches the parameter-file `part` column).
    pub fn index(self) -> usize {
        match self {
            Species::PiPlus => 0,
            Species::PiMinus => 1,
            Species::KPlus => 2,
            Species::KMinus => 3,
            Species::Proton => 4,
            Species::AntiProton => 5,
        }
    }

    pub fn from_index(index: usize) -> Option<Species> {
        Species::ALL.get(index).copied()
    }

    /// Short key used in file names and table rows.
    pub fn key(self) -> &'static str {
        match self {
            Species::PiPlus => "pip",
            Species::PiMinus => "pim",
            Species::KPlus => "kp",
            Species::KMinus => "km",
            Species::Proton => "p",
            Species::AntiProton => "ap",
        }
    }

    /// Human-readable label for terminal output.
    pub fn label(self) -> &'static str {
        match self {
            Species::PiPlus => "pi+",
            Species::PiMinus => "pi-",
            Species::KPlus => "K+",
            Species::KMinus => "K-",
            Species::Proton => "p",
            Species::AntiProton => "pbar",
        }
    }

    /// Rest mass in GeV.
    pub fn mass(self) -> f64 {
        catalog::MASSES[self.index()]
    }

    pub fn charge(self) -> Charge {
        if self.index() % 2 == 0 {
            Charge::Positive
        } else {
            Charge::Negative
        }
    }

    /// Fit window in mT − m (GeV) for per-cell fits.
    pub fn fit_window(self) -> (f64, f64) {
        (
            catalog::FIT_XMIN[self.index()],
            catalog::FIT_XMAX[self.index()],
        )
    }

    pub fn is_pion(self) -> bool {
        matches!(self, Species::PiPlus | Species::PiMinus)
    }
}

/// Charge sign, doubling as the first column of the joint parameter file
/// (0 = positive, 1 = negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Charge {
    Positive,
    Negative,
}

impl Charge {
    pub fn index(self) -> usize {
        match self {
            Charge::Positive => 0,
            Charge::Negative => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Charge> {
        match index {
            0 => Some(Charge::Positive),
            1 => Some(Charge::Negative),
            _ => None,
        }
    }

    /// The three species of this charge sign, in (π, K, p) order.
    pub fn species(self) -> [Species; 3] {
        match self {
            Charge::Positive => [Species::PiPlus, Species::KPlus, Species::Proton],
            Charge::Negative => [Species::PiMinus, Species::KMinus, Species::AntiProton],
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Charge::Positive => "pos",
            Charge::Negative => "neg",
        }
    }
}

/// Collision system. Controls centrality binning, ⟨N_part⟩ tables and the
/// bound multipliers applied around globally-seeded fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum CollisionSystem {
    #[serde(rename = "AuAu")]
    #[value(name = "auau")]
    AuAu,
    #[serde(rename = "pAl")]
    #[value(name = "pal")]
    PAl,
    #[serde(rename = "HeAu")]
    #[value(name = "heau")]
    HeAu,
    #[serde(rename = "CuAu")]
    #[value(name = "cuau")]
    CuAu,
    #[serde(rename = "UU")]
    #[value(name = "uu")]
    UU,
}

impl CollisionSystem {
    pub fn index(self) -> usize {
        match self {
            CollisionSystem::AuAu => 0,
            CollisionSystem::PAl => 1,
            CollisionSystem::HeAu => 2,
            CollisionSystem::CuAu => 3,
            CollisionSystem::UU => 4,
        }
    }

    /// Key used in file names (`AuAu_pip.txt`, `GlobalBWparams_AuAu.txt`, ...).
    pub fn key(self) -> &'static str {
        match self {
            CollisionSystem::AuAu => "AuAu",
            CollisionSystem::PAl => "pAl",
            CollisionSystem::HeAu => "HeAu",
            CollisionSystem::CuAu => "CuAu",
            CollisionSystem::UU => "UU",
        }
    }

    pub fn n_centralities(self) -> usize {
        catalog::N_CENTR[self.index()]
    }

    pub fn centrality_label(self, centrality: usize) -> &'static str {
        catalog::CENTR_LABELS[self.index()][centrality]
    }

    /// Mean number of participant nucleons for a centrality class.
    pub fn npart(self, centrality: usize) -> f64 {
        catalog::NPART[self.index()][centrality]
    }

    /// Midpoint of the centrality interval in percent (plot abscissa).
    pub fn centrality_percent(self, centrality: usize) -> f64 {
        catalog::CENTR_PERCENT[self.index()][centrality]
    }
}

// Display renders the clap value name so the enums can serve as CLI defaults.

impl std::fmt::Display for CollisionSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CollisionSystem::AuAu => "auau",
            CollisionSystem::PAl => "pal",
            CollisionSystem::HeAu => "heau",
            CollisionSystem::CuAu => "cuau",
            CollisionSystem::UU => "uu",
        };
        f.write_str(name)
    }
}

/// One spectrum point: x is the transverse kinetic energy mT − m (GeV),
/// y the invariant yield, y_err its statistical error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumPoint {
    pub x: f64,
    pub y: f64,
    pub y_err: f64,
}

/// Blast-wave parameter set for one spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BwParams {
    /// Overall normalization constant.
    pub norm: f64,
    /// Kinetic freeze-out temperature (GeV).
    pub t: f64,
    /// Surface radial-flow velocity (units of c).
    pub beta: f64,
    /// Particle rest mass (GeV), fixed during fits.
    pub mass: f64,
}

/// Statistical errors on the free blast-wave parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BwErrors {
    pub norm: f64,
    pub t: f64,
    pub beta: f64,
}

/// Per-(species, centrality) fit result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellFit {
    pub species: Species,
    pub centrality: usize,
    pub params: BwParams,
    pub errors: BwErrors,
    pub chi2: f64,
    pub ndf: usize,
}

impl CellFit {
    pub fn chi2_ndf(&self) -> f64 {
        if self.ndf > 0 {
            self.chi2 / self.ndf as f64
        } else {
            f64::NAN
        }
    }
}

/// Relative systematic spreads on (norm, T, β) for one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BwSystematics {
    pub norm: f64,
    pub t: f64,
    pub beta: f64,
}

/// A cell that produced no fit, with the reason (kept for the run report;
/// a skipped cell never aborts the batch).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedCell {
    pub species: Species,
    pub centrality: usize,
    pub reason: String,
}

/// Joint (shared T, β) fit result for one centrality class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointFit {
    /// None for the all-species mode.
    pub charge: Option<Charge>,
    pub centrality: usize,
    pub t: f64,
    pub t_err: f64,
    pub beta: f64,
    pub beta_err: f64,
    /// Species entering the joint χ², in parameter order.
    pub species: Vec<Species>,
    /// Per-species normalizations, aligned with `species`.
    pub norms: Vec<f64>,
    pub chi2: f64,
    pub ndf: usize,
}

/// Seed/bound source for per-cell fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InitScheme {
    /// Seed each cell from a prior joint fit's parameter file, with tight
    /// per-system bound multipliers around the seed.
    Global,
    /// Seed each cell from a prior per-cell parameter file, bounds ·0.6..·1.5.
    Previous,
    /// Hand seeds with the catalog bounds; no parameter file needed.
    Bounded,
    /// Hand parameters, no minimization (evaluate/plot only).
    Manual,
}

impl InitScheme {
    pub fn key(self) -> &'static str {
        match self {
            InitScheme::Global => "global",
            InitScheme::Previous => "previous",
            InitScheme::Bounded => "bounded",
            InitScheme::Manual => "manual",
        }
    }
}

impl std::fmt::Display for InitScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Which charge selection a joint fit runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum JointMode {
    /// Positive species only (π⁺, K⁺, p).
    Pos,
    /// Negative species only (π⁻, K⁻, p̄).
    Neg,
    /// Both charge-split fits, written to the same file.
    Both,
    /// All six species in one joint χ².
    All,
}

impl std::fmt::Display for JointMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JointMode::Pos => "pos",
            JointMode::Neg => "neg",
            JointMode::Both => "both",
            JointMode::All => "all",
        };
        f.write_str(name)
    }
}

/// Abscissa for parameter-trend plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TrendX {
    /// Centrality interval midpoint in percent.
    Percent,
    /// Mean number of participants ⟨N_part⟩.
    Npart,
}

impl std::fmt::Display for TrendX {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TrendX::Percent => "percent",
            TrendX::Npart => "npart",
        })
    }
}

/// A full per-cell fit run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub data_dir: PathBuf,
    pub system: CollisionSystem,
    pub init: InitScheme,

    /// Joint-fit parameter file read by `InitScheme::Global`.
    pub joint_params: PathBuf,
    /// Per-cell parameter file read by `InitScheme::Previous`.
    pub params_in: PathBuf,

    pub out_params: PathBuf,
    pub export_json: Option<PathBuf>,

    pub plot: bool,
    pub plot_dir: PathBuf,
    pub plot_width: u32,
    pub plot_height: u32,

    pub contour: bool,
    /// Highest sigma level traced (1..=3).
    pub n_sigma: usize,
    /// Rays per contour level.
    pub contour_points: usize,

    /// Relative tolerance of the radial quadrature.
    pub rel_tol: f64,
    /// Nelder-Mead iteration cap.
    pub max_iters: u64,
}

/// Joint-fit run configuration.
#[derive(Debug, Clone)]
pub struct JointConfig {
    pub data_dir: PathBuf,
    pub system: CollisionSystem,
    pub mode: JointMode,
    pub out_params: PathBuf,

    /// Multi-start count (first start is the catalog seed, the rest jittered).
    pub starts: usize,
    pub seed: u64,

    pub rel_tol: f64,
    pub max_iters: u64,
}

/// Systematic-variation run configuration.
#[derive(Debug, Clone)]
pub struct SystConfig {
    pub data_dir: PathBuf,
    pub system: CollisionSystem,
    /// Joint-fit parameter file providing the reference seeds.
    pub joint_params: PathBuf,
    pub out_params: PathBuf,

    pub rel_tol: f64,
    pub max_iters: u64,
}
