//! Command-line parsing for the blast-wave spectrum fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{CollisionSystem, InitScheme, JointMode, TrendX};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "bw", version, about = "Blast-Wave Spectrum Fitter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit every (species, centrality) cell of one system.
    Fit(FitArgs),
    /// Joint fits: one (T, beta) shared across species per centrality.
    Joint(JointArgs),
    /// Systematic spreads from fit-setup variations.
    Syst(SystArgs),
    /// Plot measured spectra with fitted curves from a parameter file.
    Spectra(SpectraArgs),
    /// Plot T/beta trends versus centrality from a parameter file.
    Trends(TrendsArgs),
}

/// Options shared by every data-reading command.
#[derive(Debug, Parser, Clone)]
pub struct DataArgs {
    /// Collision system to process.
    #[arg(short = 's', long, value_enum, default_value_t = CollisionSystem::AuAu)]
    pub system: CollisionSystem,

    /// Directory with the `<system>_<species>.txt` spectra files.
    #[arg(long, default_value = "input")]
    pub data_dir: PathBuf,
}

/// Options for the per-cell fit run.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Seed/bound source for the fits.
    #[arg(short = 'i', long, value_enum, default_value_t = InitScheme::Bounded)]
    pub init: InitScheme,

    /// Joint-fit parameter file (seeds for `--init global`).
    #[arg(long, default_value = "output/joint_params.txt")]
    pub joint_params: PathBuf,

    /// Per-cell parameter file (seeds for `--init previous`).
    #[arg(long, default_value = "output/cell_params.txt")]
    pub params_in: PathBuf,

    /// Where to write the fitted per-cell parameters.
    #[arg(short = 'o', long, default_value = "output/cell_params.txt")]
    pub out_params: PathBuf,

    /// Export the full run (fits + skips) as JSON.
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Render the spectra figure after fitting.
    #[arg(long)]
    pub plot: bool,

    /// Directory for rendered figures.
    #[arg(long, default_value = "output/plots")]
    pub plot_dir: PathBuf,

    /// Figure width in pixels.
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Figure height in pixels.
    #[arg(long, default_value_t = 1600)]
    pub height: u32,

    /// Trace (T, beta) confidence contours for every fitted cell.
    #[arg(long)]
    pub contour: bool,

    /// Highest contour level in sigma (1..=3).
    #[arg(long, default_value_t = 3)]
    pub sigma: usize,

    /// Rays per contour level.
    #[arg(long, default_value_t = 32)]
    pub contour_points: usize,

    /// Relative tolerance of the radial quadrature.
    #[arg(long, default_value_t = 1e-9)]
    pub rel_tol: f64,

    /// Nelder-Mead iteration cap.
    #[arg(long, default_value_t = 2000)]
    pub max_iters: u64,
}

/// Options for the joint fits.
#[derive(Debug, Parser, Clone)]
pub struct JointArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Charge selection: pos, neg, both, or all six species at once.
    #[arg(short = 'm', long, value_enum, default_value_t = JointMode::Both)]
    pub mode: JointMode,

    /// Where to write the joint parameters.
    #[arg(short = 'o', long, default_value = "output/joint_params.txt")]
    pub out_params: PathBuf,

    /// Multi-start count (first start is the catalog seed, the rest jittered).
    #[arg(long, default_value_t = 4)]
    pub starts: usize,

    /// RNG seed for the jittered starts.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Relative tolerance of the radial quadrature.
    #[arg(long, default_value_t = 1e-9)]
    pub rel_tol: f64,

    /// Nelder-Mead iteration cap.
    #[arg(long, default_value_t = 4000)]
    pub max_iters: u64,
}

/// Options for the systematic-variation run.
#[derive(Debug, Parser, Clone)]
pub struct SystArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Joint-fit parameter file providing the reference seeds.
    #[arg(long, default_value = "output/joint_params.txt")]
    pub joint_params: PathBuf,

    /// Where to write parameters with systematic spreads.
    #[arg(short = 'o', long, default_value = "output/cell_params_syst.txt")]
    pub out_params: PathBuf,

    /// Relative tolerance of the radial quadrature.
    #[arg(long, default_value_t = 1e-9)]
    pub rel_tol: f64,

    /// Nelder-Mead iteration cap.
    #[arg(long, default_value_t = 2000)]
    pub max_iters: u64,
}

/// Options for the standalone spectra figure.
#[derive(Debug, Parser, Clone)]
pub struct SpectraArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Per-cell parameter file with the curves to overlay.
    #[arg(long, default_value = "output/cell_params.txt")]
    pub params: PathBuf,

    /// Output PNG path.
    #[arg(short = 'o', long, default_value = "output/plots/spectra.png")]
    pub out: PathBuf,

    /// Figure width in pixels.
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Figure height in pixels.
    #[arg(long, default_value_t = 1600)]
    pub height: u32,

    /// Relative tolerance of the radial quadrature.
    #[arg(long, default_value_t = 1e-9)]
    pub rel_tol: f64,
}

/// Options for the parameter-trend figure.
#[derive(Debug, Parser, Clone)]
pub struct TrendsArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Per-cell parameter file with the fitted values.
    #[arg(long, default_value = "output/cell_params.txt")]
    pub params: PathBuf,

    /// Abscissa for the trends.
    #[arg(short = 'x', long, value_enum, default_value_t = TrendX::Percent)]
    pub trend_x: TrendX,

    /// Output PNG path.
    #[arg(short = 'o', long, default_value = "output/plots/trends.png")]
    pub out: PathBuf,

    /// Figure width in pixels.
    #[arg(long, default_value_t = 900)]
    pub width: u32,

    /// Figure height in pixels.
    #[arg(long, default_value_t = 1200)]
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn fit_defaults_parse() {
        let cli = Cli::try_parse_from(["bw", "fit"]).unwrap();
        match cli.command {
            Command::Fit(args) => {
                assert_eq!(args.data.system, CollisionSystem::AuAu);
                assert_eq!(args.init, InitScheme::Bounded);
                assert_eq!(args.sigma, 3);
                assert!(!args.plot);
            }
            _ => panic!("expected fit"),
        }
    }

    #[test]
    fn joint_flags_select_system_and_mode() {
        let cli = Cli::try_parse_from(["bw", "joint", "-s", "pal", "-m", "all"]).unwrap();
        match cli.command {
            Command::Joint(args) => {
                assert_eq!(args.data.system, CollisionSystem::PAl);
                assert_eq!(args.mode, JointMode::All);
            }
            _ => panic!("expected joint"),
        }
    }
}
