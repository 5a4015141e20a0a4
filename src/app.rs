//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads spectra and parameter files
//! - runs the fits (per-cell, joint, or systematic)
//! - prints reports
//! - writes parameter files, JSON summaries, and figures

use clap::Parser;

use crate::cli::{Command, FitArgs, JointArgs, SpectraArgs, SystArgs, TrendsArgs};
use crate::domain::{CellFit, FitConfig, JointConfig, JointMode, SystConfig};
use crate::error::AppError;
use crate::model::BlastWave;

pub mod pipeline;

/// Entry point for the `bw` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Joint(args) => handle_joint(args),
        Command::Syst(args) => handle_syst(args),
        Command::Spectra(args) => handle_spectra(args),
        Command::Trends(args) => handle_trends(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args);
    let run = pipeline::run_fit(&config)?;

    println!(
        "{}",
        crate::report::format_fit_summary(&run.spectra, config.init, &run.fits, &run.skipped)
    );

    crate::io::params::write_cell_params(&config.out_params, config.system, &run.fits)?;

    if let Some(path) = &config.export_json {
        let file = crate::io::summary::FitRunFile::new(
            config.system,
            config.init,
            run.fits.clone(),
            run.skipped.clone(),
        );
        crate::io::summary::write_run_json(path, &file)?;
    }

    let model = BlastWave {
        rel_tol: config.rel_tol,
    };
    if config.plot {
        let path = config
            .plot_dir
            .join(format!("spectra_{}.png", config.system.key()));
        crate::plot::plot_spectra(
            &run.spectra,
            &run.fits,
            &model,
            &path,
            config.plot_width,
            config.plot_height,
        )?;
        println!("Wrote {}", path.display());
    }

    if config.contour {
        for fit in &run.fits {
            write_cell_contour(&config, &run.spectra, &model, fit)?;
        }
    }
    Ok(())
}

fn write_cell_contour(
    config: &FitConfig,
    spectra: &crate::io::spectra::SpectraSet,
    model: &BlastWave,
    fit: &CellFit,
) -> Result<(), AppError> {
    let (x_lo, x_hi) = fit.species.fit_window();
    let points = spectra.points_in_window(fit.species, fit.centrality, x_lo, x_hi);
    let set = crate::fit::trace_contours(&points, model, fit, config.n_sigma, config.contour_points);

    for note in &set.notes {
        println!(
            "contour {} {}: {note}",
            fit.species.label(),
            config.system.centrality_label(fit.centrality)
        );
    }
    if set.levels.is_empty() {
        return Ok(());
    }

    let path = config.plot_dir.join(format!(
        "contour_{}_{}_{}.png",
        config.system.key(),
        fit.species.key(),
        fit.centrality
    ));
    crate::plot::plot_contours(fit, &set, &path, 600, 600)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn handle_joint(args: JointArgs) -> Result<(), AppError> {
    let config = joint_config_from_args(&args);
    let run = pipeline::run_joint(&config)?;

    println!(
        "{}",
        crate::report::format_joint_summary(&run.spectra, &run.fits, &run.notes)
    );

    match config.mode {
        JointMode::All => crate::io::params::write_all_params(&config.out_params, &run.fits)?,
        _ => crate::io::params::write_joint_params(&config.out_params, &run.fits)?,
    }
    Ok(())
}

fn handle_syst(args: SystArgs) -> Result<(), AppError> {
    let config = syst_config_from_args(&args);
    let run = pipeline::run_syst(&config)?;

    println!(
        "{}",
        crate::report::format_syst_summary(&run.spectra, &run.entries, &run.skipped)
    );
    crate::io::params::write_syst_params(&config.out_params, config.system, &run.entries)?;
    Ok(())
}

fn handle_spectra(args: SpectraArgs) -> Result<(), AppError> {
    let spectra = crate::io::spectra::load_spectra(&args.data.data_dir, args.data.system)?;
    let fits = read_fits_for_plotting(&args.params, args.data.system)?;
    let model = BlastWave {
        rel_tol: args.rel_tol,
    };
    crate::plot::plot_spectra(&spectra, &fits, &model, &args.out, args.width, args.height)?;
    println!("Wrote {}", args.out.display());
    Ok(())
}

fn handle_trends(args: TrendsArgs) -> Result<(), AppError> {
    let fits = read_fits_for_plotting(&args.params, args.data.system)?;
    crate::plot::plot_trends(
        args.data.system,
        &fits,
        args.trend_x,
        &args.out,
        args.width,
        args.height,
    )?;
    println!("Wrote {}", args.out.display());
    Ok(())
}

/// Rebuild plottable cell fits from a per-cell parameter file.
fn read_fits_for_plotting(
    path: &std::path::Path,
    system: crate::domain::CollisionSystem,
) -> Result<Vec<CellFit>, AppError> {
    let grid = crate::io::params::read_cell_params(path, system)?;
    let mut fits = Vec::new();
    for (part, row) in grid.iter().enumerate() {
        for (centrality, cell) in row.iter().enumerate() {
            if let Some(cell) = cell {
                fits.push(CellFit {
                    species: crate::domain::Species::ALL[part],
                    centrality,
                    params: cell.params,
                    errors: cell.errors,
                    chi2: 0.0,
                    ndf: 0,
                });
            }
        }
    }
    if fits.is_empty() {
        return Err(AppError::no_data(format!(
            "no fitted cells in '{}'",
            path.display()
        )));
    }
    Ok(fits)
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        data_dir: args.data.data_dir.clone(),
        system: args.data.system,
        init: args.init,
        joint_params: args.joint_params.clone(),
        params_in: args.params_in.clone(),
        out_params: args.out_params.clone(),
        export_json: args.export_json.clone(),
        plot: args.plot,
        plot_dir: args.plot_dir.clone(),
        plot_width: args.width,
        plot_height: args.height,
        contour: args.contour,
        n_sigma: args.sigma,
        contour_points: args.contour_points,
        rel_tol: args.rel_tol,
        max_iters: args.max_iters,
    }
}

pub fn joint_config_from_args(args: &JointArgs) -> JointConfig {
    JointConfig {
        data_dir: args.data.data_dir.clone(),
        system: args.data.system,
        mode: args.mode,
        out_params: args.out_params.clone(),
        starts: args.starts,
        seed: args.seed,
        rel_tol: args.rel_tol,
        max_iters: args.max_iters,
    }
}

pub fn syst_config_from_args(args: &SystArgs) -> SystConfig {
    SystConfig {
        data_dir: args.data.data_dir.clone(),
        system: args.data.system,
        joint_params: args.joint_params.clone(),
        out_params: args.out_params.clone(),
        rel_tol: args.rel_tol,
        max_iters: args.max_iters,
    }
}
