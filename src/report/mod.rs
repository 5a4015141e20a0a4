//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{BwSystematics, CellFit, InitScheme, JointFit, SkippedCell};
use crate::io::spectra::SpectraSet;

/// Format the full per-cell run summary (dataset stats + fit table).
pub fn format_fit_summary(
    spectra: &SpectraSet,
    init: InitScheme,
    fits: &[CellFit],
    skipped: &[SkippedCell],
) -> String {
    let mut out = String::new();

    out.push_str("=== bw - Blast-Wave Spectrum Fits ===\n");
    out.push_str(&format!("System: {}\n", spectra.system.key()));
    out.push_str(&format!("Init:   {}\n", init.key()));
    out.push_str(&format_ingest_line(spectra));

    out.push_str("\nFitted cells:\n");
    out.push_str(&format!(
        "{:<5} {:<10} {:>12} {:>20} {:>20} {:>10}\n",
        "part", "centr", "norm", "T [GeV]", "beta", "chi2/ndf"
    ));
    for fit in fits {
        let system = spectra.system;
        out.push_str(&format!(
            "{:<5} {:<10} {:>12.4} {:>12.4} ± {:<6.4} {:>12.4} ± {:<6.4} {:>9.2}\n",
            fit.species.label(),
            system.centrality_label(fit.centrality),
            fit.params.norm,
            fit.params.t,
            fit.errors.t,
            fit.params.beta,
            fit.errors.beta,
            fit.chi2_ndf(),
        ));
    }
    if !skipped.is_empty() {
        out.push('\n');
        for s in skipped {
            out.push_str(&format!(
                "  (skipped {} {}) {}\n",
                s.species.label(),
                spectra.system.centrality_label(s.centrality),
                s.reason
            ));
        }
    }
    out.push('\n');
    out
}

/// Format the joint-fit summary table.
pub fn format_joint_summary(spectra: &SpectraSet, fits: &[JointFit], notes: &[String]) -> String {
    let mut out = String::new();

    out.push_str("=== bw - Joint Blast-Wave Fits ===\n");
    out.push_str(&format!("System: {}\n", spectra.system.key()));
    out.push_str(&format_ingest_line(spectra));

    out.push_str("\nJoint fits:\n");
    out.push_str(&format!(
        "{:<10} {:<5} {:>20} {:>20} {:>10}  norms\n",
        "centr", "sel", "T [GeV]", "beta", "chi2/ndf"
    ));
    for fit in fits {
        let chi2_ndf = if fit.ndf > 0 {
            fit.chi2 / fit.ndf as f64
        } else {
            f64::NAN
        };
        let norms = fit
            .norms
            .iter()
            .map(|n| format!("{n:.3}"))
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!(
            "{:<10} {:<5} {:>12.4} ± {:<6.4} {:>12.4} ± {:<6.4} {:>9.2}  [{}]\n",
            spectra.system.centrality_label(fit.centrality),
            fit.charge.map(|c| c.key()).unwrap_or("all"),
            fit.t,
            fit.t_err,
            fit.beta,
            fit.beta_err,
            chi2_ndf,
            norms,
        ));
    }
    for note in notes {
        out.push_str(&format!("  (skipped) {note}\n"));
    }
    out.push('\n');
    out
}

/// Format the systematics summary, spreads relative to the reference fit.
pub fn format_syst_summary(
    spectra: &SpectraSet,
    entries: &[(CellFit, BwSystematics)],
    skipped: &[SkippedCell],
) -> String {
    let mut out = String::new();

    out.push_str("=== bw - Blast-Wave Systematics ===\n");
    out.push_str(&format!("System: {}\n", spectra.system.key()));
    out.push_str(&format_ingest_line(spectra));

    out.push_str("\nRelative systematic spreads:\n");
    out.push_str(&format!(
        "{:<5} {:<10} {:>10} {:>10} {:>10}\n",
        "part", "centr", "norm", "T", "beta"
    ));
    for (fit, syst) in entries {
        out.push_str(&format!(
            "{:<5} {:<10} {:>9.1}% {:>9.1}% {:>9.1}%\n",
            fit.species.label(),
            spectra.system.centrality_label(fit.centrality),
            syst.norm * 100.0,
            syst.t * 100.0,
            syst.beta * 100.0,
        ));
    }
    if !skipped.is_empty() {
        out.push('\n');
        for s in skipped {
            out.push_str(&format!(
                "  (skipped {} {}) {}\n",
                s.species.label(),
                spectra.system.centrality_label(s.centrality),
                s.reason
            ));
        }
    }
    out.push('\n');
    out
}

fn format_ingest_line(spectra: &SpectraSet) -> String {
    let mut line = format!(
        "Points: n={} | x=[{:.3}, {:.3}] GeV | files={}\n",
        spectra.stats.n_points, spectra.stats.x_min, spectra.stats.x_max, spectra.files_read
    );
    if !spectra.row_errors.is_empty() {
        line.push_str(&format!(
            "Rows dropped during ingest: {} (first: {}:{} {})\n",
            spectra.row_errors.len(),
            spectra.row_errors[0].file,
            spectra.row_errors[0].line,
            spectra.row_errors[0].message
        ));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BwErrors, BwParams, Charge, CollisionSystem, Species};
    use crate::io::spectra::load_spectra;
    use std::io::Write as _;

    fn spectra_fixture() -> SpectraSet {
        let dir = std::env::temp_dir().join("bw-report-test");
        std::fs::create_dir_all(&dir).unwrap();
        for species in Species::ALL {
            let path = dir.join(format!("pAl_{}.txt", species.key()));
            let mut f = std::fs::File::create(path).unwrap();
            writeln!(f, "0  0.5  12.0  0.3").unwrap();
            writeln!(f, "1  1.0  4.0  0.2").unwrap();
        }
        load_spectra(&dir, CollisionSystem::PAl).unwrap()
    }

    fn cell_fixture() -> CellFit {
        CellFit {
            species: Species::PiPlus,
            centrality: 0,
            params: BwParams {
                norm: 120.0,
                t: 0.112,
                beta: 0.66,
                mass: Species::PiPlus.mass(),
            },
            errors: BwErrors {
                norm: 4.0,
                t: 0.003,
                beta: 0.02,
            },
            chi2: 10.0,
            ndf: 8,
        }
    }

    #[test]
    fn fit_summary_lists_cells_and_skips() {
        let spectra = spectra_fixture();
        let skipped = vec![SkippedCell {
            species: Species::KMinus,
            centrality: 1,
            reason: "no seed entry in the parameter file".to_string(),
        }];
        let text = format_fit_summary(&spectra, InitScheme::Bounded, &[cell_fixture()], &skipped);

        assert!(text.contains("System: pAl"));
        assert!(text.contains("Init:   bounded"));
        assert!(text.contains("pi+"));
        assert!(text.contains("0.1120"));
        assert!(text.contains("skipped K-"));
    }

    #[test]
    fn joint_summary_shows_charge_selection_and_norms() {
        let spectra = spectra_fixture();
        let fit = JointFit {
            charge: Some(Charge::Positive),
            centrality: 2,
            t: 0.108,
            t_err: 0.002,
            beta: 0.7,
            beta_err: 0.01,
            species: Charge::Positive.species().to_vec(),
            norms: vec![100.0, 20.0, 50.0],
            chi2: 40.0,
            ndf: 25,
        };
        let text = format_joint_summary(&spectra, &[fit], &["centrality 3 (pos): thin".to_string()]);
        assert!(text.contains("pos"));
        assert!(text.contains("[100.000 20.000 50.000]"));
        assert!(text.contains("(skipped) centrality 3"));
    }

    #[test]
    fn syst_summary_prints_percent_spreads() {
        let spectra = spectra_fixture();
        let entries = vec![(
            cell_fixture(),
            BwSystematics {
                norm: 0.10,
                t: 0.034,
                beta: 0.012,
            },
        )];
        let text = format_syst_summary(&spectra, &entries, &[]);
        assert!(text.contains("10.0%"));
        assert!(text.contains("3.4%"));
        assert!(text.contains("1.2%"));
    }
}
