//! Spectra ingest and normalization.
//!
//! Input is one whitespace-delimited text file per (system, species):
//! `<dir>/<system>_<species>.txt`, with one measured point per line:
//!
//! ```text
//! centr  pt  yield  stat_err
//! ```
//!
//! `centr` is the centrality class index, `pt` the transverse momentum in
//! GeV/c. Lines starting with `#` are comments. pT is converted to the fit
//! abscissa `x = sqrt(pt² + m²) − m` on load.
//!
//! Design goals:
//! - row-level validation: skip bad rows, but report what happened
//! - a cell with no valid rows is skipped later, never fatal
//! - no fitting logic here

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{CollisionSystem, Species, SpectrumPoint};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub file: String,
    pub line: usize,
    pub message: String,
}

/// Summary stats about the points actually kept for fitting.
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub n_points: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Default for DatasetStats {
    fn default() -> Self {
        Self {
            n_points: 0,
            x_min: f64::INFINITY,
            x_max: f64::NEG_INFINITY,
            y_min: f64::INFINITY,
            y_max: f64::NEG_INFINITY,
        }
    }
}

impl DatasetStats {
    fn observe(&mut self, p: &SpectrumPoint) {
        self.n_points += 1;
        self.x_min = self.x_min.min(p.x);
        self.x_max = self.x_max.max(p.x);
        self.y_min = self.y_min.min(p.y);
        self.y_max = self.y_max.max(p.y);
    }
}

/// Ingest output: per-cell points + stats + row errors.
#[derive(Debug, Clone)]
pub struct SpectraSet {
    pub system: CollisionSystem,
    /// Indexed `[species][centrality]`, points sorted by x.
    cells: Vec<Vec<Vec<SpectrumPoint>>>,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub files_read: usize,
}

impl SpectraSet {
    pub fn points(&self, species: Species, centrality: usize) -> &[SpectrumPoint] {
        &self.cells[species.index()][centrality]
    }

    pub fn has_data(&self, species: Species, centrality: usize) -> bool {
        !self.points(species, centrality).is_empty()
    }

    /// Points inside a window, for windowed fits.
    pub fn points_in_window(
        &self,
        species: Species,
        centrality: usize,
        x_lo: f64,
        x_hi: f64,
    ) -> Vec<SpectrumPoint> {
        self.points(species, centrality)
            .iter()
            .filter(|p| p.x >= x_lo && p.x <= x_hi)
            .copied()
            .collect()
    }
}

/// Canonical spectra file path for one (system, species).
pub fn spectra_path(dir: &Path, system: CollisionSystem, species: Species) -> PathBuf {
    dir.join(format!("{}_{}.txt", system.key(), species.key()))
}

/// Load all species files of a system.
///
/// A missing file is a hard input error; an empty dataset after validation
/// is a no-data error.
pub fn load_spectra(dir: &Path, system: CollisionSystem) -> Result<SpectraSet, AppError> {
    let n_centr = system.n_centralities();
    let mut set = SpectraSet {
        system,
        cells: vec![vec![Vec::new(); n_centr]; Species::ALL.len()],
        stats: DatasetStats::default(),
        row_errors: Vec::new(),
        files_read: 0,
    };

    for species in Species::ALL {
        let path = spectra_path(dir, system, species);
        let text = fs::read_to_string(&path).map_err(|e| {
            AppError::input(format!("Failed to read spectra '{}': {e}", path.display()))
        })?;
        parse_species_file(
            &text,
            &path.display().to_string(),
            species,
            n_centr,
            &mut set,
        );
        set.files_read += 1;
    }

    for species_cells in &mut set.cells {
        for cell in species_cells.iter_mut() {
            cell.sort_by(|a, b| a.x.total_cmp(&b.x));
        }
    }

    if set.stats.n_points == 0 {
        return Err(AppError::no_data(format!(
            "No valid spectrum points for {} under '{}'",
            system.key(),
            dir.display()
        )));
    }
    Ok(set)
}

fn parse_species_file(
    text: &str,
    file_label: &str,
    species: Species,
    n_centr: usize,
    set: &mut SpectraSet,
) {
    let mass = species.mass();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut err = |message: String| {
            set.row_errors.push(RowError {
                file: file_label.to_string(),
                line: line_no,
                message,
            });
        };

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 4 {
            err(format!("expected 4 fields, got {}", fields.len()));
            continue;
        }

        let centr = match fields[0].parse::<usize>() {
            Ok(c) => c,
            Err(_) => {
                err(format!("bad centrality index '{}'", fields[0]));
                continue;
            }
        };
        if centr >= n_centr {
            err(format!(
                "centrality {centr} out of range (system has {n_centr} classes)"
            ));
            continue;
        }

        let values: Option<Vec<f64>> = fields[1..].iter().map(|f| f.parse().ok()).collect();
        let Some(values) = values else {
            err("non-numeric value".to_string());
            continue;
        };
        let (pt, y, y_err) = (values[0], values[1], values[2]);

        if !(pt > 0.0 && pt.is_finite()) {
            err(format!("non-positive pt {pt}"));
            continue;
        }
        if !(y > 0.0 && y.is_finite()) {
            err(format!("non-positive yield {y}"));
            continue;
        }
        if !(y_err > 0.0 && y_err.is_finite()) {
            err(format!("non-positive error {y_err}"));
            continue;
        }

        let x = (pt * pt + mass * mass).sqrt() - mass;
        let point = SpectrumPoint { x, y, y_err };
        set.stats.observe(&point);
        set.cells[species.index()][centr].push(point);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_set(system: CollisionSystem) -> SpectraSet {
        SpectraSet {
            system,
            cells: vec![vec![Vec::new(); system.n_centralities()]; Species::ALL.len()],
            stats: DatasetStats::default(),
            row_errors: Vec::new(),
            files_read: 0,
        }
    }

    #[test]
    fn parses_valid_rows_and_converts_to_mt_minus_m() {
        let mut set = empty_set(CollisionSystem::PAl);
        let text = "# comment\n0  0.5  12.0  0.3\n1  1.0  4.0  0.2\n";
        parse_species_file(text, "test", Species::PiPlus, 4, &mut set);

        assert!(set.row_errors.is_empty());
        assert_eq!(set.cells[0][0].len(), 1);
        assert_eq!(set.cells[0][1].len(), 1);

        let m = Species::PiPlus.mass();
        let expect = (0.25 + m * m).sqrt() - m;
        assert!((set.cells[0][0][0].x - expect).abs() < 1e-12);
    }

    #[test]
    fn bad_rows_are_collected_not_fatal() {
        let mut set = empty_set(CollisionSystem::PAl);
        let text = "\
0  0.5  12.0  0.3
9  0.5  12.0  0.3
0  0.5  12.0
0  abc  12.0  0.3
0  0.5  -1.0  0.3
0  0.5  12.0  0.0
";
        parse_species_file(text, "test", Species::KPlus, 4, &mut set);
        assert_eq!(set.cells[2][0].len(), 1);
        assert_eq!(set.row_errors.len(), 5);
        assert!(set.row_errors[0].message.contains("out of range"));
    }

    #[test]
    fn stats_track_kept_points_only() {
        let mut set = empty_set(CollisionSystem::UU);
        let text = "0  0.5  10.0  0.5\n0  1.5  1.0  0.1\n0  0.1  -3.0  0.1\n";
        parse_species_file(text, "test", Species::Proton, 4, &mut set);
        assert_eq!(set.stats.n_points, 2);
        assert!((set.stats.y_max - 10.0).abs() < 1e-12);
        assert!((set.stats.y_min - 1.0).abs() < 1e-12);
    }

    #[test]
    fn window_selection_is_inclusive() {
        let mut set = empty_set(CollisionSystem::PAl);
        let m = Species::PiPlus.mass();
        // choose pt so that x lands exactly on handy values is fiddly; just
        // check the filter against the loaded x values.
        let text = "0  0.3  30.0  1.0\n0  0.8  10.0  0.5\n0  2.0  0.5  0.05\n";
        parse_species_file(text, "test", Species::PiPlus, 4, &mut set);
        let all = set.points(Species::PiPlus, 0);
        assert_eq!(all.len(), 3);
        let mid_x = (0.64 + m * m).sqrt() - m;
        let selected = set.points_in_window(Species::PiPlus, 0, mid_x - 1e-9, mid_x + 1e-9);
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn spectra_path_follows_the_naming_scheme() {
        let p = spectra_path(Path::new("input"), CollisionSystem::HeAu, Species::AntiProton);
        assert_eq!(p, PathBuf::from("input/HeAu_ap.txt"));
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = load_spectra(Path::new("/nonexistent-dir"), CollisionSystem::PAl).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
