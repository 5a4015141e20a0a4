//! Input/output helpers.
//!
//! - spectra text ingest + validation (`spectra`)
//! - flat parameter files (`params`)
//! - run summary JSON read/write (`summary`)

pub mod params;
pub mod spectra;
pub mod summary;

pub use params::*;
pub use spectra::*;
pub use summary::*;
