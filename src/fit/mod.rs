//! Blast-wave fitting.
//!
//! Responsibilities:
//!
//! - χ² objectives in bounded coordinates (single cell and joint)
//! - per-cell fits under the four init schemes (parallel over cells)
//! - joint (T, β) fits across species
//! - (T, β) confidence contours at the standard Δχ² levels
//! - systematic spreads from fit-setup variations

pub mod contour;
pub mod global;
pub mod objective;
pub mod single;
pub mod systematics;

pub use contour::*;
pub use global::*;
pub use objective::*;
pub use single::*;
pub use systematics::*;
