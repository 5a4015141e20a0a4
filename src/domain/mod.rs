//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - particle/system enums and the physics catalog (masses, windows, seeds)
//! - spectrum points and blast-wave parameter sets
//! - fit outputs (`CellFit`, `JointFit`, systematic spreads)
//! - run configuration structs derived from CLI flags

pub mod catalog;
pub mod types;

pub use types::*;
