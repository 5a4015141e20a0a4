//! Mathematical utilities: Bessel functions, box-constraint transforms and
//! χ² covariance estimation.

pub mod bessel;
pub mod bounds;
pub mod covariance;

pub use bessel::*;
pub use bounds::*;
pub use covariance::*;
