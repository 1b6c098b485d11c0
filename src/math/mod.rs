//! Numeric helpers: least-squares trend lines and box-plot statistics.

pub mod ols;
pub mod quantile;

pub use ols::*;
pub use quantile::*;
