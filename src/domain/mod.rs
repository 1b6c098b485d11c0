//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the loaded price table (`PriceRecord`, `PriceTable`)
//! - typed columns and derived tables (`Field`, `Cell`, `Tabular`, `DerivedTable`)
//! - the view menu and its parameters (`ViewKind`, `ViewRequest`, `TopN`)

pub mod table;
pub mod types;

pub use table::*;
pub use types::*;
