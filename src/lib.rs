//! `food-prices` library crate.
//!
//! The binary (`fp`) is a thin wrapper around this library so that:
//!
//! - loading and aggregation are testable without spawning processes
//! - the CLI and the TUI share one view selector
//! - code stays easy to navigate as the project grows

pub mod aggregate;
pub mod app;
pub mod chart;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod report;
pub mod tui;
pub mod view;
