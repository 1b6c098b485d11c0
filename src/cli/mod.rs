//! Command-line parsing for the food price dashboard.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! loading/aggregation code. Everything here turns into a `LoadConfig` plus a
//! `ViewRequest` before any work happens.

use std::path::PathBuf;

use clap::builder::TypedValueParser;
use clap::{Args, Parser, Subcommand};

use crate::domain::TopN;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fp", version, about = "Food price analysis dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard (default).
    Tui(TuiArgs),
    /// Render one view to the terminal as tables.
    Show(ShowArgs),
    /// List the available views.
    Views,
}

/// Where to load the dataset from.
#[derive(Debug, Args, Clone, Default)]
pub struct SourceArgs {
    /// Dataset URL (overrides FOOD_PRICES_URL).
    #[arg(long, value_name = "URL", conflicts_with = "file")]
    pub url: Option<String>,

    /// Read the dataset from a local CSV instead of fetching it.
    #[arg(short = 'f', long, value_name = "CSV")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Args, Clone, Default)]
pub struct TuiArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Write logs to this file (the dashboard itself owns the terminal).
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// View slug or title (see `fp views`).
    pub view: String,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Commodity for the price-over-time view (default: first in the dataset).
    #[arg(short = 'c', long)]
    pub commodity: Option<String>,

    /// Commodities for the distribution view (default: first five in the dataset).
    #[arg(long, value_delimiter = ',')]
    pub commodities: Vec<String>,

    /// How many commodities to rank on each side of the top/bottom view.
    #[arg(
        short = 'n',
        long,
        default_value_t = TopN::DEFAULT,
        value_parser = clap::value_parser!(u16).range(TopN::MIN as i64..=TopN::MAX as i64).map(usize::from)
    )]
    pub top: usize,

    /// Export the rendered view (tables + chart data) to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,
}
