//! Reporting utilities: formatted terminal output.
//!
//! We keep formatting code in one place so the aggregation code stays clean
//! and output changes are localized.

pub mod format;

pub use format::{format_load_summary, format_view, format_view_list};
