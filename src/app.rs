//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - installs logging
//! - loads the dataset (once)
//! - dispatches to the TUI or prints a view
//! - writes optional exports

use std::fs::File;
use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, ShowArgs, TuiArgs};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `fp` binary.
pub fn run() -> Result<(), AppError> {
    // We want `fp` and `fp --file x.csv` to behave like `fp tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Show(args) => handle_show(args),
        Command::Views => {
            print!("{}", crate::report::format_view_list());
            Ok(())
        }
    }
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    init_stderr_logging();

    let cache = pipeline::open_dataset(&args.source)?;
    let view = pipeline::render_request(&cache, &args)?;

    eprintln!(
        "{}",
        crate::report::format_load_summary(&cache.describe_source(), cache.summary()?)
    );
    println!("{}", crate::report::format_view(&view));

    if let Some(path) = &args.export {
        crate::io::export::write_view_json(path, &view)?;
    }

    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    if let Some(path) = &args.log_file {
        init_file_logging(path)?;
    }

    let cache = pipeline::open_dataset(&args.source)?;
    // Load before taking over the terminal so a failed fetch prints normally.
    cache.get()?;
    crate::tui::run(cache)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}

fn init_file_logging(path: &Path) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create log file '{}': {e}", path.display())))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .try_init();
    Ok(())
}

/// Rewrite argv so `fp` defaults to `fp tui`.
///
/// Rules:
/// - `fp`                      -> `fp tui`
/// - `fp --file x.csv ...`     -> `fp tui --file x.csv ...`
/// - `fp --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "show" | "views");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_launches_tui() {
        assert_eq!(rewrite_args(argv(&["fp"])), argv(&["fp", "tui"]));
    }

    #[test]
    fn leading_flags_go_to_tui() {
        assert_eq!(
            rewrite_args(argv(&["fp", "--file", "x.csv"])),
            argv(&["fp", "tui", "--file", "x.csv"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        for args in [
            argv(&["fp", "show", "volatility"]),
            argv(&["fp", "views"]),
            argv(&["fp", "--help"]),
            argv(&["fp", "-V"]),
        ] {
            assert_eq!(rewrite_args(args.clone()), args);
        }
    }
}
