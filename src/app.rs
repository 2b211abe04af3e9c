//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - loads both source tables once
//! - dispatches to the TUI or a one-shot command

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;

use crate::cli::picker::resolve_table_paths;
use crate::cli::{BandsArgs, Command, QueryArgs};
use crate::domain::{PricingQuery, Tables, EXPORT_FILE_NAME};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `llf` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // `llf` and `llf --pricing a.csv --bands b.csv` open the form directly.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    // Log lines on stderr would tear through the alternate screen.
    let default_level = match (&cli.command, &cli.log_file) {
        (Command::Tui, None) => "off",
        (Command::Tui, Some(_)) => "info",
        _ => "warn",
    };
    crate::logging::init_tracing(cli.log_file.as_deref(), default_level)?;

    let paths = resolve_table_paths(&cli.tables)?;
    let tables = crate::io::ingest::load_tables(&paths.pricing, &paths.bands)?;

    match cli.command {
        Command::Tui => crate::tui::run(&tables, PathBuf::from(EXPORT_FILE_NAME)),
        Command::Query(args) => handle_query(&tables, &args, &mut io::stdout().lock()),
        Command::Options => write_out(&mut io::stdout().lock(), &crate::report::format_options(&tables)),
        Command::Bands(args) => handle_bands(&tables, &args, &mut io::stdout().lock()),
    }
}

/// Evaluate one query and print (and optionally export) the result.
///
/// Lookup failures come back as `AppError`s with their exit codes. An empty
/// result prints a notice, skips the export, and still succeeds.
pub fn handle_query<W: Write>(tables: &Tables, args: &QueryArgs, out: &mut W) -> Result<(), AppError> {
    let query = PricingQuery {
        network_id: args.dno,
        loss_factor_code: args.llf.clone().unwrap_or_default(),
        annual_consumption: args.consumption,
        contract_duration_months: args.duration,
        green_energy: args.green,
    };

    let evaluation = pipeline::evaluate(tables, &query)?;
    let headers = &tables.pricing.headers;

    if args.json {
        crate::io::export::write_evaluation_json(&mut *out, &evaluation, headers)?;
        write_out(out, "\n")?;
    } else {
        write_out(out, &crate::report::format_evaluation(&evaluation, headers))?;
    }

    if let Some(path) = &args.export {
        if evaluation.is_empty() {
            // Keep stdout clean for --json consumers.
            eprintln!("Nothing to export.");
        } else {
            crate::io::export::write_results_csv(path, headers, &evaluation.matches)?;
            eprintln!("Exported {} row(s) to {}", evaluation.len(), path.display());
        }
    }

    Ok(())
}

fn handle_bands<W: Write>(tables: &Tables, args: &BandsArgs, out: &mut W) -> Result<(), AppError> {
    write_out(out, &crate::report::format_band_rows(tables, args.dno))
}

fn write_out<W: Write>(out: &mut W, text: &str) -> Result<(), AppError> {
    out.write_all(text.as_bytes())
        .map_err(|e| AppError::new(4, format!("Failed to write output: {e}")))
}

/// Rewrite argv so `llf` defaults to `llf tui`.
///
/// Rules:
/// - `llf`                         -> `llf tui`
/// - `llf --pricing p.csv ...`     -> `llf tui --pricing p.csv ...`
/// - `llf --help/--version/-h`     -> unchanged (show top-level help/version)
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

    let is_subcommand = matches!(arg1.as_str(), "tui" | "query" | "options" | "bands");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        // Global flags are accepted after the subcommand too.
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
