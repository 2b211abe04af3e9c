//! Command-line parsing for the pricing lookup tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the lookup code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{parse_green_flag, parse_whole_number, NetworkId};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "llf", version, about = "Electricity pricing lookup by DNO and LLF code")]
pub struct Cli {
    #[command(flatten)]
    pub tables: TableArgs,

    /// Append logs to this file instead of stderr.
    #[arg(long, env = "LLF_LOG_FILE", global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Where the two source tables live.
///
/// Missing paths are asked for interactively (see `picker`).
#[derive(Debug, Args, Clone, Default)]
pub struct TableArgs {
    /// Pricing table CSV (offers per DNO, band, duration, green flag, consumption range).
    #[arg(long, env = "LLF_PRICING_TABLE", global = true, value_name = "CSV")]
    pub pricing: Option<PathBuf>,

    /// Band mapping CSV (DNO, LLF code, band).
    #[arg(long, env = "LLF_BAND_TABLE", global = true, value_name = "CSV")]
    pub bands: Option<PathBuf>,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive form (default).
    Tui,
    /// Evaluate one query, print the matches, and optionally export them.
    Query(QueryArgs),
    /// List the selectable DNO ids and contract durations.
    Options,
    /// List band mapping rows and pairs mapped more than once.
    Bands(BandsArgs),
}

/// Options for a one-shot query.
#[derive(Debug, Args, Clone)]
pub struct QueryArgs {
    /// DNO id.
    #[arg(long)]
    pub dno: NetworkId,

    /// LLF code (e.g. 199, N10, X20).
    #[arg(long)]
    pub llf: Option<String>,

    /// Annual consumption in kWh.
    #[arg(long, value_parser = parse_consumption)]
    pub consumption: f64,

    /// Contract duration in months.
    #[arg(long, value_parser = parse_duration)]
    pub duration: u32,

    /// Green energy preference (True or False).
    #[arg(long, action = clap::ArgAction::Set, value_parser = parse_green_arg, default_value = "False")]
    pub green: bool,

    /// Write the matching rows to this CSV file.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Print the evaluation as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Options for listing band mappings.
#[derive(Debug, Args, Clone)]
pub struct BandsArgs {
    /// Only show rows for this DNO id.
    #[arg(long)]
    pub dno: Option<NetworkId>,
}

/// Annual consumption must be a finite, non-negative number.
pub fn parse_consumption(s: &str) -> Result<f64, String> {
    let v: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a number"))?;
    if !v.is_finite() || v < 0.0 {
        return Err(format!("'{s}' must be a non-negative number"));
    }
    Ok(v)
}

fn parse_duration(s: &str) -> Result<u32, String> {
    parse_whole_number(s).ok_or_else(|| format!("'{s}' is not a whole number of months"))
}

fn parse_green_arg(s: &str) -> Result<bool, String> {
    parse_green_flag(s).ok_or_else(|| format!("'{s}' must be True or False"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn query_args_parse() {
        let cli = Cli::try_parse_from([
            "llf",
            "query",
            "--dno",
            "10",
            "--llf",
            "199",
            "--consumption",
            "3000",
            "--duration",
            "12",
            "--green",
            "true",
            "--pricing",
            "p.csv",
        ])
        .unwrap();

        let Command::Query(args) = cli.command else {
            panic!("expected query");
        };
        assert_eq!(args.dno, NetworkId::new(10));
        assert_eq!(args.llf.as_deref(), Some("199"));
        assert_eq!(args.consumption, 3000.0);
        assert_eq!(args.duration, 12);
        assert!(args.green);
        assert_eq!(cli.tables.pricing, Some(PathBuf::from("p.csv")));
    }

    #[test]
    fn green_defaults_to_false() {
        let cli = Cli::try_parse_from([
            "llf", "query", "--dno", "10", "--consumption", "0", "--duration", "12",
        ])
        .unwrap();
        let Command::Query(args) = cli.command else {
            panic!("expected query");
        };
        assert!(!args.green);
        assert!(args.llf.is_none());
    }

    #[test]
    fn negative_consumption_is_rejected() {
        assert!(parse_consumption("-1").is_err());
        assert!(parse_consumption("NaN").is_err());
        assert_eq!(parse_consumption("0"), Ok(0.0));
        assert_eq!(parse_consumption("2500.5"), Ok(2500.5));
    }
}
