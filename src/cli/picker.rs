//! Interactive CSV picker.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles flags and env vars
//! - the picker covers "run `llf` and choose the tables" when a path is missing
//!
//! The picker searches for `*.csv` files under the current working directory.

use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use crate::cli::TableArgs;
use crate::error::AppError;

/// Default directory recursion depth for finding CSV files.
const DEFAULT_SEARCH_DEPTH: usize = 4;

/// Resolved locations of the two source tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePaths {
    pub pricing: PathBuf,
    pub bands: PathBuf,
}

/// Validate the supplied table paths, prompting for any that are missing.
///
/// Prompting only happens on an interactive stdin; otherwise a missing path
/// is an error naming the flag and env var to set.
pub fn resolve_table_paths(args: &TableArgs) -> Result<TablePaths, AppError> {
    let interactive = io::stdin().is_terminal();
    let pricing = resolve_one(args.pricing.as_deref(), "pricing table", "--pricing", "LLF_PRICING_TABLE", interactive)?;
    let bands = resolve_one(args.bands.as_deref(), "band mapping table", "--bands", "LLF_BAND_TABLE", interactive)?;
    Ok(TablePaths { pricing, bands })
}

fn resolve_one(
    path: Option<&Path>,
    label: &str,
    flag: &str,
    env: &str,
    interactive: bool,
) -> Result<PathBuf, AppError> {
    if let Some(path) = path {
        return validate_csv_path(path);
    }
    if !interactive {
        return Err(AppError::new(
            2,
            format!("No {label} given. Pass `{flag} <file.csv>` or set {env}."),
        ));
    }
    let stdin = io::stdin();
    let stdout = io::stdout();
    prompt_for_csv_path(label, &discover_csv_files(), &mut stdin.lock(), &mut stdout.lock())
}

/// Prompt the user to select a CSV file for `label` from `files`.
///
/// Behavior:
/// - list discovered `*.csv` files
/// - accept either a number (from the list) or an explicit path
/// - `q` cancels
pub fn prompt_for_csv_path<R: BufRead, W: Write>(
    label: &str,
    files: &[PathBuf],
    input: &mut R,
    output: &mut W,
) -> Result<PathBuf, AppError> {
    let write_err = |e: io::Error| AppError::new(2, format!("Failed to write prompt: {e}"));

    if files.is_empty() {
        writeln!(output, "No .csv files found under the current directory.").map_err(write_err)?;
    } else {
        writeln!(output, "Found {} CSV file(s):", files.len()).map_err(write_err)?;
        for (idx, path) in files.iter().enumerate() {
            writeln!(output, "{:>3}) {}", idx + 1, pretty_path(path)).map_err(write_err)?;
        }
    }

    loop {
        if files.is_empty() {
            write!(output, "Path to the {label} CSV (q to quit): ").map_err(write_err)?;
        } else {
            write!(
                output,
                "Select the {label} by number (1-{}) or type a path (q to quit): ",
                files.len()
            )
            .map_err(write_err)?;
        }
        output.flush().map_err(write_err)?;

        let mut line = String::new();
        let bytes = input
            .read_line(&mut line)
            .map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;

        if bytes == 0 {
            return Err(AppError::new(2, format!("No input received for the {label}.")));
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            return Err(AppError::new(2, "Canceled."));
        }

        if let Ok(choice) = line.parse::<usize>() {
            if (1..=files.len()).contains(&choice) {
                return validate_csv_path(&files[choice - 1]);
            }
            writeln!(output, "Invalid choice: {choice}.").map_err(write_err)?;
            continue;
        }

        match validate_csv_path(Path::new(line)) {
            Ok(path) => return Ok(path),
            Err(err) => {
                writeln!(output, "{err}").map_err(write_err)?;
                continue;
            }
        }
    }
}

/// Validate the provided path points to a `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::new(
            2,
            format!("CSV file not found: {}", path.display()),
        ));
    }
    if path.is_dir() {
        return Err(AppError::new(
            2,
            format!("Expected a file, got a directory: {}", path.display()),
        ));
    }
    if path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        != Some(true)
    {
        return Err(AppError::new(
            2,
            format!(
                "Expected a .csv file (got: {}). Export the sheet to CSV first.",
                path.display()
            ),
        ));
    }

    Ok(path.to_path_buf())
}

/// Discover `*.csv` files under the current directory (deterministic order).
pub fn discover_csv_files() -> Vec<PathBuf> {
    find_csv_files(Path::new("."), DEFAULT_SEARCH_DEPTH)
}

fn find_csv_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut out = Vec::new();
    find_csv_files_inner(root, 0, max_depth, &mut out);
    out.sort_by_key(|p| pretty_path(p));
    out
}

fn find_csv_files_inner(root: &Path, depth: usize, max_depth: usize, out: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }

    let Ok(entries) = fs::read_dir(root) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            if !should_skip_dir(&path) {
                find_csv_files_inner(&path, depth + 1, max_depth, out);
            }
            continue;
        }

        if file_type.is_file() && has_csv_extension(&path) {
            out.push(path);
        }
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn should_skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    matches!(name, ".git" | "target" | "node_modules")
}

fn pretty_path(path: &Path) -> String {
    let stripped = path.strip_prefix("./").unwrap_or(path);
    stripped.display().to_string()
}
