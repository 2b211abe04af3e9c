//! CSV ingest and normalization.
//!
//! This module turns the two source CSVs into typed, immutable tables.
//!
//! Design goals:
//! - **Strict schema** for the columns the lookup uses (clear errors + exit code 2)
//! - **Row-level validation** (skip rows that cannot be coerced, but report them)
//! - **Pass-through** of every other pricing column, byte for byte

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{info, warn};

use crate::domain::{
    parse_green_flag, parse_whole_number, BandMapping, BandTable, NetworkId, PricingRecord, PricingTable,
    RowError, Tables,
};
use crate::error::AppError;

/// Pricing table column names (matched case-insensitively).
pub mod pricing_columns {
    pub const NETWORK_ID: &str = "DNO_ID";
    pub const LOSS_FACTOR_BAND: &str = "LLF_Band";
    pub const CONTRACT_DURATION: &str = "Contract_Duration";
    pub const GREEN_ENERGY: &str = "Green_Energy";
    pub const MIN_CONSUMPTION: &str = "Minimum_Annual_Consumption";
    pub const MAX_CONSUMPTION: &str = "Maximum_Annual_Consumption";
}

/// Band mapping table column names (matched case-insensitively).
pub mod band_columns {
    pub const NETWORK_ID: &str = "DNO";
    pub const LOSS_FACTOR_CODE: &str = "LLF";
    pub const BAND: &str = "Band";
}

/// Load both source tables and report mapping ambiguities.
pub fn load_tables(pricing_path: &Path, bands_path: &Path) -> Result<Tables, AppError> {
    let pricing = load_pricing_table(pricing_path)?;
    let bands = load_band_table(bands_path)?;

    for dup in bands.duplicates() {
        warn!(
            dno = %dup.network_id,
            llf = %dup.loss_factor_code,
            bands = ?dup.bands,
            "LLF code mapped more than once; the first row wins"
        );
    }

    Ok(Tables { pricing, bands })
}

pub fn load_pricing_table(path: &Path) -> Result<PricingTable, AppError> {
    let file = open(path, "pricing")?;
    let table = read_pricing_table(file).map_err(|e| with_path(e, path))?;
    info!(
        path = %path.display(),
        rows_read = table.rows_read,
        rows_used = table.records.len(),
        rows_skipped = table.row_errors.len(),
        "loaded pricing table"
    );
    log_row_errors("pricing", &table.row_errors);
    Ok(table)
}

pub fn load_band_table(path: &Path) -> Result<BandTable, AppError> {
    let file = open(path, "band mapping")?;
    let table = read_band_table(file).map_err(|e| with_path(e, path))?;
    info!(
        path = %path.display(),
        rows_read = table.rows_read,
        rows_used = table.mappings.len(),
        rows_skipped = table.row_errors.len(),
        "loaded band mapping table"
    );
    log_row_errors("band mapping", &table.row_errors);
    Ok(table)
}

/// Parse a pricing table from any CSV source.
pub fn read_pricing_table<R: Read>(source: R) -> Result<PricingTable, AppError> {
    use pricing_columns as col;

    // No trimming here: non-key cells are passed through untouched.
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(source);

    let raw_headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let headers: Vec<String> = raw_headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let header_map = build_header_map(&raw_headers);

    let idx = PricingColumns {
        network_id: require_column(&header_map, col::NETWORK_ID)?,
        band: require_column(&header_map, col::LOSS_FACTOR_BAND)?,
        duration: require_column(&header_map, col::CONTRACT_DURATION)?,
        green: require_column(&header_map, col::GREEN_ENERGY)?,
        min: require_column(&header_map, col::MIN_CONSUMPTION)?,
        max: require_column(&header_map, col::MAX_CONSUMPTION)?,
    };

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (i, result) in reader.records().enumerate() {
        // records() starts on line 2, after the header.
        let line = i + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_pricing_row(&record, &idx, headers.len()) {
            Ok(r) => records.push(r),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if records.is_empty() {
        return Err(AppError::new(2, "No usable rows in the pricing table."));
    }

    Ok(PricingTable {
        headers,
        records,
        row_errors,
        rows_read,
    })
}

/// Parse a band mapping table from any CSV source.
pub fn read_band_table<R: Read>(source: R) -> Result<BandTable, AppError> {
    use band_columns as col;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let dno_idx = require_column(&header_map, col::NETWORK_ID)?;
    let code_idx = require_column(&header_map, col::LOSS_FACTOR_CODE)?;
    let band_idx = require_column(&header_map, col::BAND)?;

    let mut mappings = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (i, result) in reader.records().enumerate() {
        let line = i + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let parsed = parse_band_row(&record, dno_idx, code_idx, band_idx);

        match parsed {
            Ok(m) => mappings.push(m),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if mappings.is_empty() {
        return Err(AppError::new(2, "No usable rows in the band mapping table."));
    }

    Ok(BandTable {
        mappings,
        row_errors,
        rows_read,
    })
}

struct PricingColumns {
    network_id: usize,
    band: usize,
    duration: usize,
    green: usize,
    min: usize,
    max: usize,
}

fn parse_pricing_row(record: &StringRecord, idx: &PricingColumns, width: usize) -> Result<PricingRecord, String> {
    use pricing_columns as col;

    if record.len() > width {
        return Err(format!(
            "Row has {} cells but the header has {width} columns.",
            record.len()
        ));
    }

    let network_id = get_required(record, idx.network_id, col::NETWORK_ID)?.parse::<NetworkId>()?;
    let loss_factor_band = get_required(record, idx.band, col::LOSS_FACTOR_BAND)?.to_string();

    let duration_raw = get_required(record, idx.duration, col::CONTRACT_DURATION)?;
    let contract_duration_months = parse_whole_number(duration_raw)
        .ok_or_else(|| format!("Invalid `{}` value '{duration_raw}'.", col::CONTRACT_DURATION))?;

    let green_raw = get_required(record, idx.green, col::GREEN_ENERGY)?;
    let green_energy = parse_green_flag(green_raw)
        .ok_or_else(|| format!("Invalid `{}` value '{green_raw}' (expected True/False).", col::GREEN_ENERGY))?;

    let min_annual_consumption = parse_f64(get_required(record, idx.min, col::MIN_CONSUMPTION)?, col::MIN_CONSUMPTION)?;
    let max_annual_consumption = parse_f64(get_required(record, idx.max, col::MAX_CONSUMPTION)?, col::MAX_CONSUMPTION)?;

    // Short rows are padded so every record lines up with the header on export.
    let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
    fields.resize(width, String::new());

    Ok(PricingRecord {
        network_id,
        loss_factor_band,
        contract_duration_months,
        green_energy,
        min_annual_consumption,
        max_annual_consumption,
        fields,
    })
}

fn parse_band_row(record: &StringRecord, dno_idx: usize, code_idx: usize, band_idx: usize) -> Result<BandMapping, String> {
    use band_columns as col;

    let network_id = get_required(record, dno_idx, col::NETWORK_ID)?.parse::<NetworkId>()?;
    let loss_factor_code = get_required(record, code_idx, col::LOSS_FACTOR_CODE)?.to_string();
    let band = get_required(record, band_idx, col::BAND)?.to_string();

    Ok(BandMapping {
        network_id,
        loss_factor_code,
        band,
    })
}

fn open(path: &Path, label: &str) -> Result<File, AppError> {
    File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open {label} CSV '{}': {e}", path.display()),
        )
    })
}

fn with_path(err: AppError, path: &Path) -> AppError {
    AppError::new(err.exit_code(), format!("{}: {err}", path.display()))
}

fn log_row_errors(table: &str, errors: &[RowError]) {
    for e in errors {
        warn!(table, line = e.line, "skipped row: {}", e.message);
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Excel writes UTF-8 CSVs with a BOM on the first header.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn require_column(header_map: &HashMap<String, usize>, name: &str) -> Result<usize, AppError> {
    header_map
        .get(&name.to_ascii_lowercase())
        .copied()
        .ok_or_else(|| AppError::new(2, format!("Missing required column: `{name}`")))
}

fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_f64(s: &str, name: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("Invalid `{name}` value '{s}'.")),
    }
}
