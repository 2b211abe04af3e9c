//! Export matched pricing rows.
//!
//! The CSV export is what the user downloads: the pricing table's header row
//! followed by the raw cells of each matching record, in source column order.
//! The JSON form is meant for scripting.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::app::pipeline::Evaluation;
use crate::domain::{PricingQuery, PricingRecord};
use crate::error::AppError;

/// Serialize `records` as a UTF-8 CSV document, header included.
pub fn results_to_csv(headers: &[String], records: &[&PricingRecord]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    write_rows(&mut writer, headers, records)?;
    writer
        .into_inner()
        .map_err(|e| AppError::new(4, format!("Failed to finish export CSV: {e}")))
}

/// Write `records` to a CSV file at `path`.
pub fn write_results_csv(path: &Path, headers: &[String], records: &[&PricingRecord]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    let mut writer = csv::Writer::from_writer(file);
    write_rows(&mut writer, headers, records)?;
    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to write export CSV '{}': {e}", path.display())))?;

    info!(path = %path.display(), rows = records.len(), "exported results");
    Ok(())
}

fn write_rows<W: Write>(
    writer: &mut csv::Writer<W>,
    headers: &[String],
    records: &[&PricingRecord],
) -> Result<(), AppError> {
    writer
        .write_record(headers)
        .map_err(|e| AppError::new(4, format!("Failed to write export CSV header: {e}")))?;
    for r in records {
        writer
            .write_record(&r.fields)
            .map_err(|e| AppError::new(4, format!("Failed to write export CSV row: {e}")))?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct EvaluationJson<'a> {
    query: &'a PricingQuery,
    band: &'a str,
    count: usize,
    records: Vec<Map<String, Value>>,
}

/// Write an evaluation as pretty JSON; each record is keyed by header name.
pub fn write_evaluation_json<W: Write>(
    writer: W,
    evaluation: &Evaluation<'_>,
    headers: &[String],
) -> Result<(), AppError> {
    let records = evaluation
        .matches
        .iter()
        .map(|r| {
            headers
                .iter()
                .cloned()
                .zip(r.fields.iter().map(|v| Value::String(v.clone())))
                .collect::<Map<String, Value>>()
        })
        .collect();

    let doc = EvaluationJson {
        query: &evaluation.query,
        band: &evaluation.band,
        count: evaluation.len(),
        records,
    };

    serde_json::to_writer_pretty(writer, &doc)
        .map_err(|e| AppError::new(4, format!("Failed to write results JSON: {e}")))
}
