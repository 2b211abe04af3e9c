//! Formatted terminal output.
//!
//! We keep formatting code in one place so output changes are localized.

use crate::app::pipeline::Evaluation;
use crate::domain::{green_label, BandMapping, NetworkId, PricingRecord, Tables};

/// Widest a single column is allowed to render in the plain-text table.
const MAX_COLUMN_WIDTH: usize = 28;

/// Format a full evaluation: mapped band, match count, then the table.
pub fn format_evaluation(evaluation: &Evaluation<'_>, headers: &[String]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Mapped LLF band: {}\n", evaluation.band));

    if evaluation.is_empty() {
        out.push_str("No matching pricing records found.\n");
        return out;
    }

    out.push_str(&format!("Found {} matching record(s).\n\n", evaluation.len()));
    out.push_str(&format_records_table(headers, &evaluation.matches));
    out
}

/// Format records as an aligned plain-text table.
pub fn format_records_table(headers: &[String], records: &[&PricingRecord]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for r in records {
        for (w, cell) in widths.iter_mut().zip(&r.fields) {
            *w = (*w).max(display_width(cell.trim()));
        }
    }
    for w in &mut widths {
        *w = (*w).min(MAX_COLUMN_WIDTH);
    }

    let mut out = String::new();
    push_row(&mut out, headers.iter().map(String::as_str), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, rule.iter().map(String::as_str), &widths);
    for r in records {
        push_row(&mut out, r.fields.iter().map(|c| c.trim()), &widths);
    }
    out
}

/// Format the selectable DNO ids and contract durations.
pub fn format_options(tables: &Tables) -> String {
    let dnos: Vec<String> = tables.pricing.network_ids().iter().map(NetworkId::to_string).collect();
    let durations: Vec<String> = tables
        .pricing
        .contract_durations()
        .iter()
        .map(u32::to_string)
        .collect();

    let mut out = String::new();
    out.push_str(&format!("DNO IDs: {}\n", dnos.join(", ")));
    out.push_str(&format!("Contract durations (months): {}\n", durations.join(", ")));
    out.push_str(&format!(
        "Green energy: {} | {}\n",
        green_label(false),
        green_label(true)
    ));
    out
}

/// Format the mapping rows for one DNO (or all of them), plus duplicate pairs.
pub fn format_band_rows(tables: &Tables, network_id: Option<NetworkId>) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<8} {:<10} {}\n", "DNO", "LLF", "Band"));

    let rows: Vec<&BandMapping> = match network_id {
        Some(id) => tables.bands.for_network(id).collect(),
        None => tables.bands.mappings.iter().collect(),
    };
    let mut n = 0usize;
    for m in rows {
        out.push_str(&format!(
            "{:<8} {:<10} {}\n",
            m.network_id, m.loss_factor_code, m.band
        ));
        n += 1;
    }
    if n == 0 {
        out.push_str("(no mapping rows)\n");
    }

    let dups: Vec<_> = tables
        .bands
        .duplicates()
        .into_iter()
        .filter(|d| network_id.is_none_or(|id| d.network_id == id))
        .collect();
    if !dups.is_empty() {
        out.push_str("\nPairs mapped more than once (first row wins):\n");
        for d in dups {
            let marker = if d.is_conflicting() { " (conflicting)" } else { "" };
            out.push_str(&format!(
                "- DNO {} / LLF {}: {}{marker}\n",
                d.network_id,
                d.loss_factor_code,
                d.bands.join(", ")
            ));
        }
    }

    out
}

/// One-line summary of what was loaded.
pub fn format_load_summary(tables: &Tables) -> String {
    let mut out = format!(
        "Pricing rows: {}/{} | mapping rows: {}/{}",
        tables.pricing.records.len(),
        tables.pricing.rows_read,
        tables.bands.mappings.len(),
        tables.bands.rows_read,
    );
    let skipped = tables.pricing.row_errors.len() + tables.bands.row_errors.len();
    if skipped > 0 {
        out.push_str(&format!(" | skipped: {skipped}"));
    }
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let parts: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &w)| {
            let cell = truncate(cell, w);
            let pad = w.saturating_sub(display_width(&cell));
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    out.push_str(parts.join("  ").trim_end());
    out.push('\n');
}

fn display_width(s: &str) -> usize {
    s.chars().count()
}

fn truncate(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    let mut t: String = s.chars().take(width.saturating_sub(1)).collect();
    t.push('…');
    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BandTable, PricingQuery, PricingTable};

    fn record(fields: &[&str]) -> PricingRecord {
        PricingRecord {
            network_id: NetworkId::new(10),
            loss_factor_band: "A".to_string(),
            contract_duration_months: 12,
            green_energy: false,
            min_annual_consumption: 0.0,
            max_annual_consumption: 5000.0,
            fields: fields.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn eval<'a>(matches: Vec<&'a PricingRecord>) -> Evaluation<'a> {
        Evaluation {
            query: PricingQuery {
                network_id: NetworkId::new(10),
                loss_factor_code: "199".to_string(),
                annual_consumption: 3000.0,
                contract_duration_months: 12,
                green_energy: false,
            },
            band: "A".to_string(),
            matches,
        }
    }

    #[test]
    fn table_columns_are_aligned() {
        let headers = vec!["DNO_ID".to_string(), "Rate".to_string()];
        let a = record(&["10", "24.51"]);
        let b = record(&["10", "9"]);
        let text = format_records_table(&headers, &[&a, &b]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "DNO_ID  Rate");
        assert_eq!(lines[1], "------  -----");
        assert_eq!(lines[2], "10      24.51");
        assert_eq!(lines[3], "10      9");
    }

    #[test]
    fn long_cells_are_truncated() {
        let headers = vec!["Notes".to_string()];
        let long = "x".repeat(40);
        let a = record(&[&long]);
        let text = format_records_table(&headers, &[&a]);
        let last = text.lines().last().unwrap();
        assert_eq!(last.chars().count(), MAX_COLUMN_WIDTH);
        assert!(last.ends_with('…'));
    }

    #[test]
    fn empty_evaluation_shows_notice() {
        let text = format_evaluation(&eval(vec![]), &[]);
        assert!(text.contains("Mapped LLF band: A"));
        assert!(text.contains("No matching pricing records found."));
    }

    #[test]
    fn evaluation_reports_count() {
        let a = record(&["10"]);
        let text = format_evaluation(&eval(vec![&a]), &["DNO_ID".to_string()]);
        assert!(text.contains("Found 1 matching record(s)."));
    }

    #[test]
    fn band_rows_flag_duplicates() {
        let tables = Tables {
            pricing: PricingTable::default(),
            bands: BandTable {
                mappings: vec![
                    BandMapping {
                        network_id: NetworkId::new(10),
                        loss_factor_code: "199".to_string(),
                        band: "A".to_string(),
                    },
                    BandMapping {
                        network_id: NetworkId::new(10),
                        loss_factor_code: "199".to_string(),
                        band: "B".to_string(),
                    },
                ],
                ..BandTable::default()
            },
        };
        let text = format_band_rows(&tables, Some(NetworkId::new(10)));
        assert!(text.contains("DNO 10 / LLF 199: A, B (conflicting)"));

        let other = format_band_rows(&tables, Some(NetworkId::new(11)));
        assert!(other.contains("(no mapping rows)"));
        assert!(!other.contains("first row wins"));
    }
}
