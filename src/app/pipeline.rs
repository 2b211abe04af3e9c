//! Shared evaluation logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! input check -> band resolution -> pricing filter
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use tracing::debug;

use crate::domain::{PricingQuery, PricingRecord, Tables};
use crate::error::LookupError;
use crate::lookup::{filter_pricing, resolve_band, FilterCriteria};

/// Outcome of one evaluation that got past band resolution.
///
/// `matches` borrows from the pricing table and keeps its row order.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation<'a> {
    pub query: PricingQuery,
    pub band: String,
    pub matches: Vec<&'a PricingRecord>,
}

impl Evaluation<'_> {
    /// No row matched; callers show a notice instead of a table and offer no export.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }
}

/// Resolve the band for `query` and filter the pricing table with it.
///
/// An empty (or whitespace-only) LLF code fails before either table is read.
pub fn evaluate<'a>(tables: &'a Tables, query: &PricingQuery) -> Result<Evaluation<'a>, LookupError> {
    let code = query.loss_factor_code.trim();
    if code.is_empty() {
        return Err(LookupError::MissingInput);
    }

    let band = resolve_band(&tables.bands, query.network_id, code)?;

    let criteria = FilterCriteria {
        band,
        network_id: query.network_id,
        contract_duration_months: query.contract_duration_months,
        green_energy: query.green_energy,
        annual_consumption: query.annual_consumption,
    };
    let matches = filter_pricing(&tables.pricing, &criteria);

    debug!(
        dno = %query.network_id,
        llf = code,
        band,
        matches = matches.len(),
        "evaluated query"
    );

    Ok(Evaluation {
        query: PricingQuery {
            loss_factor_code: code.to_string(),
            ..query.clone()
        },
        band: band.to_string(),
        matches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BandMapping, BandTable, NetworkId, PricingTable};

    fn tables() -> Tables {
        Tables {
            pricing: PricingTable {
                headers: vec!["DNO_ID".to_string()],
                records: vec![PricingRecord {
                    network_id: NetworkId::new(10),
                    loss_factor_band: "A".to_string(),
                    contract_duration_months: 12,
                    green_energy: false,
                    min_annual_consumption: 0.0,
                    max_annual_consumption: 5000.0,
                    fields: vec!["10".to_string()],
                }],
                ..PricingTable::default()
            },
            bands: BandTable {
                mappings: vec![BandMapping {
                    network_id: NetworkId::new(10),
                    loss_factor_code: "199".to_string(),
                    band: "A".to_string(),
                }],
                ..BandTable::default()
            },
        }
    }

    fn query(code: &str, consumption: f64) -> PricingQuery {
        PricingQuery {
            network_id: NetworkId::new(10),
            loss_factor_code: code.to_string(),
            annual_consumption: consumption,
            contract_duration_months: 12,
            green_energy: false,
        }
    }

    #[test]
    fn boundary_scenario_returns_the_single_row() {
        let t = tables();
        let eval = evaluate(&t, &query("199", 3000.0)).unwrap();
        assert_eq!(eval.band, "A");
        assert_eq!(eval.len(), 1);
        assert!(std::ptr::eq(eval.matches[0], &t.pricing.records[0]));
    }

    #[test]
    fn empty_code_fails_before_any_lookup() {
        // Tables with no rows at all: a scan would be a NotFound, not MissingInput.
        let t = Tables::default();
        assert_eq!(evaluate(&t, &query("", 3000.0)), Err(LookupError::MissingInput));
        assert_eq!(evaluate(&t, &query("   ", 3000.0)), Err(LookupError::MissingInput));
    }

    #[test]
    fn unknown_code_is_not_found() {
        let t = tables();
        let err = evaluate(&t, &query("999", 3000.0)).unwrap_err();
        assert!(matches!(err, LookupError::NotFound { .. }));
    }

    #[test]
    fn resolved_band_without_rows_is_an_empty_evaluation() {
        let t = tables();
        let eval = evaluate(&t, &query("199", 9000.0)).unwrap();
        assert_eq!(eval.band, "A");
        assert!(eval.is_empty());
    }

    #[test]
    fn code_is_trimmed_before_resolution() {
        let t = tables();
        let eval = evaluate(&t, &query(" 199 ", 0.0)).unwrap();
        assert_eq!(eval.query.loss_factor_code, "199");
        assert_eq!(eval.len(), 1);
    }
}
