//! In-memory source tables.
//!
//! Both tables are built once at startup (see `io::ingest`) and then only
//! borrowed. Nothing in the crate mutates them after load.

use std::collections::{BTreeSet, HashMap};

use crate::domain::{BandMapping, NetworkId, PricingRecord};

/// A row-level problem found while loading a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// 1-based line number in the source file (header is line 1).
    pub line: usize,
    pub message: String,
}

/// Tariff offers plus the header row they were read with.
#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    /// Header text in source column order (BOM stripped).
    pub headers: Vec<String>,
    pub records: Vec<PricingRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl PricingTable {
    /// Distinct network ids, ascending.
    pub fn network_ids(&self) -> Vec<NetworkId> {
        self.records
            .iter()
            .map(|r| r.network_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct contract durations (months), ascending.
    pub fn contract_durations(&self) -> Vec<u32> {
        self.records
            .iter()
            .map(|r| r.contract_duration_months)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// `(DNO, LLF code) -> band` rows in source order.
#[derive(Debug, Clone, Default)]
pub struct BandTable {
    pub mappings: Vec<BandMapping>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// A `(DNO, LLF code)` pair that appears on more than one mapping row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateMapping {
    pub network_id: NetworkId,
    pub loss_factor_code: String,
    /// Bands in source order; the first one is the one the resolver returns.
    pub bands: Vec<String>,
}

impl DuplicateMapping {
    pub fn is_conflicting(&self) -> bool {
        self.bands.iter().any(|b| b != &self.bands[0])
    }
}

impl BandTable {
    /// Mapping rows for one network, in source order.
    pub fn for_network(&self, network_id: NetworkId) -> impl Iterator<Item = &BandMapping> {
        self.mappings.iter().filter(move |m| m.network_id == network_id)
    }

    /// Pairs mapped more than once, ordered by their first appearance.
    pub fn duplicates(&self) -> Vec<DuplicateMapping> {
        let mut index: HashMap<(NetworkId, &str), usize> = HashMap::new();
        let mut groups: Vec<DuplicateMapping> = Vec::new();

        for m in &self.mappings {
            let key = (m.network_id, m.loss_factor_code.as_str());
            match index.get(&key) {
                Some(&idx) => groups[idx].bands.push(m.band.clone()),
                None => {
                    index.insert(key, groups.len());
                    groups.push(DuplicateMapping {
                        network_id: m.network_id,
                        loss_factor_code: m.loss_factor_code.clone(),
                        bands: vec![m.band.clone()],
                    });
                }
            }
        }

        groups.retain(|g| g.bands.len() > 1);
        groups
    }
}

/// Both source tables, loaded once and passed by reference.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub pricing: PricingTable,
    pub bands: BandTable,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(dno: u32, code: &str, band: &str) -> BandMapping {
        BandMapping {
            network_id: NetworkId::new(dno),
            loss_factor_code: code.to_string(),
            band: band.to_string(),
        }
    }

    fn record(dno: u32, duration: u32) -> PricingRecord {
        PricingRecord {
            network_id: NetworkId::new(dno),
            loss_factor_band: "A".to_string(),
            contract_duration_months: duration,
            green_energy: false,
            min_annual_consumption: 0.0,
            max_annual_consumption: 1.0,
            fields: Vec::new(),
        }
    }

    #[test]
    fn option_lists_are_sorted_and_distinct() {
        let table = PricingTable {
            records: vec![record(23, 24), record(10, 12), record(23, 12), record(10, 36)],
            ..PricingTable::default()
        };
        assert_eq!(
            table.network_ids(),
            vec![NetworkId::new(10), NetworkId::new(23)]
        );
        assert_eq!(table.contract_durations(), vec![12, 24, 36]);
    }

    #[test]
    fn duplicates_keep_source_order() {
        let bands = BandTable {
            mappings: vec![
                mapping(10, "199", "A"),
                mapping(10, "N10", "B"),
                mapping(10, "199", "C"),
                mapping(12, "199", "A"),
                mapping(10, "N10", "B"),
            ],
            ..BandTable::default()
        };

        let dups = bands.duplicates();
        assert_eq!(dups.len(), 2);
        assert_eq!(dups[0].loss_factor_code, "199");
        assert_eq!(dups[0].bands, vec!["A", "C"]);
        assert!(dups[0].is_conflicting());
        assert_eq!(dups[1].loss_factor_code, "N10");
        assert!(!dups[1].is_conflicting());
    }

    #[test]
    fn for_network_filters_rows() {
        let bands = BandTable {
            mappings: vec![mapping(10, "199", "A"), mapping(12, "199", "B")],
            ..BandTable::default()
        };
        let rows: Vec<_> = bands.for_network(NetworkId::new(12)).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].band, "B");
    }
}
