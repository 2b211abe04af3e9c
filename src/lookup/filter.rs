//! Pricing table row filter.

use crate::domain::{NetworkId, PricingRecord, PricingTable};

/// Everything a pricing row has to match, with the band already resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterCriteria<'q> {
    pub band: &'q str,
    pub network_id: NetworkId,
    pub contract_duration_months: u32,
    pub green_energy: bool,
    pub annual_consumption: f64,
}

impl FilterCriteria<'_> {
    pub fn matches(&self, record: &PricingRecord) -> bool {
        record.network_id == self.network_id
            && record.loss_factor_band == self.band
            && record.contract_duration_months == self.contract_duration_months
            && record.green_energy == self.green_energy
            && record.accepts_consumption(self.annual_consumption)
    }
}

/// Return the rows that satisfy every predicate, in source order.
pub fn filter_pricing<'a>(table: &'a PricingTable, criteria: &FilterCriteria<'_>) -> Vec<&'a PricingRecord> {
    table.records.iter().filter(|r| criteria.matches(r)).collect()
}
