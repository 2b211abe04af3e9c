//! LLF code → band resolution.

use crate::domain::{BandTable, NetworkId};
use crate::error::LookupError;

/// Resolve the band for a `(DNO, LLF code)` pair.
///
/// Matching is exact: canonical network id equality and case-sensitive code
/// equality. When the pair appears on several rows the first row in source
/// order wins (`BandTable::duplicates` lists those pairs).
pub fn resolve_band<'a>(
    table: &'a BandTable,
    network_id: NetworkId,
    loss_factor_code: &str,
) -> Result<&'a str, LookupError> {
    table
        .mappings
        .iter()
        .find(|m| m.network_id == network_id && m.loss_factor_code == loss_factor_code)
        .map(|m| m.band.as_str())
        .ok_or_else(|| LookupError::NotFound {
            network_id,
            code: loss_factor_code.to_string(),
        })
}
