//! Shared domain types.
//!
//! Values coming out of the source tables are normalized into these types once,
//! at load time, so that the resolver and the filter only ever compare typed
//! values.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// File name offered for the CSV export of a result set.
pub const EXPORT_FILE_NAME: &str = "pricing_results.csv";

/// MIME type of the CSV export.
pub const EXPORT_MIME: &str = "text/csv";

/// Distribution Network Operator identifier.
///
/// Both tables carry this value, sometimes as `10` and sometimes as `10.0`
/// (spreadsheet exports). Parsing accepts either; the canonical text form
/// used for display and comparison is the plain integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NetworkId(u32);

impl NetworkId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NetworkId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_whole_number(s)
            .map(Self)
            .ok_or_else(|| format!("Invalid DNO id '{}'. Expected a non-negative integer.", s.trim()))
    }
}

/// Parse a non-negative whole number, tolerating an all-zero fractional part.
///
/// `"12"`, `" 12 "` and `"12.0"` all yield `12`; `"12.5"`, `"-1"` and `""` do not.
pub fn parse_whole_number(s: &str) -> Option<u32> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };
    if let Some(frac) = frac_part {
        if frac.is_empty() || !frac.bytes().all(|b| b == b'0') {
            return None;
        }
    }
    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    int_part.parse().ok()
}

/// Parse the green-energy flag as stored in the pricing table.
///
/// The comparison is case-insensitive against `True`/`False`.
pub fn parse_green_flag(s: &str) -> Option<bool> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Literal label used when presenting the green-energy choice.
pub fn green_label(flag: bool) -> &'static str {
    if flag { "True" } else { "False" }
}

/// One tariff offer from the pricing table.
///
/// `fields` holds every raw cell of the source row in column order; the typed
/// fields are the normalized copies of the columns the filter looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingRecord {
    pub network_id: NetworkId,
    pub loss_factor_band: String,
    pub contract_duration_months: u32,
    pub green_energy: bool,
    /// Inclusive lower bound (kWh).
    pub min_annual_consumption: f64,
    /// Inclusive upper bound (kWh).
    pub max_annual_consumption: f64,
    pub fields: Vec<String>,
}

impl PricingRecord {
    /// Whether `annual_consumption` falls inside the record's eligibility range.
    pub fn accepts_consumption(&self, annual_consumption: f64) -> bool {
        self.min_annual_consumption <= annual_consumption && annual_consumption <= self.max_annual_consumption
    }
}

/// One row of the band mapping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandMapping {
    pub network_id: NetworkId,
    pub loss_factor_code: String,
    pub band: String,
}

/// The user's selection for one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingQuery {
    pub network_id: NetworkId,
    pub loss_factor_code: String,
    /// kWh per year, non-negative.
    pub annual_consumption: f64,
    pub contract_duration_months: u32,
    pub green_energy: bool,
}
