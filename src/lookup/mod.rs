//! The two lookup steps: band resolution and the pricing filter.
//!
//! Both are pure functions over borrowed tables.

pub mod band;
pub mod filter;

pub use band::resolve_band;
pub use filter::{filter_pricing, FilterCriteria};
