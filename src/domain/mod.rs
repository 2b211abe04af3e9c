//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - normalized table rows (`PricingRecord`, `BandMapping`)
//! - the user's selection (`PricingQuery`)
//! - the loaded, immutable source tables (`Tables`)

pub mod tables;
pub mod types;

pub use tables::*;
pub use types::*;
