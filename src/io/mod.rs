//! Input/output helpers.
//!
//! - CSV ingest + normalization of the source tables (`ingest`)
//! - result exports (CSV/JSON) (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
