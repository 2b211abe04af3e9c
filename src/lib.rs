//! `llf-pricing` library crate.
//!
//! The binary (`llf`) is a thin wrapper around this library so that:
//!
//! - the lookup and filter are testable without spawning processes
//! - the CLI and the TUI share one evaluation pipeline

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod lookup;
pub mod report;
pub mod tui;
