//! mudgauge-core — shared types for the CoreMUD exporter.
//!
//! Holds the upstream data model (market snapshots, shop reports, armour
//! inventories) as serde types and the `ExporterConfig` that every other
//! crate is built from.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ExporterConfig, PollStep, parse_duration};
pub use error::ConfigError;
pub use types::*;
