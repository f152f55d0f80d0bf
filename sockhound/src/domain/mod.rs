//! Core domain types shared across the probe.

pub mod errors;

pub use errors::{AddressParseError, ConfigError, StatsParseError};
