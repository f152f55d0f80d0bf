//! Structured error types for sockhound
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! Parsing and construction errors surface synchronously to the caller and
//! always name the offending field or value; aggregation and filtering
//! never fail.

use thiserror::Error;

/// Malformed address or subnet descriptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("empty address descriptor")]
    Empty,

    #[error("invalid address in descriptor {descriptor:?}")]
    InvalidAddress { descriptor: String },

    #[error("invalid prefix length in descriptor {descriptor:?} (expected /0 to /32)")]
    InvalidPrefix { descriptor: String },
}

/// Malformed serialized statistics record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsParseError {
    #[error("statistics record does not match the expected layout: {0:?}")]
    Malformed(String),

    #[error("non-numeric value {value:?} for field `{field}`")]
    NonNumeric { field: &'static str, value: String },
}

/// Invalid filter configuration, rejected at build time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("filter option `none` cannot be combined with any other filter rule")]
    NoneIsExclusive,
}
