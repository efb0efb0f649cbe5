//! Error types for Agora core operations

use thiserror::Error;

/// Failure to parse a wire/database string into a core enum.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    /// Which enum was being parsed ("vote kind", "sort mode", ...)
    pub kind: &'static str,
    /// The rejected input
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Pagination request errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("page numbers are 1-indexed, got {0}")]
    ZeroPage(u32),
}
