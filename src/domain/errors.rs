//! Domain-specific error types

use thiserror::Error;

/// Domain-level errors for advisory extraction
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid CVE identifier: {id}")]
    InvalidCveId { id: String },

    #[error("Invalid severity: {value}")]
    InvalidSeverity { value: String },

    #[error("Invalid record field {field}: {message}")]
    InvalidRecord { field: String, message: String },

    #[error("Ambiguous date '{input}': specify a day-first or month-first hint")]
    AmbiguousDate { input: String },

    #[error("Unrecognized date format: {input}")]
    DateFormat { input: String },

    #[error("Invalid format in affected version column: {value}")]
    MalformedComponent { value: String },
}
