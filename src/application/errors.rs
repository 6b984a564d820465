//! Application layer error types
//!
//! The taxonomy separates three outcomes that must never be conflated:
//! absence of matching data (a normal empty result, not an error at all),
//! unsupported requests (configuration errors, surfaced and never retried),
//! and malformed or unreachable data (surfaced to the caller undisguised).

use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::fetch::FetchError;

/// Unsupported vendor/product/version requests and registry defects
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Vendor '{vendor}' is not supported")]
    UnsupportedVendor { vendor: String },

    #[error("Product '{product}' is not supported for vendor '{vendor}'")]
    UnsupportedProduct { vendor: String, product: String },

    #[error(
        "Version {version} is not supported for '{product}'; supported versions: {}",
        .supported.join(", ")
    )]
    UnsupportedVersion {
        product: String,
        version: String,
        supported: Vec<String>,
    },

    #[error("No parser registered for key '{key}'")]
    UnknownParserKind { key: String },

    #[error("No URL configured for '{product}' version {version}")]
    MissingUrl { product: String, version: String },

    #[error("Invalid registry: {message}")]
    Invalid { message: String },
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Transport error: {0}")]
    Transport(#[from] FetchError),

    #[error("Malformed advisory data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected document structure: {message}")]
    DocumentStructure { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApplicationError {
    /// Shorthand for structural failures in auxiliary documents
    pub fn structure(message: impl Into<String>) -> Self {
        ApplicationError::DocumentStructure {
            message: message.into(),
        }
    }
}
