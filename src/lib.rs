//! Advisora Rust - vendor security advisory extraction engine
//!
//! This crate extracts structured vulnerability records (CVE identifiers,
//! severity, publication date, affected version) from heterogeneous
//! vendor-published advisory pages and normalizes them into one canonical
//! record shape per (vendor, product, version) request.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;

pub use config::Config;
pub use logging::init_tracing;
