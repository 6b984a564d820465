//! Domain entities representing core business concepts

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::value_objects::{CveId, Severity};

/// Canonical vulnerability record for one (vendor, product, version) query.
///
/// A record aggregates every CVE applicable to the requested fix version:
/// identifiers sorted and deduplicated, the worst-case severity across all
/// matched rows, and a single publication date. Records are constructed once
/// by a parser and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    pub cve_ids: Vec<CveId>,
    pub severity: Severity,
    pub cvss: Option<f64>,
    pub published_date: Option<NaiveDate>,
    pub vendor: String,
    pub product: String,
    pub product_base_version: String,
    pub product_fix_version: String,
    pub source_id: Option<String>,
}

impl VulnerabilityRecord {
    /// Create a new record with validation. CVE identifiers are sorted
    /// lexicographically and deduplicated; identifying fields must be
    /// non-empty.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cve_ids: Vec<CveId>,
        severity: Severity,
        cvss: Option<f64>,
        published_date: Option<NaiveDate>,
        vendor: String,
        product: String,
        product_base_version: String,
        product_fix_version: String,
        source_id: Option<String>,
    ) -> Result<Self, DomainError> {
        let vendor = non_empty("vendor", vendor)?;
        let product = non_empty("product", product)?;
        let product_base_version = non_empty("product_base_version", product_base_version)?;
        let product_fix_version = non_empty("product_fix_version", product_fix_version)?;

        let mut cve_ids = cve_ids;
        cve_ids.sort();
        cve_ids.dedup();

        Ok(VulnerabilityRecord {
            cve_ids,
            severity,
            cvss,
            published_date,
            vendor,
            product,
            product_base_version,
            product_fix_version,
            source_id,
        })
    }
}

fn non_empty(field: &str, value: String) -> Result<String, DomainError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(DomainError::InvalidRecord {
            field: field.to_string(),
            message: "must not be empty".to_string(),
        });
    }
    Ok(value)
}
