//! Red Hat errata feed parser
//!
//! The orchestrator collects matching errata from the paginated portal
//! search and hands them over as a JSON array. All entries belong to the
//! requested fix version, so there is no location step here: the parser
//! aggregates across every advisory, reporting the union of CVEs, the
//! earliest publication date and the highest severity.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::traits::{AdvisoryParser, ParserKind, RequestContext};
use crate::application::errors::ApplicationError;
use crate::domain::{CveId, DateNormalizer, Severity, VulnerabilityRecord};

/// One advisory collected by the search, with its per-CVE severities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrataEntry {
    pub source_id: String,
    pub publication_date: Option<String>,
    pub cves: Vec<ErrataCve>,
}

/// A CVE reference inside an advisory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrataCve {
    pub cve: String,
    pub severity: String,
}

/// Red Hat's severity ladder; "important" sits where the canonical
/// taxonomy says High.
fn label_rank(label: &str) -> u8 {
    match label.trim().to_lowercase().as_str() {
        "critical" => 4,
        "important" => 3,
        "moderate" => 2,
        "low" => 1,
        _ => 0,
    }
}

/// Parser for collected errata feeds
pub struct ErrataFeedParser {
    dates: DateNormalizer,
}

impl ErrataFeedParser {
    pub fn new() -> Self {
        Self {
            dates: DateNormalizer::new(),
        }
    }
}

impl Default for ErrataFeedParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdvisoryParser for ErrataFeedParser {
    async fn parse(
        &self,
        document: &str,
        context: &RequestContext,
    ) -> Result<Option<VulnerabilityRecord>, ApplicationError> {
        let entries: Vec<ErrataEntry> = serde_json::from_str(document)?;
        if entries.is_empty() {
            return Ok(None);
        }

        let mut cves: BTreeSet<CveId> = BTreeSet::new();
        let mut source_ids: Vec<String> = Vec::new();
        let mut best_label = String::from("low");
        let mut best_rank = 0u8;
        let mut earliest: Option<NaiveDate> = None;

        for entry in &entries {
            source_ids.push(entry.source_id.clone());

            if let Some(raw) = &entry.publication_date {
                let date = self.dates.normalize(raw)?;
                earliest = Some(match earliest {
                    Some(current) if current <= date => current,
                    _ => date,
                });
            }

            for reference in &entry.cves {
                cves.insert(CveId::new(&reference.cve)?);
                let rank = label_rank(&reference.severity);
                if rank > best_rank {
                    best_rank = rank;
                    best_label = reference.severity.trim().to_lowercase();
                }
            }
        }

        if cves.is_empty() {
            return Ok(None);
        }

        let severity = Severity::normalize_label(&best_label)
            .parse()
            .unwrap_or(Severity::Unknown);

        source_ids.sort();
        let record = VulnerabilityRecord::new(
            cves.into_iter().collect(),
            severity,
            None,
            earliest,
            "Red Hat".to_string(),
            context
                .display_name
                .clone()
                .unwrap_or_else(|| "Red Hat Product".to_string()),
            context.base_version.clone(),
            context.product_fix_version.clone(),
            Some(source_ids.join(", ")),
        )?;

        Ok(Some(record))
    }

    fn kind(&self) -> ParserKind {
        ParserKind::ErrataFeed
    }
}
