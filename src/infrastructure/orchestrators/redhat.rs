//! Red Hat errata orchestration
//!
//! Advisories come from the paginated portal search, filtered to security
//! errata for the product and base version. Docs whose synopsis mentions
//! the fix version are kept, and each one costs a securitydata API call for
//! its per-CVE severities. The collected errata go to the parser as one
//! JSON array.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

use super::traits::VendorOrchestrator;
use crate::application::errors::{ApplicationError, ConfigurationError};
use crate::config::ProductScope;
use crate::domain::VulnerabilityRecord;
use crate::infrastructure::fetch::DocumentFetcher;
use crate::infrastructure::parsers::redhat::{ErrataCve, ErrataEntry};
use crate::infrastructure::parsers::{AdvisoryParser, RequestContext};

const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: SearchBody,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    id: String,
    portal_synopsis: Option<String>,
    portal_publication_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CveRow {
    #[serde(rename = "CVE")]
    cve: String,
    severity: String,
}

pub struct RedHatErrataOrchestrator {
    fetcher: Arc<dyn DocumentFetcher>,
    parser: Arc<dyn AdvisoryParser>,
    scope: ProductScope,
}

impl RedHatErrataOrchestrator {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        parser: Arc<dyn AdvisoryParser>,
        scope: ProductScope,
    ) -> Self {
        Self {
            fetcher,
            parser,
            scope,
        }
    }

    fn search_page_url(
        &self,
        base: &str,
        product_filter: &str,
        start: usize,
    ) -> Result<Url, ApplicationError> {
        let mut url = Url::parse(base).map_err(|e| ConfigurationError::Invalid {
            message: format!("invalid search URL: {}", e),
        })?;
        url.query_pairs_mut()
            .append_pair("q", "*:*")
            .append_pair("start", &start.to_string())
            .append_pair("rows", &PAGE_SIZE.to_string())
            .append_pair("sort", "portal_publication_date desc")
            .append_pair(
                "fl",
                "id,portal_synopsis,portal_severity,portal_publication_date,allTitle",
            )
            .append_pair(
                "fq",
                r#"documentKind:("Errata") AND portal_advisory_type:("Security Advisory")"#,
            )
            .append_pair("fq", product_filter);
        Ok(url)
    }

    /// Authoritative per-CVE severities for one advisory
    async fn cve_details(&self, advisory: &str) -> Result<Vec<ErrataCve>, ApplicationError> {
        let api = self
            .scope
            .cve_api_url()
            .ok_or_else(|| ConfigurationError::Invalid {
                message: "cve_api_url not configured".to_string(),
            })?;
        let mut url = Url::parse(api).map_err(|e| ConfigurationError::Invalid {
            message: format!("invalid CVE API URL: {}", e),
        })?;
        url.query_pairs_mut().append_pair("advisory", advisory);

        let body = self.fetcher.fetch_text(url.as_str()).await?;
        let rows: Vec<CveRow> = serde_json::from_str(&body)?;
        Ok(rows
            .into_iter()
            .map(|row| ErrataCve {
                cve: row.cve,
                severity: row.severity,
            })
            .collect())
    }
}

#[async_trait]
impl VendorOrchestrator for RedHatErrataOrchestrator {
    async fn process(
        &self,
        product: &str,
        base_version: &str,
        fix_version: &str,
    ) -> Result<Option<VulnerabilityRecord>, ApplicationError> {
        let search_url = self
            .scope
            .search_url()
            .ok_or_else(|| ConfigurationError::Invalid {
                message: format!("search_url not configured for '{}'", product),
            })?
            .to_string();

        let display_name = self.scope.display_name().to_string();
        // Filter shape: portal_product_filter:JBoss\ Enterprise\ ...|*|7.4|*
        let escaped = display_name.replace(' ', "\\ ");
        let product_filter = format!("portal_product_filter:{}|*|{}|*", escaped, base_version);

        let mut errata: Vec<ErrataEntry> = Vec::new();
        let mut start = 0usize;

        loop {
            let page_url = self.search_page_url(&search_url, &product_filter, start)?;
            let body = self.fetcher.fetch_text(page_url.as_str()).await?;
            let page: SearchResponse = serde_json::from_str(&body)?;

            let docs = page.response.docs;
            if docs.is_empty() {
                break;
            }
            let count = docs.len();

            for doc in docs {
                let synopsis = doc.portal_synopsis.unwrap_or_default();
                if !synopsis.contains(fix_version) {
                    continue;
                }
                let cves = self.cve_details(&doc.id).await?;
                errata.push(ErrataEntry {
                    source_id: doc.id,
                    publication_date: doc.portal_publication_date,
                    cves,
                });
            }

            start += PAGE_SIZE;
            if count < PAGE_SIZE {
                break;
            }
        }

        tracing::info!(product, fix_version, errata = errata.len(), "search complete");
        let payload = serde_json::to_string(&errata)?;

        let context = RequestContext {
            product: product.to_string(),
            base_version: base_version.to_string(),
            product_fix_version: fix_version.to_string(),
            url: search_url,
            release_date: None,
            display_name: Some(display_name),
            source_id: None,
        };

        self.parser.parse(&payload, &context).await
    }
}
