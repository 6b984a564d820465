//! Oracle Critical Patch Update orchestration
//!
//! Oracle publishes a rolling index of CPU advisories; the request always
//! targets the latest one. Resolution is two-step: the first link of the
//! index table names the current advisory, and the advisory's own
//! "Modification History" table carries the release date in its last row.

use async_trait::async_trait;
use scraper::Html;
use std::sync::Arc;

use super::traits::VendorOrchestrator;
use crate::application::errors::ApplicationError;
use crate::config::ProductScope;
use crate::domain::{DateNormalizer, VulnerabilityRecord};
use crate::infrastructure::fetch::DocumentFetcher;
use crate::infrastructure::parsers::html::{collapsed_text, element_after, selector};
use crate::infrastructure::parsers::{AdvisoryParser, RequestContext};

pub struct OracleCpuOrchestrator {
    fetcher: Arc<dyn DocumentFetcher>,
    parser: Arc<dyn AdvisoryParser>,
    scope: ProductScope,
    dates: DateNormalizer,
}

impl OracleCpuOrchestrator {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        parser: Arc<dyn AdvisoryParser>,
        scope: ProductScope,
    ) -> Self {
        Self {
            fetcher,
            parser,
            scope,
            dates: DateNormalizer::new(),
        }
    }

    /// Resolve the latest advisory URL and its identifier from the index
    /// page. The identifier is the link's file stem (e.g. "cpujan2026").
    fn latest_advisory_url(
        base_url: &str,
        document: &str,
    ) -> Result<(String, String), ApplicationError> {
        let html = Html::parse_document(document);
        let table_sel = selector("table");
        let Some(table) = html.select(&table_sel).next() else {
            return Err(ApplicationError::structure("advisory index table not found"));
        };

        let link_sel = selector("a[href]");
        let Some(link) = table.select(&link_sel).next() else {
            return Err(ApplicationError::structure("advisory link not found"));
        };

        let href = link.value().attr("href").unwrap_or_default();
        let stem = href.rsplit('/').next().unwrap_or(href);
        let source_id = stem.rsplit_once('.').map(|(name, _)| name).unwrap_or(stem);

        Ok((
            format!("{}/{}.html", base_url, source_id),
            source_id.to_string(),
        ))
    }

    /// Read the release date from the last row of the last body of the
    /// modification history table; Oracle writes it as "2026-January-20".
    fn modification_date(&self, document: &str) -> Result<String, ApplicationError> {
        let html = Html::parse_document(document);
        let h3_sel = selector("h3");
        let Some(heading) = html
            .select(&h3_sel)
            .find(|h| collapsed_text(h).to_lowercase() == "modification history")
        else {
            return Err(ApplicationError::structure(
                "modification history section not found",
            ));
        };

        let Some(table) = element_after(&html, &heading, "table") else {
            return Err(ApplicationError::structure(
                "modification history table not found",
            ));
        };

        let tbody_sel = selector("tbody");
        let tbodies: Vec<_> = table.select(&tbody_sel).collect();
        let Some(tbody) = tbodies.last() else {
            return Err(ApplicationError::structure("no table body found"));
        };

        let row_sel = selector("tr");
        let rows: Vec<_> = tbody.select(&row_sel).collect();
        let Some(last_row) = rows.last() else {
            return Err(ApplicationError::structure(
                "no rows found in modification table",
            ));
        };

        let td_sel = selector("td");
        let Some(cell) = last_row.select(&td_sel).next() else {
            return Err(ApplicationError::structure(
                "modification row missing a date cell",
            ));
        };

        let date = self.dates.normalize(&collapsed_text(&cell))?;
        Ok(date.to_string())
    }
}

#[async_trait]
impl VendorOrchestrator for OracleCpuOrchestrator {
    async fn process(
        &self,
        product: &str,
        base_version: &str,
        fix_version: &str,
    ) -> Result<Option<VulnerabilityRecord>, ApplicationError> {
        let base_url = self.scope.url_for(base_version)?;

        let index_doc = self.fetcher.fetch_text(&base_url).await?;
        let (advisory_url, source_id) = Self::latest_advisory_url(&base_url, &index_doc)?;
        tracing::info!(product, url = %advisory_url, source_id = %source_id, "resolved latest advisory");

        let advisory_doc = self.fetcher.fetch_text(&advisory_url).await?;
        let release_date = self.modification_date(&advisory_doc)?;

        let context = RequestContext {
            product: product.to_string(),
            base_version: base_version.to_string(),
            product_fix_version: fix_version.to_string(),
            url: advisory_url,
            release_date: Some(release_date),
            display_name: Some(self.scope.display_name().to_string()),
            source_id: Some(source_id),
        };

        self.parser.parse(&advisory_doc, &context).await
    }
}
