//! MariaDB orchestration
//!
//! Release notes do not carry the release date; it lives in the downloads
//! REST API, keyed by fix version. The orchestrator resolves the date
//! first, then fetches the notes and lets the parser do the extraction.

use async_trait::async_trait;
use std::sync::Arc;

use super::traits::VendorOrchestrator;
use crate::application::errors::{ApplicationError, ConfigurationError};
use crate::config::ProductScope;
use crate::domain::VulnerabilityRecord;
use crate::infrastructure::fetch::DocumentFetcher;
use crate::infrastructure::parsers::{AdvisoryParser, RequestContext};

pub struct MariaDbOrchestrator {
    fetcher: Arc<dyn DocumentFetcher>,
    parser: Arc<dyn AdvisoryParser>,
    scope: ProductScope,
}

impl MariaDbOrchestrator {
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

    /// Pull `releases[fix_version].date_of_release` out of the release feed
    fn release_date_for(body: &str, fix_version: &str) -> Result<String, ApplicationError> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        value["releases"][fix_version]["date_of_release"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                ApplicationError::structure(format!(
                    "release date not found for version {}",
                    fix_version
                ))
            })
    }
}

#[async_trait]
impl VendorOrchestrator for MariaDbOrchestrator {
    async fn process(
        &self,
        product: &str,
        base_version: &str,
        fix_version: &str,
    ) -> Result<Option<VulnerabilityRecord>, ApplicationError> {
        let url = self.scope.url_for(base_version)?;
        let date_base = self.scope.date_url().ok_or_else(|| {
            ConfigurationError::Invalid {
                message: format!("date_url not configured for '{}'", product),
            }
        })?;

        let date_url = format!("{}{}", date_base, base_version);
        let feed = self.fetcher.fetch_text(&date_url).await?;
        let release_date = Self::release_date_for(&feed, fix_version)?;
        tracing::info!(product, fix_version, release_date = %release_date, "resolved release date");

        let document = self.fetcher.fetch_text(&url).await?;

        let context = RequestContext {
            product: product.to_string(),
            base_version: base_version.to_string(),
            product_fix_version: fix_version.to_string(),
            url,
            release_date: Some(release_date),
            display_name: Some(self.scope.display_name().to_string()),
            source_id: None,
        };

        self.parser.parse(&document, &context).await
    }
}
