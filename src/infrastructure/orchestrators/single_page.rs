//! Single-fetch orchestration for fix-list and security pages
//!
//! IBM fix lists and Apache security pages need no auxiliary lookups: the
//! registry URL for the base version is fetched once and handed straight to
//! the parser, which finds everything else inside the document.

use async_trait::async_trait;
use std::sync::Arc;

use super::traits::VendorOrchestrator;
use crate::application::errors::ApplicationError;
use crate::config::ProductScope;
use crate::domain::VulnerabilityRecord;
use crate::infrastructure::fetch::DocumentFetcher;
use crate::infrastructure::parsers::{AdvisoryParser, RequestContext};

pub struct SinglePageOrchestrator {
    fetcher: Arc<dyn DocumentFetcher>,
    parser: Arc<dyn AdvisoryParser>,
    scope: ProductScope,
}

impl SinglePageOrchestrator {
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
}

#[async_trait]
impl VendorOrchestrator for SinglePageOrchestrator {
    async fn process(
        &self,
        product: &str,
        base_version: &str,
        fix_version: &str,
    ) -> Result<Option<VulnerabilityRecord>, ApplicationError> {
        let url = self.scope.url_for(base_version)?;
        tracing::info!(product, base_version, url = %url, "fetching advisory page");

        let document = self.fetcher.fetch_text(&url).await?;

        let context = RequestContext {
            product: product.to_string(),
            base_version: base_version.to_string(),
            product_fix_version: fix_version.to_string(),
            url,
            release_date: None,
            display_name: Some(self.scope.display_name().to_string()),
            source_id: None,
        };

        self.parser.parse(&document, &context).await
    }
}
