//! Trait for vendor retrieval protocols

use async_trait::async_trait;

use crate::application::errors::ApplicationError;
use crate::domain::VulnerabilityRecord;

/// Trait for the vendor-specific retrieval protocol behind one request.
///
/// An orchestrator performs whatever auxiliary fetches its vendor requires
/// (link resolution, date lookups, paginated search), assembles the request
/// context and invokes its parser exactly once per call. CVE extraction is
/// entirely the parser's job.
#[async_trait]
pub trait VendorOrchestrator: Send + Sync {
    /// Run the full retrieval-and-extraction pipeline for one fix version
    async fn process(
        &self,
        product: &str,
        base_version: &str,
        fix_version: &str,
    ) -> Result<Option<VulnerabilityRecord>, ApplicationError>;
}

impl std::fmt::Debug for dyn VendorOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VendorOrchestrator")
    }
}
