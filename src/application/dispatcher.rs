//! Request dispatch
//!
//! The dispatcher validates a (vendor, product, base_version) request
//! against the registry and assembles the configured orchestrator/parser
//! pair for it. Parser selection goes through the closed `ParserKind`
//! registry: a product-level key shadows the vendor-level default, and a
//! key without a registered implementation is rejected here.

use std::str::FromStr;
use std::sync::Arc;

use crate::application::errors::ConfigurationError;
use crate::config::Config;
use crate::infrastructure::fetch::DocumentFetcher;
use crate::infrastructure::orchestrators::mariadb::MariaDbOrchestrator;
use crate::infrastructure::orchestrators::oracle::OracleCpuOrchestrator;
use crate::infrastructure::orchestrators::redhat::RedHatErrataOrchestrator;
use crate::infrastructure::orchestrators::single_page::SinglePageOrchestrator;
use crate::infrastructure::orchestrators::VendorOrchestrator;
use crate::infrastructure::parsers::apache::TomcatSecurityPageParser;
use crate::infrastructure::parsers::ibm::{MqFixListParser, WebSphereFixListParser};
use crate::infrastructure::parsers::mariadb::ReleaseNotesParser;
use crate::infrastructure::parsers::oracle::CpuRiskMatrixParser;
use crate::infrastructure::parsers::redhat::ErrataFeedParser;
use crate::infrastructure::parsers::{AdvisoryParser, ParserKind};

/// Hardcoded fallback for the CVE detail API, used when neither product
/// nor vendor configuration names one.
const DEFAULT_CVE_DETAIL_API: &str = "https://cveawg.mitre.org/api/cve/";

pub struct Dispatcher {
    config: Arc<Config>,
    fetcher: Arc<dyn DocumentFetcher>,
}

impl Dispatcher {
    pub fn new(config: Arc<Config>, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self { config, fetcher }
    }

    /// Resolve a request to a fully configured orchestrator.
    ///
    /// Vendor, product and version are validated in that order so the
    /// error always names the first thing that went wrong.
    pub fn resolve(
        &self,
        vendor: &str,
        product: &str,
        base_version: &str,
    ) -> Result<Box<dyn VendorOrchestrator>, ConfigurationError> {
        if self.config.registry.vendor(vendor).is_none() {
            return Err(ConfigurationError::UnsupportedVendor {
                vendor: vendor.to_string(),
            });
        }

        let Some(scope) = self.config.registry.scope(vendor, product) else {
            return Err(ConfigurationError::UnsupportedProduct {
                vendor: vendor.to_string(),
                product: product.to_string(),
            });
        };

        if !scope
            .supported_versions()
            .iter()
            .any(|v| v == base_version)
        {
            return Err(ConfigurationError::UnsupportedVersion {
                product: product.to_string(),
                version: base_version.to_string(),
                supported: scope.supported_versions().to_vec(),
            });
        }

        let key = scope
            .parser_key()
            .ok_or_else(|| ConfigurationError::UnknownParserKind {
                key: "(unset)".to_string(),
            })?;
        let kind = ParserKind::from_str(key)?;

        let parser: Arc<dyn AdvisoryParser> = match kind {
            ParserKind::MqFixList => Arc::new(MqFixListParser::new()),
            ParserKind::WebSphereFixList => Arc::new(WebSphereFixListParser::new()),
            ParserKind::TomcatSecurityPage => Arc::new(TomcatSecurityPageParser::new()),
            ParserKind::CpuRiskMatrix => Arc::new(CpuRiskMatrixParser::new()),
            ParserKind::ReleaseNotes => Arc::new(ReleaseNotesParser::new(
                self.fetcher.clone(),
                scope
                    .cve_api_url()
                    .unwrap_or(DEFAULT_CVE_DETAIL_API)
                    .to_string(),
            )),
            ParserKind::ErrataFeed => Arc::new(ErrataFeedParser::new()),
        };

        // The page family implies the retrieval protocol in front of it
        let orchestrator: Box<dyn VendorOrchestrator> = match kind {
            ParserKind::MqFixList
            | ParserKind::WebSphereFixList
            | ParserKind::TomcatSecurityPage => Box::new(SinglePageOrchestrator::new(
                self.fetcher.clone(),
                parser,
                scope,
            )),
            ParserKind::CpuRiskMatrix => Box::new(OracleCpuOrchestrator::new(
                self.fetcher.clone(),
                parser,
                scope,
            )),
            ParserKind::ReleaseNotes => Box::new(MariaDbOrchestrator::new(
                self.fetcher.clone(),
                parser,
                scope,
            )),
            ParserKind::ErrataFeed => Box::new(RedHatErrataOrchestrator::new(
                self.fetcher.clone(),
                parser,
                scope,
            )),
        };

        Ok(orchestrator)
    }

    /// Resolve the advisory URL for an already validated request
    pub fn resolve_url(
        &self,
        vendor: &str,
        product: &str,
        base_version: &str,
    ) -> Result<String, ConfigurationError> {
        let scope = self.config.registry.scope(vendor, product).ok_or_else(|| {
            ConfigurationError::UnsupportedProduct {
                vendor: vendor.to_string(),
                product: product.to_string(),
            }
        })?;
        scope.url_for(base_version)
    }
}
