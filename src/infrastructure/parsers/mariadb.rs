//! MariaDB release-notes parser
//!
//! Release notes are Markdown-like text: each security fix is a line
//! containing the fix version and a `[CVE-...](link)` reference. The notes
//! themselves carry no severity, so every discovered CVE costs one extra
//! round trip to the CVE detail API for its authoritative base severity.

use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

use super::traits::{AdvisoryParser, ParserKind, RequestContext};
use crate::application::errors::ApplicationError;
use crate::domain::{CveId, DateNormalizer, Severity, VulnerabilityRecord};
use crate::infrastructure::fetch::DocumentFetcher;

static CVE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[?(CVE-\d{4}-\d{4,7})\]?\((https?://[^)]+)\)").expect("valid CVE link pattern")
});

static BASE_SEVERITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""baseSeverity":\s*"([^"]+)""#).expect("valid severity pattern")
});

/// Parser for MariaDB release-notes documents
pub struct ReleaseNotesParser {
    fetcher: Arc<dyn DocumentFetcher>,
    detail_api: String,
    dates: DateNormalizer,
}

impl ReleaseNotesParser {
    /// `detail_api` is the CVE detail endpoint prefix; the identifier is
    /// appended verbatim.
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, detail_api: String) -> Self {
        Self {
            fetcher,
            detail_api,
            dates: DateNormalizer::new(),
        }
    }

    /// Fetch the detail document for one CVE and read its base severity
    async fn lookup_severity(&self, url: &str) -> Result<Severity, ApplicationError> {
        let body = self.fetcher.fetch_text(url).await?;
        let severity = BASE_SEVERITY
            .captures(&body)
            .map(|caps| Severity::normalize_label(&caps[1]))
            .and_then(|label| label.parse().ok())
            .unwrap_or(Severity::Unknown);
        Ok(severity)
    }
}

#[async_trait]
impl AdvisoryParser for ReleaseNotesParser {
    async fn parse(
        &self,
        document: &str,
        context: &RequestContext,
    ) -> Result<Option<VulnerabilityRecord>, ApplicationError> {
        let fix_version = &context.product_fix_version;

        let mut cves: BTreeSet<CveId> = BTreeSet::new();
        let mut max_severity = Severity::Unknown;

        for line in document.lines() {
            if !line.contains(fix_version.as_str()) {
                continue;
            }
            let Some(caps) = CVE_LINK.captures(line) else {
                continue;
            };
            let cve = CveId::new(&caps[1])?;
            if !cves.insert(cve.clone()) {
                continue;
            }

            let detail_url = format!("{}{}", self.detail_api, cve);
            let severity = self.lookup_severity(&detail_url).await?;
            if severity.rank() > max_severity.rank() {
                max_severity = severity;
            }
        }

        if cves.is_empty() {
            return Ok(None);
        }

        let published = context
            .release_date
            .as_deref()
            .map(|raw| self.dates.normalize(raw))
            .transpose()?;

        let record = VulnerabilityRecord::new(
            cves.into_iter().collect(),
            max_severity,
            None,
            published,
            "MariaDB".to_string(),
            context.product.clone(),
            context.base_version.clone(),
            fix_version.clone(),
            Some(fix_version.clone()),
        )?;

        Ok(Some(record))
    }

    fn kind(&self) -> ParserKind {
        ParserKind::ReleaseNotes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::fetch::FetchError;
    use std::collections::HashMap;

    struct CannedFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl DocumentFetcher for CannedFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Http {
                    status: 404,
                    url: url.to_string(),
                })
        }
    }

    fn context() -> RequestContext {
        RequestContext {
            product: "server".to_string(),
            base_version: "10.6".to_string(),
            product_fix_version: "10.6.17".to_string(),
            url: "https://test.local/security".to_string(),
            release_date: Some("2024-02-07".to_string()),
            display_name: Some("MariaDB Server".to_string()),
            source_id: None,
        }
    }

    const NOTES: &str = "\
# Security Vulnerabilities\n\
- [CVE-2024-21096](https://nvd.example/CVE-2024-21096) fixed in 10.6.17\n\
- [CVE-2023-52969](https://nvd.example/CVE-2023-52969) fixed in 10.6.17\n\
- [CVE-2022-47015](https://nvd.example/CVE-2022-47015) fixed in 10.6.12\n";

    fn detail(severity: &str) -> String {
        format!(r#"{{"containers":{{"cna":{{"metrics":[{{"cvssV3_1":{{"baseSeverity":"{}","baseScore":7.5}}}}]}}}}}}"#, severity)
    }

    #[tokio::test]
    async fn test_detail_api_severities_are_aggregated() {
        let mut pages = HashMap::new();
        pages.insert(
            "https://cve.test/api/CVE-2024-21096".to_string(),
            detail("HIGH"),
        );
        pages.insert(
            "https://cve.test/api/CVE-2023-52969".to_string(),
            detail("MEDIUM"),
        );
        let parser = ReleaseNotesParser::new(
            Arc::new(CannedFetcher { pages }),
            "https://cve.test/api/".to_string(),
        );

        let record = parser
            .parse(NOTES, &context())
            .await
            .unwrap()
            .expect("record expected");

        let ids: Vec<&str> = record.cve_ids.iter().map(|c| c.as_str()).collect();
        // Only lines mentioning the fix version participate
        assert_eq!(ids, vec!["CVE-2023-52969", "CVE-2024-21096"]);
        assert_eq!(record.severity, Severity::High);
        assert_eq!(record.vendor, "MariaDB");
        assert_eq!(
            record.published_date.unwrap().to_string(),
            "2024-02-07"
        );
    }

    #[tokio::test]
    async fn test_detail_fetch_failure_is_a_transport_error() {
        let parser = ReleaseNotesParser::new(
            Arc::new(CannedFetcher {
                pages: HashMap::new(),
            }),
            "https://cve.test/api/".to_string(),
        );
        let result = parser.parse(NOTES, &context()).await;
        assert!(matches!(result, Err(ApplicationError::Transport(_))));
    }

    #[tokio::test]
    async fn test_unknown_base_severity_stays_unknown() {
        let mut pages = HashMap::new();
        pages.insert(
            "https://cve.test/api/CVE-2024-21096".to_string(),
            detail("WHATEVER"),
        );
        pages.insert(
            "https://cve.test/api/CVE-2023-52969".to_string(),
            r#"{"no":"metrics"}"#.to_string(),
        );
        let parser = ReleaseNotesParser::new(
            Arc::new(CannedFetcher { pages }),
            "https://cve.test/api/".to_string(),
        );
        let record = parser.parse(NOTES, &context()).await.unwrap().unwrap();
        assert_eq!(record.severity, Severity::Unknown);
    }

    #[tokio::test]
    async fn test_no_matching_lines_yield_empty_result() {
        let parser = ReleaseNotesParser::new(
            Arc::new(CannedFetcher {
                pages: HashMap::new(),
            }),
            "https://cve.test/api/".to_string(),
        );
        let mut ctx = context();
        ctx.product_fix_version = "10.6.99".to_string();
        let result = parser.parse(NOTES, &ctx).await.unwrap();
        assert!(result.is_none());
    }
}
