//! End-to-end tests for the extraction pipeline
//!
//! Every test drives the real dispatcher, orchestrators and parsers against
//! the default registry; only the fetch collaborator is replaced with
//! canned documents.

use async_trait::async_trait;
use std::sync::Arc;

use advisora_rust::application::{ApplicationError, ConfigurationError, Dispatcher};
use advisora_rust::domain::Severity;
use advisora_rust::infrastructure::fetch::{DocumentFetcher, FetchError};
use advisora_rust::infrastructure::repositories::{FileRecordRepository, RecordRepository};
use advisora_rust::Config;

mod fixtures {
    //! Canned vendor documents

    pub const MQ_FIX_LIST: &str = r#"
        <html><body>
        <table>
          <tr><th>Fix level</th><th>Release date</th></tr>
          <tr><td>9.1.0.33</td><td>28 July 2025</td></tr>
        </table>
        <h3>IBM MQ cumulative security update 9.1.0.33</h3>
        <table>
          <tr><td>CVE-2024-0001</td><td>CVSS base score 9.8</td></tr>
          <tr><td>CVE-2024-0002</td><td>CVSS base score 3.0</td></tr>
        </table>
        </body></html>
    "#;

    pub const CPU_INDEX: &str = r#"
        <html><body>
        <table><tbody>
          <tr><td><a href="/security-alerts/cpujan2026.html">Critical Patch Update - January 2026</a></td></tr>
          <tr><td><a href="/security-alerts/cpuoct2025.html">Critical Patch Update - October 2025</a></td></tr>
        </tbody></table>
        </body></html>
    "#;

    pub const CPU_ADVISORY: &str = r#"
        <html><body>
        <h4>Oracle Database Risk Matrix</h4>
        <table><tbody>
          <tr>
            <th>CVE-2026-0001</th>
            <td>Core RDBMS</td><td>None</td><td>Network</td><td>No</td>
            <td>7.5</td><td>19.3, 21.3</td><td>Support</td>
          </tr>
        </tbody></table>
        <h3>Modification History</h3>
        <table><tbody>
          <tr><td>2026-January-20</td><td>Rev 1. Initial Release</td></tr>
        </tbody></table>
        </body></html>
    "#;

    pub const MARIADB_RELEASES: &str = r#"{
        "releases": {
            "10.6.17": {"date_of_release": "2024-02-07"}
        }
    }"#;

    pub const MARIADB_NOTES: &str = "\
# Security Vulnerabilities\n\
- [CVE-2024-21096](https://nvd.example/CVE-2024-21096) fixed in 10.6.17\n\
- [CVE-2022-47015](https://nvd.example/CVE-2022-47015) fixed in 10.6.12\n";

    pub const CVE_DETAIL_HIGH: &str =
        r#"{"containers":{"cna":{"metrics":[{"cvssV3_1":{"baseSeverity":"HIGH"}}]}}}"#;

    pub const ERRATA_SEARCH: &str = r#"{
        "response": {
            "docs": [
                {
                    "id": "RHSA-2024:1193",
                    "portal_synopsis": "Red Hat JBoss EAP 7.4.10 update",
                    "portal_publication_date": "2024-03-01"
                },
                {
                    "id": "RHSA-2024:0745",
                    "portal_synopsis": "Red Hat JBoss EAP 7.4.10 update",
                    "portal_publication_date": "2024-02-01"
                }
            ]
        }
    }"#;

    pub const ERRATA_CVES_MODERATE: &str =
        r#"[{"CVE": "CVE-2024-1233", "severity": "moderate"}]"#;

    pub const ERRATA_CVES_CRITICAL: &str =
        r#"[{"CVE": "CVE-2023-6717", "severity": "critical"}]"#;
}

/// Fetcher serving canned bodies, routed by URL substring so query strings
/// do not need to be reproduced verbatim.
struct CannedFetcher {
    routes: Vec<(String, String)>,
}

impl CannedFetcher {
    fn new(routes: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            routes: routes
                .iter()
                .map(|(pattern, body)| (pattern.to_string(), body.to_string()))
                .collect(),
        })
    }
}

#[async_trait]
impl DocumentFetcher for CannedFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.routes
            .iter()
            .find(|(pattern, _)| url.contains(pattern.as_str()))
            .map(|(_, body)| body.clone())
            .ok_or_else(|| FetchError::Http {
                status: 404,
                url: url.to_string(),
            })
    }
}

fn dispatcher(fetcher: Arc<CannedFetcher>) -> Dispatcher {
    Dispatcher::new(Arc::new(Config::default()), fetcher)
}

#[tokio::test]
async fn test_fix_list_pipeline_aggregates_one_record() {
    let fetcher = CannedFetcher::new(&[("fix-list-ibm-mq-version-9.1", fixtures::MQ_FIX_LIST)]);
    let dispatcher = dispatcher(fetcher);

    let record = dispatcher
        .resolve("ibm", "mq", "9.1")
        .unwrap()
        .process("mq", "9.1", "9.1.0.33")
        .await
        .unwrap()
        .expect("record expected");

    let ids: Vec<&str> = record.cve_ids.iter().map(|c| c.as_str()).collect();
    assert_eq!(ids, vec!["CVE-2024-0001", "CVE-2024-0002"]);
    assert_eq!(record.severity, Severity::Critical);
    assert_eq!(record.vendor, "IBM");
    assert_eq!(record.product_base_version, "9.1");
    assert_eq!(record.product_fix_version, "9.1.0.33");
    assert_eq!(record.published_date.unwrap().to_string(), "2025-07-28");
}

#[tokio::test]
async fn test_missing_fix_version_is_an_empty_result_not_an_error() {
    let fetcher = CannedFetcher::new(&[("fix-list-ibm-mq-version-9.1", fixtures::MQ_FIX_LIST)]);
    let dispatcher = dispatcher(fetcher);

    let result = dispatcher
        .resolve("ibm", "mq", "9.1")
        .unwrap()
        .process("mq", "9.1", "9.1.0.99")
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_cpu_pipeline_resolves_latest_advisory_and_date() {
    let fetcher = CannedFetcher::new(&[
        ("cpujan2026.html", fixtures::CPU_ADVISORY),
        ("security-alerts", fixtures::CPU_INDEX),
    ]);
    let dispatcher = dispatcher(fetcher);

    let record = dispatcher
        .resolve("oracle", "oracle database", "19")
        .unwrap()
        .process("oracle database", "19", "19.20")
        .await
        .unwrap()
        .expect("record expected");

    assert_eq!(record.cve_ids[0].as_str(), "CVE-2026-0001");
    assert_eq!(record.severity, Severity::High);
    assert_eq!(record.cvss, Some(7.5));
    assert_eq!(record.source_id.as_deref(), Some("cpujan2026"));
    assert_eq!(record.product, "Oracle Database Server");
    assert_eq!(record.published_date.unwrap().to_string(), "2026-01-20");
}

#[tokio::test]
async fn test_release_notes_pipeline_fetches_detail_severities() {
    let fetcher = CannedFetcher::new(&[
        ("downloads.mariadb.org/rest-api/mariadb/10.6", fixtures::MARIADB_RELEASES),
        ("mariadb.com/kb/en/security", fixtures::MARIADB_NOTES),
        ("cveawg.mitre.org/api/cve/CVE-2024-21096", fixtures::CVE_DETAIL_HIGH),
    ]);
    let dispatcher = dispatcher(fetcher);

    let record = dispatcher
        .resolve("mariadb", "server", "10.6")
        .unwrap()
        .process("server", "10.6", "10.6.17")
        .await
        .unwrap()
        .expect("record expected");

    assert_eq!(record.cve_ids.len(), 1);
    assert_eq!(record.cve_ids[0].as_str(), "CVE-2024-21096");
    assert_eq!(record.severity, Severity::High);
    assert_eq!(record.published_date.unwrap().to_string(), "2024-02-07");
}

#[tokio::test]
async fn test_errata_pipeline_reports_earliest_date_and_highest_severity() {
    let fetcher = CannedFetcher::new(&[
        ("search/kcs", fixtures::ERRATA_SEARCH),
        ("advisory=RHSA-2024%3A1193", fixtures::ERRATA_CVES_MODERATE),
        ("advisory=RHSA-2024%3A0745", fixtures::ERRATA_CVES_CRITICAL),
    ]);
    let dispatcher = dispatcher(fetcher);

    let record = dispatcher
        .resolve("redhat", "eap", "7.4")
        .unwrap()
        .process("eap", "7.4", "7.4.10")
        .await
        .unwrap()
        .expect("record expected");

    let ids: Vec<&str> = record.cve_ids.iter().map(|c| c.as_str()).collect();
    assert_eq!(ids, vec!["CVE-2023-6717", "CVE-2024-1233"]);
    assert_eq!(record.severity, Severity::Critical);
    assert_eq!(record.published_date.unwrap().to_string(), "2024-02-01");
    assert_eq!(
        record.source_id.as_deref(),
        Some("RHSA-2024:0745, RHSA-2024:1193")
    );
}

#[tokio::test]
async fn test_transport_failures_are_never_empty_results() {
    let fetcher = CannedFetcher::new(&[]);
    let dispatcher = dispatcher(fetcher);

    let result = dispatcher
        .resolve("ibm", "mq", "9.1")
        .unwrap()
        .process("mq", "9.1", "9.1.0.33")
        .await;
    assert!(matches!(result, Err(ApplicationError::Transport(_))));
}

#[tokio::test]
async fn test_unsupported_requests_fail_at_resolution() {
    let dispatcher = dispatcher(CannedFetcher::new(&[]));

    assert!(matches!(
        dispatcher.resolve("vmware", "esxi", "8"),
        Err(ConfigurationError::UnsupportedVendor { .. })
    ));
    assert!(matches!(
        dispatcher.resolve("ibm", "db2", "11.5"),
        Err(ConfigurationError::UnsupportedProduct { .. })
    ));

    let error = dispatcher.resolve("ibm", "mq", "1.0").unwrap_err();
    assert!(matches!(
        error,
        ConfigurationError::UnsupportedVersion { .. }
    ));
    // The message enumerates every supported version
    let message = error.to_string();
    for version in ["9.1", "9.2", "9.3", "9.4"] {
        assert!(message.contains(version), "missing {} in: {}", version, message);
    }
}

#[tokio::test]
async fn test_record_serialization_shape() {
    let fetcher = CannedFetcher::new(&[("fix-list-ibm-mq-version-9.1", fixtures::MQ_FIX_LIST)]);
    let dispatcher = dispatcher(fetcher);

    let record = dispatcher
        .resolve("ibm", "mq", "9.1")
        .unwrap()
        .process("mq", "9.1", "9.1.0.33")
        .await
        .unwrap()
        .unwrap();

    let value = serde_json::to_value(&record).unwrap();
    assert!(value["cve_ids"].is_array());
    assert_eq!(value["cve_ids"][0], "CVE-2024-0001");
    assert_eq!(value["severity"], "Critical");
    assert_eq!(value["published_date"], "2025-07-28");
    assert_eq!(value["product_fix_version"], "9.1.0.33");
    assert_eq!(value["source_id"], "9.1.0.33");
}

#[tokio::test]
async fn test_records_round_trip_through_the_repository() {
    let fetcher = CannedFetcher::new(&[("fix-list-ibm-mq-version-9.1", fixtures::MQ_FIX_LIST)]);
    let dispatcher = dispatcher(fetcher);

    let record = dispatcher
        .resolve("ibm", "mq", "9.1")
        .unwrap()
        .process("mq", "9.1", "9.1.0.33")
        .await
        .unwrap()
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let repository = FileRecordRepository::new(dir.path());
    let path = repository.save(&record, "ibm_mq_9.1.0.33").unwrap();

    let body = std::fs::read_to_string(path).unwrap();
    let loaded: advisora_rust::domain::VulnerabilityRecord =
        serde_json::from_str(&body).unwrap();
    assert_eq!(loaded, record);
}
