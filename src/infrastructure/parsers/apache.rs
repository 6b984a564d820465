//! Apache Tomcat security page parser
//!
//! Tomcat security pages carry one `<h3>` per fixed version, identified by a
//! heading id in which dots become underscores. Each section is a run of
//! sibling `<div>`s whose paragraphs open with a severity word
//! ("Low:", "Important:", ...) followed by the CVE identifiers it covers.

use async_trait::async_trait;
use regex::Regex;
use scraper::Html;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::html::{
    collapsed_text, element_by_id, find_heading, following_sibling_elements, selector,
};
use super::traits::{AdvisoryParser, ParserKind, RequestContext};
use crate::application::errors::ApplicationError;
use crate::domain::{CveId, DateNormalizer, Severity, VulnerabilityRecord};

static SEVERITY_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(Low|Medium|Important|Critical):").expect("valid severity pattern")
});

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid date pattern"));

/// Rank on the vendor's own severity ladder; the page says "Important"
/// where the canonical taxonomy says High.
fn label_rank(label: &str) -> u8 {
    match label.to_lowercase().as_str() {
        "critical" => 4,
        "important" => 3,
        "medium" => 2,
        "low" => 1,
        _ => 0,
    }
}

/// Parser for Apache Tomcat "Fixed in ..." security pages
pub struct TomcatSecurityPageParser {
    dates: DateNormalizer,
}

impl TomcatSecurityPageParser {
    pub fn new() -> Self {
        Self {
            dates: DateNormalizer::new(),
        }
    }

    fn extract(
        &self,
        document: &str,
        context: &RequestContext,
    ) -> Result<Option<VulnerabilityRecord>, ApplicationError> {
        let html = Html::parse_document(document);
        let fix_version = &context.product_fix_version;

        // Heading ids replace dots with underscores (9.0.109 -> 9_0_109)
        let heading_id =
            format!("Fixed_in_Apache_Tomcat_{}", fix_version).replace('.', "_");
        let heading = element_by_id(&html, "h3", &heading_id).or_else(|| {
            let fallback = Regex::new(&format!(
                r"(?i)Fixed in Apache Tomcat\s+{}",
                regex::escape(fix_version)
            ))
            .expect("valid heading pattern");
            find_heading(&html, &["h3"], &fallback)
        });
        let Some(heading) = heading else {
            return Ok(None);
        };

        let date_sel = selector("span.pull-right");
        let release_date = heading
            .select(&date_sel)
            .next()
            .map(|span| collapsed_text(&span))
            .or_else(|| {
                ISO_DATE
                    .find(&collapsed_text(&heading))
                    .map(|found| found.as_str().to_string())
            });

        let paragraph_sel = selector("p");
        let mut cves = BTreeSet::new();
        let mut max_label = String::from("Unknown");

        for sibling in following_sibling_elements(&heading) {
            if sibling.value().name() != "div" {
                break;
            }
            for paragraph in sibling.select(&paragraph_sel) {
                let text = collapsed_text(&paragraph);
                let found = CveId::find_all(&text);
                if found.is_empty() {
                    continue;
                }
                cves.extend(found);

                if let Some(caps) = SEVERITY_LABEL.captures(&text) {
                    let label = caps[1].to_string();
                    if label_rank(&label) > label_rank(&max_label) {
                        max_label = label;
                    }
                }
            }
        }

        if cves.is_empty() {
            return Ok(None);
        }

        let severity = Severity::normalize_label(&max_label)
            .parse()
            .unwrap_or(Severity::Unknown);
        let published = release_date
            .map(|raw| self.dates.normalize(&raw))
            .transpose()?;

        let record = VulnerabilityRecord::new(
            cves.into_iter().collect(),
            severity,
            None,
            published,
            "Apache".to_string(),
            context.product.clone(),
            context.base_version.clone(),
            fix_version.clone(),
            Some(fix_version.clone()),
        )?;

        Ok(Some(record))
    }
}

impl Default for TomcatSecurityPageParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdvisoryParser for TomcatSecurityPageParser {
    async fn parse(
        &self,
        document: &str,
        context: &RequestContext,
    ) -> Result<Option<VulnerabilityRecord>, ApplicationError> {
        self.extract(document, context)
    }

    fn kind(&self) -> ParserKind {
        ParserKind::TomcatSecurityPage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(fix_version: &str) -> RequestContext {
        RequestContext {
            product: "tomcat".to_string(),
            base_version: "9".to_string(),
            product_fix_version: fix_version.to_string(),
            url: "https://test.local/security-9.html".to_string(),
            release_date: None,
            display_name: Some("Apache Tomcat".to_string()),
            source_id: None,
        }
    }

    const PAGE: &str = r#"
        <html><body>
        <h3 id="Fixed_in_Apache_Tomcat_9_0_109">
          Fixed in Apache Tomcat 9.0.109
          <span class="pull-right">11 June 2024</span>
        </h3>
        <div>
          <p><b>Important:</b> Denial of Service CVE-2024-34750</p>
          <p>This was fixed with commit abc123.</p>
          <p><b>Low:</b> Information disclosure CVE-2024-21733</p>
        </div>
        <h3 id="Fixed_in_Apache_Tomcat_9_0_108">Fixed in Apache Tomcat 9.0.108</h3>
        <div>
          <p><b>Critical:</b> Remote code execution CVE-2024-50379</p>
        </div>
        </body></html>
    "#;

    #[tokio::test]
    async fn test_section_is_bounded_by_the_next_heading() {
        let parser = TomcatSecurityPageParser::new();
        let record = parser
            .parse(PAGE, &context("9.0.109"))
            .await
            .unwrap()
            .expect("record expected");

        let ids: Vec<&str> = record.cve_ids.iter().map(|c| c.as_str()).collect();
        // The Critical entry belongs to 9.0.108 and must not leak in
        assert_eq!(ids, vec!["CVE-2024-21733", "CVE-2024-34750"]);
        assert_eq!(record.severity, Severity::High);
        assert_eq!(record.cvss, None);
        assert_eq!(
            record.published_date.unwrap().to_string(),
            "2024-06-11"
        );
    }

    #[tokio::test]
    async fn test_vendor_label_important_normalizes_to_high() {
        let page = r#"
            <html><body>
            <h3 id="Fixed_in_Apache_Tomcat_9_0_100">Fixed in Apache Tomcat 9.0.100</h3>
            <div><p>Important: CVE-2023-0001</p></div>
            </body></html>
        "#;
        let parser = TomcatSecurityPageParser::new();
        let record = parser
            .parse(page, &context("9.0.100"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.severity, Severity::High);
    }

    #[tokio::test]
    async fn test_text_fallback_when_heading_id_differs() {
        let page = r#"
            <html><body>
            <h3 id="custom-anchor">Fixed in Apache Tomcat 9.0.50 <span class="pull-right">2021-06-28</span></h3>
            <div><p>Low: CVE-2021-30640</p></div>
            </body></html>
        "#;
        let parser = TomcatSecurityPageParser::new();
        let record = parser
            .parse(page, &context("9.0.50"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.cve_ids[0].as_str(), "CVE-2021-30640");
        assert_eq!(record.severity, Severity::Low);
        assert_eq!(
            record.published_date.unwrap().to_string(),
            "2021-06-28"
        );
    }

    #[tokio::test]
    async fn test_missing_version_yields_empty_result() {
        let parser = TomcatSecurityPageParser::new();
        let result = parser.parse(PAGE, &context("9.0.999")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_section_without_cves_yields_empty_result() {
        let page = r#"
            <html><body>
            <h3 id="Fixed_in_Apache_Tomcat_9_0_100">Fixed in Apache Tomcat 9.0.100</h3>
            <div><p>No security issues were addressed in this release.</p></div>
            </body></html>
        "#;
        let parser = TomcatSecurityPageParser::new();
        let result = parser.parse(page, &context("9.0.100")).await.unwrap();
        assert!(result.is_none());
    }
}
