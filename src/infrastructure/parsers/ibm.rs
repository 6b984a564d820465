//! IBM fix-list page parsers
//!
//! Fix-list pages group security updates under per-version sections. The MQ
//! layout anchors sections on `<h3>` headings; the WebSphere layout anchors
//! on a bare "Fix Pack {version}" text node. Both are followed by a table
//! whose rows carry CVE identifiers and a CVSS base score.

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::html::{
    collapsed_text, element_after, element_after_text, find_heading, selector, text_after_text,
};
use super::traits::{AdvisoryParser, ParserKind, RequestContext};
use crate::application::errors::ApplicationError;
use crate::domain::{CveId, CvssScale, DateNormalizer, Severity, VulnerabilityRecord};

static MQ_CVSS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"CVSS base score (\d+\.\d+)").expect("valid CVSS pattern"));

static WEBSPHERE_CVSS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"CVSS (\d+\.\d+)").expect("valid CVSS pattern"));

static DATE_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}\s+[A-Za-z]+\s+\d{4}").expect("valid date pattern"));

static FIX_RELEASE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Fix release date:\s*(.*)").expect("valid date pattern"));

/// Walk a CVE table and aggregate identifiers, the highest CVSS base score
/// and the corresponding worst-case severity.
fn aggregate_rows(table: &ElementRef, cvss_pattern: &Regex) -> (BTreeSet<CveId>, f64, Severity) {
    let row_sel = selector("tr");
    let mut cves = BTreeSet::new();
    let mut max_cvss = 0.0f64;
    let mut max_severity = Severity::Unknown;

    for row in table.select(&row_sel) {
        let text = collapsed_text(&row);
        let found = CveId::find_all(&text);
        if found.is_empty() {
            continue;
        }
        cves.extend(found);

        if let Some(caps) = cvss_pattern.captures(&text) {
            if let Ok(score) = caps[1].parse::<f64>() {
                let severity = Severity::from_score(score, CvssScale::V3x);
                if score > max_cvss {
                    max_cvss = score;
                }
                if severity.rank() > max_severity.rank() {
                    max_severity = severity;
                }
            }
        }
    }

    (cves, max_cvss, max_severity)
}

/// Parser for IBM MQ cumulative security update pages
pub struct MqFixListParser {
    dates: DateNormalizer,
}

impl MqFixListParser {
    pub fn new() -> Self {
        Self {
            dates: DateNormalizer::new(),
        }
    }

    /// The first table of the page maps fix levels to release dates. The
    /// date cell is free-form; any "day month-name year" run counts.
    fn release_date(&self, html: &Html, fix_version: &str) -> Option<String> {
        let table_sel = selector("table");
        let table = html.select(&table_sel).next()?;
        if !collapsed_text(&table).to_lowercase().contains("release date") {
            return None;
        }

        let row_sel = selector("tr");
        let cell_sel = selector("td, th");
        let needle = fix_version.to_lowercase();
        for row in table.select(&row_sel) {
            let cells: Vec<String> = row.select(&cell_sel).map(|c| collapsed_text(&c)).collect();
            if cells.len() < 2 {
                continue;
            }
            if cells[0].to_lowercase().contains(&needle) {
                for cell in &cells[1..] {
                    if let Some(found) = DATE_CELL.find(cell) {
                        return Some(found.as_str().to_string());
                    }
                }
            }
        }
        None
    }

    fn extract(
        &self,
        document: &str,
        context: &RequestContext,
    ) -> Result<Option<VulnerabilityRecord>, ApplicationError> {
        let html = Html::parse_document(document);
        let fix_version = &context.product_fix_version;

        let release_date = self.release_date(&html, fix_version);

        let heading_pattern = Regex::new(&format!(
            r"(?i)\bIBM MQ\b[\s\S]*?\b{}\b",
            regex::escape(fix_version)
        ))
        .expect("valid heading pattern");

        let Some(heading) = find_heading(&html, &["h3"], &heading_pattern) else {
            return Ok(None);
        };
        let Some(table) = element_after(&html, &heading, "table") else {
            return Ok(None);
        };

        let (cves, max_cvss, max_severity) = aggregate_rows(&table, &MQ_CVSS);
        if cves.is_empty() {
            return Ok(None);
        }

        let published = release_date
            .map(|raw| self.dates.normalize(&raw))
            .transpose()?;

        let record = VulnerabilityRecord::new(
            cves.into_iter().collect(),
            max_severity,
            (max_cvss > 0.0).then_some(max_cvss),
            published,
            "IBM".to_string(),
            context.product.clone(),
            context.base_version.clone(),
            fix_version.clone(),
            Some(fix_version.clone()),
        )?;

        Ok(Some(record))
    }
}

impl Default for MqFixListParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdvisoryParser for MqFixListParser {
    async fn parse(
        &self,
        document: &str,
        context: &RequestContext,
    ) -> Result<Option<VulnerabilityRecord>, ApplicationError> {
        self.extract(document, context)
    }

    fn kind(&self) -> ParserKind {
        ParserKind::MqFixList
    }
}

/// Parser for IBM WebSphere Application Server fix-list pages
pub struct WebSphereFixListParser {
    dates: DateNormalizer,
}

impl WebSphereFixListParser {
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

        let anchor = Regex::new(&format!(r"(?i)Fix Pack {}", regex::escape(fix_version)))
            .expect("valid anchor pattern");

        // The date sits in a text node between the anchor and its table
        let release_date = text_after_text(&html, &anchor, &FIX_RELEASE_DATE)
            .and_then(|text| {
                FIX_RELEASE_DATE
                    .captures(&text)
                    .map(|caps| caps[1].trim().to_string())
            })
            .filter(|date| !date.is_empty());

        let Some(table) = element_after_text(&html, &anchor, "table") else {
            return Ok(None);
        };

        let (cves, max_cvss, max_severity) = aggregate_rows(&table, &WEBSPHERE_CVSS);
        if cves.is_empty() {
            return Ok(None);
        }

        let published = release_date
            .map(|raw| self.dates.normalize(&raw))
            .transpose()?;

        let record = VulnerabilityRecord::new(
            cves.into_iter().collect(),
            max_severity,
            (max_cvss > 0.0).then_some(max_cvss),
            published,
            "IBM".to_string(),
            context.product.clone(),
            context.base_version.clone(),
            fix_version.clone(),
            Some(fix_version.clone()),
        )?;

        Ok(Some(record))
    }
}

impl Default for WebSphereFixListParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdvisoryParser for WebSphereFixListParser {
    async fn parse(
        &self,
        document: &str,
        context: &RequestContext,
    ) -> Result<Option<VulnerabilityRecord>, ApplicationError> {
        self.extract(document, context)
    }

    fn kind(&self) -> ParserKind {
        ParserKind::WebSphereFixList
    }
}
