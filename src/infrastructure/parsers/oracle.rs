//! Oracle Critical Patch Update risk-matrix parser
//!
//! A CPU advisory is a sequence of per-product risk-matrix tables preceded
//! by an index table. Rows name the CVE in a `<th>` cell; the CVSS base
//! score and the affected-version list live in fixed `<td>` positions.
//! Oracle Database advisories are located by their "Risk Matrix" heading
//! and every row of those tables applies; other products are matched per
//! row through a comma-split cell membership test.

use async_trait::async_trait;
use scraper::{ElementRef, Html};
use std::collections::BTreeSet;

use super::html::{collapsed_text, elements_after, selector};
use super::traits::{AdvisoryParser, ParserKind, RequestContext};
use crate::application::errors::ApplicationError;
use crate::domain::{CveId, CvssScale, DateNormalizer, Severity, VersionMatcher, VulnerabilityRecord};

/// Column positions inside a risk-matrix row, counted over `<td>` cells
const CVSS_COLUMN: usize = 4;

/// Parser for Oracle CPU risk-matrix advisories
pub struct CpuRiskMatrixParser {
    matcher: VersionMatcher,
    dates: DateNormalizer,
}

impl CpuRiskMatrixParser {
    pub fn new() -> Self {
        Self {
            matcher: VersionMatcher::new(),
            dates: DateNormalizer::new(),
        }
    }

    /// Membership test over comma-separated product cells
    fn row_matches_product(&self, row: &ElementRef, product: &str) -> bool {
        let cell_sel = selector("td");
        for cell in row.select(&cell_sel) {
            let text = collapsed_text(&cell).to_lowercase();
            if text.split(',').map(str::trim).any(|entry| entry == product) {
                return true;
            }
        }
        false
    }

    fn extract(
        &self,
        document: &str,
        context: &RequestContext,
    ) -> Result<Option<VulnerabilityRecord>, ApplicationError> {
        let html = Html::parse_document(document);
        let product = context.product.to_lowercase();
        let base_version = &context.base_version;

        // Oracle Database tables are matched wholesale once located
        let special = product.contains("oracle database");

        let tbodies: Vec<ElementRef> = if special {
            let title = format!("{} risk matrix", product);
            let h4_sel = selector("h4");
            let Some(heading) = html
                .select(&h4_sel)
                .find(|h| collapsed_text(h).to_lowercase() == title)
            else {
                return Ok(None);
            };
            let following = elements_after(&html, &heading, "tbody");
            if following.is_empty() {
                return Ok(None);
            }
            following
        } else {
            let tbody_sel = selector("tbody");
            let all: Vec<ElementRef> = html.select(&tbody_sel).collect();
            // The first tbody is the advisory index, not a risk matrix
            if all.len() < 2 {
                return Ok(None);
            }
            all[1..].to_vec()
        };

        let row_sel = selector("tr");
        let th_sel = selector("th");
        let td_sel = selector("td");

        let mut cves = BTreeSet::new();
        let mut max_cvss = 0.0f64;

        for tbody in &tbodies {
            // One product lives in one table; stop once a table scored
            if max_cvss > 0.0 {
                break;
            }
            for row in tbody.select(&row_sel) {
                if !(special || self.row_matches_product(&row, &product)) {
                    continue;
                }
                let Some(id_cell) = row.select(&th_sel).next() else {
                    continue;
                };
                let found = CveId::find_all(&collapsed_text(&id_cell));
                if found.is_empty() {
                    continue;
                }

                let cells: Vec<String> =
                    row.select(&td_sel).map(|c| collapsed_text(&c)).collect();
                if cells.len() <= CVSS_COLUMN {
                    continue;
                }

                let affected = self
                    .matcher
                    .component_version(&product, &cells[cells.len() - 2])?;
                if !self.matcher.any_matches(&affected, base_version) {
                    continue;
                }

                cves.extend(found);
                if let Ok(score) = cells[CVSS_COLUMN].parse::<f64>() {
                    if score > max_cvss {
                        max_cvss = score;
                    }
                }
            }
        }

        if cves.is_empty() {
            return Ok(None);
        }

        let severity = Severity::from_score(max_cvss, CvssScale::V3x);
        let published = context
            .release_date
            .as_deref()
            .map(|raw| self.dates.normalize(raw))
            .transpose()?;

        let record = VulnerabilityRecord::new(
            cves.into_iter().collect(),
            severity,
            (max_cvss > 0.0).then_some(max_cvss),
            published,
            "Oracle".to_string(),
            context
                .display_name
                .clone()
                .unwrap_or_else(|| context.product.clone()),
            context.base_version.clone(),
            context.product_fix_version.clone(),
            context.source_id.clone(),
        )?;

        Ok(Some(record))
    }
}

impl Default for CpuRiskMatrixParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdvisoryParser for CpuRiskMatrixParser {
    async fn parse(
        &self,
        document: &str,
        context: &RequestContext,
    ) -> Result<Option<VulnerabilityRecord>, ApplicationError> {
        self.extract(document, context)
    }

    fn kind(&self) -> ParserKind {
        ParserKind::CpuRiskMatrix
    }
}
