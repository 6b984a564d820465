//! Domain services containing shared normalization logic
//!
//! These are the leaf components every parser family leans on: calendar-date
//! normalization and affected-version matching. They hold no state and no
//! I/O; parsers stay independently testable because of that.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

use super::errors::DomainError;

/// Disambiguation hint for purely numeric dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOrder {
    DayFirst,
    MonthFirst,
}

static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})$").expect("valid numeric date pattern")
});

static ORDINAL_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,2})(?:st|nd|rd|th)\b").expect("valid ordinal suffix pattern")
});

/// Textual date formats accepted by the flexible pass, tried in order
const TEXTUAL_FORMATS: &[&str] = &[
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%d %B, %Y",
    "%Y-%B-%d",
    "%d-%B-%Y",
];

/// Service converting heterogeneous date representations to calendar dates
pub struct DateNormalizer;

impl DateNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a date string without a day-order hint. Purely numeric
    /// dates are rejected as ambiguous here; the order of day and month in
    /// them is never guessed.
    pub fn normalize(&self, input: &str) -> Result<NaiveDate, DomainError> {
        self.normalize_with_hint(input, None)
    }

    /// Normalize a date string, using `hint` to resolve numeric forms
    pub fn normalize_with_hint(
        &self,
        input: &str,
        hint: Option<DayOrder>,
    ) -> Result<NaiveDate, DomainError> {
        let input = input.trim();

        // Already canonical
        if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
            return Ok(date);
        }

        if let Some(caps) = NUMERIC_DATE.captures(input) {
            let first: u32 = caps[1].parse().unwrap_or(0);
            let second: u32 = caps[2].parse().unwrap_or(0);
            let year: i32 = caps[3].parse().unwrap_or(0);
            let year = if year < 100 { 2000 + year } else { year };

            let (day, month) = match hint {
                Some(DayOrder::DayFirst) => (first, second),
                Some(DayOrder::MonthFirst) => (second, first),
                None => {
                    return Err(DomainError::AmbiguousDate {
                        input: input.to_string(),
                    });
                }
            };

            return NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
                DomainError::DateFormat {
                    input: input.to_string(),
                }
            });
        }

        self.parse_flexible(input)
            .ok_or_else(|| DomainError::DateFormat {
                input: input.to_string(),
            })
    }

    /// Month-name forms, ordinal days and timestamped variants
    fn parse_flexible(&self, input: &str) -> Option<NaiveDate> {
        let cleaned = ORDINAL_SUFFIX.replace_all(input, "$1");
        let cleaned = cleaned.trim();

        for format in TEXTUAL_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(cleaned, format) {
                return Some(date);
            }
        }

        if let Ok(datetime) = DateTime::parse_from_rfc3339(input) {
            return Some(datetime.date_naive());
        }
        for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(input, format) {
                return Some(datetime.date());
            }
        }

        None
    }
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Service deciding whether an affected-version string corresponds to a
/// requested base version.
///
/// Containment is a literal prefix match, not a semantic version
/// comparison: a request for "1" will also match "10.x". That imprecision
/// is inherited behavior and deliberately left untouched.
pub struct VersionMatcher;

impl VersionMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Literal prefix containment of one affected-version string
    pub fn matches_base(&self, affected: &str, base_version: &str) -> bool {
        affected.trim_start().starts_with(base_version)
    }

    /// Comma-delimited lists of applicable versions are tried individually;
    /// any element matching counts as a match.
    pub fn any_matches(&self, cell: &str, base_version: &str) -> bool {
        cell.split(", ")
            .any(|version| self.matches_base(version, base_version))
    }

    /// Resolve a possibly component-qualified affected-version cell.
    ///
    /// Multi-component products publish cells like
    /// `"Oracle Java SE: 8u381; Oracle GraalVM: 21.3"`; the component whose
    /// name prefix-matches the requested product wins and its value after
    /// the `": "` separator is returned. Cells without components (or with
    /// no matching component) pass through unchanged.
    pub fn component_version(&self, product: &str, cell: &str) -> Result<String, DomainError> {
        if cell.contains(';') {
            let needle = product.to_lowercase();
            for item in cell.split(';') {
                let item = item.trim();
                if item.to_lowercase().starts_with(&needle) {
                    let parts: Vec<&str> = item.split(": ").collect();
                    if parts.len() != 2 {
                        return Err(DomainError::MalformedComponent {
                            value: item.to_string(),
                        });
                    }
                    return Ok(parts[1].to_string());
                }
            }
        }
        Ok(cell.to_string())
    }
}

impl Default for VersionMatcher {
    fn default() -> Self {
        Self::new()
    }
}
