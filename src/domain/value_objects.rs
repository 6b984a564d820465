//! Domain value objects representing immutable concepts

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use super::errors::DomainError;

/// Anchored pattern a canonical CVE identifier must satisfy
static CVE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^CVE-\d{4}-\d{4,7}$").expect("valid CVE id pattern"));

/// Unanchored variant used to pull identifiers out of arbitrary row text
static CVE_EXTRACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"CVE-\d{4}-\d{4,7}").expect("valid CVE extraction pattern"));

/// Strongly-typed CVE identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CveId(String);

impl CveId {
    /// Create a new CveId with validation
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let id = id.trim().to_string();
        if !CVE_ID.is_match(&id) {
            return Err(DomainError::InvalidCveId { id });
        }
        Ok(CveId(id))
    }

    /// Extract every CVE identifier occurring in a block of text, in order
    pub fn find_all(text: &str) -> Vec<CveId> {
        CVE_EXTRACT
            .find_iter(text)
            .map(|m| CveId(m.as_str().to_string()))
            .collect()
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CveId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// CVSS scale a numeric base score belongs to. The two scales use different
/// severity ladders and must never be conflated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvssScale {
    V2,
    V3x,
}

/// Canonical severity taxonomy for vulnerability records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
    Critical,
    Unknown,
}

impl Severity {
    /// Map a CVSS base score onto the taxonomy. The v3.x scale is five
    /// levels with strict upper bounds and an explicit zero case; the v2.0
    /// scale only knows Low/Medium/High.
    pub fn from_score(score: f64, scale: CvssScale) -> Severity {
        match scale {
            CvssScale::V2 => {
                if score <= 3.9 {
                    Severity::Low
                } else if score <= 6.9 {
                    Severity::Medium
                } else {
                    Severity::High
                }
            }
            CvssScale::V3x => {
                if score == 0.0 {
                    Severity::None
                } else if score < 4.0 {
                    Severity::Low
                } else if score < 7.0 {
                    Severity::Medium
                } else if score < 9.0 {
                    Severity::High
                } else {
                    Severity::Critical
                }
            }
        }
    }

    /// Normalize a vendor severity word. Known vendor labels map onto the
    /// taxonomy; unrecognized labels pass through unchanged rather than
    /// collapsing to `Unknown`.
    pub fn normalize_label(label: &str) -> String {
        match label.trim().to_lowercase().as_str() {
            "important" => "High".to_string(),
            "moderate" => "Medium".to_string(),
            "low" => "Low".to_string(),
            "medium" => "Medium".to_string(),
            "high" => "High".to_string(),
            "critical" => "Critical".to_string(),
            _ => label.to_string(),
        }
    }

    /// Total order used to reduce a multi-CVE aggregate to one worst case
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Unknown | Severity::None => 0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::None => write!(f, "None"),
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
            Severity::Critical => write!(f, "Critical"),
            Severity::Unknown => write!(f, "Unknown"),
        }
    }
}

impl FromStr for Severity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Severity::None),
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            "unknown" => Ok(Severity::Unknown),
            _ => Err(DomainError::InvalidSeverity {
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cve_id_validation() {
        assert!(CveId::new("CVE-2024-0001").is_ok());
        assert!(CveId::new("CVE-2022-24999").is_ok());
        assert!(CveId::new("  CVE-2024-1234567  ").is_ok());

        assert!(CveId::new("CVE-24-0001").is_err());
        assert!(CveId::new("CVE-2024-123").is_err());
        assert!(CveId::new("GHSA-xxxx-xxxx-xxxx").is_err());
        assert!(CveId::new("").is_err());
    }

    #[test]
    fn test_cve_id_extraction() {
        let text = "Fixed CVE-2024-0002 and CVE-2024-0001, see advisory.";
        let found = CveId::find_all(text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].as_str(), "CVE-2024-0002");
        assert_eq!(found[1].as_str(), "CVE-2024-0001");

        assert!(CveId::find_all("no identifiers here").is_empty());
    }

    #[test]
    fn test_cve_id_ordering_is_lexicographic() {
        let mut ids = vec![
            CveId::new("CVE-2024-0002").unwrap(),
            CveId::new("CVE-2023-9999").unwrap(),
            CveId::new("CVE-2024-0001").unwrap(),
        ];
        ids.sort();
        let strings: Vec<&str> = ids.iter().map(|c| c.as_str()).collect();
        assert_eq!(
            strings,
            vec!["CVE-2023-9999", "CVE-2024-0001", "CVE-2024-0002"]
        );
    }

    #[test]
    fn test_score_mapping_v3x() {
        assert_eq!(Severity::from_score(0.0, CvssScale::V3x), Severity::None);
        assert_eq!(Severity::from_score(3.9, CvssScale::V3x), Severity::Low);
        assert_eq!(Severity::from_score(4.0, CvssScale::V3x), Severity::Medium);
        assert_eq!(Severity::from_score(6.9, CvssScale::V3x), Severity::Medium);
        assert_eq!(Severity::from_score(7.0, CvssScale::V3x), Severity::High);
        assert_eq!(Severity::from_score(7.5, CvssScale::V3x), Severity::High);
        assert_eq!(Severity::from_score(8.9, CvssScale::V3x), Severity::High);
        assert_eq!(
            Severity::from_score(9.0, CvssScale::V3x),
            Severity::Critical
        );
        assert_eq!(
            Severity::from_score(9.8, CvssScale::V3x),
            Severity::Critical
        );
    }

    #[test]
    fn test_score_mapping_v2_is_three_levels() {
        assert_eq!(Severity::from_score(0.0, CvssScale::V2), Severity::Low);
        assert_eq!(Severity::from_score(3.9, CvssScale::V2), Severity::Low);
        assert_eq!(Severity::from_score(6.9, CvssScale::V2), Severity::Medium);
        assert_eq!(Severity::from_score(9.8, CvssScale::V2), Severity::High);
    }

    #[test]
    fn test_label_normalization() {
        assert_eq!(Severity::normalize_label("important"), "High");
        assert_eq!(Severity::normalize_label("Important"), "High");
        assert_eq!(Severity::normalize_label("moderate"), "Medium");
        assert_eq!(Severity::normalize_label("CRITICAL"), "Critical");
        assert_eq!(Severity::normalize_label("low"), "Low");

        // Unrecognized labels pass through untouched
        assert_eq!(Severity::normalize_label("Negligible"), "Negligible");
    }

    #[test]
    fn test_severity_ranking() {
        assert!(Severity::Critical.rank() > Severity::High.rank());
        assert!(Severity::High.rank() > Severity::Medium.rank());
        assert!(Severity::Medium.rank() > Severity::Low.rank());
        assert!(Severity::Low.rank() > Severity::Unknown.rank());
        assert_eq!(Severity::None.rank(), Severity::Unknown.rank());
    }

    #[test]
    fn test_severity_round_trip() {
        for severity in [
            Severity::None,
            Severity::Low,
            Severity::Medium,
            Severity::High,
            Severity::Critical,
            Severity::Unknown,
        ] {
            let parsed: Severity = severity.to_string().parse().unwrap();
            assert_eq!(parsed, severity);
        }
        assert!("Important".parse::<Severity>().is_err());
    }
}
