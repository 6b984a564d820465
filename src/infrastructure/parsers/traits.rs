//! Traits and shared types for advisory parsers

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

use crate::application::errors::{ApplicationError, ConfigurationError};
use crate::domain::VulnerabilityRecord;

/// Ephemeral request data assembled by an orchestrator and handed to a
/// parser for exactly one invocation. Never shared across calls.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub product: String,
    pub base_version: String,
    pub product_fix_version: String,
    pub url: String,
    /// Release date resolved ahead of parsing, where the vendor publishes it
    /// outside the advisory document itself.
    pub release_date: Option<String>,
    pub display_name: Option<String>,
    pub source_id: Option<String>,
}

/// Closed registry of parser implementations. Configuration refers to these
/// by key; anything else is rejected when a request is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    MqFixList,
    WebSphereFixList,
    TomcatSecurityPage,
    CpuRiskMatrix,
    ReleaseNotes,
    ErrataFeed,
}

impl ParserKind {
    /// Configuration key for this parser
    pub fn key(&self) -> &'static str {
        match self {
            ParserKind::MqFixList => "ibm_mq_fix_list",
            ParserKind::WebSphereFixList => "websphere_fix_list",
            ParserKind::TomcatSecurityPage => "tomcat_security_page",
            ParserKind::CpuRiskMatrix => "cpu_risk_matrix",
            ParserKind::ReleaseNotes => "release_notes",
            ParserKind::ErrataFeed => "errata_feed",
        }
    }
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for ParserKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ibm_mq_fix_list" => Ok(ParserKind::MqFixList),
            "websphere_fix_list" => Ok(ParserKind::WebSphereFixList),
            "tomcat_security_page" => Ok(ParserKind::TomcatSecurityPage),
            "cpu_risk_matrix" => Ok(ParserKind::CpuRiskMatrix),
            "release_notes" => Ok(ParserKind::ReleaseNotes),
            "errata_feed" => Ok(ParserKind::ErrataFeed),
            _ => Err(ConfigurationError::UnknownParserKind {
                key: s.to_string(),
            }),
        }
    }
}

/// Trait for extracting one canonical record from a raw advisory document.
///
/// Parsers own the whole extraction algorithm: section location, CVE and
/// severity harvesting, aggregation. A missing section or an empty CVE set
/// is a legitimate outcome and yields `Ok(None)`, never an error.
#[async_trait]
pub trait AdvisoryParser: Send + Sync {
    /// Parse a document against the request context
    async fn parse(
        &self,
        document: &str,
        context: &RequestContext,
    ) -> Result<Option<VulnerabilityRecord>, ApplicationError>;

    /// The registry key this parser implements
    fn kind(&self) -> ParserKind;
}
