//! HTTP document fetching
//!
//! The engine never talks to the network directly; everything goes through
//! the `DocumentFetcher` seam so parsers and orchestrators stay testable
//! against canned documents. Transport failures always surface as errors:
//! they are never folded into an empty extraction result.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the fetch collaborator
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error {status} fetching {url}")]
    Http { status: u16, url: String },
}

/// Trait for fetching raw advisory documents
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch a URL and return the response body as text
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Blocking-per-request HTTP fetcher with a client-level timeout
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a new fetcher with the given request timeout
    pub fn new(timeout_seconds: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(concat!("advisora-rust/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        tracing::debug!(url, "fetching document");

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Http {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}
