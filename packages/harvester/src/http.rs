//! HTTP fetching of portal pages and dataset payloads.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde_json::Value;

use crate::config::{HTML_TIMEOUT_SECS, JSON_TIMEOUT_SECS};
use crate::error::{HarvesterError, Result};

/// User agent string identifying this harvester.
const USER_AGENT: &str = concat!("dados-abertos-harvester/", env!("CARGO_PKG_VERSION"));

/// Source of HTML pages and JSON payloads.
///
/// Requests are never retried; the first failure is returned as is.
pub trait Fetcher {
    /// GET a page and return its body as text.
    fn fetch_text(&self, url: &str) -> Result<String>;

    /// GET a document and parse its body as JSON.
    fn fetch_json(&self, url: &str) -> Result<Value>;
}

/// Create a configured HTTP client.
pub fn create_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(HarvesterError::Client)
}

/// [`Fetcher`] backed by a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    html_timeout: Duration,
    json_timeout: Duration,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Ok(Self::with_client(create_client()?))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            html_timeout: Duration::from_secs(HTML_TIMEOUT_SECS),
            json_timeout: Duration::from_secs(JSON_TIMEOUT_SECS),
        }
    }

    pub fn with_timeouts(mut self, html_timeout: Duration, json_timeout: Duration) -> Self {
        self.html_timeout = html_timeout;
        self.json_timeout = json_timeout;
        self
    }

    fn get(&self, url: &str, timeout: Duration) -> Result<Response> {
        tracing::debug!(url, timeout_secs = timeout.as_secs(), "GET");

        let fetch_error = |source| HarvesterError::Fetch {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(fetch_error)?;

        tracing::debug!(url, status = %response.status(), "Response received");
        response.error_for_status().map_err(fetch_error)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_text(&self, url: &str) -> Result<String> {
        self.get(url, self.html_timeout)?
            .text()
            .map_err(|source| HarvesterError::Fetch {
                url: url.to_string(),
                source,
            })
    }

    fn fetch_json(&self, url: &str) -> Result<Value> {
        let bytes = self
            .get(url, self.json_timeout)?
            .bytes()
            .map_err(|source| HarvesterError::Fetch {
                url: url.to_string(),
                source,
            })?;

        serde_json::from_slice(&bytes).map_err(|source| HarvesterError::Parse {
            url: url.to_string(),
            source,
        })
    }
}
