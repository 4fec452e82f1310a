//! Fetching history from the q-explore server

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::history::{HistoryStore, ImportReport};

/// Body of `GET /api/history`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryListResponse {
    pub entries: Vec<Value>,
    pub count: usize,
}

/// Somewhere server-side history records can be fetched from
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Raw records, left undecoded so each can be validated individually
    async fn fetch_history(&self) -> Result<Vec<Value>>;
}

/// [`HistorySource`] backed by the server's HTTP API
#[derive(Clone)]
pub struct HttpHistorySource {
    base_url: String,
    client: Client,
}

impl HttpHistorySource {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Build a source with the configured URL and timeout
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::new(config.server_url.clone(), client))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl HistorySource for HttpHistorySource {
    async fn fetch_history(&self) -> Result<Vec<Value>> {
        let url = format!("{}/api/history", self.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::Remote(format!(
                "History request failed: {} - {}",
                status, text
            )));
        }

        let listing: HistoryListResponse = serde_json::from_str(&text)
            .map_err(|e| Error::Remote(format!("Failed to parse history listing: {}", e)))?;
        if listing.count != listing.entries.len() {
            tracing::debug!(
                count = listing.count,
                entries = listing.entries.len(),
                "History listing count disagrees with entries"
            );
        }
        Ok(listing.entries)
    }
}

/// Fetch remote history and merge it into `store`.
///
/// The store is only touched after the fetch has completed, so a failed or
/// abandoned fetch leaves it unchanged.
pub async fn merge_from_source(
    store: &mut HistoryStore,
    source: &dyn HistorySource,
) -> Result<ImportReport> {
    let remote = source.fetch_history().await?;
    tracing::info!(fetched = remote.len(), "Fetched server history");
    store.merge_import(&remote)
}
