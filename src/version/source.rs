//! Upstream feed adapter: fetches raw release/tag records over HTTP

#[cfg(test)]
use mockall::automock;

use serde::Deserialize;
use tracing::warn;

use crate::config::{FETCH_TIMEOUT_SECS, USER_AGENT};
use crate::ecosystem::FeedKind;
use crate::version::error::SourceError;
use crate::version::types::ReleaseRecord;

/// Trait for fetching raw release/tag records from an upstream feed.
///
/// Any failure (transport error or a non-2xx status) surfaces as a
/// [`SourceError`]; callers always keep a fallback path and never depend on
/// this adapter alone to produce a version. Retries do not live here.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetches all records published at `url`
    ///
    /// # Arguments
    /// * `url` - The feed endpoint for one ecosystem component
    /// * `kind` - Whether the endpoint is a releases or a tags feed
    ///
    /// # Returns
    /// * `Ok(Vec<ReleaseRecord>)` - Raw records in upstream order
    /// * `Err(SourceError)` - If the fetch fails for any reason
    async fn fetch(&self, url: &str, kind: FeedKind) -> Result<Vec<ReleaseRecord>, SourceError>;
}

/// Entry shape of a GitHub releases feed
#[derive(Debug, Deserialize)]
struct ReleaseEntry {
    tag_name: String,
    #[serde(default)]
    prerelease: bool,
    #[serde(default)]
    draft: bool,
}

/// Entry shape of a GitHub tags feed
#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Feed adapter for the GitHub releases and tags APIs
pub struct GithubSource {
    client: reqwest::Client,
}

impl GithubSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(std::time::Duration::from_secs(FETCH_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }
}

impl Default for GithubSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ReleaseSource for GithubSource {
    async fn fetch(&self, url: &str, kind: FeedKind) -> Result<Vec<ReleaseRecord>, SourceError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("upstream feed returned status {}: {}", status, url);
            return Err(SourceError::Status(status));
        }

        let records = match kind {
            FeedKind::Releases => {
                let entries: Vec<ReleaseEntry> = response.json().await.map_err(|e| {
                    warn!("failed to parse releases feed {}: {}", url, e);
                    SourceError::InvalidResponse(e.to_string())
                })?;
                entries
                    .into_iter()
                    .map(|entry| ReleaseRecord {
                        tag: entry.tag_name,
                        prerelease: entry.prerelease,
                        draft: entry.draft,
                    })
                    .collect()
            }
            FeedKind::Tags => {
                let entries: Vec<TagEntry> = response.json().await.map_err(|e| {
                    warn!("failed to parse tags feed {}: {}", url, e);
                    SourceError::InvalidResponse(e.to_string())
                })?;
                entries
                    .into_iter()
                    .map(|entry| ReleaseRecord::stable(&entry.name))
                    .collect()
            }
        };

        Ok(records)
    }
}
