use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::types::RawDrawRecord;

/// Where raw draw records come from. `DrawFeedClient` in production.
#[async_trait]
pub trait DrawSource: Send + Sync {
    /// At most `max_count` records, in upstream order (most-recent-first).
    async fn fetch(&self, max_count: usize) -> Result<Vec<RawDrawRecord>>;
}

/// Fetches the Express Entry rounds document over HTTP.
/// One attempt per call; callers decide whether to retry.
pub struct DrawFeedClient {
    client: reqwest::Client,
    url: String,
}

impl DrawFeedClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.feed_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: cfg.draws_url.clone(),
        })
    }
}

#[async_trait]
impl DrawSource for DrawFeedClient {
    async fn fetch(&self, max_count: usize) -> Result<Vec<RawDrawRecord>> {
        debug!(url = %self.url, max_count, "[FEED] requesting draws document");

        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(feed_error)?
            .error_for_status()
            .map_err(feed_error)?;

        let doc: serde_json::Value = resp.json().await.map_err(feed_error)?;
        let rounds = extract_rounds(doc, max_count)?;

        info!(records = rounds.len(), max_count, "[FEED] fetched {} draw records", rounds.len());
        Ok(rounds)
    }
}

/// Pull the top-level `rounds` array out of the feed document and keep the
/// first `max_count` entries.
pub fn extract_rounds(doc: serde_json::Value, max_count: usize) -> Result<Vec<RawDrawRecord>> {
    let serde_json::Value::Object(mut root) = doc else {
        return Err(AppError::FeedUnavailable(
            "draws document was not a JSON object".to_string(),
        ));
    };

    let Some(serde_json::Value::Array(rounds)) = root.remove("rounds") else {
        return Err(AppError::FeedUnavailable(
            "draws document has no `rounds` array".to_string(),
        ));
    };

    Ok(rounds
        .into_iter()
        .take(max_count)
        .map(RawDrawRecord)
        .collect())
}

fn feed_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::FeedUnavailable(format!("request timed out: {e}"))
    } else {
        AppError::FeedUnavailable(e.to_string())
    }
}
