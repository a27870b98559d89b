// src/ingest/fetcher.rs
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::header::{HeaderMap, HeaderName, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::StatusCode;

use crate::feed::parse_feed_detailed;
use crate::ingest::cache::{CacheRecord, FeedCache};
use crate::ingest::error::FeedError;
use crate::ingest::types::{Entry, Feed, FeedFetcher};

pub const DEFAULT_USER_AGENT: &str = "EngBlogs/1.0 (+https://engineeringblogs.xyz)";
pub const DEFAULT_CONCURRENCY: usize = 30;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub user_agent: String,
    /// Maximum in-flight fetches; `run` hands it to the orchestrator.
    pub concurrency: usize,
    pub connect_timeout: Duration,
    /// Added to `connect_timeout` to form the whole-request budget.
    pub read_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// Conditional GET against the feed URL, one attempt, cache-aware.
pub struct HttpFetcher {
    client: reqwest::Client,
    cache: Arc<FeedCache>,
}

impl HttpFetcher {
    pub fn new(settings: &FetchSettings, cache: Arc<FeedCache>) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.connect_timeout + settings.read_timeout)
            .build()?;
        Ok(Self { client, cache })
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, feed: &Feed) -> Result<Vec<Entry>, FeedError> {
        let validators = self.cache.validators(&feed.feed_url);

        let mut req = self.client.get(&feed.feed_url);
        if let Some(tag) = validators.etag.as_deref() {
            req = req.header(IF_NONE_MATCH, tag);
        }
        if let Some(since) = validators.last_modified.as_deref() {
            req = req.header(IF_MODIFIED_SINCE, since);
        }

        let t0 = Instant::now();
        let resp = req.send().await?;
        let status = resp.status();

        if status == StatusCode::NOT_MODIFIED {
            histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
            counter!("feed_not_modified_total").increment(1);
            tracing::debug!(feed = %feed.title, "not modified, reusing cached entries");
            return Ok(self
                .cache
                .get(&feed.feed_url)
                .map(|r| r.entries)
                .unwrap_or_default());
        }
        if status != StatusCode::OK {
            return Err(FeedError::Status(status.as_u16()));
        }

        let etag = header_string(resp.headers(), ETAG);
        let last_modified = header_string(resp.headers(), LAST_MODIFIED);
        let body = resp.bytes().await?;
        histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let parsed = parse_feed_detailed(&body, feed)?;
        tracing::debug!(
            feed = %feed.title,
            format = ?parsed.format,
            entries = parsed.entries.len(),
            "feed parsed"
        );

        self.cache.put(
            &feed.feed_url,
            CacheRecord {
                etag,
                last_modified,
                entries: parsed.entries.clone(),
            },
        );
        Ok(parsed.entries)
    }
}

fn header_string(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
