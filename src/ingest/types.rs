// src/ingest/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::error::FeedError;

/// A subscribed feed. `feed_url` is the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Feed {
    pub title: String,
    pub feed_url: String,
    pub site_url: String,
}

impl Feed {
    pub fn new(
        title: impl Into<String>,
        feed_url: impl Into<String>,
        site_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            feed_url: feed_url.into(),
            site_url: site_url.into(),
        }
    }
}

/// One normalized article extracted from a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub source_name: String,
    pub source_url: String,
    pub title: String,
    pub url: String,
    /// `None` when the feed carried no usable date; sorts as oldest.
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
}

/// Anything that can turn a feed into entries. The HTTP fetcher is the real
/// implementation; tests plug in stubs.
#[async_trait::async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, feed: &Feed) -> Result<Vec<Entry>, FeedError>;
}

/// A feed that failed this run, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub title: String,
    pub feed_url: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub failures: Vec<FetchFailure>,
}
