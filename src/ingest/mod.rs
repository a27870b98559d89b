// src/ingest/mod.rs
pub mod cache;
pub mod error;
pub mod fetcher;
pub mod subscriptions;
pub mod types;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};

use crate::digest::{build_digest, Digest};
use crate::ingest::types::{Entry, Feed, FeedFetcher, FetchFailure, FetchStats};

/// Fetch every feed with at most `concurrency` requests in flight.
///
/// Feeds past the ceiling wait for a free slot. A failing feed is counted and
/// logged; it never cancels or delays the others. Returns once every
/// dispatched fetch has finished. Entry order across feeds follows
/// completion order and carries no meaning.
pub async fn fetch_all(
    fetcher: Arc<dyn FeedFetcher>,
    feeds: &[Feed],
    concurrency: usize,
) -> (Vec<Entry>, FetchStats) {
    crate::metrics::ensure_metrics_described();

    let slots = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    // Task id -> feed, so a panicked task can still be attributed.
    let mut in_flight: HashMap<task::Id, Feed> = HashMap::with_capacity(feeds.len());

    for feed in feeds.iter().cloned() {
        // The semaphore is never closed, so acquisition only waits.
        let Ok(permit) = Arc::clone(&slots).acquire_owned().await else {
            break;
        };
        let fetcher = Arc::clone(&fetcher);
        let task_feed = feed.clone();
        let handle = tasks.spawn(async move {
            let result = fetcher.fetch(&task_feed).await;
            drop(permit);
            result
        });
        in_flight.insert(handle.id(), feed);
    }

    let mut stats = FetchStats {
        total: feeds.len(),
        ..Default::default()
    };
    let mut entries = Vec::new();

    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((id, Ok(mut fetched))) => {
                in_flight.remove(&id);
                stats.success += 1;
                counter!("feed_fetch_total", "outcome" => "ok").increment(1);
                entries.append(&mut fetched);
            }
            Ok((id, Err(e))) => {
                let feed = in_flight.remove(&id).unwrap_or_else(unknown_feed);
                stats.failed += 1;
                counter!("feed_fetch_total", "outcome" => "failed").increment(1);
                tracing::warn!(
                    feed = %feed.title,
                    url = %feed.feed_url,
                    kind = e.kind(),
                    error = %e,
                    "feed fetch failed"
                );
                stats.failures.push(FetchFailure {
                    title: feed.title,
                    feed_url: feed.feed_url,
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                let feed = in_flight.remove(&e.id()).unwrap_or_else(unknown_feed);
                stats.failed += 1;
                counter!("feed_fetch_total", "outcome" => "failed").increment(1);
                tracing::error!(
                    feed = %feed.title,
                    url = %feed.feed_url,
                    error = %e,
                    "fetch task aborted"
                );
                stats.failures.push(FetchFailure {
                    title: feed.title,
                    feed_url: feed.feed_url,
                    reason: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        total = stats.total,
        ok = stats.success,
        failed = stats.failed,
        entries = entries.len(),
        "fetch run finished"
    );
    (entries, stats)
}

// Every spawned id is recorded before it can be joined.
fn unknown_feed() -> Feed {
    Feed::new("", "", "")
}

/// Fetch everything and reduce it to a grouped digest.
pub async fn run_once(
    fetcher: Arc<dyn FeedFetcher>,
    feeds: &[Feed],
    concurrency: usize,
    window: Duration,
    now: DateTime<Utc>,
) -> (Digest, FetchStats) {
    let (entries, stats) = fetch_all(fetcher, feeds, concurrency).await;
    let digest = build_digest(entries, now, window, feeds.len());
    (digest, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::error::FeedError;

    struct Fixed;

    #[async_trait::async_trait]
    impl FeedFetcher for Fixed {
        async fn fetch(&self, feed: &Feed) -> Result<Vec<Entry>, FeedError> {
            if feed.feed_url.contains("broken") {
                return Err(FeedError::Status(500));
            }
            if feed.feed_url.contains("panics") {
                panic!("fetcher bug");
            }
            Ok(vec![Entry {
                source_name: feed.title.clone(),
                source_url: feed.site_url.clone(),
                title: "post".into(),
                url: format!("{}/post", feed.site_url),
                published: None,
            }])
        }
    }

    #[tokio::test]
    async fn stats_count_every_feed_once() {
        let feeds = vec![
            Feed::new("A", "https://a.test/feed", "https://a.test"),
            Feed::new("B", "https://broken.test/feed", "https://b.test"),
            Feed::new("C", "https://c.test/feed", "https://c.test"),
        ];
        let (entries, stats) = fetch_all(Arc::new(Fixed), &feeds, 2).await;
        assert_eq!(entries.len(), 2);
        assert_eq!((stats.total, stats.success, stats.failed), (3, 2, 1));
        assert_eq!(stats.failures[0].title, "B");
        assert_eq!(stats.failures[0].reason, "HTTP 500");
    }

    #[tokio::test]
    async fn zero_concurrency_still_makes_progress() {
        let feeds = vec![Feed::new("A", "https://a.test/feed", "https://a.test")];
        let (_, stats) = fetch_all(Arc::new(Fixed), &feeds, 0).await;
        assert_eq!(stats.success, 1);
    }

    #[tokio::test]
    async fn panicked_fetch_keeps_its_feed_identity() {
        let feeds = vec![
            Feed::new("A", "https://a.test/feed", "https://a.test"),
            Feed::new("Buggy", "https://panics.test/feed", "https://panics.test"),
        ];
        let (entries, stats) = fetch_all(Arc::new(Fixed), &feeds, 2).await;
        assert_eq!(entries.len(), 1);
        assert_eq!((stats.success, stats.failed), (1, 1));
        assert_eq!(stats.failures[0].title, "Buggy");
        assert_eq!(stats.failures[0].feed_url, "https://panics.test/feed");
    }
}
