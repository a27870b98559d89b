// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod digest;
pub mod feed;
pub mod ingest;
pub mod metrics;
pub mod output;

// ---- Re-exports for stable public API ----
pub use crate::config::DigestConfig;
pub use crate::digest::{DateGroup, Digest};
pub use crate::feed::{parse_feed, parse_time, FeedFormat};
pub use crate::ingest::cache::{CacheRecord, FeedCache};
pub use crate::ingest::error::FeedError;
pub use crate::ingest::types::{Entry, Feed, FeedFetcher, FetchStats};

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::ingest::fetcher::HttpFetcher;
use crate::ingest::subscriptions::load_subscriptions;

/// Outcome of one full run, for the binary's summary line.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub digest: Digest,
    /// `None` when the run was rebuilt from cache without fetching.
    pub stats: Option<FetchStats>,
    pub output_path: PathBuf,
}

/// Load subscriptions and cache, fetch (unless `skip_fetch`), persist the
/// cache, and write the grouped digest.
///
/// Only a missing subscription list or an unwritable output directory fails
/// the run; everything per-feed or cache-related is logged and absorbed.
pub async fn run(config: &DigestConfig, skip_fetch: bool, now: DateTime<Utc>) -> Result<RunSummary> {
    let feeds = load_subscriptions(&config.opml_path)?;
    let cache = Arc::new(FeedCache::load(&config.cache_path));

    let (digest, stats) = if skip_fetch {
        info!(cached_feeds = cache.len(), "skipping fetch, rebuilding from cache");
        let entries = cache.all_entries();
        let digest = digest::build_digest(entries, now, config.window(), feeds.len());
        (digest, None)
    } else {
        info!(feeds = feeds.len(), "fetching subscriptions");
        let settings = config.fetch_settings();
        let fetcher =
            HttpFetcher::new(&settings, Arc::clone(&cache)).context("building HTTP client")?;
        let (digest, stats) = ingest::run_once(
            Arc::new(fetcher),
            &feeds,
            settings.concurrency,
            config.window(),
            now,
        )
        .await;

        if let Err(e) = cache.save(&config.cache_path) {
            warn!(path = %config.cache_path.display(), "cache not saved: {e:#}");
        }
        (digest, Some(stats))
    };

    let output_path = output::write_digest(&config.output_dir, &digest).await?;
    info!(
        path = %output_path.display(),
        entries = digest.entry_count,
        "digest written"
    );

    Ok(RunSummary {
        digest,
        stats,
        output_path,
    })
}
