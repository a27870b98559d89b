use std::path::Path;

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series carry descriptions when scraped).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(describe_all);
}

fn describe_all() {
    describe_counter!(
        "feed_fetch_total",
        "Feed fetch outcomes, labelled ok / failed."
    );
    describe_counter!(
        "feed_not_modified_total",
        "Fetches answered 304 and served from the cache."
    );
    describe_counter!(
        "feed_items_skipped_total",
        "Feed items dropped because they carried no usable link."
    );
    describe_counter!(
        "feed_items_undated_total",
        "Entries kept without a parseable timestamp."
    );
    describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
    describe_histogram!("feed_fetch_ms", "Feed request time in milliseconds.");
    describe_counter!(
        "digest_window_dropped_total",
        "Entries dropped for falling outside the recency window."
    );
    describe_counter!(
        "digest_dedup_total",
        "Entries dropped as duplicates by normalized URL."
    );
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder for this process.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        describe_all();
        Ok(Self { handle })
    }

    /// Prometheus exposition text for everything recorded so far.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    pub fn write_snapshot(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating metrics dir {}", dir.display()))?;
        }
        std::fs::write(path, self.render())
            .with_context(|| format!("writing metrics to {}", path.display()))
    }
}
