//! engblogs binary entrypoint.
//! Loads config, fetches every subscribed feed, and writes the grouped digest.
//!
//! Flags:
//!   --skip-fetch   rebuild from the cache only (also ENGBLOGS_SKIP_FETCH=1)

use anyhow::Result;
use chrono::Utc;
use engblogs::{metrics::Metrics, DigestConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("engblogs=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn skip_fetch_requested() -> bool {
    std::env::args().skip(1).any(|a| a == "--skip-fetch")
        || std::env::var("ENGBLOGS_SKIP_FETCH")
            .ok()
            .is_some_and(|v| v == "1")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = DigestConfig::load_default()?;
    let metrics = match &config.metrics_path {
        Some(_) => Some(Metrics::init()?),
        None => None,
    };

    let summary = engblogs::run(&config, skip_fetch_requested(), Utc::now()).await?;

    if let Some(stats) = &summary.stats {
        tracing::info!(
            total = stats.total,
            ok = stats.success,
            failed = stats.failed,
            "feeds"
        );
    }
    tracing::info!(
        entries = summary.digest.entry_count,
        window_days = config.window_days,
        path = %summary.output_path.display(),
        "built digest successfully"
    );

    if let (Some(m), Some(path)) = (&metrics, &config.metrics_path) {
        if let Err(e) = m.write_snapshot(path) {
            tracing::warn!("metrics snapshot: {e:#}");
        }
    }
    Ok(())
}
