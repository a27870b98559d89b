//! # Digest
//! Turns the merged entry list into the chronologically grouped result set.
//!
//! Steps, in order:
//! 1. keep entries published strictly after `now - window` (undated never pass),
//! 2. drop repeated URLs (trimmed, trailing `/` ignored), first seen wins,
//! 3. sort newest first, stable for equal instants,
//! 4. bucket by UTC calendar day, most recent day first.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use metrics::counter;
use serde::Serialize;

use crate::ingest::types::Entry;

pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Entries sharing one UTC publication day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateGroup {
    /// `None` only for undated entries, which the window filter normally removes.
    pub date: Option<NaiveDate>,
    pub label: String,
    pub entries: Vec<Entry>,
}

/// Everything the renderer needs for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Digest {
    pub built_at: DateTime<Utc>,
    pub feed_count: usize,
    pub entry_count: usize,
    pub groups: Vec<DateGroup>,
}

/// Filter, dedup, sort and group with the default seven-day window.
pub fn process(entries: Vec<Entry>, now: DateTime<Utc>) -> Vec<DateGroup> {
    process_with_window(entries, now, Duration::days(DEFAULT_WINDOW_DAYS))
}

pub fn process_with_window(
    entries: Vec<Entry>,
    now: DateTime<Utc>,
    window: Duration,
) -> Vec<DateGroup> {
    crate::metrics::ensure_metrics_described();

    let before = entries.len();
    let recent = filter_recent(entries, now - window);
    counter!("digest_window_dropped_total").increment((before - recent.len()) as u64);

    let before = recent.len();
    let mut unique = dedup_by_url(recent);
    counter!("digest_dedup_total").increment((before - unique.len()) as u64);

    sort_newest_first(&mut unique);
    group_by_day(unique)
}

pub fn build_digest(
    entries: Vec<Entry>,
    now: DateTime<Utc>,
    window: Duration,
    feed_count: usize,
) -> Digest {
    let groups = process_with_window(entries, now, window);
    let entry_count = groups.iter().map(|g| g.entries.len()).sum();
    tracing::info!(entries = entry_count, days = groups.len(), "digest built");
    Digest {
        built_at: now,
        feed_count,
        entry_count,
        groups,
    }
}

pub fn filter_recent(entries: Vec<Entry>, cutoff: DateTime<Utc>) -> Vec<Entry> {
    entries
        .into_iter()
        .filter(|e| e.published.is_some_and(|p| p > cutoff))
        .collect()
}

/// Dedup key: surrounding whitespace and trailing slashes removed.
pub fn normalize_url(url: &str) -> &str {
    url.trim().trim_end_matches('/')
}

pub fn dedup_by_url(entries: Vec<Entry>) -> Vec<Entry> {
    let mut seen: HashSet<String> = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(normalize_url(&e.url).to_string()))
        .collect()
}

/// Most recent first; undated last. `sort_by` is stable.
pub fn sort_newest_first(entries: &mut [Entry]) {
    entries.sort_by(|a, b| b.published.cmp(&a.published));
}

/// Bucket by UTC day. Groups appear in the order of their first member and
/// keep the relative order of their entries.
pub fn group_by_day(entries: Vec<Entry>) -> Vec<DateGroup> {
    let mut groups: Vec<DateGroup> = Vec::new();
    let mut index: HashMap<Option<NaiveDate>, usize> = HashMap::new();

    for e in entries {
        let day = e.published.map(|p| p.date_naive());
        let i = *index.entry(day).or_insert_with(|| {
            groups.push(DateGroup {
                date: day,
                label: day_label(day),
                entries: Vec::new(),
            });
            groups.len() - 1
        });
        groups[i].entries.push(e);
    }
    groups
}

/// "Wednesday, January 10, 2024".
pub fn day_label(day: Option<NaiveDate>) -> String {
    match day {
        Some(d) => d.format("%A, %B %-d, %Y").to_string(),
        None => "Undated".to_string(),
    }
}
