// src/ingest/cache.rs
//! Conditional-request cache: validators and last-known entries per feed URL.
//!
//! Loaded wholesale at startup and saved wholesale at shutdown. During a run
//! every fetch task reads and writes it through one mutex; critical sections
//! cover only the map access, never a network call.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ingest::types::Entry;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

/// Request preconditions taken from a cached record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validators {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

#[derive(Debug, Default)]
pub struct FeedCache {
    inner: Mutex<HashMap<String, CacheRecord>>,
}

impl FeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: HashMap<String, CacheRecord>) -> Self {
        Self {
            inner: Mutex::new(records),
        }
    }

    /// Load from disk. A missing or unreadable store degrades to empty.
    pub fn load(path: &Path) -> Self {
        let data = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "no cache file, starting empty");
                return Self::new();
            }
        };
        match serde_json::from_str::<HashMap<String, CacheRecord>>(&data) {
            Ok(records) => {
                tracing::debug!(path = %path.display(), feeds = records.len(), "cache loaded");
                Self::from_records(records)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt cache file, starting empty");
                Self::new()
            }
        }
    }

    /// Persist as a JSON object keyed by feed URL. Writes a sibling temp file
    /// and renames it over the target.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = {
            let map = self.lock();
            serde_json::to_vec(&*map).context("serializing cache")?
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating cache dir {}", dir.display()))?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))
    }

    pub fn get(&self, feed_url: &str) -> Option<CacheRecord> {
        self.lock().get(feed_url).cloned()
    }

    pub fn put(&self, feed_url: &str, record: CacheRecord) {
        self.lock().insert(feed_url.to_string(), record);
    }

    /// Validators for a conditional GET; empty when the feed is uncached.
    pub fn validators(&self, feed_url: &str) -> Validators {
        self.lock()
            .get(feed_url)
            .map(|r| Validators {
                etag: r.etag.clone().filter(|s| !s.is_empty()),
                last_modified: r.last_modified.clone().filter(|s| !s.is_empty()),
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every cached entry, feeds visited in URL order.
    pub fn all_entries(&self) -> Vec<Entry> {
        let map = self.lock();
        let mut keys: Vec<&String> = map.keys().collect();
        keys.sort();
        keys.into_iter()
            .flat_map(|k| map[k].entries.iter().cloned())
            .collect()
    }

    // Every mutation is a single insert, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheRecord>> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str) -> Entry {
        Entry {
            source_name: "Blog".into(),
            source_url: "https://blog.test".into(),
            title: "T".into(),
            url: url.into(),
            published: None,
        }
    }

    #[test]
    fn validators_skip_empty_tags() {
        let cache = FeedCache::new();
        assert_eq!(cache.validators("https://a.test/feed"), Validators::default());

        cache.put(
            "https://a.test/feed",
            CacheRecord {
                etag: Some(String::new()),
                last_modified: Some("Tue, 09 Jan 2024 08:00:00 GMT".into()),
                entries: vec![],
            },
        );
        let v = cache.validators("https://a.test/feed");
        assert_eq!(v.etag, None);
        assert_eq!(v.last_modified.as_deref(), Some("Tue, 09 Jan 2024 08:00:00 GMT"));
    }

    #[test]
    fn all_entries_is_ordered_by_feed_url() {
        let cache = FeedCache::new();
        cache.put(
            "https://b.test/feed",
            CacheRecord {
                entries: vec![entry("https://b.test/1")],
                ..Default::default()
            },
        );
        cache.put(
            "https://a.test/feed",
            CacheRecord {
                entries: vec![entry("https://a.test/1"), entry("https://a.test/2")],
                ..Default::default()
            },
        );
        let urls: Vec<String> = cache.all_entries().into_iter().map(|e| e.url).collect();
        assert_eq!(
            urls,
            vec!["https://a.test/1", "https://a.test/2", "https://b.test/1"]
        );
    }
}
