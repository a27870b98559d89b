// src/config/settings.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::digest::DEFAULT_WINDOW_DAYS;
use crate::ingest::fetcher::{
    FetchSettings, DEFAULT_CONCURRENCY, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT,
    DEFAULT_USER_AGENT,
};

pub const ENV_CONFIG_PATH: &str = "ENGBLOGS_CONFIG_PATH";
const DEFAULT_TOML_PATH: &str = "config/engblogs.toml";
const DEFAULT_JSON_PATH: &str = "config/engblogs.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// OPML subscription list.
    pub opml_path: PathBuf,
    pub cache_path: PathBuf,
    /// Directory receiving `entries.json`.
    pub output_dir: PathBuf,
    pub concurrency: usize,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub user_agent: String,
    pub window_days: i64,
    /// Prometheus exposition text is written here at the end of a run.
    pub metrics_path: Option<PathBuf>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            opml_path: PathBuf::from("engblogs.opml"),
            cache_path: PathBuf::from("cache.json"),
            output_dir: PathBuf::from("public"),
            concurrency: DEFAULT_CONCURRENCY,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT.as_secs(),
            read_timeout_secs: DEFAULT_READ_TIMEOUT.as_secs(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            window_days: DEFAULT_WINDOW_DAYS,
            metrics_path: None,
        }
    }
}

impl DigestConfig {
    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg: DigestConfig = match ext.as_str() {
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("parsing JSON config {}", path.display()))?,
            _ => toml::from_str(&content)
                .with_context(|| format!("parsing TOML config {}", path.display()))?,
        };
        Ok(cfg.sanitized())
    }

    /// Load using env var + fallbacks:
    /// 1) $ENGBLOGS_CONFIG_PATH
    /// 2) config/engblogs.toml
    /// 3) config/engblogs.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        for candidate in [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH] {
            let p = PathBuf::from(candidate);
            if p.exists() {
                return Self::load_from(&p);
            }
        }
        Ok(Self::default())
    }

    /// Zero values would stall or empty a run; put defaults back.
    fn sanitized(mut self) -> Self {
        let d = Self::default();
        if self.concurrency == 0 {
            self.concurrency = d.concurrency;
        }
        if self.connect_timeout_secs == 0 {
            self.connect_timeout_secs = d.connect_timeout_secs;
        }
        if self.read_timeout_secs == 0 {
            self.read_timeout_secs = d.read_timeout_secs;
        }
        if self.window_days <= 0 {
            self.window_days = d.window_days;
        }
        if self.user_agent.trim().is_empty() {
            self.user_agent = d.user_agent;
        }
        self
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            user_agent: self.user_agent.clone(),
            concurrency: self.concurrency,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
        }
    }

    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::days(self.window_days)
    }
}
