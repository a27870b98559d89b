// src/ingest/error.rs
use thiserror::Error;

/// Per-feed failure. None of these are fatal to a run; the orchestrator
/// counts them and moves on.
#[derive(Debug, Error)]
pub enum FeedError {
    /// DNS, connect, timeout or body read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Anything other than 200 or 304.
    #[error("HTTP {0}")]
    Status(u16),

    /// No known shape decoded with at least one item.
    #[error("unrecognized feed format")]
    UnrecognizedFormat,
}

impl FeedError {
    /// Short label used as a metrics/log field.
    pub fn kind(&self) -> &'static str {
        match self {
            FeedError::Transport(_) => "transport",
            FeedError::Status(_) => "status",
            FeedError::UnrecognizedFormat => "format",
        }
    }
}
