use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;

use crate::digest::Digest;

pub const DIGEST_FILE: &str = "entries.json";

/// Write the digest as pretty JSON into `dir`, creating it if needed.
/// Returns the written path.
pub async fn write_digest(dir: &Path, digest: &Digest) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating output dir {}", dir.display()))?;
    let path = dir.join(DIGEST_FILE);
    let body = serde_json::to_vec_pretty(digest).context("serializing digest")?;
    fs::write(&path, body)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
