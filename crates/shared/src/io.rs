use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{Digest, NewsItem};

/// Get the default directory for the digest audit trail
pub fn default_digest_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .context("Could not determine local data directory")?
        .join("newsletter-distill")
        .join("digests");

    fs::create_dir_all(&data_dir).context("Failed to create digest directory")?;

    Ok(data_dir)
}

/// Save a final item list as a timestamped JSON file.
///
/// The filename carries date, time, and milliseconds so repeated runs never
/// overwrite each other.
pub fn save_digest(items: &[NewsItem], dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).context("Failed to create digest directory")?;

    let filename = format!("digest-{}.json", Utc::now().format("%Y%m%d-%H%M%S-%3f"));
    let filepath = dir.join(filename);

    let digest = Digest::new(items.to_vec());
    let json = serde_json::to_string_pretty(&digest).context("Failed to serialize digest")?;

    fs::write(&filepath, json).context("Failed to write digest file")?;

    Ok(filepath)
}
