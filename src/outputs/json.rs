//! Timestamped JSON persistence for enriched records.

use crate::models::ArticleRecord;
use chrono::Local;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument};

/// Write the record list to `{dir}/articles_YYYYMMDD_HHMMSS.json` and return
/// the path. Creates the directory when missing.
#[instrument(level = "info", skip(records), fields(count = records.len(), %dir))]
pub async fn write_records(
    records: &[ArticleRecord],
    dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    fs::create_dir_all(dir).await?;
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = PathBuf::from(dir).join(format!("articles_{timestamp}.json"));
    let json = serde_json::to_string_pretty(records)?;
    fs::write(&path, json).await?;
    info!(path = %path.display(), "wrote records JSON");
    Ok(path)
}

/// Write the assembled narration script as plain text.
#[instrument(level = "info", skip(text), fields(%path, chars = text.chars().count()))]
pub async fn write_narration(text: &str, path: &str) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = PathBuf::from(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(path, text).await?;
    info!("wrote narration script");
    Ok(())
}
