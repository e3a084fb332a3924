//! Small record filters, logging helpers, and filesystem checks.

use crate::models::ArticleRecord;
use chrono::{DateTime, Duration, Utc};
use std::error::Error;
use tokio::fs;
use tracing::{debug, info, instrument};

/// Keep records published within `days` of now. Records whose `pubDateISO`
/// does not parse as RFC 3339 are dropped by this (opt-in) filter.
pub fn filter_recent(records: Vec<ArticleRecord>, days: i64) -> Vec<ArticleRecord> {
    let cutoff = Utc::now() - Duration::days(days);
    records
        .into_iter()
        .filter(|record| {
            match DateTime::parse_from_rfc3339(&record.pub_date_iso) {
                Ok(dt) => dt.with_timezone(&Utc) >= cutoff,
                Err(e) => {
                    debug!(title = %record.title, pub_date = %record.pub_date_iso, error = %e, "unparseable pubDateISO; dropping from recency filter");
                    false
                }
            }
        })
        .collect()
}

/// Keep records whose title or teaser mentions any of `keywords`
/// (case-insensitive).
pub fn filter_topic(records: Vec<ArticleRecord>, keywords: &[String]) -> Vec<ArticleRecord> {
    if keywords.is_empty() {
        return records;
    }
    let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
    records
        .into_iter()
        .filter(|record| {
            let haystack = format!(
                "{} {}",
                record.title,
                record.summary.as_deref().unwrap_or("")
            )
            .to_lowercase();
            keywords.iter().any(|k| haystack.contains(k))
        })
        .collect()
}

/// Ensure the output directory exists and is writable before spending any
/// network time, by probing with a throwaway file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    fs::write(&probe, b"").await?;
    let _ = fs::remove_file(&probe).await;
    info!("output directory is writable");
    Ok(())
}

/// Truncate a string for logging, char-safe, with a size indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let total = s.chars().count();
    if total <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max).collect();
    format!("{}…(+{} chars)", head, total - max)
}
