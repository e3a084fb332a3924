//! Pipeline orchestration.
//!
//! Each stage is a function taking and returning a snapshot of the record
//! list, composed here: deduplicate (cheap, on titles/teasers, before any
//! network work) → enrich (extract body, summarize into a script) → sort.
//! Enrichment may process a bounded number of records concurrently; the
//! summarizer is constructed once by the driver before any concurrent use.
//! Every failure inside enrichment degrades the record instead of aborting
//! the run; only contract violations propagate.

use crate::dedup::deduplicate;
use crate::extract::{extract_main_text, ExtractOptions, Fetch};
use crate::models::ArticleRecord;
use crate::script::normalize_script;
use crate::summarize::TieredSummarizer;
use crate::textnorm::clean_text;
use crate::utils::truncate_for_log;
use crate::error::PipelineError;
use futures::stream::{self, StreamExt};
use tracing::{info, instrument, warn};

/// A script whose normalized form has fewer alphabetic/Hangul characters than
/// this is punctuation/emoji noise and gets replaced by a title summary.
pub const MIN_SCRIPT_ALPHA: usize = 5;

/// Knobs consumed by [`run`]. All of these surface on the CLI.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Fuzzy-duplicate threshold in (0, 1]; 1.0 disables fuzzy matching.
    pub similarity_threshold: f64,
    pub extract: ExtractOptions,
    /// Concurrent enrichment width. Order of results is preserved.
    pub concurrency: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.9,
            extract: ExtractOptions::default(),
            concurrency: 4,
        }
    }
}

fn alpha_count(s: &str) -> usize {
    s.chars().filter(|c| c.is_alphabetic()).count()
}

/// Attach a body and a narration script to one record. Never fails: the
/// worst case is an empty body and a title-derived script.
async fn enrich_record<F: Fetch>(
    mut record: ArticleRecord,
    fetcher: &F,
    summarizer: &TieredSummarizer,
    extract_opts: &ExtractOptions,
) -> ArticleRecord {
    let body = extract_main_text(fetcher, &record.link, extract_opts).await;
    if body.is_empty() {
        warn!(title = %record.title, link = %record.link, "extraction produced no body");
    }
    record.body = Some(body);

    let source = record
        .comparison_text()
        .map(str::to_string)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| record.title.clone());
    let source = clean_text(&source);

    let raw = summarizer.summarize(&source).await;
    let mut script = normalize_script(&clean_text(&raw));

    if alpha_count(&script) < MIN_SCRIPT_ALPHA {
        warn!(
            title = %record.title,
            script = %truncate_for_log(&script, 80),
            "suspicious script; re-summarizing title"
        );
        let retry = summarizer.summarize(&clean_text(&record.title)).await;
        script = normalize_script(&clean_text(&retry));
        if script.is_empty() {
            script = normalize_script(&record.title);
        }
    } else if script != raw {
        warn!(
            title = %record.title,
            raw = %truncate_for_log(&raw, 80),
            "script required normalization"
        );
    }

    record.script = Some(script);
    record
}

/// Enrich all records, `concurrency` at a time, preserving input order.
#[instrument(level = "info", skip_all, fields(count = records.len()))]
pub async fn enrich_records<F: Fetch>(
    records: Vec<ArticleRecord>,
    fetcher: &F,
    summarizer: &TieredSummarizer,
    opts: &PipelineOptions,
) -> Vec<ArticleRecord> {
    let enriched: Vec<ArticleRecord> = stream::iter(records)
        .map(|record| enrich_record(record, fetcher, summarizer, &opts.extract))
        .buffered(opts.concurrency.max(1))
        .collect()
        .await;
    info!(count = enriched.len(), "enrichment complete");
    enriched
}

/// Newest first, by the ISO timestamp's lexicographic order. The core never
/// parses the date.
pub fn sort_records(mut records: Vec<ArticleRecord>) -> Vec<ArticleRecord> {
    records.sort_by(|a, b| b.pub_date_iso.cmp(&a.pub_date_iso));
    records
}

/// The full pipeline: dedup → enrich → sort.
#[instrument(level = "info", skip_all, fields(count = records.len()))]
pub async fn run<F: Fetch>(
    records: Vec<ArticleRecord>,
    fetcher: &F,
    summarizer: &TieredSummarizer,
    opts: &PipelineOptions,
) -> Result<Vec<ArticleRecord>, PipelineError> {
    let records = deduplicate(records, opts.similarity_threshold)?;
    let records = enrich_records(records, fetcher, summarizer, opts).await;
    Ok(sort_records(records))
}
