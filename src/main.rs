//! # script_news
//!
//! Turns a heterogeneous batch of raw news-article records into a
//! deduplicated, cleaned, and summarized set of script-ready records for
//! downstream narration or translation.
//!
//! ## Architecture
//!
//! The binary is a pipeline over an input JSON file of records (produced by
//! an external collection stage):
//! 1. **Filter** (optional): recency and topic-keyword filters
//! 2. **Deduplicate**: exact link/title plus fuzzy title/teaser similarity
//! 3. **Enrich**: multi-strategy body extraction, then tiered summarization
//!    (model-backed when an endpoint is configured, frequency-extractive
//!    otherwise) into a `script` field
//! 4. **Output**: timestamped records JSON plus an optional assembled
//!    narration script
//!
//! ## Usage
//!
//! ```sh
//! script_news -i ./articles.json -o ./raw_feeds -s ./narration.txt
//! ```

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod dedup;
mod error;
mod extract;
mod models;
mod outputs;
mod pipeline;
mod script;
mod summarize;
mod textnorm;
mod utils;

use cli::Cli;
use extract::{ExtractOptions, HttpFetcher};
use models::ArticleRecord;
use pipeline::PipelineOptions;
use script::assemble_script;
use summarize::{ModelConfig, ModelSummarizer, TieredSummarizer};
use utils::{ensure_writable_dir, filter_recent, filter_topic};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("script_news starting up");

    let args = Cli::parse();
    ensure_writable_dir(&args.output_dir).await?;

    // ---- Load raw records ----
    let data = tokio::fs::read_to_string(&args.input).await?;
    let mut records: Vec<ArticleRecord> = serde_json::from_str(&data)?;
    info!(count = records.len(), input = %args.input, "loaded raw records");

    if let Some(days) = args.days {
        records = filter_recent(records, days);
        info!(count = records.len(), days, "applied recency filter");
    }
    if !args.topic.is_empty() {
        records = filter_topic(records, &args.topic);
        info!(count = records.len(), topics = ?args.topic, "applied topic filter");
    }

    // ---- Capabilities: built once, injected into the pipeline ----
    let fetcher = HttpFetcher::new(Duration::from_secs(10))?;
    let model = match &args.summary_api_url {
        Some(endpoint) => {
            let config = ModelConfig {
                endpoint: endpoint.clone(),
                api_key: args.summary_api_key.clone(),
                model: args.summary_model.clone(),
                max_input_tokens: args.max_input_tokens,
                max_summary_tokens: args.max_summary_tokens,
            };
            match ModelSummarizer::new(config) {
                Ok(model) => {
                    info!(endpoint = %endpoint, model = %args.summary_model, "model summarizer enabled");
                    Some(model)
                }
                Err(e) => {
                    warn!(error = %e, "model summarizer unavailable; extractive tier only");
                    None
                }
            }
        }
        None => {
            info!("no summary endpoint configured; extractive tier only");
            None
        }
    };
    let summarizer = TieredSummarizer::new(model, args.max_sentences);

    let opts = PipelineOptions {
        similarity_threshold: args.similarity_threshold,
        extract: ExtractOptions {
            min_len: args.min_body_len,
            attempts: args.fetch_attempts,
            delay: Duration::from_millis(args.fetch_delay_ms),
        },
        concurrency: args.concurrency,
    };

    // ---- Run the pipeline ----
    let enriched = pipeline::run(records, &fetcher, &summarizer, &opts).await?;
    info!(count = enriched.len(), "pipeline complete");

    // ---- Persist ----
    let path = outputs::json::write_records(&enriched, &args.output_dir).await?;
    info!(path = %path.display(), count = enriched.len(), "saved enriched records");

    if let Some(script_path) = &args.script_out {
        let narration = assemble_script(&enriched);
        outputs::json::write_narration(&narration, script_path).await?;
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), "execution complete");
    Ok(())
}
