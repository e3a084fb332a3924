//! Command-line interface definitions.
//!
//! Collection is an external concern: the binary takes a JSON file of raw
//! article records, runs the pipeline, and writes enriched records plus an
//! optional assembled narration script. Model-endpoint options can come from
//! the environment.

use clap::Parser;

/// Command-line arguments for the script_news pipeline.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Input JSON file with raw article records
    #[arg(short, long)]
    pub input: String,

    /// Output directory for the enriched records JSON
    #[arg(short, long, default_value = "raw_feeds")]
    pub output_dir: String,

    /// Optional path for the assembled narration script text
    #[arg(short, long)]
    pub script_out: Option<String>,

    /// Fuzzy-duplicate threshold in (0, 1]; 1.0 means exact matching only
    #[arg(long, default_value_t = 0.9)]
    pub similarity_threshold: f64,

    /// Minimum accepted length for extracted body text
    #[arg(long, default_value_t = 10)]
    pub min_body_len: usize,

    /// HTTP attempts per article fetch
    #[arg(long, default_value_t = 3)]
    pub fetch_attempts: usize,

    /// Fixed delay between fetch attempts, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub fetch_delay_ms: u64,

    /// How many articles to enrich concurrently
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Sentences kept by the extractive summarizer
    #[arg(long, default_value_t = 3)]
    pub max_sentences: usize,

    /// Input token budget for the model summarizer
    #[arg(long, default_value_t = 1024)]
    pub max_input_tokens: usize,

    /// Output token budget for the model summarizer
    #[arg(long, default_value_t = 180)]
    pub max_summary_tokens: usize,

    /// OpenAI-compatible chat-completions URL; enables model summaries
    #[arg(long, env = "SUMMARY_API_URL")]
    pub summary_api_url: Option<String>,

    /// API key for the summarization endpoint
    #[arg(long, env = "SUMMARY_API_KEY")]
    pub summary_api_key: Option<String>,

    /// Model name sent to the summarization endpoint
    #[arg(long, env = "SUMMARY_MODEL", default_value = "gpt-4o-mini")]
    pub summary_model: String,

    /// Keep only records published within this many days
    #[arg(long)]
    pub days: Option<i64>,

    /// Keep only records whose title/teaser mentions one of these keywords
    #[arg(long)]
    pub topic: Vec<String>,
}
