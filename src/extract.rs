//! Main-body extraction with an ordered fallback chain.
//!
//! Heterogeneous news sites share no markup, so extraction layers cheap
//! heuristics before aggressive ones: a readability-style scored container
//! over a single fetch, then a retried HTTP GET feeding three progressively
//! looser DOM passes, then a regex-only pass for markup the DOM parser
//! mangles. The first strategy whose *normalized* output clears `min_len`
//! wins. A strategy failure is never fatal; only total exhaustion (or retry
//! exhaustion on the shared fetch) yields an empty string.
//!
//! Fetching goes through the [`Fetch`] trait so tests can count attempts and
//! the retry delay can be zeroed.

use crate::error::{ExtractError, FetchError};
use crate::textnorm::{html_text_lines, normalize};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};
use url::Url;

/// Attribute substrings marking a likely content container.
const CONTENT_MARKERS: [&str; 4] = ["content", "article", "body", "entry"];

/// Async page download. Implemented by [`HttpFetcher`] for production and by
/// in-memory mocks in tests.
pub trait Fetch {
    async fn get(&self, url: &str) -> Result<String, FetchError>;
}

impl<F: Fetch> Fetch for &F {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        (**self).get(url).await
    }
}

/// Plain reqwest-backed fetcher with a fixed connect/read timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("script_news/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        Ok(response.text().await?)
    }
}

/// Decorator adding a capped attempt count with a fixed inter-attempt delay
/// to any [`Fetch`]. No exponential backoff; the delay is injectable so tests
/// can pass [`Duration::ZERO`].
#[derive(Debug)]
pub struct RetryFetch<T> {
    inner: T,
    attempts: usize,
    delay: Duration,
}

impl<T: Fetch> RetryFetch<T> {
    pub fn new(inner: T, attempts: usize, delay: Duration) -> Self {
        Self {
            inner,
            attempts: attempts.max(1),
            delay,
        }
    }
}

impl<T: Fetch> Fetch for RetryFetch<T> {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            match self.inner.get(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    if attempt >= self.attempts {
                        warn!(attempt, max = self.attempts, %url, error = %e, "fetch retries exhausted");
                        return Err(e);
                    }
                    debug!(attempt, max = self.attempts, %url, error = %e, "fetch attempt failed; retrying");
                    if !self.delay.is_zero() {
                        sleep(self.delay).await;
                    }
                }
            }
        }
    }
}

/// Knobs for [`extract_main_text`].
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Minimum normalized length for a strategy result to be accepted.
    pub min_len: usize,
    /// HTTP attempts for the shared fetch feeding the DOM strategies.
    pub attempts: usize,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            min_len: 10,
            attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Produce the best-available main-body text for `url`, already normalized.
/// Returns an empty string only when every strategy fails.
#[instrument(level = "debug", skip(fetcher), fields(%url))]
pub async fn extract_main_text<F: Fetch>(fetcher: &F, url: &str, opts: &ExtractOptions) -> String {
    if let Err(e) = Url::parse(url) {
        warn!(error = %ExtractError::BadUrl(e), "not a fetchable url; skipping extraction");
        return String::new();
    }

    // Readable-article heuristic manages its own (single) fetch, so a later
    // retry-exhaustion cannot take back a success here.
    match fetcher.get(url).await {
        Ok(html) => {
            if let Some(text) = accept(readable_article(&html), opts.min_len, "readable-article") {
                return text;
            }
        }
        Err(e) => debug!(error = %ExtractError::Fetch(e), "readable-article fetch failed"),
    }

    let retry = RetryFetch::new(fetcher, opts.attempts, opts.delay);
    let html = match retry.get(url).await {
        Ok(html) => html,
        Err(e) => {
            debug!(error = %ExtractError::Fetch(e), "shared fetch failed; chain exhausted");
            return String::new();
        }
    };

    if let Some(text) = accept(readable_article(&html), opts.min_len, "readability") {
        return text;
    }
    if let Some(text) = accept(boilerplate_text(&html), opts.min_len, "boilerplate") {
        return text;
    }
    if let Some(text) = accept(structural_text(&html, opts.min_len), opts.min_len, "structural") {
        return text;
    }
    if let Some(text) = accept(regex_text(&html, opts.min_len), opts.min_len, "regex") {
        return text;
    }
    String::new()
}

/// Normalize a strategy result and apply the acceptance bar.
fn accept(result: Result<String, ExtractError>, min_len: usize, strategy: &str) -> Option<String> {
    match result {
        Ok(raw) => {
            let text = normalize(&raw);
            let chars = text.chars().count();
            if chars >= min_len {
                debug!(strategy, chars, "extraction strategy accepted");
                Some(text)
            } else {
                let err = ExtractError::TooShort { min_len };
                debug!(strategy, chars, error = %err, "extraction result below minimum length");
                None
            }
        }
        Err(e) => {
            debug!(strategy, error = %e, "extraction strategy failed");
            None
        }
    }
}

fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Readability-style pass: score every block container by the mass of its
/// paragraph text and return the winner's paragraphs. Substantial paragraphs
/// get a flat bonus so one long sidebar blurb cannot outscore real body copy.
fn readable_article(html: &str) -> Result<String, ExtractError> {
    let document = Html::parse_document(html);
    let container_sel = Selector::parse("article, main, section, div").unwrap();
    let para_sel = Selector::parse("p").unwrap();

    let mut best: Option<(usize, String)> = None;
    for container in document.select(&container_sel) {
        let mut score = 0usize;
        let mut paragraphs = Vec::new();
        for p in container.select(&para_sel) {
            let text = element_text(&p);
            let len = text.chars().count();
            if len == 0 {
                continue;
            }
            score += len + if len >= 50 { 25 } else { 0 };
            paragraphs.push(text);
        }
        if paragraphs.is_empty() {
            continue;
        }
        if best.as_ref().is_none_or(|(s, _)| score > *s) {
            best = Some((score, paragraphs.join("\n")));
        }
    }
    best.map(|(_, text)| text).ok_or(ExtractError::NoContent)
}

/// Recall-favoring pass: every paragraph-like element on the page, in
/// document order. Trades precision for never missing body copy.
fn boilerplate_text(html: &str) -> Result<String, ExtractError> {
    let document = Html::parse_document(html);
    let block_sel = Selector::parse("p, li, blockquote, h1, h2, h3").unwrap();
    let blocks: Vec<String> = document
        .select(&block_sel)
        .map(|el| element_text(&el))
        .filter(|t| !t.is_empty())
        .collect();
    if blocks.is_empty() {
        return Err(ExtractError::NoContent);
    }
    Ok(blocks.join("\n"))
}

/// Structural pass: an `<article>` container, else a content-like `<div>`
/// (id/class mentioning content/article/body/entry), paragraphs meeting
/// `min_len`; with no usable container, every line of page text meeting
/// `min_len`.
fn structural_text(html: &str, min_len: usize) -> Result<String, ExtractError> {
    let document = Html::parse_document(html);
    let article_sel = Selector::parse("article").unwrap();
    let div_sel = Selector::parse("div").unwrap();
    let para_sel = Selector::parse("p").unwrap();

    let container = document.select(&article_sel).next().or_else(|| {
        document.select(&div_sel).find(|div| {
            let v = div.value();
            let hay = format!(
                "{} {}",
                v.attr("id").unwrap_or(""),
                v.attr("class").unwrap_or("")
            )
            .to_lowercase();
            CONTENT_MARKERS.iter().any(|m| hay.contains(m))
        })
    });

    if let Some(container) = container {
        let paragraphs: Vec<String> = container
            .select(&para_sel)
            .map(|p| element_text(&p))
            .filter(|t| t.chars().count() >= min_len)
            .collect();
        if !paragraphs.is_empty() {
            return Ok(paragraphs.join("\n"));
        }
    }

    let lines: Vec<String> = html_text_lines(html)
        .into_iter()
        .filter(|l| l.chars().count() >= min_len)
        .collect();
    if lines.is_empty() {
        return Err(ExtractError::NoContent);
    }
    Ok(lines.join("\n"))
}

static ARTICLE_BLOCK_PAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<article\b[^>]*>(.*?)</article\s*>").unwrap());
static PARA_BLOCK_PAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p\s*>").unwrap());
static ANY_TAG_PAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<[^>]+>").unwrap());

fn strip_tags(fragment: &str) -> String {
    let text = ANY_TAG_PAT.replace_all(fragment, " ");
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Regex-only last resort, for markup so broken the DOM pass returned
/// nothing useful. Same container/paragraph idea without a parse tree.
fn regex_text(html: &str, min_len: usize) -> Result<String, ExtractError> {
    let scope = ARTICLE_BLOCK_PAT
        .captures(html)
        .and_then(|c| c.get(1))
        .map_or(html, |m| m.as_str());

    let mut paragraphs: Vec<String> = PARA_BLOCK_PAT
        .captures_iter(scope)
        .filter_map(|c| c.get(1))
        .map(|m| strip_tags(m.as_str()).trim().to_string())
        .filter(|t| t.chars().count() >= min_len)
        .collect();

    if paragraphs.is_empty() {
        paragraphs = strip_tags(scope)
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| l.chars().count() >= min_len)
            .collect();
    }
    if paragraphs.is_empty() {
        return Err(ExtractError::NoContent);
    }
    Ok(paragraphs.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fetcher that fails the first `failures` calls, then serves `body`.
    struct FlakyFetch {
        calls: AtomicUsize,
        failures: usize,
        body: String,
    }

    impl FlakyFetch {
        fn failing() -> Self {
            Self::new(usize::MAX, "")
        }

        fn new(failures: usize, body: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failures,
                body: body.to_string(),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Fetch for FlakyFetch {
        async fn get(&self, _url: &str) -> Result<String, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(FetchError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE))
            } else {
                Ok(self.body.clone())
            }
        }
    }

    const ARTICLE_HTML: &str =
        "<html><body><article><p>Short line.</p><p>Another one.</p></article></body></html>";

    #[tokio::test]
    async fn test_retry_makes_exactly_configured_attempts() {
        let fetch = FlakyFetch::failing();
        let retry = RetryFetch::new(&fetch, 3, Duration::ZERO);
        let result = retry.get("https://example.com/a").await;
        assert!(result.is_err());
        assert_eq!(fetch.calls(), 3);
    }

    #[tokio::test]
    async fn test_retry_stops_after_first_success() {
        let fetch = FlakyFetch::new(1, "<p>hello world text</p>");
        let retry = RetryFetch::new(&fetch, 3, Duration::ZERO);
        let body = retry.get("https://example.com/a").await.unwrap();
        assert!(body.contains("hello"));
        assert_eq!(fetch.calls(), 2);
    }

    #[tokio::test]
    async fn test_extract_returns_empty_when_all_fetches_fail() {
        let fetch = FlakyFetch::failing();
        let opts = ExtractOptions {
            delay: Duration::ZERO,
            ..ExtractOptions::default()
        };
        let text = extract_main_text(&fetch, "https://example.com/a", &opts).await;
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn test_extract_keeps_short_paragraphs_inside_article() {
        let fetch = FlakyFetch::new(0, ARTICLE_HTML);
        let opts = ExtractOptions {
            delay: Duration::ZERO,
            ..ExtractOptions::default()
        };
        let text = extract_main_text(&fetch, "https://example.com/a", &opts).await;
        assert!(text.contains("Short line."));
        assert!(text.contains("Another one."));
    }

    #[tokio::test]
    async fn test_extract_skips_invalid_url() {
        let fetch = FlakyFetch::new(0, ARTICLE_HTML);
        let text = extract_main_text(&fetch, "not a url", &ExtractOptions::default()).await;
        assert_eq!(text, "");
        assert_eq!(fetch.calls(), 0);
    }

    #[tokio::test]
    async fn test_extract_falls_back_after_readable_article_fetch_error() {
        // First (un-retried) fetch fails, retried fetch succeeds.
        let fetch = FlakyFetch::new(1, ARTICLE_HTML);
        let opts = ExtractOptions {
            delay: Duration::ZERO,
            ..ExtractOptions::default()
        };
        let text = extract_main_text(&fetch, "https://example.com/a", &opts).await;
        assert!(text.contains("Another one."));
    }

    #[test]
    fn test_readable_article_picks_densest_container() {
        let html = "<html><body>\
            <div class=\"nav\"><p>Home</p></div>\
            <div class=\"story\"><p>The committee voted on Tuesday to approve the long-delayed budget.</p>\
            <p>Opposition members walked out in protest before the final tally.</p></div>\
            </body></html>";
        let text = readable_article(html).unwrap();
        assert!(text.contains("committee voted"));
        assert!(text.contains("walked out"));
    }

    #[test]
    fn test_readable_article_rejects_paragraphless_page() {
        assert!(matches!(
            readable_article("<html><body><div>loose text</div></body></html>"),
            Err(ExtractError::NoContent)
        ));
    }

    #[test]
    fn test_structural_finds_content_div() {
        let html = "<html><body><div id=\"main-content\">\
            <p>Paragraph number one here.</p><p>Paragraph number two here.</p>\
            </div></body></html>";
        let text = structural_text(html, 10).unwrap();
        assert!(text.contains("number one"));
        assert!(text.contains("number two"));
    }

    #[test]
    fn test_structural_falls_back_to_page_lines() {
        let html = "<html><body><span>A standalone line of page text.</span></body></html>";
        let text = structural_text(html, 10).unwrap();
        assert!(text.contains("standalone line"));
    }

    #[test]
    fn test_regex_text_without_dom() {
        let html = "<article class=broken><p>First unclosed paragraph text</p>\
            <p>Second paragraph &amp; more</p></article>";
        let text = regex_text(html, 10).unwrap();
        assert!(text.contains("First unclosed paragraph text"));
        assert!(text.contains("Second paragraph & more"));
    }

    #[test]
    fn test_regex_text_empty_page() {
        assert!(regex_text("<html></html>", 10).is_err());
    }
}
