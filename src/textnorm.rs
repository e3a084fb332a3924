//! Text normalization shared by every pipeline stage.
//!
//! Raw feed teasers and extracted page text arrive full of boilerplate:
//! ad/sponsor lines, machine-translation disclaimers, control characters, and
//! ragged whitespace. [`normalize`] reduces either plain text or HTML to a
//! single cleaned line. All functions here are pure and idempotent.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

/// Ad/sponsor line markers, case-insensitive, including the Korean forms the
/// upstream feeds use.
static AD_PAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)advert|sponsor|subscribe|광고|후원|구독").unwrap());

/// Boilerplate disclaimer phrases some sources inject into translated copy.
/// Dropped with the same line-drop mechanism as ad lines.
static DISCLAIMER_PAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)automatically translated|translated by (ai|machine)|이 기사는 .{0,12}번역|번역기로 번역된")
        .unwrap()
});

static WS_PAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// `<script>`/`<style>` blocks whose text content must never leak into output.
static SCRIPT_STYLE_PAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").unwrap());

static TAG_PAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</?[a-z][^>]*>").unwrap());

/// Normalize plain text: drop blank, ad, and disclaimer lines, strip control
/// characters, collapse all whitespace to single spaces.
pub fn clean_text(text: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    for line in text.lines() {
        let line: String = line
            .chars()
            .filter(|c| !c.is_control() || *c == '\t')
            .collect();
        let line = line.trim();
        if line.is_empty() || AD_PAT.is_match(line) || DISCLAIMER_PAT.is_match(line) {
            continue;
        }
        parts.push(line.to_string());
    }
    WS_PAT.replace_all(&parts.join(" "), " ").trim().to_string()
}

/// Reduce HTML to a line-per-text-node plain representation, with script and
/// style contents removed. Lines are trimmed but otherwise uncleaned.
pub fn html_text_lines(html: &str) -> Vec<String> {
    let stripped = SCRIPT_STYLE_PAT.replace_all(html, "\n");
    let document = Html::parse_document(&stripped);
    document
        .root_element()
        .text()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Extract text from HTML and clean it with the plain-text rules.
pub fn clean_html_text(html: &str) -> String {
    clean_text(&html_text_lines(html).join("\n"))
}

/// Normalize either plain text or HTML; HTML is detected by the presence of
/// markup tags and first reduced to line text.
pub fn normalize(input: &str) -> String {
    if TAG_PAT.is_match(input) {
        clean_html_text(input)
    } else {
        clean_text(input)
    }
}
