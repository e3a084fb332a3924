//! Narration script assembly and repair.
//!
//! Summarizers (model-backed ones especially) like to emit text that stops
//! mid-quote or without terminal punctuation. [`normalize_script`] repairs
//! trailing quote imbalance and guarantees a terminal stop; it is total and
//! idempotent. [`assemble_script`] stitches the per-record scripts into one
//! narration text with rotating transition phrases.

use crate::models::ArticleRecord;
use tracing::debug;

const QUOTE_CHARS: [char; 6] = ['"', '\'', '“', '”', '‘', '’'];

/// Spoken transitions inserted between consecutive stories.
const TRANSITIONS: [&str; 3] = ["다음 소식입니다.", "이어서 전해드립니다.", "계속해서 다음 기사입니다."];

fn count(text: &str, c: char) -> usize {
    text.chars().filter(|&x| x == c).count()
}

/// Any quote kind out of balance: odd straight-quote parity or mismatched
/// curly open/close counts.
fn quotes_unbalanced(text: &str) -> bool {
    count(text, '"') % 2 != 0
        || count(text, '\'') % 2 != 0
        || count(text, '“') != count(text, '”')
        || count(text, '‘') != count(text, '’')
}

/// Repair trailing quote imbalance and guarantee terminal punctuation.
///
/// Repair order: a trailing quote on unbalanced text is dropped; else an
/// excess of curly double (then single) opens gets a matching close appended.
/// After that, text not ending in `.`, `!`, `?`, or `…` has any trailing
/// quotes stripped and an ellipsis appended as a soft close.
pub fn normalize_script(text: &str) -> String {
    let mut out = text.trim().to_string();
    if out.is_empty() {
        return out;
    }

    if quotes_unbalanced(&out) {
        debug!(text = %out, "repairing unbalanced quotes");
        if out.ends_with(QUOTE_CHARS) {
            out.pop();
        } else if count(&out, '“') > count(&out, '”') {
            out.push('”');
        } else if count(&out, '‘') > count(&out, '’') {
            out.push('’');
        }
    }

    if !out.ends_with(['.', '!', '?', '…']) {
        while out.ends_with(QUOTE_CHARS) {
            out.pop();
        }
        out = out.trim_end().to_string();
        if !out.ends_with(['.', '!', '?', '…']) {
            out.push('…');
        }
    }
    out
}

/// Stitch per-record scripts into a single narration text. Records without a
/// script are skipped; every segment is normalized so the result keeps the
/// terminal-punctuation guarantee.
pub fn assemble_script(records: &[ArticleRecord]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let scripts = records
        .iter()
        .filter_map(|r| r.script.as_deref())
        .filter(|s| !s.trim().is_empty());
    for (i, script) in scripts.enumerate() {
        if i > 0 {
            parts.push(TRANSITIONS[(i - 1) % TRANSITIONS.len()].to_string());
        }
        parts.push(normalize_script(script));
    }
    parts.join(" ")
}
