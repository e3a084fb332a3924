//! Near-duplicate detection across noisy titles and summaries.
//!
//! Feed and search sources routinely deliver the same story several times:
//! identical links, retitled syndications, or lightly reworded teasers. The
//! engine always drops exact link/title repeats; below a threshold of 1.0 it
//! also drops fuzzy repeats by character-level similarity against every
//! previously kept record. First-seen wins; records are filtered, never merged or
//! mutated, and input order is preserved.

use crate::error::PipelineError;
use crate::models::ArticleRecord;
use std::collections::HashSet;
use strsim::normalized_levenshtein;
use tracing::{debug, info, instrument};

/// Case-fold and collapse whitespace for comparison keys.
fn fold(s: &str) -> String {
    s.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Character-level similarity ratio in [0, 1] over folded strings.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = fold(a);
    let b = fold(b);
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    normalized_levenshtein(&a, &b)
}

/// Whether `record` duplicates any already-kept record at `threshold`.
fn is_duplicate(record: &ArticleRecord, kept: &[ArticleRecord], threshold: f64) -> bool {
    for prior in kept {
        let title_sim = similarity(&record.title, &prior.title);
        if title_sim >= threshold {
            debug!(
                title = %record.title,
                prior = %prior.title,
                similarity = title_sim,
                "duplicate by title similarity"
            );
            return true;
        }
        if let (Some(text), Some(prior_text)) = (record.comparison_text(), prior.comparison_text())
        {
            let text_sim = similarity(text, prior_text);
            if text_sim >= threshold {
                debug!(
                    title = %record.title,
                    prior = %prior.title,
                    similarity = text_sim,
                    "duplicate by summary/body similarity"
                );
                return true;
            }
        }
    }
    false
}

/// Remove exact and near-duplicate records.
///
/// `threshold` must lie in (0, 1]; 1.0 means exact link/title matching only.
/// Anything outside that range is a caller bug and fails fast.
#[instrument(level = "debug", skip(records), fields(count = records.len()))]
pub fn deduplicate(
    records: Vec<ArticleRecord>,
    threshold: f64,
) -> Result<Vec<ArticleRecord>, PipelineError> {
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(PipelineError::InvalidThreshold(threshold));
    }

    let original = records.len();
    let mut kept: Vec<ArticleRecord> = Vec::with_capacity(records.len());
    let mut seen_links: HashSet<String> = HashSet::new();
    let mut seen_titles: HashSet<String> = HashSet::new();

    for record in records {
        let link = fold(record.link.trim());
        let title = fold(record.title.trim());

        // Records without a link fall back to title-only comparison.
        if !link.is_empty() && seen_links.contains(&link) {
            debug!(title = %record.title, %link, "duplicate by link");
            continue;
        }
        if seen_titles.contains(&title) {
            debug!(title = %record.title, "duplicate by exact title");
            continue;
        }
        if threshold < 1.0 && is_duplicate(&record, &kept, threshold) {
            continue;
        }

        if !link.is_empty() {
            seen_links.insert(link);
        }
        seen_titles.insert(title);
        kept.push(record);
    }

    let removed = original - kept.len();
    if removed > 0 {
        info!(removed, kept = kept.len(), threshold, "deduplication removed records");
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, link: &str) -> ArticleRecord {
        ArticleRecord::new(title, link)
    }

    #[test]
    fn test_exact_dedup_by_link_and_title() {
        let input = vec![
            record("t1", "a"),
            record("t1", "b"),
            record("t2", "a"),
            record("t3", "c"),
        ];
        let out = deduplicate(input, 1.0).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "t1");
        assert_eq!(out[0].link, "a");
        assert_eq!(out[1].title, "t3");
    }

    #[test]
    fn test_link_comparison_ignores_case_and_whitespace() {
        let input = vec![
            record("first", "https://example.com/A "),
            record("second", "HTTPS://EXAMPLE.COM/a"),
        ];
        let out = deduplicate(input, 1.0).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "first");
    }

    #[test]
    fn test_fuzzy_collapses_particle_variants() {
        let input = vec![
            record("A사 신제품 발표", "https://a.example/1"),
            record("A사의 신제품 발표", "https://b.example/2"),
        ];
        let out = deduplicate(input, 0.9).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "A사 신제품 발표");
    }

    #[test]
    fn test_fuzzy_checks_summary_text() {
        let mut first = record("Budget passes", "https://a.example/1");
        first.summary = Some("The national budget passed after a long overnight session.".into());
        let mut second = record("Parliament acts", "https://b.example/2");
        second.summary = Some("The national budget passed after a long overnight session!".into());
        let out = deduplicate(vec![first, second], 0.9).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Budget passes");
    }

    #[test]
    fn test_distinct_records_survive_fuzzy_mode() {
        let input = vec![
            record("Markets rally on rate cut hopes", "https://a.example/1"),
            record("Storm closes mountain passes", "https://b.example/2"),
        ];
        let out = deduplicate(input, 0.9).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_exact_threshold_skips_fuzzy_comparison() {
        let input = vec![
            record("A사 신제품 발표", "https://a.example/1"),
            record("A사의 신제품 발표", "https://b.example/2"),
        ];
        let out = deduplicate(input, 1.0).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_missing_link_falls_back_to_title() {
        let input = vec![record("same headline", ""), record("same headline", "")];
        let out = deduplicate(input, 1.0).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_invalid_threshold_fails_fast() {
        assert!(matches!(
            deduplicate(vec![record("t", "l")], 0.0),
            Err(PipelineError::InvalidThreshold(_))
        ));
        assert!(matches!(
            deduplicate(vec![record("t", "l")], 1.5),
            Err(PipelineError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", ""), 0.0);
        assert!((similarity("Hello World", "hello   world") - 1.0).abs() < f64::EPSILON);
    }
}
