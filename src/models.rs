//! Data model for news article records flowing through the pipeline.
//!
//! An [`ArticleRecord`] is created by the (external) collection stage with at
//! least `title` and `link` populated, enriched in place by the extraction and
//! summarization stages, filtered by deduplication, and finally serialized by
//! the persistence stage. The serde field names are the de facto JSON schema
//! shared with the collection and persistence collaborators, hence the
//! `pubDateISO` rename.

use serde::{Deserialize, Serialize};

/// One news article's metadata plus the fields derived by the pipeline.
///
/// Derived fields use `Option<T>` to distinguish "stage has not run" from a
/// stage's actual output: an extraction that found nothing stores
/// `Some(String::new())`, never `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// Article headline as provided by the source.
    pub title: String,
    /// Canonical article URL; exact-duplicate key (case/whitespace-insensitive).
    pub link: String,
    /// Free-form category tag.
    #[serde(default)]
    pub topic: String,
    /// Source-provided teaser text, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Main body text produced by the extraction chain. An empty string means
    /// extraction ran and failed; `None` means it has not run yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Short narration script produced by the summarizer. Non-empty for every
    /// record that survives the pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// ISO-8601 publication timestamp. Used for sort ordering only.
    #[serde(rename = "pubDateISO", default)]
    pub pub_date_iso: String,
    /// Screenshot path written by an external collaborator. Preserved verbatim,
    /// never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

impl ArticleRecord {
    /// Build a minimal record the way the collection collaborator would.
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            ..Self::default()
        }
    }

    /// The text used for fuzzy duplicate comparison: the teaser when present,
    /// else the extracted body, else nothing.
    pub fn comparison_text(&self) -> Option<&str> {
        let non_empty = |s: &&String| !s.trim().is_empty();
        self.summary
            .as_ref()
            .filter(non_empty)
            .or_else(|| self.body.as_ref().filter(non_empty))
            .map(String::as_str)
    }
}
