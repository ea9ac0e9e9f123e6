//! Data models shared across the pipeline.
//!
//! - [`Entry`]: a person discovered on the listing page
//! - [`SummaryResult`]: the lead paragraph resolved for an entry, with its URL
//! - [`PageClassification`]: month/year scope of the listing page
//! - [`CycleReport`]: per-cycle counters for logging

/// A candidate entry discovered on the listing page.
///
/// Entries are produced fresh on every poll and never mutated; identity is
/// the [`dedup key`](Entry::dedup_key).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Visible link text, trimmed.
    pub name: String,
    /// Path-style article reference on the primary wiki, e.g. `/wiki/Jane_Doe`.
    pub link: String,
}

impl Entry {
    pub fn new(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
        }
    }

    /// `name|link`, exact and case-sensitive.
    pub fn dedup_key(&self) -> String {
        format!("{}|{}", self.name, self.link)
    }
}

/// Outcome of summary resolution.
///
/// `text` is empty when every source failed or the entry was rate limited;
/// `source_url` always names the last URL attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResult {
    pub text: String,
    pub source_url: String,
}

impl SummaryResult {
    pub fn empty(source_url: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            source_url: source_url.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Month/year scope of the listing page relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageClassification {
    /// 1..=12 when the page is month-qualified.
    pub month: Option<u32>,
    /// `None` when no year could be extracted.
    pub year: Option<i32>,
    pub is_current: bool,
}

/// Counters for one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Entries yielded by the extractor.
    pub discovered: usize,
    /// Entries skipped because their key was already recorded.
    pub already_seen: usize,
    /// Entries for which a notification was attempted.
    pub notified: usize,
    /// Notifications the transport refused.
    pub delivery_failures: usize,
    /// Notified entries whose summary came back empty.
    pub unresolved: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key_is_exact_concatenation() {
        let e = Entry::new("Jane Doe", "/wiki/Jane_Doe");
        assert_eq!(e.dedup_key(), "Jane Doe|/wiki/Jane_Doe");
        assert_ne!(
            e.dedup_key(),
            Entry::new("jane doe", "/wiki/Jane_Doe").dedup_key()
        );
    }

    #[test]
    fn test_empty_summary_keeps_url() {
        let s = SummaryResult::empty("https://en.wikipedia.org/wiki/X");
        assert!(s.is_empty());
        assert_eq!(s.source_url, "https://en.wikipedia.org/wiki/X");
    }
}
