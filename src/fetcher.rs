//! # Book Page Fetcher
//!
//! This module retrieves book detail pages from a user-supplied platform URL.
//! It performs a breadth-first walk from the seed URL, following only links
//! whose absolute form starts with the seed URL string, bounded by a page
//! budget (default 1: just the seed page).
//!
//! ## Key Components
//!
//! - `FetcherConfig`: page budget, request timeout, user agent
//! - `PageRecord`: one fetched page with title, summary, and truncated body
//! - `fetch_book_pages`: main entry point for a fetch pass
//!
//! Any retrieval or parse failure aborts the whole pass; callers degrade to
//! an empty result set and surface a single warning.

mod config;
mod error;
mod extract;
mod fetch;

pub use config::FetcherConfig;
pub use error::FetchError;
pub use extract::{BODY_CHAR_CAP, SUMMARY_FALLBACK_CHARS, TITLE_PLACEHOLDER, extract_record};
pub use fetch::fetch_book_pages;

use serde::{Deserialize, Serialize};

/// One fetched book page. Created per visited URL, never updated, discarded
/// when the session ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    /// URL the page was fetched from
    pub url: String,

    /// Page title, or a fixed placeholder when the document has none
    pub title: String,

    /// Description meta-tag content, or the leading page text as fallback
    pub summary: String,

    /// Plain page text, capped at [`BODY_CHAR_CAP`] characters
    pub body: String,

    /// Host segment of the seed URL
    pub platform: String,

    /// Outbound links associated with the record
    pub external_links: Vec<String>,

    /// When the page was retrieved
    pub fetched_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_record_roundtrip() {
        let record = PageRecord {
            url: "https://example.com/book/42".to_string(),
            title: "The Vegetarian".to_string(),
            summary: "A story of loss.".to_string(),
            body: "Chapter One.".to_string(),
            platform: "example.com".to_string(),
            external_links: vec!["https://example.com/book/42".to_string()],
            fetched_at: chrono::Utc::now(),
        };

        let json = serde_json::to_string(&record).unwrap();
        let back: PageRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.title, "The Vegetarian");
        assert_eq!(back.platform, "example.com");
    }
}
