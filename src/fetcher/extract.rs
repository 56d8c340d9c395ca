//! Page content extraction for the fetcher module

use crate::fetcher::PageRecord;
use crate::fetcher::error::FetchError;
use scraper::{Html, Selector};
use url::Url;

/// Title used when the document has no `<title>` element
pub const TITLE_PLACEHOLDER: &str = "Untitled";

/// Summary fallback length when no description meta-tag exists
pub const SUMMARY_FALLBACK_CHARS: usize = 500;

/// Cap on stored plain-text body length
pub const BODY_CHAR_CAP: usize = 2000;

/// Truncate a string to at most `n` Unicode scalar values.
fn truncate_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// Extract a [`PageRecord`] from a fetched document.
///
/// Title falls back to a fixed placeholder, summary to the leading page text
/// when no `meta[name="description"]` is present, and the body is capped.
pub fn extract_record(url: &str, platform: &str, html: &str) -> Result<PageRecord, FetchError> {
    let document = Html::parse_document(html);

    let title_selector = Selector::parse("title")
        .map_err(|e| FetchError::HtmlParse(format!("Failed to parse title selector: {}", e)))?;

    let title = document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| TITLE_PLACEHOLDER.to_string());

    let description_selector = Selector::parse("meta[name='description']").map_err(|e| {
        FetchError::HtmlParse(format!("Failed to parse description selector: {}", e))
    })?;

    let text = page_text(&document);

    let summary = document
        .select(&description_selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|s| s.to_string())
        .unwrap_or_else(|| truncate_chars(&text, SUMMARY_FALLBACK_CHARS));

    Ok(PageRecord {
        url: url.to_string(),
        title,
        summary,
        body: truncate_chars(&text, BODY_CHAR_CAP),
        platform: platform.to_string(),
        external_links: vec![url.to_string()],
        fetched_at: chrono::Utc::now(),
    })
}

/// Collect the document's text content.
fn page_text(document: &Html) -> String {
    document.root_element().text().collect::<String>()
}

/// Resolve every `a[href]` in the document against `base`.
pub fn extract_links(base: &Url, html: &str) -> Result<Vec<Url>, FetchError> {
    let document = Html::parse_document(html);

    let anchor_selector = Selector::parse("a[href]")
        .map_err(|e| FetchError::HtmlParse(format!("Failed to parse anchor selector: {}", e)))?;

    let mut links = Vec::new();
    for element in document.select(&anchor_selector) {
        if let Some(href) = element.value().attr("href") {
            if let Ok(resolved) = base.join(href) {
                links.push(resolved);
            }
        }
    }

    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_prefers_description_meta() {
        let html = r#"<html><head>
            <title>Book 42</title>
            <meta name="description" content="A story of loss.">
            </head><body>Chapter One.</body></html>"#;

        let record = extract_record("https://example.com/book/42", "example.com", html).unwrap();
        assert_eq!(record.summary, "A story of loss.");
        assert_eq!(record.title, "Book 42");
        assert_eq!(record.platform, "example.com");
    }

    #[test]
    fn test_summary_falls_back_to_leading_text() {
        let body: String = "a".repeat(600);
        let html = format!("<html><head></head><body>{}</body></html>", body);

        let record = extract_record("https://example.com/book/42", "example.com", &html).unwrap();
        assert_eq!(record.summary.chars().count(), SUMMARY_FALLBACK_CHARS);
        assert!(body.starts_with(&record.summary));
    }

    #[test]
    fn test_title_placeholder_when_absent() {
        let html = "<html><head></head><body>text</body></html>";
        let record = extract_record("https://example.com/x", "example.com", html).unwrap();
        assert_eq!(record.title, TITLE_PLACEHOLDER);
    }

    #[test]
    fn test_body_is_capped() {
        let body: String = "b".repeat(3000);
        let html = format!("<html><body>{}</body></html>", body);
        let record = extract_record("https://example.com/x", "example.com", &html).unwrap();
        assert_eq!(record.body.chars().count(), BODY_CHAR_CAP);
    }

    #[test]
    fn test_truncation_respects_multibyte_chars() {
        let body: String = "한".repeat(2500);
        let html = format!("<html><body>{}</body></html>", body);
        let record = extract_record("https://example.com/x", "example.com", &html).unwrap();
        assert_eq!(record.body.chars().count(), BODY_CHAR_CAP);
    }

    #[test]
    fn test_extract_links_resolves_relative() {
        let base = Url::parse("https://example.com/books/42").unwrap();
        let html = r#"<a href="/books/43">next</a> <a href="https://other.org/">ext</a>"#;
        let links = extract_links(&base, html).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].as_str(), "https://example.com/books/43");
        assert_eq!(links[1].as_str(), "https://other.org/");
    }
}
