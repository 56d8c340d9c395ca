//! Error types for the fetcher module

use thiserror::Error;

/// Errors that can abort a fetch pass
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level retrieval error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Seed or discovered URL failed to parse
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Seed URL is not usable as a crawl entry point
    #[error("Invalid seed URL: {0}")]
    InvalidSeed(String),

    /// HTML parsing error
    #[error("HTML parse error: {0}")]
    HtmlParse(String),
}
