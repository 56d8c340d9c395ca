//! # bookscout - Interactive Literary Book Search
//!
//! This crate implements an interactive search tool for literary book pages:
//! paste a book-platform URL, fetch the page, and have a hosted generative
//! model extract literary metadata (characters, conflict, era, emotional
//! tone, adaptations, review). A second tab offers free-form discussion
//! against the same model, lightly conditioned on the most recently fetched
//! book, and a sidebar collects per-category feedback.
//!
//! ## Features
//!
//! - Bounded same-prefix page fetching with title/summary/body extraction
//! - Gemini `generateContent` client with retry and rate limiting
//! - Fixed-prompt literary metadata extraction
//! - Deep-query and free-chat responders over the stored metadata
//! - In-memory session context: book store, feedback log, transcripts,
//!   deterministic placeholder loan statistics
//!
//! ## Example
//!
//! ```rust,no_run
//! use bookscout::fetcher::FetcherConfig;
//! use bookscout::gemini::Client;
//! use bookscout::pipeline::search_and_extract;
//! use bookscout::session::SessionContext;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Client::with_api_key_rate_limited("your-api-key");
//!     let mut session = SessionContext::new();
//!
//!     let stored = search_and_extract(
//!         &client.models(),
//!         &mut session,
//!         "https://example.com/book/42",
//!         &FetcherConfig::default(),
//!         "gemini-2.0-flash",
//!     )
//!     .await;
//!
//!     for book in stored {
//!         println!("{}\n{}", book.page.title, book.ai_metadata);
//!     }
//! }
//! ```

mod error;
mod markdown;

pub mod analysis;
pub mod fetcher;
pub mod gemini;
pub mod pipeline;
pub mod respond;
pub mod session;

pub use error::Error;
pub use markdown::format_markdown;

/// Re-export of commonly used types
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::gemini::Content;
}
