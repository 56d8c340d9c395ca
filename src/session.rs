//! Session state
//!
//! All mutable state for one run of the tool lives in an explicit
//! [`SessionContext`]: the title-keyed book store, the per-(title, category)
//! feedback log, the two tab transcripts, and the loan-statistics provider.
//! The context is created at session start, passed to every component call,
//! and discarded at session end. Nothing is persisted.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::fetcher::PageRecord;

/// A fetched book together with its derived fields.
///
/// Keyed by the human-readable page title. Titles are not stable
/// identifiers: two books sharing a title overwrite one another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookMetadata {
    /// The fetched page this record was derived from
    pub page: PageRecord,

    /// Raw model response from the analysis prompt (or the substituted
    /// error string when the invocation failed)
    pub ai_metadata: String,

    /// Placeholder loan rank (1-50)
    pub loan_rank: u32,

    /// Placeholder loan count (1-300)
    pub loan_count: u32,
}

/// Speaker of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

/// An append-only, unbounded sequence of (role, text) pairs for one tab
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<(Role, String)>,
}

impl Transcript {
    /// Append an entry
    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        self.entries.push((role, text.into()));
    }

    /// All entries in append order
    pub fn entries(&self) -> &[(Role, String)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Metadata category a piece of feedback applies to. The interface offers
/// exactly these five choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackCategory {
    Overall,
    Keywords,
    Review,
    Adaptation,
    ExternalLinks,
}

impl FeedbackCategory {
    /// All categories, in the order the interface offers them
    pub const ALL: [FeedbackCategory; 5] = [
        FeedbackCategory::Overall,
        FeedbackCategory::Keywords,
        FeedbackCategory::Review,
        FeedbackCategory::Adaptation,
        FeedbackCategory::ExternalLinks,
    ];

    /// Stable display label
    pub fn label(&self) -> &'static str {
        match self {
            FeedbackCategory::Overall => "overall",
            FeedbackCategory::Keywords => "keywords",
            FeedbackCategory::Review => "review",
            FeedbackCategory::Adaptation => "adaptation",
            FeedbackCategory::ExternalLinks => "external-links",
        }
    }
}

impl std::fmt::Display for FeedbackCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Feedback collected for one (title, category) pair
#[derive(Debug, Clone)]
pub struct FeedbackRecord {
    pub title: String,
    pub category: FeedbackCategory,
    /// Comments in submission order
    pub comments: Vec<String>,
}

/// Source of the placeholder loan rank/count statistics
pub trait LoanStatsProvider {
    /// Rank (1-50) and count (1-300) for a title. Stable across repeated
    /// calls within a session.
    fn loan_stats(&mut self, title: &str) -> (u32, u32);
}

/// Deterministic stand-in statistics, derived from a hash of the title so
/// independent sessions agree and tests can assert exact values.
#[derive(Debug, Default)]
pub struct SeededLoanStats {
    cache: HashMap<String, (u32, u32)>,
}

impl LoanStatsProvider for SeededLoanStats {
    fn loan_stats(&mut self, title: &str) -> (u32, u32) {
        if let Some(stats) = self.cache.get(title) {
            return *stats;
        }

        let mut hasher = DefaultHasher::new();
        title.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(hasher.finish());

        let stats = (rng.gen_range(1..=50), rng.gen_range(1..=300));
        self.cache.insert(title.to_string(), stats);
        stats
    }
}

/// All mutable state for one run of the tool
pub struct SessionContext {
    books: Vec<BookMetadata>,
    book_index: HashMap<String, usize>,
    feedback: Vec<FeedbackRecord>,
    feedback_index: HashMap<(String, FeedbackCategory), usize>,
    stats: Box<dyn LoanStatsProvider + Send>,

    /// Transcript of the deep-query tab
    pub query_log: Transcript,

    /// Transcript of the free-discussion tab
    pub chat_log: Transcript,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    /// Create a session with the deterministic statistics provider
    pub fn new() -> Self {
        Self::with_stats(Box::new(SeededLoanStats::default()))
    }

    /// Create a session with a custom statistics provider
    pub fn with_stats(stats: Box<dyn LoanStatsProvider + Send>) -> Self {
        Self {
            books: Vec::new(),
            book_index: HashMap::new(),
            feedback: Vec::new(),
            feedback_index: HashMap::new(),
            stats,
            query_log: Transcript::default(),
            chat_log: Transcript::default(),
        }
    }

    /// Insert or replace the record stored under its title.
    ///
    /// Last write wins; an overwrite keeps the title's original insertion
    /// position.
    pub fn upsert_book(&mut self, metadata: BookMetadata) {
        let title = metadata.page.title.clone();
        match self.book_index.get(&title) {
            Some(&idx) => self.books[idx] = metadata,
            None => {
                self.book_index.insert(title, self.books.len());
                self.books.push(metadata);
            }
        }
    }

    /// The record stored under `title`, if any
    pub fn book(&self, title: &str) -> Option<&BookMetadata> {
        self.book_index.get(title).map(|&idx| &self.books[idx])
    }

    /// The most recently inserted record (by title insertion order)
    pub fn latest_book(&self) -> Option<&BookMetadata> {
        self.books.last()
    }

    /// All stored records in title insertion order
    pub fn books(&self) -> &[BookMetadata] {
        &self.books
    }

    /// Append a free-text comment under (title, category)
    pub fn add_feedback(
        &mut self,
        title: impl Into<String>,
        category: FeedbackCategory,
        text: impl Into<String>,
    ) {
        let title = title.into();
        let key = (title.clone(), category);
        match self.feedback_index.get(&key) {
            Some(&idx) => self.feedback[idx].comments.push(text.into()),
            None => {
                self.feedback_index.insert(key, self.feedback.len());
                self.feedback.push(FeedbackRecord {
                    title,
                    category,
                    comments: vec![text.into()],
                });
            }
        }
    }

    /// All feedback records, in first-submission order
    pub fn feedback(&self) -> &[FeedbackRecord] {
        &self.feedback
    }

    /// Feedback stored under (title, category), if any
    pub fn feedback_for(&self, title: &str, category: FeedbackCategory) -> Option<&FeedbackRecord> {
        self.feedback_index
            .get(&(title.to_string(), category))
            .map(|&idx| &self.feedback[idx])
    }

    /// Loan rank/count for a title, initialized on first access
    pub fn loan_stats(&mut self, title: &str) -> (u32, u32) {
        self.stats.loan_stats(title)
    }
}
