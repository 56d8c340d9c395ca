//! Type definitions for the Gemini API wire format
//!
//! This module contains the core data structures for interacting with the
//! `generateContent` endpoint.

use serde::{Deserialize, Serialize};

/// Content represents a piece of content that can be processed by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    /// The role of the content (e.g., "user", "model")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// The parts that make up this content
    pub parts: Vec<Part>,
}

impl Default for Content {
    fn default() -> Self {
        Self::new()
    }
}

impl Content {
    /// Create a new empty content
    pub fn new() -> Self {
        Self {
            role: None,
            parts: Vec::new(),
        }
    }

    /// Set the role for this content
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Add text to this content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(Part::Text(text.into()));
        self
    }
}

/// A part of content. Book analysis is text-only, so only the text part of
/// the wire format is modeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Part {
    /// Text content
    #[serde(rename = "text")]
    Text(String),
}

/// Generation configuration for content generation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    /// Temperature controls randomness in generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Top-k controls diversity by limiting to k most likely tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i32>,

    /// Top-p controls diversity by limiting to tokens with cumulative probability
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Maximum output tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<i32>,

    /// Stop sequences to end generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

/// Response from content generation
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    /// The generated candidates
    pub candidates: Vec<Candidate>,

    /// Prompt feedback
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Get the text from the first candidate's first text part
    pub fn text(&self) -> String {
        if let Some(candidate) = self.candidates.first() {
            if let Some(content) = candidate.content.as_ref() {
                for part in &content.parts {
                    let Part::Text(text) = part;
                    return text.clone();
                }
            }
        }
        String::new()
    }
}

/// A candidate response from the model
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    /// The content of the candidate
    pub content: Option<Content>,

    /// Finish reason
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Feedback on the prompt
#[derive(Debug, Clone, Deserialize)]
pub struct PromptFeedback {
    /// Whether the prompt was blocked
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// HTTP options for client configuration
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// API version
    pub api_version: String,

    /// Whether to automatically retry requests when rate limited
    pub retry_on_rate_limit: bool,

    /// Maximum number of retry attempts for rate-limited requests
    pub max_retries: u32,

    /// Default retry delay in seconds if no Retry-After header is provided
    pub default_retry_after_secs: u64,

    /// Whether to enable client-side rate limiting
    pub enable_client_side_rate_limiting: bool,

    /// Maximum number of requests allowed per minute
    pub requests_per_minute: u32,

    /// Whether to wait when rate limited instead of returning an error
    pub wait_when_rate_limited: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            api_version: "v1beta".to_string(),
            retry_on_rate_limit: false,
            max_retries: 3,
            default_retry_after_secs: 30,
            enable_client_side_rate_limiting: false,
            requests_per_minute: 30,
            wait_when_rate_limited: false,
        }
    }
}
