//! Gemini API client
//!
//! A typed async client for the Gemini Developer API `generateContent`
//! endpoint: API-key authentication, retry on HTTP 429 with exponential
//! backoff, and optional client-side rate limiting.

pub mod chats;
pub mod client;
pub mod http;
pub mod models;
pub mod types;

pub use chats::{ChatSession, ChatsService};
pub use client::Client;
pub use models::ModelsService;
pub use types::{Content, GenerateContentResponse, GenerationConfig, HttpOptions, Part};
