//! Client implementation for the Gemini API
//!
//! This module provides the main entry point for interacting with the Gemini
//! Developer API. It hands out the service objects for content generation and
//! chat sessions.

use crate::gemini::chats::ChatsService;
use crate::gemini::http::HttpClient;
use crate::gemini::models::ModelsService;
use crate::gemini::types::HttpOptions;

/// Client for the Gemini API
#[derive(Clone)]
pub struct Client {
    http_client: HttpClient,
}

impl Client {
    /// Create a new client with an API key
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        let http_client = HttpClient::with_api_key(api_key.into());
        Self { http_client }
    }

    /// Create a new client with custom HTTP options
    pub fn with_options(api_key: impl Into<String>, options: HttpOptions) -> Self {
        let http_client = HttpClient::with_api_key_and_options(api_key.into(), options);
        Self { http_client }
    }

    /// Create a new client with client-side rate limiting tuned for Gemini's
    /// default free-tier limit of 30 requests per minute per model.
    pub fn with_api_key_rate_limited(api_key: impl Into<String>) -> Self {
        let http_client = HttpClient::with_gemini_rate_limits(api_key.into());
        Self { http_client }
    }

    /// Access the models service
    pub fn models(&self) -> ModelsService {
        ModelsService::new(self.http_client.clone())
    }

    /// Access the chats service
    pub fn chats(&self) -> ChatsService {
        ChatsService::new(self.http_client.clone())
    }
}
