//! Chats service for the Gemini API
//!
//! This module provides multi-turn conversation sessions, used by the
//! free-discussion tab.

use crate::error::Result;
use crate::gemini::http::HttpClient;
use crate::gemini::types::{Content, GenerateContentResponse, GenerationConfig};
use serde::Serialize;
use tracing::{debug, instrument};

/// Request for sending a message in a chat
#[derive(Debug, Serialize)]
struct SendMessageRequest {
    /// The message content
    contents: Vec<Content>,

    /// Generation configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// Service for chat sessions
#[derive(Clone)]
pub struct ChatsService {
    /// HTTP client for making API requests
    http_client: HttpClient,
}

impl ChatsService {
    /// Create a new chats service
    pub(crate) fn new(http_client: HttpClient) -> Self {
        Self { http_client }
    }

    /// Create a new chat session
    #[instrument(skip(self), level = "debug")]
    pub fn create(&self, model: impl Into<String> + std::fmt::Debug) -> ChatSession {
        self.create_with_config(model, None)
    }

    /// Create a new chat session with configuration
    #[instrument(skip(self, config), level = "debug")]
    pub fn create_with_config(
        &self,
        model: impl Into<String> + std::fmt::Debug,
        config: Option<GenerationConfig>,
    ) -> ChatSession {
        let model = model.into();

        debug!("Creating chat session with model {}", model);

        // Local identifier only; generateContent is stateless server-side
        let chat_id = format!("chats/{}", uuid::Uuid::new_v4());

        ChatSession {
            chat_id,
            model,
            http_client: self.http_client.clone(),
            generation_config: config,
        }
    }
}

/// A chat session for multi-turn conversations
#[derive(Clone)]
pub struct ChatSession {
    /// The chat session ID
    chat_id: String,

    /// The model used for this chat
    model: String,

    /// HTTP client for making API requests
    http_client: HttpClient,

    /// Generation configuration
    generation_config: Option<GenerationConfig>,
}

impl ChatSession {
    /// Send a message in this chat session
    #[instrument(skip(self, message, history), level = "debug", fields(chat_id = %self.chat_id))]
    pub async fn send_message(
        &self,
        message: impl Into<String> + std::fmt::Debug,
        history: Option<Vec<Content>>,
    ) -> Result<GenerateContentResponse> {
        let content = Content::new().with_role("user").with_text(message.into());

        let mut contents = history.unwrap_or_default();
        contents.push(content);

        let request = SendMessageRequest {
            contents,
            generation_config: self.generation_config.clone(),
        };

        let path = format!("models/{}:generateContent", self.model);

        debug!(
            "Sending message using model {} in chat {}",
            self.model, self.chat_id
        );
        self.http_client.post(&path, &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_send_message() {
        let mut server = Server::new_async().await;
        let mock_server = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                "candidates": [{
                    "content": {
                        "parts": [{
                            "text": "Response text"
                        }]
                    }
                }]
            }"#,
            )
            .match_query(mockito::Matcher::Any)
            .expect(1)
            .create_async()
            .await;

        let mut http_client = HttpClient::with_api_key("test-key".to_string());
        http_client.set_base_url(server.url());

        let chat = ChatsService::new(http_client).create("gemini-2.0-flash");

        let response = chat.send_message("Hello", None).await.unwrap();
        assert_eq!(response.text(), "Response text");

        mock_server.assert_async().await;
    }
}
