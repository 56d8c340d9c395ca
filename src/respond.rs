//! Query and chat responders
//!
//! Both tabs share one call shape: a fixed instruction, the most recently
//! stored book's AI metadata as context (full text for the query tab, a
//! short prefix for the chat tab), and the user's free text. Unlike the
//! extraction path, model failures here propagate to the caller and abort
//! the single interaction; transcript entries already made stay intact.

use crate::error::Result;
use crate::gemini::{ChatSession, Content, ModelsService};
use crate::session::{Role, SessionContext};
use tracing::instrument;

/// How much AI metadata the chat tab carries as context
pub const CHAT_CONTEXT_CHAR_CAP: usize = 200;

fn build_query_prompt(ai_metadata: &str, question: &str) -> String {
    format!(
        "Consult the book's metadata and content below to answer the question, \
         and include direct quotations (sentences) from the book in the answer.\n\
         [Book metadata]\n{ai_metadata}\n[Question]\n{question}"
    )
}

fn build_chat_prompt(context: Option<&str>, remark: &str) -> String {
    let context_line = match context {
        Some(keywords) => format!("Reference book keywords: {keywords}\n"),
        None => String::new(),
    };
    format!(
        "Remark/question left by the user: {remark}\n\
         {context_line}\
         Please offer open literary discussion, shared feelings, and a range of perspectives."
    )
}

/// Invoke the model for a deep query with the given metadata context.
///
/// The network half of [`answer_query`]; interactive surfaces run this on a
/// worker task and commit the transcript entries themselves.
#[instrument(skip(models, ai_metadata, question), level = "debug")]
pub async fn query_model(
    models: &ModelsService,
    model: &str,
    ai_metadata: &str,
    question: &str,
) -> Result<String> {
    let prompt = build_query_prompt(ai_metadata, question);
    let contents = vec![Content::new().with_role("user").with_text(prompt)];
    let response = models.generate_content(model, None, contents).await?;
    Ok(response.text())
}

/// Invoke the model for a free remark with optional keyword context.
///
/// The network half of [`discuss`].
#[instrument(skip(chat, context, remark), level = "debug")]
pub async fn chat_model(
    chat: &ChatSession,
    context: Option<&str>,
    remark: &str,
) -> Result<String> {
    let prompt = build_chat_prompt(context, remark);
    let response = chat.send_message(prompt, None).await?;
    Ok(response.text())
}

/// Answer a deep query against the most recently stored book.
///
/// Returns `Ok(None)` without invoking the model when no book has been
/// analyzed yet; the interface prompts the user to search first. On success
/// the (user, response) pair is appended to the query transcript.
#[instrument(skip(models, session, question), level = "debug")]
pub async fn answer_query(
    models: &ModelsService,
    model: &str,
    session: &mut SessionContext,
    question: &str,
) -> Result<Option<String>> {
    let Some(book) = session.latest_book() else {
        return Ok(None);
    };

    let answer = query_model(models, model, &book.ai_metadata, question).await?;

    session.query_log.push(Role::User, question);
    session.query_log.push(Role::Model, answer.clone());
    Ok(Some(answer))
}

/// The chat tab's context: a short keyword prefix of the latest book's AI
/// metadata, when one exists.
pub fn chat_context(session: &SessionContext) -> Option<String> {
    session
        .latest_book()
        .map(|book| book.ai_metadata.chars().take(CHAT_CONTEXT_CHAR_CAP).collect())
}

/// Post a free remark to the discussion tab.
///
/// The user entry is recorded before the invocation, so a failed call leaves
/// it in the transcript; the model entry is appended only on success.
#[instrument(skip(chat, session, remark), level = "debug")]
pub async fn discuss(
    chat: &ChatSession,
    session: &mut SessionContext,
    remark: &str,
) -> Result<String> {
    let context = chat_context(session);
    session.chat_log.push(Role::User, remark);

    let reply = chat_model(chat, context.as_deref(), remark).await?;

    session.chat_log.push(Role::Model, reply.clone());
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::PageRecord;
    use crate::gemini::http::HttpClient;
    use crate::session::BookMetadata;

    fn session_with_book(ai_metadata: &str) -> SessionContext {
        let mut session = SessionContext::new();
        session.upsert_book(BookMetadata {
            page: PageRecord {
                url: "https://example.com/book/42".to_string(),
                title: "The Vegetarian".to_string(),
                summary: "summary".to_string(),
                body: "body".to_string(),
                platform: "example.com".to_string(),
                external_links: vec![],
                fetched_at: chrono::Utc::now(),
            },
            ai_metadata: ai_metadata.to_string(),
            loan_rank: 3,
            loan_count: 120,
        });
        session
    }

    fn mock_models(server: &mockito::Server) -> ModelsService {
        let mut http_client = HttpClient::with_api_key("test-key".to_string());
        http_client.set_base_url(server.url());
        ModelsService::new(http_client)
    }

    #[tokio::test]
    async fn test_query_requires_a_stored_book() {
        let server = mockito::Server::new_async().await;
        let models = mock_models(&server);
        let mut session = SessionContext::new();

        let answer = answer_query(&models, "gemini-2.0-flash", &mut session, "Who?")
            .await
            .unwrap();
        assert!(answer.is_none());
        assert!(session.query_log.is_empty());
    }

    #[tokio::test]
    async fn test_query_appends_pair_on_success() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": [{"content": {"parts": [{"text": "She refuses."}]}}]}"#)
            .create_async()
            .await;

        let models = mock_models(&server);
        let mut session = session_with_book("- Characters: Yeong-hye");

        let answer = answer_query(&models, "gemini-2.0-flash", &mut session, "Who refuses?")
            .await
            .unwrap();
        assert_eq!(answer.as_deref(), Some("She refuses."));

        let entries = session.query_log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], (Role::User, "Who refuses?".to_string()));
        assert_eq!(entries[1], (Role::Model, "She refuses.".to_string()));
    }

    #[tokio::test]
    async fn test_query_failure_leaves_transcript_untouched() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let models = mock_models(&server);
        let mut session = session_with_book("meta");

        let result = answer_query(&models, "gemini-2.0-flash", &mut session, "Who?").await;
        assert!(result.is_err());
        assert!(session.query_log.is_empty());
    }

    #[test]
    fn test_chat_context_is_truncated() {
        let session = session_with_book(&"k".repeat(500));
        let context = chat_context(&session).unwrap();
        assert_eq!(context.chars().count(), CHAT_CONTEXT_CHAR_CAP);
    }

    #[test]
    fn test_chat_context_absent_without_book() {
        let session = SessionContext::new();
        assert!(chat_context(&session).is_none());
    }

    #[tokio::test]
    async fn test_discuss_without_context_still_calls_model() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": [{"content": {"parts": [{"text": "Let's talk."}]}}]}"#)
            .create_async()
            .await;

        let mut http_client = HttpClient::with_api_key("test-key".to_string());
        http_client.set_base_url(server.url());
        let chat = crate::gemini::ChatsService::new(http_client).create("gemini-2.0-flash");

        let mut session = SessionContext::new();
        let reply = discuss(&chat, &mut session, "I loved the ending").await.unwrap();
        assert_eq!(reply, "Let's talk.");

        let entries = session.chat_log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, Role::User);
        assert_eq!(entries[1].0, Role::Model);
    }

    #[tokio::test]
    async fn test_discuss_failure_keeps_user_entry() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let mut http_client = HttpClient::with_api_key("test-key".to_string());
        http_client.set_base_url(server.url());
        let chat = crate::gemini::ChatsService::new(http_client).create("gemini-2.0-flash");

        let mut session = SessionContext::new();
        let result = discuss(&chat, &mut session, "thoughts?").await;
        assert!(result.is_err());

        let entries = session.chat_log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, Role::User);
    }
}
