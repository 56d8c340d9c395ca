//! AI metadata extraction
//!
//! Sends a truncated book excerpt to the model with a fixed literary-analysis
//! instruction and returns the raw response text. Invocation failures are
//! folded into the returned string so the search pipeline can finish with a
//! visibly-broken field instead of aborting.

use crate::gemini::{Content, ModelsService};
use tracing::{instrument, warn};

/// Excerpt length passed to the model
pub const EXCERPT_CHAR_CAP: usize = 1500;

/// Prefix of the substituted value when the model call fails
pub const METADATA_ERROR_PREFIX: &str = "AI metadata generation failed: ";

/// Build the fixed analysis instruction around the leading
/// [`EXCERPT_CHAR_CAP`] characters of the book body.
fn build_analysis_prompt(body: &str) -> String {
    let excerpt: String = body.chars().take(EXCERPT_CHAR_CAP).collect();
    format!(
        "Analyze the following book content and extract information for each item below.\n\
         - Characters / main figures\n\
         - Central events / conflict\n\
         - Historical era and setting\n\
         - Emotional elements (love-hate, solitude, and so on)\n\
         - Adaptation status (film / drama / webtoon, with platform names)\n\
         - Review (brief summary)\n\
         - External links (if any)\n\
         [Book content]\n\
         {excerpt}"
    )
}

/// Generate literary metadata for a book excerpt.
///
/// Returns the model's response text verbatim. On any invocation failure the
/// error message is returned as the value itself, prefixed with
/// [`METADATA_ERROR_PREFIX`].
#[instrument(skip(models, body), level = "debug")]
pub async fn generate_metadata(models: &ModelsService, model: &str, body: &str) -> String {
    let prompt = build_analysis_prompt(body);

    let contents = vec![Content::new().with_role("user").with_text(prompt)];
    match models.generate_content(model, None, contents).await {
        Ok(response) => response.text(),
        Err(e) => {
            warn!(error = %e, "metadata generation failed; substituting error text");
            format!("{METADATA_ERROR_PREFIX}{e}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::http::HttpClient;

    #[test]
    fn test_prompt_contains_excerpt_and_targets() {
        let prompt = build_analysis_prompt("It was a dark night.");
        assert!(prompt.contains("It was a dark night."));
        assert!(prompt.contains("Characters"));
        assert!(prompt.contains("Adaptation status"));
        assert!(prompt.contains("External links"));
    }

    #[test]
    fn test_prompt_truncates_long_bodies() {
        let long_body = format!("{}{}", "x".repeat(EXCERPT_CHAR_CAP), "MARKER");
        let prompt = build_analysis_prompt(&long_body);
        assert!(!prompt.contains("MARKER"));
    }

    #[tokio::test]
    async fn test_generate_metadata_returns_model_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates": [{"content": {"parts": [{"text": "- Characters: Yeong-hye"}]}}]}"#,
            )
            .create_async()
            .await;

        let mut http_client = HttpClient::with_api_key("test-key".to_string());
        http_client.set_base_url(server.url());
        let models = ModelsService::new(http_client);

        let result = generate_metadata(&models, "gemini-2.0-flash", "excerpt").await;
        assert_eq!(result, "- Characters: Yeong-hye");
    }

    #[tokio::test]
    async fn test_generate_metadata_substitutes_error_string() {
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
        let models = ModelsService::new(http_client);

        let result = generate_metadata(&models, "gemini-2.0-flash", "excerpt").await;
        assert!(result.starts_with(METADATA_ERROR_PREFIX));
    }
}
