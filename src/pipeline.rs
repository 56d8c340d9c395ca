//! Search pipeline
//!
//! One search action: fetch pages from the seed URL, run the analysis prompt
//! over each body, attach loan statistics, and store the result under the
//! page title. The network half and the store half are split so interactive
//! surfaces can run the former on a worker task while the session context
//! stays on the interface task.

use crate::analysis;
use crate::fetcher::{self, FetcherConfig, PageRecord};
use crate::gemini::ModelsService;
use crate::session::{BookMetadata, SessionContext};
use tracing::{instrument, warn};

/// One fetched page with its analysis, not yet committed to the session
#[derive(Debug, Clone)]
pub struct FetchedAnalysis {
    pub page: PageRecord,
    pub ai_metadata: String,
}

/// Fetch pages and analyze each body.
///
/// Any fetch failure degrades to an empty result set with a single warning;
/// analysis failures are already folded into the metadata text.
#[instrument(skip(models, config), level = "debug")]
pub async fn fetch_and_analyze(
    models: &ModelsService,
    config: &FetcherConfig,
    seed: &str,
    model: &str,
) -> Vec<FetchedAnalysis> {
    let pages = match fetcher::fetch_book_pages(seed, config).await {
        Ok(pages) => pages,
        Err(e) => {
            warn!(error = %e, seed, "fetch failed; returning no results");
            return Vec::new();
        }
    };

    let mut results = Vec::with_capacity(pages.len());
    for page in pages {
        let ai_metadata = analysis::generate_metadata(models, model, &page.body).await;
        results.push(FetchedAnalysis { page, ai_metadata });
    }
    results
}

/// Commit analyzed pages into the session store.
///
/// Looks up loan statistics per title and upserts each record. Returns the
/// stored records in fetch order for display.
pub fn commit_results(
    session: &mut SessionContext,
    results: Vec<FetchedAnalysis>,
) -> Vec<BookMetadata> {
    let mut stored = Vec::with_capacity(results.len());
    for FetchedAnalysis { page, ai_metadata } in results {
        let (loan_rank, loan_count) = session.loan_stats(&page.title);
        let record = BookMetadata {
            page,
            ai_metadata,
            loan_rank,
            loan_count,
        };
        session.upsert_book(record.clone());
        stored.push(record);
    }
    stored
}

/// Full pipeline for one search action.
pub async fn search_and_extract(
    models: &ModelsService,
    session: &mut SessionContext,
    seed: &str,
    config: &FetcherConfig,
    model: &str,
) -> Vec<BookMetadata> {
    let results = fetch_and_analyze(models, config, seed, model).await;
    commit_results(session, results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::METADATA_ERROR_PREFIX;
    use crate::gemini::http::HttpClient;

    fn mock_models(server: &mockito::Server) -> ModelsService {
        let mut http_client = HttpClient::with_api_key("test-key".to_string());
        http_client.set_base_url(server.url());
        ModelsService::new(http_client)
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_empty_result_set() {
        let server = mockito::Server::new_async().await;
        let models = mock_models(&server);
        let mut session = SessionContext::new();

        let stored = search_and_extract(
            &models,
            &mut session,
            "http://127.0.0.1:1/book",
            &FetcherConfig::default(),
            "gemini-2.0-flash",
        )
        .await;

        assert!(stored.is_empty());
        assert!(session.latest_book().is_none());
    }

    #[tokio::test]
    async fn test_search_stores_analyzed_book() {
        let mut page_server = mockito::Server::new_async().await;
        page_server
            .mock("GET", "/book/42")
            .with_status(200)
            .with_body(
                r#"<html><head><title>The Vegetarian</title>
                <meta name="description" content="A story of loss."></head>
                <body>Chapter One.</body></html>"#,
            )
            .create_async()
            .await;

        let mut model_server = mockito::Server::new_async().await;
        model_server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": [{"content": {"parts": [{"text": "- Era: present day"}]}}]}"#)
            .create_async()
            .await;

        let models = mock_models(&model_server);
        let mut session = SessionContext::new();
        let seed = format!("{}/book/42", page_server.url());

        let stored = search_and_extract(
            &models,
            &mut session,
            &seed,
            &FetcherConfig::default(),
            "gemini-2.0-flash",
        )
        .await;

        assert_eq!(stored.len(), 1);
        let book = &stored[0];
        assert_eq!(book.page.title, "The Vegetarian");
        assert_eq!(book.page.summary, "A story of loss.");
        assert_eq!(book.ai_metadata, "- Era: present day");
        assert!((1..=50).contains(&book.loan_rank));
        assert!((1..=300).contains(&book.loan_count));

        let latest = session.latest_book().unwrap();
        assert_eq!(latest.page.title, "The Vegetarian");
    }

    #[tokio::test]
    async fn test_model_failure_does_not_abort_pipeline() {
        let mut page_server = mockito::Server::new_async().await;
        page_server
            .mock("GET", "/book/1")
            .with_status(200)
            .with_body("<html><head><title>T</title></head><body>b</body></html>")
            .create_async()
            .await;

        let mut model_server = mockito::Server::new_async().await;
        model_server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let models = mock_models(&model_server);
        let mut session = SessionContext::new();
        let seed = format!("{}/book/1", page_server.url());

        let stored = search_and_extract(
            &models,
            &mut session,
            &seed,
            &FetcherConfig::default(),
            "gemini-2.0-flash",
        )
        .await;

        assert_eq!(stored.len(), 1);
        assert!(stored[0].ai_metadata.starts_with(METADATA_ERROR_PREFIX));
        assert_eq!(
            session.latest_book().unwrap().ai_metadata,
            stored[0].ai_metadata
        );
    }

    #[tokio::test]
    async fn test_loan_stats_memoized_across_repeat_searches() {
        let mut page_server = mockito::Server::new_async().await;
        page_server
            .mock("GET", "/book/1")
            .with_status(200)
            .with_body("<html><head><title>T</title></head><body>b</body></html>")
            .expect(2)
            .create_async()
            .await;

        let mut model_server = mockito::Server::new_async().await;
        model_server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": [{"content": {"parts": [{"text": "m"}]}}]}"#)
            .expect(2)
            .create_async()
            .await;

        let models = mock_models(&model_server);
        let mut session = SessionContext::new();
        let seed = format!("{}/book/1", page_server.url());
        let config = FetcherConfig::default();

        let first = search_and_extract(&models, &mut session, &seed, &config, "gemini-2.0-flash").await;
        let second = search_and_extract(&models, &mut session, &seed, &config, "gemini-2.0-flash").await;

        assert_eq!(first[0].loan_rank, second[0].loan_rank);
        assert_eq!(first[0].loan_count, second[0].loan_count);
        assert_eq!(session.books().len(), 1);
    }
}
