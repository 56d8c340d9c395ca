//! Breadth-first page retrieval for the fetcher module

use std::collections::{HashSet, VecDeque};

use tracing::{debug, instrument};
use url::Url;

use crate::fetcher::config::FetcherConfig;
use crate::fetcher::error::FetchError;
use crate::fetcher::extract::{extract_links, extract_record};
use crate::fetcher::PageRecord;

/// Fetch up to `config.max_pages` pages starting from `seed`.
///
/// Traversal is breadth-first over discovered links whose absolute form
/// starts with the seed URL string. HTTP status codes are not treated as
/// failures (an error page still yields a record, as served); network and
/// parse failures abort the whole pass.
#[instrument(skip(config), level = "debug")]
pub async fn fetch_book_pages(
    seed: &str,
    config: &FetcherConfig,
) -> Result<Vec<PageRecord>, FetchError> {
    let seed_url = Url::parse(seed)?;
    if seed_url.scheme() != "http" && seed_url.scheme() != "https" {
        return Err(FetchError::InvalidSeed(format!(
            "seed must be http/https: {seed}"
        )));
    }

    let platform = seed_url
        .host_str()
        .ok_or_else(|| FetchError::InvalidSeed(format!("seed has no host: {seed}")))?
        .to_string();

    let client = reqwest::Client::builder()
        .timeout(config.timeout)
        .user_agent(config.user_agent.clone())
        .build()?;

    let mut pages = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::from([seed.to_string()]);

    while let Some(current) = queue.pop_front() {
        if visited.len() >= config.max_pages as usize {
            break;
        }
        if visited.contains(&current) {
            continue;
        }

        debug!(url = %current, "fetching page");
        let response = client.get(&current).send().await?;
        let html = response.text().await?;

        let record = extract_record(&current, &platform, &html)?;
        visited.insert(current.clone());
        pages.push(record);

        let base = Url::parse(&current)?;
        for link in extract_links(&base, &html)? {
            let link_str = link.to_string();
            if link_str.starts_with(seed)
                && !visited.contains(&link_str)
                && !queue.contains(&link_str)
            {
                queue.push_back(link_str);
            }
        }
    }

    debug!(pages = pages.len(), "fetch pass complete");
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_single_page_budget_never_follows_links() {
        let mut server = mockito::Server::new_async().await;
        let seed = format!("{}/books", server.url());

        let root = server
            .mock("GET", "/books")
            .with_status(200)
            .with_body(format!(
                r#"<html><head><title>Shelf</title></head>
                <body><a href="{}/1">one</a><a href="{}/2">two</a></body></html>"#,
                seed, seed
            ))
            .expect(1)
            .create_async()
            .await;

        let child = server
            .mock("GET", "/books/1")
            .with_status(200)
            .with_body("<html><body>child</body></html>")
            .expect(0)
            .create_async()
            .await;

        let config = FetcherConfig::default();
        let pages = fetch_book_pages(&seed, &config).await.unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title, "Shelf");

        root.assert_async().await;
        child.assert_async().await;
    }

    #[tokio::test]
    async fn test_multi_page_budget_follows_same_prefix_only() {
        let mut server = mockito::Server::new_async().await;
        let seed = format!("{}/books", server.url());

        let root = server
            .mock("GET", "/books")
            .with_status(200)
            .with_body(format!(
                r#"<html><body>
                <a href="{seed}/1">in scope</a>
                <a href="/other">out of scope</a>
                </body></html>"#
            ))
            .expect(1)
            .create_async()
            .await;

        let in_scope = server
            .mock("GET", "/books/1")
            .with_status(200)
            .with_body("<html><head><title>One</title></head><body>b</body></html>")
            .expect(1)
            .create_async()
            .await;

        let out_of_scope = server
            .mock("GET", "/other")
            .expect(0)
            .create_async()
            .await;

        let config = FetcherConfig::builder().max_pages(5).build();
        let pages = fetch_book_pages(&seed, &config).await.unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].title, "One");

        root.assert_async().await;
        in_scope.assert_async().await;
        out_of_scope.assert_async().await;
    }

    #[tokio::test]
    async fn test_platform_is_seed_host() {
        let mut server = mockito::Server::new_async().await;
        let seed = format!("{}/book/42", server.url());

        server
            .mock("GET", "/book/42")
            .with_status(200)
            .with_body(r#"<html><head><meta name="description" content="A story of loss."></head><body></body></html>"#)
            .create_async()
            .await;

        let pages = fetch_book_pages(&seed, &FetcherConfig::default())
            .await
            .unwrap();

        assert_eq!(pages[0].summary, "A story of loss.");
        assert_eq!(pages[0].platform, "127.0.0.1");
    }

    #[tokio::test]
    async fn test_network_failure_aborts_pass() {
        // Nothing listens on port 1; connection is refused immediately.
        let config = FetcherConfig::default();
        let result = fetch_book_pages("http://127.0.0.1:1/book", &config).await;
        assert!(matches!(result, Err(FetchError::Http(_))));
    }

    #[tokio::test]
    async fn test_rejects_non_http_seed() {
        let config = FetcherConfig::default();
        let result = fetch_book_pages("ftp://example.com/book", &config).await;
        assert!(matches!(result, Err(FetchError::InvalidSeed(_))));
    }
}
