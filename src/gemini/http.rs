//! HTTP client implementation for the Gemini API
//!
//! This module provides the HTTP client for making requests to the Gemini
//! Developer API with API-key authentication.
//!
//! The client can be configured to automatically retry requests when rate
//! limited (HTTP 429 responses), and to apply client-side rate limiting so
//! that bursts of interactions stay inside the per-minute quota.

use crate::error::{Error, Result};
use crate::gemini::types::HttpOptions;
use rand::{Rng, thread_rng};
use reqwest::{Client as ReqwestClient, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, instrument};
use url::Url;

/// Default timeout for HTTP requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// HTTP client for making requests to the Gemini API
///
/// Handles authentication, request formatting, and response parsing. Retry
/// and rate-limit behavior is controlled by [`HttpOptions`].
#[derive(Clone)]
pub struct HttpClient {
    /// The underlying reqwest client
    client: ReqwestClient,

    /// Base URL for API requests
    base_url: String,

    /// API key for authentication
    api_key: String,

    /// API version
    api_version: String,

    /// Whether to automatically retry requests when rate limited
    retry_on_rate_limit: bool,

    /// Maximum number of retry attempts for rate-limited requests
    max_retries: u32,

    /// Default retry delay in seconds if no Retry-After header is provided
    default_retry_after_secs: u64,

    /// Whether to enable client-side rate limiting
    enable_client_side_rate_limiting: bool,

    /// Maximum number of requests allowed per minute
    requests_per_minute: u32,

    /// Whether to wait when rate limited instead of returning an error
    wait_when_rate_limited: bool,

    /// Request timestamps for rate limiting (shared across clones)
    request_timestamps: Arc<tokio::sync::Mutex<VecDeque<Instant>>>,
}

#[cfg(test)]
impl HttpClient {
    /// Set the base URL (for testing only)
    pub fn set_base_url(&mut self, url: String) {
        self.base_url = url;
    }
}

impl HttpClient {
    /// Create a new HTTP client with an API key
    pub fn with_api_key(api_key: String) -> Self {
        Self::with_api_key_and_options(api_key, HttpOptions::default())
    }

    /// Create a new HTTP client with an API key and custom options
    pub fn with_api_key_and_options(api_key: String, options: HttpOptions) -> Self {
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key,
            api_version: options.api_version,
            retry_on_rate_limit: options.retry_on_rate_limit,
            max_retries: options.max_retries,
            default_retry_after_secs: options.default_retry_after_secs,
            enable_client_side_rate_limiting: options.enable_client_side_rate_limiting,
            requests_per_minute: options.requests_per_minute,
            wait_when_rate_limited: options.wait_when_rate_limited,
            request_timestamps: Arc::new(tokio::sync::Mutex::new(VecDeque::new())),
        }
    }

    /// Create a new HTTP client with Gemini's default free-tier rate limits
    ///
    /// Enables client-side rate limiting at 28 requests per minute, slightly
    /// under the documented 30, to absorb clock skew and shared keys.
    pub fn with_gemini_rate_limits(api_key: String) -> Self {
        let options = HttpOptions {
            enable_client_side_rate_limiting: true,
            requests_per_minute: 28,
            wait_when_rate_limited: true,
            retry_on_rate_limit: true,
            max_retries: 5,
            default_retry_after_secs: 2,
            ..HttpOptions::default()
        };

        Self::with_api_key_and_options(api_key, options)
    }

    /// Build a URL for the Gemini Developer API
    fn build_url(&self, path: &str) -> Result<Url> {
        let url = format!("{}/{}/{}", self.base_url, self.api_version, path);
        Url::parse(&url).map_err(|e| Error::Other(format!("Invalid URL: {}", e)))
    }

    /// Prepare a POST request with a JSON body
    #[instrument(skip(self, body), level = "debug")]
    pub async fn post<T: DeserializeOwned, B: Serialize + std::fmt::Debug>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.build_url(path)?;

        let request = self
            .client
            .post(url)
            .json(body)
            .query(&[("key", &self.api_key)]);

        debug!("Sending POST request to {}", path);
        self.execute_request(request).await
    }

    /// Check if a request can be made based on the rate limit
    async fn check_rate_limit(&self) -> Result<()> {
        if !self.enable_client_side_rate_limiting {
            return Ok(());
        }

        loop {
            let now = Instant::now();
            let window_duration = Duration::from_secs(60);

            let mut timestamps = self.request_timestamps.lock().await;

            // Remove timestamps older than the window
            while let Some(timestamp) = timestamps.front() {
                if now.duration_since(*timestamp) > window_duration {
                    timestamps.pop_front();
                } else {
                    break;
                }
            }

            if timestamps.len() >= self.requests_per_minute as usize {
                if self.wait_when_rate_limited {
                    if let Some(oldest) = timestamps.front() {
                        let time_until_slot_available = window_duration
                            .checked_sub(now.duration_since(*oldest))
                            .unwrap_or_else(|| Duration::from_millis(100));

                        // 10% buffer on top of the computed wait
                        let wait_time = time_until_slot_available.mul_f32(1.1);

                        let current_len = timestamps.len();
                        debug!(
                            "Client-side rate limit reached ({} requests in window). Waiting for {} ms before next request.",
                            current_len,
                            wait_time.as_millis()
                        );

                        drop(timestamps);
                        tokio::time::sleep(wait_time).await;

                        continue;
                    }
                } else {
                    return Err(Error::RateLimit {
                        retry_after_secs: 60,
                    });
                }
            }

            timestamps.push_back(now);
            return Ok(());
        }
    }

    /// Execute an HTTP request and handle the response
    async fn execute_request<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.check_rate_limit().await?;

        let mut attempts = 0;

        loop {
            let request_clone = request
                .try_clone()
                .ok_or_else(|| Error::Other("Failed to clone request for retry".to_string()))?;

            let response = request_clone.send().await.map_err(Error::Http)?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                attempts += 1;

                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(self.default_retry_after_secs);

                let response_text = response.text().await.map_err(Error::Http)?;
                error!("API error: {} - {}", status, response_text);

                if self.retry_on_rate_limit && attempts <= self.max_retries {
                    // Exponential backoff with jitter, capped at 60s
                    let exp_factor = u64::pow(2, attempts - 1);
                    let mut delay = retry_after.saturating_mul(exp_factor);

                    if delay > 1 {
                        let jitter_factor = thread_rng().gen_range(0.8..1.2);
                        delay = ((delay as f64) * jitter_factor) as u64;
                    }

                    delay = std::cmp::min(delay, 60);

                    debug!(
                        "Rate limited. Retrying after {} seconds (attempt {}/{})",
                        delay, attempts, self.max_retries
                    );

                    tokio::time::sleep(Duration::from_secs(delay)).await;
                    continue;
                }

                return Err(Error::RateLimit {
                    retry_after_secs: retry_after,
                });
            }

            let response_text = response.text().await.map_err(Error::Http)?;

            if status.is_success() {
                return serde_json::from_str(&response_text).map_err(|e| {
                    error!("Failed to parse response: {}", e);
                    Error::UnexpectedResponse(format!("Failed to parse response: {}", e))
                });
            } else {
                error!("API error: {} - {}", status, response_text);

                return if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                    Err(Error::Auth("Invalid API key or credentials".to_string()))
                } else {
                    Err(Error::Api {
                        status_code: status.as_u16(),
                        message: response_text,
                    })
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct TestResponse {
        message: String,
    }

    #[tokio::test]
    async fn test_post_request_success() {
        let mut server = Server::new_async().await;
        let mock_server = server
            .mock("POST", "/v1beta/test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{\"message\": \"success\"}")
            .match_query(mockito::Matcher::Any)
            .expect(1)
            .create_async()
            .await;

        let mut client = HttpClient::with_api_key("test-key".to_string());
        client.set_base_url(server.url());

        let body = serde_json::json!({"test": "data"});
        let response: TestResponse = client.post("test", &body).await.unwrap();
        assert_eq!(response.message, "success");

        mock_server.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth_error() {
        let mut server = Server::new_async().await;
        let mock_server = server
            .mock("POST", "/v1beta/test")
            .with_status(401)
            .with_body("Unauthorized")
            .match_query(mockito::Matcher::Any)
            .create_async()
            .await;

        let mut client = HttpClient::with_api_key("bad-key".to_string());
        client.set_base_url(server.url());

        let body = serde_json::json!({});
        let result: Result<TestResponse> = client.post("test", &body).await;
        assert!(matches!(result, Err(Error::Auth(_))));

        mock_server.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_retry_success() {
        let mut server = Server::new_async().await;

        let mock_rate_limit = server
            .mock("POST", "/v1beta/test")
            .with_status(429)
            .with_header("retry-after", "1")
            .with_body("{\"error\": {\"code\": 429, \"status\": \"RESOURCE_EXHAUSTED\"}}")
            .match_query(mockito::Matcher::Any)
            .expect(1)
            .create_async()
            .await;

        let mock_success = server
            .mock("POST", "/v1beta/test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{\"message\": \"success after retry\"}")
            .match_query(mockito::Matcher::Any)
            .expect(1)
            .create_async()
            .await;

        let options = HttpOptions {
            retry_on_rate_limit: true,
            default_retry_after_secs: 1,
            ..HttpOptions::default()
        };

        let mut client = HttpClient::with_api_key_and_options("test-key".to_string(), options);
        client.set_base_url(server.url());

        let body = serde_json::json!({});
        let response: TestResponse = client.post("test", &body).await.unwrap();
        assert_eq!(response.message, "success after retry");

        mock_rate_limit.assert_async().await;
        mock_success.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_max_retries_exceeded() {
        let mut server = Server::new_async().await;

        let mock_rate_limit = server
            .mock("POST", "/v1beta/test")
            .with_status(429)
            .with_header("retry-after", "1")
            .with_body("{\"error\": {\"code\": 429, \"status\": \"RESOURCE_EXHAUSTED\"}}")
            .match_query(mockito::Matcher::Any)
            .expect(2) // initial request + 1 retry
            .create_async()
            .await;

        let options = HttpOptions {
            retry_on_rate_limit: true,
            max_retries: 1,
            default_retry_after_secs: 1,
            ..HttpOptions::default()
        };

        let mut client = HttpClient::with_api_key_and_options("test-key".to_string(), options);
        client.set_base_url(server.url());

        let body = serde_json::json!({});
        let result: Result<TestResponse> = client.post("test", &body).await;
        assert!(matches!(
            result,
            Err(Error::RateLimit {
                retry_after_secs: 1
            })
        ));

        mock_rate_limit.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_side_rate_limiting() {
        let options = HttpOptions {
            enable_client_side_rate_limiting: true,
            requests_per_minute: 3,
            wait_when_rate_limited: false,
            ..HttpOptions::default()
        };

        let client = HttpClient::with_api_key_and_options("test-key".to_string(), options);

        for _ in 0..3 {
            client.check_rate_limit().await.unwrap();
        }

        let result = client.check_rate_limit().await;
        assert!(matches!(result, Err(Error::RateLimit { .. })));
    }

    #[tokio::test]
    async fn test_client_side_rate_limiting_with_waiting() {
        let options = HttpOptions {
            enable_client_side_rate_limiting: true,
            requests_per_minute: 3,
            wait_when_rate_limited: true,
            ..HttpOptions::default()
        };

        let client = HttpClient::with_api_key_and_options("test-key".to_string(), options);

        for _ in 0..3 {
            client.check_rate_limit().await.unwrap();
        }

        // Age the oldest timestamp out of the window so the next check is free
        {
            let mut timestamps = client.request_timestamps.lock().await;
            if let Some(timestamp) = timestamps.front_mut() {
                *timestamp = Instant::now() - Duration::from_secs(61);
            }
        }

        let start = Instant::now();
        client.check_rate_limit().await.unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
