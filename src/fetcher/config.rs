//! Fetcher configuration
//!
//! Page budget, request timeout, and user agent for a fetch pass, with a
//! builder for the non-default cases.

use std::time::Duration;

/// Configuration for the fetcher
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Maximum number of distinct pages to visit
    pub max_pages: u32,

    /// Per-request timeout
    pub timeout: Duration,

    /// User agent to use for requests
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_pages: 1,
            timeout: Duration::from_secs(5),
            user_agent: format!("bookscout/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Builder for FetcherConfig
#[derive(Debug, Default)]
pub struct FetcherConfigBuilder {
    config: FetcherConfig,
}

impl FetcherConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: FetcherConfig::default(),
        }
    }

    /// Set the maximum number of pages to visit
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    /// Set the per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> FetcherConfig {
        self.config
    }
}

impl FetcherConfig {
    /// Create a new builder
    pub fn builder() -> FetcherConfigBuilder {
        FetcherConfigBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FetcherConfig::default();
        assert_eq!(config.max_pages, 1);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_builder() {
        let config = FetcherConfig::builder()
            .max_pages(3)
            .timeout(Duration::from_secs(10))
            .user_agent("test-agent")
            .build();
        assert_eq!(config.max_pages, 3);
        assert_eq!(config.user_agent, "test-agent");
    }
}
