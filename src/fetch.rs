//! Outbound GET capability.
//!
//! Everything that talks to the BBC goes through [`Fetcher`], so listings and
//! the resolver can be driven from canned documents in tests.

use std::time::Duration;

use async_trait::async_trait;

use crate::{
    config::AppConfig,
    error::{CatalogueError, Result},
};

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the decoded response body.
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// `reqwest`-backed fetcher with an optional bounded retry.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    retries: u32,
}

impl HttpFetcher {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(config.user_agent.as_str());

        if let Some(p) = config.proxy.as_deref() {
            if !p.is_empty() {
                builder = builder.proxy(reqwest::Proxy::all(p)?);
            }
        }

        Ok(Self {
            client: builder.build()?,
            retries: config.fetch_retries,
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        let fail = |reason: String| CatalogueError::Fetch {
            url: url.to_string(),
            reason,
        };

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(fail(format!("HTTP {}", resp.status())));
        }

        resp.text().await.map_err(|e| fail(e.to_string()))
    }
}

/// 2^n seconds, capped at 64s.
fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(6))
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => {
                    tracing::debug!("GET {url}: {} chars", body.len());
                    return Ok(body);
                }
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    let delay = backoff(attempt);
                    tracing::warn!(
                        "{e} (attempt {attempt}/{}), retrying in {}s",
                        self.retries,
                        delay.as_secs()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use super::*;

    /// Serves fixed bodies keyed by exact URL; anything else is a fetch error.
    #[derive(Debug, Default)]
    pub struct CannedFetcher {
        bodies: HashMap<String, String>,
    }

    impl CannedFetcher {
        pub fn with(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
            self.bodies.insert(url.into(), body.into());
            self
        }
    }

    #[async_trait]
    impl Fetcher for CannedFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String> {
            self.bodies
                .get(url)
                .cloned()
                .ok_or_else(|| CatalogueError::Fetch {
                    url: url.to_string(),
                    reason: "HTTP 404 Not Found".to_string(),
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_proxy_from_config() {
        let config = AppConfig {
            proxy: Some("http://127.0.0.1:3128".into()),
            fetch_retries: 2,
            ..AppConfig::default()
        };
        let fetcher = HttpFetcher::new(&config).unwrap();
        assert_eq!(fetcher.retries, 2);
    }

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff(1), Duration::from_secs(2));
        assert_eq!(backoff(3), Duration::from_secs(8));
        assert_eq!(backoff(6), Duration::from_secs(64));
        assert_eq!(backoff(200), Duration::from_secs(64));
    }

    #[tokio::test]
    async fn canned_fetcher_reports_missing_urls_as_fetch_errors() {
        let fetcher = testing::CannedFetcher::default().with("http://a/", "body");
        assert_eq!(fetcher.fetch_text("http://a/").await.unwrap(), "body");
        let err = fetcher.fetch_text("http://b/").await.unwrap_err();
        assert_eq!(err.kind(), "fetch");
    }
}
