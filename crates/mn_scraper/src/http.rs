use async_trait::async_trait;
use mn_core::{Result, ScraperConfig};
use serde_json::Value;
use tracing::error;

const USER_AGENT: &str = concat!("mercado-news/", env!("CARGO_PKG_VERSION"));

/// Narrow transport interface consumed by the listing provider and the
/// pipeline, so both can be driven by fakes in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String>;

    async fn post_json(&self, url: &str, body: &Value) -> Result<String>;
}

/// Reqwest-backed transport. The per-request timeout comes from the
/// scraper configuration and applies to every call made through this
/// client.
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                error!("GET {} failed: {}", url, e);
                e
            })?;
        Ok(response.text().await?)
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<String> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                error!("POST {} failed: {}", url, e);
                e
            })?;
        Ok(response.text().await?)
    }
}
