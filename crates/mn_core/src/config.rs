use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://news.example.com.br";
const DEFAULT_LISTING_PATH: &str = "/mercados/";
const DEFAULT_API_URL: &str = "https://news.example.com.br/wp-json/listing/posts";
const DEFAULT_API_POST_ID: &str = "0";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Configuration for the scraping pipeline. Built once and passed into the
/// listing provider and detail engine constructors; there is no ambient
/// global state.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Base URL of the source site, also used to resolve relative hrefs.
    pub base_url: String,
    /// Path of the static listing page, appended to `base_url`.
    pub listing_path: String,
    /// Full URL of the JSON listing API.
    pub api_url: String,
    /// `post_id` parameter sent in the API request body.
    pub api_post_id: String,
    /// Per-request timeout for every outbound HTTP call.
    pub request_timeout: Duration,
    /// Cap on concurrent detail-page fetches.
    pub max_concurrency: usize,
}

impl ScraperConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env_or("MN_BASE_URL", DEFAULT_BASE_URL),
            listing_path: env_or("MN_LISTING_PATH", DEFAULT_LISTING_PATH),
            api_url: env_or("MN_API_URL", DEFAULT_API_URL),
            api_post_id: env_or("MN_API_POST_ID", DEFAULT_API_POST_ID),
            request_timeout: Duration::from_millis(
                env_parse("MN_HTTP_TIMEOUT_MS", DEFAULT_TIMEOUT_MS),
            ),
            max_concurrency: env_parse("MN_MAX_CONCURRENCY", DEFAULT_MAX_CONCURRENCY),
        }
    }

    /// The absolute URL of the static listing page.
    pub fn listing_url(&self) -> String {
        format!("{}{}", self.base_url, self.listing_path)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            listing_path: DEFAULT_LISTING_PATH.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            api_post_id: DEFAULT_API_POST_ID.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
