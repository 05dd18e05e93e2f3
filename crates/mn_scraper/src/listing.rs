use scraper::{Html, Selector};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use mn_core::{Candidate, Error, Result, ScraperConfig};

use crate::http::Transport;
use crate::normalize::normalize;

/// Anchors of the article teaser cards on the static listing page.
const CARD_SELECTORS: &str = "div[data-ds-component='card-xl'] h2 a, \
     div[data-ds-component='card-sm'] h2 a, \
     div.related-link a";

/// Discovers candidate articles from the two known sources: the static
/// listing page and the paginated JSON API. Both paths normalize URLs and
/// skip entries with an empty href or title; the merged result is
/// deduplicated by URL with the HTML page winning ties.
pub struct ListingProvider {
    transport: Arc<dyn Transport>,
    config: ScraperConfig,
}

impl ListingProvider {
    pub fn new(transport: Arc<dyn Transport>, config: ScraperConfig) -> Self {
        Self { transport, config }
    }

    /// Builds the candidate list, at most `limit` entries. The API is only
    /// consulted when the listing page alone cannot satisfy the limit.
    pub async fn fetch_candidates(&self, limit: usize) -> Result<Vec<Candidate>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let initial = self.fetch_listing_page().await?;
        if initial.len() >= limit {
            info!("Limit of {} met by the listing page alone", limit);
            return Ok(dedupe(initial, limit));
        }

        info!("Fetching additional candidates from the API to reach the limit of {}", limit);
        let api = self.fetch_api_page().await?;

        let merged = dedupe(initial.into_iter().chain(api).collect(), limit);
        info!("🔎 {} unique candidates discovered", merged.len());
        Ok(merged)
    }

    async fn fetch_listing_page(&self) -> Result<Vec<Candidate>> {
        let listing_url = self.config.listing_url();
        info!("📰 Fetching listing page: {}", listing_url);

        let html = self
            .transport
            .get_text(&listing_url)
            .await
            .map_err(|e| Error::Discovery(format!("listing page fetch failed: {}", e)))?;

        let document = Html::parse_document(&html);
        let selector = Selector::parse(CARD_SELECTORS)
            .map_err(|e| Error::Discovery(format!("invalid card selector: {}", e)))?;

        let mut candidates = Vec::new();
        for link in document.select(&selector) {
            let href = link.value().attr("href").unwrap_or("").trim();
            let title = link.text().collect::<String>().trim().to_string();
            if href.is_empty() || title.is_empty() {
                continue;
            }
            candidates.push(Candidate::new(normalize(href, &self.config.base_url), title));
        }

        info!("Found {} candidates on the listing page", candidates.len());
        Ok(candidates)
    }

    async fn fetch_api_page(&self) -> Result<Vec<Candidate>> {
        let body = json!({
            "post_id": self.config.api_post_id,
            "categories": [1],
            "tags": [],
        });

        let response = self
            .transport
            .post_json(&self.config.api_url, &body)
            .await
            .map_err(|e| Error::Discovery(format!("listing API request failed: {}", e)))?;

        let root: Value = serde_json::from_str(&response)
            .map_err(|e| Error::Discovery(format!("listing API returned invalid JSON: {}", e)))?;
        let entries = root
            .as_array()
            .ok_or_else(|| Error::Discovery("listing API response is not an array".to_string()))?;

        let mut candidates = Vec::new();
        for entry in entries {
            let title = entry
                .get("post_title")
                .and_then(Value::as_str)
                .unwrap_or("")
                .trim();
            let permalink = entry
                .get("post_permalink")
                .and_then(Value::as_str)
                .unwrap_or("")
                .trim();
            if title.is_empty() || permalink.is_empty() {
                continue;
            }
            candidates.push(Candidate::new(
                normalize(permalink, &self.config.base_url),
                title,
            ));
        }

        info!("Found {} candidates in the API response", candidates.len());
        Ok(candidates)
    }
}

/// Order-preserving dedup by URL, truncated to `limit`. First occurrence
/// wins, so HTML-sourced candidates take precedence when the iterator
/// chains HTML before API.
fn dedupe(candidates: Vec<Candidate>, limit: usize) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for candidate in candidates {
        if unique.len() == limit {
            break;
        }
        if seen.insert(candidate.url.clone()) {
            unique.push(candidate);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeTransport {
        listing_html: String,
        api_json: String,
        api_calls: Mutex<usize>,
    }

    impl FakeTransport {
        fn new(listing_html: &str, api_json: &str) -> Self {
            Self {
                listing_html: listing_html.to_string(),
                api_json: api_json.to_string(),
                api_calls: Mutex::new(0),
            }
        }

        fn api_calls(&self) -> usize {
            *self.api_calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn get_text(&self, _url: &str) -> Result<String> {
            Ok(self.listing_html.clone())
        }

        async fn post_json(&self, _url: &str, _body: &Value) -> Result<String> {
            *self.api_calls.lock().unwrap() += 1;
            Ok(self.api_json.clone())
        }
    }

    fn card(href: &str, title: &str) -> String {
        format!(
            "<div data-ds-component='card-xl'><h2><a href='{}'>{}</a></h2></div>",
            href, title
        )
    }

    fn provider(transport: Arc<FakeTransport>) -> ListingProvider {
        let config = ScraperConfig {
            base_url: "https://news.example.com.br".to_string(),
            ..ScraperConfig::default()
        };
        ListingProvider::new(transport, config)
    }

    #[tokio::test]
    async fn test_limit_met_by_html_skips_api() {
        let html = format!("{}{}{}", card("/a", "A"), card("/b", "B"), card("/c", "C"));
        let transport = Arc::new(FakeTransport::new(&html, "[]"));
        let candidates = provider(transport.clone()).fetch_candidates(2).await.unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "A");
        assert_eq!(candidates[1].title, "B");
        assert_eq!(transport.api_calls(), 0);
    }

    #[tokio::test]
    async fn test_merge_dedupes_by_url_html_wins() {
        let html = card("/a", "A");
        let api = r#"[
            {"post_title": "A-dup", "post_permalink": "/a"},
            {"post_title": "B", "post_permalink": "/b"}
        ]"#;
        let transport = Arc::new(FakeTransport::new(&html, api));
        let candidates = provider(transport.clone()).fetch_candidates(3).await.unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "A");
        assert_eq!(candidates[1].title, "B");
        assert_eq!(transport.api_calls(), 1);
    }

    #[tokio::test]
    async fn test_entries_without_href_or_title_are_skipped() {
        let html = format!(
            "{}<div data-ds-component='card-sm'><h2><a href=''>Sem link</a></h2></div>\
             <div data-ds-component='card-sm'><h2><a href='/vazio'></a></h2></div>",
            card("/a", "A")
        );
        let api = r#"[
            {"post_title": "", "post_permalink": "/x"},
            {"post_title": "Sem permalink", "post_permalink": ""}
        ]"#;
        let transport = Arc::new(FakeTransport::new(&html, api));
        let candidates = provider(transport).fetch_candidates(10).await.unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "https://news.example.com.br/a");
    }

    #[tokio::test]
    async fn test_zero_limit_short_circuits() {
        let transport = Arc::new(FakeTransport::new("ignored", "[]"));
        let candidates = provider(transport.clone()).fetch_candidates(0).await.unwrap();
        assert!(candidates.is_empty());
        assert_eq!(transport.api_calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_api_json_is_a_discovery_error() {
        let transport = Arc::new(FakeTransport::new("", "not json"));
        let result = provider(transport).fetch_candidates(5).await;
        assert!(matches!(result, Err(Error::Discovery(_))));
    }

    #[tokio::test]
    async fn test_related_link_cards_are_selected() {
        let html = "<div class='related-link'><a href='/rel'>Relacionada</a></div>";
        let transport = Arc::new(FakeTransport::new(html, "[]"));
        let candidates = provider(transport).fetch_candidates(1).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "https://news.example.com.br/rel");
    }
}
