use chrono::Utc;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info};

use mn_core::{
    Article, ArticleStore, Author, AuthorStore, Candidate, ParsedArticle, Result, ScraperConfig,
};

use crate::detail::DetailParser;
use crate::http::Transport;
use crate::listing::ListingProvider;

/// The scrape-dedupe-enrich-persist pipeline.
///
/// One `execute` call discovers candidates, drops the ones already stored,
/// fetches and parses the rest concurrently, resolves authors in a single
/// read/write round trip, and saves every article that came out complete.
/// Re-running with overlapping candidates only ever inserts the genuinely
/// new ones.
pub struct ScrapePipeline {
    listing: ListingProvider,
    parser: DetailParser,
    transport: Arc<dyn Transport>,
    articles: Arc<dyn ArticleStore>,
    authors: Arc<dyn AuthorStore>,
    semaphore: Arc<Semaphore>,
}

impl ScrapePipeline {
    pub fn new(
        config: ScraperConfig,
        transport: Arc<dyn Transport>,
        articles: Arc<dyn ArticleStore>,
        authors: Arc<dyn AuthorStore>,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
        Self {
            listing: ListingProvider::new(transport.clone(), config),
            parser: DetailParser::new(),
            transport,
            articles,
            authors,
            semaphore,
        }
    }

    pub async fn execute(&self, limit: usize) -> Result<Vec<Article>> {
        info!("🚀 Starting scrape run, limit {}", limit);

        let candidates = self.listing.fetch_candidates(limit).await?;
        info!("{} candidates discovered", candidates.len());

        let fresh = self.filter_new(candidates).await?;
        if fresh.is_empty() {
            info!("Nothing new to process");
            return Ok(Vec::new());
        }
        info!("🆕 {} new candidates to process", fresh.len());

        let parsed = self.fetch_and_parse(fresh).await;
        let authors = self.resolve_authors(&parsed).await?;
        self.assemble_and_save(parsed, authors).await
    }

    /// Removes candidates whose URL is already stored, in one batched
    /// lookup.
    async fn filter_new(&self, candidates: Vec<Candidate>) -> Result<Vec<Candidate>> {
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let urls: Vec<String> = candidates.iter().map(|c| c.url.clone()).collect();
        let existing = self.articles.find_existing_urls(&urls).await?;
        if !existing.is_empty() {
            info!("⏭️ {} candidates already stored, skipping", existing.len());
        }

        Ok(candidates
            .into_iter()
            .filter(|c| !existing.contains(&c.url))
            .collect())
    }

    /// Fetches and parses every candidate concurrently, one task per
    /// candidate behind the semaphore cap. A failed candidate is logged
    /// and dropped; it never aborts the batch.
    async fn fetch_and_parse(&self, candidates: Vec<Candidate>) -> Vec<ParsedArticle> {
        let tasks: Vec<_> = candidates
            .into_iter()
            .map(|candidate| {
                let transport = self.transport.clone();
                let semaphore = self.semaphore.clone();
                async move {
                    let _permit = semaphore.acquire().await.ok()?;
                    match transport.get_text(&candidate.url).await {
                        Ok(html) => Some(self.parser.parse(&html, &candidate)),
                        Err(e) => {
                            error!("❌ Failed to process {}: {}", candidate.url, e);
                            None
                        }
                    }
                }
            })
            .collect();

        let parsed: Vec<ParsedArticle> = join_all(tasks).await.into_iter().flatten().collect();
        info!("📄 {} articles parsed", parsed.len());
        parsed
    }

    /// Resolves the distinct author names of the batch to `Author` records,
    /// creating the missing ones. At most one storage read and one write
    /// per run; a name referenced by many articles is created once.
    async fn resolve_authors(&self, parsed: &[ParsedArticle]) -> Result<HashMap<String, Author>> {
        let names: HashSet<String> = parsed
            .iter()
            .filter_map(|p| p.author_name.clone())
            .collect();
        if names.is_empty() {
            return Ok(HashMap::new());
        }

        let known = self.authors.find_by_names(&names).await?;
        let mut resolved: HashMap<String, Author> =
            known.into_iter().map(|a| (a.name.clone(), a)).collect();

        let missing: Vec<Author> = names
            .iter()
            .filter(|name| !resolved.contains_key(*name))
            .map(|name| Author::new(name.clone()))
            .collect();
        if missing.is_empty() {
            return Ok(resolved);
        }

        info!("✍️ Creating {} new authors", missing.len());
        for author in self.authors.save_authors(missing).await? {
            resolved.insert(author.name.clone(), author);
        }
        Ok(resolved)
    }

    /// Joins parsed articles to their resolved authors, drops the
    /// incomplete ones (missing publish date or author), and persists the
    /// rest in one batch.
    async fn assemble_and_save(
        &self,
        parsed: Vec<ParsedArticle>,
        authors: HashMap<String, Author>,
    ) -> Result<Vec<Article>> {
        let now = Utc::now();
        let complete: Vec<Article> = parsed
            .into_iter()
            .filter_map(|p| {
                let publish_at = p.publish_at?;
                let author = authors.get(p.author_name.as_deref()?)?;
                Some(Article {
                    id: None,
                    url: p.candidate.url,
                    title: p.candidate.title,
                    subtitle: p.subtitle,
                    content: p.content,
                    author_id: author.id,
                    publish_at,
                    created_at: now,
                })
            })
            .collect();

        if complete.is_empty() {
            info!("No complete articles to save");
            return Ok(Vec::new());
        }

        info!("💾 Saving {} new articles", complete.len());
        self.articles.save_articles(complete).await
    }
}
