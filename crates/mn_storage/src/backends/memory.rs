use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use mn_core::{Article, ArticleStore, Author, AuthorArticleCount, AuthorStore, Error, Result};

#[derive(Default)]
struct MemoryStore {
    articles: Vec<Article>,
    authors: Vec<Author>,
    next_article_id: i64,
    next_author_id: i64,
}

/// In-memory backend. Ids are assigned monotonically; the URL and author
/// name uniqueness constraints of the relational schema are enforced the
/// same way, surfacing as `Error::Conflict`.
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryStore::default())),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArticleStore for MemoryStorage {
    async fn find_existing_urls(&self, urls: &[String]) -> Result<HashSet<String>> {
        let store = self.store.read().await;
        let requested: HashSet<&String> = urls.iter().collect();
        Ok(store
            .articles
            .iter()
            .filter(|a| requested.contains(&a.url))
            .map(|a| a.url.clone())
            .collect())
    }

    async fn save_articles(&self, articles: Vec<Article>) -> Result<Vec<Article>> {
        let mut store = self.store.write().await;
        let mut saved = Vec::with_capacity(articles.len());
        for mut article in articles {
            if store.articles.iter().any(|a| a.url == article.url) {
                return Err(Error::Conflict(format!(
                    "article url already exists: {}",
                    article.url
                )));
            }
            store.next_article_id += 1;
            article.id = Some(store.next_article_id);
            store.articles.push(article.clone());
            saved.push(article);
        }
        Ok(saved)
    }

    async fn find_by_author_and_range(
        &self,
        author_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        let mut found: Vec<Article> = store
            .articles
            .iter()
            .filter(|a| {
                a.author_id == Some(author_id) && a.publish_at >= start && a.publish_at <= end
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| b.publish_at.cmp(&a.publish_at));
        Ok(found)
    }

    async fn count_by_author_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AuthorArticleCount>> {
        let store = self.store.read().await;
        let mut counts: HashMap<i64, i64> = HashMap::new();
        for article in &store.articles {
            if article.publish_at < start || article.publish_at > end {
                continue;
            }
            if let Some(author_id) = article.author_id {
                *counts.entry(author_id).or_insert(0) += 1;
            }
        }

        let mut rows: Vec<AuthorArticleCount> = counts
            .into_iter()
            .filter_map(|(author_id, total)| {
                let author = store.authors.iter().find(|a| a.id == Some(author_id))?;
                Some(AuthorArticleCount {
                    author_id,
                    author_name: author.name.clone(),
                    total,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.total.cmp(&a.total));
        Ok(rows)
    }
}

#[async_trait]
impl AuthorStore for MemoryStorage {
    async fn find_by_names(&self, names: &HashSet<String>) -> Result<Vec<Author>> {
        let store = self.store.read().await;
        Ok(store
            .authors
            .iter()
            .filter(|a| names.contains(&a.name))
            .cloned()
            .collect())
    }

    async fn save_authors(&self, authors: Vec<Author>) -> Result<Vec<Author>> {
        let mut store = self.store.write().await;
        let mut saved = Vec::with_capacity(authors.len());
        for mut author in authors {
            if store.authors.iter().any(|a| a.name == author.name) {
                return Err(Error::Conflict(format!(
                    "author name already exists: {}",
                    author.name
                )));
            }
            store.next_author_id += 1;
            author.id = Some(store.next_author_id);
            store.authors.push(author.clone());
            saved.push(author);
        }
        Ok(saved)
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let store = self.store.read().await;
        Ok(store.authors.iter().any(|a| a.id == Some(id)))
    }
}
