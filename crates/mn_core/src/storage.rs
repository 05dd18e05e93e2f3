use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::types::{Article, Author, AuthorArticleCount};
use crate::Result;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Returns the subset of `urls` that already exist in storage, in one
    /// round trip.
    async fn find_existing_urls(&self, urls: &[String]) -> Result<HashSet<String>>;

    /// Persists a batch of articles and returns them with assigned ids.
    async fn save_articles(&self, articles: Vec<Article>) -> Result<Vec<Article>>;

    /// Articles by one author inside `[start, end]`, newest publish date
    /// first.
    async fn find_by_author_and_range(
        &self,
        author_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Article>>;

    /// Article counts per author inside `[start, end]`, highest count
    /// first.
    async fn count_by_author_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AuthorArticleCount>>;
}

#[async_trait]
pub trait AuthorStore: Send + Sync {
    /// Looks up authors by exact name, in one round trip.
    async fn find_by_names(&self, names: &HashSet<String>) -> Result<Vec<Author>>;

    /// Persists a batch of new authors and returns them with assigned ids.
    async fn save_authors(&self, authors: Vec<Author>) -> Result<Vec<Author>>;

    async fn exists(&self, id: i64) -> Result<bool>;
}
