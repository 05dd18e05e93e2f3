use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A discovered (url, title) pair not yet enriched with body, author or
/// publish date. Identity is the normalized URL: two candidates with the
/// same URL are the same candidate regardless of title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub url: String,
    pub title: String,
}

impl Candidate {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for Candidate {}

impl std::hash::Hash for Candidate {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

/// The result of fetching and parsing one article detail page. Missing
/// fields stay `None`; an empty body is the empty string, not `None`.
#[derive(Debug, Clone)]
pub struct ParsedArticle {
    pub candidate: Candidate,
    pub subtitle: Option<String>,
    pub content: String,
    pub publish_at: Option<DateTime<Utc>>,
    pub author_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: Option<i64>,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: Option<i64>,
    pub url: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub content: String,
    pub author_id: Option<i64>,
    pub publish_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// One row of the top-authors report: how many articles an author
/// published inside the requested range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorArticleCount {
    pub author_id: i64,
    pub author_name: String,
    pub total: i64,
}
