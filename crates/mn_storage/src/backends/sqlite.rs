use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use mn_core::{Article, ArticleStore, Author, AuthorArticleCount, AuthorStore, Error, Result};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS authors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        subtitle TEXT,
        content TEXT NOT NULL,
        author_id INTEGER REFERENCES authors(id),
        publish_at TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    // Add future migrations here
];

/// SQLite backend. Timestamps are stored as RFC 3339 UTC strings, which
/// keeps range comparisons valid as plain string comparisons.
pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db_path.as_ref())
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::Database(format!("failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn encode_ts(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn decode_ts(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Database(format!("failed to parse stored timestamp: {}", e)))
}

fn db_error(e: sqlx::Error) -> Error {
    if let sqlx::Error::Database(ref db) = e {
        if db.message().contains("UNIQUE constraint failed") {
            return Error::Conflict(db.message().to_string());
        }
    }
    Error::Database(e.to_string())
}

fn map_article(row: &SqliteRow) -> Result<Article> {
    Ok(Article {
        id: Some(row.get("id")),
        url: row.get("url"),
        title: row.get("title"),
        subtitle: row.get("subtitle"),
        content: row.get("content"),
        author_id: row.get("author_id"),
        publish_at: decode_ts(&row.get::<String, _>("publish_at"))?,
        created_at: decode_ts(&row.get::<String, _>("created_at"))?,
    })
}

#[async_trait]
impl ArticleStore for SqliteStorage {
    async fn find_existing_urls(&self, urls: &[String]) -> Result<HashSet<String>> {
        if urls.is_empty() {
            return Ok(HashSet::new());
        }

        let sql = format!(
            "SELECT url FROM articles WHERE url IN ({})",
            placeholders(urls.len())
        );
        let mut query = sqlx::query(&sql);
        for url in urls {
            query = query.bind(url);
        }

        let rows = query.fetch_all(&*self.pool).await.map_err(db_error)?;
        Ok(rows.iter().map(|row| row.get("url")).collect())
    }

    async fn save_articles(&self, articles: Vec<Article>) -> Result<Vec<Article>> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let mut saved = Vec::with_capacity(articles.len());

        for mut article in articles {
            let result = sqlx::query(
                r#"
                INSERT INTO articles
                (url, title, subtitle, content, author_id, publish_at, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&article.url)
            .bind(&article.title)
            .bind(article.subtitle.as_deref())
            .bind(&article.content)
            .bind(article.author_id)
            .bind(encode_ts(article.publish_at))
            .bind(encode_ts(article.created_at))
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

            article.id = Some(result.last_insert_rowid());
            saved.push(article);
        }

        tx.commit().await.map_err(db_error)?;
        Ok(saved)
    }

    async fn find_by_author_and_range(
        &self,
        author_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM articles
            WHERE author_id = ? AND publish_at >= ? AND publish_at <= ?
            ORDER BY publish_at DESC
            "#,
        )
        .bind(author_id)
        .bind(encode_ts(start))
        .bind(encode_ts(end))
        .fetch_all(&*self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(map_article).collect()
    }

    async fn count_by_author_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AuthorArticleCount>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id AS author_id, a.name AS author_name, COUNT(n.id) AS total
            FROM articles n
            INNER JOIN authors a ON a.id = n.author_id
            WHERE n.publish_at >= ? AND n.publish_at <= ?
            GROUP BY a.id, a.name
            ORDER BY COUNT(n.id) DESC
            "#,
        )
        .bind(encode_ts(start))
        .bind(encode_ts(end))
        .fetch_all(&*self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows
            .iter()
            .map(|row| AuthorArticleCount {
                author_id: row.get("author_id"),
                author_name: row.get("author_name"),
                total: row.get("total"),
            })
            .collect())
    }
}

#[async_trait]
impl AuthorStore for SqliteStorage {
    async fn find_by_names(&self, names: &HashSet<String>) -> Result<Vec<Author>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT id, name, created_at FROM authors WHERE name IN ({})",
            placeholders(names.len())
        );
        let mut query = sqlx::query(&sql);
        for name in names {
            query = query.bind(name);
        }

        let rows = query.fetch_all(&*self.pool).await.map_err(db_error)?;
        rows.iter()
            .map(|row| {
                Ok(Author {
                    id: Some(row.get("id")),
                    name: row.get("name"),
                    created_at: decode_ts(&row.get::<String, _>("created_at"))?,
                })
            })
            .collect()
    }

    async fn save_authors(&self, authors: Vec<Author>) -> Result<Vec<Author>> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let mut saved = Vec::with_capacity(authors.len());

        for mut author in authors {
            let result = sqlx::query("INSERT INTO authors (name, created_at) VALUES (?, ?)")
                .bind(&author.name)
                .bind(encode_ts(author.created_at))
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;

            author.id = Some(result.last_insert_rowid());
            saved.push(author);
        }

        tx.commit().await.map_err(db_error)?;
        Ok(saved)
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM authors WHERE id = ?) AS present")
            .bind(id)
            .fetch_one(&*self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.get::<i64, _>("present") != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn article(url: &str, author_id: Option<i64>, publish_at: DateTime<Utc>) -> Article {
        Article {
            id: None,
            url: url.to_string(),
            title: "Título".to_string(),
            subtitle: Some("Subtítulo".to_string()),
            content: "Conteúdo".to_string(),
            author_id,
            publish_at,
            created_at: Utc::now(),
        }
    }

    async fn storage() -> (tempfile::TempDir, SqliteStorage) {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(dir.path().join("test.db")).await.unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn test_roundtrip_article_with_author() {
        let (_dir, storage) = storage().await;

        let author = storage
            .save_authors(vec![Author::new("João Silva")])
            .await
            .unwrap()
            .remove(0);
        let saved = storage
            .save_articles(vec![article("/a", author.id, at(2024, 1, 15))])
            .await
            .unwrap();
        assert!(saved[0].id.is_some());

        let found = storage
            .find_by_author_and_range(author.id.unwrap(), at(2024, 1, 1), at(2024, 1, 31))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "/a");
        assert_eq!(found[0].subtitle.as_deref(), Some("Subtítulo"));
        assert_eq!(found[0].publish_at, at(2024, 1, 15));
    }

    #[tokio::test]
    async fn test_existing_urls_batch_lookup() {
        let (_dir, storage) = storage().await;
        storage
            .save_articles(vec![article("/a", None, at(2024, 1, 1))])
            .await
            .unwrap();

        let existing = storage
            .find_existing_urls(&["/a".to_string(), "/b".to_string()])
            .await
            .unwrap();
        assert_eq!(existing.len(), 1);
        assert!(existing.contains("/a"));
    }

    #[tokio::test]
    async fn test_unique_url_violation_is_conflict() {
        let (_dir, storage) = storage().await;
        storage
            .save_articles(vec![article("/a", None, at(2024, 1, 1))])
            .await
            .unwrap();

        let result = storage
            .save_articles(vec![article("/a", None, at(2024, 1, 2))])
            .await;
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn test_top_authors_report() {
        let (_dir, storage) = storage().await;
        let authors = storage
            .save_authors(vec![Author::new("João Silva"), Author::new("Maria Santos")])
            .await
            .unwrap();
        storage
            .save_articles(vec![
                article("/1", authors[0].id, at(2024, 1, 2)),
                article("/2", authors[1].id, at(2024, 1, 3)),
                article("/3", authors[1].id, at(2024, 1, 4)),
                article("/fora", authors[1].id, at(2023, 1, 1)),
            ])
            .await
            .unwrap();

        let rows = storage
            .count_by_author_in_range(at(2024, 1, 1), at(2024, 1, 31))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].author_name, "Maria Santos");
        assert_eq!(rows[0].total, 2);
        assert_eq!(rows[1].author_name, "João Silva");
        assert_eq!(rows[1].total, 1);
    }

    #[tokio::test]
    async fn test_author_exists() {
        let (_dir, storage) = storage().await;
        let author = storage
            .save_authors(vec![Author::new("João Silva")])
            .await
            .unwrap()
            .remove(0);
        assert!(storage.exists(author.id.unwrap()).await.unwrap());
        assert!(!storage.exists(9999).await.unwrap());
    }
}
