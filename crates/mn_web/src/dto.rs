use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use mn_core::dates;
use mn_core::{Article, AuthorArticleCount, Error, Result};

pub const MSG_ARTICLES_SAVED: &str = "Notícias salvas com sucesso!";
pub const MSG_AUTHORS_FOUND: &str = "Autores encontrados com sucesso!";
pub const MSG_ARTICLES_FOUND: &str = "Notícias encontradas com sucesso!";

const MSG_INVALID_RANGE: &str = "Data de início posterior à data de fim.";
const MSG_FUTURE_DATE: &str = "Datas futuras não são permitidas.";

/// Date range accepted by the reporting endpoints, wire format
/// `dd/MM/yyyy HH:mm`.
#[derive(Debug, Clone, Deserialize)]
pub struct DateRangeRequest {
    #[serde(rename = "inicio", deserialize_with = "wire_datetime")]
    pub start: NaiveDateTime,
    #[serde(rename = "fim", deserialize_with = "wire_datetime")]
    pub end: NaiveDateTime,
}

impl DateRangeRequest {
    /// Validates the range and expands it to whole-day UTC bounds:
    /// `[inicio 00:00:00, fim 23:59:59]`.
    pub fn day_bounds(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        if self.start > self.end {
            return Err(Error::InvalidQuery(MSG_INVALID_RANGE.to_string()));
        }
        let now = Utc::now().naive_utc();
        if self.start > now || self.end > now {
            return Err(Error::InvalidQuery(MSG_FUTURE_DATE.to_string()));
        }
        Ok((dates::start_of_day(self.start), dates::end_of_day(self.end)))
    }
}

fn wire_datetime<'de, D>(deserializer: D) -> std::result::Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    dates::parse_wire(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "data inválida: '{}' (formato esperado: dd/MM/yyyy HH:mm)",
            raw
        ))
    })
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ResponseEnvelope<T> {
    pub data: Option<T>,
    pub status: u16,
    #[serde(rename = "mensagem")]
    pub message: String,
    pub errors: Vec<String>,
}

impl<T> ResponseEnvelope<T> {
    pub fn ok(data: T, message: &str) -> Self {
        Self {
            data: Some(data),
            status: 200,
            message: message.to_string(),
            errors: Vec::new(),
        }
    }
}

impl ResponseEnvelope<()> {
    pub fn error(status: u16, message: String, errors: Vec<String>) -> Self {
        Self {
            data: None,
            status,
            message,
            errors,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResponse {
    pub id: Option<i64>,
    pub url: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub content: String,
    pub author_id: Option<i64>,
    pub publish_date: String,
    pub created_at: String,
}

impl From<Article> for ArticleResponse {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            url: article.url,
            title: article.title,
            subtitle: article.subtitle,
            content: article.content,
            author_id: article.author_id,
            publish_date: dates::format_wire(article.publish_at),
            created_at: dates::format_wire(article.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorCountResponse {
    pub id: i64,
    pub name: String,
    pub news_count: i64,
}

impl From<AuthorArticleCount> for AuthorCountResponse {
    fn from(row: AuthorArticleCount) -> Self {
        Self {
            id: row.author_id,
            name: row.author_name,
            news_count: row.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(json: &str) -> std::result::Result<DateRangeRequest, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_deserializes_wire_format() {
        let dto = range(r#"{"inicio": "01/01/2024 00:00", "fim": "31/01/2024 18:30"}"#).unwrap();
        let (start, end) = dto.day_bounds().unwrap();
        assert_eq!(start.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-01-31T23:59:59+00:00");
    }

    #[test]
    fn test_rejects_iso_dates() {
        assert!(range(r#"{"inicio": "2024-01-01T00:00:00", "fim": "31/01/2024 18:30"}"#).is_err());
    }

    #[test]
    fn test_start_after_end_is_invalid() {
        let dto = range(r#"{"inicio": "10/01/2024 00:00", "fim": "01/01/2024 00:00"}"#).unwrap();
        assert!(matches!(dto.day_bounds(), Err(Error::InvalidQuery(_))));
    }

    #[test]
    fn test_future_dates_are_invalid() {
        let dto = range(r#"{"inicio": "01/01/2090 00:00", "fim": "02/01/2090 00:00"}"#).unwrap();
        assert!(matches!(dto.day_bounds(), Err(Error::InvalidQuery(_))));
    }

    #[test]
    fn test_article_response_uses_wire_dates() {
        let article = Article {
            id: Some(7),
            url: "/a".to_string(),
            title: "Título".to_string(),
            subtitle: None,
            content: String::new(),
            author_id: Some(1),
            publish_at: dates::parse_publish_datetime("2024-01-15T10:00:00-03:00").unwrap(),
            created_at: dates::parse_publish_datetime("2024-01-16T00:00:00Z").unwrap(),
        };
        let response = ArticleResponse::from(article);
        assert_eq!(response.publish_date, "15/01/2024 13:00");
        assert_eq!(response.created_at, "16/01/2024 00:00");
    }
}
