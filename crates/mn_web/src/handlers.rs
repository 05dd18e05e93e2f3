use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use mn_core::Error;

use crate::dto::{
    ArticleResponse, AuthorCountResponse, DateRangeRequest, ResponseEnvelope, MSG_ARTICLES_FOUND,
    MSG_ARTICLES_SAVED, MSG_AUTHORS_FOUND,
};
use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 15;
const MSG_AUTHOR_NOT_FOUND: &str = "Autor não encontrado.";

#[derive(Debug, Deserialize)]
pub struct FetchParams {
    pub limit: Option<usize>,
}

/// `GET /noticias/buscar?limit=` — runs one pipeline pass and returns the
/// newly saved articles.
pub async fn fetch_news(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FetchParams>,
) -> Result<Json<ResponseEnvelope<Vec<ArticleResponse>>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let saved = state.pipeline.execute(limit).await?;

    let data: Vec<ArticleResponse> = saved.into_iter().map(ArticleResponse::from).collect();
    Ok(Json(ResponseEnvelope::ok(data, MSG_ARTICLES_SAVED)))
}

/// `POST /noticias/relatorios/autores` — authors ranked by article count
/// inside the requested range.
pub async fn top_authors_by_range(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<ResponseEnvelope<Vec<AuthorCountResponse>>>, ApiError> {
    let range = parse_range(body)?;
    let (start, end) = range.day_bounds()?;

    let rows = state.articles.count_by_author_in_range(start, end).await?;
    let data: Vec<AuthorCountResponse> = rows.into_iter().map(AuthorCountResponse::from).collect();
    Ok(Json(ResponseEnvelope::ok(data, MSG_AUTHORS_FOUND)))
}

/// `POST /noticias/relatorios/autor/:author_id` — one author's articles
/// inside the requested range, newest first.
pub async fn news_by_author_and_range(
    State(state): State<Arc<AppState>>,
    Path(author_id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<ResponseEnvelope<Vec<ArticleResponse>>>, ApiError> {
    if !state.authors.exists(author_id).await? {
        return Err(Error::NotFound(MSG_AUTHOR_NOT_FOUND.to_string()).into());
    }

    let range = parse_range(body)?;
    let (start, end) = range.day_bounds()?;

    let articles = state
        .articles
        .find_by_author_and_range(author_id, start, end)
        .await?;
    let data: Vec<ArticleResponse> = articles.into_iter().map(ArticleResponse::from).collect();
    Ok(Json(ResponseEnvelope::ok(data, MSG_ARTICLES_FOUND)))
}

/// Parses the range body by hand so a malformed date surfaces as 400, not
/// as an extractor rejection.
fn parse_range(body: Value) -> Result<DateRangeRequest, ApiError> {
    serde_json::from_value(body)
        .map_err(|e| ApiError(Error::InvalidQuery(e.to_string())))
}
