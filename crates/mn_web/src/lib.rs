use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod dto;
pub mod error;
pub mod handlers;
pub mod state;

pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/noticias/buscar", get(handlers::fetch_news))
        .route(
            "/noticias/relatorios/autores",
            post(handlers::top_authors_by_range),
        )
        .route(
            "/noticias/relatorios/autor/:author_id",
            post(handlers::news_by_author_and_range),
        )
        .layer(cors)
        .with_state(Arc::new(state))
}
