use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod model;
pub mod services;

/// Routes mounted under `/snippets`.
pub fn router() -> Router<AppState> {
    Router::new().nest("/snippets", handlers::snippet_routes())
}
