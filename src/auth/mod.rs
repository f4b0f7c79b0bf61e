use crate::state::AppState;
use axum::Router;

pub mod claims;
pub(crate) mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod services;

pub use dto::TokenResponse;

/// Routes mounted under `/val/auth`.
pub fn router() -> Router<AppState> {
    Router::new().nest("/val/auth", handlers::auth_routes())
}
