use crate::state::AppState;
use axum::{routing::post, Router};

pub mod dto;
pub mod handlers;
pub mod memory;
pub mod repo;
pub mod repo_types;
pub mod services;

/// Routes under `/users`, plus the legacy top-level `/add-user`.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/users", handlers::user_routes())
        .route("/add-user", post(handlers::add_user))
}
