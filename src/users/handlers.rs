use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{PublicUser, RegisterRequest, RegisteredUsers},
    services,
};
use crate::{auth::extractors::AuthUser, error::AppResult, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .route("/add-user", post(add_user))
        .route("/registered-users", get(registered_users))
}

pub async fn welcome() -> Json<&'static str> {
    Json("Welcome to Write to Speak")
}

#[instrument(skip(state, payload))]
pub async fn add_user(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    let Json(req) = payload?;
    let user = services::register(state.users.as_ref(), req).await?;
    Ok((StatusCode::CREATED, Json(PublicUser::from(&user))))
}

#[instrument(skip(state, _caller))]
pub async fn registered_users(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> AppResult<Json<RegisteredUsers>> {
    let users = state.users.list_all().await?;
    Ok(Json(RegisteredUsers {
        registered_users: users.iter().map(PublicUser::from).collect(),
    }))
}
