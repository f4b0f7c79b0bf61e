use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;

use super::{
    dto::{LoginRequest, LogoutRequest, TokenResponse},
    extractors::AuthUser,
    jwt::JwtKeys,
    services,
};
use crate::{error::AppResult, state::AppState, users::dto::PublicUser};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh", post(refresh))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<TokenResponse>> {
    let Json(req) = payload?;
    let auth_token =
        services::login(state.users.as_ref(), &state.jwt, req, OffsetDateTime::now_utc()).await?;
    Ok(Json(TokenResponse { auth_token }))
}

#[instrument(skip(state, claims, payload))]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    payload: Option<Json<LogoutRequest>>,
) -> AppResult<Json<PublicUser>> {
    let body = payload.map(|Json(b)| b).unwrap_or_default();
    let user = services::logout(
        state.users.as_ref(),
        &claims,
        body.email.as_deref(),
        OffsetDateTime::now_utc(),
    )
    .await?;
    Ok(Json(PublicUser::from(&user)))
}

#[instrument(skip(state, keys, claims))]
pub async fn refresh(
    State(state): State<AppState>,
    State(keys): State<JwtKeys>,
    AuthUser(claims): AuthUser,
) -> AppResult<Json<TokenResponse>> {
    let auth_token =
        services::refresh(state.users.as_ref(), &keys, &claims, OffsetDateTime::now_utc()).await?;
    Ok(Json(TokenResponse { auth_token }))
}
