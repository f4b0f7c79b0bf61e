use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{
        AddSnippetRequest, AllSnippetsResponse, DeleteSnippetRequest, OwnerRequest,
        UpdateSnippetRequest,
    },
    model::Snippet,
    services,
};
use crate::{auth::extractors::AuthUser, error::AppResult, state::AppState};

pub fn snippet_routes() -> Router<AppState> {
    Router::new()
        .route("/all", get(all_snippets))
        .route("/owner", get(owner_snippets_by_body))
        .route("/owner/:owner", get(owner_snippets))
        .route("/add-snippet", put(add_snippet))
        .route("/update-snippet", put(update_snippet))
        .route("/delete-snippet", put(delete_snippet))
}

#[instrument(skip(state, _caller))]
pub async fn all_snippets(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> AppResult<Json<AllSnippetsResponse>> {
    Ok(Json(services::list_all(state.users.as_ref()).await?))
}

#[instrument(skip(state, _caller))]
pub async fn owner_snippets(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(owner): Path<String>,
) -> AppResult<Json<Vec<Snippet>>> {
    Ok(Json(services::list_for_owner(state.users.as_ref(), &owner).await?))
}

#[instrument(skip(state, _caller, payload))]
pub async fn owner_snippets_by_body(
    State(state): State<AppState>,
    _caller: AuthUser,
    payload: Result<Json<OwnerRequest>, JsonRejection>,
) -> AppResult<Json<Vec<Snippet>>> {
    let Json(req) = payload?;
    Ok(Json(services::list_for_owner(state.users.as_ref(), &req.id).await?))
}

#[instrument(skip(state, claims, payload))]
pub async fn add_snippet(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    payload: Result<Json<AddSnippetRequest>, JsonRejection>,
) -> AppResult<Json<Vec<Snippet>>> {
    let Json(req) = payload?;
    let (owner, new) = req.validate()?;
    let list = services::add_snippet(state.users.as_ref(), &claims, owner, new).await?;
    Ok(Json(list))
}

#[instrument(skip(state, claims, payload))]
pub async fn update_snippet(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    payload: Result<Json<UpdateSnippetRequest>, JsonRejection>,
) -> AppResult<Json<Vec<Snippet>>> {
    let Json(req) = payload?;
    let (target, patch) = req.validate()?;
    let list = services::update_snippet(state.users.as_ref(), &claims, target, patch).await?;
    Ok(Json(list))
}

#[instrument(skip(state, claims, payload))]
pub async fn delete_snippet(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    payload: Result<Json<DeleteSnippetRequest>, JsonRejection>,
) -> AppResult<StatusCode> {
    let Json(req) = payload?;
    let target = req.validate()?;
    services::delete_snippet(state.users.as_ref(), &claims, target).await?;
    Ok(StatusCode::NO_CONTENT)
}
