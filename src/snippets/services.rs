//! Snippet aggregate manager: every operation works on the owning user record.

use tracing::{debug, info};
use uuid::Uuid;

use super::dto::{AllSnippetsResponse, NewSnippet, SnippetPatch, SnippetTarget};
use super::model::{sorted_by_order, Snippet};
use crate::{
    auth::{claims::Claims, services::session_guard},
    error::{AppError, AppResult},
    users::{dto::PublicUser, repo::UserRepo, repo_types::User},
};

fn owner_missing() -> AppError {
    AppError::not_found("Owner does not exist in our system", "userId")
}

fn snippet_missing() -> AppError {
    AppError::not_found("Snippet not found for this owner", "snippetId")
}

/// Every user owning snippets, with the grand total. Nothing to list is a 404.
pub async fn list_all(repo: &dyn UserRepo) -> AppResult<AllSnippetsResponse> {
    let users = repo.list_with_snippets().await?;
    if users.is_empty() {
        return Err(AppError::not_found("No snippets found", "snippets"));
    }
    let total_snippets = users.iter().map(|u| u.snippets.len()).sum();
    debug!(users = users.len(), total_snippets, "listed all snippets");
    Ok(AllSnippetsResponse {
        total_snippets,
        users_with_snippets: users.iter().map(PublicUser::from).collect(),
    })
}

/// Snippets of one owner sorted by order; an owner without snippets gets an empty list.
pub async fn list_for_owner(repo: &dyn UserRepo, owner: &str) -> AppResult<Vec<Snippet>> {
    let id = Uuid::parse_str(owner.trim()).map_err(|_| owner_missing())?;
    let user = repo.find_by_id(id).await?.ok_or_else(owner_missing)?;
    Ok(sorted_by_order(&user.snippets))
}

async fn load_for_mutation(repo: &dyn UserRepo, claims: &Claims, owner: Uuid) -> AppResult<User> {
    let user = repo.find_by_id(owner).await?.ok_or_else(owner_missing)?;
    session_guard(claims, &user)?;
    Ok(user)
}

pub async fn add_snippet(
    repo: &dyn UserRepo,
    claims: &Claims,
    owner: Uuid,
    new: NewSnippet,
) -> AppResult<Vec<Snippet>> {
    load_for_mutation(repo, claims, owner).await?;

    // Duplicate content is refused by the store in the same step as the append.
    let snippet = Snippet {
        id: Uuid::new_v4(),
        category: new.category,
        order: new.order,
        text: new.text,
    };
    let snippet_id = snippet.id;
    let user = repo
        .push_snippet(owner, snippet)
        .await?
        .ok_or_else(owner_missing)?;

    info!(user_id = %owner, %snippet_id, "snippet added");
    Ok(sorted_by_order(&user.snippets))
}

pub async fn update_snippet(
    repo: &dyn UserRepo,
    claims: &Claims,
    target: SnippetTarget,
    patch: SnippetPatch,
) -> AppResult<Vec<Snippet>> {
    let user = load_for_mutation(repo, claims, target.user_id).await?;
    let current = user.snippet(target.snippet_id).ok_or_else(snippet_missing)?;

    let merged = Snippet {
        id: current.id,
        category: patch.category.unwrap_or_else(|| current.category.clone()),
        order: patch.order.unwrap_or(current.order),
        text: patch.text.unwrap_or_else(|| current.text.clone()),
    };
    let user = repo
        .set_snippet(target.user_id, merged)
        .await?
        .ok_or_else(snippet_missing)?;

    info!(user_id = %target.user_id, snippet_id = %target.snippet_id, "snippet updated");
    Ok(sorted_by_order(&user.snippets))
}

/// Removing an id that is not in the collection is a no-op.
pub async fn delete_snippet(
    repo: &dyn UserRepo,
    claims: &Claims,
    target: SnippetTarget,
) -> AppResult<()> {
    load_for_mutation(repo, claims, target.user_id).await?;
    repo.pull_snippet(target.user_id, target.snippet_id)
        .await?
        .ok_or_else(owner_missing)?;
    info!(user_id = %target.user_id, snippet_id = %target.snippet_id, "snippet deleted");
    Ok(())
}
