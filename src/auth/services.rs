//! Login, logout, refresh and the session guard used by snippet mutations.

use time::OffsetDateTime;
use tracing::{info, warn};

use super::{
    claims::{Claims, TokenUser},
    dto::{LoginRequest, CREDENTIALS, EMAIL, PASSWORD},
    jwt::JwtKeys,
    password::verify_password_blocking,
};
use crate::{
    error::{AppError, AppResult},
    users::{repo::UserRepo, repo_types::User},
    validation::{filled, require},
};

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn token_user(user: &User) -> TokenUser {
    TokenUser {
        id: user.id,
        email: user.email.clone(),
    }
}

/// Verifies credentials, records `lastLogin` and issues a token.
pub async fn login(
    repo: &dyn UserRepo,
    keys: &JwtKeys,
    req: LoginRequest,
    now: OffsetDateTime,
) -> AppResult<String> {
    CREDENTIALS.check(&req)?;
    let email = normalize_email(&require(filled(req.email), EMAIL)?);
    let password = require(filled(req.password), PASSWORD)?;

    let Some(user) = repo.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::Authentication);
    };

    if !verify_password_blocking(password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Authentication);
    }

    let user = repo
        .set_last_login(user.id, now)
        .await?
        .ok_or(AppError::Authentication)?;

    let token = keys.sign_at(token_user(&user), now)?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}

/// Records `lastLogout` for the token's user and returns the updated record.
pub async fn logout(
    repo: &dyn UserRepo,
    claims: &Claims,
    submitted_email: Option<&str>,
    now: OffsetDateTime,
) -> AppResult<User> {
    if let Some(email) = submitted_email.map(normalize_email).filter(|e| !e.is_empty()) {
        if email != claims.sub {
            return Err(AppError::Forbidden(
                "Email does not match the signed-in user.".into(),
            ));
        }
    }

    let user = caller(repo, claims).await?;
    let user = repo
        .set_last_logout(user.id, now)
        .await?
        .ok_or(AppError::InvalidToken)?;
    info!(user_id = %user.id, "user logged out");
    Ok(user)
}

/// Issues a fresh token for a still-existing user without re-checking the password.
pub async fn refresh(
    repo: &dyn UserRepo,
    keys: &JwtKeys,
    claims: &Claims,
    now: OffsetDateTime,
) -> AppResult<String> {
    let user = caller(repo, claims).await?;
    keys.sign_at(token_user(&user), now)
}

/// The user behind a verified token; a vanished account invalidates the token.
pub async fn caller(repo: &dyn UserRepo, claims: &Claims) -> AppResult<User> {
    repo.find_by_email(&claims.sub)
        .await?
        .ok_or(AppError::InvalidToken)
}

/// True when the user signed out after their most recent sign-in.
pub fn is_stale(user: &User) -> bool {
    match (user.last_login, user.last_logout) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(login), Some(logout)) => login < logout,
    }
}

/// Gate for every snippet mutation: the token must belong to `target`
/// and `target` must not have signed out since signing in.
pub fn session_guard(claims: &Claims, target: &User) -> AppResult<()> {
    if claims.sub != target.email || claims.user.id != target.id {
        return Err(AppError::Forbidden(
            "You may only change your own snippets.".into(),
        ));
    }
    if is_stale(target) {
        return Err(AppError::StaleSession);
    }
    Ok(())
}
