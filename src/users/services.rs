use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{CREDENTIALS, EMAIL, PASSWORD},
        password::hash_password_blocking,
        services::normalize_email,
    },
    error::{AppError, AppResult},
    users::{
        dto::RegisterRequest,
        repo::{email_in_use, UserRepo},
        repo_types::{NewUser, User},
    },
    validation::{filled, require},
};

pub(crate) const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Validates the registration body, hashes the password and stores the user.
pub async fn register(repo: &dyn UserRepo, req: RegisterRequest) -> AppResult<User> {
    CREDENTIALS.check(&req)?;

    let email = normalize_email(&require(filled(req.email), EMAIL)?);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::validation("Please enter a valid email address.", EMAIL.key));
    }

    let password = require(filled(req.password), PASSWORD)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(
            format!("Password must be at least {MIN_PASSWORD_LEN} characters long."),
            PASSWORD.key,
        ));
    }

    let first_name = filled(req.first_name);
    let last_name = filled(req.last_name);

    if repo.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(email_in_use());
    }

    let password_hash = hash_password_blocking(password).await?;
    let user = repo
        .insert(NewUser {
            email,
            password_hash,
            first_name,
            last_name,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use crate::users::memory::MemoryUserRepo;
    use serde_json::json;

    fn body(value: serde_json::Value) -> RegisterRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn email_regex() {
        assert!(is_valid_email("alice@x.com"));
        assert!(!is_valid_email("alice@x"));
        assert!(!is_valid_email("alice x@y.com"));
        assert!(!is_valid_email(""));
    }

    #[tokio::test]
    async fn register_hashes_and_normalizes() {
        let repo = MemoryUserRepo::new();
        let user = register(
            &repo,
            body(json!({
                "firstName": " Alice ",
                "email": " Alice@X.com ",
                "password": "secret123"
            })),
        )
        .await
        .expect("register");
        assert_eq!(user.email, "alice@x.com");
        assert_eq!(user.first_name.as_deref(), Some("Alice"));
        assert_eq!(user.last_name, None);
        assert_ne!(user.password_hash, "secret123");
        assert!(verify_password("secret123", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn register_lists_all_missing_fields() {
        let repo = MemoryUserRepo::new();
        let err = register(&repo, body(json!({ "email": " " }))).await.unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, AppError::Validation { .. }));
        assert!(msg.contains("Email") && msg.contains("Password"), "{msg}");
    }

    #[tokio::test]
    async fn register_rejects_taken_email() {
        let repo = MemoryUserRepo::new();
        register(&repo, body(json!({ "email": "bob@x.com", "password": "secret123" })))
            .await
            .unwrap();
        let err = register(&repo, body(json!({ "email": "BOB@x.com", "password": "other123" })))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn register_rejects_short_password_and_bad_email() {
        let repo = MemoryUserRepo::new();
        let short = register(&repo, body(json!({ "email": "c@x.com", "password": "12345" }))).await;
        assert!(matches!(short, Err(AppError::Validation { .. })));
        let bad = register(&repo, body(json!({ "email": "not-an-email", "password": "123456" }))).await;
        assert!(matches!(bad, Err(AppError::Validation { .. })));
    }
}
