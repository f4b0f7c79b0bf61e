use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::snippets::model::Snippet;
use crate::users::repo_types::{NewUser, User, UserRow};

/// Credential store. Snippet mutations touch a single array element and are
/// atomic per call, so concurrent pushes and pulls on one user never lose each other.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn insert(&self, new_user: NewUser) -> AppResult<User>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn list_all(&self) -> AppResult<Vec<User>>;
    /// Users owning at least one snippet.
    async fn list_with_snippets(&self) -> AppResult<Vec<User>>;
    async fn set_last_login(&self, id: Uuid, at: OffsetDateTime) -> AppResult<Option<User>>;
    async fn set_last_logout(&self, id: Uuid, at: OffsetDateTime) -> AppResult<Option<User>>;
    /// Appends `snippet` unless one with the same category and text is already stored,
    /// which fails with `Conflict`. `None` when the owner does not exist.
    async fn push_snippet(&self, owner: Uuid, snippet: Snippet) -> AppResult<Option<User>>;
    /// Replaces the element with `snippet.id`; `None` when owner or element is missing.
    async fn set_snippet(&self, owner: Uuid, snippet: Snippet) -> AppResult<Option<User>>;
    /// Removes the element with `snippet_id` if present; `None` when the owner does not exist.
    async fn pull_snippet(&self, owner: Uuid, snippet_id: Uuid) -> AppResult<Option<User>>;
}

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, \
                            last_login, last_logout, snippets, created_at, updated_at";

pub(crate) fn email_in_use() -> AppError {
    AppError::conflict("Email already in use. Did you forget your password?", "email")
}

pub(crate) fn duplicate_snippet() -> AppError {
    AppError::conflict(
        "Cannot save a snippet that is identical to one that already exists.",
        "snippet",
    )
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn fetch_one_opt(&self, sql: &str, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(User::from))
    }

    async fn set_timestamp(
        &self,
        column: &str,
        id: Uuid,
        at: OffsetDateTime,
    ) -> AppResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET {column} = $2, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(at)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(User::from))
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn insert(&self, new_user: NewUser) -> AppResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .fetch_one(&self.db)
            .await;

        match result {
            Ok(row) => Ok(row.into()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(email_in_use()),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        self.fetch_one_opt(&sql, id).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(User::from))
    }

    async fn list_all(&self) -> AppResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, UserRow>(&sql).fetch_all(&self.db).await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn list_with_snippets(&self) -> AppResult<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE jsonb_array_length(snippets) > 0 ORDER BY created_at, id"
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql).fetch_all(&self.db).await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn set_last_login(&self, id: Uuid, at: OffsetDateTime) -> AppResult<Option<User>> {
        self.set_timestamp("last_login", id, at).await
    }

    async fn set_last_logout(&self, id: Uuid, at: OffsetDateTime) -> AppResult<Option<User>> {
        self.set_timestamp("last_logout", id, at).await
    }

    async fn push_snippet(&self, owner: Uuid, snippet: Snippet) -> AppResult<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
               SET snippets = snippets || jsonb_build_array($2::jsonb),
                   updated_at = now()
             WHERE id = $1
               AND NOT snippets @> jsonb_build_array(
                     jsonb_build_object('category', $3::text, 'text', $4::text))
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(owner)
            .bind(Json(&snippet))
            .bind(&snippet.category)
            .bind(&snippet.text)
            .fetch_optional(&self.db)
            .await?;

        match row {
            Some(row) => Ok(Some(row.into())),
            // Nothing updated: either the owner is gone or the content is already stored.
            None => match self.find_by_id(owner).await? {
                Some(_) => Err(duplicate_snippet()),
                None => Ok(None),
            },
        }
    }

    async fn set_snippet(&self, owner: Uuid, snippet: Snippet) -> AppResult<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
               SET snippets = (
                     SELECT COALESCE(
                              jsonb_agg(CASE WHEN t.elem->>'id' = $2 THEN $3::jsonb ELSE t.elem END
                                        ORDER BY t.pos),
                              '[]'::jsonb)
                       FROM jsonb_array_elements(snippets) WITH ORDINALITY AS t(elem, pos)
                   ),
                   updated_at = now()
             WHERE id = $1
               AND snippets @> jsonb_build_array(jsonb_build_object('id', $2::text))
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(owner)
            .bind(snippet.id.to_string())
            .bind(Json(&snippet))
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(User::from))
    }

    async fn pull_snippet(&self, owner: Uuid, snippet_id: Uuid) -> AppResult<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
               SET snippets = (
                     SELECT COALESCE(jsonb_agg(t.elem ORDER BY t.pos), '[]'::jsonb)
                       FROM jsonb_array_elements(snippets) WITH ORDINALITY AS t(elem, pos)
                      WHERE t.elem->>'id' <> $2
                   ),
                   updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(owner)
            .bind(snippet_id.to_string())
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(User::from))
    }
}
