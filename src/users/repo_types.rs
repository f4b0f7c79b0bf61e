use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::snippets::model::Snippet;

/// User aggregate: the account plus its embedded snippets.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String, // argon2 PHC string
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub last_login: Option<OffsetDateTime>,
    pub last_logout: Option<OffsetDateTime>,
    pub snippets: Vec<Snippet>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    pub fn snippet(&self, snippet_id: Uuid) -> Option<&Snippet> {
        self.snippets.iter().find(|s| s.id == snippet_id)
    }
}

/// Fields supplied at registration; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Row shape of the `users` table.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub last_login: Option<OffsetDateTime>,
    pub last_logout: Option<OffsetDateTime>,
    pub snippets: Json<Vec<Snippet>>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            email: r.email,
            password_hash: r.password_hash,
            first_name: r.first_name,
            last_name: r.last_name,
            last_login: r.last_login,
            last_logout: r.last_logout,
            snippets: r.snippets.0,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
