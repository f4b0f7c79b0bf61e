use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::snippets::model::{max_order, sorted_by_order, Snippet};
use crate::users::repo_types::User;
use crate::validation::{Fields, Presence};

/// Registration body; email and password are required, names are optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Fields for RegisterRequest {
    fn presence(&self, key: &str) -> Presence {
        match key {
            "email" => Presence::of_text(&self.email),
            "password" => Presence::of_text(&self.password),
            _ => Presence::Absent,
        }
    }
}

/// Serialized user: no password, snippets sorted by order, derived counters included.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_logout: Option<OffsetDateTime>,
    pub snippets: Vec<Snippet>,
    pub snippet_count: usize,
    pub max_order: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            last_login: u.last_login,
            last_logout: u.last_logout,
            snippets: sorted_by_order(&u.snippets),
            snippet_count: u.snippets.len(),
            max_order: max_order(&u.snippets),
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUsers {
    pub registered_users: Vec<PublicUser>,
}
