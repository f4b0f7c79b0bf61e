use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppResult;
use crate::snippets::model::Snippet;
use crate::users::repo::{duplicate_snippet, email_in_use, UserRepo};
use crate::users::repo_types::{NewUser, User};

/// In-process store used by `APP_STORE=memory` and the test suite.
/// Every mutation runs under one write lock, which makes it atomic.
#[derive(Default)]
pub struct MemoryUserRepo {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    async fn mutate<F>(&self, id: Uuid, f: F) -> AppResult<Option<User>>
    where
        F: FnOnce(&mut User) -> AppResult<bool> + Send,
    {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if !f(user)? {
            return Ok(None);
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn sorted(&self, keep: impl Fn(&User) -> bool) -> Vec<User> {
        let users = self.users.read().await;
        let mut out: Vec<User> = users.values().filter(|u| keep(u)).cloned().collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        out
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn insert(&self, new_user: NewUser) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new_user.email) {
            return Err(email_in_use());
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            last_login: None,
            last_logout: None,
            snippets: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn list_all(&self) -> AppResult<Vec<User>> {
        Ok(self.sorted(|_| true).await)
    }

    async fn list_with_snippets(&self) -> AppResult<Vec<User>> {
        Ok(self.sorted(|u| !u.snippets.is_empty()).await)
    }

    async fn set_last_login(&self, id: Uuid, at: OffsetDateTime) -> AppResult<Option<User>> {
        self.mutate(id, |u| {
            u.last_login = Some(at);
            Ok(true)
        })
        .await
    }

    async fn set_last_logout(&self, id: Uuid, at: OffsetDateTime) -> AppResult<Option<User>> {
        self.mutate(id, |u| {
            u.last_logout = Some(at);
            Ok(true)
        })
        .await
    }

    async fn push_snippet(&self, owner: Uuid, snippet: Snippet) -> AppResult<Option<User>> {
        self.mutate(owner, |u| {
            if u.snippets.iter().any(|s| s.same_content(&snippet)) {
                return Err(duplicate_snippet());
            }
            u.snippets.push(snippet);
            Ok(true)
        })
        .await
    }

    async fn set_snippet(&self, owner: Uuid, snippet: Snippet) -> AppResult<Option<User>> {
        self.mutate(owner, |u| match u.snippets.iter_mut().find(|s| s.id == snippet.id) {
            Some(slot) => {
                *slot = snippet;
                Ok(true)
            }
            None => Ok(false),
        })
        .await
    }

    async fn pull_snippet(&self, owner: Uuid, snippet_id: Uuid) -> AppResult<Option<User>> {
        self.mutate(owner, |u| {
            u.snippets.retain(|s| s.id != snippet_id);
            Ok(true)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "hash".into(),
            first_name: None,
            last_name: None,
        }
    }

    fn snippet(order: i64) -> Snippet {
        Snippet {
            id: Uuid::new_v4(),
            category: "cat".into(),
            order,
            text: format!("text {order}"),
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_email() {
        let repo = MemoryUserRepo::new();
        repo.insert(new_user("a@x.com")).await.expect("first insert");
        let err = repo.insert(new_user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn snippet_element_operations() {
        let repo = MemoryUserRepo::new();
        let user = repo.insert(new_user("b@x.com")).await.unwrap();
        let first = snippet(1);
        repo.push_snippet(user.id, first.clone()).await.unwrap().unwrap();
        repo.push_snippet(user.id, snippet(2)).await.unwrap().unwrap();

        let mut changed = first.clone();
        changed.text = "changed".into();
        let after = repo.set_snippet(user.id, changed).await.unwrap().unwrap();
        assert_eq!(after.snippets[0].text, "changed");
        assert_eq!(after.snippets.len(), 2);

        assert!(repo
            .set_snippet(user.id, snippet(9))
            .await
            .unwrap()
            .is_none());

        let after = repo.pull_snippet(user.id, first.id).await.unwrap().unwrap();
        assert_eq!(after.snippets.len(), 1);
        let again = repo.pull_snippet(user.id, first.id).await.unwrap().unwrap();
        assert_eq!(again.snippets.len(), 1);
    }

    #[tokio::test]
    async fn push_refuses_identical_content() {
        let repo = MemoryUserRepo::new();
        let user = repo.insert(new_user("d@x.com")).await.unwrap();
        let first = snippet(1);
        repo.push_snippet(user.id, first.clone()).await.unwrap();

        let mut copy = snippet(7);
        copy.text = first.text.clone();
        let err = repo.push_snippet(user.id, copy).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));

        let user = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.snippets.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_identical_pushes_store_one() {
        let repo = std::sync::Arc::new(MemoryUserRepo::new());
        let user_id = repo.insert(new_user("e@x.com")).await.unwrap().id;
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.push_snippet(user_id, snippet(1)).await })
            })
            .collect();
        let mut stored = 0;
        for t in tasks {
            if t.await.unwrap().is_ok() {
                stored += 1;
            }
        }
        assert_eq!(stored, 1);
        let user = repo.find_by_id(user_id).await.unwrap().unwrap();
        assert_eq!(user.snippets.len(), 1);
    }

    #[tokio::test]
    async fn missing_owner_yields_none() {
        let repo = MemoryUserRepo::new();
        assert!(repo
            .push_snippet(Uuid::new_v4(), snippet(1))
            .await
            .unwrap()
            .is_none());
        assert!(repo
            .set_last_logout(Uuid::new_v4(), OffsetDateTime::now_utc())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn list_with_snippets_skips_empty_users() {
        let repo = MemoryUserRepo::new();
        let a = repo.insert(new_user("a@x.com")).await.unwrap();
        repo.insert(new_user("b@x.com")).await.unwrap();
        repo.push_snippet(a.id, snippet(1)).await.unwrap();
        let with = repo.list_with_snippets().await.unwrap();
        assert_eq!(with.len(), 1);
        assert_eq!(with[0].id, a.id);
        assert_eq!(repo.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_pushes_are_not_lost() {
        let repo = std::sync::Arc::new(MemoryUserRepo::new());
        let user_id = repo.insert(new_user("c@x.com")).await.unwrap().id;
        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.push_snippet(user_id, snippet(i)).await })
            })
            .collect();
        for t in tasks {
            t.await.unwrap().unwrap();
        }
        let user = repo.find_by_id(user_id).await.unwrap().unwrap();
        assert_eq!(user.snippets.len(), 16);
    }
}
