use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, NewUser, UserRecord};
use crate::error::StoreError;

/// Process-local store keyed by email
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.id == id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        // Check and insert under one write lock
        let mut users = self.users.write().await;
        if users.contains_key(&user.email) {
            return Err(StoreError::DuplicateEmail(user.email));
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            email: user.email,
            full_name: user.full_name,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        users.insert(record.email.clone(), record.clone());

        tracing::debug!(user_id = %record.id, "User record stored in memory");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            full_name: "A B".to_string(),
            password_hash: "$2b$10$hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = InMemoryCredentialStore::new();
        let created = store.create(new_user("a@b.com")).await.unwrap();

        let by_email = store.find_by_email("a@b.com").await.unwrap();
        let by_id = store.find_by_id(created.id).await.unwrap();

        assert_eq!(by_email, Some(created.clone()));
        assert_eq!(by_id, Some(created));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let store = InMemoryCredentialStore::new();

        assert!(store.find_by_email("nobody@b.com").await.unwrap().is_none());
        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = InMemoryCredentialStore::new();
        store.create(new_user("a@b.com")).await.unwrap();

        let result = store.create(new_user("a@b.com")).await;

        assert!(matches!(result, Err(StoreError::DuplicateEmail(email)) if email == "a@b.com"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let store = InMemoryCredentialStore::new();
        let first = store.create(new_user("a@b.com")).await.unwrap();
        let second = store.create(new_user("c@d.com")).await.unwrap();

        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_registration() {
        let store = Arc::new(InMemoryCredentialStore::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.create(new_user("race@b.com")).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.len().await, 1);
    }
}
