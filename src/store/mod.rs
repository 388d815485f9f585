/// Credential Store
///
/// Persistence boundary for user records. The auth service only sees the
/// `CredentialStore` trait, so the in-memory store and the Postgres store
/// are interchangeable.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::StoreError;

pub use memory::InMemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// Stored user. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Input for `CredentialStore::create`
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
}

/// Client-facing projection of a user; never carries the hash
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub full_name: String,
}

impl From<&UserRecord> for PublicUser {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
        }
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Exact-match lookup by email
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError>;

    /// Persist a new user, assigning its id and creation time
    ///
    /// # Errors
    /// `StoreError::DuplicateEmail` if the email is already registered
    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError>;
}
