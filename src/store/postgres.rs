use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{CredentialStore, NewUser, UserRecord};
use crate::error::StoreError;

const UNIQUE_VIOLATION: &str = "23505";

type UserRow = (Uuid, String, String, String, DateTime<Utc>);

/// Postgres-backed store over the `users` table
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded migrations in `./migrations`
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("Migration failed: {}", e)))
    }
}

fn into_record((id, email, full_name, password_hash, created_at): UserRow) -> UserRecord {
    UserRecord {
        id,
        email,
        full_name,
        password_hash,
        created_at,
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, full_name, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(into_record))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, full_name, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(into_record))
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let record = UserRecord {
            id: Uuid::new_v4(),
            email: user.email,
            full_name: user.full_name,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, email, full_name, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id)
        .bind(&record.email)
        .bind(&record.full_name)
        .bind(&record.password_hash)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let is_duplicate = e
                .as_database_error()
                .and_then(|db| db.code())
                .map_or(false, |code| code == UNIQUE_VIOLATION);
            if is_duplicate {
                StoreError::DuplicateEmail(record.email.clone())
            } else {
                StoreError::from(e)
            }
        })?;

        tracing::debug!(user_id = %record.id, "User record inserted");
        Ok(record)
    }
}
