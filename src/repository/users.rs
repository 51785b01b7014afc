use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

use crate::error::DatabaseError;

/// User account row, including the password hash
#[derive(Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_chirpy_red: bool,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("hashed_password", &"[redacted]")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .field("is_chirpy_red", &self.is_chirpy_red)
            .finish()
    }
}

/// Public view of a user, safe to return to clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_chirpy_red: bool,
}

impl From<UserRecord> for UserProfile {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            created_at: record.created_at,
            updated_at: record.updated_at,
            is_chirpy_red: record.is_chirpy_red,
        }
    }
}

/// Identity store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError>;

    /// Fails with `UniqueConstraintViolation` if the email is taken
    async fn create(
        &self,
        email: &str,
        hashed_password: &str,
        now: DateTime<Utc>,
    ) -> Result<UserRecord, DatabaseError>;

    /// Fails with `NotFound` if no user has this id
    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
        now: DateTime<Utc>,
    ) -> Result<UserRecord, DatabaseError>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, hashed_password, created_at, updated_at, is_chirpy_red
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(
        &self,
        email: &str,
        hashed_password: &str,
        now: DateTime<Utc>,
    ) -> Result<UserRecord, DatabaseError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, email, hashed_password, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, email, hashed_password, created_at, updated_at, is_chirpy_red
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
        now: DateTime<Utc>,
    ) -> Result<UserRecord, DatabaseError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users
            SET email = $2, hashed_password = $3, updated_at = $4
            WHERE id = $1
            RETURNING id, email, hashed_password, created_at, updated_at, is_chirpy_red
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(hashed_password)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}
