/// Refresh Token Management
///
/// Handles refresh token generation, storage, lookup and revocation.
/// Refresh tokens are:
/// - 32 bytes from the operating system CSPRNG, hex-encoded (64 characters)
/// - Stateful: a token is only as good as its persisted record
/// - Long-lived and not rotated on refresh
/// - Soft-revoked (a timestamp is set, the row is kept for auditing)
///
/// State machine: `Active` -> `Revoked` via explicit revoke, or
/// `Active` -> `Expired` by time passing. Both end states are terminal.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use std::error::Error as StdError;
use std::fmt;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::repository::RefreshTokenRepository;

/// Bytes of entropy per refresh token
pub const REFRESH_TOKEN_BYTES: usize = 32;

#[derive(Debug)]
pub enum RefreshTokenError {
    NotFound,
    AlreadyRevoked,
    Entropy(String),
    Storage(DatabaseError),
}

impl fmt::Display for RefreshTokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshTokenError::NotFound => write!(f, "refresh token not found"),
            RefreshTokenError::AlreadyRevoked => write!(f, "refresh token already revoked"),
            RefreshTokenError::Entropy(msg) => write!(f, "could not generate refresh token: {}", msg),
            RefreshTokenError::Storage(e) => write!(f, "refresh token storage failed: {}", e),
        }
    }
}

impl StdError for RefreshTokenError {}

impl From<DatabaseError> for RefreshTokenError {
    fn from(err: DatabaseError) -> Self {
        RefreshTokenError::Storage(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Active,
    Revoked,
    Expired,
}

/// Persisted refresh token row
#[derive(Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for RefreshTokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshTokenRecord")
            .field("token", &"[redacted]")
            .field("user_id", &self.user_id)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .field("expires_at", &self.expires_at)
            .field("revoked_at", &self.revoked_at)
            .finish()
    }
}

impl RefreshTokenRecord {
    /// Whether this token may mint new access tokens at `now`
    ///
    /// Must be evaluated on every refresh attempt.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && now < self.expires_at
    }

    /// Why a token is or is not usable; `Active` exactly when `is_usable`.
    ///
    /// Revoked takes precedence when a token is both revoked and expired.
    pub fn state(&self, now: DateTime<Utc>) -> TokenState {
        if self.is_usable(now) {
            TokenState::Active
        } else if self.revoked_at.is_some() {
            TokenState::Revoked
        } else {
            TokenState::Expired
        }
    }
}

/// Generate a new cryptographically secure refresh token
///
/// # Errors
/// Returns `RefreshTokenError::Entropy` if the OS randomness source fails.
/// Never retried or replaced with a weaker source.
pub fn generate_refresh_token() -> Result<String, RefreshTokenError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| RefreshTokenError::Entropy(e.to_string()))?;

    Ok(hex::encode(bytes))
}

/// Save a refresh token for `user_id`, valid from `now` for `ttl`
///
/// A user may hold any number of active refresh tokens; nothing is
/// deduplicated.
///
/// # Errors
/// Returns `RefreshTokenError::Storage` if the insert fails
pub async fn persist_refresh_token(
    repository: &dyn RefreshTokenRepository,
    token: &str,
    user_id: Uuid,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<RefreshTokenRecord, RefreshTokenError> {
    let record = RefreshTokenRecord {
        token: token.to_string(),
        user_id,
        created_at: now,
        updated_at: now,
        expires_at: now + ttl,
        revoked_at: None,
    };

    repository.insert(&record).await?;

    tracing::debug!(user_id = %user_id, expires_at = %record.expires_at, "Refresh token stored");
    Ok(record)
}

/// Find the record for a refresh token
///
/// Returns the record whatever its state; callers decide with
/// [`RefreshTokenRecord::is_usable`].
///
/// # Errors
/// - `RefreshTokenError::NotFound` if no such token was ever issued
/// - `RefreshTokenError::Storage` if the lookup fails
pub async fn lookup_refresh_token(
    repository: &dyn RefreshTokenRepository,
    token: &str,
) -> Result<RefreshTokenRecord, RefreshTokenError> {
    repository
        .find_by_token(token)
        .await?
        .ok_or(RefreshTokenError::NotFound)
}

/// Revoke a single refresh token
///
/// Not idempotent: revoking a revoked token fails. The repository performs
/// the transition as a compare-and-set, so of two concurrent revokes exactly
/// one succeeds. Expired tokens can still be revoked.
///
/// # Errors
/// - `RefreshTokenError::NotFound` if the token does not exist
/// - `RefreshTokenError::AlreadyRevoked` if it was already revoked
/// - `RefreshTokenError::Storage` if the update fails
pub async fn revoke_refresh_token(
    repository: &dyn RefreshTokenRepository,
    token: &str,
    now: DateTime<Utc>,
) -> Result<(), RefreshTokenError> {
    let record = lookup_refresh_token(repository, token).await?;

    if record.revoked_at.is_some() {
        return Err(RefreshTokenError::AlreadyRevoked);
    }

    if !repository.mark_revoked(token, now).await? {
        // Lost a race against a concurrent revoke.
        return Err(RefreshTokenError::AlreadyRevoked);
    }

    tracing::info!(user_id = %record.user_id, "Refresh token revoked");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockRefreshTokenRepository;
    use chrono::TimeZone;
    use mockall::predicate::eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn record(revoked_at: Option<DateTime<Utc>>) -> RefreshTokenRecord {
        RefreshTokenRecord {
            token: "a".repeat(64),
            user_id: Uuid::new_v4(),
            created_at: now(),
            updated_at: now(),
            expires_at: now() + Duration::days(60),
            revoked_at,
        }
    }

    #[test]
    fn test_generate_refresh_token() {
        let token = generate_refresh_token().expect("entropy available");

        assert_eq!(token.len(), REFRESH_TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_generated_tokens_differ() {
        let first = generate_refresh_token().expect("entropy available");
        let second = generate_refresh_token().expect("entropy available");

        assert_ne!(first, second);
    }

    #[test]
    fn test_usable_until_expiry() {
        let record = record(None);

        assert!(record.is_usable(now()));
        assert!(record.is_usable(record.expires_at - Duration::seconds(1)));
        assert!(!record.is_usable(record.expires_at));
        assert_eq!(record.state(record.expires_at), TokenState::Expired);
    }

    #[test]
    fn test_revoked_is_never_usable() {
        let record = record(Some(now()));

        assert!(!record.is_usable(now()));
        assert_eq!(record.state(now()), TokenState::Revoked);
        assert_eq!(record.state(record.expires_at + Duration::days(1)), TokenState::Revoked);
    }

    #[test]
    fn test_state_agrees_with_is_usable() {
        for revoked_at in [None, Some(now())] {
            let record = record(revoked_at);
            let instants = [
                now(),
                record.expires_at - Duration::seconds(1),
                record.expires_at,
                record.expires_at + Duration::seconds(1),
            ];

            for at in instants {
                assert_eq!(
                    record.is_usable(at),
                    record.state(at) == TokenState::Active,
                    "revoked_at={:?} at={}",
                    revoked_at,
                    at
                );
            }
        }
    }

    #[test]
    fn test_debug_redacts_token() {
        let record = record(None);

        assert!(!format!("{:?}", record).contains(&record.token));
    }

    #[tokio::test]
    async fn test_persist_sets_lifetime() {
        let mut repository = MockRefreshTokenRepository::new();
        repository.expect_insert().times(1).returning(|_| Ok(()));

        let user_id = Uuid::new_v4();
        let record = persist_refresh_token(&repository, "tok", user_id, Duration::days(60), now())
            .await
            .expect("persist succeeds");

        assert_eq!(record.user_id, user_id);
        assert_eq!(record.created_at, now());
        assert_eq!(record.expires_at, now() + Duration::days(60));
        assert!(record.revoked_at.is_none());
        assert!(record.is_usable(now()));
    }

    #[tokio::test]
    async fn test_lookup_unknown_token() {
        let mut repository = MockRefreshTokenRepository::new();
        repository.expect_find_by_token().returning(|_| Ok(None));

        let result = lookup_refresh_token(&repository, "missing").await;

        assert!(matches!(result, Err(RefreshTokenError::NotFound)));
    }

    #[tokio::test]
    async fn test_revoke_active_token() {
        let mut repository = MockRefreshTokenRepository::new();
        let stored = record(None);
        repository
            .expect_find_by_token()
            .returning(move |_| Ok(Some(stored.clone())));
        repository
            .expect_mark_revoked()
            .with(eq("a".repeat(64)), eq(now()))
            .times(1)
            .returning(|_, _| Ok(true));

        let result = revoke_refresh_token(&repository, &"a".repeat(64), now()).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_revoke_already_revoked_token() {
        let mut repository = MockRefreshTokenRepository::new();
        let stored = record(Some(now()));
        repository
            .expect_find_by_token()
            .returning(move |_| Ok(Some(stored.clone())));
        repository.expect_mark_revoked().never();

        let result = revoke_refresh_token(&repository, "tok", now()).await;

        assert!(matches!(result, Err(RefreshTokenError::AlreadyRevoked)));
    }

    #[tokio::test]
    async fn test_revoke_lost_race() {
        let mut repository = MockRefreshTokenRepository::new();
        let stored = record(None);
        repository
            .expect_find_by_token()
            .returning(move |_| Ok(Some(stored.clone())));
        repository.expect_mark_revoked().returning(|_, _| Ok(false));

        let result = revoke_refresh_token(&repository, "tok", now()).await;

        assert!(matches!(result, Err(RefreshTokenError::AlreadyRevoked)));
    }

    #[tokio::test]
    async fn test_revoke_unknown_token() {
        let mut repository = MockRefreshTokenRepository::new();
        repository.expect_find_by_token().returning(|_| Ok(None));

        let result = revoke_refresh_token(&repository, "tok", now()).await;

        assert!(matches!(result, Err(RefreshTokenError::NotFound)));
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let mut repository = MockRefreshTokenRepository::new();
        repository
            .expect_find_by_token()
            .returning(|_| Err(DatabaseError::ConnectionPool("pool timed out".to_string())));

        let result = lookup_refresh_token(&repository, "tok").await;

        assert!(matches!(result, Err(RefreshTokenError::Storage(_))));
    }
}
