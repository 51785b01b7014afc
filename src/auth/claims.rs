/// JWT Claims structure
///
/// The payload of an access token: subject, issuer, issued-at and expiry
/// (RFC 7519 registered claims only).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::jwt::AccessTokenError;

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create claims for `user_id` valid from `issued_at` for `ttl`
    pub fn new(user_id: Uuid, issuer: String, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: user_id.to_string(),
            iss: issuer,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }

    /// Extract user ID from claims
    ///
    /// # Errors
    /// Returns `AccessTokenError::Malformed` if the subject is not a UUID
    pub fn user_id(&self) -> Result<Uuid, AccessTokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| AccessTokenError::Malformed)
    }

    /// A token expiring at T is already invalid at T.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}
