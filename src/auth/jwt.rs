/// JWT Token Generation and Validation
///
/// Access tokens are HS256-signed JWTs. Validation is purely a function of
/// the token, the shared secret and the current time: no lookup, no leeway.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::error::Error as StdError;
use std::fmt;
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessTokenError {
    /// `now` is at or past the encoded expiry
    Expired,
    /// Signature does not verify under the configured secret
    InvalidSignature,
    /// Signed by us but for a different issuer label
    InvalidIssuer,
    /// Not a structurally valid token
    Malformed,
    /// Key material rejected while signing
    Signing(String),
}

impl fmt::Display for AccessTokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessTokenError::Expired => write!(f, "access token has expired"),
            AccessTokenError::InvalidSignature => write!(f, "access token signature is invalid"),
            AccessTokenError::InvalidIssuer => write!(f, "access token issuer is not accepted"),
            AccessTokenError::Malformed => write!(f, "access token is malformed"),
            AccessTokenError::Signing(msg) => write!(f, "access token signing failed: {}", msg),
        }
    }
}

impl StdError for AccessTokenError {}

/// Issue a new access token for a user
///
/// # Arguments
/// * `user_id` - User's UUID, becomes the `sub` claim
/// * `config` - JWT configuration settings (secret and issuer)
/// * `ttl` - Lifetime of the token
/// * `now` - Issuance time
///
/// # Errors
/// Returns `AccessTokenError::Signing` if the secret is empty or rejected
pub fn issue_access_token(
    user_id: &Uuid,
    config: &JwtSettings,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String, AccessTokenError> {
    if config.secret.is_empty() {
        return Err(AccessTokenError::Signing("signing secret is empty".to_string()));
    }

    let claims = Claims::new(*user_id, config.issuer.clone(), now, ttl);

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AccessTokenError::Signing(e.to_string()))
}

/// Validate an access token and return the user it was issued to
///
/// Checks run in order: signature, issuer, expiry, subject.
///
/// # Errors
/// Returns `Expired`, `InvalidSignature`, `InvalidIssuer` or `Malformed`
pub fn validate_access_token(
    token: &str,
    config: &JwtSettings,
    now: DateTime<Utc>,
) -> Result<Uuid, AccessTokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Expiry is checked against the injected clock below.
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| classify(e.kind()))?;

    if claims.iss != config.issuer {
        return Err(AccessTokenError::InvalidIssuer);
    }

    if claims.is_expired_at(now) {
        return Err(AccessTokenError::Expired);
    }

    claims.user_id()
}

fn classify(kind: &ErrorKind) -> AccessTokenError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
            AccessTokenError::InvalidSignature
        }
        ErrorKind::InvalidIssuer => AccessTokenError::InvalidIssuer,
        ErrorKind::ExpiredSignature => AccessTokenError::Expired,
        _ => AccessTokenError::Malformed,
    }
}
