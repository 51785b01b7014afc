/// Session orchestration
///
/// Composes password verification, access tokens and refresh tokens into
/// login, request authentication, refresh and revoke. Every failure leaves
/// this module as an `AppError` whose class is all the caller gets to see.

use actix_web::http::header::HeaderMap;
use std::fmt;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::auth::{
    extract_api_key, extract_bearer, generate_refresh_token, hash_password, issue_access_token,
    lookup_refresh_token, persist_refresh_token, revoke_refresh_token, simulate_verification,
    validate_access_token, verify_password, PasswordError, TokenState,
};
use crate::clock::Clock;
use crate::configuration::{JwtSettings, PolkaSettings};
use crate::error::{AppError, AuthError};
use crate::repository::{RefreshTokenRepository, UserProfile, UserRepository};

/// Result of a successful login
#[derive(Clone)]
pub struct LoginOutcome {
    pub profile: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for LoginOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginOutcome")
            .field("profile", &self.profile)
            .field("access_token", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .finish()
    }
}

/// Shared by all workers; holds no mutable state of its own.
pub struct SessionService {
    users: Arc<dyn UserRepository>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    clock: Arc<dyn Clock>,
    jwt: JwtSettings,
    polka: PolkaSettings,
}

impl SessionService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        clock: Arc<dyn Clock>,
        jwt: JwtSettings,
        polka: PolkaSettings,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            clock,
            jwt,
            polka,
        }
    }

    /// Create an account; the email must already be validated
    pub async fn register(&self, email: &str, password: &str) -> Result<UserProfile, AppError> {
        let hashed_password = hash_password(password)?;
        let user = self
            .users
            .create(email, &hashed_password, self.clock.now())
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.into())
    }

    /// Verify email and password, then issue an access token and a new
    /// refresh token
    ///
    /// Unknown email and wrong password are indistinguishable to the caller,
    /// in outcome and in time spent.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        expires_in_seconds: Option<i64>,
    ) -> Result<LoginOutcome, AppError> {
        let user = match self.users.find_by_email(email).await? {
            Some(user) => user,
            None => {
                simulate_verification(password);
                return Err(AuthError::InvalidCredential.into());
            }
        };

        match verify_password(&user.hashed_password, password) {
            Ok(()) => {}
            Err(PasswordError::Mismatch) => return Err(AuthError::InvalidCredential.into()),
            Err(e) => return Err(e.into()),
        }

        let now = self.clock.now();
        let ttl = self.jwt.clamped_access_token_ttl(expires_in_seconds);
        let access_token = issue_access_token(&user.id, &self.jwt, ttl, now)?;

        let refresh_token = generate_refresh_token()?;
        persist_refresh_token(
            self.refresh_tokens.as_ref(),
            &refresh_token,
            user.id,
            self.jwt.refresh_token_ttl(),
            now,
        )
        .await?;

        tracing::info!(user_id = %user.id, access_ttl_secs = ttl.num_seconds(), "User logged in");

        Ok(LoginOutcome {
            profile: user.into(),
            access_token,
            refresh_token,
        })
    }

    /// Gate for authenticated requests: Bearer access token to user id
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Uuid, AppError> {
        let token = extract_bearer(headers)?;
        let user_id = validate_access_token(token, &self.jwt, self.clock.now())?;
        Ok(user_id)
    }

    /// Mint a new access token from a Bearer refresh token
    ///
    /// The refresh token itself stays as it is.
    pub async fn refresh(&self, headers: &HeaderMap) -> Result<String, AppError> {
        let token = extract_bearer(headers)?;
        let record = lookup_refresh_token(self.refresh_tokens.as_ref(), token).await?;

        let now = self.clock.now();
        if !record.is_usable(now) {
            let err = match record.state(now) {
                TokenState::Revoked => AuthError::TokenRevoked,
                _ => AuthError::TokenExpired,
            };
            return Err(err.into());
        }

        let access_token =
            issue_access_token(&record.user_id, &self.jwt, self.jwt.access_token_ttl(), now)?;

        tracing::info!(user_id = %record.user_id, "Access token refreshed");
        Ok(access_token)
    }

    /// Revoke the Bearer refresh token
    pub async fn revoke(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let token = extract_bearer(headers)?;
        revoke_refresh_token(self.refresh_tokens.as_ref(), token, self.clock.now()).await?;
        Ok(())
    }

    /// Change email and password of an already authenticated user
    pub async fn update_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, AppError> {
        let hashed_password = hash_password(password)?;
        let user = self
            .users
            .update_credentials(user_id, email, &hashed_password, self.clock.now())
            .await?;

        tracing::info!(user_id = %user.id, "User credentials updated");
        Ok(user.into())
    }

    /// Check the `ApiKey` credential of a webhook call
    pub fn authorize_webhook(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let key = extract_api_key(headers)?;
        if bool::from(key.as_bytes().ct_eq(self.polka.api_key.as_bytes())) {
            Ok(())
        } else {
            Err(AuthError::InvalidApiKey.into())
        }
    }
}
