/// User Routes
///
/// Account creation, login and credential updates.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extractors::AuthenticatedUser;
use crate::repository::UserProfile;
use crate::session::SessionService;
use crate::validators::{is_valid_email, is_valid_password, require_credentials};

/// Account creation and update request
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Optional access-token lifetime, capped at the configured maximum
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

/// User information response
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub email: String,
    pub is_chirpy_red: bool,
}

impl From<UserProfile> for UserResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id.to_string(),
            created_at: profile.created_at.to_rfc3339(),
            updated_at: profile.updated_at.to_rfc3339(),
            email: profile.email,
            is_chirpy_red: profile.is_chirpy_red,
        }
    }
}

/// Login response: the profile plus both tokens
#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
}

/// POST /api/users
///
/// # Errors
/// - 400: Invalid email or weak password
/// - 409: Email already registered
/// - 500: Internal server error
pub async fn create_user(
    form: web::Json<CredentialsRequest>,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;

    let profile = session.register(&email, &form.password).await?;

    tracing::info!(user_id = %profile.id, "User created");

    Ok(HttpResponse::Created().json(UserResponse::from(profile)))
}

/// POST /api/login
///
/// # Errors
/// - 400: Email or password missing
/// - 401: Invalid credentials (email not found or wrong password)
/// - 500: Internal server error
///
/// # Security Notes
/// - Uses the same response for "not found" and "wrong password"
pub async fn login(
    form: web::Json<LoginRequest>,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    require_credentials(&form.email, &form.password)?;

    let outcome = session
        .login(form.email.trim(), &form.password, form.expires_in_seconds)
        .await?;

    tracing::info!(user_id = %outcome.profile.id, "Login request served");

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: outcome.profile.into(),
        token: outcome.access_token,
        refresh_token: outcome.refresh_token,
    }))
}

/// PUT /api/users
///
/// **Requires valid access token** in `Authorization: Bearer <token>`.
///
/// # Errors
/// - 400: Invalid email or weak password
/// - 401: Missing, invalid or expired access token
/// - 404: Account no longer exists
/// - 409: Email taken by another account
pub async fn update_user(
    user: AuthenticatedUser,
    form: web::Json<CredentialsRequest>,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;

    let profile = session
        .update_credentials(user.user_id, &email, &form.password)
        .await?;

    tracing::info!(user_id = %user.user_id, "User updated");

    Ok(HttpResponse::Ok().json(UserResponse::from(profile)))
}
