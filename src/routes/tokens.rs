/// Token Routes
///
/// Refresh and revoke both read the refresh token from
/// `Authorization: Bearer <refresh_token>`.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;

use crate::error::AppError;
use crate::session::SessionService;

/// Newly minted access token
#[derive(Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

/// POST /api/refresh
///
/// # Errors
/// - 401: Missing header, unknown, revoked or expired refresh token
/// - 500: Internal server error
pub async fn refresh(
    req: HttpRequest,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let token = session.refresh(req.headers()).await?;

    tracing::debug!("Refresh request served");
    Ok(HttpResponse::Ok().json(RefreshResponse { token }))
}

/// POST /api/revoke
///
/// # Errors
/// - 400: Refresh token already revoked
/// - 401: Missing header or unknown refresh token
/// - 500: Internal server error
pub async fn revoke(
    req: HttpRequest,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    session.revoke(req.headers()).await?;

    tracing::debug!("Revoke request served");
    Ok(HttpResponse::NoContent().finish())
}
