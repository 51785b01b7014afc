/// Payment provider webhooks
///
/// Only the `ApiKey` authorization and the payload shape are handled here.
/// Applying an upgrade to the account is out of this service's scope; the
/// event is acknowledged once authorized and well-formed.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, ValidationError};
use crate::session::SessionService;

const USER_UPGRADED: &str = "user.upgraded";

#[derive(Deserialize)]
pub struct PolkaEvent {
    pub event: String,
    pub data: PolkaEventData,
}

#[derive(Deserialize)]
pub struct PolkaEventData {
    pub user_id: String,
}

/// POST /api/polka/webhooks
///
/// The body is parsed only after the API key checks out.
///
/// # Errors
/// - 400: Body is not a valid event
/// - 401: Missing, malformed or wrong API key
pub async fn polka_webhook(
    req: HttpRequest,
    body: web::Bytes,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    session.authorize_webhook(req.headers())?;

    let event: PolkaEvent = serde_json::from_slice(&body)
        .map_err(|_| ValidationError::InvalidFormat("event"))?;

    if event.event != USER_UPGRADED {
        tracing::debug!(event = %event.event, "Ignoring webhook event");
        return Ok(HttpResponse::NoContent().finish());
    }

    let user_id = Uuid::parse_str(&event.data.user_id)
        .map_err(|_| ValidationError::InvalidFormat("user_id"))?;

    tracing::info!(user_id = %user_id, "Upgrade event acknowledged");
    Ok(HttpResponse::NoContent().finish())
}
