/// Request guards
///
/// `AuthenticatedUser` runs the Bearer access-token check before a handler
/// body executes; a handler that takes it as an argument is protected.

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::AppError;
use crate::session::SessionService;

/// The user a valid access token was issued to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match req.app_data::<web::Data<SessionService>>() {
            Some(session) => session
                .authenticate(req.headers())
                .map(|user_id| AuthenticatedUser { user_id }),
            None => Err(AppError::Internal(
                "session service is not registered".to_string(),
            )),
        };

        if let Ok(user) = &result {
            tracing::debug!(user_id = %user.user_id, "Access token validated");
        }

        ready(result)
    }
}
