/// Authorization header parsing
///
/// Pulls the raw credential out of `Authorization: Bearer <token>` or
/// `Authorization: ApiKey <key>`. The scheme word is case-sensitive and must
/// be followed by exactly one space; the remainder is returned verbatim.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use std::error::Error as StdError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// Access and refresh tokens
    Bearer,
    /// Machine-to-machine key, webhook only
    ApiKey,
}

impl AuthScheme {
    pub fn prefix(self) -> &'static str {
        match self {
            AuthScheme::Bearer => "Bearer ",
            AuthScheme::ApiKey => "ApiKey ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractError {
    MissingHeader,
    MalformedScheme(AuthScheme),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::MissingHeader => write!(f, "missing Authorization header"),
            ExtractError::MalformedScheme(scheme) => write!(
                f,
                "Authorization header does not use the {:?} scheme",
                scheme
            ),
        }
    }
}

impl StdError for ExtractError {}

/// Extract the credential for `scheme` from the request headers
///
/// An empty header value counts as missing.
///
/// # Errors
/// - `ExtractError::MissingHeader` if there is no Authorization header
/// - `ExtractError::MalformedScheme` if the value is not visible ASCII or
///   does not start with the scheme prefix
pub fn extract_credential(headers: &HeaderMap, scheme: AuthScheme) -> Result<&str, ExtractError> {
    let value = headers
        .get(AUTHORIZATION)
        .filter(|value| !value.is_empty())
        .ok_or(ExtractError::MissingHeader)?;

    value
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix(scheme.prefix()))
        .ok_or(ExtractError::MalformedScheme(scheme))
}

pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, ExtractError> {
    extract_credential(headers, AuthScheme::Bearer)
}

pub fn extract_api_key(headers: &HeaderMap) -> Result<&str, ExtractError> {
    extract_credential(headers, AuthScheme::ApiKey)
}
