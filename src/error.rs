/// Error Handling Module
///
/// Unified error handling for the service:
/// 1. Domain-specific error types (validation, storage, auth, crypto)
/// 2. A single `AppError` that every component error converts into
/// 3. Coarse error classes that decide what the caller is allowed to see
/// 4. HTTP response mapping with structured server-side logging
///
/// Nothing in this module ever formats a signing secret, a password hash
/// or a refresh-token value.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

use crate::auth::{AccessTokenError, ExtractError, PasswordError, RefreshTokenError};

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for input data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyField(&'static str),
    TooShort(&'static str, usize),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str),
    WeakPassword,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is required", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::WeakPassword => write!(
                f,
                "password must contain at least one digit, one lowercase letter, and one uppercase letter"
            ),
        }
    }
}

impl StdError for ValidationError {}

/// Database operation errors
#[derive(Debug)]
pub enum DatabaseError {
    UniqueConstraintViolation(String),
    NotFound(String),
    QueryExecution(String),
    ConnectionPool(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::UniqueConstraintViolation(msg) => {
                write!(f, "Duplicate entry: {}", msg)
            }
            DatabaseError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DatabaseError::QueryExecution(msg) => write!(f, "Query error: {}", msg),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err)
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                DatabaseError::UniqueConstraintViolation("Email already registered".to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionPool(err.to_string())
            }
            other => DatabaseError::QueryExecution(other.to_string()),
        }
    }
}

/// Authentication and authorization errors
///
/// These are the fine-grained kinds kept for server-side logs. Callers only
/// ever see the coarse `ErrorClass` they map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown email or wrong password, deliberately merged
    InvalidCredential,
    MissingAuthHeader,
    MalformedAuthHeader,
    TokenExpired,
    /// Bad signature or foreign issuer
    TokenInvalid,
    TokenMalformed,
    TokenNotFound,
    /// Refresh attempted with a revoked refresh token
    TokenRevoked,
    /// Explicit revoke of a token that is already revoked
    TokenAlreadyRevoked,
    InvalidApiKey,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredential => write!(f, "Invalid credentials"),
            AuthError::MissingAuthHeader => write!(f, "Missing Authorization header"),
            AuthError::MalformedAuthHeader => write!(f, "Malformed Authorization header"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::TokenInvalid => write!(f, "Token signature or issuer is invalid"),
            AuthError::TokenMalformed => write!(f, "Token is malformed"),
            AuthError::TokenNotFound => write!(f, "Refresh token not found"),
            AuthError::TokenRevoked => write!(f, "Refresh token has been revoked"),
            AuthError::TokenAlreadyRevoked => write!(f, "Refresh token was already revoked"),
            AuthError::InvalidApiKey => write!(f, "Invalid API key"),
        }
    }
}

impl StdError for AuthError {}

/// Entropy, signing and hashing faults
#[derive(Debug)]
pub enum CryptoError {
    Entropy(String),
    Signing(String),
    Hashing(String),
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::Entropy(msg) => write!(f, "Entropy source failure: {}", msg),
            CryptoError::Signing(msg) => write!(f, "Token signing failure: {}", msg),
            CryptoError::Hashing(msg) => write!(f, "Password hashing failure: {}", msg),
        }
    }
}

impl StdError for CryptoError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Central error type that all application errors map to
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Database(DatabaseError),
    Auth(AuthError),
    Crypto(CryptoError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Crypto(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

/// The only distinctions a caller is ever shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    BadRequest,
    Unauthorized,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorClass {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorClass::BadRequest => StatusCode::BAD_REQUEST,
            ErrorClass::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorClass::NotFound => StatusCode::NOT_FOUND,
            ErrorClass::Conflict => StatusCode::CONFLICT,
            ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    pub fn class(&self) -> ErrorClass {
        match self {
            AppError::Validation(_) => ErrorClass::BadRequest,
            AppError::Auth(AuthError::TokenAlreadyRevoked) => ErrorClass::BadRequest,
            AppError::Auth(_) => ErrorClass::Unauthorized,
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => ErrorClass::Conflict,
            AppError::Database(DatabaseError::NotFound(_)) => ErrorClass::NotFound,
            AppError::Database(_) | AppError::Crypto(_) | AppError::Internal(_) => {
                ErrorClass::Internal
            }
        }
    }
}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<CryptoError> for AppError {
    fn from(err: CryptoError) -> Self {
        AppError::Crypto(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.into())
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Mismatch => AppError::Auth(AuthError::InvalidCredential),
            PasswordError::MalformedHash => AppError::Crypto(CryptoError::Hashing(
                "stored password hash is malformed".to_string(),
            )),
            PasswordError::Hashing(msg) => AppError::Crypto(CryptoError::Hashing(msg)),
        }
    }
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::MissingHeader => AppError::Auth(AuthError::MissingAuthHeader),
            ExtractError::MalformedScheme(_) => AppError::Auth(AuthError::MalformedAuthHeader),
        }
    }
}

impl From<AccessTokenError> for AppError {
    fn from(err: AccessTokenError) -> Self {
        match err {
            AccessTokenError::Expired => AppError::Auth(AuthError::TokenExpired),
            AccessTokenError::InvalidSignature | AccessTokenError::InvalidIssuer => {
                AppError::Auth(AuthError::TokenInvalid)
            }
            AccessTokenError::Malformed => AppError::Auth(AuthError::TokenMalformed),
            AccessTokenError::Signing(msg) => AppError::Crypto(CryptoError::Signing(msg)),
        }
    }
}

impl From<RefreshTokenError> for AppError {
    fn from(err: RefreshTokenError) -> Self {
        match err {
            RefreshTokenError::NotFound => AppError::Auth(AuthError::TokenNotFound),
            RefreshTokenError::AlreadyRevoked => AppError::Auth(AuthError::TokenAlreadyRevoked),
            RefreshTokenError::Entropy(msg) => AppError::Crypto(CryptoError::Entropy(msg)),
            RefreshTokenError::Storage(e) => AppError::Database(e),
        }
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID, also present in the server-side log line
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let class = self.class();
        let (code, message) = match (class, self) {
            (_, AppError::Validation(e)) => ("VALIDATION_ERROR", e.to_string()),
            (_, AppError::Auth(AuthError::InvalidCredential)) => {
                ("INVALID_CREDENTIALS", "Invalid email or password".to_string())
            }
            (ErrorClass::BadRequest, _) => ("BAD_REQUEST", "Bad request".to_string()),
            (ErrorClass::Unauthorized, _) => ("UNAUTHORIZED", "Unauthorized".to_string()),
            (ErrorClass::NotFound, _) => ("NOT_FOUND", "Not found".to_string()),
            (ErrorClass::Conflict, _) => {
                ("DUPLICATE_ENTRY", "Email already registered".to_string())
            }
            (ErrorClass::Internal, _) => ("INTERNAL_ERROR", "Internal server error".to_string()),
        };

        let status = class.status_code();
        let error_response = ErrorResponse::new(
            request_id.to_string(),
            message,
            code.to_string(),
            status.as_u16(),
        );

        (status, error_response)
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Validation error");
            }
            AppError::Auth(AuthError::InvalidCredential) => {
                tracing::warn!(request_id = request_id, error = %self, "Invalid credentials attempt");
            }
            AppError::Auth(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Authentication error");
            }
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => {
                tracing::warn!(request_id = request_id, error = %self, "Duplicate entry attempt");
            }
            AppError::Database(e) => {
                tracing::error!(request_id = request_id, error = %e, "Database error");
            }
            AppError::Crypto(e) => {
                tracing::error!(request_id = request_id, error = %e, "Cryptographic failure");
            }
            AppError::Internal(msg) => {
                tracing::error!(request_id = request_id, error = %msg, "Internal error");
            }
        }
    }
}

/// Implement ResponseError for Actix-web integration
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&request_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        self.class().status_code()
    }
}
