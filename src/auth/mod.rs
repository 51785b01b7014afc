/// Authentication module
///
/// Password hashing, Authorization header parsing, signed access tokens
/// and the refresh token lifecycle.

mod claims;
mod extractor;
mod jwt;
mod password;
mod refresh_token;

pub use claims::Claims;
pub use extractor::{extract_api_key, extract_bearer, extract_credential, AuthScheme, ExtractError};
pub use jwt::{issue_access_token, validate_access_token, AccessTokenError};
pub use password::{
    hash_password, prepare_unknown_account_hash, simulate_verification, verify_password,
    PasswordError,
};
pub use refresh_token::{
    generate_refresh_token, lookup_refresh_token, persist_refresh_token, revoke_refresh_token,
    RefreshTokenError, RefreshTokenRecord, TokenState, REFRESH_TOKEN_BYTES,
};
