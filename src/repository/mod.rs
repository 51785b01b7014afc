/// Persistence collaborators
///
/// Narrow async traits the session layer depends on, with Postgres
/// implementations backed by sqlx.

mod refresh_tokens;
mod users;

pub use refresh_tokens::{PgRefreshTokenRepository, RefreshTokenRepository};
pub use users::{PgUserRepository, UserProfile, UserRecord, UserRepository};

#[cfg(test)]
pub use refresh_tokens::MockRefreshTokenRepository;
#[cfg(test)]
pub use users::MockUserRepository;
