use chrono::Duration;
use config::ConfigError;
use std::fmt;

/// Access tokens never live longer than an hour
pub const MAX_ACCESS_TOKEN_EXPIRY: i64 = 3600;
/// Five years
pub const MAX_REFRESH_TOKEN_EXPIRY: i64 = 5 * 365 * 24 * 3600;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    pub polka: PolkaSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("port", &self.port)
            .field("host", &self.host)
            .field("database_name", &self.database_name)
            .finish()
    }
}

/// JWT authentication settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64, // seconds, also the cap for client-requested lifetimes
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry: i64, // seconds (5184000 = 60 days)
}

impl JwtSettings {
    pub fn access_token_ttl(&self) -> Duration {
        Duration::seconds(self.access_token_expiry)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::seconds(self.refresh_token_expiry)
    }

    /// Lifetime for a login that asked for `requested` seconds
    ///
    /// Anything missing, non-positive or above the configured lifetime
    /// falls back to the configured lifetime.
    pub fn clamped_access_token_ttl(&self, requested: Option<i64>) -> Duration {
        match requested {
            Some(seconds) if seconds > 0 && seconds <= self.access_token_expiry => {
                Duration::seconds(seconds)
            }
            _ => self.access_token_ttl(),
        }
    }
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"[redacted]")
            .field("issuer", &self.issuer)
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .finish()
    }
}

/// Payment provider webhook settings
#[derive(serde::Deserialize, Clone)]
pub struct PolkaSettings {
    pub api_key: String,
}

impl fmt::Debug for PolkaSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolkaSettings")
            .field("api_key", &"[redacted]")
            .finish()
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_issuer() -> String {
    "chirpy".to_string()
}

fn default_access_token_expiry() -> i64 {
    3600
}

fn default_refresh_token_expiry() -> i64 {
    60 * 24 * 3600
}

impl Settings {
    /// Reject settings the server must not start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Message("jwt.secret must not be empty".to_string()));
        }
        if self.jwt.issuer.trim().is_empty() {
            return Err(ConfigError::Message("jwt.issuer must not be empty".to_string()));
        }
        if !(1..=MAX_ACCESS_TOKEN_EXPIRY).contains(&self.jwt.access_token_expiry) {
            return Err(ConfigError::Message(format!(
                "jwt.access_token_expiry must be between 1 and {} seconds",
                MAX_ACCESS_TOKEN_EXPIRY
            )));
        }
        if !(1..=MAX_REFRESH_TOKEN_EXPIRY).contains(&self.jwt.refresh_token_expiry) {
            return Err(ConfigError::Message(format!(
                "jwt.refresh_token_expiry must be between 1 and {} seconds",
                MAX_REFRESH_TOKEN_EXPIRY
            )));
        }
        if self.polka.api_key.trim().is_empty() {
            return Err(ConfigError::Message("polka.api_key must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Load `configuration.yaml` (optional) overlaid with `APP__SECTION__KEY`
/// environment variables. Called once at startup.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}
