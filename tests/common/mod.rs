//! Shared harness: the real HTTP server over in-memory stores and a manual clock

#![allow(dead_code)]

use async_trait::async_trait;
use chirpy::auth::RefreshTokenRecord;
use chirpy::clock::ManualClock;
use chirpy::configuration::{JwtSettings, PolkaSettings};
use chirpy::error::DatabaseError;
use chirpy::repository::{RefreshTokenRepository, UserRecord, UserRepository};
use chirpy::session::SessionService;
use chirpy::startup::run;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";
pub const PASSWORD: &str = "Heisenberg123";

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<Uuid, UserRecord>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn create(
        &self,
        email: &str,
        hashed_password: &str,
        now: DateTime<Utc>,
    ) -> Result<UserRecord, DatabaseError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == email) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "Email already registered".to_string(),
            ));
        }
        let user = UserRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            created_at: now,
            updated_at: now,
            is_chirpy_red: false,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
        now: DateTime<Utc>,
    ) -> Result<UserRecord, DatabaseError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == email && u.id != id) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "Email already registered".to_string(),
            ));
        }
        let user = users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound("user".to_string()))?;
        user.email = email.to_string();
        user.hashed_password = hashed_password.to_string();
        user.updated_at = now;
        Ok(user.clone())
    }
}

#[derive(Default)]
pub struct InMemoryRefreshTokenRepository {
    tokens: Mutex<HashMap<String, RefreshTokenRecord>>,
}

impl InMemoryRefreshTokenRepository {
    pub fn len(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }

    pub fn get(&self, token: &str) -> Option<RefreshTokenRecord> {
        self.tokens.lock().unwrap().get(token).cloned()
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), DatabaseError> {
        let mut tokens = self.tokens.lock().unwrap();
        if tokens.contains_key(&record.token) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "refresh token".to_string(),
            ));
        }
        tokens.insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn find_by_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, DatabaseError> {
        Ok(self.tokens.lock().unwrap().get(token).cloned())
    }

    async fn mark_revoked(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens.get_mut(token) {
            Some(record) if record.revoked_at.is_none() => {
                record.revoked_at = Some(revoked_at);
                record.updated_at = revoked_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

pub fn jwt_settings() -> JwtSettings {
    JwtSettings {
        secret: "integration-test-secret-0123456789abcdef".to_string(),
        issuer: "chirpy".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 60 * 24 * 3600,
    }
}

pub fn session_service(
    users: Arc<InMemoryUserRepository>,
    refresh_tokens: Arc<InMemoryRefreshTokenRepository>,
    clock: Arc<ManualClock>,
) -> SessionService {
    SessionService::new(
        users,
        refresh_tokens,
        clock,
        jwt_settings(),
        PolkaSettings {
            api_key: POLKA_KEY.to_string(),
        },
    )
}

pub struct TestApp {
    pub address: String,
    pub clock: Arc<ManualClock>,
    pub refresh_tokens: Arc<InMemoryRefreshTokenRepository>,
    pub client: reqwest::Client,
}

pub fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let clock = Arc::new(ManualClock::new(start_time()));
    let users = Arc::new(InMemoryUserRepository::default());
    let refresh_tokens = Arc::new(InMemoryRefreshTokenRepository::default());
    let session = session_service(users, refresh_tokens.clone(), clock.clone());

    let server = run(listener, session).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        clock,
        refresh_tokens,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub async fn post_user(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/api/users", &self.address))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_login(&self, body: Value) -> reqwest::Response {
        self.client
            .post(&format!("{}/api/login", &self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn put_user(&self, token: &str, email: &str, password: &str) -> reqwest::Response {
        self.client
            .put(&format!("{}/api/users", &self.address))
            .header("Authorization", format!("Bearer {}", token))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_with_bearer(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", &self.address, path))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Register and log in, returning `(access_token, refresh_token)`
    pub async fn signed_in(&self, email: &str) -> (String, String) {
        assert_eq!(201, self.post_user(email, PASSWORD).await.status().as_u16());

        let response = self
            .post_login(json!({ "email": email, "password": PASSWORD }))
            .await;
        assert_eq!(200, response.status().as_u16());

        let body: Value = response.json().await.expect("Failed to parse response");
        (
            body["token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }
}
