use std::net::TcpListener;
use std::sync::Arc;
use chirpy::auth::prepare_unknown_account_hash;
use chirpy::clock::SystemClock;
use chirpy::configuration::get_configuration;
use chirpy::repository::{PgRefreshTokenRepository, PgUserRepository};
use chirpy::session::SessionService;
use chirpy::startup::run;
use chirpy::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // 구조화된 로깅 초기화
    init_telemetry();

    tracing::info!("Starting application");

    // 설정 로드 (비밀 값이 비어 있으면 시작하지 않음)
    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error"
            ));
        }
    };

    // 존재하지 않는 계정용 더미 해시를 미리 생성 (첫 로그인 요청의 지연 방지)
    prepare_unknown_account_hash().map_err(|e| {
        tracing::error!("Failed to prepare password hashing: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, "Password hashing error")
    })?;

    // 데이터베이스 연결 풀 생성
    let connection_string = configuration.database.connection_string();
    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&connection_string)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error"
            )
        })?;

    tracing::info!("Database connection pool created successfully");

    // 세션 서비스 구성
    let session = SessionService::new(
        Arc::new(PgUserRepository::new(pool.clone())),
        Arc::new(PgRefreshTokenRepository::new(pool)),
        Arc::new(SystemClock),
        configuration.jwt.clone(),
        configuration.polka.clone(),
    );

    // 서버 주소 설정
    let address = configuration.application.address();
    tracing::info!("Binding server to address: {}", address);

    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    // 서버 실행
    let server = run(listener, session)?;
    tracing::info!("Server started successfully");

    server.await
}
