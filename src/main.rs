use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use authgate::configuration::get_configuration;
use authgate::startup::run;
use authgate::telemetry::init_telemetry;
use authgate::users::PostgresUserRepository;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // 구조화된 로깅 초기화
    init_telemetry("info");

    // 설정 로드
    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!(domain = %config.jwt.domain, "Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    // 사용자 조회용 커넥션 풀 (첫 요청 시 연결)
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(configuration.database.acquire_timeout))
        .connect_lazy(&configuration.database.connection_string())
        .map_err(|e| {
            tracing::error!("Invalid database settings: {}", e);
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "Database configuration error")
        })?;
    let users = Arc::new(PostgresUserRepository::new(pool));

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, configuration.jwt, users)?;
    server.await
}
