use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;

use school_library::configuration::{get_configuration, Settings, StoreBackend};
use school_library::startup::run;
use school_library::store::Stores;
use school_library::telemetry::init_telemetry;

async fn build_stores(configuration: &Settings) -> std::io::Result<Stores> {
    match configuration.database.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory stores; data is lost on shutdown");
            Ok(Stores::in_memory())
        }
        StoreBackend::Postgres => {
            // 데이터베이스 연결 풀 생성
            tracing::info!("Attempting to connect to database");
            let pool = PgPoolOptions::new()
                .max_connections(configuration.database.max_connections)
                .connect(&configuration.database.connection_string())
                .await
                .map_err(|e| {
                    tracing::error!("Failed to create connection pool: {}", e);
                    std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        "Database connection error",
                    )
                })?;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to run database migrations: {}", e);
                    std::io::Error::new(std::io::ErrorKind::Other, "Database migration error")
                })?;

            tracing::info!("Database connection pool created successfully");
            Ok(Stores::postgres(pool))
        }
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // 구조화된 로깅 초기화
    if let Err(e) = init_telemetry() {
        eprintln!("Failed to initialize telemetry: {}", e);
    }

    tracing::info!("Starting application");

    // 설정 로드
    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
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

    let stores = build_stores(&configuration).await?;

    // 서버 주소 설정
    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    // 서버 실행
    let server = run(listener, stores, configuration)?;
    tracing::info!("Server started successfully");

    server.await
}
