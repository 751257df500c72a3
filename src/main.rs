//! IT Asset Inventory API Server
//!
//! # Startup
//!
//! ```text
//! .env ─▶ Config ─▶ Database::connect (retry) ─▶ ensure_schema
//!                                                   │
//!                     AssetRepository ◀── PgAssetStore
//!                            │
//!                       axum Router ─▶ serve (Ctrl-C → graceful shutdown)
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use asset_inventory::{
    db::{schema, PgAssetStore},
    routes, AppState, AssetRepository, Config, Database,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경변수 로드
    dotenvy::dotenv().ok();

    // 로깅 초기화
    // RUST_LOG=debug,sqlx=warn 형태로 레벨 제어 가능
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "asset_inventory=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting IT Asset Inventory API Server");

    // 설정 로드
    let config = Config::from_env()?;
    tracing::info!("📋 Configuration loaded");

    // 데이터베이스 연결 (실패 시 종료)
    let db = Arc::new(Database::connect(&config.database).await?);
    match db.server_version().await {
        Ok(version) => tracing::info!("🗄️  Database connected (PostgreSQL {})", version),
        Err(err) => tracing::warn!("🗄️  Database connected, version unknown: {}", err),
    }

    // 스키마 준비
    schema::ensure_schema(&db).await?;
    tracing::info!("📦 Schema ready");

    // 앱 상태 구성
    let store = Arc::new(PgAssetStore::new(db.clone()));
    let state = AppState {
        assets: Arc::new(AssetRepository::new(store)),
        config: Arc::new(config.clone()),
    };

    // 라우터 구성
    let app = routes::create_router(state);

    // 서버 시작
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🌐 Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("🛑 Shutdown signal received");
}
