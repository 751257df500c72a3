//! API Routes Module
//!
//! 모든 HTTP 엔드포인트 정의
//!
//! # Routes
//!
//! ```text
//! GET    /health                   - 서버/DB 상태 확인
//!
//! GET    /api/assets               - 자산 목록
//! POST   /api/assets               - 자산 추가
//! GET    /api/assets/:id           - 자산 조회
//! PUT    /api/assets/:id           - 자산 수정
//! DELETE /api/assets/:id           - 자산 삭제
//! GET    /api/assets/:id/history   - 변경 이력
//!
//! GET    /api/search?q=&field=     - 검색
//! GET    /api/statistics           - 통계
//! GET    /export/csv               - CSV 내보내기
//! ```

pub mod assets;
pub mod export;
pub mod health;
pub mod search;
pub mod statistics;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// 라우터 생성
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))

        // Assets
        .route("/api/assets", get(assets::list_assets).post(assets::create_asset))
        .route(
            "/api/assets/:id",
            get(assets::get_asset)
                .put(assets::update_asset)
                .delete(assets::delete_asset),
        )
        .route("/api/assets/:id/history", get(assets::get_asset_history))

        // Search / statistics / export
        .route("/api/search", get(search::search_assets))
        .route("/api/statistics", get(statistics::get_statistics))
        .route("/export/csv", get(export::export_csv))

        // 미들웨어
        .layer(TraceLayer::new_for_http())
        .layer(cors)

        // 상태 주입
        .with_state(state)
}

/// CORS 설정
///
/// 프로덕션: `ALLOWED_ORIGINS`에 있는 origin만 허용
/// 개발: 전부 허용
fn cors_layer(state: &AppState) -> CorsLayer {
    if state.config.is_production() {
        let origins: Vec<HeaderValue> = state
            .config
            .allowed_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
