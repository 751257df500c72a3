//! IT Asset Inventory Library
//!
//! # Overview
//!
//! 하드웨어/소프트웨어/네트워크/스토리지 자산의 상태, 위치, 구매/보증 정보를
//! 기록하고 모든 변경을 `asset_history`에 남긴다.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                         API                              │
//! │                                                          │
//! │  ┌─────────┐   ┌──────────────────┐   ┌─────────────┐   │
//! │  │ Routes  │──▶│ AssetRepository  │──▶│ AssetStore  │   │
//! │  └─────────┘   └──────────────────┘   └──────┬──────┘   │
//! │       │                                      │          │
//! │  ┌─────────┐                          ┌──────▼──────┐   │
//! │  │ Export  │                          │  Database   │   │
//! │  └─────────┘                          └──────┬──────┘   │
//! └──────────────────────────────────────────────┼──────────┘
//!                                                ▼
//!                                        ┌──────────────┐
//!                                        │  PostgreSQL  │
//!                                        └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: 환경 설정 관리
//! - `error`: HTTP 에러 타입 및 처리
//! - `routes`: HTTP 엔드포인트 핸들러
//! - `services`: CSV 내보내기
//! - `db`: 연결 관리, 스키마, 저장소
//! - `types`: 공통 타입 정의
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use asset_inventory::db::{schema, AssetRepository, Database, PgAssetStore};
//!
//! let db = Arc::new(Database::connect(&config.database).await?);
//! schema::ensure_schema(&db).await?;
//! let repo = AssetRepository::new(Arc::new(PgAssetStore::new(db.clone())));
//! let id = repo.create(draft).await?;
//! ```

use std::sync::Arc;

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod services;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use db::{AssetRepository, Database};
pub use error::ApiError;

/// 애플리케이션 전역 상태
#[derive(Clone)]
pub struct AppState {
    pub assets: Arc<AssetRepository>,
    pub config: Arc<Config>,
}
