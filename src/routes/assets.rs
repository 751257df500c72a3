//! Asset Endpoints
//!
//! CRUD + per-asset history. Each handler maps 1:1 onto an `AssetRepository`
//! operation.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::{
    db::{Asset, AssetDraft, AssetHistoryEntry, AssetPatch},
    error::ApiError,
    types::ApiResponse,
    AppState,
};

// ============ Response Types ============

#[derive(Debug, Serialize)]
pub struct MutationResult {
    pub asset_id: i32,
    pub message: String,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

fn asset_id(path: Result<Path<i32>, PathRejection>) -> Result<i32, ApiError> {
    path
        .map(|Path(id)| id)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

// ============ Handlers ============

/// GET /api/assets
///
/// 전체 자산 목록 (id 오름차순)
pub async fn list_assets(State(state): State<AppState>) -> Result<Json<Vec<Asset>>, ApiError> {
    Ok(Json(state.assets.list().await?))
}

/// GET /api/assets/:id
pub async fn get_asset(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Asset>, ApiError> {
    let id = asset_id(path)?;
    state
        .assets
        .read(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Asset {}", id)))
}

/// POST /api/assets
///
/// # Request
///
/// ```json
/// {
///   "asset_type": "HARDWARE",
///   "model": "Dell OptiPlex 7090",
///   "purchase_date": "2024-01-15",
///   "warranty": "3 years",
///   "status": "OPERATING",
///   "location": "HQ_SERVER_ROOM",
///   "reason": "dev team workstation"
/// }
/// ```
pub async fn create_asset(
    State(state): State<AppState>,
    payload: Result<Json<AssetDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<MutationResult>>), ApiError> {
    let draft = body(payload)?;
    let asset_id = state.assets.create(draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(MutationResult {
            asset_id,
            message: "Asset created".to_string(),
        })),
    ))
}

/// PUT /api/assets/:id
///
/// 보낸 필드만 바뀐다. nullable 필드에 `null`을 보내면 값이 지워진다.
pub async fn update_asset(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<AssetPatch>, JsonRejection>,
) -> Result<Json<ApiResponse<MutationResult>>, ApiError> {
    let id = asset_id(path)?;
    let patch = body(payload)?;

    if !state.assets.update(id, patch).await? {
        return Err(ApiError::BadRequest(format!("Asset {} was not updated", id)));
    }

    Ok(Json(ApiResponse::success(MutationResult {
        asset_id: id,
        message: "Asset updated".to_string(),
    })))
}

/// DELETE /api/assets/:id
pub async fn delete_asset(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<ApiResponse<MutationResult>>, ApiError> {
    let id = asset_id(path)?;
    if !state.assets.delete(id).await? {
        return Err(ApiError::NotFound(format!("Asset {}", id)));
    }

    Ok(Json(ApiResponse::success(MutationResult {
        asset_id: id,
        message: "Asset deleted".to_string(),
    })))
}

/// GET /api/assets/:id/history
///
/// 삭제된 자산의 이력도 조회된다.
pub async fn get_asset_history(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<AssetHistoryEntry>>, ApiError> {
    let id = asset_id(path)?;
    Ok(Json(state.assets.history(id).await?))
}
