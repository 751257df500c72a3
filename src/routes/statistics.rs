//! Statistics Endpoint

use axum::{extract::State, Json};

use crate::{db::AssetStatistics, error::ApiError, AppState};

/// GET /api/statistics
///
/// ```json
/// {
///   "total": 5,
///   "by_status": { "in_stock": 1, "waiting": 1, "operating": 3, "idle": 0, "disposed": 0 },
///   "by_type": { "hardware": 2, "software": 1, "network": 1, "storage": 1 }
/// }
/// ```
pub async fn get_statistics(
    State(state): State<AppState>,
) -> Result<Json<AssetStatistics>, ApiError> {
    Ok(Json(state.assets.statistics().await?))
}
