//! CSV Export Endpoint

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use crate::{error::ApiError, services::export, AppState};

/// GET /export/csv
///
/// `assets_YYYYMMDD_HHMMSS.csv` 첨부파일로 내려준다.
pub async fn export_csv(State(state): State<AppState>) -> Result<Response, ApiError> {
    let assets = state.assets.list().await?;
    let csv = export::render_csv(&assets);
    let filename = export::export_filename(chrono::Utc::now());

    tracing::info!("Exported {} asset(s) to {}", assets.len(), filename);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    )
        .into_response())
}
