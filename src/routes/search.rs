//! Search Endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    db::{Asset, SearchField},
    error::ApiError,
    AppState,
};

/// 검색 쿼리 파라미터
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// 검색어 (비어 있으면 전체 목록)
    pub q: Option<String>,
    /// type | model | status | location | reason | warranty | all
    pub field: Option<String>,
}

/// GET /api/search?q=dell&field=model
pub async fn search_assets(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Asset>>, ApiError> {
    let field = SearchField::parse_optional(query.field.as_deref())?;

    let assets = match query.q.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => state.assets.search(term, field).await?,
        _ => state.assets.list().await?,
    };

    Ok(Json(assets))
}
