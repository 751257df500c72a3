//! PostgreSQL `AssetStore`
//!
//! 모든 SQL은 `Database::execute`를 통과한다.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use super::error::DbError;
use super::models::{
    Asset, AssetDraft, AssetHistoryEntry, AssetRow, AssetStatistics, AssetStatus, AssetType,
    HistoryRow, NewHistoryEntry, SearchField,
};
use super::repository::AssetStore;
use super::{Database, Statement};

/// `assets` 조회 컬럼
const ASSET_COLUMNS: &str = "\
    id, asset_type, model, purchase_date, warranty, \
    status, location, reason, created_at, updated_at";

const HISTORY_COLUMNS: &str = "id, asset_id, action, old_values, new_values, changed_at";

/// ILIKE 패턴용 이스케이프 (`%`, `_`, `\`는 문자 그대로 매칭)
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `%term%`
pub fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

/// 검색 WHERE 절. 패턴은 항상 `$1` 하나.
pub fn search_predicate(field: Option<SearchField>) -> String {
    match field {
        Some(field) => format!("{} ILIKE $1", field.column()),
        None => SearchField::DEFAULT_SET
            .iter()
            .map(|f| format!("{} ILIKE $1", f.column()))
            .collect::<Vec<_>>()
            .join(" OR "),
    }
}

/// 집계 쿼리 (한 번에 전체/상태별/유형별)
pub fn statistics_query() -> String {
    let mut columns = vec!["COUNT(*) AS total".to_string()];
    for status in AssetStatus::ALL {
        columns.push(format!(
            "COUNT(*) FILTER (WHERE status = '{}') AS {}",
            status.as_str(),
            status.as_str().to_ascii_lowercase()
        ));
    }
    for asset_type in AssetType::ALL {
        columns.push(format!(
            "COUNT(*) FILTER (WHERE asset_type = '{}') AS {}",
            asset_type.as_str(),
            asset_type.as_str().to_ascii_lowercase()
        ));
    }
    format!("SELECT {} FROM assets", columns.join(", "))
}

fn decode_assets(rows: Vec<PgRow>) -> Result<Vec<Asset>, DbError> {
    rows.iter()
        .map(|row| Asset::try_from(AssetRow::from_row(row)?))
        .collect()
}

pub struct PgAssetStore {
    db: Arc<Database>,
}

impl PgAssetStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn fetch_assets(&self, statement: Statement) -> Result<Vec<Asset>, DbError> {
        let rows = self.db.execute(statement).await?.into_rows()?;
        decode_assets(rows)
    }
}

#[async_trait]
impl AssetStore for PgAssetStore {
    async fn insert(&self, draft: &AssetDraft) -> Result<i32, DbError> {
        let statement = Statement::new(
            r#"
            INSERT INTO assets (asset_type, model, purchase_date, warranty, status, location, reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(draft.asset_type.as_str())
        .bind(draft.model.clone())
        .bind(draft.purchase_date)
        .bind(draft.warranty.clone())
        .bind(draft.status.as_str())
        .bind(draft.location.as_str())
        .bind(draft.reason.clone());

        let rows = self.db.execute(statement).await?.into_rows()?;
        let row = rows
            .first()
            .ok_or_else(|| DbError::Decode("INSERT returned no id".to_string()))?;
        Ok(row.try_get::<i32, _>("id")?)
    }

    async fn fetch(&self, id: i32) -> Result<Option<Asset>, DbError> {
        let statement =
            Statement::new(format!("SELECT {ASSET_COLUMNS} FROM assets WHERE id = $1")).bind(id);
        Ok(self.fetch_assets(statement).await?.into_iter().next())
    }

    async fn update(&self, id: i32, draft: &AssetDraft) -> Result<u64, DbError> {
        let statement = Statement::new(
            r#"
            UPDATE assets
            SET asset_type = $1, model = $2, purchase_date = $3, warranty = $4,
                status = $5, location = $6, reason = $7
            WHERE id = $8
            "#,
        )
        .bind(draft.asset_type.as_str())
        .bind(draft.model.clone())
        .bind(draft.purchase_date)
        .bind(draft.warranty.clone())
        .bind(draft.status.as_str())
        .bind(draft.location.as_str())
        .bind(draft.reason.clone())
        .bind(id);

        Ok(self.db.execute(statement).await?.affected())
    }

    async fn delete(&self, id: i32) -> Result<u64, DbError> {
        let statement = Statement::new("DELETE FROM assets WHERE id = $1").bind(id);
        Ok(self.db.execute(statement).await?.affected())
    }

    async fn list(&self) -> Result<Vec<Asset>, DbError> {
        self.fetch_assets(Statement::new(format!(
            "SELECT {ASSET_COLUMNS} FROM assets ORDER BY id"
        )))
        .await
    }

    async fn search(&self, term: &str, field: Option<SearchField>) -> Result<Vec<Asset>, DbError> {
        let statement = Statement::new(format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE {} ORDER BY id",
            search_predicate(field)
        ))
        .bind(contains_pattern(term));
        self.fetch_assets(statement).await
    }

    async fn statistics(&self) -> Result<AssetStatistics, DbError> {
        let rows = self
            .db
            .execute(Statement::new(statistics_query()))
            .await?
            .into_rows()?;
        match rows.first() {
            Some(row) => Ok(AssetStatistics::from_row(row)?),
            None => Ok(AssetStatistics::default()),
        }
    }

    async fn append_history(&self, entry: &NewHistoryEntry) -> Result<(), DbError> {
        let statement = Statement::new(
            r#"
            INSERT INTO asset_history (asset_id, action, old_values, new_values)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry.asset_id)
        .bind(entry.action.as_str())
        .bind(entry.old_values.clone())
        .bind(entry.new_values.clone());

        self.db.execute(statement).await?;
        Ok(())
    }

    async fn history(&self, asset_id: i32) -> Result<Vec<AssetHistoryEntry>, DbError> {
        let statement = Statement::new(format!(
            "SELECT {HISTORY_COLUMNS} FROM asset_history WHERE asset_id = $1 ORDER BY changed_at, id"
        ))
        .bind(asset_id);

        let rows = self.db.execute(statement).await?.into_rows()?;
        rows.iter()
            .map(|row| AssetHistoryEntry::try_from(HistoryRow::from_row(row)?))
            .collect()
    }

    async fn ping(&self) -> Result<(), DbError> {
        self.db.health_check().await
    }
}
