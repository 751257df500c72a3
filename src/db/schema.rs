//! Schema Manager
//!
//! `ensure_schema`는 매 시작 시 호출해도 안전하다. 없으면 만들고, 이미 있는
//! 구조는 삭제하거나 변경하지 않는다. 모든 DDL은 하나의 트랜잭션에서 실행되며
//! 실패는 `DbError::Schema`로 반환된다 (재시도 없음).

use super::models::{sql_value_list, AssetLocation, AssetStatus, AssetType, HistoryAction};
use super::{Database, DbError};

pub const ASSETS_TABLE: &str = "assets";
pub const HISTORY_TABLE: &str = "asset_history";
pub const UPDATED_AT_TRIGGER: &str = "update_assets_updated_at";

fn check_list<T: Copy + Into<&'static str>>(values: &[T]) -> String {
    let names: Vec<&'static str> = values.iter().map(|v| -> &'static str { (*v).into() }).collect();
    sql_value_list(&names)
}

/// `assets` 테이블 DDL
pub fn create_assets_table() -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS assets (
            id SERIAL PRIMARY KEY,
            asset_type VARCHAR(10) NOT NULL
                CONSTRAINT assets_asset_type_check CHECK (asset_type IN ({types})),
            model VARCHAR(255) NOT NULL
                CONSTRAINT assets_model_check CHECK (btrim(model) <> ''),
            purchase_date DATE,
            warranty VARCHAR(255),
            status VARCHAR(20) NOT NULL
                CONSTRAINT assets_status_check CHECK (status IN ({statuses})),
            location VARCHAR(100) NOT NULL
                CONSTRAINT assets_location_check CHECK (location IN ({locations})),
            reason TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        types = check_list(AssetType::ALL),
        statuses = check_list(AssetStatus::ALL),
        locations = check_list(AssetLocation::ALL),
    )
}

/// `asset_history` 테이블 DDL
///
/// `asset_id`는 약한 참조(외래키 없음): 자산이 삭제된 뒤에도 DELETE 이력이 남는다.
/// `REFERENCES assets(id) ON DELETE CASCADE`를 의도적으로 쓰지 않는다 (감사 기록 보존).
pub fn create_history_table() -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS asset_history (
            id SERIAL PRIMARY KEY,
            asset_id INTEGER NOT NULL,
            action VARCHAR(20) NOT NULL
                CONSTRAINT asset_history_action_check CHECK (action IN ({actions})),
            old_values JSONB,
            new_values JSONB,
            changed_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        actions = check_list(HistoryAction::ALL),
    )
}

const CREATE_HISTORY_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_asset_history_asset_id ON asset_history (asset_id)";

const CREATE_TRIGGER_FUNCTION: &str = r#"
    CREATE OR REPLACE FUNCTION update_updated_at_column()
    RETURNS TRIGGER AS $$
    BEGIN
        NEW.updated_at = CURRENT_TIMESTAMP;
        RETURN NEW;
    END;
    $$ LANGUAGE plpgsql
"#;

// CREATE TRIGGER에는 IF NOT EXISTS가 없으므로 pg_trigger로 확인
const CREATE_TRIGGER: &str = r#"
    DO $$
    BEGIN
        IF NOT EXISTS (
            SELECT 1 FROM pg_trigger
            WHERE tgname = 'update_assets_updated_at'
              AND tgrelid = 'assets'::regclass
        ) THEN
            CREATE TRIGGER update_assets_updated_at
                BEFORE UPDATE ON assets
                FOR EACH ROW
                EXECUTE FUNCTION update_updated_at_column();
        END IF;
    END
    $$
"#;

/// 실행 순서대로의 DDL 목록
pub fn statements() -> Vec<String> {
    vec![
        create_assets_table(),
        create_history_table(),
        CREATE_HISTORY_INDEX.to_string(),
        CREATE_TRIGGER_FUNCTION.to_string(),
        CREATE_TRIGGER.to_string(),
    ]
}

/// 테이블/트리거 생성 (idempotent)
pub async fn ensure_schema(db: &Database) -> Result<(), DbError> {
    let mut tx = db.pool().begin().await.map_err(DbError::Schema)?;

    for ddl in statements() {
        if let Err(err) = sqlx::query(&ddl).execute(&mut *tx).await {
            tracing::error!("Error creating schema: {}", err);
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!("Rollback failed: {}", rollback_err);
            }
            return Err(DbError::Schema(err));
        }
    }

    tx.commit().await.map_err(DbError::Schema)?;
    tracing::info!(
        "Schema ready ({}, {}, trigger {})",
        ASSETS_TABLE,
        HISTORY_TABLE,
        UPDATED_AT_TRIGGER
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assets_table_checks_every_enum_value() {
        let ddl = create_assets_table();
        assert!(ddl.contains("CREATE TABLE IF NOT EXISTS assets"));
        assert!(ddl.contains("'HARDWARE', 'SOFTWARE', 'NETWORK', 'STORAGE'"));
        assert!(ddl.contains("'IN_STOCK', 'WAITING', 'OPERATING', 'IDLE', 'DISPOSED'"));
        assert!(ddl.contains("'HQ_SERVER_ROOM', 'PERSONAL_ISSUE', 'PROJECT_SITE', 'OTHER'"));
    }

    #[test]
    fn test_ddl_never_drops_or_alters() {
        for ddl in statements() {
            let upper = ddl.to_uppercase();
            assert!(!upper.contains("DROP "), "unexpected DROP in {}", ddl);
            assert!(!upper.contains("ALTER "), "unexpected ALTER in {}", ddl);
        }
    }

    #[test]
    fn test_trigger_creation_is_guarded() {
        assert!(CREATE_TRIGGER.contains("IF NOT EXISTS"));
        assert!(CREATE_TRIGGER.contains(UPDATED_AT_TRIGGER));
        assert!(create_history_table().contains("'CREATE', 'UPDATE', 'DELETE'"));
    }
}
