//! Asset Repository
//!
//! `AssetStore`는 SQL 한 문장 수준의 저장소 인터페이스이고, `AssetRepository`는
//! 그 위에서 입력 검증, not-found 전제조건, 이력 기록을 담당한다.
//!
//! 이력 기록은 best-effort: `record_history`는 자체 `Result`를 반환하고,
//! 변경 연산은 실패를 로그로 남긴 뒤 버린다. 본 연산의 결과는 바뀌지 않는다.

use std::sync::Arc;

use async_trait::async_trait;

use super::error::DbError;
use super::models::{
    Asset, AssetDraft, AssetHistoryEntry, AssetPatch, AssetStatistics, HistoryAction,
    NewHistoryEntry, SearchField,
};

/// 저장소 인터페이스
///
/// PostgreSQL 구현은 `PgAssetStore`, 메모리 구현은 `MemoryAssetStore`.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// 새 id 반환
    async fn insert(&self, draft: &AssetDraft) -> Result<i32, DbError>;
    async fn fetch(&self, id: i32) -> Result<Option<Asset>, DbError>;
    /// 영향받은 행 수 반환
    async fn update(&self, id: i32, draft: &AssetDraft) -> Result<u64, DbError>;
    /// 영향받은 행 수 반환
    async fn delete(&self, id: i32) -> Result<u64, DbError>;
    /// id 오름차순
    async fn list(&self) -> Result<Vec<Asset>, DbError>;
    /// 대소문자 무시 부분 일치, id 오름차순
    async fn search(&self, term: &str, field: Option<SearchField>) -> Result<Vec<Asset>, DbError>;
    async fn statistics(&self) -> Result<AssetStatistics, DbError>;
    async fn append_history(&self, entry: &NewHistoryEntry) -> Result<(), DbError>;
    async fn history(&self, asset_id: i32) -> Result<Vec<AssetHistoryEntry>, DbError>;
    async fn ping(&self) -> Result<(), DbError>;
}

pub struct AssetRepository {
    store: Arc<dyn AssetStore>,
}

impl AssetRepository {
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self { store }
    }

    /// 자산 생성 → 새 id
    pub async fn create(&self, draft: AssetDraft) -> Result<i32, DbError> {
        draft.validate()?;

        let id = self.store.insert(&draft).await.map_err(|e| {
            tracing::error!("Error adding asset: {}", e);
            e
        })?;

        let entry = NewHistoryEntry {
            asset_id: id,
            action: HistoryAction::Create,
            old_values: None,
            new_values: Some(draft.snapshot()),
        };
        discard_history_failure(self.record_history(&entry).await, &entry);

        tracing::info!(asset_id = id, "Asset added");
        Ok(id)
    }

    /// 단건 조회. 없으면 `None`.
    pub async fn read(&self, id: i32) -> Result<Option<Asset>, DbError> {
        self.store.fetch(id).await
    }

    /// 자산 수정
    ///
    /// 자산이 없으면 `DbError::NotFound`. 영향받은 행이 0이면 이력 없이 `false`.
    pub async fn update(&self, id: i32, patch: AssetPatch) -> Result<bool, DbError> {
        if patch.is_empty() {
            return Err(DbError::Validation("no fields to update".to_string()));
        }

        let current = self.store.fetch(id).await?.ok_or(DbError::NotFound(id))?;
        let merged = patch.apply_to(&current);
        merged.validate()?;

        let affected = self.store.update(id, &merged).await.map_err(|e| {
            tracing::error!(asset_id = id, "Error updating asset: {}", e);
            e
        })?;

        if affected == 0 {
            tracing::warn!(asset_id = id, "No rows affected when updating asset");
            return Ok(false);
        }

        let entry = NewHistoryEntry {
            asset_id: id,
            action: HistoryAction::Update,
            old_values: Some(current.to_draft().snapshot()),
            new_values: Some(merged.snapshot()),
        };
        discard_history_failure(self.record_history(&entry).await, &entry);

        tracing::info!(asset_id = id, "Asset updated");
        Ok(true)
    }

    /// 자산 삭제
    ///
    /// 자산이 없거나 영향받은 행이 0이면 `false` (에러 아님).
    pub async fn delete(&self, id: i32) -> Result<bool, DbError> {
        let Some(current) = self.store.fetch(id).await? else {
            tracing::warn!(asset_id = id, "Delete requested for missing asset");
            return Ok(false);
        };

        let affected = self.store.delete(id).await.map_err(|e| {
            tracing::error!(asset_id = id, "Error deleting asset: {}", e);
            e
        })?;

        if affected == 0 {
            tracing::warn!(asset_id = id, "No rows affected when deleting asset");
            return Ok(false);
        }

        let entry = NewHistoryEntry {
            asset_id: id,
            action: HistoryAction::Delete,
            old_values: Some(current.to_draft().snapshot()),
            new_values: None,
        };
        discard_history_failure(self.record_history(&entry).await, &entry);

        tracing::info!(asset_id = id, "Asset deleted");
        Ok(true)
    }

    /// 전체 목록 (id 오름차순)
    pub async fn list(&self) -> Result<Vec<Asset>, DbError> {
        self.store.list().await
    }

    /// 검색 (id 오름차순)
    ///
    /// `field`가 없으면 asset_type, model, status, location, reason 중 하나라도
    /// 일치하는 자산. 빈 검색어는 `DbError::Validation`.
    pub async fn search(
        &self,
        term: &str,
        field: Option<SearchField>,
    ) -> Result<Vec<Asset>, DbError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(DbError::Validation("search term must not be empty".to_string()));
        }
        self.store.search(term, field).await
    }

    pub async fn statistics(&self) -> Result<AssetStatistics, DbError> {
        self.store.statistics().await
    }

    /// 자산 변경 이력 (기록 순)
    pub async fn history(&self, id: i32) -> Result<Vec<AssetHistoryEntry>, DbError> {
        self.store.history(id).await
    }

    /// 이력 한 건 기록. 실패는 호출자가 처리한다.
    pub async fn record_history(&self, entry: &NewHistoryEntry) -> Result<(), DbError> {
        self.store.append_history(entry).await
    }

    pub async fn ping(&self) -> Result<(), DbError> {
        self.store.ping().await
    }
}

/// 이력 기록 실패는 로그만 남기고 버린다
fn discard_history_failure(result: Result<(), DbError>, entry: &NewHistoryEntry) {
    if let Err(err) = result {
        tracing::warn!(
            asset_id = entry.asset_id,
            action = %entry.action,
            "History write failed, primary operation kept: {}",
            err
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryAssetStore;
    use crate::db::models::{AssetLocation, AssetStatus, AssetType};

    fn setup() -> (Arc<MemoryAssetStore>, AssetRepository) {
        let store = Arc::new(MemoryAssetStore::new());
        let repo = AssetRepository::new(store.clone());
        (store, repo)
    }

    fn x1() -> AssetDraft {
        AssetDraft::new(
            AssetType::Hardware,
            "X1",
            AssetStatus::InStock,
            AssetLocation::Other,
        )
    }

    fn status_patch(status: AssetStatus) -> AssetPatch {
        AssetPatch {
            status: Some(status),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_lifecycle_scenario() {
        let (_, repo) = setup();

        let id = repo.create(x1()).await.unwrap();
        assert_eq!(id, 1);
        assert_eq!(repo.read(1).await.unwrap().unwrap().to_draft(), x1());

        assert!(repo.update(1, status_patch(AssetStatus::Operating)).await.unwrap());
        assert_eq!(repo.read(1).await.unwrap().unwrap().status, AssetStatus::Operating);

        assert!(repo.delete(1).await.unwrap());
        assert!(repo.read(1).await.unwrap().is_none());

        let actions: Vec<HistoryAction> = repo
            .history(1)
            .await
            .unwrap()
            .into_iter()
            .map(|h| h.action)
            .collect();
        assert_eq!(
            actions,
            vec![HistoryAction::Create, HistoryAction::Update, HistoryAction::Delete]
        );
    }

    #[tokio::test]
    async fn test_history_snapshots() {
        let (_, repo) = setup();
        let id = repo.create(x1()).await.unwrap();
        repo.update(id, status_patch(AssetStatus::Idle)).await.unwrap();
        repo.delete(id).await.unwrap();

        let history = repo.history(id).await.unwrap();
        assert_eq!(history[0].old_values, None);
        assert_eq!(history[0].new_values.as_ref().unwrap()["status"], "IN_STOCK");
        assert_eq!(history[1].old_values.as_ref().unwrap()["status"], "IN_STOCK");
        assert_eq!(history[1].new_values.as_ref().unwrap()["status"], "IDLE");
        assert_eq!(history[2].old_values.as_ref().unwrap()["status"], "IDLE");
        assert_eq!(history[2].new_values, None);
    }

    #[tokio::test]
    async fn test_second_delete_returns_false() {
        let (_, repo) = setup();
        let id = repo.create(x1()).await.unwrap();

        assert!(repo.delete(id).await.unwrap());
        assert!(!repo.delete(id).await.unwrap());
        // 실패한 삭제는 이력을 남기지 않는다
        assert_eq!(repo.history(id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_asset_is_not_found() {
        let (_, repo) = setup();
        let err = repo
            .update(42, status_patch(AssetStatus::Disposed))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound(42)));
        assert!(repo.history(42).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_with_zero_affected_rows_writes_no_history() {
        let (store, repo) = setup();
        let id = repo.create(x1()).await.unwrap();

        store.set_writes_affect_nothing(true);
        assert!(!repo.update(id, status_patch(AssetStatus::Waiting)).await.unwrap());
        assert!(!repo.delete(id).await.unwrap());
        store.set_writes_affect_nothing(false);

        assert_eq!(repo.history(id).await.unwrap().len(), 1);
        assert_eq!(repo.read(id).await.unwrap().unwrap().status, AssetStatus::InStock);
    }

    #[tokio::test]
    async fn test_history_failure_does_not_abort_mutation() {
        let (store, repo) = setup();
        store.set_fail_history_writes(true);

        let id = repo.create(x1()).await.unwrap();
        assert!(repo.update(id, status_patch(AssetStatus::Operating)).await.unwrap());
        assert_eq!(repo.read(id).await.unwrap().unwrap().status, AssetStatus::Operating);
        assert!(repo.delete(id).await.unwrap());

        assert!(repo.history(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_history_surfaces_its_own_error() {
        let (store, repo) = setup();
        store.set_fail_history_writes(true);

        let entry = NewHistoryEntry {
            asset_id: 1,
            action: HistoryAction::Create,
            old_values: None,
            new_values: None,
        };
        assert!(repo.record_history(&entry).await.is_err());
    }

    #[tokio::test]
    async fn test_validation_happens_before_store() {
        let (_, repo) = setup();
        let mut draft = x1();
        draft.model = "   ".to_string();
        assert!(matches!(repo.create(draft).await, Err(DbError::Validation(_))));
        assert!(repo.list().await.unwrap().is_empty());

        let id = repo.create(x1()).await.unwrap();
        let blank_model = AssetPatch {
            model: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(
            repo.update(id, blank_model).await,
            Err(DbError::Validation(_))
        ));
        assert!(matches!(
            repo.update(id, AssetPatch::default()).await,
            Err(DbError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_reflects_every_field() {
        let (_, repo) = setup();
        let id = repo.create(x1()).await.unwrap();

        let replacement = AssetDraft {
            asset_type: AssetType::Storage,
            model: "Seagate IronWolf 4TB".to_string(),
            purchase_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 20),
            warranty: Some("3 years".to_string()),
            status: AssetStatus::Operating,
            location: AssetLocation::HqServerRoom,
            reason: Some("backup storage".to_string()),
        };
        assert!(repo.update(id, replacement.clone().into()).await.unwrap());
        assert_eq!(repo.read(id).await.unwrap().unwrap().to_draft(), replacement);
    }

    #[tokio::test]
    async fn test_search_rules() {
        let (_, repo) = setup();
        let mut switch = AssetDraft::new(
            AssetType::Network,
            "Cisco Catalyst 2960",
            AssetStatus::Operating,
            AssetLocation::HqServerRoom,
        );
        switch.reason = Some("core switch".to_string());
        repo.create(x1()).await.unwrap();
        repo.create(switch).await.unwrap();

        assert!(matches!(repo.search("  ", None).await, Err(DbError::Validation(_))));

        let hits = repo.search("cisco", Some(SearchField::Model)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 2);

        // reason에만 있는 단어도 전체 검색에 걸린다
        let hits = repo.search("SWITCH", None).await.unwrap();
        assert_eq!(hits.iter().map(|a| a.id).collect::<Vec<_>>(), vec![2]);

        // 필드 미지정 검색 = 필드별 검색의 합집합
        let all = repo.search("o", None).await.unwrap();
        let mut union: Vec<i32> = Vec::new();
        for field in SearchField::DEFAULT_SET {
            for asset in repo.search("o", Some(field)).await.unwrap() {
                if !union.contains(&asset.id) {
                    union.push(asset.id);
                }
            }
        }
        union.sort();
        assert_eq!(all.iter().map(|a| a.id).collect::<Vec<_>>(), union);

        // 검색은 list의 부분집합이고 반복해도 같다
        let listed = repo.list().await.unwrap();
        assert!(all.iter().all(|a| listed.contains(a)));
        assert_eq!(repo.search("o", None).await.unwrap(), all);
    }

    #[tokio::test]
    async fn test_statistics_totals_match_breakdowns() {
        let (_, repo) = setup();
        repo.create(x1()).await.unwrap();
        repo.create(AssetDraft::new(
            AssetType::Software,
            "Visual Studio Code",
            AssetStatus::Operating,
            AssetLocation::PersonalIssue,
        ))
        .await
        .unwrap();
        let id = repo
            .create(AssetDraft::new(
                AssetType::Hardware,
                "HP EliteBook 840",
                AssetStatus::Waiting,
                AssetLocation::PersonalIssue,
            ))
            .await
            .unwrap();
        repo.delete(id).await.unwrap();

        let stats = repo.statistics().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.by_type.hardware, 1);
        assert_eq!(stats.by_type.software, 1);
        assert_eq!(stats.by_status.in_stock, 1);
        assert_eq!(stats.by_status.operating, 1);
        assert!(stats.is_consistent());
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_id() {
        let (_, repo) = setup();
        for _ in 0..3 {
            repo.create(x1()).await.unwrap();
        }
        repo.delete(2).await.unwrap();
        let ids: Vec<i32> = repo.list().await.unwrap().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
