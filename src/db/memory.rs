//! In-memory `AssetStore`
//!
//! 테스트 전용: PostgreSQL 없이 repository/HTTP 계층을 검증한다. `main`은
//! 항상 `PgAssetStore`를 쓴다. 쓰기 결과와 이력 기록 실패를 강제로 만들 수 있다.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use super::error::DbError;
use super::models::{
    Asset, AssetDraft, AssetHistoryEntry, AssetStatistics, NewHistoryEntry, SearchField,
};
use super::repository::AssetStore;

#[derive(Default)]
struct Inner {
    next_asset_id: i32,
    next_history_id: i32,
    assets: BTreeMap<i32, Asset>,
    history: Vec<AssetHistoryEntry>,
}

#[derive(Default)]
pub struct MemoryAssetStore {
    inner: Mutex<Inner>,
    fail_history_writes: AtomicBool,
    writes_affect_nothing: AtomicBool,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// true면 `append_history`가 항상 실패
    pub fn set_fail_history_writes(&self, fail: bool) {
        self.fail_history_writes.store(fail, Ordering::SeqCst);
    }

    /// true면 update/delete가 아무 행도 바꾸지 않고 0을 반환
    pub fn set_writes_affect_nothing(&self, enabled: bool) {
        self.writes_affect_nothing.store(enabled, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn matches_term(asset: &Asset, needle: &str, field: Option<SearchField>) -> bool {
    let hit = |f: SearchField| {
        f.value_of(asset)
            .map(|value| value.to_lowercase().contains(needle))
            .unwrap_or(false)
    };
    match field {
        Some(f) => hit(f),
        None => SearchField::DEFAULT_SET.into_iter().any(hit),
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn insert(&self, draft: &AssetDraft) -> Result<i32, DbError> {
        let mut inner = self.lock();
        inner.next_asset_id += 1;
        let id = inner.next_asset_id;
        let now = Utc::now();
        inner.assets.insert(
            id,
            Asset {
                id,
                asset_type: draft.asset_type,
                model: draft.model.clone(),
                purchase_date: draft.purchase_date,
                warranty: draft.warranty.clone(),
                status: draft.status,
                location: draft.location,
                reason: draft.reason.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn fetch(&self, id: i32) -> Result<Option<Asset>, DbError> {
        Ok(self.lock().assets.get(&id).cloned())
    }

    async fn update(&self, id: i32, draft: &AssetDraft) -> Result<u64, DbError> {
        if self.writes_affect_nothing.load(Ordering::SeqCst) {
            return Ok(0);
        }
        let mut inner = self.lock();
        let Some(asset) = inner.assets.get_mut(&id) else {
            return Ok(0);
        };
        asset.asset_type = draft.asset_type;
        asset.model = draft.model.clone();
        asset.purchase_date = draft.purchase_date;
        asset.warranty = draft.warranty.clone();
        asset.status = draft.status;
        asset.location = draft.location;
        asset.reason = draft.reason.clone();
        asset.updated_at = Utc::now();
        Ok(1)
    }

    async fn delete(&self, id: i32) -> Result<u64, DbError> {
        if self.writes_affect_nothing.load(Ordering::SeqCst) {
            return Ok(0);
        }
        Ok(self.lock().assets.remove(&id).map_or(0, |_| 1))
    }

    async fn list(&self) -> Result<Vec<Asset>, DbError> {
        Ok(self.lock().assets.values().cloned().collect())
    }

    async fn search(&self, term: &str, field: Option<SearchField>) -> Result<Vec<Asset>, DbError> {
        let needle = term.to_lowercase();
        Ok(self
            .lock()
            .assets
            .values()
            .filter(|asset| matches_term(asset, &needle, field))
            .cloned()
            .collect())
    }

    async fn statistics(&self) -> Result<AssetStatistics, DbError> {
        Ok(AssetStatistics::tally(self.lock().assets.values()))
    }

    async fn append_history(&self, entry: &NewHistoryEntry) -> Result<(), DbError> {
        if self.fail_history_writes.load(Ordering::SeqCst) {
            return Err(DbError::Query(sqlx::Error::PoolClosed));
        }
        let mut inner = self.lock();
        inner.next_history_id += 1;
        let id = inner.next_history_id;
        inner.history.push(AssetHistoryEntry {
            id,
            asset_id: entry.asset_id,
            action: entry.action,
            old_values: entry.old_values.clone(),
            new_values: entry.new_values.clone(),
            changed_at: Utc::now(),
        });
        Ok(())
    }

    async fn history(&self, asset_id: i32) -> Result<Vec<AssetHistoryEntry>, DbError> {
        Ok(self
            .lock()
            .history
            .iter()
            .filter(|h| h.asset_id == asset_id)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }
}
