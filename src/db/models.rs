//! Database Models
//!
//! Typed records for the `assets` and `asset_history` tables.
//! Enum columns are stored as their SCREAMING_SNAKE_CASE names and guarded
//! by CHECK constraints; the same names are used on the wire.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use super::error::DbError;

/// `model`, `warranty` 컬럼 길이 (VARCHAR(255))
pub const MAX_TEXT_LEN: usize = 255;

/// 닫힌 문자열 enum 정의
///
/// 각 variant는 DB 저장값과 직렬화 값이 동일하다. 파싱은 대소문자를 무시하고
/// 추가 별칭(legacy 코드)을 허용한다.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $( $variant:ident => $text:literal $(| $alias:literal)* ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "&'static str")]
        pub enum $name {
            $( $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl FromStr for $name {
            type Err = DbError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim();
                $(
                    if needle.eq_ignore_ascii_case($text)
                        $( || needle.eq_ignore_ascii_case($alias) )*
                    {
                        return Ok($name::$variant);
                    }
                )+
                Err(DbError::Validation(format!(
                    "invalid {} '{}' (expected one of: {})",
                    $label,
                    s,
                    [$( $text ),+].join(", ")
                )))
            }
        }

        impl TryFrom<String> for $name {
            type Error = DbError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for &'static str {
            fn from(value: $name) -> Self {
                value.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    /// 자산 유형
    AssetType, "asset_type" {
        Hardware => "HARDWARE" | "HW",
        Software => "SOFTWARE" | "SW",
        Network => "NETWORK" | "NW",
        Storage => "STORAGE",
    }
}

string_enum! {
    /// 자산 라이프사이클 상태
    AssetStatus, "status" {
        InStock => "IN_STOCK",
        Waiting => "WAITING",
        Operating => "OPERATING",
        Idle => "IDLE",
        Disposed => "DISPOSED",
    }
}

string_enum! {
    /// 자산 위치
    AssetLocation, "location" {
        HqServerRoom => "HQ_SERVER_ROOM",
        PersonalIssue => "PERSONAL_ISSUE",
        ProjectSite => "PROJECT_SITE",
        Other => "OTHER",
    }
}

string_enum! {
    /// 이력 액션
    HistoryAction, "action" {
        Create => "CREATE",
        Update => "UPDATE",
        Delete => "DELETE",
    }
}

/// SQL `IN (...)` 목록 (CHECK 제약 생성용)
pub(crate) fn sql_value_list(values: &[&str]) -> String {
    values
        .iter()
        .map(|v| format!("'{}'", v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// 저장된 자산
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    pub id: i32,
    pub asset_type: AssetType,
    pub model: String,
    pub purchase_date: Option<NaiveDate>,
    pub warranty: Option<String>,
    pub status: AssetStatus,
    pub location: AssetLocation,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Asset {
    /// id/타임스탬프를 제외한 필드 스냅샷
    pub fn to_draft(&self) -> AssetDraft {
        AssetDraft {
            asset_type: self.asset_type,
            model: self.model.clone(),
            purchase_date: self.purchase_date,
            warranty: self.warranty.clone(),
            status: self.status,
            location: self.location,
            reason: self.reason.clone(),
        }
    }
}

/// `assets` 행 (enum 컬럼은 아직 문자열)
#[derive(Debug, Clone, FromRow)]
pub struct AssetRow {
    pub id: i32,
    pub asset_type: String,
    pub model: String,
    pub purchase_date: Option<NaiveDate>,
    pub warranty: Option<String>,
    pub status: String,
    pub location: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AssetRow> for Asset {
    type Error = DbError;

    fn try_from(row: AssetRow) -> Result<Self, Self::Error> {
        let decode = |e: DbError| DbError::Decode(format!("asset {}: {}", row.id, e));
        Ok(Asset {
            id: row.id,
            asset_type: row.asset_type.parse().map_err(decode)?,
            status: row.status.parse().map_err(decode)?,
            location: row.location.parse().map_err(decode)?,
            model: row.model,
            purchase_date: row.purchase_date,
            warranty: row.warranty,
            reason: row.reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// 생성 입력 (그리고 이력 스냅샷 형식)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDraft {
    pub asset_type: AssetType,
    pub model: String,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub warranty: Option<String>,
    pub status: AssetStatus,
    pub location: AssetLocation,
    #[serde(default)]
    pub reason: Option<String>,
}

impl AssetDraft {
    pub fn new(
        asset_type: AssetType,
        model: impl Into<String>,
        status: AssetStatus,
        location: AssetLocation,
    ) -> Self {
        Self {
            asset_type,
            model: model.into(),
            purchase_date: None,
            warranty: None,
            status,
            location,
            reason: None,
        }
    }

    /// SQL 이전에 걸러낼 수 있는 입력 오류
    pub fn validate(&self) -> Result<(), DbError> {
        if self.model.trim().is_empty() {
            return Err(DbError::Validation("model must not be empty".to_string()));
        }
        if self.model.chars().count() > MAX_TEXT_LEN {
            return Err(DbError::Validation(format!(
                "model must be at most {} characters",
                MAX_TEXT_LEN
            )));
        }
        if let Some(warranty) = &self.warranty {
            if warranty.chars().count() > MAX_TEXT_LEN {
                return Err(DbError::Validation(format!(
                    "warranty must be at most {} characters",
                    MAX_TEXT_LEN
                )));
            }
        }
        Ok(())
    }

    /// 이력 테이블에 저장할 JSON 스냅샷
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// 수정 입력
///
/// 키가 없으면 기존 값 유지, nullable 필드에 `null`이면 값 삭제.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AssetPatch {
    #[serde(default)]
    pub asset_type: Option<AssetType>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub purchase_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub warranty: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<AssetStatus>,
    #[serde(default)]
    pub location: Option<AssetLocation>,
    #[serde(default, deserialize_with = "double_option")]
    pub reason: Option<Option<String>>,
}

impl AssetPatch {
    pub fn is_empty(&self) -> bool {
        *self == AssetPatch::default()
    }

    /// 현재 레코드에 patch를 덮어쓴 결과
    pub fn apply_to(&self, current: &Asset) -> AssetDraft {
        AssetDraft {
            asset_type: self.asset_type.unwrap_or(current.asset_type),
            model: self.model.clone().unwrap_or_else(|| current.model.clone()),
            purchase_date: self.purchase_date.unwrap_or(current.purchase_date),
            warranty: self
                .warranty
                .clone()
                .unwrap_or_else(|| current.warranty.clone()),
            status: self.status.unwrap_or(current.status),
            location: self.location.unwrap_or(current.location),
            reason: self.reason.clone().unwrap_or_else(|| current.reason.clone()),
        }
    }
}

impl From<AssetDraft> for AssetPatch {
    /// 전체 필드 교체
    fn from(draft: AssetDraft) -> Self {
        AssetPatch {
            asset_type: Some(draft.asset_type),
            model: Some(draft.model),
            purchase_date: Some(draft.purchase_date),
            warranty: Some(draft.warranty),
            status: Some(draft.status),
            location: Some(draft.location),
            reason: Some(draft.reason),
        }
    }
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// 자산 변경 이력
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetHistoryEntry {
    pub id: i32,
    pub asset_id: i32,
    pub action: HistoryAction,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct HistoryRow {
    pub id: i32,
    pub asset_id: i32,
    pub action: String,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub changed_at: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for AssetHistoryEntry {
    type Error = DbError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        let action = row
            .action
            .parse()
            .map_err(|e| DbError::Decode(format!("history {}: {}", row.id, e)))?;
        Ok(AssetHistoryEntry {
            id: row.id,
            asset_id: row.asset_id,
            action,
            old_values: row.old_values,
            new_values: row.new_values,
            changed_at: row.changed_at,
        })
    }
}

/// 추가할 이력 한 건
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryEntry {
    pub asset_id: i32,
    pub action: HistoryAction,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
}

/// 상태별 개수
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow)]
pub struct StatusCounts {
    pub in_stock: i64,
    pub waiting: i64,
    pub operating: i64,
    pub idle: i64,
    pub disposed: i64,
}

impl StatusCounts {
    pub fn sum(&self) -> i64 {
        self.in_stock + self.waiting + self.operating + self.idle + self.disposed
    }

    pub fn increment(&mut self, status: AssetStatus) {
        match status {
            AssetStatus::InStock => self.in_stock += 1,
            AssetStatus::Waiting => self.waiting += 1,
            AssetStatus::Operating => self.operating += 1,
            AssetStatus::Idle => self.idle += 1,
            AssetStatus::Disposed => self.disposed += 1,
        }
    }
}

/// 유형별 개수
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow)]
pub struct TypeCounts {
    pub hardware: i64,
    pub software: i64,
    pub network: i64,
    pub storage: i64,
}

impl TypeCounts {
    pub fn sum(&self) -> i64 {
        self.hardware + self.software + self.network + self.storage
    }

    pub fn increment(&mut self, asset_type: AssetType) {
        match asset_type {
            AssetType::Hardware => self.hardware += 1,
            AssetType::Software => self.software += 1,
            AssetType::Network => self.network += 1,
            AssetType::Storage => self.storage += 1,
        }
    }
}

/// 전체/상태별/유형별 집계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow)]
pub struct AssetStatistics {
    pub total: i64,
    #[sqlx(flatten)]
    pub by_status: StatusCounts,
    #[sqlx(flatten)]
    pub by_type: TypeCounts,
}

impl AssetStatistics {
    /// 메모리 상의 자산 목록으로 집계
    pub fn tally<'a>(assets: impl IntoIterator<Item = &'a Asset>) -> Self {
        let mut stats = AssetStatistics::default();
        for asset in assets {
            stats.total += 1;
            stats.by_status.increment(asset.status);
            stats.by_type.increment(asset.asset_type);
        }
        stats
    }

    /// total == 상태별 합 == 유형별 합
    pub fn is_consistent(&self) -> bool {
        self.total == self.by_status.sum() && self.total == self.by_type.sum()
    }
}

/// 단일 컬럼 검색 대상
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    AssetType,
    Model,
    Status,
    Location,
    Reason,
    Warranty,
}

impl SearchField {
    /// 필드 미지정 검색 시 OR로 묶는 컬럼
    pub const DEFAULT_SET: [SearchField; 5] = [
        SearchField::AssetType,
        SearchField::Model,
        SearchField::Status,
        SearchField::Location,
        SearchField::Reason,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            SearchField::AssetType => "asset_type",
            SearchField::Model => "model",
            SearchField::Status => "status",
            SearchField::Location => "location",
            SearchField::Reason => "reason",
            SearchField::Warranty => "warranty",
        }
    }

    /// 해당 컬럼 값 (없으면 None)
    pub fn value_of<'a>(&self, asset: &'a Asset) -> Option<&'a str> {
        match self {
            SearchField::AssetType => Some(asset.asset_type.as_str()),
            SearchField::Model => Some(asset.model.as_str()),
            SearchField::Status => Some(asset.status.as_str()),
            SearchField::Location => Some(asset.location.as_str()),
            SearchField::Reason => asset.reason.as_deref(),
            SearchField::Warranty => asset.warranty.as_deref(),
        }
    }

    /// 쿼리 파라미터 해석. `all`(또는 빈 값)은 필드 미지정.
    pub fn parse_optional(raw: Option<&str>) -> Result<Option<SearchField>, DbError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
            Some(s) => s.parse().map(Some),
        }
    }
}

impl FromStr for SearchField {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "type" | "asset_type" => Ok(SearchField::AssetType),
            "model" => Ok(SearchField::Model),
            "status" => Ok(SearchField::Status),
            "location" => Ok(SearchField::Location),
            "reason" => Ok(SearchField::Reason),
            "warranty" => Ok(SearchField::Warranty),
            other => Err(DbError::Validation(format!(
                "unknown search field '{}'",
                other
            ))),
        }
    }
}
