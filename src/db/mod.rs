//! Database Module
//!
//! ```text
//!  AssetRepository ──▶ AssetStore (trait)
//!                          │
//!                          ├── PgAssetStore ──▶ Database::execute ──▶ PostgreSQL
//!                          └── MemoryAssetStore (tests)
//! ```
//!
//! `Database`는 Connection Manager: 시작 시 재시도하며 연결하고, 모든 SQL은
//! `execute` 하나를 통과한다. 읽기는 행 목록, 쓰기는 영향받은 행 수를 반환하며
//! 쓰기는 문장 단위로 커밋/롤백된다.

mod error;
mod memory;
mod models;
mod pg_store;
mod repository;
pub mod schema;

pub use error::DbError;
pub use memory::MemoryAssetStore;
pub use models::*;
pub use pg_store::PgAssetStore;
pub use repository::{AssetRepository, AssetStore};

use std::fmt;
use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};

use crate::config::DatabaseConfig;

/// 문장 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// 조회: 행 목록 반환, 트랜잭션 없음
    Read,
    /// 변경: 트랜잭션 안에서 실행 후 커밋. `returning`이면 행 목록 반환.
    Write { returning: bool },
}

impl StatementKind {
    pub fn classify(sql: &str) -> Self {
        let head = sql
            .trim_start()
            .split(|c: char| c.is_whitespace() || c == '(')
            .next()
            .unwrap_or("")
            .to_ascii_uppercase();

        match head.as_str() {
            "SELECT" | "WITH" | "SHOW" | "VALUES" => StatementKind::Read,
            _ => StatementKind::Write {
                returning: contains_keyword(sql, "RETURNING"),
            },
        }
    }
}

fn contains_keyword(sql: &str, keyword: &str) -> bool {
    sql.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .any(|word| word.eq_ignore_ascii_case(keyword))
}

/// 바인딩 파라미터
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Int(i32),
    Text(String),
    NullableText(Option<String>),
    Date(Option<NaiveDate>),
    Json(Option<serde_json::Value>),
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Param::Int(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(v.to_string())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(v)
    }
}

impl From<Option<String>> for Param {
    fn from(v: Option<String>) -> Self {
        Param::NullableText(v)
    }
}

impl From<Option<NaiveDate>> for Param {
    fn from(v: Option<NaiveDate>) -> Self {
        Param::Date(v)
    }
}

impl From<Option<serde_json::Value>> for Param {
    fn from(v: Option<serde_json::Value>) -> Self {
        Param::Json(v)
    }
}

/// SQL + 순서대로 바인딩할 파라미터
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<Param>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, param: impl Into<Param>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn kind(&self) -> StatementKind {
        StatementKind::classify(&self.sql)
    }

    fn query(&self) -> Query<'_, Postgres, PgArguments> {
        self.params
            .iter()
            .fold(sqlx::query(&self.sql), |q, param| match param {
                Param::Int(v) => q.bind(*v),
                Param::Text(v) => q.bind(v.clone()),
                Param::NullableText(v) => q.bind(v.clone()),
                Param::Date(v) => q.bind(*v),
                Param::Json(v) => q.bind(v.clone()),
            })
    }
}

/// `execute` 결과
pub enum Outcome {
    Rows(Vec<PgRow>),
    Affected(u64),
}

// PgRow는 Debug가 없으므로 행 수만 출력
impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Rows(rows) => write!(f, "Rows({} row(s))", rows.len()),
            Outcome::Affected(n) => write!(f, "Affected({})", n),
        }
    }
}

impl Outcome {
    pub fn into_rows(self) -> Result<Vec<PgRow>, DbError> {
        match self {
            Outcome::Rows(rows) => Ok(rows),
            Outcome::Affected(n) => Err(DbError::Decode(format!(
                "expected rows, statement reported {} affected row(s)",
                n
            ))),
        }
    }

    pub fn affected(&self) -> u64 {
        match self {
            Outcome::Rows(rows) => rows.len() as u64,
            Outcome::Affected(n) => *n,
        }
    }
}

/// 고정 간격 재시도
///
/// `op`를 최대 `max_attempts`번 호출한다. `retryable`이 false를 반환하는
/// 에러는 즉시 실패로 처리한다. 실패 시 (시도 횟수, 마지막 에러)를 반환.
pub async fn retry_with_fixed_delay<T, E, F, Fut>(
    max_attempts: u32,
    delay: Duration,
    retryable: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, (u32, E)>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts && retryable(&err) => {
                tracing::info!(
                    "⏳ Waiting for database... ({}/{}): {}",
                    attempt,
                    max_attempts,
                    err
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err((attempt, err)),
        }
    }
}

/// Connection Manager
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 데이터베이스 연결 (재시도 포함)
    ///
    /// `connect_max_attempts`번까지 `connect_retry_delay` 간격으로 재시도하고,
    /// 모두 실패하면 `DbError::Connection`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        let options = config
            .target
            .connect_options()
            .map_err(|source| DbError::Connection {
                attempts: 0,
                source,
            })?;

        tracing::info!("🔌 Connecting to {}", config.target.describe());

        let pool_options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(3));

        let result = retry_with_fixed_delay(
            config.connect_max_attempts,
            config.connect_retry_delay,
            |err: &sqlx::Error| !matches!(err, sqlx::Error::Configuration(_)),
            |_| pool_options.clone().connect_with(options.clone()),
        )
        .await;

        match result {
            Ok(pool) => Ok(Self { pool }),
            Err((attempts, source)) => {
                tracing::error!(
                    "❌ Database connection failed after {} attempt(s): {}",
                    attempts,
                    source
                );
                Err(DbError::Connection { attempts, source })
            }
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 문장 실행
    ///
    /// 에러 발생 시 현재 문장을 롤백하고 에러를 그대로 반환한다 (재시도 없음).
    pub async fn execute(&self, statement: Statement) -> Result<Outcome, DbError> {
        let kind = statement.kind();
        let result = match kind {
            StatementKind::Read => statement
                .query()
                .fetch_all(&self.pool)
                .await
                .map(Outcome::Rows)
                .map_err(DbError::from),
            StatementKind::Write { returning } => self.execute_write(&statement, returning).await,
        };

        if let Err(err) = &result {
            tracing::error!(sql = %statement.sql().trim(), "Query execution failed: {}", err);
        }
        result
    }

    async fn execute_write(&self, statement: &Statement, returning: bool) -> Result<Outcome, DbError> {
        let mut tx = self.pool.begin().await?;

        let result = if returning {
            statement.query().fetch_all(&mut *tx).await.map(Outcome::Rows)
        } else {
            statement
                .query()
                .execute(&mut *tx)
                .await
                .map(|done| Outcome::Affected(done.rows_affected()))
        };

        match result {
            Ok(outcome) => {
                tx.commit().await?;
                Ok(outcome)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!("Rollback failed: {}", rollback_err);
                }
                Err(err.into())
            }
        }
    }

    /// Health check
    pub async fn health_check(&self) -> Result<(), DbError> {
        self.execute(Statement::new("SELECT 1")).await?;
        Ok(())
    }

    /// PostgreSQL 버전 문자열
    pub async fn server_version(&self) -> Result<String, DbError> {
        let rows = self
            .execute(Statement::new("SHOW server_version"))
            .await?
            .into_rows()?;
        let row = rows
            .first()
            .ok_or_else(|| DbError::Decode("SHOW server_version returned no rows".into()))?;
        Ok(row.try_get::<String, _>(0)?)
    }

    /// 연결 종료 (여러 번 호출해도 안전)
    pub async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
            tracing::info!("Database connection closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
