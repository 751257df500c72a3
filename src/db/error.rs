//! Database Error Taxonomy
//!
//! Connection Manager와 Asset Repository가 반환하는 에러.
//! HTTP 매핑은 `crate::error::ApiError`에서 담당한다.

use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// 재시도 예산을 모두 소진 (시작 실패)
    #[error("could not connect to database after {attempts} attempt(s): {source}")]
    Connection {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    /// DDL 실패 (시작 실패)
    #[error("schema provisioning failed: {0}")]
    Schema(#[source] sqlx::Error),

    /// CHECK / NOT NULL 등 제약 위반
    #[error("constraint violation: {message}")]
    ConstraintViolation {
        constraint: Option<String>,
        message: String,
    },

    #[error("asset {0} not found")]
    NotFound(i32),

    /// SQL에 도달하기 전에 거부된 입력
    #[error("validation failed: {0}")]
    Validation(String),

    /// 저장된 행을 타입 있는 레코드로 변환하지 못함
    #[error("failed to decode row: {0}")]
    Decode(String),

    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),
}

// SQLSTATE: invalid_text_representation, not_null_violation, check_violation
const CONSTRAINT_SQLSTATES: [&str; 3] = ["22P02", "23502", "23514"];

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let by_kind = matches!(
                db_err.kind(),
                ErrorKind::CheckViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::ForeignKeyViolation
            );
            let by_code = db_err
                .code()
                .map(|code| CONSTRAINT_SQLSTATES.contains(&code.as_ref()))
                .unwrap_or(false);

            if by_kind || by_code {
                return DbError::ConstraintViolation {
                    constraint: db_err.constraint().map(str::to_string),
                    message: db_err.message().to_string(),
                };
            }
        }
        DbError::Query(err)
    }
}
