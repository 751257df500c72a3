//! Configuration Module
//!
//! 모든 설정은 환경변수에서 읽는다 (`.env`는 main에서 dotenvy로 먼저 로드).
//! 필수 값은 없고, 누락된 값은 로컬 개발용 기본값으로 채운다.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgConnectOptions;

/// 애플리케이션 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// 서버 포트 (기본값: 5000)
    pub port: u16,

    /// 데이터베이스 연결 설정
    pub database: DatabaseConfig,

    /// CORS 허용 origin 목록 (프로덕션 전용, `ALLOWED_ORIGINS` 콤마 구분)
    pub allowed_origins: Vec<String>,

    /// 환경 (development, staging, production)
    pub environment: Environment,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// PostgreSQL 연결 및 재시도 정책
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// 연결 대상
    pub target: DatabaseTarget,

    /// 풀 최대 커넥션 수 (기본값: 5)
    pub max_connections: u32,

    /// 시작 시 연결 시도 횟수 (기본값: 30)
    pub connect_max_attempts: u32,

    /// 연결 재시도 간격 (기본값: 2초)
    pub connect_retry_delay: Duration,
}

/// `DATABASE_URL` 하나 또는 개별 접속 정보
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseTarget {
    Url(String),
    Parts {
        host: String,
        port: u16,
        database: String,
        user: String,
        password: String,
    },
}

impl DatabaseTarget {
    /// sqlx 연결 옵션으로 변환
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        match self {
            DatabaseTarget::Url(url) => url.parse(),
            DatabaseTarget::Parts {
                host,
                port,
                database,
                user,
                password,
            } => Ok(PgConnectOptions::new()
                .host(host)
                .port(*port)
                .database(database)
                .username(user)
                .password(password)),
        }
    }

    /// 로그용 표기 (비밀번호 제외)
    pub fn describe(&self) -> String {
        match self {
            DatabaseTarget::Url(url) => match url.rsplit_once('@') {
                Some((_, host_part)) => format!("postgres://***@{}", host_part),
                None => url.clone(),
            },
            DatabaseTarget::Parts {
                host,
                port,
                database,
                user,
                ..
            } => format!("postgres://{}@{}:{}/{}", user, host, port, database),
        }
    }
}

impl DatabaseConfig {
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
    pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 30;
    pub const DEFAULT_RETRY_DELAY_SECS: u64 = 2;

    /// 환경변수에서 데이터베이스 설정 로드
    ///
    /// `DATABASE_URL`이 있으면 그것을 쓰고, 없으면
    /// `DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER`, `DB_PASSWORD`로 조립한다.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 임의의 조회 함수로 설정 로드 (`from_env`는 프로세스 환경변수를 넘긴다)
    pub fn from_lookup<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &str, default: &str| var(name).unwrap_or_else(|| default.to_string());

        let target = match var("DATABASE_URL") {
            Some(url) if !url.trim().is_empty() => DatabaseTarget::Url(url),
            _ => DatabaseTarget::Parts {
                host: text("DB_HOST", "localhost"),
                port: text("DB_PORT", "5432")
                    .parse()
                    .context("DB_PORT must be a valid port number")?,
                database: text("DB_NAME", "it_asset_db"),
                user: text("DB_USER", "postgres"),
                password: text("DB_PASSWORD", "postgres"),
            },
        };

        let max_connections = parse_value(
            "DB_MAX_CONNECTIONS",
            var("DB_MAX_CONNECTIONS"),
            Self::DEFAULT_MAX_CONNECTIONS,
        )?;
        let connect_max_attempts = parse_value(
            "DB_CONNECT_ATTEMPTS",
            var("DB_CONNECT_ATTEMPTS"),
            Self::DEFAULT_CONNECT_ATTEMPTS,
        )?;
        let retry_secs = parse_value(
            "DB_CONNECT_RETRY_DELAY_SECS",
            var("DB_CONNECT_RETRY_DELAY_SECS"),
            Self::DEFAULT_RETRY_DELAY_SECS,
        )?;

        if connect_max_attempts == 0 {
            anyhow::bail!("DB_CONNECT_ATTEMPTS must be at least 1");
        }

        Ok(Self {
            target,
            max_connections: max_connections.max(1),
            connect_max_attempts,
            connect_retry_delay: Duration::from_secs(retry_secs),
        })
    }
}

impl Config {
    /// 환경변수에서 설정 로드
    ///
    /// # Environment Variables
    ///
    /// - `PORT`: 서버 포트 (기본값: 5000)
    /// - `ENVIRONMENT`: development | staging | production
    /// - `ALLOWED_ORIGINS`: 프로덕션 CORS origin 목록
    /// - `DATABASE_URL` 또는 `DB_HOST`/`DB_PORT`/`DB_NAME`/`DB_USER`/`DB_PASSWORD`
    /// - `DB_MAX_CONNECTIONS`, `DB_CONNECT_ATTEMPTS`, `DB_CONNECT_RETRY_DELAY_SECS`
    pub fn from_env() -> Result<Self> {
        let environment = match env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" => Environment::Production,
            "staging" => Environment::Staging,
            _ => Environment::Development,
        };

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Config {
            port: parse_value("PORT", env::var("PORT").ok(), 5000)?,
            database: DatabaseConfig::from_env()?,
            allowed_origins,
            environment,
        })
    }

    /// 프로덕션 환경인지 확인
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn parse_value<T>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", name)),
        _ => Ok(default),
    }
}
