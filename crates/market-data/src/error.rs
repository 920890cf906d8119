//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 저장소 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 레코드를 찾을 수 없음
    #[error("Record not found: {0}")]
    NotFound(String),

    /// 중복 레코드
    #[error("Duplicate record: {0}")]
    DuplicateError(String),

    /// 잘못된 데이터 형식
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// 마이그레이션 오류
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// 연결 풀 소진
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DataError::NotFound("Row not found".to_string()),
            sqlx::Error::PoolTimedOut => DataError::PoolExhausted,
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().unwrap_or_default();
                if code == "23505" {
                    // PostgreSQL 고유 제약 조건 위반
                    DataError::DuplicateError(db_err.message().to_string())
                } else {
                    DataError::QueryError(db_err.message().to_string())
                }
            }
            _ => DataError::QueryError(err.to_string()),
        }
    }
}

impl From<market_core::CoreError> for DataError {
    fn from(err: market_core::CoreError) -> Self {
        DataError::InvalidData(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

/// 외부 데이터 Provider 오류.
///
/// 수집 흐름에서는 모두 "데이터 없음"으로 취급되며 경고 로그만 남깁니다.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP 요청 실패
    #[error("Request failed: {0}")]
    RequestError(String),

    /// 응답 파싱 실패
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Provider 초기화 실패
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// 응답 대기 시간 초과
    #[error("Provider timeout after {0}s")]
    Timeout(u64),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::ParseError(err.to_string())
        } else {
            ProviderError::RequestError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::ParseError(err.to_string())
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
