//! 에러 타입 정의.

use market_analytics::IndicatorError;
use market_data::{DataError, ProviderError};
use thiserror::Error;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 저장소 에러
    #[error("Storage error: {0}")]
    Data(#[from] DataError),

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 데이터 소스 에러 (KRX, Yahoo 등)
    #[error("Data source error: {0}")]
    DataSource(#[from] ProviderError),

    /// 지표 계산 에러
    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    /// 요청한 종목이 없음
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),
}

impl From<std::env::VarError> for CollectorError {
    fn from(err: std::env::VarError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
