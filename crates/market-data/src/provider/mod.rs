//! 외부 데이터 Provider.
//!
//! - [`CatalogProvider`]: 시장별 상장 종목 목록 (KRX 정보데이터시스템)
//! - [`MarketDataProvider`]: 종목/지수 일봉 (Yahoo Finance)
//! - [`ProfileProvider`]: 종목 부가 정보 (Yahoo Finance quoteSummary)

pub mod krx;
pub mod yahoo;

use async_trait::async_trait;
use chrono::NaiveDate;
use market_core::{InstrumentProfile, Segment};
use serde::{Deserialize, Serialize};

use crate::error::ProviderResult;

pub use krx::KrxCatalogProvider;
pub use yahoo::{YahooMarketData, YahooProfileProvider};

/// Provider가 반환한 원시 일봉.
///
/// 필드는 모두 선택적이며, 정규화 단계에서 필수 값 누락 여부를 검사합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub adjusted_close: Option<f64>,
    pub volume: Option<i64>,
}

/// 카탈로그의 종목 한 건 (거래소 코드, 종목명).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogListing {
    pub code: String,
    pub name: String,
}

/// 시장별 상장 종목 목록 Provider.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Provider 이름.
    fn name(&self) -> &str;

    /// 기준일에 상장된 종목 목록 조회.
    async fn list_instruments(
        &self,
        as_of: NaiveDate,
        segment: Segment,
    ) -> ProviderResult<Vec<CatalogListing>>;
}

/// 일봉 데이터 Provider.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Provider 이름.
    fn name(&self) -> &str;

    /// 종목 일봉 조회 (start, end 포함).
    async fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<Vec<RawQuote>>;

    /// 시장 지수 일봉 조회 (start, end 포함).
    async fn fetch_daily_series(
        &self,
        index_symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<Vec<RawQuote>>;
}

/// 종목 부가 정보 Provider.
#[async_trait]
pub trait ProfileProvider: Send + Sync {
    async fn fetch_profile(&self, symbol: &str) -> ProviderResult<InstrumentProfile>;
}
