//! 웨어하우스 저장소.
//!
//! 수집/계산 컴포넌트는 구체 저장소가 아닌 repository trait을 통해서만 데이터에 접근합니다.
//! - [`postgres`]: PostgreSQL 구현 (운영)
//! - [`memory`]: 메모리 구현 (테스트, dry run)

pub mod database;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use market_core::{
    BreadthSample, DailyBar, IndicatorRow, Instrument, MarketBreadthStat, MarketIndexBar,
    NewInstrument,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;

pub use database::{Database, DatabaseConfig};
pub use memory::MemoryStore;

/// 종목 저장소.
#[async_trait]
pub trait InstrumentRepository: Send + Sync {
    /// 활성 종목 전체 (심볼 순).
    async fn list_active(&self) -> Result<Vec<Instrument>>;

    /// 심볼로 종목 조회.
    async fn find_by_symbol(&self, symbol: &str) -> Result<Option<Instrument>>;

    /// 심볼이 없을 때만 활성 종목으로 등록합니다.
    ///
    /// 새로 등록되었으면 `true`, 이미 존재하면 `false`.
    async fn insert_if_absent(&self, instrument: &NewInstrument) -> Result<bool>;

    /// 활성 여부 변경. 종목이 없으면 `false`.
    async fn set_active(&self, symbol: &str, active: bool) -> Result<bool>;
}

/// 종목 일봉 저장소.
#[async_trait]
pub trait PriceRepository: Send + Sync {
    /// (종목, 날짜) 기준 upsert. 한 트랜잭션으로 처리합니다.
    async fn upsert_bars(&self, instrument_id: Uuid, bars: &[DailyBar]) -> Result<usize>;

    /// 종목의 전체 일봉 (날짜 오름차순).
    async fn load_history(&self, instrument_id: Uuid) -> Result<Vec<DailyBar>>;

    /// 일봉이 존재하는 모든 날짜 (오름차순).
    async fn distinct_dates(&self) -> Result<Vec<NaiveDate>>;

    /// 특정 날짜의 일봉 요약과 종목 시장 구분.
    async fn breadth_samples(&self, date: NaiveDate) -> Result<Vec<BreadthSample>>;
}

/// 기술적 지표 저장소.
#[async_trait]
pub trait IndicatorRepository: Send + Sync {
    /// 종목의 지표 행을 모두 삭제하고 새 행으로 교체합니다 (단일 트랜잭션).
    async fn replace_indicators(&self, instrument_id: Uuid, rows: &[IndicatorRow])
        -> Result<usize>;

    /// 종목의 지표 행 (날짜 오름차순).
    async fn load_indicators(&self, instrument_id: Uuid) -> Result<Vec<IndicatorRow>>;
}

/// 시장 지수 및 등락 통계 저장소.
#[async_trait]
pub trait MarketRepository: Send + Sync {
    /// (시장, 날짜) 기준 지수 일봉 upsert.
    async fn upsert_index_bars(&self, bars: &[MarketIndexBar]) -> Result<usize>;

    /// 하루치 KOSPI/KOSDAQ/ALL 등락 통계를 한 트랜잭션으로 upsert.
    async fn upsert_breadth_day(&self, rows: &[MarketBreadthStat; 3]) -> Result<()>;

    /// 특정 날짜의 등락 통계.
    async fn load_breadth(&self, date: NaiveDate) -> Result<Vec<MarketBreadthStat>>;
}

/// 테이블 현황.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStatus {
    pub table: &'static str,
    pub rows: i64,
    /// 가장 최근 날짜 (날짜 컬럼이 없는 테이블은 `None`)
    pub latest_date: Option<NaiveDate>,
}

/// 현황 조회.
#[async_trait]
pub trait StatusRepository: Send + Sync {
    async fn table_status(&self) -> Result<Vec<TableStatus>>;
}

/// 수집기가 사용하는 전체 저장소.
pub trait WarehouseStore:
    InstrumentRepository + PriceRepository + IndicatorRepository + MarketRepository + StatusRepository
{
}

impl<T> WarehouseStore for T where
    T: InstrumentRepository
        + PriceRepository
        + IndicatorRepository
        + MarketRepository
        + StatusRepository
{
}

/// 저장 대상 테이블 이름.
pub mod tables {
    pub const INSTRUMENTS: &str = "instruments";
    pub const DAILY_BARS: &str = "daily_bars";
    pub const TECHNICAL_INDICATORS: &str = "technical_indicators";
    pub const MARKET_INDEX_BARS: &str = "market_index_bars";
    pub const MARKET_BREADTH_STATS: &str = "market_breadth_stats";
}
