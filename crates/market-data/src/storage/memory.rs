//! 메모리 기반 저장소.
//!
//! PostgreSQL 구현과 같은 repository trait을 구현합니다.
//! 각 연산은 하나의 잠금 안에서 끝나므로 트랜잭션과 같은 원자성을 가집니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use market_core::{
    BreadthSample, DailyBar, IndicatorRow, Instrument, MarketBreadthStat, MarketIndexBar,
    NewInstrument, Segment,
};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    tables, IndicatorRepository, InstrumentRepository, MarketRepository, PriceRepository,
    StatusRepository, TableStatus,
};
use crate::error::Result;

#[derive(Default)]
struct Tables {
    /// symbol → 종목
    instruments: BTreeMap<String, Instrument>,
    bars: BTreeMap<(Uuid, NaiveDate), DailyBar>,
    indicators: BTreeMap<(Uuid, NaiveDate), IndicatorRow>,
    index_bars: BTreeMap<(Segment, NaiveDate), MarketIndexBar>,
    breadth: BTreeMap<(Segment, NaiveDate), MarketBreadthStat>,
}

/// 메모리 저장소.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 종목 전체 (비활성 포함).
    pub async fn all_instruments(&self) -> Vec<Instrument> {
        self.tables.lock().await.instruments.values().cloned().collect()
    }

    /// 지표 행이 있는 (종목, 날짜) 목록.
    pub async fn indicator_keys(&self) -> BTreeSet<(Uuid, NaiveDate)> {
        self.tables.lock().await.indicators.keys().copied().collect()
    }

    /// 일봉이 있는 (종목, 날짜) 목록.
    pub async fn bar_keys(&self) -> BTreeSet<(Uuid, NaiveDate)> {
        self.tables.lock().await.bars.keys().copied().collect()
    }

    /// 시장 지수 일봉 전체.
    pub async fn index_bars(&self) -> Vec<MarketIndexBar> {
        self.tables.lock().await.index_bars.values().cloned().collect()
    }
}

#[async_trait]
impl InstrumentRepository for MemoryStore {
    async fn list_active(&self) -> Result<Vec<Instrument>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .instruments
            .values()
            .filter(|i| i.is_active)
            .cloned()
            .collect())
    }

    async fn find_by_symbol(&self, symbol: &str) -> Result<Option<Instrument>> {
        Ok(self.tables.lock().await.instruments.get(symbol).cloned())
    }

    async fn insert_if_absent(&self, instrument: &NewInstrument) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        if tables.instruments.contains_key(&instrument.entry.symbol) {
            return Ok(false);
        }
        let stored = Instrument::from_new(Uuid::new_v4(), instrument.clone());
        tables.instruments.insert(stored.symbol.clone(), stored);
        Ok(true)
    }

    async fn set_active(&self, symbol: &str, active: bool) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        match tables.instruments.get_mut(symbol) {
            Some(instrument) => {
                instrument.is_active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl PriceRepository for MemoryStore {
    async fn upsert_bars(&self, instrument_id: Uuid, bars: &[DailyBar]) -> Result<usize> {
        let mut tables = self.tables.lock().await;
        for bar in bars {
            tables.bars.insert((instrument_id, bar.date), bar.clone());
        }
        Ok(bars.len())
    }

    async fn load_history(&self, instrument_id: Uuid) -> Result<Vec<DailyBar>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .bars
            .range((instrument_id, NaiveDate::MIN)..=(instrument_id, NaiveDate::MAX))
            .map(|(_, bar)| bar.clone())
            .collect())
    }

    async fn distinct_dates(&self) -> Result<Vec<NaiveDate>> {
        let tables = self.tables.lock().await;
        let dates: BTreeSet<NaiveDate> = tables.bars.keys().map(|(_, date)| *date).collect();
        Ok(dates.into_iter().collect())
    }

    async fn breadth_samples(&self, date: NaiveDate) -> Result<Vec<BreadthSample>> {
        let tables = self.tables.lock().await;
        let segments: BTreeMap<Uuid, Segment> = tables
            .instruments
            .values()
            .map(|i| (i.id, i.segment))
            .collect();

        Ok(tables
            .bars
            .iter()
            .filter(|((_, bar_date), _)| *bar_date == date)
            .filter_map(|((id, _), bar)| {
                let segment = segments.get(id).copied().filter(|s| s.is_primary())?;
                Some(BreadthSample {
                    segment,
                    change: bar.change,
                    volume: bar.volume,
                    close: bar.close,
                })
            })
            .collect())
    }
}

#[async_trait]
impl IndicatorRepository for MemoryStore {
    async fn replace_indicators(
        &self,
        instrument_id: Uuid,
        rows: &[IndicatorRow],
    ) -> Result<usize> {
        let mut tables = self.tables.lock().await;
        tables.indicators.retain(|(id, _), _| *id != instrument_id);
        for row in rows {
            tables.indicators.insert((instrument_id, row.date), row.clone());
        }
        Ok(rows.len())
    }

    async fn load_indicators(&self, instrument_id: Uuid) -> Result<Vec<IndicatorRow>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .indicators
            .range((instrument_id, NaiveDate::MIN)..=(instrument_id, NaiveDate::MAX))
            .map(|(_, row)| row.clone())
            .collect())
    }
}

#[async_trait]
impl MarketRepository for MemoryStore {
    async fn upsert_index_bars(&self, bars: &[MarketIndexBar]) -> Result<usize> {
        let mut tables = self.tables.lock().await;
        for bar in bars {
            tables.index_bars.insert((bar.segment, bar.date), bar.clone());
        }
        Ok(bars.len())
    }

    async fn upsert_breadth_day(&self, rows: &[MarketBreadthStat; 3]) -> Result<()> {
        let mut tables = self.tables.lock().await;
        for row in rows {
            tables.breadth.insert((row.segment, row.date), row.clone());
        }
        Ok(())
    }

    async fn load_breadth(&self, date: NaiveDate) -> Result<Vec<MarketBreadthStat>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .breadth
            .values()
            .filter(|stat| stat.date == date)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StatusRepository for MemoryStore {
    async fn table_status(&self) -> Result<Vec<TableStatus>> {
        let state = self.tables.lock().await;

        Ok(vec![
            TableStatus {
                table: tables::INSTRUMENTS,
                rows: state.instruments.len() as i64,
                latest_date: None,
            },
            TableStatus {
                table: tables::DAILY_BARS,
                rows: state.bars.len() as i64,
                latest_date: state.bars.keys().map(|(_, d)| *d).max(),
            },
            TableStatus {
                table: tables::TECHNICAL_INDICATORS,
                rows: state.indicators.len() as i64,
                latest_date: state.indicators.keys().map(|(_, d)| *d).max(),
            },
            TableStatus {
                table: tables::MARKET_INDEX_BARS,
                rows: state.index_bars.len() as i64,
                latest_date: state.index_bars.keys().map(|(_, d)| *d).max(),
            },
            TableStatus {
                table: tables::MARKET_BREADTH_STATS,
                rows: state.breadth.len() as i64,
                latest_date: state.breadth.keys().map(|(_, d)| *d).max(),
            },
        ])
    }
}
