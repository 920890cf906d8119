//! PostgreSQL repository 구현.

use async_trait::async_trait;
use chrono::NaiveDate;
use market_core::{
    BreadthSample, DailyBar, IndicatorRow, Instrument, MarketBreadthStat, MarketIndexBar,
    NewInstrument, Segment,
};
use rust_decimal::Decimal;
use sqlx::FromRow;
use std::str::FromStr;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::database::Database;
use super::{
    tables, IndicatorRepository, InstrumentRepository, MarketRepository, PriceRepository,
    StatusRepository, TableStatus,
};
use crate::error::{DataError, Result};

/// 일괄 삽입 청크 크기.
const BATCH_SIZE: usize = 500;

// =============================================================================
// Instrument
// =============================================================================

/// 종목 레코드.
#[derive(Debug, Clone, FromRow)]
struct InstrumentRecord {
    id: Uuid,
    symbol: String,
    krx_code: String,
    name: String,
    segment: String,
    is_active: bool,
    sector: String,
    industry: String,
    description: String,
}

impl InstrumentRecord {
    fn into_instrument(self) -> Result<Instrument> {
        Ok(Instrument {
            id: self.id,
            symbol: self.symbol,
            krx_code: self.krx_code,
            name: self.name,
            segment: Segment::from_str(&self.segment)?,
            is_active: self.is_active,
            sector: self.sector,
            industry: self.industry,
            description: self.description,
        })
    }
}

const INSTRUMENT_COLUMNS: &str =
    "id, symbol, krx_code, name, segment, is_active, sector, industry, description";

#[async_trait]
impl InstrumentRepository for Database {
    async fn list_active(&self) -> Result<Vec<Instrument>> {
        let records: Vec<InstrumentRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM instruments WHERE is_active = TRUE ORDER BY symbol",
            INSTRUMENT_COLUMNS
        ))
        .fetch_all(self.pool())
        .await?;

        records.into_iter().map(InstrumentRecord::into_instrument).collect()
    }

    async fn find_by_symbol(&self, symbol: &str) -> Result<Option<Instrument>> {
        let record: Option<InstrumentRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM instruments WHERE symbol = $1",
            INSTRUMENT_COLUMNS
        ))
        .bind(symbol)
        .fetch_optional(self.pool())
        .await?;

        record.map(InstrumentRecord::into_instrument).transpose()
    }

    async fn insert_if_absent(&self, instrument: &NewInstrument) -> Result<bool> {
        let entry = &instrument.entry;
        let profile = &instrument.profile;

        let result = sqlx::query(
            r#"
            INSERT INTO instruments
                (id, symbol, krx_code, name, segment, is_active, sector, industry, description)
            VALUES ($1, $2, $3, $4, $5, TRUE, $6, $7, $8)
            ON CONFLICT (symbol) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&entry.symbol)
        .bind(&entry.krx_code)
        .bind(&entry.name)
        .bind(entry.segment.as_str())
        .bind(&profile.sector)
        .bind(&profile.industry)
        .bind(&profile.description)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_active(&self, symbol: &str, active: bool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE instruments SET is_active = $2, updated_at = NOW() WHERE symbol = $1",
        )
        .bind(symbol)
        .bind(active)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Daily bars
// =============================================================================

#[derive(Debug, Clone, FromRow)]
struct DailyBarRecord {
    date: NaiveDate,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    adjusted_close: Decimal,
    volume: i64,
    change: Decimal,
    change_rate: Decimal,
}

impl From<DailyBarRecord> for DailyBar {
    fn from(r: DailyBarRecord) -> Self {
        DailyBar {
            date: r.date,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            adjusted_close: r.adjusted_close,
            volume: r.volume,
            change: r.change,
            change_rate: r.change_rate,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct BreadthSampleRecord {
    segment: String,
    change: Decimal,
    volume: i64,
    close: Decimal,
}

#[async_trait]
impl PriceRepository for Database {
    #[instrument(skip(self, bars), fields(count = bars.len()))]
    async fn upsert_bars(&self, instrument_id: Uuid, bars: &[DailyBar]) -> Result<usize> {
        if bars.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool().begin().await?;
        let mut affected = 0;

        for chunk in bars.chunks(BATCH_SIZE) {
            let ids: Vec<Uuid> = chunk.iter().map(|_| instrument_id).collect();
            let dates: Vec<NaiveDate> = chunk.iter().map(|b| b.date).collect();
            let opens: Vec<Decimal> = chunk.iter().map(|b| b.open).collect();
            let highs: Vec<Decimal> = chunk.iter().map(|b| b.high).collect();
            let lows: Vec<Decimal> = chunk.iter().map(|b| b.low).collect();
            let closes: Vec<Decimal> = chunk.iter().map(|b| b.close).collect();
            let adjusted: Vec<Decimal> = chunk.iter().map(|b| b.adjusted_close).collect();
            let volumes: Vec<i64> = chunk.iter().map(|b| b.volume).collect();
            let changes: Vec<Decimal> = chunk.iter().map(|b| b.change).collect();
            let rates: Vec<Decimal> = chunk.iter().map(|b| b.change_rate).collect();

            let result = sqlx::query(
                r#"
                INSERT INTO daily_bars
                    (instrument_id, date, open, high, low, close, adjusted_close,
                     volume, change, change_rate)
                SELECT * FROM UNNEST(
                    $1::uuid[], $2::date[],
                    $3::numeric[], $4::numeric[], $5::numeric[], $6::numeric[], $7::numeric[],
                    $8::bigint[], $9::numeric[], $10::numeric[]
                )
                ON CONFLICT (instrument_id, date) DO UPDATE SET
                    open = EXCLUDED.open,
                    high = EXCLUDED.high,
                    low = EXCLUDED.low,
                    close = EXCLUDED.close,
                    adjusted_close = EXCLUDED.adjusted_close,
                    volume = EXCLUDED.volume,
                    change = EXCLUDED.change,
                    change_rate = EXCLUDED.change_rate,
                    updated_at = NOW()
                "#,
            )
            .bind(&ids)
            .bind(&dates)
            .bind(&opens)
            .bind(&highs)
            .bind(&lows)
            .bind(&closes)
            .bind(&adjusted)
            .bind(&volumes)
            .bind(&changes)
            .bind(&rates)
            .execute(&mut *tx)
            .await?;

            affected += result.rows_affected() as usize;
        }

        tx.commit().await?;
        debug!(instrument_id = %instrument_id, affected, "일봉 upsert 완료");

        Ok(affected)
    }

    async fn load_history(&self, instrument_id: Uuid) -> Result<Vec<DailyBar>> {
        let records: Vec<DailyBarRecord> = sqlx::query_as(
            r#"
            SELECT date, open, high, low, close, adjusted_close, volume, change, change_rate
            FROM daily_bars
            WHERE instrument_id = $1
            ORDER BY date ASC
            "#,
        )
        .bind(instrument_id)
        .fetch_all(self.pool())
        .await?;

        Ok(records.into_iter().map(DailyBar::from).collect())
    }

    async fn distinct_dates(&self) -> Result<Vec<NaiveDate>> {
        let dates: Vec<(NaiveDate,)> =
            sqlx::query_as("SELECT DISTINCT date FROM daily_bars ORDER BY date ASC")
                .fetch_all(self.pool())
                .await?;

        Ok(dates.into_iter().map(|(d,)| d).collect())
    }

    async fn breadth_samples(&self, date: NaiveDate) -> Result<Vec<BreadthSample>> {
        let records: Vec<BreadthSampleRecord> = sqlx::query_as(
            r#"
            SELECT i.segment, b.change, b.volume, b.close
            FROM daily_bars b
            JOIN instruments i ON i.id = b.instrument_id
            WHERE b.date = $1 AND i.segment IN ('KOSPI', 'KOSDAQ')
            "#,
        )
        .bind(date)
        .fetch_all(self.pool())
        .await?;

        records
            .into_iter()
            .map(|r| {
                Ok::<_, DataError>(BreadthSample {
                    segment: Segment::from_str(&r.segment)?,
                    change: r.change,
                    volume: r.volume,
                    close: r.close,
                })
            })
            .collect()
    }
}

// =============================================================================
// Technical indicators
// =============================================================================

#[derive(Debug, Clone, FromRow)]
struct IndicatorRecord {
    date: NaiveDate,
    ma5: Decimal,
    ma10: Decimal,
    ma20: Decimal,
    ma60: Decimal,
    ma120: Decimal,
    bb_upper: Decimal,
    bb_middle: Decimal,
    bb_lower: Decimal,
    bb_width: Decimal,
    rsi: Decimal,
    macd: Decimal,
    macd_signal: Decimal,
    macd_hist: Decimal,
    volume_ma20: Decimal,
    volume_ratio: Decimal,
    is_doji: bool,
    is_hammer: bool,
    golden_cross: bool,
    death_cross: bool,
    bb_upper_touch: bool,
    bb_lower_touch: bool,
}

impl From<IndicatorRecord> for IndicatorRow {
    fn from(r: IndicatorRecord) -> Self {
        IndicatorRow {
            date: r.date,
            ma5: r.ma5,
            ma10: r.ma10,
            ma20: r.ma20,
            ma60: r.ma60,
            ma120: r.ma120,
            bb_upper: r.bb_upper,
            bb_middle: r.bb_middle,
            bb_lower: r.bb_lower,
            bb_width: r.bb_width,
            rsi: r.rsi,
            macd: r.macd,
            macd_signal: r.macd_signal,
            macd_hist: r.macd_hist,
            volume_ma20: r.volume_ma20,
            volume_ratio: r.volume_ratio,
            is_doji: r.is_doji,
            is_hammer: r.is_hammer,
            golden_cross: r.golden_cross,
            death_cross: r.death_cross,
            bb_upper_touch: r.bb_upper_touch,
            bb_lower_touch: r.bb_lower_touch,
        }
    }
}

fn column<T>(rows: &[IndicatorRow], f: impl Fn(&IndicatorRow) -> T) -> Vec<T> {
    rows.iter().map(f).collect()
}

#[async_trait]
impl IndicatorRepository for Database {
    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn replace_indicators(
        &self,
        instrument_id: Uuid,
        rows: &[IndicatorRow],
    ) -> Result<usize> {
        let mut tx = self.pool().begin().await?;

        sqlx::query("DELETE FROM technical_indicators WHERE instrument_id = $1")
            .bind(instrument_id)
            .execute(&mut *tx)
            .await?;

        let mut inserted = 0;

        for chunk in rows.chunks(BATCH_SIZE) {
            let ids: Vec<Uuid> = chunk.iter().map(|_| instrument_id).collect();

            let result = sqlx::query(
                r#"
                INSERT INTO technical_indicators
                    (instrument_id, date, ma5, ma10, ma20, ma60, ma120,
                     bb_upper, bb_middle, bb_lower, bb_width, rsi,
                     macd, macd_signal, macd_hist, volume_ma20, volume_ratio,
                     is_doji, is_hammer, golden_cross, death_cross,
                     bb_upper_touch, bb_lower_touch)
                SELECT * FROM UNNEST(
                    $1::uuid[], $2::date[],
                    $3::numeric[], $4::numeric[], $5::numeric[], $6::numeric[], $7::numeric[],
                    $8::numeric[], $9::numeric[], $10::numeric[], $11::numeric[], $12::numeric[],
                    $13::numeric[], $14::numeric[], $15::numeric[], $16::numeric[], $17::numeric[],
                    $18::bool[], $19::bool[], $20::bool[], $21::bool[],
                    $22::bool[], $23::bool[]
                )
                "#,
            )
            .bind(&ids)
            .bind(column(chunk, |r| r.date))
            .bind(column(chunk, |r| r.ma5))
            .bind(column(chunk, |r| r.ma10))
            .bind(column(chunk, |r| r.ma20))
            .bind(column(chunk, |r| r.ma60))
            .bind(column(chunk, |r| r.ma120))
            .bind(column(chunk, |r| r.bb_upper))
            .bind(column(chunk, |r| r.bb_middle))
            .bind(column(chunk, |r| r.bb_lower))
            .bind(column(chunk, |r| r.bb_width))
            .bind(column(chunk, |r| r.rsi))
            .bind(column(chunk, |r| r.macd))
            .bind(column(chunk, |r| r.macd_signal))
            .bind(column(chunk, |r| r.macd_hist))
            .bind(column(chunk, |r| r.volume_ma20))
            .bind(column(chunk, |r| r.volume_ratio))
            .bind(column(chunk, |r| r.is_doji))
            .bind(column(chunk, |r| r.is_hammer))
            .bind(column(chunk, |r| r.golden_cross))
            .bind(column(chunk, |r| r.death_cross))
            .bind(column(chunk, |r| r.bb_upper_touch))
            .bind(column(chunk, |r| r.bb_lower_touch))
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected() as usize;
        }

        tx.commit().await?;
        debug!(instrument_id = %instrument_id, inserted, "지표 교체 완료");

        Ok(inserted)
    }

    async fn load_indicators(&self, instrument_id: Uuid) -> Result<Vec<IndicatorRow>> {
        let records: Vec<IndicatorRecord> = sqlx::query_as(
            r#"
            SELECT date, ma5, ma10, ma20, ma60, ma120,
                   bb_upper, bb_middle, bb_lower, bb_width, rsi,
                   macd, macd_signal, macd_hist, volume_ma20, volume_ratio,
                   is_doji, is_hammer, golden_cross, death_cross,
                   bb_upper_touch, bb_lower_touch
            FROM technical_indicators
            WHERE instrument_id = $1
            ORDER BY date ASC
            "#,
        )
        .bind(instrument_id)
        .fetch_all(self.pool())
        .await?;

        Ok(records.into_iter().map(IndicatorRow::from).collect())
    }
}

// =============================================================================
// Market index / breadth
// =============================================================================

#[derive(Debug, Clone, FromRow)]
struct BreadthRecord {
    segment: String,
    date: NaiveDate,
    rising: i32,
    falling: i32,
    unchanged: i32,
    total_stocks: i32,
    total_volume: i64,
    total_value: Decimal,
}

#[async_trait]
impl MarketRepository for Database {
    async fn upsert_index_bars(&self, bars: &[MarketIndexBar]) -> Result<usize> {
        if bars.is_empty() {
            return Ok(0);
        }

        let segments: Vec<&str> = bars.iter().map(|b| b.segment.as_str()).collect();
        let dates: Vec<NaiveDate> = bars.iter().map(|b| b.date).collect();
        let opens: Vec<Decimal> = bars.iter().map(|b| b.open).collect();
        let highs: Vec<Decimal> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<Decimal> = bars.iter().map(|b| b.low).collect();
        let closes: Vec<Decimal> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<i64> = bars.iter().map(|b| b.volume).collect();
        let changes: Vec<Decimal> = bars.iter().map(|b| b.change).collect();
        let rates: Vec<Decimal> = bars.iter().map(|b| b.change_rate).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO market_index_bars
                (segment, date, open, high, low, close, volume, change, change_rate)
            SELECT * FROM UNNEST(
                $1::text[], $2::date[],
                $3::numeric[], $4::numeric[], $5::numeric[], $6::numeric[],
                $7::bigint[], $8::numeric[], $9::numeric[]
            )
            ON CONFLICT (segment, date) DO UPDATE SET
                open = EXCLUDED.open,
                high = EXCLUDED.high,
                low = EXCLUDED.low,
                close = EXCLUDED.close,
                volume = EXCLUDED.volume,
                change = EXCLUDED.change,
                change_rate = EXCLUDED.change_rate,
                updated_at = NOW()
            "#,
        )
        .bind(&segments)
        .bind(&dates)
        .bind(&opens)
        .bind(&highs)
        .bind(&lows)
        .bind(&closes)
        .bind(&volumes)
        .bind(&changes)
        .bind(&rates)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() as usize)
    }

    async fn upsert_breadth_day(&self, rows: &[MarketBreadthStat; 3]) -> Result<()> {
        let mut tx = self.pool().begin().await?;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO market_breadth_stats
                    (segment, date, rising, falling, unchanged, total_stocks,
                     total_volume, total_value)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (segment, date) DO UPDATE SET
                    rising = EXCLUDED.rising,
                    falling = EXCLUDED.falling,
                    unchanged = EXCLUDED.unchanged,
                    total_stocks = EXCLUDED.total_stocks,
                    total_volume = EXCLUDED.total_volume,
                    total_value = EXCLUDED.total_value,
                    updated_at = NOW()
                "#,
            )
            .bind(row.segment.as_str())
            .bind(row.date)
            .bind(row.rising)
            .bind(row.falling)
            .bind(row.unchanged)
            .bind(row.total_stocks)
            .bind(row.total_volume)
            .bind(row.total_value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn load_breadth(&self, date: NaiveDate) -> Result<Vec<MarketBreadthStat>> {
        let records: Vec<BreadthRecord> = sqlx::query_as(
            r#"
            SELECT segment, date, rising, falling, unchanged, total_stocks,
                   total_volume, total_value
            FROM market_breadth_stats
            WHERE date = $1
            ORDER BY segment
            "#,
        )
        .bind(date)
        .fetch_all(self.pool())
        .await?;

        records
            .into_iter()
            .map(|r| {
                Ok::<_, DataError>(MarketBreadthStat {
                    segment: Segment::from_str(&r.segment)?,
                    date: r.date,
                    rising: r.rising,
                    falling: r.falling,
                    unchanged: r.unchanged,
                    total_stocks: r.total_stocks,
                    total_volume: r.total_volume,
                    total_value: r.total_value,
                })
            })
            .collect()
    }
}

// =============================================================================
// Status
// =============================================================================

#[async_trait]
impl StatusRepository for Database {
    async fn table_status(&self) -> Result<Vec<TableStatus>> {
        let (instrument_rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM instruments")
            .fetch_one(self.pool())
            .await?;

        let mut status = vec![TableStatus {
            table: tables::INSTRUMENTS,
            rows: instrument_rows,
            latest_date: None,
        }];

        for table in [
            tables::DAILY_BARS,
            tables::TECHNICAL_INDICATORS,
            tables::MARKET_INDEX_BARS,
            tables::MARKET_BREADTH_STATS,
        ] {
            let (rows, latest_date): (i64, Option<NaiveDate>) =
                sqlx::query_as(&format!("SELECT COUNT(*), MAX(date) FROM {}", table))
                    .fetch_one(self.pool())
                    .await?;

            status.push(TableStatus {
                table,
                rows,
                latest_date,
            });
        }

        Ok(status)
    }
}
