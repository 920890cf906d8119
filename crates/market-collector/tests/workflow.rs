//! 수집 워크플로우 통합 테스트.
//!
//! 메모리 저장소와 고정 응답 Provider로 전체 파이프라인을 실행합니다.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use market_collector::modules::{
    backfill, collect_prices, incremental, sample, set_instrument_active, sync_catalog,
};
use market_collector::{CollectorContext, CollectorError, InstrumentOutcome};
use market_core::{
    BreadthSample, DailyBar, IndicatorRow, Instrument, MarketBreadthStat, MarketIndexBar,
    NewInstrument, Segment,
};
use market_data::{
    CatalogListing, CatalogProvider, DataError, IndicatorRepository, InstrumentRepository,
    MarketDataProvider, MarketRepository, MemoryStore, PriceRepository, ProviderError,
    ProviderResult, RawQuote, StatusRepository, TableStatus, WarehouseStore,
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

/// 시장별 고정 목록을 돌려주는 카탈로그. `lag_days`만큼 최근 날짜는 비어 있습니다.
struct FakeCatalog {
    listings: HashMap<Segment, Vec<CatalogListing>>,
    fail: bool,
    lag_days: i64,
}

impl FakeCatalog {
    fn new(kospi: &[(&str, &str)], kosdaq: &[(&str, &str)]) -> Self {
        let to_listings = |items: &[(&str, &str)]| {
            items
                .iter()
                .map(|(code, name)| CatalogListing {
                    code: code.to_string(),
                    name: name.to_string(),
                })
                .collect::<Vec<_>>()
        };

        let mut listings = HashMap::new();
        listings.insert(Segment::Kospi, to_listings(kospi));
        listings.insert(Segment::Kosdaq, to_listings(kosdaq));

        Self {
            listings,
            fail: false,
            lag_days: 0,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(&[], &[])
        }
    }
}

#[async_trait]
impl CatalogProvider for FakeCatalog {
    fn name(&self) -> &str {
        "fake-catalog"
    }

    async fn list_instruments(
        &self,
        as_of: NaiveDate,
        segment: Segment,
    ) -> ProviderResult<Vec<CatalogListing>> {
        if self.fail {
            return Err(ProviderError::Unavailable("catalog down".to_string()));
        }
        if as_of > today() - Duration::days(self.lag_days) {
            return Ok(Vec::new());
        }
        Ok(self.listings.get(&segment).cloned().unwrap_or_default())
    }
}

/// 심볼별로 기준 가격을 정해 매일 일봉을 만들어 주는 Provider.
/// 목록에 없는 심볼은 상장 폐지된 것처럼 빈 응답입니다.
struct FakeMarketData {
    base_prices: HashMap<String, f64>,
}

impl FakeMarketData {
    fn new(symbols: &[(&str, f64)]) -> Self {
        Self {
            base_prices: symbols
                .iter()
                .map(|(s, p)| (s.to_string(), *p))
                .collect(),
        }
    }

    fn series(base: f64, start: NaiveDate, end: NaiveDate) -> Vec<RawQuote> {
        let mut quotes = Vec::new();
        let mut date = start;
        let mut i = 0i64;

        while date <= end {
            // 5일 주기로 오르내리는 종가
            let close = base + ((i % 5) - 2) as f64 * base * 0.01 + i as f64 * 0.1;
            quotes.push(RawQuote {
                date,
                open: Some(close - 0.5),
                high: Some(close + 1.0),
                low: Some(close - 1.0),
                close: Some(close),
                adjusted_close: Some(close),
                volume: Some(10_000 + i * 10),
            });
            date += Duration::days(1);
            i += 1;
        }

        quotes
    }
}

#[async_trait]
impl MarketDataProvider for FakeMarketData {
    fn name(&self) -> &str {
        "fake-market-data"
    }

    async fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<Vec<RawQuote>> {
        Ok(self
            .base_prices
            .get(symbol)
            .map(|base| Self::series(*base, start, end))
            .unwrap_or_default())
    }

    async fn fetch_daily_series(
        &self,
        index_symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<Vec<RawQuote>> {
        let base = match index_symbol {
            "^KS11" => 2_650.0,
            "^KQ11" => 860.0,
            _ => return Ok(Vec::new()),
        };
        Ok(Self::series(base, start, end))
    }
}

fn default_catalog() -> FakeCatalog {
    FakeCatalog::new(
        &[("005930", "삼성전자"), ("000660", "SK하이닉스")],
        &[("247540", "에코프로비엠")],
    )
}

fn default_market_data() -> FakeMarketData {
    FakeMarketData::new(&[
        ("005930.KS", 72_000.0),
        ("000660.KS", 150_000.0),
        ("247540.KQ", 250_000.0),
    ])
}

fn context(
    store: &Arc<MemoryStore>,
    catalog: FakeCatalog,
    market_data: FakeMarketData,
) -> CollectorContext {
    let store: Arc<dyn WarehouseStore> = store.clone();
    CollectorContext::new(store, Arc::new(catalog), Arc::new(market_data)).with_concurrency(4)
}

/// 저장소의 모든 행. 종목은 심볼 순, 일봉/지표는 날짜 순입니다.
#[derive(Debug, PartialEq)]
struct Snapshot {
    instruments: Vec<Instrument>,
    bars: Vec<Vec<DailyBar>>,
    indicators: Vec<Vec<IndicatorRow>>,
    index_bars: Vec<MarketIndexBar>,
    breadth: Vec<Vec<MarketBreadthStat>>,
}

async fn snapshot(store: &MemoryStore) -> Snapshot {
    let mut instruments = store.all_instruments().await;
    instruments.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    let mut bars = Vec::new();
    let mut indicators = Vec::new();
    for instrument in &instruments {
        bars.push(store.load_history(instrument.id).await.unwrap());
        indicators.push(store.load_indicators(instrument.id).await.unwrap());
    }

    let mut breadth = Vec::new();
    for date in store.distinct_dates().await.unwrap() {
        let mut rows = store.load_breadth(date).await.unwrap();
        rows.sort_by_key(|r| r.segment.to_string());
        breadth.push(rows);
    }

    Snapshot {
        instruments,
        bars,
        indicators,
        index_bars: store.index_bars().await,
        breadth,
    }
}

#[tokio::test]
async fn test_backfill_twice_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let ctx = context(&store, default_catalog(), default_market_data());

    let first = backfill(&ctx, 1, today()).await.unwrap();
    let status_after_first = store.table_status().await.unwrap();
    let rows_after_first = snapshot(&store).await;

    let second = backfill(&ctx, 1, today()).await.unwrap();
    let status_after_second = store.table_status().await.unwrap();
    let rows_after_second = snapshot(&store).await;

    assert_eq!(first.catalog.inserted, 3);
    assert_eq!(second.catalog.inserted, 0);
    assert_eq!(second.catalog.existing, 3);
    assert_eq!(first.prices.success, 3);
    assert_eq!(first.prices.total_bars, second.prices.total_bars);
    assert_eq!(status_after_first, status_after_second);

    assert_eq!(rows_after_first.instruments.len(), 3);
    assert!(rows_after_first.bars.iter().all(|b| b.len() == 366));
    assert_eq!(rows_after_first.breadth.len(), 366);
    assert_eq!(rows_after_first, rows_after_second);
}

#[tokio::test]
async fn test_indicator_rows_match_bar_dates() {
    let store = Arc::new(MemoryStore::new());
    let ctx = context(&store, default_catalog(), default_market_data());

    backfill(&ctx, 1, today()).await.unwrap();

    let bar_keys = store.bar_keys().await;
    assert_eq!(bar_keys.len(), 3 * 366);
    assert_eq!(store.indicator_keys().await, bar_keys);
}

#[tokio::test]
async fn test_incremental_recomputes_full_history() {
    let store = Arc::new(MemoryStore::new());
    let ctx = context(&store, default_catalog(), default_market_data());

    sample(&ctx, 30, today() - Duration::days(5)).await.unwrap();
    let report = incremental(&ctx, 5, today()).await.unwrap();

    // 내장 종목 8개 중 3개만 일봉이 있음
    let indicators = report.indicators.expect("incremental recomputes indicators");
    assert_eq!(indicators.total, 8);
    assert_eq!(indicators.success, 3);
    assert_eq!(indicators.empty, 5);
    assert_eq!(indicators.total_bars, store.indicator_keys().await.len());
    assert_eq!(store.indicator_keys().await, store.bar_keys().await);
}

#[tokio::test]
async fn test_all_segment_is_sum_of_primaries() {
    let store = Arc::new(MemoryStore::new());
    let ctx = context(&store, default_catalog(), default_market_data());

    let report = backfill(&ctx, 1, today()).await.unwrap();
    assert_eq!(report.breadth.failed, 0);
    assert_eq!(report.breadth.processed, 366);

    for date in [today(), today() - Duration::days(100)] {
        let rows = store.load_breadth(date).await.unwrap();
        assert_eq!(rows.len(), 3);

        let get = |segment: Segment| rows.iter().find(|r| r.segment == segment).unwrap();
        let (kospi, kosdaq, all) = (get(Segment::Kospi), get(Segment::Kosdaq), get(Segment::All));

        assert_eq!(kospi.total_stocks, 2);
        assert_eq!(kosdaq.total_stocks, 1);
        assert_eq!(all.rising, kospi.rising + kosdaq.rising);
        assert_eq!(all.falling, kospi.falling + kosdaq.falling);
        assert_eq!(all.unchanged, kospi.unchanged + kosdaq.unchanged);
        assert_eq!(all.total_stocks, kospi.total_stocks + kosdaq.total_stocks);
        assert_eq!(all.total_volume, kospi.total_volume + kosdaq.total_volume);
        assert_eq!(all.total_value, kospi.total_value + kosdaq.total_value);
    }
}

#[tokio::test]
async fn test_index_bars_stored_for_both_segments() {
    let store = Arc::new(MemoryStore::new());
    let ctx = context(&store, default_catalog(), default_market_data());

    let report = sample(&ctx, 10, today()).await.unwrap();

    assert_eq!(report.index_bars, 2 * 11);
    let bars = store.index_bars().await;
    assert!(bars.iter().any(|b| b.segment == Segment::Kospi));
    assert!(bars.iter().any(|b| b.segment == Segment::Kosdaq));
    assert!(bars.iter().all(|b| b.segment != Segment::All));
}

#[tokio::test]
async fn test_delisted_symbol_keeps_prior_rows() {
    let store = Arc::new(MemoryStore::new());
    let ctx = context(&store, default_catalog(), default_market_data());
    backfill(&ctx, 1, today()).await.unwrap();

    let samsung = store.find_by_symbol("005930.KS").await.unwrap().unwrap();
    let before = store.load_history(samsung.id).await.unwrap();

    // 삼성전자가 더 이상 데이터를 주지 않는 Provider
    let delisted = FakeMarketData::new(&[("000660.KS", 150_000.0), ("247540.KQ", 250_000.0)]);
    let ctx = context(&store, default_catalog(), delisted);

    let outcome = market_collector::modules::collect_instrument(
        &ctx,
        &samsung,
        today() - Duration::days(2),
        today(),
        false,
    )
    .await;
    assert_eq!(outcome, InstrumentOutcome::NoData);

    let stats = collect_prices(
        &ctx,
        &store.list_active().await.unwrap(),
        today() - Duration::days(2),
        today(),
        false,
    )
    .await;
    assert_eq!(stats.empty, 1);
    assert_eq!(stats.success, 2);

    assert_eq!(store.load_history(samsung.id).await.unwrap(), before);
}

#[tokio::test]
async fn test_catalog_failure_falls_back_to_builtin() {
    let store = Arc::new(MemoryStore::new());
    let ctx = context(&store, FakeCatalog::failing(), default_market_data());

    let stats = sync_catalog(&ctx, today()).await.unwrap();

    assert!(stats.degraded);
    assert_eq!(stats.listed, 8);
    assert_eq!(stats.inserted, 8);
    assert_eq!(store.list_active().await.unwrap().len(), 8);
    assert!(store.find_by_symbol("196170.KQ").await.unwrap().is_some());
}

#[tokio::test]
async fn test_catalog_steps_back_over_holidays() {
    let store = Arc::new(MemoryStore::new());
    let mut catalog = default_catalog();
    catalog.lag_days = 2;
    let ctx = context(&store, catalog, default_market_data());

    let stats = sync_catalog(&ctx, today()).await.unwrap();

    assert!(!stats.degraded);
    assert_eq!(stats.inserted, 3);
}

#[tokio::test]
async fn test_deactivated_instrument_is_skipped() {
    let store = Arc::new(MemoryStore::new());
    let ctx = context(&store, default_catalog(), default_market_data());
    sync_catalog(&ctx, today()).await.unwrap();

    set_instrument_active(&ctx, "000660.KS", false).await.unwrap();
    let active = store.list_active().await.unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|i| i.symbol != "000660.KS"));

    set_instrument_active(&ctx, "000660.KS", true).await.unwrap();
    assert_eq!(store.list_active().await.unwrap().len(), 3);

    let err = set_instrument_active(&ctx, "999999.KS", false)
        .await
        .unwrap_err();
    assert!(matches!(err, CollectorError::UnknownInstrument(_)));
}

/// 특정 심볼의 일봉 저장만 실패하는 저장소. 나머지는 메모리 저장소에 위임합니다.
struct FailingUpsertStore {
    inner: Arc<MemoryStore>,
    failing_symbol: String,
}

#[async_trait]
impl InstrumentRepository for FailingUpsertStore {
    async fn list_active(&self) -> market_data::Result<Vec<Instrument>> {
        self.inner.list_active().await
    }

    async fn find_by_symbol(&self, symbol: &str) -> market_data::Result<Option<Instrument>> {
        self.inner.find_by_symbol(symbol).await
    }

    async fn insert_if_absent(&self, instrument: &NewInstrument) -> market_data::Result<bool> {
        self.inner.insert_if_absent(instrument).await
    }

    async fn set_active(&self, symbol: &str, active: bool) -> market_data::Result<bool> {
        self.inner.set_active(symbol, active).await
    }
}

#[async_trait]
impl PriceRepository for FailingUpsertStore {
    async fn upsert_bars(
        &self,
        instrument_id: Uuid,
        bars: &[DailyBar],
    ) -> market_data::Result<usize> {
        let failing = self
            .inner
            .all_instruments()
            .await
            .into_iter()
            .any(|i| i.id == instrument_id && i.symbol == self.failing_symbol);
        if failing {
            return Err(DataError::QueryError(
                "deadlock detected while upserting daily_bars".to_string(),
            ));
        }
        self.inner.upsert_bars(instrument_id, bars).await
    }

    async fn load_history(&self, instrument_id: Uuid) -> market_data::Result<Vec<DailyBar>> {
        self.inner.load_history(instrument_id).await
    }

    async fn distinct_dates(&self) -> market_data::Result<Vec<NaiveDate>> {
        self.inner.distinct_dates().await
    }

    async fn breadth_samples(&self, date: NaiveDate) -> market_data::Result<Vec<BreadthSample>> {
        self.inner.breadth_samples(date).await
    }
}

#[async_trait]
impl IndicatorRepository for FailingUpsertStore {
    async fn replace_indicators(
        &self,
        instrument_id: Uuid,
        rows: &[IndicatorRow],
    ) -> market_data::Result<usize> {
        self.inner.replace_indicators(instrument_id, rows).await
    }

    async fn load_indicators(&self, instrument_id: Uuid) -> market_data::Result<Vec<IndicatorRow>> {
        self.inner.load_indicators(instrument_id).await
    }
}

#[async_trait]
impl MarketRepository for FailingUpsertStore {
    async fn upsert_index_bars(&self, bars: &[MarketIndexBar]) -> market_data::Result<usize> {
        self.inner.upsert_index_bars(bars).await
    }

    async fn upsert_breadth_day(&self, rows: &[MarketBreadthStat; 3]) -> market_data::Result<()> {
        self.inner.upsert_breadth_day(rows).await
    }

    async fn load_breadth(&self, date: NaiveDate) -> market_data::Result<Vec<MarketBreadthStat>> {
        self.inner.load_breadth(date).await
    }
}

#[async_trait]
impl StatusRepository for FailingUpsertStore {
    async fn table_status(&self) -> market_data::Result<Vec<TableStatus>> {
        self.inner.table_status().await
    }
}

#[tokio::test]
async fn test_storage_failure_is_isolated_to_one_instrument() {
    let inner = Arc::new(MemoryStore::new());
    let store: Arc<dyn WarehouseStore> = Arc::new(FailingUpsertStore {
        inner: inner.clone(),
        failing_symbol: "000660.KS".to_string(),
    });
    let ctx = CollectorContext::new(
        store,
        Arc::new(default_catalog()),
        Arc::new(default_market_data()),
    )
    .with_concurrency(4);

    let report = backfill(&ctx, 1, today()).await.unwrap();

    assert_eq!(report.prices.total, 3);
    assert_eq!(report.prices.errors, 1);
    assert_eq!(report.prices.success, 2);

    let hynix = inner.find_by_symbol("000660.KS").await.unwrap().unwrap();
    assert!(inner.load_history(hynix.id).await.unwrap().is_empty());
    assert!(inner.load_indicators(hynix.id).await.unwrap().is_empty());

    let bar_keys = inner.bar_keys().await;
    assert_eq!(bar_keys.len(), 2 * 366);
    assert_eq!(inner.indicator_keys().await, bar_keys);

    assert_eq!(report.breadth.processed, 366);
    assert_eq!(report.breadth.failed, 0);
    let rows = inner.load_breadth(today()).await.unwrap();
    let kospi = rows.iter().find(|r| r.segment == Segment::Kospi).unwrap();
    assert_eq!(kospi.total_stocks, 1);
}
