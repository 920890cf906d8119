//! 메모리 저장소 통합 테스트.
//!
//! repository trait 객체(`dyn WarehouseStore`)를 통해 다음을 검증합니다:
//! 1. 같은 일봉을 두 번 upsert해도 행 수와 값이 같음
//!    (값이 바뀐 일봉은 (종목, 날짜)당 한 행에 최신 값만 남음)
//! 2. 지표 교체는 이전 행을 모두 지우고 새 행만 남김
//! 3. 하루치 등락 통계 3행이 함께 저장됨
//! 4. 현황 조회가 테이블별 행 수와 최근 날짜를 반환

use chrono::NaiveDate;
use market_analytics::{aggregate_breadth, IndicatorEngine};
use market_core::{
    BreadthSample, CatalogEntry, DailyBar, InstrumentProfile, NewInstrument, Segment,
};
use market_data::storage::tables;
use market_data::{
    IndicatorRepository, InstrumentRepository, MarketRepository, MemoryStore, PriceRepository,
    StatusRepository, WarehouseStore,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

fn bars(closes: &[Decimal]) -> Vec<DailyBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| DailyBar {
            date: date(i as u32 + 3),
            open: close,
            high: close + dec!(10),
            low: close - dec!(10),
            close,
            adjusted_close: close,
            volume: 1_000,
            change: Decimal::ZERO,
            change_rate: Decimal::ZERO,
        })
        .collect()
}

async fn seeded_store() -> (Arc<dyn WarehouseStore>, uuid::Uuid) {
    let store: Arc<dyn WarehouseStore> = Arc::new(MemoryStore::new());
    store
        .insert_if_absent(&NewInstrument {
            entry: CatalogEntry::new("035420", "NAVER", Segment::Kospi),
            profile: InstrumentProfile::default(),
        })
        .await
        .unwrap();
    let id = store.find_by_symbol("035420.KS").await.unwrap().unwrap().id;
    (store, id)
}

#[tokio::test]
async fn test_double_upsert_is_idempotent() {
    let (store, id) = seeded_store().await;
    let batch = bars(&[dec!(180000), dec!(181500), dec!(179000)]);

    store.upsert_bars(id, &batch).await.unwrap();
    let first = store.load_history(id).await.unwrap();
    store.upsert_bars(id, &batch).await.unwrap();
    let second = store.load_history(id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second, batch);
}

#[tokio::test]
async fn test_upsert_with_new_values_keeps_one_row_per_date() {
    let (store, id) = seeded_store().await;
    store
        .upsert_bars(id, &bars(&[dec!(180000), dec!(181500)]))
        .await
        .unwrap();

    let mut revised = bars(&[dec!(180000), dec!(183000)]);
    revised[1].volume = 7_777;
    revised[1].change = dec!(3000);
    revised[1].change_rate = dec!(1.6667);
    store.upsert_bars(id, &revised[1..]).await.unwrap();

    let history = store.load_history(id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history, revised);
    let status = store.table_status().await.unwrap();
    let daily = status.iter().find(|s| s.table == tables::DAILY_BARS).unwrap();
    assert_eq!(daily.rows, 2);
}

#[tokio::test]
async fn test_replace_indicators_drops_previous_rows() {
    let (store, id) = seeded_store().await;
    let engine = IndicatorEngine::new();

    let long = bars(&[dec!(1), dec!(2), dec!(3), dec!(4), dec!(5)]);
    store
        .replace_indicators(id, &engine.compute(&long).unwrap())
        .await
        .unwrap();
    assert_eq!(store.load_indicators(id).await.unwrap().len(), 5);

    let short = bars(&[dec!(1), dec!(2)]);
    store
        .replace_indicators(id, &engine.compute(&short).unwrap())
        .await
        .unwrap();
    let rows = store.load_indicators(id).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].date, date(4));
}

#[tokio::test]
async fn test_breadth_day_and_status() {
    let (store, id) = seeded_store().await;
    store.upsert_bars(id, &bars(&[dec!(100)])).await.unwrap();

    let samples = vec![BreadthSample {
        segment: Segment::Kospi,
        change: dec!(1),
        volume: 5,
        close: dec!(100),
    }];
    let day = aggregate_breadth(date(3), &samples);
    store.upsert_breadth_day(&day.clone().into_rows()).await.unwrap();
    // 재실행해도 (시장, 날짜)당 한 행
    store.upsert_breadth_day(&day.into_rows()).await.unwrap();

    let stored = store.load_breadth(date(3)).await.unwrap();
    assert_eq!(stored.len(), 3);

    let status = store.table_status().await.unwrap();
    let find = |name: &str| status.iter().find(|s| s.table == name).unwrap().clone();

    assert_eq!(find(tables::INSTRUMENTS).rows, 1);
    assert_eq!(find(tables::DAILY_BARS).latest_date, Some(date(3)));
    assert_eq!(find(tables::MARKET_BREADTH_STATS).rows, 3);
    assert_eq!(find(tables::TECHNICAL_INDICATORS).latest_date, None);
}
