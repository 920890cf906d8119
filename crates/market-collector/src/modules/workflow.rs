//! 수집 워크플로우.
//!
//! - `backfill`: 카탈로그 동기화 → 종목별 {수집, 저장, 지표} → 지수 → 등락 통계
//! - `incremental`: 카탈로그 동기화 → 종목별 {수집, 저장} → 지수 → 전체 지표 → 등락 통계
//! - `sample`: 내장 종목만 대상으로 하는 backfill

use chrono::{Duration, NaiveDate, Utc};
use market_data::InstrumentRepository;
use std::time::Instant;
use tracing::{info, warn};

use crate::context::CollectorContext;
use crate::modules::breadth_sync::recompute_breadth;
use crate::modules::catalog_sync::{builtin_entries, seed_builtin, sync_catalog};
use crate::modules::index_collect::collect_index_bars;
use crate::modules::indicator_sync::recompute_for;
use crate::modules::price_collect::collect_prices;
use crate::stats::{BreadthSummary, CatalogSyncStats, CollectionStats};
use crate::Result;

/// 워크플로우 실행 결과.
#[derive(Debug, Clone, Default)]
pub struct WorkflowReport {
    /// 수집 기간 시작일
    pub start: Option<NaiveDate>,
    /// 수집 기간 종료일
    pub end: Option<NaiveDate>,
    pub catalog: CatalogSyncStats,
    pub prices: CollectionStats,
    /// 별도로 수행한 전체 지표 재계산 (incremental 전용)
    pub indicators: Option<CollectionStats>,
    /// 저장한 지수 일봉 수
    pub index_bars: usize,
    pub breadth: BreadthSummary,
}

impl WorkflowReport {
    fn for_range(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            ..Default::default()
        }
    }

    pub fn log_summary(&self, workflow: &str, elapsed: std::time::Duration) {
        info!(
            workflow = workflow,
            start_date = ?self.start,
            end_date = ?self.end,
            new_instruments = self.catalog.inserted,
            catalog_degraded = self.catalog.degraded,
            instruments = self.prices.total,
            stored = self.prices.success,
            no_data = self.prices.empty,
            failed = self.prices.errors,
            bars = self.prices.total_bars,
            index_bars = self.index_bars,
            breadth_days = self.breadth.processed,
            breadth_failed = self.breadth.failed,
            elapsed = format!("{:.1}s", elapsed.as_secs_f64()),
            "워크플로우 완료"
        );
    }
}

/// 서울 기준 오늘 날짜.
pub fn today_in_seoul() -> NaiveDate {
    Utc::now().with_timezone(&chrono_tz::Asia::Seoul).date_naive()
}

/// 최초 적재: 최근 `years`년의 일봉을 모든 활성 종목에 대해 수집합니다.
pub async fn backfill(ctx: &CollectorContext, years: u32, today: NaiveDate) -> Result<WorkflowReport> {
    let started = Instant::now();
    let start = today - Duration::days(i64::from(years) * 365);
    let mut report = WorkflowReport::for_range(start, today);

    info!(years = years, start_date = %start, end_date = %today, "초기 적재 시작");

    report.catalog = sync_catalog(ctx, today).await?;

    let instruments = ctx.store.list_active().await?;
    report.prices = collect_prices(ctx, &instruments, start, today, true).await;

    finish(ctx, &mut report, start, today).await?;
    report.log_summary("backfill", started.elapsed());
    Ok(report)
}

/// 일일 업데이트: 최근 `days`일의 일봉을 수집한 뒤 지표와 등락 통계를 다시 계산합니다.
pub async fn incremental(
    ctx: &CollectorContext,
    days: u32,
    today: NaiveDate,
) -> Result<WorkflowReport> {
    let started = Instant::now();
    let start = today - Duration::days(i64::from(days));
    let mut report = WorkflowReport::for_range(start, today);

    info!(days = days, start_date = %start, end_date = %today, "일일 업데이트 시작");

    report.catalog = sync_catalog(ctx, today).await?;

    let instruments = ctx.store.list_active().await?;
    report.prices = collect_prices(ctx, &instruments, start, today, false).await;
    collect_index(ctx, &mut report, start, today).await;

    // 수집이 모두 끝난 뒤 전체 이력으로 지표를 교체합니다.
    report.indicators = Some(recompute_for(ctx, &instruments).await);
    report.breadth = recompute_breadth(ctx).await?;

    report.log_summary("incremental", started.elapsed());
    Ok(report)
}

/// 샘플 적재: 내장 종목만 등록하고 최근 `days`일을 수집합니다.
pub async fn sample(ctx: &CollectorContext, days: u32, today: NaiveDate) -> Result<WorkflowReport> {
    let started = Instant::now();
    let start = today - Duration::days(i64::from(days));
    let mut report = WorkflowReport::for_range(start, today);

    info!(days = days, start_date = %start, end_date = %today, "샘플 적재 시작");

    report.catalog = seed_builtin(ctx).await;

    let builtin: Vec<String> = builtin_entries().into_iter().map(|e| e.symbol).collect();
    let instruments: Vec<_> = ctx
        .store
        .list_active()
        .await?
        .into_iter()
        .filter(|i| builtin.contains(&i.symbol))
        .collect();
    report.prices = collect_prices(ctx, &instruments, start, today, true).await;

    finish(ctx, &mut report, start, today).await?;
    report.log_summary("sample", started.elapsed());
    Ok(report)
}

async fn finish(
    ctx: &CollectorContext,
    report: &mut WorkflowReport,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<()> {
    collect_index(ctx, report, start, end).await;
    report.breadth = recompute_breadth(ctx).await?;
    Ok(())
}

async fn collect_index(
    ctx: &CollectorContext,
    report: &mut WorkflowReport,
    start: NaiveDate,
    end: NaiveDate,
) {
    match collect_index_bars(ctx, start, end).await {
        Ok(count) => report.index_bars = count,
        Err(e) => warn!(error = %e, "지수 일봉 저장 실패"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_range() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let start = end - Duration::days(2);
        let report = WorkflowReport::for_range(start, end);

        assert_eq!(report.start, NaiveDate::from_ymd_opt(2024, 3, 13));
        assert_eq!(report.end, Some(end));
        assert!(report.indicators.is_none());
    }
}
