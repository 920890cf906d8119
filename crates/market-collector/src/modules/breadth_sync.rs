//! 시장 등락 통계 재계산 모듈.

use chrono::NaiveDate;
use market_analytics::aggregate_breadth;
use market_data::{MarketRepository, PriceRepository};
use std::time::Instant;
use tracing::{info, warn};

use crate::context::CollectorContext;
use crate::stats::BreadthSummary;
use crate::Result;

/// 저장된 모든 거래일의 등락 통계를 다시 계산합니다.
///
/// 날짜별로 KOSPI, KOSDAQ, ALL 세 행을 한 트랜잭션으로 저장하며,
/// 한 날짜의 실패는 그 날짜만 건너뜁니다.
pub async fn recompute_breadth(ctx: &CollectorContext) -> Result<BreadthSummary> {
    let started = Instant::now();
    let dates = ctx.store.distinct_dates().await?;
    let mut summary = BreadthSummary::default();

    info!(dates = dates.len(), "등락 통계 재계산 시작");

    for date in dates {
        match recompute_breadth_day(ctx, date).await {
            Ok(()) => summary.processed += 1,
            Err(e) => {
                warn!(date = %date, error = %e, "등락 통계 계산 실패");
                summary.failed += 1;
            }
        }
    }

    info!(
        processed = summary.processed,
        failed = summary.failed,
        elapsed = format!("{:.1}s", started.elapsed().as_secs_f64()),
        "등락 통계 재계산 완료"
    );
    Ok(summary)
}

/// 하루치 등락 통계를 계산하여 저장합니다.
pub async fn recompute_breadth_day(ctx: &CollectorContext, date: NaiveDate) -> Result<()> {
    let samples = ctx.store.breadth_samples(date).await?;
    let breadth = aggregate_breadth(date, &samples);
    ctx.store.upsert_breadth_day(&breadth.into_rows()).await?;
    Ok(())
}
