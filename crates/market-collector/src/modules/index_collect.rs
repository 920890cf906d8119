//! 시장 대표 지수 수집 모듈 (KOSPI ^KS11, KOSDAQ ^KQ11).

use chrono::NaiveDate;
use market_core::Segment;
use market_data::MarketRepository;
use tracing::{info, warn};

use crate::context::CollectorContext;
use crate::Result;

/// 기본 시장의 대표 지수 일봉을 수집하여 저장합니다.
///
/// 지수 조회 실패는 빈 결과로 처리되며, 저장 실패만 에러로 반환합니다.
pub async fn collect_index_bars(
    ctx: &CollectorContext,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<usize> {
    let mut stored = 0;

    for segment in Segment::PRIMARY {
        let bars = ctx.fetcher.fetch_index(segment, start, end).await;
        if bars.is_empty() {
            warn!(segment = %segment, "지수 데이터 없음");
            continue;
        }

        let count = ctx.store.upsert_index_bars(&bars).await?;
        info!(segment = %segment, bars = count, "지수 일봉 저장");
        stored += count;
    }

    Ok(stored)
}
