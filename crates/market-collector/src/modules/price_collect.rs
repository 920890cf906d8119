//! 일봉 수집 모듈.

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use market_core::Instrument;
use market_data::PriceRepository;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::context::CollectorContext;
use crate::modules::indicator_sync::recompute_indicators;
use crate::stats::{CollectionStats, InstrumentOutcome};

/// 종목 하나의 일봉을 수집하여 저장합니다.
///
/// `recompute`가 true면 저장 직후 해당 종목의 지표를 전체 이력으로 다시 계산합니다.
/// 실패는 결과값으로만 보고하며 다른 종목에 영향을 주지 않습니다.
#[instrument(skip_all, fields(symbol = %instrument.symbol))]
pub async fn collect_instrument(
    ctx: &CollectorContext,
    instrument: &Instrument,
    start: NaiveDate,
    end: NaiveDate,
    recompute: bool,
) -> InstrumentOutcome {
    let bars = ctx.fetcher.fetch(instrument, start, end).await;
    if bars.is_empty() {
        debug!("데이터 없음, 기존 데이터 유지");
        return InstrumentOutcome::NoData;
    }

    let stored = match ctx.store.upsert_bars(instrument.id, &bars).await {
        Ok(count) => count,
        Err(e) => {
            warn!(error = %e, "일봉 저장 실패");
            return InstrumentOutcome::Failed(e.to_string());
        }
    };

    if recompute {
        if let Err(e) = recompute_indicators(ctx, instrument.id).await {
            warn!(error = %e, "지표 계산 실패");
            return InstrumentOutcome::Failed(e.to_string());
        }
    }

    debug!(bars = stored, "수집 및 저장 완료");
    InstrumentOutcome::Stored(stored)
}

/// 여러 종목의 일봉을 동시에 수집합니다.
///
/// 동시 처리 수는 `ctx.concurrency`로 제한되며, 종목별 결과는 모든 작업이 끝난 뒤
/// 하나의 통계로 합쳐집니다.
pub async fn collect_prices(
    ctx: &CollectorContext,
    instruments: &[Instrument],
    start: NaiveDate,
    end: NaiveDate,
    recompute: bool,
) -> CollectionStats {
    let started = Instant::now();

    if instruments.is_empty() {
        warn!("수집할 종목이 없습니다");
        return CollectionStats::new();
    }

    info!(
        instruments = instruments.len(),
        start_date = %start,
        end_date = %end,
        concurrency = ctx.concurrency,
        "일봉 수집 시작"
    );

    let mut stats: CollectionStats = stream::iter(instruments)
        .map(|instrument| collect_instrument(ctx, instrument, start, end, recompute))
        .buffer_unordered(ctx.concurrency)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect();

    stats.elapsed = started.elapsed();
    stats.log_summary("daily_bars");
    stats
}
