//! 기술적 지표 동기화 모듈.
//!
//! 종목의 전체 일봉 이력으로 지표를 다시 계산하고, 기존 지표 행을 한 트랜잭션 안에서
//! 교체합니다.

use futures::stream::{self, StreamExt};
use market_core::Instrument;
use market_data::{IndicatorRepository, InstrumentRepository, PriceRepository};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::context::CollectorContext;
use crate::stats::{CollectionStats, InstrumentOutcome};
use crate::Result;

/// 종목 하나의 지표를 다시 계산합니다.
///
/// 저장된 지표 행 수를 반환합니다. 일봉 이력이 없으면 아무것도 쓰지 않고 `None`입니다.
#[instrument(skip(ctx))]
pub async fn recompute_indicators(
    ctx: &CollectorContext,
    instrument_id: Uuid,
) -> Result<Option<usize>> {
    let history = ctx.store.load_history(instrument_id).await?;
    if history.is_empty() {
        debug!("일봉 이력 없음");
        return Ok(None);
    }

    let rows = ctx.engine.compute(&history)?;
    let stored = ctx.store.replace_indicators(instrument_id, &rows).await?;

    debug!(rows = stored, "지표 교체 완료");
    Ok(Some(stored))
}

/// 모든 활성 종목의 지표를 다시 계산합니다.
pub async fn recompute_all_indicators(ctx: &CollectorContext) -> Result<CollectionStats> {
    let instruments = ctx.store.list_active().await?;
    Ok(recompute_for(ctx, &instruments).await)
}

/// 주어진 종목들의 지표를 동시에 다시 계산합니다.
pub(crate) async fn recompute_for(
    ctx: &CollectorContext,
    instruments: &[Instrument],
) -> CollectionStats {
    let started = Instant::now();
    info!(instruments = instruments.len(), "지표 재계산 시작");

    let mut stats: CollectionStats = stream::iter(instruments)
        .map(|instrument| async move {
            match recompute_indicators(ctx, instrument.id).await {
                Ok(Some(rows)) => InstrumentOutcome::Stored(rows),
                Ok(None) => InstrumentOutcome::NoData,
                Err(e) => {
                    warn!(symbol = %instrument.symbol, error = %e, "지표 재계산 실패");
                    InstrumentOutcome::Failed(e.to_string())
                }
            }
        })
        .buffer_unordered(ctx.concurrency)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect();

    stats.elapsed = started.elapsed();
    stats.log_summary("technical_indicators");
    stats
}
