//! 종목 카탈로그 동기화 모듈.
//!
//! KRX 카탈로그와 저장된 종목을 비교하여 없는 종목만 등록합니다.
//! 기존 종목은 건드리지 않으며 삭제하지도 않습니다.

use chrono::{Duration, NaiveDate};
use futures::stream::{self, StreamExt};
use market_core::{CatalogEntry, InstrumentProfile, NewInstrument, Segment};
use market_data::{InstrumentRepository, ProviderError};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::context::CollectorContext;
use crate::error::CollectorError;
use crate::stats::CatalogSyncStats;
use crate::Result;

/// 카탈로그 조회 시 휴장일을 건너뛰기 위해 거슬러 올라가는 최대 일수.
const CATALOG_LOOKBACK_DAYS: i64 = 7;

/// 부가 정보 조회 타임아웃.
const PROFILE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// 카탈로그를 사용할 수 없을 때 사용하는 내장 종목 (거래소 코드, 종목명, 시장).
pub const BUILTIN_INSTRUMENTS: [(&str, &str, Segment); 8] = [
    ("005930", "삼성전자", Segment::Kospi),
    ("000660", "SK하이닉스", Segment::Kospi),
    ("035420", "NAVER", Segment::Kospi),
    ("035720", "카카오", Segment::Kospi),
    ("005490", "POSCO홀딩스", Segment::Kospi),
    ("247540", "에코프로비엠", Segment::Kosdaq),
    ("196170", "알테오젠", Segment::Kosdaq),
    ("028300", "HLB", Segment::Kosdaq),
];

/// 내장 종목 목록.
pub fn builtin_entries() -> Vec<CatalogEntry> {
    BUILTIN_INSTRUMENTS
        .iter()
        .map(|(code, name, segment)| CatalogEntry::new(*code, *name, *segment))
        .collect()
}

fn builtin_entries_for(segment: Segment) -> Vec<CatalogEntry> {
    builtin_entries()
        .into_iter()
        .filter(|e| e.segment == segment)
        .collect()
}

/// 종목 카탈로그 동기화 실행.
///
/// # 동작
/// 1. 시장별(KOSPI, KOSDAQ) 카탈로그 조회 (휴장일이면 직전 거래일)
/// 2. 조회 실패 시 해당 시장은 내장 종목 목록으로 대체 (`degraded`)
/// 3. 저장되지 않은 종목만 부가 정보와 함께 활성 종목으로 등록
pub async fn sync_catalog(ctx: &CollectorContext, as_of: NaiveDate) -> Result<CatalogSyncStats> {
    let start = Instant::now();
    let mut stats = CatalogSyncStats::default();
    let mut entries = Vec::new();

    for segment in Segment::PRIMARY {
        match list_segment(ctx, as_of, segment).await {
            Ok(listed) => entries.extend(listed),
            Err(e) => {
                warn!(
                    segment = %segment,
                    provider = ctx.catalog.name(),
                    error = %e,
                    "카탈로그 조회 실패, 내장 종목 목록 사용"
                );
                stats.degraded = true;
                entries.extend(builtin_entries_for(segment));
            }
        }
    }

    register_entries(ctx, entries, &mut stats).await;

    stats.log_summary();
    debug!(elapsed_ms = start.elapsed().as_millis() as u64, "카탈로그 동기화 소요 시간");
    Ok(stats)
}

/// 내장 종목만 등록합니다 (샘플 데이터 구성용).
pub async fn seed_builtin(ctx: &CollectorContext) -> CatalogSyncStats {
    let mut stats = CatalogSyncStats::default();
    register_entries(ctx, builtin_entries(), &mut stats).await;
    stats.log_summary();
    stats
}

/// 종목 활성 여부를 변경합니다.
pub async fn set_instrument_active(
    ctx: &CollectorContext,
    symbol: &str,
    active: bool,
) -> Result<()> {
    if ctx.store.set_active(symbol, active).await? {
        info!(symbol = symbol, active = active, "종목 활성 상태 변경");
        Ok(())
    } else {
        Err(CollectorError::UnknownInstrument(symbol.to_string()))
    }
}

/// 기준일부터 거슬러 올라가며 비어 있지 않은 카탈로그를 찾습니다.
async fn list_segment(
    ctx: &CollectorContext,
    as_of: NaiveDate,
    segment: Segment,
) -> Result<Vec<CatalogEntry>> {
    for offset in 0..CATALOG_LOOKBACK_DAYS {
        let date = as_of - Duration::days(offset);
        let listings = ctx.catalog.list_instruments(date, segment).await?;

        if !listings.is_empty() {
            info!(segment = %segment, date = %date, count = listings.len(), "카탈로그 수신");
            return Ok(listings
                .into_iter()
                .map(|l| CatalogEntry::new(l.code, l.name, segment))
                .collect());
        }
        debug!(segment = %segment, date = %date, "카탈로그 비어 있음 (휴장일)");
    }

    Err(ProviderError::Unavailable(format!(
        "{} 카탈로그가 최근 {}일간 비어 있습니다",
        segment, CATALOG_LOOKBACK_DAYS
    ))
    .into())
}

/// 저장되지 않은 종목을 등록합니다. 개별 실패는 로그만 남깁니다.
async fn register_entries(
    ctx: &CollectorContext,
    entries: Vec<CatalogEntry>,
    stats: &mut CatalogSyncStats,
) {
    stats.listed += entries.len();

    let outcomes: Vec<RegisterOutcome> = stream::iter(entries)
        .map(|entry| register_entry(ctx, entry))
        .buffer_unordered(ctx.concurrency)
        .collect()
        .await;

    for outcome in outcomes {
        match outcome {
            RegisterOutcome::Inserted => stats.inserted += 1,
            RegisterOutcome::Existing => stats.existing += 1,
            RegisterOutcome::Failed => stats.failed += 1,
        }
    }
}

enum RegisterOutcome {
    Inserted,
    Existing,
    Failed,
}

async fn register_entry(ctx: &CollectorContext, entry: CatalogEntry) -> RegisterOutcome {
    match ctx.store.find_by_symbol(&entry.symbol).await {
        Ok(Some(_)) => return RegisterOutcome::Existing,
        Ok(None) => {}
        Err(e) => {
            warn!(symbol = %entry.symbol, error = %e, "종목 조회 실패");
            return RegisterOutcome::Failed;
        }
    }

    let profile = fetch_profile(ctx, &entry.symbol).await;
    let symbol = entry.symbol.clone();

    match ctx
        .store
        .insert_if_absent(&NewInstrument { entry, profile })
        .await
    {
        Ok(true) => {
            debug!(symbol = %symbol, "신규 종목 등록");
            RegisterOutcome::Inserted
        }
        Ok(false) => RegisterOutcome::Existing,
        Err(e) => {
            warn!(symbol = %symbol, error = %e, "종목 등록 실패");
            RegisterOutcome::Failed
        }
    }
}

/// 부가 정보를 best-effort로 조회합니다. 실패하면 빈 값입니다.
async fn fetch_profile(ctx: &CollectorContext, symbol: &str) -> InstrumentProfile {
    let Some(profiles) = &ctx.profiles else {
        return InstrumentProfile::default();
    };

    match tokio::time::timeout(PROFILE_TIMEOUT, profiles.fetch_profile(symbol)).await {
        Ok(Ok(profile)) => profile,
        Ok(Err(e)) => {
            debug!(symbol = symbol, error = %e, "부가 정보 조회 실패");
            InstrumentProfile::default()
        }
        Err(_) => {
            debug!(symbol = symbol, "부가 정보 조회 타임아웃");
            InstrumentProfile::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_list_shape() {
        let entries = builtin_entries();
        assert_eq!(entries.len(), 8);
        assert_eq!(builtin_entries_for(Segment::Kospi).len(), 5);
        assert_eq!(builtin_entries_for(Segment::Kosdaq).len(), 3);
        assert!(entries.iter().any(|e| e.symbol == "005930.KS"));
        assert!(entries.iter().any(|e| e.symbol == "028300.KQ"));
    }
}
