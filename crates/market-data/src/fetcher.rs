//! 일봉 수집 및 정규화.
//!
//! Provider 원시 응답을 검증하고 날짜 오름차순/중복 제거 후
//! 조회 구간 내 변동폭과 변동률을 채워 [`DailyBar`]로 변환합니다.
//!
//! 수집 실패는 호출자에게 오류로 전달되지 않습니다. 데이터 없음, 잘못된 응답,
//! Provider 오류, 타임아웃은 모두 빈 결과가 됩니다.

use chrono::NaiveDate;
use market_analytics::window_changes;
use market_core::{DailyBar, Instrument, MarketIndexBar, Segment};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{MarketDataProvider, RawQuote};

/// 기본 Provider 호출 타임아웃 (초).
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// 차분 기준 가격.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeBasis {
    /// 종목: 수정종가
    AdjustedClose,
    /// 지수: 종가 (수정종가 = 종가)
    Close,
}

/// 일봉 수집기.
#[derive(Clone)]
pub struct PriceFetcher {
    provider: Arc<dyn MarketDataProvider>,
    timeout: Duration,
}

impl PriceFetcher {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }

    /// Provider 호출 타임아웃을 지정합니다.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 종목의 일봉을 조회합니다 (start, end 포함).
    ///
    /// 데이터가 없거나 조회에 실패하면 빈 목록을 반환합니다.
    pub async fn fetch(
        &self,
        instrument: &Instrument,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<DailyBar> {
        let symbol = instrument.symbol.as_str();
        let response =
            tokio::time::timeout(self.timeout, self.provider.fetch_bars(symbol, start, end)).await;

        match self.settle(symbol, response) {
            Some(quotes) => normalize(symbol, quotes, ChangeBasis::AdjustedClose),
            None => Vec::new(),
        }
    }

    /// 시장 대표 지수의 일봉을 조회합니다.
    ///
    /// `ALL` 시장은 대표 지수가 없으므로 항상 빈 목록입니다.
    pub async fn fetch_index(
        &self,
        segment: Segment,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<MarketIndexBar> {
        let Some(index_symbol) = segment.index_symbol() else {
            return Vec::new();
        };

        let response = tokio::time::timeout(
            self.timeout,
            self.provider.fetch_daily_series(index_symbol, start, end),
        )
        .await;

        match self.settle(index_symbol, response) {
            Some(quotes) => normalize(index_symbol, quotes, ChangeBasis::Close)
                .into_iter()
                .map(|bar| MarketIndexBar::from_bar(segment, bar))
                .collect(),
            None => Vec::new(),
        }
    }

    /// 타임아웃과 Provider 오류를 로그로 정리합니다.
    fn settle(
        &self,
        symbol: &str,
        response: Result<ProviderResult<Vec<RawQuote>>, tokio::time::error::Elapsed>,
    ) -> Option<Vec<RawQuote>> {
        let result = response
            .unwrap_or_else(|_| Err(ProviderError::Timeout(self.timeout.as_secs())));

        match result {
            Ok(quotes) if quotes.is_empty() => {
                debug!(symbol = symbol, provider = self.provider.name(), "데이터 없음");
                None
            }
            Ok(quotes) => Some(quotes),
            Err(e) => {
                warn!(
                    symbol = symbol,
                    provider = self.provider.name(),
                    error = %e,
                    "일봉 조회 실패"
                );
                None
            }
        }
    }
}

/// 필수 값이 모두 있는 일봉.
struct ValidQuote {
    date: NaiveDate,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    adjusted_close: Decimal,
    volume: i64,
}

/// 원시 응답을 정규화합니다.
///
/// 한 건이라도 필수 필드가 없거나 유한하지 않으면 응답 전체를 버립니다.
fn normalize(symbol: &str, quotes: Vec<RawQuote>, basis: ChangeBasis) -> Vec<DailyBar> {
    let mut by_date: BTreeMap<NaiveDate, ValidQuote> = BTreeMap::new();

    for quote in &quotes {
        let Some(valid) = validate(quote, basis) else {
            warn!(symbol = symbol, date = %quote.date, "필수 필드 누락된 응답, 전체 폐기");
            return Vec::new();
        };
        // 같은 날짜가 중복되면 마지막 값 사용
        by_date.insert(valid.date, valid);
    }

    let valid: Vec<ValidQuote> = by_date.into_values().collect();
    let reference: Vec<Decimal> = valid.iter().map(|q| q.adjusted_close).collect();
    let changes = window_changes(&reference);

    let bars: Vec<DailyBar> = valid
        .into_iter()
        .zip(changes)
        .map(|(q, change)| DailyBar {
            date: q.date,
            open: q.open,
            high: q.high,
            low: q.low,
            close: q.close,
            adjusted_close: q.adjusted_close,
            volume: q.volume,
            change: change.change,
            change_rate: change.change_rate,
        })
        .collect();

    debug!(symbol = symbol, count = bars.len(), "일봉 정규화 완료");
    bars
}

fn validate(quote: &RawQuote, basis: ChangeBasis) -> Option<ValidQuote> {
    let open = to_decimal(quote.open)?;
    let high = to_decimal(quote.high)?;
    let low = to_decimal(quote.low)?;
    let close = to_decimal(quote.close)?;
    let volume = quote.volume.filter(|v| *v >= 0)?;

    let adjusted_close = match basis {
        ChangeBasis::Close => close,
        ChangeBasis::AdjustedClose => match quote.adjusted_close {
            // 수정종가가 있으나 유한하지 않으면 잘못된 응답
            Some(value) => to_decimal(Some(value))?,
            None => close,
        },
    };

    Some(ValidQuote {
        date: quote.date,
        open,
        high,
        low,
        close,
        adjusted_close,
        volume,
    })
}

fn to_decimal(value: Option<f64>) -> Option<Decimal> {
    value.filter(|v| v.is_finite()).and_then(Decimal::from_f64)
}
