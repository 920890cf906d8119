//! 추세 지표 (Trend Indicators).
//!
//! 이동평균 기반의 추세 지표들을 제공합니다.
//! - SMA (Simple Moving Average)
//! - EMA (Exponential Moving Average)
//! - MACD (Moving Average Convergence Divergence)

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{IndicatorError, IndicatorResult};

/// MACD 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MacdParams {
    /// 단기 EMA 기간 (기본: 12).
    pub fast_period: usize,
    /// 장기 EMA 기간 (기본: 26).
    pub slow_period: usize,
    /// 시그널 라인 기간 (기본: 9).
    pub signal_period: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

/// MACD 결과.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MacdResult {
    /// MACD 라인 (단기 EMA - 장기 EMA).
    pub macd: Option<Decimal>,
    /// 시그널 라인 (MACD의 EMA).
    pub signal: Option<Decimal>,
    /// 히스토그램 (MACD - 시그널).
    pub histogram: Option<Decimal>,
}

/// 추세 지표 계산기.
#[derive(Debug, Default)]
pub struct TrendIndicators;

impl TrendIndicators {
    /// 새로운 추세 지표 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// 단순 이동평균 (SMA) 계산.
    ///
    /// SMA = (P1 + P2 + ... + Pn) / n
    ///
    /// 데이터가 기간보다 짧으면 에러 대신 전부 `None`을 반환합니다.
    ///
    /// # 반환
    /// 각 시점의 SMA 값 (처음 period-1개는 None)
    pub fn sma(&self, values: &[Decimal], period: usize) -> IndicatorResult<Vec<Option<Decimal>>> {
        check_period(period)?;

        let period_decimal = Decimal::from(period);
        let result = (0..values.len())
            .map(|i| {
                if i + 1 < period {
                    None
                } else {
                    let sum: Decimal = values[i + 1 - period..=i].iter().sum();
                    Some(sum / period_decimal)
                }
            })
            .collect();

        Ok(result)
    }

    /// 지수 이동평균 (EMA) 계산.
    ///
    /// EMA = (현재값 × k) + (이전 EMA × (1 - k)), k = 2 / (period + 1)
    ///
    /// 첫 관측값을 초기 EMA로 사용하고, 관측값이 period개 쌓이기 전까지는 `None`입니다.
    /// 입력 앞쪽의 `None`은 건너뜁니다 (MACD 시그널 계산용).
    pub fn ema(
        &self,
        values: &[Option<Decimal>],
        period: usize,
    ) -> IndicatorResult<Vec<Option<Decimal>>> {
        check_period(period)?;

        let alpha = dec!(2) / Decimal::from(period + 1);
        Ok(exponential_mean(values, alpha, period))
    }

    /// MACD 계산.
    ///
    /// MACD 라인 = 단기 EMA - 장기 EMA
    /// 시그널 라인 = MACD 라인의 EMA
    /// 히스토그램 = MACD 라인 - 시그널 라인
    pub fn macd(&self, prices: &[Decimal], params: MacdParams) -> IndicatorResult<Vec<MacdResult>> {
        if params.fast_period >= params.slow_period {
            return Err(IndicatorError::InvalidParameter(format!(
                "단기 기간({})은 장기 기간({})보다 짧아야 합니다",
                params.fast_period, params.slow_period
            )));
        }

        let observed: Vec<Option<Decimal>> = prices.iter().copied().map(Some).collect();
        let fast_ema = self.ema(&observed, params.fast_period)?;
        let slow_ema = self.ema(&observed, params.slow_period)?;

        let macd_line: Vec<Option<Decimal>> = fast_ema
            .iter()
            .zip(&slow_ema)
            .map(|(fast, slow)| match (fast, slow) {
                (Some(f), Some(s)) => Some(f - s),
                _ => None,
            })
            .collect();

        let signal_line = self.ema(&macd_line, params.signal_period)?;

        let result = macd_line
            .iter()
            .zip(&signal_line)
            .map(|(&macd, &signal)| MacdResult {
                macd,
                signal,
                histogram: match (macd, signal) {
                    (Some(m), Some(s)) => Some(m - s),
                    _ => None,
                },
            })
            .collect();

        Ok(result)
    }
}

/// 재귀형 지수 가중 평균.
///
/// 첫 관측값으로 시작하여 `y = α·x + (1-α)·y_prev`로 갱신하며,
/// 관측값 수가 `min_periods`에 도달한 시점부터 값을 내보냅니다.
pub(crate) fn exponential_mean(
    values: &[Option<Decimal>],
    alpha: Decimal,
    min_periods: usize,
) -> Vec<Option<Decimal>> {
    let one_minus_alpha = Decimal::ONE - alpha;
    let mut state: Option<Decimal> = None;
    let mut observed = 0usize;

    values
        .iter()
        .map(|value| {
            let x = (*value)?;
            let next = match state {
                None => x,
                Some(prev) => x * alpha + prev * one_minus_alpha,
            };
            state = Some(next);
            observed += 1;

            if observed >= min_periods {
                Some(next)
            } else {
                None
            }
        })
        .collect()
}

pub(crate) fn check_period(period: usize) -> IndicatorResult<()> {
    if period == 0 {
        return Err(IndicatorError::InvalidParameter(
            "기간은 0보다 커야 합니다".to_string(),
        ));
    }
    Ok(())
}
