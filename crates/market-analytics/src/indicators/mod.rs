//! 기술적 지표 모듈.
//!
//! 종목의 전체 일봉 이력(날짜 오름차순)으로부터 날짜별 지표 행을 계산합니다.
//!
//! # 지원 지표
//!
//! ## 추세 지표
//! - **SMA**: 5/10/20/60/120일 단순 이동평균
//! - **MACD**: EMA(12) - EMA(26), 시그널 EMA(9), 히스토그램
//!
//! ## 모멘텀 지표
//! - **RSI**: 14일 Wilder 방식 상대강도지수
//!
//! ## 변동성 지표
//! - **Bollinger Bands**: 20일, ±2σ (모표준편차)
//!
//! ## 거래량 / 캔들
//! - 20일 거래량 이동평균과 거래량 비율
//! - 도지, 망치형 캔들
//!
//! ## 시그널
//! - 골든크로스 / 데드크로스 (MA5 vs MA20)
//! - 볼린저 밴드 상단/하단 터치
//!
//! 워밍업 구간의 값은 계산 중에는 `None`으로 유지되고,
//! 모든 계산이 끝난 뒤 행을 만들 때 0으로 채워집니다.
//!
//! # 사용 예시
//!
//! ```ignore
//! use market_analytics::IndicatorEngine;
//!
//! let engine = IndicatorEngine::new();
//! let rows = engine.compute(&bars)?;
//! ```

pub mod candle;
pub mod momentum;
pub mod trend;
pub mod volatility;

use market_core::{DailyBar, IndicatorRow};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;
use tracing::debug;

pub use candle::{CandleShape, CandleShapeParams};
pub use momentum::{MomentumCalculator, RsiParams};
pub use trend::{MacdParams, MacdResult, TrendIndicators};
pub use volatility::{BollingerBandsParams, BollingerBandsResult, VolatilityIndicators};

/// 지표 계산 오류.
#[derive(Debug, Error)]
pub enum IndicatorError {
    /// 잘못된 파라미터
    #[error("잘못된 파라미터: {0}")]
    InvalidParameter(String),

    /// 입력 순서 오류
    #[error("일봉이 날짜 오름차순이 아닙니다: {0}")]
    UnorderedInput(String),
}

/// 지표 계산 결과 타입.
pub type IndicatorResult<T> = Result<T, IndicatorError>;

/// 이동평균 기간 (5, 10, 20, 60, 120일).
pub const MA_PERIODS: [usize; 5] = [5, 10, 20, 60, 120];

/// 거래량 이동평균 기간.
pub const VOLUME_MA_PERIOD: usize = 20;

/// 통합 지표 엔진.
///
/// 추세/모멘텀/변동성/캔들 계산기를 조합하여 날짜별 [`IndicatorRow`]를 만듭니다.
#[derive(Debug, Default)]
pub struct IndicatorEngine {
    trend: TrendIndicators,
    momentum: MomentumCalculator,
    volatility: VolatilityIndicators,
    rsi: RsiParams,
    macd: MacdParams,
    bollinger: BollingerBandsParams,
    candle: CandleShapeParams,
}

impl IndicatorEngine {
    /// 기본 파라미터로 지표 엔진을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 종목 일봉 이력의 모든 날짜에 대해 지표 행을 계산합니다.
    ///
    /// 가격 지표는 수정종가를 기준으로 계산합니다.
    ///
    /// # 인자
    /// * `bars` - 날짜 오름차순으로 정렬된 종목의 전체 일봉
    ///
    /// # 반환
    /// 입력 일봉과 같은 길이, 같은 순서의 지표 행
    pub fn compute(&self, bars: &[DailyBar]) -> IndicatorResult<Vec<IndicatorRow>> {
        if let Some(pair) = bars.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(IndicatorError::UnorderedInput(format!(
                "{} 다음에 {}",
                pair[0].date, pair[1].date
            )));
        }

        let closes: Vec<Decimal> = bars.iter().map(|b| b.adjusted_close).collect();
        let volumes: Vec<Decimal> = bars.iter().map(|b| Decimal::from(b.volume)).collect();

        let ma5 = self.trend.sma(&closes, 5)?;
        let ma10 = self.trend.sma(&closes, 10)?;
        let ma20 = self.trend.sma(&closes, 20)?;
        let ma60 = self.trend.sma(&closes, 60)?;
        let ma120 = self.trend.sma(&closes, 120)?;

        let bands = self.volatility.bollinger_bands(&closes, self.bollinger)?;
        let rsi = self.momentum.rsi(&closes, self.rsi)?;
        let macd = self.trend.macd(&closes, self.macd)?;

        let volume_ma = self.trend.sma(&volumes, VOLUME_MA_PERIOD)?;

        let mut rows = Vec::with_capacity(bars.len());

        for (i, bar) in bars.iter().enumerate() {
            let shape = CandleShape::from_prices(
                bar.open,
                bar.high,
                bar.low,
                bar.adjusted_close,
                self.candle,
            );

            let volume_ratio = volume_ma[i]
                .filter(|avg| !avg.is_zero())
                .and_then(|avg| volumes[i].checked_div(avg))
                .map(|r| r * dec!(100));

            // 직전 행과 비교 (첫 행은 크로스 불가)
            let (golden_cross, death_cross) = if i == 0 {
                (false, false)
            } else {
                match (ma5[i], ma20[i], ma5[i - 1], ma20[i - 1]) {
                    (Some(fast), Some(slow), Some(prev_fast), Some(prev_slow)) => (
                        fast > slow && prev_fast <= prev_slow,
                        fast < slow && prev_fast >= prev_slow,
                    ),
                    _ => (false, false),
                }
            };

            let band = bands[i];
            let bb_upper_touch = band.upper.is_some_and(|upper| bar.high >= upper);
            let bb_lower_touch = band.lower.is_some_and(|lower| bar.low <= lower);

            rows.push(IndicatorRow {
                date: bar.date,
                ma5: zero_fill(ma5[i]),
                ma10: zero_fill(ma10[i]),
                ma20: zero_fill(ma20[i]),
                ma60: zero_fill(ma60[i]),
                ma120: zero_fill(ma120[i]),
                bb_upper: zero_fill(band.upper),
                bb_middle: zero_fill(band.middle),
                bb_lower: zero_fill(band.lower),
                bb_width: zero_fill(band.width),
                rsi: zero_fill(rsi[i]),
                macd: zero_fill(macd[i].macd),
                macd_signal: zero_fill(macd[i].signal),
                macd_hist: zero_fill(macd[i].histogram),
                volume_ma20: zero_fill(volume_ma[i]),
                volume_ratio: zero_fill(volume_ratio),
                is_doji: shape.is_doji,
                is_hammer: shape.is_hammer,
                golden_cross,
                death_cross,
                bb_upper_touch,
                bb_lower_touch,
            });
        }

        debug!(rows = rows.len(), "지표 계산 완료");
        Ok(rows)
    }
}

/// 계산이 불가능했던 값(워밍업 구간, 0으로 나누기)을 0으로 채웁니다.
fn zero_fill(value: Option<Decimal>) -> Decimal {
    value.unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn bars_from_closes(closes: &[Decimal]) -> Vec<DailyBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| DailyBar {
                date: start + Duration::days(i as i64),
                open: close,
                high: close + dec!(1),
                low: close - dec!(1),
                close,
                adjusted_close: close,
                volume: 1_000,
                change: Decimal::ZERO,
                change_rate: Decimal::ZERO,
            })
            .collect()
    }

    #[test]
    fn test_empty_history_yields_no_rows() {
        let engine = IndicatorEngine::new();
        assert!(engine.compute(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_short_history_is_zero_filled() {
        let engine = IndicatorEngine::new();
        let bars = bars_from_closes(&[dec!(100), dec!(102), dec!(99), dec!(99)]);
        let rows = engine.compute(&bars).unwrap();

        assert_eq!(rows.len(), 4);
        for row in &rows {
            assert_eq!(row.ma5, Decimal::ZERO);
            assert_eq!(row.ma120, Decimal::ZERO);
            assert_eq!(row.bb_upper, Decimal::ZERO);
            assert_eq!(row.rsi, Decimal::ZERO);
            assert_eq!(row.macd, Decimal::ZERO);
            assert_eq!(row.volume_ratio, Decimal::ZERO);
            assert!(!row.golden_cross && !row.death_cross);
            assert!(!row.bb_upper_touch && !row.bb_lower_touch);
        }
    }

    #[test]
    fn test_rejects_unordered_history() {
        let engine = IndicatorEngine::new();
        let mut bars = bars_from_closes(&[dec!(100), dec!(101)]);
        bars.swap(0, 1);
        assert!(matches!(
            engine.compute(&bars),
            Err(IndicatorError::UnorderedInput(_))
        ));
    }

    #[test]
    fn test_golden_cross_after_downtrend_reversal() {
        let engine = IndicatorEngine::new();
        // 30일 하락 후 급반등: MA5가 MA20을 위로 돌파
        let mut closes: Vec<Decimal> = (0..30).map(|i| dec!(200) - Decimal::from(i)).collect();
        closes.extend((1..=10).map(|i| dec!(171) + Decimal::from(i * 5)));
        let rows = engine.compute(&bars_from_closes(&closes)).unwrap();

        let golden: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.golden_cross)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(golden.len(), 1);

        let i = golden[0];
        assert!(rows[i].ma5 > rows[i].ma20);
        assert!(rows[i - 1].ma5 <= rows[i - 1].ma20);
        assert!(rows.iter().all(|r| !(r.golden_cross && r.death_cross)));
    }

    #[test]
    fn test_volume_ratio_against_twenty_day_average() {
        let engine = IndicatorEngine::new();
        let mut bars = bars_from_closes(&vec![dec!(100); 20]);
        for bar in bars.iter_mut().take(19) {
            bar.volume = 1_000;
        }
        bars[19].volume = 2_900;
        let rows = engine.compute(&bars).unwrap();

        // 평균 = (19 * 1000 + 2900) / 20 = 1095
        assert_eq!(rows[19].volume_ma20, dec!(1095));
        assert_eq!(
            rows[19].volume_ratio.round_dp(4),
            (dec!(2900) / dec!(1095) * dec!(100)).round_dp(4)
        );
        assert_eq!(rows[18].volume_ratio, Decimal::ZERO);
    }
}
