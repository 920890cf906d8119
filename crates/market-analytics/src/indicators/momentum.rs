//! 모멘텀 지표 (Momentum Indicators).
//!
//! - RSI (Relative Strength Index)

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::trend::{check_period, exponential_mean};
use super::IndicatorResult;

/// RSI 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RsiParams {
    /// RSI 기간 (기본: 14).
    pub period: usize,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// 모멘텀 지표 계산기.
#[derive(Debug, Default)]
pub struct MomentumCalculator;

impl MomentumCalculator {
    /// 새로운 모멘텀 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// RSI (Relative Strength Index) 계산.
    ///
    /// RSI = 100 - (100 / (1 + RS)), RS = 평균 상승폭 / 평균 하락폭
    ///
    /// 같은 값인 100 × 상승폭 / (상승폭 + 하락폭)으로 계산합니다. 긴 보합 구간 뒤
    /// 평균 하락폭이 0에 가까워져도 나눗셈이 넘치지 않습니다.
    ///
    /// 평균은 Wilder 평활 (α = 1/period)이며 첫 관측값부터 재귀적으로 갱신합니다.
    /// 첫 행의 가격 변화는 0으로 취급하고, period개가 쌓이기 전까지는 `None`입니다.
    /// 평균 하락폭이 0이면 RSI는 100입니다.
    ///
    /// # 반환
    /// 0-100 사이의 RSI 값들
    pub fn rsi(&self, prices: &[Decimal], params: RsiParams) -> IndicatorResult<Vec<Option<Decimal>>> {
        let period = params.period;
        check_period(period)?;

        let mut gains = Vec::with_capacity(prices.len());
        let mut losses = Vec::with_capacity(prices.len());
        for i in 0..prices.len() {
            let delta = if i == 0 {
                Decimal::ZERO
            } else {
                prices[i] - prices[i - 1]
            };
            gains.push(Some(delta.max(Decimal::ZERO)));
            losses.push(Some((-delta).max(Decimal::ZERO)));
        }

        let alpha = Decimal::ONE / Decimal::from(period);
        let avg_gains = exponential_mean(&gains, alpha, period);
        let avg_losses = exponential_mean(&losses, alpha, period);

        let result = avg_gains
            .iter()
            .zip(&avg_losses)
            .map(|(gain, loss)| match (gain, loss) {
                (Some(gain), Some(loss)) => {
                    if loss.is_zero() {
                        Some(dec!(100))
                    } else {
                        Some(dec!(100) * gain / (gain + loss))
                    }
                }
                _ => None,
            })
            .collect();

        Ok(result)
    }
}
