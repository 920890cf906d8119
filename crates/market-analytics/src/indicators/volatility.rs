//! 변동성 지표 (Volatility Indicators).
//!
//! - Bollinger Bands (볼린저 밴드)

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::trend::check_period;
use super::IndicatorResult;

/// 볼린저 밴드 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BollingerBandsParams {
    /// 이동평균 기간 (기본: 20).
    pub period: usize,
    /// 표준편차 배수 (기본: 2.0).
    pub std_dev_multiplier: Decimal,
}

impl Default for BollingerBandsParams {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: dec!(2.0),
        }
    }
}

/// 볼린저 밴드 결과.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BollingerBandsResult {
    /// 상단 밴드 (MA + k × σ).
    pub upper: Option<Decimal>,
    /// 중간 밴드 (이동평균).
    pub middle: Option<Decimal>,
    /// 하단 밴드 (MA - k × σ).
    pub lower: Option<Decimal>,
    /// 밴드 폭 ((상단 - 하단) / 중간).
    pub width: Option<Decimal>,
}

/// 변동성 지표 계산기.
#[derive(Debug, Default)]
pub struct VolatilityIndicators;

impl VolatilityIndicators {
    /// 새로운 변동성 지표 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// 볼린저 밴드 계산.
    ///
    /// 상단 밴드 = MA + (k × σ)
    /// 중간 밴드 = MA (이동평균)
    /// 하단 밴드 = MA - (k × σ)
    ///
    /// σ는 같은 윈도우의 모표준편차입니다. 중간 밴드가 0이면 밴드 폭은 `None`입니다.
    pub fn bollinger_bands(
        &self,
        prices: &[Decimal],
        params: BollingerBandsParams,
    ) -> IndicatorResult<Vec<BollingerBandsResult>> {
        let period = params.period;
        check_period(period)?;

        let period_decimal = Decimal::from(period);
        let mut result = Vec::with_capacity(prices.len());

        for i in 0..prices.len() {
            if i + 1 < period {
                result.push(BollingerBandsResult::default());
                continue;
            }

            let window = &prices[i + 1 - period..=i];

            // 이동평균 (중간 밴드)
            let ma = window.iter().sum::<Decimal>() / period_decimal;

            // 모분산
            let variance = window
                .iter()
                .map(|&p| {
                    let diff = p - ma;
                    diff * diff
                })
                .sum::<Decimal>()
                / period_decimal;

            let deviation = params.std_dev_multiplier * sqrt_decimal(variance);
            let upper = ma + deviation;
            let lower = ma - deviation;

            let width = if ma.is_zero() {
                None
            } else {
                Some((upper - lower) / ma)
            };

            result.push(BollingerBandsResult {
                upper: Some(upper),
                middle: Some(ma),
                lower: Some(lower),
                width,
            });
        }

        Ok(result)
    }
}

/// Decimal 제곱근.
///
/// rust_decimal에는 sqrt가 없으므로 f64로 변환하여 계산합니다.
fn sqrt_decimal(value: Decimal) -> Decimal {
    value
        .to_f64()
        .and_then(|v| Decimal::try_from(v.sqrt()).ok())
        .unwrap_or(Decimal::ZERO)
}
