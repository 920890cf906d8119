//! 캔들 형태 판별.
//!
//! 단일 캔들의 몸통/꼬리 길이로 도지와 망치형을 판별합니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// 캔들 형태 판별 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CandleShapeParams {
    /// 도지 판정 기준: 몸통 / (고가 - 저가 + epsilon) 이 이 값보다 작으면 도지 (기본: 0.1).
    pub doji_body_ratio: Decimal,
    /// 고가 = 저가인 캔들에서 0으로 나누지 않기 위한 보정값 (기본: 0.001).
    pub range_epsilon: Decimal,
    /// 망치형 판정 기준: 아래꼬리가 몸통의 몇 배를 넘어야 하는지 (기본: 2).
    pub hammer_shadow_multiple: Decimal,
}

impl Default for CandleShapeParams {
    fn default() -> Self {
        Self {
            doji_body_ratio: dec!(0.1),
            range_epsilon: dec!(0.001),
            hammer_shadow_multiple: dec!(2),
        }
    }
}

/// 캔들 형태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandleShape {
    /// 몸통 크기 |종가 - 시가|
    pub body: Decimal,
    /// 위꼬리 (고가 - max(시가, 종가))
    pub upper_shadow: Decimal,
    /// 아래꼬리 (min(시가, 종가) - 저가)
    pub lower_shadow: Decimal,
    pub is_doji: bool,
    pub is_hammer: bool,
}

impl CandleShape {
    /// 시가/고가/저가/종가로 캔들 형태를 판별합니다.
    pub fn from_prices(
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        params: CandleShapeParams,
    ) -> Self {
        let body = (close - open).abs();
        let upper_shadow = high - open.max(close);
        let lower_shadow = open.min(close) - low;

        let range = high - low + params.range_epsilon;
        let is_doji = if range.is_zero() {
            false
        } else {
            body / range < params.doji_body_ratio
        };

        let is_hammer = lower_shadow > params.hammer_shadow_multiple * body
            && upper_shadow < body
            && body > Decimal::ZERO;

        Self {
            body,
            upper_shadow,
            lower_shadow,
            is_doji,
            is_hammer,
        }
    }
}
