//! 가격 윈도우 차분.
//!
//! 조회 구간 안에서 직전 행 대비 변동폭과 변동률(%)을 계산합니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// 한 시점의 직전 대비 변동.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceChange {
    /// 직전 값과의 차이
    pub change: Decimal,
    /// 직전 값 대비 변동률 (%)
    pub change_rate: Decimal,
}

/// 날짜 오름차순 값 열의 1차 차분과 변동률을 계산합니다.
///
/// 첫 행은 비교 대상이 없으므로 0이고, 직전 값이 0이면 변동률도 0입니다.
pub fn window_changes(values: &[Decimal]) -> Vec<PriceChange> {
    let mut result = Vec::with_capacity(values.len());
    let mut previous: Option<Decimal> = None;

    for &value in values {
        let change = match previous {
            Some(prev) => {
                let change = value - prev;
                let change_rate = change
                    .checked_div(prev)
                    .map(|rate| rate * dec!(100))
                    .unwrap_or(Decimal::ZERO);
                PriceChange {
                    change,
                    change_rate,
                }
            }
            None => PriceChange::default(),
        };
        result.push(change);
        previous = Some(value);
    }

    result
}
