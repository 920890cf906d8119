//! 일봉 및 시장 지수 레코드.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Segment;

/// 종목 일봉.
///
/// (종목, 날짜) 조합당 하나의 행만 존재합니다.
/// `change`/`change_rate`는 수정종가 기준 직전 행 대비 변화량이며,
/// 직전 행이 없거나 계산이 불가능하면 0으로 채워집니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// 수정종가 (Provider 미제공 시 종가)
    pub adjusted_close: Decimal,
    /// 거래량
    pub volume: i64,
    /// 전일 대비 (수정종가 기준)
    pub change: Decimal,
    /// 전일 대비 등락률 (%)
    pub change_rate: Decimal,
}

/// 시장 지수 일봉.
///
/// (시장, 날짜) 조합당 하나의 행만 존재합니다. 변화량은 종가 기준입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketIndexBar {
    pub segment: Segment,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
    pub change: Decimal,
    pub change_rate: Decimal,
}

impl MarketIndexBar {
    /// 정규화된 일봉을 지정한 시장의 지수 일봉으로 변환합니다.
    pub fn from_bar(segment: Segment, bar: DailyBar) -> Self {
        Self {
            segment,
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            change: bar.change,
            change_rate: bar.change_rate,
        }
    }
}
