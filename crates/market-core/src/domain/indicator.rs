//! 기술적 지표 행.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 종목의 특정 날짜 기술적 지표.
///
/// 종목의 전체 일봉 이력으로부터 계산되며, 재계산 시 종목 단위로 통째로 교체됩니다.
/// 워밍업 구간(윈도우가 채워지기 전)의 값은 0으로 채워집니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub date: NaiveDate,

    // 이동평균선
    pub ma5: Decimal,
    pub ma10: Decimal,
    pub ma20: Decimal,
    pub ma60: Decimal,
    pub ma120: Decimal,

    // 볼린저 밴드
    pub bb_upper: Decimal,
    pub bb_middle: Decimal,
    pub bb_lower: Decimal,
    pub bb_width: Decimal,

    pub rsi: Decimal,

    // MACD
    pub macd: Decimal,
    pub macd_signal: Decimal,
    pub macd_hist: Decimal,

    // 거래량
    pub volume_ma20: Decimal,
    pub volume_ratio: Decimal,

    // 캔들 패턴
    pub is_doji: bool,
    pub is_hammer: bool,

    // 시그널
    pub golden_cross: bool,
    pub death_cross: bool,
    pub bb_upper_touch: bool,
    pub bb_lower_touch: bool,
}
