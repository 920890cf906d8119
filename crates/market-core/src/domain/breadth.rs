//! 시장 등락 통계 (Market Breadth Statistics).
//!
//! 날짜별/시장별 상승·하락·보합 종목 수와 거래량, 거래대금을 집계합니다.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Segment;

/// 시장별 일간 등락 통계.
///
/// `ALL` 시장의 행은 항상 같은 날짜 KOSPI/KOSDAQ 행의 합계입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketBreadthStat {
    pub segment: Segment,
    pub date: NaiveDate,
    /// 상승 종목 수 (change > 0)
    pub rising: i32,
    /// 하락 종목 수 (change < 0)
    pub falling: i32,
    /// 보합 종목 수 (change == 0)
    pub unchanged: i32,
    /// 전체 종목 수
    pub total_stocks: i32,
    /// 총 거래량
    pub total_volume: i64,
    /// 총 거래대금 (Σ 거래량 × 종가)
    pub total_value: Decimal,
}

/// 등락 통계 계산에 필요한 종목 일봉 요약.
///
/// 특정 날짜의 일봉을 종목의 시장 구분과 함께 조회한 결과입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreadthSample {
    pub segment: Segment,
    pub change: Decimal,
    pub volume: i64,
    pub close: Decimal,
}

impl MarketBreadthStat {
    /// 빈 통계 행을 생성합니다.
    pub fn empty(segment: Segment, date: NaiveDate) -> Self {
        Self {
            segment,
            date,
            rising: 0,
            falling: 0,
            unchanged: 0,
            total_stocks: 0,
            total_volume: 0,
            total_value: Decimal::ZERO,
        }
    }

    /// 여러 시장의 통계를 원소별로 합산하여 지정한 시장의 행을 만듭니다.
    pub fn sum_of<'a>(
        segment: Segment,
        date: NaiveDate,
        parts: impl IntoIterator<Item = &'a MarketBreadthStat>,
    ) -> Self {
        parts
            .into_iter()
            .fold(Self::empty(segment, date), |mut acc, part| {
                acc.rising += part.rising;
                acc.falling += part.falling;
                acc.unchanged += part.unchanged;
                acc.total_stocks += part.total_stocks;
                acc.total_volume += part.total_volume;
                acc.total_value += part.total_value;
                acc
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sum_of_is_elementwise() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let kospi = MarketBreadthStat {
            segment: Segment::Kospi,
            date,
            rising: 3,
            falling: 1,
            unchanged: 1,
            total_stocks: 5,
            total_volume: 4_000_000_000,
            total_value: dec!(1500.5),
        };
        let kosdaq = MarketBreadthStat {
            segment: Segment::Kosdaq,
            date,
            rising: 0,
            falling: 2,
            unchanged: 0,
            total_stocks: 2,
            total_volume: 1_000_000_000,
            total_value: dec!(20),
        };

        let all = MarketBreadthStat::sum_of(Segment::All, date, [&kospi, &kosdaq]);

        assert_eq!(all.segment, Segment::All);
        assert_eq!(all.rising, 3);
        assert_eq!(all.falling, 3);
        assert_eq!(all.unchanged, 1);
        assert_eq!(all.total_stocks, 7);
        // 32비트 범위를 넘는 거래량도 그대로 합산
        assert_eq!(all.total_volume, 5_000_000_000);
        assert_eq!(all.total_value, dec!(1520.5));
    }
}
