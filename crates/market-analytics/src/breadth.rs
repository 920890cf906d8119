//! 시장 등락 통계 집계.
//!
//! 하루치 종목 일봉 요약을 시장별로 분류하여 상승/하락/보합 종목 수,
//! 거래량, 거래대금을 집계하고 `ALL` 시장 행을 합산으로 만듭니다.

use chrono::NaiveDate;
use market_core::{BreadthSample, MarketBreadthStat, Segment};
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// 하루치 시장별 등락 통계.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyBreadth {
    pub kospi: MarketBreadthStat,
    pub kosdaq: MarketBreadthStat,
    /// KOSPI + KOSDAQ 합산
    pub all: MarketBreadthStat,
}

impl DailyBreadth {
    /// 저장 순서대로 세 행을 반환합니다 (KOSPI, KOSDAQ, ALL).
    pub fn into_rows(self) -> [MarketBreadthStat; 3] {
        [self.kospi, self.kosdaq, self.all]
    }
}

/// 특정 날짜의 일봉 요약으로 시장별 등락 통계를 계산합니다.
///
/// 시장 구분이 `ALL`인 표본은 무시합니다. 표본이 없는 시장은 0으로 채운 행이 됩니다.
pub fn aggregate_breadth(date: NaiveDate, samples: &[BreadthSample]) -> DailyBreadth {
    let mut kospi = MarketBreadthStat::empty(Segment::Kospi, date);
    let mut kosdaq = MarketBreadthStat::empty(Segment::Kosdaq, date);

    for sample in samples {
        let stat = match sample.segment {
            Segment::Kospi => &mut kospi,
            Segment::Kosdaq => &mut kosdaq,
            Segment::All => continue,
        };
        accumulate(stat, sample);
    }

    let all = MarketBreadthStat::sum_of(Segment::All, date, [&kospi, &kosdaq]);

    DailyBreadth { kospi, kosdaq, all }
}

fn accumulate(stat: &mut MarketBreadthStat, sample: &BreadthSample) {
    match sample.change.cmp(&Decimal::ZERO) {
        Ordering::Greater => stat.rising += 1,
        Ordering::Less => stat.falling += 1,
        Ordering::Equal => stat.unchanged += 1,
    }
    stat.total_stocks += 1;
    stat.total_volume += sample.volume;
    stat.total_value += Decimal::from(sample.volume) * sample.close;
}
