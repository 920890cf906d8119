//! 수집 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 종목 하나를 처리한 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstrumentOutcome {
    /// 일봉 n건 저장
    Stored(usize),
    /// Provider가 데이터를 주지 않음
    NoData,
    /// 저장 또는 계산 실패
    Failed(String),
}

/// 수집 작업 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 총 시도 횟수
    pub total: usize,
    /// 성공 횟수
    pub success: usize,
    /// 에러 횟수
    pub errors: usize,
    /// 빈 데이터 (조회 성공, 데이터 없음)
    pub empty: usize,
    /// 저장된 총 일봉 수
    pub total_bars: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 종목 처리 결과를 반영합니다.
    pub fn record(&mut self, outcome: &InstrumentOutcome) {
        self.total += 1;
        match outcome {
            InstrumentOutcome::Stored(count) => {
                self.success += 1;
                self.total_bars += count;
            }
            InstrumentOutcome::NoData => self.empty += 1,
            InstrumentOutcome::Failed(_) => self.errors += 1,
        }
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            empty = self.empty,
            total_bars = self.total_bars,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}

impl FromIterator<InstrumentOutcome> for CollectionStats {
    fn from_iter<I: IntoIterator<Item = InstrumentOutcome>>(iter: I) -> Self {
        let mut stats = Self::new();
        for outcome in iter {
            stats.record(&outcome);
        }
        stats
    }
}

/// 카탈로그 동기화 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSyncStats {
    /// 카탈로그에서 받은 종목 수
    pub listed: usize,
    /// 신규 등록
    pub inserted: usize,
    /// 이미 등록된 종목
    pub existing: usize,
    /// 등록 실패
    pub failed: usize,
    /// 내장 종목 목록으로 대체했는지 여부
    pub degraded: bool,
}

impl CatalogSyncStats {
    pub fn log_summary(&self) {
        if self.degraded {
            tracing::warn!(
                listed = self.listed,
                inserted = self.inserted,
                existing = self.existing,
                failed = self.failed,
                "카탈로그 동기화 완료 (내장 목록 사용)"
            );
        } else {
            tracing::info!(
                listed = self.listed,
                inserted = self.inserted,
                existing = self.existing,
                failed = self.failed,
                "카탈로그 동기화 완료"
            );
        }
    }
}

/// 등락 통계 재계산 결과
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BreadthSummary {
    /// 처리한 날짜 수
    pub processed: usize,
    /// 실패한 날짜 수
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcomes_merge_at_barrier() {
        let stats: CollectionStats = vec![
            InstrumentOutcome::Stored(120),
            InstrumentOutcome::NoData,
            InstrumentOutcome::Failed("timeout".to_string()),
            InstrumentOutcome::Stored(3),
        ]
        .into_iter()
        .collect();

        assert_eq!(stats.total, 4);
        assert_eq!(stats.success, 2);
        assert_eq!(stats.empty, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.total_bars, 123);
        assert!((stats.success_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_stats_rate() {
        assert_eq!(CollectionStats::new().success_rate(), 0.0);
    }
}
