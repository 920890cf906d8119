//! 기술적 지표 및 시장 등락 통계 계산.
//!
//! 이 crate는 저장소와 무관한 순수 계산만 담당합니다:
//! - 조회 구간 내 가격 차분 (변동폭, 변동률)
//! - 종목 일봉 이력 → 날짜별 기술적 지표 행
//! - 날짜별 일봉 요약 → 시장별 등락 통계

pub mod breadth;
pub mod differencing;
pub mod indicators;

pub use breadth::{aggregate_breadth, DailyBreadth};
pub use differencing::{window_changes, PriceChange};
pub use indicators::{IndicatorEngine, IndicatorError, IndicatorResult};
