//! # Market Core
//!
//! 국내 주식 일봉 저장소의 핵심 도메인 레코드를 제공합니다.
//!
//! 이 크레이트는 수집 파이프라인 전반에서 사용되는 기본 타입을 제공합니다:
//! - 종목 및 시장 구분 (KOSPI / KOSDAQ / ALL)
//! - 일봉 및 시장 지수 레코드
//! - 기술적 지표 행
//! - 시장 등락 통계
//! - 로깅 인프라

pub mod domain;
pub mod error;
pub mod logging;

pub use domain::*;
pub use error::*;
pub use logging::*;
