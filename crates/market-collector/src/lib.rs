//! 국내 주식 일봉 저장소 수집기.
//!
//! 이 crate는 API 서버 없이 단독으로 실행되는 수집 바이너리를 제공합니다:
//! - 종목 카탈로그 동기화 (KRX)
//! - 일봉 수집 (Yahoo Finance)
//! - 기술적 지표 재계산
//! - 시장 지수 및 등락 통계

pub mod config;
pub mod context;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::CollectorConfig;
pub use context::CollectorContext;
pub use error::{CollectorError, Result};
pub use stats::{BreadthSummary, CatalogSyncStats, CollectionStats, InstrumentOutcome};
