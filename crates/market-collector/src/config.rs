//! 환경변수 기반 설정 모듈.

use market_data::provider::krx::DEFAULT_KRX_BASE_URL;
use market_data::DEFAULT_FETCH_TIMEOUT_SECS;
use std::time::Duration;

use crate::error::CollectorError;
use crate::Result;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 URL
    pub database_url: String,
    /// DB 연결 풀 최대 크기
    pub db_max_connections: u32,
    /// 카탈로그 동기화 설정
    pub catalog: CatalogConfig,
    /// 일봉 수집 설정
    pub collect: CollectConfig,
    /// 워크플로우 기본값
    pub workflow: WorkflowConfig,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
}

/// 카탈로그 동기화 설정
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// KRX 정보데이터시스템 주소
    pub krx_base_url: String,
    /// 신규 종목 부가 정보(섹터/산업/설명) 수집 여부
    pub profile_enrichment: bool,
}

/// 일봉 수집 설정
#[derive(Debug, Clone)]
pub struct CollectConfig {
    /// 동시 처리 종목 수
    pub concurrency: usize,
    /// Provider 호출 타임아웃 (초)
    pub fetch_timeout_secs: u64,
}

/// 워크플로우 기본값
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// `init` 기본 수집 기간 (년)
    pub backfill_years: u32,
    /// `update` 기본 수집 기간 (일)
    pub update_days: u32,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 워크플로우 실행 주기 (분 단위)
    pub interval_minutes: u64,
}

impl CollectorConfig {
    /// 기본값으로 설정을 생성합니다.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            db_max_connections: 10,
            catalog: CatalogConfig {
                krx_base_url: DEFAULT_KRX_BASE_URL.to_string(),
                profile_enrichment: true,
            },
            collect: CollectConfig {
                concurrency: 10,
                fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            },
            workflow: WorkflowConfig {
                backfill_years: 3,
                update_days: 2,
            },
            daemon: DaemonConfig {
                interval_minutes: 1440,
            },
        }
    }

    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            CollectorError::Config("DATABASE_URL 환경변수가 설정되지 않았습니다".to_string())
        })?;

        let defaults = Self::new(database_url);

        Ok(Self {
            db_max_connections: env_var_parse("DB_MAX_CONNECTIONS", defaults.db_max_connections),
            catalog: CatalogConfig {
                krx_base_url: std::env::var("KRX_BASE_URL")
                    .unwrap_or(defaults.catalog.krx_base_url.clone()),
                profile_enrichment: env_var_bool(
                    "PROFILE_ENRICHMENT",
                    defaults.catalog.profile_enrichment,
                ),
            },
            collect: CollectConfig {
                concurrency: env_var_parse("COLLECTOR_CONCURRENCY", defaults.collect.concurrency)
                    .max(1),
                fetch_timeout_secs: env_var_parse(
                    "FETCH_TIMEOUT_SECS",
                    defaults.collect.fetch_timeout_secs,
                ),
            },
            workflow: WorkflowConfig {
                backfill_years: env_var_parse(
                    "DEFAULT_BACKFILL_YEARS",
                    defaults.workflow.backfill_years,
                ),
                update_days: env_var_parse("DEFAULT_UPDATE_DAYS", defaults.workflow.update_days),
            },
            daemon: DaemonConfig {
                interval_minutes: env_var_parse(
                    "DAEMON_INTERVAL_MINUTES",
                    defaults.daemon.interval_minutes,
                ),
            },
            ..defaults
        })
    }
}

impl CollectConfig {
    /// Provider 호출 타임아웃을 Duration으로 반환
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl DaemonConfig {
    /// 워크플로우 실행 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.max(1) * 60)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 bool 값 파싱
fn env_var_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}
