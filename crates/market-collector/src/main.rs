//! 일봉 저장소 수집기 CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use market_collector::modules::{self, WorkflowReport};
use market_collector::{CollectorConfig, CollectorContext};
use market_core::logging::{init_logging, LogConfig};
use market_data::{Database, DatabaseConfig, MemoryStore, WarehouseStore};
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "market-collector")]
#[command(about = "KRX Daily Price Warehouse Collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// PostgreSQL 대신 메모리 저장소 사용 (dry run)
    #[arg(long)]
    memory: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 초기 적재 (카탈로그 → 일봉 → 지표 → 지수 → 등락 통계)
    Init {
        /// 수집 기간 (년)
        #[arg(long)]
        years: Option<u32>,
    },

    /// 일일 업데이트 (최근 N일 수집 후 지표 및 등락 통계 재계산)
    Update {
        /// 수집 기간 (일)
        #[arg(long)]
        days: Option<u32>,
    },

    /// 테이블별 현황 출력
    Status,

    /// 내장 종목 8개만으로 샘플 데이터 적재
    Sample {
        /// 수집 기간 (일)
        #[arg(long, default_value_t = 180)]
        days: u32,
    },

    /// 모든 활성 종목의 기술적 지표 재계산
    RecomputeIndicators,

    /// 전체 거래일의 등락 통계 재계산
    RecomputeBreadth,

    /// 종목 비활성화 (예: 005930.KS)
    Deactivate { symbol: String },

    /// 종목 활성화
    Activate { symbol: String },

    /// 데몬 모드: 주기적으로 일일 업데이트 실행
    Daemon,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(LogConfig::new(cli.log_level.clone()).with_env_format())
        .map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!("Market Collector 시작");

    let config = load_config(cli.memory)?;

    let database = if cli.memory {
        tracing::warn!("메모리 저장소 사용: 결과는 종료 시 사라집니다");
        None
    } else {
        let db_config = DatabaseConfig::new(config.database_url.clone())
            .with_max_connections(config.db_max_connections);
        let database = Database::connect(&db_config)
            .await
            .context("데이터베이스 연결 실패")?;
        database.migrate().await.context("마이그레이션 실패")?;
        database
            .health_check()
            .await
            .context("데이터베이스 상태 확인 실패")?;
        tracing::info!("데이터베이스 연결 성공");
        Some(database)
    };

    let store: Arc<dyn WarehouseStore> = match &database {
        Some(database) => Arc::new(database.clone()),
        None => Arc::new(MemoryStore::new()),
    };
    let ctx = CollectorContext::from_config(&config, store)?;
    let today = modules::today_in_seoul();

    let outcome = run(&cli.command, &ctx, &config, today).await;

    if let Some(database) = database {
        database.pool().close().await;
    }
    tracing::info!("Market Collector 종료");

    outcome
}

async fn run(
    command: &Commands,
    ctx: &CollectorContext,
    config: &CollectorConfig,
    today: chrono::NaiveDate,
) -> anyhow::Result<()> {
    match command {
        Commands::Init { years } => {
            let years = years.unwrap_or(config.workflow.backfill_years);
            let result = modules::backfill(ctx, years, today).await;
            finish_workflow(ctx, result).await
        }
        Commands::Update { days } => {
            let days = days.unwrap_or(config.workflow.update_days);
            let result = modules::incremental(ctx, days, today).await;
            finish_workflow(ctx, result).await
        }
        Commands::Sample { days } => {
            let result = modules::sample(ctx, *days, today).await;
            finish_workflow(ctx, result).await
        }
        Commands::Status => {
            print_status(ctx).await?;
            Ok(())
        }
        Commands::RecomputeIndicators => {
            modules::recompute_all_indicators(ctx).await?;
            Ok(())
        }
        Commands::RecomputeBreadth => {
            modules::recompute_breadth(ctx).await?;
            Ok(())
        }
        Commands::Deactivate { symbol } => {
            modules::set_instrument_active(ctx, symbol, false).await?;
            Ok(())
        }
        Commands::Activate { symbol } => {
            modules::set_instrument_active(ctx, symbol, true).await?;
            Ok(())
        }
        Commands::Daemon => {
            run_daemon(ctx, config).await;
            Ok(())
        }
    }
}

/// 워크플로우 성공 여부와 관계없이 현황을 출력합니다.
async fn finish_workflow(
    ctx: &CollectorContext,
    result: market_collector::Result<WorkflowReport>,
) -> anyhow::Result<()> {
    if let Err(e) = &result {
        tracing::error!(error = %e, "워크플로우 실패, 완료된 트랜잭션은 유지됩니다");
    }

    if let Err(e) = print_status(ctx).await {
        tracing::error!(error = %e, "현황 조회 실패");
    }

    result.map(|_| ()).map_err(Into::into)
}

async fn print_status(ctx: &CollectorContext) -> market_collector::Result<()> {
    let status = modules::collect_status(ctx).await?;
    println!("{}", modules::format_status(&status));
    Ok(())
}

async fn run_daemon(ctx: &CollectorContext, config: &CollectorConfig) {
    tracing::info!(
        "=== 데몬 모드 시작 (주기: {}분) ===",
        config.daemon.interval_minutes
    );

    let mut interval = tokio::time::interval(config.daemon.interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("종료 신호 수신, 데몬 종료 중...");
                break;
            }
            _ = interval.tick() => {
                let started = Instant::now();
                let today = modules::today_in_seoul();

                match modules::incremental(ctx, config.workflow.update_days, today).await {
                    Ok(_) => {}
                    Err(e) => tracing::error!(error = %e, "일일 업데이트 실패"),
                }

                tracing::info!(
                    elapsed = format!("{:.1}s", started.elapsed().as_secs_f64()),
                    "=== 워크플로우 완료, 다음 실행: {}분 후 ===",
                    config.daemon.interval_minutes
                );
            }
        }
    }
}

/// 메모리 저장소 모드에서는 DATABASE_URL 없이도 기본 설정으로 실행합니다.
fn load_config(memory: bool) -> anyhow::Result<CollectorConfig> {
    match CollectorConfig::from_env() {
        Ok(config) => Ok(config),
        Err(_) if memory => Ok(CollectorConfig::new("")),
        Err(e) => Err(e.into()),
    }
}
