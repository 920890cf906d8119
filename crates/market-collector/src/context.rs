//! 수집 작업 공용 컨텍스트.
//!
//! 저장소 핸들과 외부 Provider, 지표 엔진을 묶어 각 수집 모듈에 전달합니다.

use market_analytics::IndicatorEngine;
use market_data::{
    CatalogProvider, KrxCatalogProvider, MarketDataProvider, PriceFetcher, ProfileProvider,
    WarehouseStore, YahooMarketData, YahooProfileProvider,
};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CollectorConfig;
use crate::Result;

/// 기본 동시 처리 종목 수.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// 수집 컨텍스트.
pub struct CollectorContext {
    pub store: Arc<dyn WarehouseStore>,
    pub catalog: Arc<dyn CatalogProvider>,
    /// 신규 종목 부가 정보 Provider (없으면 빈 값으로 등록)
    pub profiles: Option<Arc<dyn ProfileProvider>>,
    pub fetcher: PriceFetcher,
    pub engine: IndicatorEngine,
    /// 동시 처리 종목 수
    pub concurrency: usize,
}

impl CollectorContext {
    pub fn new(
        store: Arc<dyn WarehouseStore>,
        catalog: Arc<dyn CatalogProvider>,
        market_data: Arc<dyn MarketDataProvider>,
    ) -> Self {
        Self {
            store,
            catalog,
            profiles: None,
            fetcher: PriceFetcher::new(market_data),
            engine: IndicatorEngine::new(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// 설정에 따라 KRX / Yahoo Finance Provider로 컨텍스트를 구성합니다.
    pub fn from_config(config: &CollectorConfig, store: Arc<dyn WarehouseStore>) -> Result<Self> {
        let catalog = Arc::new(KrxCatalogProvider::with_base_url(
            config.catalog.krx_base_url.clone(),
        )?);
        let market_data = Arc::new(YahooMarketData::new()?);

        let mut context = Self::new(store, catalog, market_data)
            .with_concurrency(config.collect.concurrency)
            .with_fetch_timeout(config.collect.fetch_timeout());

        if config.catalog.profile_enrichment {
            context = context.with_profiles(Arc::new(YahooProfileProvider::new()?));
        }

        Ok(context)
    }

    pub fn with_profiles(mut self, profiles: Arc<dyn ProfileProvider>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetcher = self.fetcher.with_timeout(timeout);
        self
    }
}
