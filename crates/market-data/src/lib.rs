//! 시장 데이터 수집 및 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - 외부 데이터 Provider trait과 KRX / Yahoo Finance 구현
//! - 원시 일봉 정규화 ([`PriceFetcher`])
//! - 웨어하우스 repository trait과 PostgreSQL / 메모리 구현

pub mod error;
pub mod fetcher;
pub mod provider;
pub mod storage;

pub use error::{DataError, ProviderError, ProviderResult, Result};
pub use fetcher::{PriceFetcher, DEFAULT_FETCH_TIMEOUT_SECS};
pub use provider::{
    CatalogListing, CatalogProvider, KrxCatalogProvider, MarketDataProvider, ProfileProvider,
    RawQuote, YahooMarketData, YahooProfileProvider,
};
pub use storage::{
    Database, DatabaseConfig, IndicatorRepository, InstrumentRepository, MarketRepository,
    MemoryStore, PriceRepository, StatusRepository, TableStatus, WarehouseStore,
};
