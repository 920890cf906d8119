//! KRX 정보데이터시스템 종목 카탈로그 Provider.
//!
//! `data.krx.co.kr`의 전종목 기본정보(MDCSTAT01501) 화면 API를 사용합니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use market_core::Segment;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{CatalogListing, CatalogProvider};
use crate::error::ProviderResult;

/// KRX 정보데이터시스템 기본 주소.
pub const DEFAULT_KRX_BASE_URL: &str = "http://data.krx.co.kr";

const KRX_JSON_PATH: &str = "/comm/bldAttendant/getJsonData.cmd";
const KRX_LISTING_BLD: &str = "dbms/MDC/STAT/standard/MDCSTAT01501";

/// KRX 종목 카탈로그 Provider.
pub struct KrxCatalogProvider {
    client: reqwest::Client,
    base_url: String,
}

impl KrxCatalogProvider {
    /// 기본 주소로 생성합니다.
    pub fn new() -> ProviderResult<Self> {
        Self::with_base_url(DEFAULT_KRX_BASE_URL)
    }

    /// 지정한 주소로 생성합니다 (테스트 서버 등).
    pub fn with_base_url(base_url: impl Into<String>) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn market_id(segment: Segment) -> Option<&'static str> {
        match segment {
            Segment::Kospi => Some("STK"),
            Segment::Kosdaq => Some("KSQ"),
            Segment::All => None,
        }
    }
}

#[derive(Deserialize)]
struct KrxResponse {
    #[serde(rename = "OutBlock_1")]
    out_block: Option<Vec<KrxStock>>,
}

#[derive(Deserialize)]
struct KrxStock {
    #[serde(rename = "ISU_SRT_CD")]
    code: String,
    #[serde(rename = "ISU_ABBRV")]
    name: String,
}

#[async_trait]
impl CatalogProvider for KrxCatalogProvider {
    fn name(&self) -> &str {
        "KRX"
    }

    async fn list_instruments(
        &self,
        as_of: NaiveDate,
        segment: Segment,
    ) -> ProviderResult<Vec<CatalogListing>> {
        let Some(market_id) = Self::market_id(segment) else {
            return Ok(Vec::new());
        };

        let trade_date = as_of.format("%Y%m%d").to_string();
        let params = [
            ("bld", KRX_LISTING_BLD),
            ("mktId", market_id),
            ("trdDd", trade_date.as_str()),
            ("share", "1"),
            ("csvxls_isNo", "false"),
        ];

        debug!(segment = %segment, trade_date = %trade_date, "KRX 종목 목록 요청");

        let response = self
            .client
            .post(format!("{}{}", self.base_url, KRX_JSON_PATH))
            .form(&params)
            .send()
            .await?
            .error_for_status()?;

        let data: KrxResponse = response.json().await?;

        let listings: Vec<CatalogListing> = data
            .out_block
            .unwrap_or_default()
            .into_iter()
            .filter(|s| !s.code.trim().is_empty())
            .map(|s| CatalogListing {
                code: s.code.trim().to_string(),
                name: s.name.trim().to_string(),
            })
            .collect();

        info!(segment = %segment, count = listings.len(), "KRX 종목 목록 수신");
        Ok(listings)
    }
}
