//! Yahoo Finance Provider.
//!
//! - 일봉: `yahoo_finance_api` 커넥터
//! - 종목 부가 정보: quoteSummary `assetProfile` 모듈 (reqwest)

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate};
use chrono_tz::Asia::Seoul;
use market_core::InstrumentProfile;
use serde::Deserialize;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api::YahooError;

use super::{MarketDataProvider, ProfileProvider, RawQuote};
use crate::error::{ProviderError, ProviderResult};

/// Yahoo Finance 일봉 Provider.
pub struct YahooMarketData {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooMarketData {
    pub fn new() -> ProviderResult<Self> {
        let connector = yahoo_finance_api::YahooConnector::new().map_err(|e| {
            ProviderError::Unavailable(format!("Yahoo Finance 연결 실패: {}", e))
        })?;
        Ok(Self { connector })
    }

    async fn daily_quotes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<Vec<RawQuote>> {
        // Yahoo의 종료 시각은 배타적이므로 하루를 더함
        let start_at = naive_date_to_offset_datetime(start)?;
        let end_at = naive_date_to_offset_datetime(end + ChronoDuration::days(1))?;

        debug!(symbol = symbol, start = %start, end = %end, "Yahoo Finance 일봉 요청");

        let response = match self
            .connector
            .get_quote_history_interval(symbol, start_at, end_at, "1d")
            .await
        {
            Ok(response) => response,
            Err(e) if is_empty_response(&e) => {
                debug!(symbol = symbol, "Yahoo Finance 응답에 일봉 없음");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(ProviderError::RequestError(format!(
                    "Yahoo Finance API 오류 ({}): {}",
                    symbol, e
                )))
            }
        };

        let quotes = match response.quotes() {
            Ok(quotes) => quotes,
            Err(e) if is_empty_response(&e) => return Ok(Vec::new()),
            Err(e) => return Err(ProviderError::ParseError(format!("Quote 파싱 오류: {}", e))),
        };

        quotes
            .iter()
            .map(|q| {
                let date = trading_date(q.timestamp as i64).ok_or_else(|| {
                    ProviderError::ParseError(format!("잘못된 timestamp: {}", q.timestamp))
                })?;
                Ok::<_, ProviderError>(RawQuote {
                    date,
                    open: Some(q.open),
                    high: Some(q.high),
                    low: Some(q.low),
                    close: Some(q.close),
                    adjusted_close: Some(q.adjclose),
                    volume: i64::try_from(q.volume).ok(),
                })
            })
            .collect()
    }
}

/// 상장 폐지나 휴장 구간처럼 결과가 비어 있을 뿐인 오류.
fn is_empty_response(error: &YahooError) -> bool {
    matches!(
        error,
        YahooError::NoResult | YahooError::NoQuotes | YahooError::EmptyDataSet
    )
}

#[async_trait]
impl MarketDataProvider for YahooMarketData {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    async fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<Vec<RawQuote>> {
        self.daily_quotes(symbol, start, end).await
    }

    async fn fetch_daily_series(
        &self,
        index_symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ProviderResult<Vec<RawQuote>> {
        self.daily_quotes(index_symbol, start, end).await
    }
}

/// Yahoo Finance quoteSummary 기본 주소.
pub const DEFAULT_YAHOO_SUMMARY_URL: &str = "https://query2.finance.yahoo.com";

/// DB 컬럼 길이 제한 (sector, industry).
const PROFILE_FIELD_MAX_CHARS: usize = 100;

/// Yahoo Finance 종목 부가 정보 Provider.
pub struct YahooProfileProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooProfileProvider {
    pub fn new() -> ProviderResult<Self> {
        Self::with_base_url(DEFAULT_YAHOO_SUMMARY_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("Mozilla/5.0")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Deserialize)]
struct SummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryBody,
}

#[derive(Deserialize)]
struct SummaryBody {
    #[serde(default)]
    result: Option<Vec<SummaryResult>>,
}

#[derive(Deserialize)]
struct SummaryResult {
    #[serde(rename = "assetProfile")]
    asset_profile: Option<AssetProfile>,
}

#[derive(Deserialize)]
struct AssetProfile {
    #[serde(default)]
    sector: Option<String>,
    #[serde(default)]
    industry: Option<String>,
    #[serde(rename = "longBusinessSummary", default)]
    long_business_summary: Option<String>,
}

#[async_trait]
impl ProfileProvider for YahooProfileProvider {
    async fn fetch_profile(&self, symbol: &str) -> ProviderResult<InstrumentProfile> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, symbol);

        let response = self
            .client
            .get(url)
            .query(&[("modules", "assetProfile")])
            .send()
            .await?
            .error_for_status()?;

        let body: SummaryResponse = response.json().await?;

        let profile = body
            .quote_summary
            .result
            .unwrap_or_default()
            .into_iter()
            .find_map(|r| r.asset_profile)
            .ok_or_else(|| ProviderError::ParseError(format!("assetProfile 없음: {}", symbol)))?;

        Ok(InstrumentProfile {
            sector: clip(profile.sector.unwrap_or_default()),
            industry: clip(profile.industry.unwrap_or_default()),
            description: profile.long_business_summary.unwrap_or_default(),
        })
    }
}

fn clip(value: String) -> String {
    if value.chars().count() <= PROFILE_FIELD_MAX_CHARS {
        value
    } else {
        value.chars().take(PROFILE_FIELD_MAX_CHARS).collect()
    }
}

/// Yahoo 일봉 timestamp를 한국 거래일로 변환합니다.
fn trading_date(timestamp: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0).map(|utc| utc.with_timezone(&Seoul).date_naive())
}

fn naive_date_to_offset_datetime(date: NaiveDate) -> ProviderResult<OffsetDateTime> {
    let invalid = |e: String| ProviderError::ParseError(format!("날짜 변환 실패 ({}): {}", date, e));

    let month = u8::try_from(date.month())
        .map_err(|e| invalid(e.to_string()))
        .and_then(|m| time::Month::try_from(m).map_err(|e| invalid(e.to_string())))?;
    let day = u8::try_from(date.day()).map_err(|e| invalid(e.to_string()))?;

    let calendar_date = time::Date::from_calendar_date(date.year(), month, day)
        .map_err(|e| invalid(e.to_string()))?;

    Ok(calendar_date.midnight().assume_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trading_date_uses_seoul_calendar() {
        // 2024-05-02 00:00 UTC = 2024-05-02 09:00 KST (장 시작)
        assert_eq!(
            trading_date(1_714_608_000),
            NaiveDate::from_ymd_opt(2024, 5, 2)
        );
        // 2024-05-01 16:00 UTC = 2024-05-02 01:00 KST
        assert_eq!(
            trading_date(1_714_579_200),
            NaiveDate::from_ymd_opt(2024, 5, 2)
        );
    }

    #[test]
    fn test_missing_series_is_empty_not_error() {
        assert!(is_empty_response(&YahooError::NoResult));
        assert!(is_empty_response(&YahooError::NoQuotes));
        assert!(is_empty_response(&YahooError::EmptyDataSet));
        assert!(!is_empty_response(&YahooError::FetchFailed(
            "500 Internal Server Error".to_string()
        )));
        assert!(!is_empty_response(&YahooError::DataInconsistency));
    }

    #[test]
    fn test_offset_datetime_conversion() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let converted = naive_date_to_offset_datetime(date).unwrap();
        assert_eq!(converted.unix_timestamp(), 1_709_164_800);
    }

    #[tokio::test]
    async fn test_fetch_profile_reads_asset_profile() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v10/finance/quoteSummary/005930.KS")
            .match_query(mockito::Matcher::UrlEncoded(
                "modules".into(),
                "assetProfile".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"quoteSummary":{"result":[{"assetProfile":{
                    "sector":"Technology",
                    "industry":"Consumer Electronics",
                    "longBusinessSummary":"Samsung Electronics Co., Ltd. engages in the consumer electronics business."
                }}],"error":null}}"#,
            )
            .create_async()
            .await;

        let provider = YahooProfileProvider::with_base_url(server.url()).unwrap();
        let profile = provider.fetch_profile("005930.KS").await.unwrap();

        assert_eq!(profile.sector, "Technology");
        assert_eq!(profile.industry, "Consumer Electronics");
        assert!(profile.description.starts_with("Samsung Electronics"));
    }

    #[tokio::test]
    async fn test_fetch_profile_missing_result_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"quoteSummary":{"result":null,"error":{"code":"Not Found"}}}"#)
            .create_async()
            .await;

        let provider = YahooProfileProvider::with_base_url(server.url()).unwrap();
        assert!(provider.fetch_profile("999999.KS").await.is_err());
    }

    #[test]
    fn test_clip_long_field() {
        let long = "가".repeat(150);
        assert_eq!(clip(long).chars().count(), PROFILE_FIELD_MAX_CHARS);
        assert_eq!(clip("Industrials".to_string()), "Industrials");
    }
}
