//! 종목(Instrument) 및 시장 구분(Segment) 정의.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

/// 시장 구분.
///
/// KOSPI, KOSDAQ 두 개의 기본 시장과, 두 시장을 합산한 가상 시장 `ALL`로 구성됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Segment {
    /// 유가증권시장
    Kospi,
    /// 코스닥시장
    Kosdaq,
    /// 전체 시장 (KOSPI + KOSDAQ 합산)
    All,
}

impl Segment {
    /// 등락 통계를 직접 계산하는 기본 시장 목록.
    pub const PRIMARY: [Segment; 2] = [Segment::Kospi, Segment::Kosdaq];

    /// 기본 시장 여부 (`ALL`이 아닌 경우).
    pub fn is_primary(self) -> bool {
        !matches!(self, Segment::All)
    }

    /// DB 및 로그에 사용하는 문자열 표현.
    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Kospi => "KOSPI",
            Segment::Kosdaq => "KOSDAQ",
            Segment::All => "ALL",
        }
    }

    /// Yahoo Finance 티커 접미사 (예: 005930 → 005930.KS).
    pub fn symbol_suffix(self) -> Option<&'static str> {
        match self {
            Segment::Kospi => Some(".KS"),
            Segment::Kosdaq => Some(".KQ"),
            Segment::All => None,
        }
    }

    /// 시장 대표 지수의 Yahoo Finance 심볼.
    pub fn index_symbol(self) -> Option<&'static str> {
        match self {
            Segment::Kospi => Some("^KS11"),
            Segment::Kosdaq => Some("^KQ11"),
            Segment::All => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Segment {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "KOSPI" => Ok(Segment::Kospi),
            "KOSDAQ" => Ok(Segment::Kosdaq),
            "ALL" => Ok(Segment::All),
            other => Err(CoreError::UnknownSegment(other.to_string())),
        }
    }
}

/// 종목 카탈로그 항목.
///
/// 카탈로그 Provider가 반환한 종목 코드/이름을 Yahoo 티커 형식으로 정규화한 결과입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Provider용 티커 (예: 005930.KS)
    pub symbol: String,
    /// 거래소 종목 코드 (예: 005930)
    pub krx_code: String,
    /// 종목명
    pub name: String,
    /// 시장 구분
    pub segment: Segment,
}

impl CatalogEntry {
    /// 거래소 코드와 시장 구분으로 카탈로그 항목을 생성합니다.
    pub fn new(krx_code: impl Into<String>, name: impl Into<String>, segment: Segment) -> Self {
        let krx_code = krx_code.into();
        let symbol = format!("{}{}", krx_code, segment.symbol_suffix().unwrap_or_default());
        Self {
            symbol,
            krx_code,
            name: name.into(),
            segment,
        }
    }
}

/// 종목 부가 정보 (섹터, 산업, 설명).
///
/// 보조 정보원에서 best-effort로 수집되며, 실패 시 빈 문자열로 저장됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentProfile {
    pub sector: String,
    pub industry: String,
    pub description: String,
}

/// 신규 종목 등록 요청.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInstrument {
    pub entry: CatalogEntry,
    pub profile: InstrumentProfile,
}

/// 저장된 종목.
///
/// 식별자는 `symbol`이며 한번 부여되면 변경되지 않습니다.
/// 종목은 삭제되지 않고 `is_active`로만 비활성화됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// 저장소가 부여한 ID
    pub id: Uuid,
    /// Provider용 티커 (고유)
    pub symbol: String,
    /// 거래소 종목 코드
    pub krx_code: String,
    /// 종목명
    pub name: String,
    /// 시장 구분
    pub segment: Segment,
    /// 활성 여부
    pub is_active: bool,
    pub sector: String,
    pub industry: String,
    pub description: String,
}

impl Instrument {
    /// 신규 등록 요청으로부터 활성 종목을 생성합니다.
    pub fn from_new(id: Uuid, new: NewInstrument) -> Self {
        Self {
            id,
            symbol: new.entry.symbol,
            krx_code: new.entry.krx_code,
            name: new.entry.name,
            segment: new.entry.segment,
            is_active: true,
            sector: new.profile.sector,
            industry: new.profile.industry,
            description: new.profile.description,
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.symbol)
    }
}
