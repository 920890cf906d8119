//! 수집 파이프라인을 위한 도메인 레코드.
//!
//! 모든 레코드는 순수 데이터이며, 저장/조회는 `market-data`의
//! repository trait을 통해서만 이루어집니다.

mod bar;
mod breadth;
mod indicator;
mod instrument;

pub use bar::*;
pub use breadth::*;
pub use indicator::*;
pub use instrument::*;
