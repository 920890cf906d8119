//! 저장소 현황 요약.

use market_data::{StatusRepository, TableStatus};
use std::fmt::Write;

use crate::context::CollectorContext;
use crate::Result;

/// 테이블별 행 수와 최근 날짜를 조회합니다.
pub async fn collect_status(ctx: &CollectorContext) -> Result<Vec<TableStatus>> {
    Ok(ctx.store.table_status().await?)
}

/// 현황을 표 형태의 문자열로 만듭니다.
pub fn format_status(status: &[TableStatus]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<24} {:>12}  {}", "table", "rows", "latest");

    for entry in status {
        let latest = entry
            .latest_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(out, "{:<24} {:>12}  {}", entry.table, entry.rows, latest);
    }

    out
}
