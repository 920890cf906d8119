//! 데이터 수집 모듈.

pub mod breadth_sync;
pub mod catalog_sync;
pub mod index_collect;
pub mod indicator_sync;
pub mod price_collect;
pub mod status;
pub mod workflow;

pub use breadth_sync::{recompute_breadth, recompute_breadth_day};
pub use catalog_sync::{
    builtin_entries, seed_builtin, set_instrument_active, sync_catalog, BUILTIN_INSTRUMENTS,
};
pub use index_collect::collect_index_bars;
pub use indicator_sync::{recompute_all_indicators, recompute_indicators};
pub use price_collect::{collect_instrument, collect_prices};
pub use status::{collect_status, format_status};
pub use workflow::{backfill, incremental, sample, today_in_seoul, WorkflowReport};
