//! tablero-ingest: wide category timeline CSV → long transaction log.

pub mod log;
pub mod period;
pub mod timeline;
pub mod types;

pub use log::{build_transaction_log, summarize, to_long, validate_duplicates};
pub use period::{PeriodParser, month_name, month_number};
pub use timeline::{parse_timeline, read_timeline_csv};
pub use types::{LogSummary, TimelineRow, WideTimeline};
