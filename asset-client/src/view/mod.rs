//! Pure derived views over a loaded record set and the current preferences.
//!
//! Nothing here caches or mutates; every function can be re-run on each
//! preference change.

pub mod chart;
pub mod selection;
pub mod stats;
pub mod table;

pub use chart::{chart_data, ChartData, ChartRow, Series, SERIES_COLOURS};
pub use selection::{SelectionState, eligible, select_all, toggle};
pub use stats::{summary_stats, SummaryStats};
pub use table::{facets, filter_records, table_view, TableFilter, TableView};
