//! Market analytics for the bhav analytics system.
//!
//! This crate handles:
//! - Single-day market summary (distinct symbols, gainers, losers, turnover)
//! - Top-N rankings by rate of change, turnover and traded quantity
//! - Trailing average-volume comparison across pooled snapshots
//! - Reordering of result sets

pub mod engine;
pub mod rankings;
pub mod rolling;
pub mod sorter;
pub mod summary;

pub use engine::{DayReport, MarketAnalytics};
pub use rankings::{
    top_by_traded_quantity, top_by_turnover, top_gainers, top_losers, with_rate_of_change,
};
pub use rolling::{compute_above_average, RollingVolumeAnalyzer};
pub use sorter::{
    sort_by_percent_above_average, sort_by_turnover_asc, sort_by_turnover_desc,
    sort_by_volume_asc, sort_by_volume_desc, sort_results, SortKey, VolumeMetrics,
};
pub use summary::summarize;
