//! Reordering of already-computed result sets.
//!
//! Every sorter returns a new, stably sorted vector and leaves its input
//! untouched.

use bhav_core::{AboveAverageRecord, Error, RankedRecord, StockRecord};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

/// Current-day volume and turnover of a result row.
pub trait VolumeMetrics {
    /// Shares traded.
    fn current_volume(&self) -> u64;
    /// Turnover in lakhs.
    fn current_turnover(&self) -> f64;
}

impl VolumeMetrics for StockRecord {
    fn current_volume(&self) -> u64 {
        self.total_traded_quantity
    }

    fn current_turnover(&self) -> f64 {
        self.turnover_lakhs
    }
}

impl VolumeMetrics for RankedRecord {
    fn current_volume(&self) -> u64 {
        self.record.total_traded_quantity
    }

    fn current_turnover(&self) -> f64 {
        self.record.turnover_lakhs
    }
}

impl VolumeMetrics for AboveAverageRecord {
    fn current_volume(&self) -> u64 {
        self.current_volume
    }

    fn current_turnover(&self) -> f64 {
        self.current_turnover
    }
}

pub fn sort_by_percent_above_average(items: &[AboveAverageRecord]) -> Vec<AboveAverageRecord> {
    let mut sorted = items.to_vec();
    sorted.sort_by_key(|r| Reverse(OrderedFloat(r.percent_above_average)));
    sorted
}

pub fn sort_by_turnover_asc<T: VolumeMetrics + Clone>(items: &[T]) -> Vec<T> {
    let mut sorted = items.to_vec();
    sorted.sort_by_key(|r| OrderedFloat(r.current_turnover()));
    sorted
}

pub fn sort_by_turnover_desc<T: VolumeMetrics + Clone>(items: &[T]) -> Vec<T> {
    let mut sorted = items.to_vec();
    sorted.sort_by_key(|r| Reverse(OrderedFloat(r.current_turnover())));
    sorted
}

pub fn sort_by_volume_asc<T: VolumeMetrics + Clone>(items: &[T]) -> Vec<T> {
    let mut sorted = items.to_vec();
    sorted.sort_by_key(|r| r.current_volume());
    sorted
}

pub fn sort_by_volume_desc<T: VolumeMetrics + Clone>(items: &[T]) -> Vec<T> {
    let mut sorted = items.to_vec();
    sorted.sort_by_key(|r| Reverse(r.current_volume()));
    sorted
}

/// Orderings offered for the above-average table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    PercentAbove,
    TurnoverDesc,
    TurnoverAsc,
    VolumeDesc,
    VolumeAsc,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::PercentAbove => "percent-above",
            SortKey::TurnoverDesc => "turnover-desc",
            SortKey::TurnoverAsc => "turnover-asc",
            SortKey::VolumeDesc => "volume-desc",
            SortKey::VolumeAsc => "volume-asc",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "percent-above" => Ok(SortKey::PercentAbove),
            "turnover-desc" => Ok(SortKey::TurnoverDesc),
            "turnover-asc" => Ok(SortKey::TurnoverAsc),
            "volume-desc" => Ok(SortKey::VolumeDesc),
            "volume-asc" => Ok(SortKey::VolumeAsc),
            other => Err(Error::data(format!("unknown sort key: {other}"))),
        }
    }
}

/// Reorder above-average results by the given key.
pub fn sort_results(items: &[AboveAverageRecord], key: SortKey) -> Vec<AboveAverageRecord> {
    match key {
        SortKey::PercentAbove => sort_by_percent_above_average(items),
        SortKey::TurnoverDesc => sort_by_turnover_desc(items),
        SortKey::TurnoverAsc => sort_by_turnover_asc(items),
        SortKey::VolumeDesc => sort_by_volume_desc(items),
        SortKey::VolumeAsc => sort_by_volume_asc(items),
    }
}
