//! Top-N rankings for one trading day.
//!
//! All rankings copy their input and sort stably, so ties keep the order
//! they had in the input slice.

use bhav_core::{RankedRecord, StockRecord};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;

/// Attach the rate of change to each record, preserving order.
pub fn with_rate_of_change(records: &[StockRecord]) -> Vec<RankedRecord> {
    records.iter().cloned().map(RankedRecord::from).collect()
}

/// Highest rate of change first.
pub fn top_gainers(records: &[StockRecord], n: usize) -> Vec<RankedRecord> {
    let mut ranked = with_rate_of_change(records);
    ranked.sort_by_key(|r| Reverse(OrderedFloat(r.rate_of_change_pct)));
    ranked.truncate(n);
    ranked
}

/// Lowest rate of change first.
pub fn top_losers(records: &[StockRecord], n: usize) -> Vec<RankedRecord> {
    let mut ranked = with_rate_of_change(records);
    ranked.sort_by_key(|r| OrderedFloat(r.rate_of_change_pct));
    ranked.truncate(n);
    ranked
}

/// Highest turnover first.
pub fn top_by_turnover(records: &[StockRecord], n: usize) -> Vec<StockRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| Reverse(OrderedFloat(r.turnover_lakhs)));
    sorted.truncate(n);
    sorted
}

/// Highest traded quantity first.
pub fn top_by_traded_quantity(records: &[StockRecord], n: usize) -> Vec<StockRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| Reverse(r.total_traded_quantity));
    sorted.truncate(n);
    sorted
}
