//! Market-wide summary for one trading day.

use bhav_core::{MarketSummary, StockRecord, LAKHS_PER_CRORE};
use std::collections::HashSet;

/// Count distinct symbols, gainers and losers, and total turnover in crores.
///
/// Unchanged closes count as neither gainer nor loser.
pub fn summarize(records: &[StockRecord]) -> MarketSummary {
    let symbols: HashSet<&str> = records.iter().map(|r| r.symbol.as_str()).collect();

    let mut gainers = 0;
    let mut losers = 0;
    let mut turnover_lakhs = 0.0;
    for record in records {
        if record.is_gainer() {
            gainers += 1;
        } else if record.is_loser() {
            losers += 1;
        }
        turnover_lakhs += record.turnover_lakhs;
    }

    MarketSummary {
        total_stocks: symbols.len(),
        gainers,
        losers,
        total_volume_cr: turnover_lakhs / LAKHS_PER_CRORE,
    }
}
