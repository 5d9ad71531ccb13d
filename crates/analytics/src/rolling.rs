//! Trailing average-volume comparison across pooled snapshots.
//!
//! Records from many days are grouped by symbol and ordered by date. The
//! latest record of each symbol ("today") is compared against the mean of
//! the `lookback` records immediately before it. Symbols with fewer than
//! `lookback + 1` records are skipped; no partial window is ever averaged.

use bhav_core::{AboveAverageRecord, StockRecord};
use ordered_float::OrderedFloat;
use statrs::statistics::Statistics;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::debug;

/// Outcome of evaluating one symbol's history.
enum Evaluation {
    Above(AboveAverageRecord),
    NotAbove,
    /// Today traded but the trailing window never did; the ratio is undefined.
    ZeroBaseline,
}

/// Flags symbols whose latest volume beats their trailing average.
#[derive(Debug, Clone, Copy)]
pub struct RollingVolumeAnalyzer {
    lookback: usize,
}

impl RollingVolumeAnalyzer {
    /// Twenty-one trading days, roughly one calendar month.
    pub const DEFAULT_LOOKBACK: usize = 21;

    /// Create an analyzer averaging over `lookback` prior records (minimum 1).
    pub fn new(lookback: usize) -> Self {
        Self {
            lookback: lookback.max(1),
        }
    }

    /// Records in the trailing window.
    pub fn lookback(&self) -> usize {
        self.lookback
    }

    /// Records a symbol needs before it is evaluated.
    pub fn min_history(&self) -> usize {
        self.lookback.saturating_add(1)
    }

    /// Evaluate every symbol in the pool.
    ///
    /// Returns one entry per symbol whose latest traded quantity is strictly
    /// above its trailing mean, sorted by percent above average, highest
    /// first. Equal percentages are ordered by symbol.
    pub fn compute(&self, pooled: &[StockRecord]) -> Vec<AboveAverageRecord> {
        let mut groups: BTreeMap<&str, Vec<&StockRecord>> = BTreeMap::new();
        for record in pooled {
            groups.entry(record.symbol.as_str()).or_default().push(record);
        }

        let mut results = Vec::new();
        let mut short_history = 0usize;
        let mut zero_baseline = 0usize;

        for history in groups.values_mut() {
            if history.len() < self.min_history() {
                short_history += 1;
                continue;
            }
            history.sort_by_key(|r| r.date);

            match self.evaluate(history) {
                Evaluation::Above(entry) => results.push(entry),
                Evaluation::NotAbove => {}
                Evaluation::ZeroBaseline => zero_baseline += 1,
            }
        }

        results.sort_by_key(|r| Reverse(OrderedFloat(r.percent_above_average)));

        debug!(
            records = pooled.len(),
            symbols = groups.len(),
            short_history,
            zero_baseline,
            above_average = results.len(),
            lookback = self.lookback,
            "computed trailing volume comparison"
        );

        results
    }

    /// Compare the last record against the window before it.
    ///
    /// `history` must be date-ordered and hold at least `min_history` records.
    fn evaluate(&self, history: &[&StockRecord]) -> Evaluation {
        let len = history.len();
        let today = history[len - 1];
        let window = &history[len - 1 - self.lookback..len - 1];

        let average_volume = window
            .iter()
            .map(|r| r.total_traded_quantity as f64)
            .mean();
        let average_turnover = window.iter().map(|r| r.turnover_lakhs).mean();

        let current_volume = today.total_traded_quantity;
        if current_volume as f64 <= average_volume {
            return Evaluation::NotAbove;
        }
        if average_volume <= 0.0 {
            return Evaluation::ZeroBaseline;
        }

        Evaluation::Above(AboveAverageRecord {
            record: today.clone(),
            trailing_average_volume: average_volume,
            trailing_average_turnover: average_turnover,
            current_volume,
            current_turnover: today.turnover_lakhs,
            percent_above_average: (current_volume as f64 - average_volume) / average_volume
                * 100.0,
            history_depth: len,
        })
    }
}

impl Default for RollingVolumeAnalyzer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LOOKBACK)
    }
}

/// Symbols whose latest volume beats their 21-day trailing average.
pub fn compute_above_average(pooled: &[StockRecord]) -> Vec<AboveAverageRecord> {
    RollingVolumeAnalyzer::default().compute(pooled)
}
