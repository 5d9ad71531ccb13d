//! Analytics engine.
//!
//! Combines the single-day aggregations and the rolling comparison behind
//! one configuration-driven interface.

use crate::{
    rankings::{top_by_traded_quantity, top_by_turnover, top_gainers, top_losers},
    rolling::RollingVolumeAnalyzer,
    summary::summarize,
};
use bhav_core::{AboveAverageRecord, Config, MarketSummary, RankedRecord, StockRecord};
use serde::{Deserialize, Serialize};

/// Everything shown for one trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayReport {
    pub summary: MarketSummary,
    pub top_gainers: Vec<RankedRecord>,
    pub top_losers: Vec<RankedRecord>,
    pub top_turnover: Vec<StockRecord>,
    pub most_traded: Vec<StockRecord>,
}

/// Configured analytics over day and pooled record sets.
#[derive(Debug, Clone)]
pub struct MarketAnalytics {
    /// Entries per ranking.
    top_n: usize,
    /// Rolling comparison.
    rolling: RollingVolumeAnalyzer,
}

impl MarketAnalytics {
    /// Create an engine from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            top_n: config.analytics.top_n,
            rolling: RollingVolumeAnalyzer::new(config.analytics.lookback_days),
        }
    }

    /// Entries kept by each ranking.
    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// The rolling analyzer in use.
    pub fn rolling(&self) -> &RollingVolumeAnalyzer {
        &self.rolling
    }

    /// Summary and rankings for one day's records.
    pub fn day_report(&self, records: &[StockRecord]) -> DayReport {
        DayReport {
            summary: summarize(records),
            top_gainers: top_gainers(records, self.top_n),
            top_losers: top_losers(records, self.top_n),
            top_turnover: top_by_turnover(records, self.top_n),
            most_traded: top_by_traded_quantity(records, self.top_n),
        }
    }

    /// Trailing-average comparison over records pooled from many days.
    pub fn above_average(&self, pooled: &[StockRecord]) -> Vec<AboveAverageRecord> {
        self.rolling.compute(pooled)
    }
}

impl Default for MarketAnalytics {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
