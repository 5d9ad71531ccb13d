//! Core data types for end-of-day equity snapshots.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Series code for ordinary equity shares.
pub const EQUITY_SERIES: &str = "EQ";

/// Lakhs per crore (1 Cr = 100 Lakhs).
pub const LAKHS_PER_CRORE: f64 = 100.0;

/// Date used when a trading date cannot be determined.
#[inline]
pub fn epoch_date() -> NaiveDate {
    NaiveDate::default()
}

/// One symbol's end-of-day figures for a single trading date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    /// Ticker symbol.
    pub symbol: String,
    /// Series code as it appeared in the file (always `EQ` after parsing).
    pub series: String,
    /// Trading date.
    pub date: NaiveDate,
    /// Previous session's close.
    pub prev_close: f64,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Last traded price.
    pub last: f64,
    /// Close price.
    pub close: f64,
    /// Volume-weighted average price.
    pub avg_price: f64,
    /// Shares traded in the session.
    pub total_traded_quantity: u64,
    /// Traded value in lakhs.
    pub turnover_lakhs: f64,
    /// Number of trades.
    pub number_of_trades: u64,
    /// Delivered quantity.
    pub delivery_quantity: f64,
    /// Delivered quantity as a percentage of traded quantity.
    pub delivery_percent: f64,
}

impl StockRecord {
    /// Create a record with every numeric field zeroed.
    pub fn new(symbol: impl Into<String>, series: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            series: series.into(),
            date,
            prev_close: 0.0,
            open: 0.0,
            high: 0.0,
            low: 0.0,
            last: 0.0,
            close: 0.0,
            avg_price: 0.0,
            total_traded_quantity: 0,
            turnover_lakhs: 0.0,
            number_of_trades: 0,
            delivery_quantity: 0.0,
            delivery_percent: 0.0,
        }
    }

    /// Whether this row belongs to the equity series.
    #[inline]
    pub fn is_equity(&self) -> bool {
        self.series.trim().eq_ignore_ascii_case(EQUITY_SERIES)
    }

    /// Day-over-day change in percent: (close - prev_close) / prev_close * 100.
    ///
    /// A zero previous close is replaced by a denominator of 1 so the value
    /// stays finite. This is an approximation, not a real percentage.
    #[inline]
    pub fn rate_of_change_pct(&self) -> f64 {
        let denom = if self.prev_close == 0.0 { 1.0 } else { self.prev_close };
        (self.close - self.prev_close) / denom * 100.0
    }

    /// Closed above the previous close.
    #[inline]
    pub fn is_gainer(&self) -> bool {
        self.close > self.prev_close
    }

    /// Closed below the previous close.
    #[inline]
    pub fn is_loser(&self) -> bool {
        self.close < self.prev_close
    }
}

/// All records parsed from one uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySnapshot {
    /// Source filename.
    pub filename: String,
    /// Trading date the file covers.
    pub trading_date: NaiveDate,
    /// Equity records in file order.
    pub records: Vec<StockRecord>,
}

impl DailySnapshot {
    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the snapshot holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Market-wide statistics for one trading day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    /// Distinct symbols.
    pub total_stocks: usize,
    /// Records with close > prev_close.
    pub gainers: usize,
    /// Records with close < prev_close.
    pub losers: usize,
    /// Total turnover in crores.
    pub total_volume_cr: f64,
}

/// A record with its rate of change attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRecord {
    pub record: StockRecord,
    /// See [`StockRecord::rate_of_change_pct`].
    pub rate_of_change_pct: f64,
}

impl From<StockRecord> for RankedRecord {
    fn from(record: StockRecord) -> Self {
        let rate_of_change_pct = record.rate_of_change_pct();
        Self {
            record,
            rate_of_change_pct,
        }
    }
}

/// A symbol whose latest volume beat its trailing average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AboveAverageRecord {
    /// The latest ("today") record for the symbol.
    pub record: StockRecord,
    /// Mean traded quantity over the trailing window.
    pub trailing_average_volume: f64,
    /// Mean turnover (lakhs) over the trailing window.
    pub trailing_average_turnover: f64,
    /// Today's traded quantity.
    pub current_volume: u64,
    /// Today's turnover in lakhs.
    pub current_turnover: f64,
    /// (current - average) / average * 100.
    pub percent_above_average: f64,
    /// Records seen for the symbol across the pooled snapshots.
    pub history_depth: usize,
}

/// Metadata for one stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Store-assigned identifier.
    pub id: String,
    /// Original upload filename.
    pub filename: String,
    /// Trading date, when known.
    pub trading_date: Option<NaiveDate>,
    /// Opaque handle passed back to the store to fetch content.
    pub locator: String,
}

/// A per-file failure recorded while pooling snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchDiagnostic {
    pub filename: String,
    pub message: String,
}

impl std::fmt::Display for FetchDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.filename, self.message)
    }
}
