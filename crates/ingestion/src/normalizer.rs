//! CSV to canonical record normalization.
//!
//! Reads one day's CSV export into [`StockRecord`]s. Column order is taken
//! from the header, never assumed. Only equity-series rows are kept; every
//! other row is normalized with defaults rather than rejected.

use crate::fields::{ColumnMap, Field};
use crate::values::{date_from_filename, parse_count, parse_number, parse_trade_date};
use bhav_core::{epoch_date, DailySnapshot, StockRecord, EQUITY_SERIES};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

/// Counters from the most recent parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Data rows read (header excluded).
    pub rows_read: u64,
    /// Rows kept as equity records.
    pub rows_kept: u64,
    /// Rows dropped by the series filter.
    pub non_equity_dropped: u64,
}

impl ParseStats {
    /// Reset statistics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Parser for bhavcopy-style CSV text.
#[derive(Debug, Default)]
pub struct CsvNormalizer {
    stats: ParseStats,
}

impl CsvNormalizer {
    /// Create a new normalizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics for the last call to [`CsvNormalizer::parse`].
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Parse CSV text into equity records, in file order.
    ///
    /// Blank lines are ignored and the first remaining line is the header.
    /// Empty input gives an empty result.
    pub fn parse(&mut self, text: &str) -> Vec<StockRecord> {
        self.stats.reset();

        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        let Some(header) = lines.next() else {
            return Vec::new();
        };

        // Each line is its own record so a stray quote cannot reach past it
        let mut builder = ReaderBuilder::new();
        builder.has_headers(false).flexible(true).trim(Trim::All);

        let columns = ColumnMap::from_header(tokenize_line(&builder, header).iter());

        let mut records = Vec::new();
        for line in lines {
            self.stats.rows_read += 1;
            let row = tokenize_line(&builder, line);

            if !columns
                .value(Field::Series, &row)
                .eq_ignore_ascii_case(EQUITY_SERIES)
            {
                self.stats.non_equity_dropped += 1;
                continue;
            }

            records.push(build_record(&columns, &row));
            self.stats.rows_kept += 1;
        }

        debug!(
            rows_read = self.stats.rows_read,
            rows_kept = self.stats.rows_kept,
            non_equity_dropped = self.stats.non_equity_dropped,
            "parsed snapshot csv"
        );

        records
    }
}

/// Split one line into fields, honouring quotes within the line.
///
/// A line the reader rejects falls back to a plain comma split.
fn tokenize_line(builder: &ReaderBuilder, line: &str) -> StringRecord {
    match builder.from_reader(line.as_bytes()).records().next() {
        Some(Ok(record)) => record,
        Some(Err(e)) => {
            debug!(error = %e, "falling back to plain split");
            StringRecord::from(line.split(',').map(str::trim).collect::<Vec<_>>())
        }
        None => StringRecord::new(),
    }
}

fn build_record(columns: &ColumnMap, row: &StringRecord) -> StockRecord {
    let text = |field| columns.value(field, row);
    let number = |field| parse_number(text(field));

    StockRecord {
        symbol: text(Field::Symbol).to_string(),
        series: text(Field::Series).to_string(),
        date: parse_trade_date(text(Field::Date)),
        prev_close: number(Field::PrevClose),
        open: number(Field::Open),
        high: number(Field::High),
        low: number(Field::Low),
        last: number(Field::Last),
        close: number(Field::Close),
        avg_price: number(Field::AvgPrice),
        total_traded_quantity: parse_count(text(Field::TotalTradedQuantity)),
        turnover_lakhs: number(Field::Turnover),
        number_of_trades: parse_count(text(Field::NumberOfTrades)),
        delivery_quantity: number(Field::DeliveryQuantity),
        delivery_percent: number(Field::DeliveryPercent),
    }
}

/// Parse CSV text into equity records.
pub fn parse_csv(text: &str) -> Vec<StockRecord> {
    CsvNormalizer::new().parse(text)
}

/// Parse one uploaded file into a snapshot.
///
/// The trading date comes from the filename when it carries one, otherwise
/// from the first record, otherwise the epoch.
pub fn parse_snapshot(filename: &str, text: &str) -> DailySnapshot {
    let records = parse_csv(text);
    let trading_date = date_from_filename(filename)
        .or_else(|| records.first().map(|r| r.date))
        .unwrap_or_else(epoch_date);

    DailySnapshot {
        filename: filename.to_string(),
        trading_date,
        records,
    }
}
