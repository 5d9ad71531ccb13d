//! Header alias table.
//!
//! Exports from the same provider spell column names differently across
//! formats. Each logical field lists its accepted spellings in preference
//! order; the first spelling present in the header wins.

use csv::StringRecord;
use std::collections::HashMap;

/// A logical column of a bhavcopy-style file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Symbol,
    Series,
    Date,
    PrevClose,
    Open,
    High,
    Low,
    Last,
    Close,
    AvgPrice,
    TotalTradedQuantity,
    Turnover,
    NumberOfTrades,
    DeliveryQuantity,
    DeliveryPercent,
}

impl Field {
    /// Number of logical fields.
    pub const COUNT: usize = 15;

    /// Every field, in declaration order.
    pub const ALL: [Field; Field::COUNT] = [
        Field::Symbol,
        Field::Series,
        Field::Date,
        Field::PrevClose,
        Field::Open,
        Field::High,
        Field::Low,
        Field::Last,
        Field::Close,
        Field::AvgPrice,
        Field::TotalTradedQuantity,
        Field::Turnover,
        Field::NumberOfTrades,
        Field::DeliveryQuantity,
        Field::DeliveryPercent,
    ];

    /// Accepted upper-case header spellings, most preferred first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::Symbol => &["SYMBOL"],
            Field::Series => &["SERIES"],
            Field::Date => &["DATE1", "DATE", "TIMESTAMP"],
            Field::PrevClose => &["PREV_CLOSE", "PREV PRICE", "PREVCLOSE"],
            Field::Open => &["OPEN_PRICE", "OPEN"],
            Field::High => &["HIGH_PRICE", "HIGH"],
            Field::Low => &["LOW_PRICE", "LOW"],
            Field::Last => &["LAST_PRICE", "LAST"],
            Field::Close => &["CLOSE_PRICE", "CLOSE"],
            Field::AvgPrice => &["AVG_PRICE", "AVG PRICE"],
            Field::TotalTradedQuantity => &["TTL_TRD_QNTY", "TTL_TRD_QTY", "TOTTRDQTY"],
            Field::Turnover => &["TURNOVER_LACS", "TURNOVER(LACS)", "TURNOVER"],
            Field::NumberOfTrades => &["NO_OF_TRADES", "TOTALTRADES"],
            Field::DeliveryQuantity => &["DELIV_QTY"],
            Field::DeliveryPercent => &["DELIV_PER"],
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// Column positions of each logical field, resolved against one header row.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    columns: [Option<usize>; Field::COUNT],
}

impl ColumnMap {
    /// Resolve every field against a header row.
    ///
    /// Header tokens are trimmed and upper-cased. When a name repeats, the
    /// right-most column is used.
    pub fn from_header<'a>(header: impl IntoIterator<Item = &'a str>) -> Self {
        let positions: HashMap<String, usize> = header
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_ascii_uppercase(), i))
            .collect();

        let mut columns = [None; Field::COUNT];
        for field in Field::ALL {
            columns[field.index()] = field
                .aliases()
                .iter()
                .find_map(|alias| positions.get(*alias).copied());
        }

        Self { columns }
    }

    /// Column index for a field, if the header carries any of its spellings.
    pub fn position(&self, field: Field) -> Option<usize> {
        self.columns[field.index()]
    }

    /// Raw value of a field in a row. Missing columns and short rows give "".
    pub fn value<'r>(&self, field: Field, row: &'r StringRecord) -> &'r str {
        self.position(field)
            .and_then(|i| row.get(i))
            .map(str::trim)
            .unwrap_or("")
    }

    /// Number of fields the header resolved.
    pub fn resolved_count(&self) -> usize {
        self.columns.iter().filter(|c| c.is_some()).count()
    }
}
