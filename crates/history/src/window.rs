//! Selection of the snapshots that feed one rolling comparison.

use bhav_core::SnapshotMeta;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// The snapshot a window ends at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotAnchor {
    /// The most recent dated snapshot.
    #[default]
    Latest,
    /// A snapshot matched by id or filename.
    Snapshot(String),
    /// The last snapshot for a trading date.
    Date(NaiveDate),
}

/// Pick up to `depth` dated snapshots ending at the anchor, oldest first.
///
/// Snapshots without a trading date are ignored. An anchor that matches
/// nothing falls back to the latest snapshots.
pub fn select_window(
    snapshots: &[SnapshotMeta],
    anchor: &SnapshotAnchor,
    depth: usize,
) -> Vec<SnapshotMeta> {
    let mut dated: Vec<&SnapshotMeta> = snapshots
        .iter()
        .filter(|s| s.trading_date.is_some())
        .collect();
    dated.sort_by_key(|s| s.trading_date);

    if dated.is_empty() || depth == 0 {
        return Vec::new();
    }

    let end = match anchor {
        SnapshotAnchor::Latest => None,
        SnapshotAnchor::Snapshot(key) => dated
            .iter()
            .rposition(|s| s.id == *key || s.filename == *key),
        SnapshotAnchor::Date(date) => dated.iter().rposition(|s| s.trading_date == Some(*date)),
    }
    .unwrap_or(dated.len() - 1);

    let start = (end + 1).saturating_sub(depth);
    dated[start..=end].iter().map(|s| (*s).clone()).collect()
}

/// Oldest trading date still inside the retention period.
pub fn retention_cutoff(today: NaiveDate, retention_days: u32) -> NaiveDate {
    today - Duration::days(i64::from(retention_days))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn meta(id: usize, day: Option<u32>) -> SnapshotMeta {
        SnapshotMeta {
            id: id.to_string(),
            filename: format!("file_{id}.csv"),
            trading_date: day.map(date),
            locator: format!("loc-{id}"),
        }
    }

    fn ids(window: &[SnapshotMeta]) -> Vec<&str> {
        window.iter().map(|m| m.id.as_str()).collect()
    }

    fn sample() -> Vec<SnapshotMeta> {
        // Out of order, with one undated upload
        vec![
            meta(1, Some(5)),
            meta(2, Some(1)),
            meta(3, None),
            meta(4, Some(3)),
            meta(5, Some(2)),
            meta(6, Some(4)),
        ]
    }

    #[test]
    fn test_latest_window() {
        let window = select_window(&sample(), &SnapshotAnchor::Latest, 3);
        assert_eq!(ids(&window), vec!["4", "6", "1"]);
    }

    #[test]
    fn test_anchor_by_id_and_filename() {
        let window = select_window(&sample(), &SnapshotAnchor::Snapshot("4".into()), 2);
        assert_eq!(ids(&window), vec!["5", "4"]);

        let window =
            select_window(&sample(), &SnapshotAnchor::Snapshot("file_6.csv".into()), 10);
        assert_eq!(ids(&window), vec!["2", "5", "4", "6"]);
    }

    #[test]
    fn test_anchor_by_date() {
        let window = select_window(&sample(), &SnapshotAnchor::Date(date(2)), 22);
        assert_eq!(ids(&window), vec!["2", "5"]);
    }

    #[test]
    fn test_unknown_anchor_falls_back_to_latest() {
        let window = select_window(&sample(), &SnapshotAnchor::Snapshot("missing".into()), 2);
        assert_eq!(ids(&window), vec!["6", "1"]);

        // The undated upload can never anchor a window
        let window = select_window(&sample(), &SnapshotAnchor::Snapshot("3".into()), 1);
        assert_eq!(ids(&window), vec!["1"]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(select_window(&[], &SnapshotAnchor::Latest, 22).is_empty());
        assert!(select_window(&[meta(1, None)], &SnapshotAnchor::Latest, 22).is_empty());
        assert!(select_window(&sample(), &SnapshotAnchor::Latest, 0).is_empty());
    }

    #[test]
    fn test_retention_cutoff() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 15).unwrap();
        assert_eq!(retention_cutoff(today, 30), date(16));
        assert_eq!(retention_cutoff(today, 0), today);
    }
}
