//! Pooled history loading.
//!
//! Fetches and parses many snapshots concurrently, keeping at most
//! `max_concurrent_fetches` requests in flight. A failed file is recorded as
//! a diagnostic and left out of the pool; the batch fails only when nothing
//! loads. Aggregation starts after every fetch has settled.

use crate::store::SnapshotStore;
use crate::window::{select_window, SnapshotAnchor};
use bhav_analytics::RollingVolumeAnalyzer;
use bhav_core::{
    AboveAverageRecord, Config, DailySnapshot, Error, FetchDiagnostic, Result, SnapshotMeta,
    StockRecord,
};
use bhav_ingestion::parse_snapshot;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Snapshots that loaded, plus a diagnostic for each that did not.
#[derive(Debug, Clone, Default)]
pub struct PooledHistory {
    /// Parsed snapshots, in request order.
    pub snapshots: Vec<DailySnapshot>,
    /// Per-file failures.
    pub diagnostics: Vec<FetchDiagnostic>,
}

impl PooledHistory {
    /// All records across the loaded snapshots.
    pub fn records(&self) -> impl Iterator<Item = &StockRecord> {
        self.snapshots.iter().flat_map(|s| s.records.iter())
    }

    /// Total records pooled.
    pub fn record_count(&self) -> usize {
        self.snapshots.iter().map(DailySnapshot::len).sum()
    }

    /// Flatten into the record pool, returning the diagnostics alongside.
    pub fn into_records(self) -> (Vec<StockRecord>, Vec<FetchDiagnostic>) {
        let records = self
            .snapshots
            .into_iter()
            .flat_map(|s| s.records)
            .collect();
        (records, self.diagnostics)
    }
}

/// Result of a rolling comparison over stored snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryReport {
    /// Symbols above their trailing average, highest percentage first.
    pub results: Vec<AboveAverageRecord>,
    /// Files that could not be loaded.
    pub diagnostics: Vec<FetchDiagnostic>,
    /// Snapshots selected for the window.
    pub snapshots_requested: usize,
    /// Snapshots that loaded.
    pub snapshots_loaded: usize,
}

/// Loads snapshot windows from a store and runs the rolling comparison.
pub struct HistoryLoader<S> {
    store: S,
    max_concurrent_fetches: usize,
    analyzer: RollingVolumeAnalyzer,
}

impl<S: SnapshotStore> HistoryLoader<S> {
    /// Create a loader with the default 21-day analyzer.
    pub fn new(store: S, max_concurrent_fetches: usize) -> Self {
        Self {
            store,
            max_concurrent_fetches: max_concurrent_fetches.max(1),
            analyzer: RollingVolumeAnalyzer::default(),
        }
    }

    /// Create a loader from configuration.
    pub fn from_config(store: S, config: &Config) -> Self {
        Self::new(store, config.history.max_concurrent_fetches)
            .with_analyzer(RollingVolumeAnalyzer::new(config.analytics.lookback_days))
    }

    /// Replace the rolling analyzer.
    pub fn with_analyzer(mut self, analyzer: RollingVolumeAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn max_concurrent_fetches(&self) -> usize {
        self.max_concurrent_fetches
    }

    async fn fetch_one(&self, meta: &SnapshotMeta) -> Result<DailySnapshot> {
        if meta.locator.trim().is_empty() {
            return Err(Error::not_found("snapshot has no content locator"));
        }

        let text = self.store.fetch_content(&meta.locator).await?;
        let mut snapshot = parse_snapshot(&meta.filename, &text);
        if let Some(date) = meta.trading_date {
            snapshot.trading_date = date;
        }
        Ok(snapshot)
    }

    /// Fetch and parse the given snapshots.
    ///
    /// Succeeds when at least one file loads. Fails with
    /// [`Error::InsufficientData`] when the list is empty or every file fails.
    pub async fn load(&self, snapshots: &[SnapshotMeta]) -> Result<PooledHistory> {
        if snapshots.is_empty() {
            return Err(Error::insufficient_data("no snapshots to load"));
        }

        info!(
            files = snapshots.len(),
            max_concurrent = self.max_concurrent_fetches,
            "loading snapshot history"
        );

        let outcomes: Vec<(&SnapshotMeta, Result<DailySnapshot>)> = stream::iter(snapshots)
            .map(|meta| async move { (meta, self.fetch_one(meta).await) })
            .buffered(self.max_concurrent_fetches)
            .collect()
            .await;

        let mut pooled = PooledHistory::default();
        for (meta, outcome) in outcomes {
            match outcome {
                Ok(snapshot) => pooled.snapshots.push(snapshot),
                Err(e) => {
                    warn!(filename = %meta.filename, error = %e, "snapshot load failed");
                    pooled.diagnostics.push(FetchDiagnostic {
                        filename: meta.filename.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        if pooled.snapshots.is_empty() {
            let failures: Vec<String> = pooled.diagnostics.iter().map(|d| d.to_string()).collect();
            return Err(Error::insufficient_data(format!(
                "all {} snapshot loads failed: {}",
                snapshots.len(),
                failures.join("; ")
            )));
        }

        info!(
            loaded = pooled.snapshots.len(),
            failed = pooled.diagnostics.len(),
            records = pooled.record_count(),
            "snapshot history loaded"
        );

        Ok(pooled)
    }

    /// Load the window ending at `anchor` and flag above-average symbols.
    ///
    /// The window holds `lookback + 1` snapshots: the trailing days plus today.
    pub async fn analyze(&self, anchor: &SnapshotAnchor) -> Result<HistoryReport> {
        let listed = self.store.list_snapshots().await?;
        let window = select_window(&listed, anchor, self.analyzer.min_history());

        let pooled = self.load(&window).await?;
        let snapshots_loaded = pooled.snapshots.len();
        let (records, diagnostics) = pooled.into_records();

        Ok(HistoryReport {
            results: self.analyzer.compute(&records),
            diagnostics,
            snapshots_requested: window.len(),
            snapshots_loaded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySnapshotStore;
    use approx::assert_relative_eq;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn trading_day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + Duration::days(offset)
    }

    /// One day's CSV with a fixed volume for each symbol.
    fn day_csv(offset: i64, rows: &[(&str, u64)]) -> String {
        let date = trading_day(offset).format("%d-%b-%Y");
        let mut text = String::from("SYMBOL,SERIES,DATE1,TTL_TRD_QNTY,TURNOVER_LACS\n");
        for (symbol, volume) in rows {
            text.push_str(&format!("{symbol},EQ,{date},{volume},{}\n", *volume as f64 / 100.0));
        }
        text
    }

    fn filename(offset: i64) -> String {
        format!("sec_bhavdata_full_{}.csv", trading_day(offset).format("%d%m%Y"))
    }

    #[tokio::test]
    async fn test_one_failed_file_is_a_diagnostic() -> anyhow::Result<()> {
        init_tracing();
        let mut store = MemorySnapshotStore::new();
        let mut metas = Vec::new();
        for offset in 0..4 {
            let volume = if offset == 3 { 400 } else { 100 };
            metas.push(store.insert(filename(offset), None, day_csv(offset, &[("ABC", volume)])));
        }
        let lost = SnapshotMeta {
            id: "lost".to_string(),
            filename: "sec_bhavdata_full_10012026.csv".to_string(),
            trading_date: Some(trading_day(9)),
            locator: "memory://nowhere".to_string(),
        };
        store.insert_meta(lost.clone());
        metas.insert(2, lost);

        let loader = HistoryLoader::new(store, 2).with_analyzer(RollingVolumeAnalyzer::new(3));
        let pooled = loader.load(&metas).await?;

        assert_eq!(pooled.snapshots.len(), 4);
        assert_eq!(pooled.record_count(), 4);
        assert_eq!(pooled.diagnostics.len(), 1);
        assert_eq!(pooled.diagnostics[0].filename, "sec_bhavdata_full_10012026.csv");
        assert!(pooled.diagnostics[0].message.contains("Not found"));

        let (records, _) = pooled.into_records();
        let results = RollingVolumeAnalyzer::new(3).compute(&records);
        assert_eq!(results.len(), 1);
        assert_relative_eq!(results[0].trailing_average_volume, 100.0);
        assert_relative_eq!(results[0].percent_above_average, 300.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_all_failed_is_an_error() {
        let mut store = MemorySnapshotStore::new();
        let meta = SnapshotMeta {
            id: "1".to_string(),
            filename: "a.csv".to_string(),
            trading_date: Some(trading_day(0)),
            locator: String::new(),
        };
        store.insert_meta(meta.clone());
        let loader = HistoryLoader::new(store, 4);

        let err = loader.load(&[meta]).await.unwrap_err();
        match err {
            Error::InsufficientData(msg) => assert!(msg.contains("a.csv")),
            other => panic!("unexpected error: {other}"),
        }

        let err = loader.load(&[]).await.unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
    }

    #[tokio::test]
    async fn test_snapshot_date_from_metadata() -> anyhow::Result<()> {
        let mut store = MemorySnapshotStore::new();
        let meta = store.insert("upload.csv", Some(trading_day(5)), day_csv(0, &[("ABC", 1)]));

        let pooled = HistoryLoader::new(store, 1).load(&[meta]).await?;
        assert_eq!(pooled.snapshots[0].trading_date, trading_day(5));
        // Record dates still come from the rows
        assert_eq!(pooled.records().next().map(|r| r.date), Some(trading_day(0)));
        Ok(())
    }

    #[tokio::test]
    async fn test_analyze_default_window() -> anyhow::Result<()> {
        init_tracing();
        let mut store = MemorySnapshotStore::new();
        // 30 trading days; only the last 22 are pooled
        for offset in 0..30 {
            let surge = if offset == 29 { 250 } else { 100 };
            let early = if offset < 8 { 1_000_000 } else { 100 };
            store.insert(
                filename(offset),
                None,
                day_csv(offset, &[("SURGE", surge), ("EARLY", early), ("FLAT", 100)]),
            );
        }

        let loader = HistoryLoader::from_config(store, &Config::default());
        let report = loader.analyze(&SnapshotAnchor::Latest).await?;

        assert_eq!(report.snapshots_requested, 22);
        assert_eq!(report.snapshots_loaded, 22);
        assert!(report.diagnostics.is_empty());
        assert_eq!(report.results.len(), 1);
        let surge = &report.results[0];
        assert_eq!(surge.record.symbol, "SURGE");
        assert_eq!(surge.history_depth, 22);
        assert_relative_eq!(surge.percent_above_average, 150.0);
        assert_relative_eq!(surge.current_turnover, 2.5);
        Ok(())
    }

    #[tokio::test]
    async fn test_analyze_anchored_in_the_past() -> anyhow::Result<()> {
        let mut store = MemorySnapshotStore::new();
        for offset in 0..25 {
            let volume = if offset == 21 { 300 } else { 100 };
            store.insert(filename(offset), None, day_csv(offset, &[("ABC", volume)]));
        }

        let loader = HistoryLoader::new(store, 3);
        let report = loader
            .analyze(&SnapshotAnchor::Date(trading_day(21)))
            .await?;

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].record.date, trading_day(21));
        assert_relative_eq!(report.results[0].percent_above_average, 200.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_short_history_yields_nothing() -> anyhow::Result<()> {
        let mut store = MemorySnapshotStore::new();
        for offset in 0..21 {
            let volume = if offset == 20 { 10_000 } else { 100 };
            store.insert(filename(offset), None, day_csv(offset, &[("ABC", volume)]));
        }

        let report = HistoryLoader::new(store, 8)
            .analyze(&SnapshotAnchor::Latest)
            .await?;
        assert_eq!(report.snapshots_loaded, 21);
        assert!(report.results.is_empty());
        Ok(())
    }

    /// Store that records how many fetches overlap.
    struct CountingStore {
        inner: MemorySnapshotStore,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl SnapshotStore for CountingStore {
        async fn list_snapshots(&self) -> Result<Vec<SnapshotMeta>> {
            self.inner.list_snapshots().await
        }

        async fn fetch_content(&self, locator: &str) -> Result<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.inner.fetch_content(locator).await
        }
    }

    #[tokio::test]
    async fn test_fetch_concurrency_is_bounded() -> anyhow::Result<()> {
        let mut inner = MemorySnapshotStore::new();
        for offset in 0..12 {
            inner.insert(filename(offset), None, day_csv(offset, &[("ABC", 1)]));
        }
        let store = Arc::new(CountingStore {
            inner,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });

        let loader = HistoryLoader::new(Arc::clone(&store), 3);
        let metas = loader.store().list_snapshots().await?;
        let pooled = loader.load(&metas).await?;

        assert_eq!(pooled.snapshots.len(), 12);
        let peak = store.peak.load(Ordering::SeqCst);
        assert!(peak >= 2 && peak <= 3, "peak concurrency was {peak}");
        // Request order is preserved
        assert_eq!(pooled.snapshots[0].trading_date, trading_day(0));
        assert_eq!(pooled.snapshots[11].trading_date, trading_day(11));
        Ok(())
    }
}
