//! Snapshot store interface and in-process implementations.

use async_trait::async_trait;
use bhav_core::{Error, Result, SnapshotMeta};
use bhav_ingestion::date_from_filename;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Source of uploaded snapshot files.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Metadata for every stored snapshot.
    async fn list_snapshots(&self) -> Result<Vec<SnapshotMeta>>;

    /// Raw CSV text behind a locator.
    ///
    /// Fails with [`Error::NotFound`] when the locator does not resolve.
    async fn fetch_content(&self, locator: &str) -> Result<String>;
}

#[async_trait]
impl<S: SnapshotStore + ?Sized> SnapshotStore for Arc<S> {
    async fn list_snapshots(&self) -> Result<Vec<SnapshotMeta>> {
        (**self).list_snapshots().await
    }

    async fn fetch_content(&self, locator: &str) -> Result<String> {
        (**self).fetch_content(locator).await
    }
}

/// Snapshots held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    snapshots: Vec<SnapshotMeta>,
    contents: HashMap<String, String>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a file. Without an explicit date, the filename is consulted.
    pub fn insert(
        &mut self,
        filename: impl Into<String>,
        trading_date: Option<NaiveDate>,
        content: impl Into<String>,
    ) -> SnapshotMeta {
        let filename = filename.into();
        let id = (self.snapshots.len() + 1).to_string();
        let meta = SnapshotMeta {
            trading_date: trading_date.or_else(|| date_from_filename(&filename)),
            locator: format!("memory://{id}"),
            id,
            filename,
        };
        self.contents.insert(meta.locator.clone(), content.into());
        self.snapshots.push(meta.clone());
        meta
    }

    /// Register metadata without content, e.g. an upload whose blob was lost.
    pub fn insert_meta(&mut self, meta: SnapshotMeta) {
        self.snapshots.push(meta);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn list_snapshots(&self) -> Result<Vec<SnapshotMeta>> {
        Ok(self.snapshots.clone())
    }

    async fn fetch_content(&self, locator: &str) -> Result<String> {
        self.contents
            .get(locator)
            .cloned()
            .ok_or_else(|| Error::not_found(locator))
    }
}

/// One `*.csv` file per snapshot in a directory.
///
/// The trading date comes from the `DDMMYYYY` group in the filename and the
/// locator is the file path.
#[derive(Debug, Clone)]
pub struct DirectorySnapshotStore {
    root: PathBuf,
}

impl DirectorySnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

#[async_trait]
impl SnapshotStore for DirectorySnapshotStore {
    async fn list_snapshots(&self) -> Result<Vec<SnapshotMeta>> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut snapshots = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_csv(&path) || !entry.file_type().await?.is_file() {
                continue;
            }
            let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            snapshots.push(SnapshotMeta {
                id: filename.to_string(),
                filename: filename.to_string(),
                trading_date: date_from_filename(filename),
                locator: path.to_string_lossy().into_owned(),
            });
        }

        snapshots.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(snapshots)
    }

    async fn fetch_content(&self, locator: &str) -> Result<String> {
        let path = Path::new(locator);
        if !path.starts_with(&self.root)
            || path.components().any(|c| matches!(c, Component::ParentDir))
        {
            return Err(Error::not_found(locator));
        }

        // Symlinks may still point elsewhere
        let root = tokio::fs::canonicalize(&self.root).await?;
        let resolved = match tokio::fs::canonicalize(path).await {
            Ok(resolved) => resolved,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::not_found(locator))
            }
            Err(e) => return Err(e.into()),
        };
        if !resolved.starts_with(&root) {
            return Err(Error::not_found(locator));
        }

        match tokio::fs::read(&resolved).await {
            // Provider files are not always clean UTF-8
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::not_found(locator)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let mut store = MemorySnapshotStore::new();
        let meta = store.insert("sec_bhavdata_full_02022026.csv", None, "SYMBOL,SERIES\n");
        assert_eq!(meta.trading_date, Some(date(2026, 2, 2)));

        let listed = store.list_snapshots().await.unwrap();
        assert_eq!(listed, vec![meta.clone()]);
        assert_eq!(store.fetch_content(&meta.locator).await.unwrap(), "SYMBOL,SERIES\n");
    }

    #[tokio::test]
    async fn test_memory_store_explicit_date_wins() {
        let mut store = MemorySnapshotStore::new();
        let meta = store.insert("bhav_02022026.csv", Some(date(2026, 2, 3)), "");
        assert_eq!(meta.trading_date, Some(date(2026, 2, 3)));
    }

    #[tokio::test]
    async fn test_memory_store_missing_locator() {
        let store = MemorySnapshotStore::new();
        let err = store.fetch_content("memory://42").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_shared_store() {
        let mut store = MemorySnapshotStore::new();
        store.insert("a.csv", None, "x");
        let shared: Arc<dyn SnapshotStore> = Arc::new(store);
        assert_eq!(shared.list_snapshots().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_directory_store() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bhav_03022026.csv"), "B").unwrap();
        std::fs::write(dir.path().join("bhav_02022026.CSV"), "A").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let store = DirectorySnapshotStore::new(dir.path());
        let listed = store.list_snapshots().await.unwrap();

        let names: Vec<&str> = listed.iter().map(|m| m.filename.as_str()).collect();
        assert_eq!(names, vec!["bhav_02022026.CSV", "bhav_03022026.csv"]);
        assert_eq!(listed[0].trading_date, Some(date(2026, 2, 2)));
        assert_eq!(store.fetch_content(&listed[1].locator).await.unwrap(), "B");
    }

    #[tokio::test]
    async fn test_directory_store_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectorySnapshotStore::new(dir.path());

        let missing = dir.path().join("gone.csv");
        let err = store
            .fetch_content(&missing.to_string_lossy())
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        // Paths outside the root never resolve
        let err = store.fetch_content("/etc/hostname").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_directory_store_stays_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("snapshots");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(dir.path().join("secret.txt"), "TOPSECRET").unwrap();
        std::fs::write(root.join("bhav_02022026.csv"), "A").unwrap();

        let store = DirectorySnapshotStore::new(&root);
        let escaped = root.join("..").join("secret.txt");
        let err = store
            .fetch_content(&escaped.to_string_lossy())
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(dir.path().join("secret.txt"), root.join("link.csv"))
                .unwrap();
            let link = root.join("link.csv");
            let err = store.fetch_content(&link.to_string_lossy()).await.unwrap_err();
            assert!(err.is_not_found());
        }

        let inside = root.join("bhav_02022026.csv");
        assert_eq!(store.fetch_content(&inside.to_string_lossy()).await.unwrap(), "A");
    }
}
