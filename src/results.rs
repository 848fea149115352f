use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::app_dirs::AppDirs;
use crate::layout::TargetColor;

/// Fixed key the whole history blob is stored under
pub const NAMESPACE_KEY: &str = "braingames";

pub type History = BTreeMap<String, GameResult>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("results file io: {0}")]
    Io(#[from] std::io::Error),
    #[error("results encoding: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv export: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRecord {
    pub target_index: usize,
    pub color: TargetColor,
    pub reaction_time_ms: f64,
}

impl ReactionRecord {
    pub fn key(&self) -> String {
        target_key(self.target_index)
    }
}

pub fn target_key(index: usize) -> String {
    format!("target_{index}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub timestamp: DateTime<Utc>,
    pub average_time_ms: f64,
    pub incorrect_clicks: u32,
    pub missed_green_targets: u32,
    pub score: i64,
    #[serde(default)]
    pub targets: BTreeMap<String, ReactionRecord>,
}

impl GameResult {
    /// Key this result is stored under
    pub fn key(&self) -> String {
        timestamp_key(&self.timestamp)
    }
}

/// ISO-8601 UTC with milliseconds, e.g. `2024-05-01T10:00:00.123Z`
pub fn timestamp_key(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub trait ResultsStore {
    /// Load the whole history. Unreadable or malformed data yields an empty map.
    fn load(&self) -> History;
    /// Replace the whole history.
    fn save(&self, results: &History) -> Result<(), StoreError>;
    /// Like `load`, but fails when existing data could not be read at all,
    /// so a following `save` does not clobber it.
    fn load_for_update(&self) -> Result<History, StoreError> {
        Ok(self.load())
    }
}

/// Load, insert under the result's timestamp key, save
pub fn record_result(store: &dyn ResultsStore, result: &GameResult) -> Result<(), StoreError> {
    let mut history = store.load_for_update()?;
    history.insert(result.key(), result.clone());
    store.save(&history)
}

/// History kept as a single JSON object on disk
#[derive(Debug, Clone)]
pub struct FileResultsStore {
    path: PathBuf,
}

impl FileResultsStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::results_path()
            .unwrap_or_else(|| PathBuf::from(format!("{NAMESPACE_KEY}.json")));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty history; any other io failure is an error.
    fn read_history(&self) -> Result<History, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(History::new()),
            Err(err) => return Err(err.into()),
        };
        let raw = match serde_json::from_slice::<BTreeMap<String, serde_json::Value>>(&bytes) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "results file unreadable, starting empty");
                return Ok(History::new());
            }
        };

        Ok(raw
            .into_iter()
            .filter_map(|(key, value)| match serde_json::from_value::<GameResult>(value) {
                Ok(result) => Some((key, result)),
                Err(err) => {
                    debug!(%key, %err, "skipping malformed result entry");
                    None
                }
            })
            .collect())
    }
}

impl Default for FileResultsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultsStore for FileResultsStore {
    fn load(&self) -> History {
        self.read_history().unwrap_or_else(|err| {
            warn!(path = %self.path.display(), %err, "could not read results file");
            History::new()
        })
    }

    fn load_for_update(&self) -> Result<History, StoreError> {
        self.read_history()
    }

    fn save(&self, results: &History) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(results)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// In-memory store; clones share the same history
#[derive(Debug, Clone, Default)]
pub struct MemoryResultsStore {
    inner: Rc<RefCell<History>>,
}

impl MemoryResultsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultsStore for MemoryResultsStore {
    fn load(&self) -> History {
        self.inner.borrow().clone()
    }

    fn save(&self, results: &History) -> Result<(), StoreError> {
        *self.inner.borrow_mut() = results.clone();
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    timestamp: &'a str,
    average_time_ms: String,
    missed_green_targets: u32,
    incorrect_clicks: u32,
    score: i64,
}

/// Write the history as CSV, oldest first
pub fn export_csv<W: std::io::Write>(history: &History, writer: W) -> Result<(), StoreError> {
    use itertools::Itertools;

    let mut wtr = csv::Writer::from_writer(writer);
    for (key, result) in history.iter().sorted_by_key(|(_, r)| r.timestamp) {
        wtr.serialize(CsvRow {
            timestamp: key,
            average_time_ms: format!("{:.2}", result.average_time_ms),
            missed_green_targets: result.missed_green_targets,
            incorrect_clicks: result.incorrect_clicks,
            score: result.score,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn sample(secs: i64, score: i64) -> GameResult {
        let timestamp = Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap();
        let mut targets = BTreeMap::new();
        let record = ReactionRecord {
            target_index: 0,
            color: TargetColor::Green,
            reaction_time_ms: 312.5,
        };
        targets.insert(record.key(), record);
        GameResult {
            timestamp,
            average_time_ms: 400.0,
            incorrect_clicks: 1,
            missed_green_targets: 2,
            score,
            targets,
        }
    }

    #[test]
    fn timestamp_key_is_iso_millis() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(timestamp_key(&ts), "2024-05-01T10:00:00.000Z");
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = FileResultsStore::with_path(dir.path().join("braingames.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn file_store_persists_recorded_result() {
        let dir = tempdir().unwrap();
        let store = FileResultsStore::with_path(dir.path().join("nested").join("braingames.json"));
        let result = sample(0, 1500);

        record_result(&store, &result).unwrap();

        let history = store.load();
        assert_eq!(history.len(), 1);
        assert_eq!(history.get(&result.key()), Some(&result));
    }

    #[test]
    fn record_result_keeps_existing_entries() {
        let store = MemoryResultsStore::new();
        record_result(&store, &sample(0, 1)).unwrap();
        record_result(&store, &sample(60, 2)).unwrap();
        assert_eq!(store.load().len(), 2);
    }

    #[test]
    fn malformed_blob_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("braingames.json");
        fs::write(&path, b"[1, 2,").unwrap();
        assert!(FileResultsStore::with_path(&path).load().is_empty());
    }

    #[test]
    fn unreadable_file_is_not_overwritten() {
        let dir = tempdir().unwrap();
        // a directory where the file should be: reading fails, but not with NotFound
        let path = dir.path().join("braingames.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();
        let store = FileResultsStore::with_path(&path);

        assert!(store.load().is_empty());
        assert!(matches!(
            record_result(&store, &sample(0, 10)),
            Err(StoreError::Io(_))
        ));
        assert!(path.join("keep").exists());
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("braingames.json");
        let good = sample(0, 900);
        let mut blob = serde_json::Map::new();
        blob.insert(good.key(), serde_json::to_value(&good).unwrap());
        blob.insert(
            "targets".to_string(),
            serde_json::json!({ "target_0": { "color": "green" } }),
        );
        fs::write(&path, serde_json::to_vec(&blob).unwrap()).unwrap();

        let history = FileResultsStore::with_path(&path).load();
        assert_eq!(history.len(), 1);
        assert!(history.contains_key(&good.key()));
    }

    #[test]
    fn csv_export_orders_oldest_first() {
        let store = MemoryResultsStore::new();
        record_result(&store, &sample(120, 3)).unwrap();
        record_result(&store, &sample(0, 1)).unwrap();

        let mut out = Vec::new();
        export_csv(&store.load(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "timestamp,average_time_ms,missed_green_targets,incorrect_clicks,score"
        );
        assert!(lines[1].ends_with(",400.00,2,1,1"));
        assert!(lines[2].ends_with(",400.00,2,1,3"));
    }
}
