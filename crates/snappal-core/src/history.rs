//! Bounded, most-recent-first history persisted to one JSON slot.
//!
//! The slot is a single file (`history.json`) holding the serialized array.
//! Reads never fail: absent or corrupt data is treated as an empty history.
//! Writes replace the file atomically (temp file + rename); there is one
//! writer per session, so last-writer-wins is sufficient.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use snappal_types::{AnalysisResult, MAX_HISTORY};

use crate::config::paths;

/// File-backed history slot.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `$SNAPPAL_HOME/history.json`.
    pub fn at_default_path() -> Self {
        Self::new(paths::history_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted history, newest first.
    ///
    /// Missing or unreadable data yields an empty list and a warning.
    pub fn load(&self) -> Vec<AnalysisResult> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read history");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<AnalysisResult>>(&contents) {
            Ok(mut entries) => {
                entries.truncate(MAX_HISTORY);
                entries
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring corrupt history");
                Vec::new()
            }
        }
    }

    /// Persists at most `MAX_HISTORY` entries verbatim.
    ///
    /// # Errors
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, entries: &[AnalysisResult]) -> Result<()> {
        let bounded = &entries[..entries.len().min(MAX_HISTORY)];
        let json = serde_json::to_vec(bounded).context("serialize history")?;

        let dir = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)
            .with_context(|| format!("create history dir {}", dir.display()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("create temp file in {}", dir.display()))?;
        tmp.write_all(&json).context("write history")?;
        tmp.persist(&self.path)
            .with_context(|| format!("save history to {}", self.path.display()))?;

        tracing::debug!(entries = bounded.len(), path = %self.path.display(), "history saved");
        Ok(())
    }

    /// Removes the persisted slot.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("remove history {}", self.path.display()))
            }
        }
    }
}

/// Prepends `result` and truncates to `MAX_HISTORY`.
///
/// Returns the evicted entries, oldest last.
pub fn push_bounded(history: &mut Vec<AnalysisResult>, result: AnalysisResult) -> Vec<AnalysisResult> {
    history.insert(0, result);
    if history.len() > MAX_HISTORY {
        history.split_off(MAX_HISTORY)
    } else {
        Vec::new()
    }
}

/// Looks up an entry by 1-based position, full id, or id without prefix.
pub fn find_entry<'a>(history: &'a [AnalysisResult], key: &str) -> Option<(usize, &'a AnalysisResult)> {
    let key = key.trim();
    if let Ok(position) = key.parse::<usize>()
        && (1..=history.len()).contains(&position)
    {
        return Some((position - 1, &history[position - 1]));
    }
    history
        .iter()
        .enumerate()
        .find(|(_, entry)| entry.id == key || entry.short_id() == key)
}


#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::testing::result;
    use super::*;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(HistoryStore::new(&path).load().is_empty());
    }

    #[test]
    fn save_then_load_preserves_order() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("nested").join("history.json"));
        let entries = vec![result(3), result(2), result(1)];

        store.save(&entries).unwrap();
        assert_eq!(store.load(), entries);
    }

    #[test]
    fn save_truncates_to_max() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        let entries: Vec<_> = (0..15).rev().map(result).collect();

        store.save(&entries).unwrap();
        let loaded = store.load();
        assert_eq!(loaded.len(), MAX_HISTORY);
        assert_eq!(loaded[0].id, "snap_14");
    }

    #[test]
    fn clear_then_load_is_empty() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        store.save(&[result(1)]).unwrap();

        store.clear().unwrap();
        assert!(store.load().is_empty());
        assert!(!store.path().exists());
        store.clear().unwrap();
    }

    #[test]
    fn eleventh_insert_evicts_oldest() {
        let mut history = Vec::new();
        for stamp in 1..=10 {
            assert!(push_bounded(&mut history, result(stamp)).is_empty());
        }

        let evicted = push_bounded(&mut history, result(11));

        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history[0].id, "snap_11");
        assert_eq!(history[9].id, "snap_2");
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].id, "snap_1");
    }

    #[test]
    fn find_entry_by_position_and_id() {
        let history = vec![result(30), result(20), result(10)];

        assert_eq!(find_entry(&history, "1").unwrap().1.id, "snap_30");
        assert_eq!(find_entry(&history, "3").unwrap().0, 2);
        assert_eq!(find_entry(&history, "snap_20").unwrap().0, 1);
        assert_eq!(find_entry(&history, "10").map(|(i, _)| i), Some(2));
        assert!(find_entry(&history, "0").is_none());
        assert!(find_entry(&history, "snap_99").is_none());
    }
}
