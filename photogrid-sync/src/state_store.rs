//! Per-gallery refresh state — last outcome and written-file hashes.
//!
//! Persists a `StateFile` JSON document at
//! `<home>/.photogrid/state/<gallery_name>.json`.
//! Writes use the same atomic `.tmp` + rename pattern as the registry.
//!
//! A missing state file means the gallery has never been refreshed (the
//! conceptual Idle state).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use photogrid_core::SyncStatus;

use crate::error::{io_err, SyncError};

/// Maps absolute written-file paths to their last written SHA-256 hex digest.
pub type FileHashes = HashMap<String, String>;

/// On-disk refresh state payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateFile {
    /// When the last completed refresh cycle started.
    pub refreshed_at: DateTime<Utc>,
    /// Outcome of the last completed refresh cycle.
    pub last_status: SyncStatus,
    /// Photo list from the most recent successfully fetched manifest.
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub files: FileHashes,
}

impl StateFile {
    /// Fresh state for a gallery's first refresh cycle.
    pub fn new(refreshed_at: DateTime<Utc>) -> Self {
        StateFile {
            refreshed_at,
            last_status: SyncStatus::Loading,
            photos: Vec::new(),
            files: HashMap::new(),
        }
    }
}

/// Path to the state JSON for a given gallery, rooted at `home`.
///
/// `~/.photogrid/state/<gallery_name>.json`
pub fn store_path_at(home: &Path, gallery_name: &str) -> PathBuf {
    home.join(".photogrid")
        .join("state")
        .join(format!("{gallery_name}.json"))
}

/// Load the state for `gallery_name`.
///
/// Returns `None` if the gallery has never completed a refresh.
pub fn load_at(home: &Path, gallery_name: &str) -> Result<Option<StateFile>, SyncError> {
    let path = store_path_at(home, gallery_name);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    Ok(Some(serde_json::from_str(&contents)?))
}

/// Save the state for `gallery_name` atomically.
///
/// Writes to `<path>.tmp` then renames to `<path>`.
pub fn save_at(home: &Path, gallery_name: &str, state: &StateFile) -> Result<(), SyncError> {
    let path = store_path_at(home, gallery_name);
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid state store path")));
    };

    // Ensure the state directory exists.
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_state_file_means_never_refreshed() {
        let tmp = TempDir::new().unwrap();
        let state = load_at(tmp.path(), "nonexistent").unwrap();
        assert!(state.is_none());
    }

    #[test]
    fn roundtrip_save_load() {
        let tmp = TempDir::new().unwrap();
        let mut state = StateFile::new(Utc::now());
        state.last_status = SyncStatus::Loaded { count: 2, updated_at: Some(1700000000) };
        state.photos = vec!["a.jpg".to_string(), "b.jpg".to_string()];
        state
            .files
            .insert("/srv/wall/index.html".to_string(), "deadbeef".to_string());

        save_at(tmp.path(), "wall", &state).unwrap();
        let loaded = load_at(tmp.path(), "wall").unwrap().expect("state present");
        assert_eq!(loaded, state);
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let tmp = TempDir::new().unwrap();
        let state = StateFile::new(Utc::now());
        save_at(tmp.path(), "clean_test", &state).unwrap();
        let tmp_path = store_path_at(tmp.path(), "clean_test").with_extension("json.tmp");
        assert!(
            !tmp_path.exists(),
            "tmp file should be removed after atomic rename"
        );
    }

    #[test]
    fn error_status_survives_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let mut state = StateFile::new(Utc::now());
        state.last_status = SyncStatus::Error {
            message: "failed to fetch manifest (HTTP 503)".to_string(),
        };
        save_at(tmp.path(), "err", &state).unwrap();
        let loaded = load_at(tmp.path(), "err").unwrap().expect("state present");
        assert!(loaded.last_status.is_error());
    }
}
