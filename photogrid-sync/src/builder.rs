//! Manifest builder — publish a gallery.json from a local photo directory.
//!
//! Scans the top level of a photo directory for image files, hashes their
//! contents, and writes the manifest document the fetcher consumes:
//!
//! ```json
//! {
//!   "updatedAt": 1700000000,
//!   "count": 2,
//!   "photos": ["./assets/photos/a.jpg", "./assets/photos/b.jpg"],
//!   "hashes": { "a.jpg": "…", "b.jpg": "…" }
//! }
//! ```
//!
//! The `hashes` map carries per-file content digests so successive builds can
//! report what actually changed; consumers ignore it (unknown manifest fields
//! are skipped by contract). `updatedAt` is stamped on every build.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::{io_err, SyncError};

/// Image file extensions included in the manifest (lowercase comparison).
pub const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Outcome of one manifest build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub manifest_path: PathBuf,
    /// Number of photos listed in the written manifest.
    pub photo_count: usize,
    /// Files whose content hash differs from the previous manifest.
    pub changed: usize,
    /// Files the previous manifest listed that no longer exist.
    pub removed: usize,
}

#[derive(Serialize)]
struct ManifestPayload<'a> {
    #[serde(rename = "updatedAt")]
    updated_at: i64,
    count: usize,
    photos: &'a [String],
    hashes: &'a BTreeMap<String, String>,
}

/// Build the manifest for `photos_dir` and write it to `manifest_path`.
///
/// `base_path` is prepended to each file name in the `photos` list (e.g.
/// `./assets/photos`), matching wherever the photos are served relative to
/// the page. Only the top level of `photos_dir` is scanned.
pub fn build_manifest(
    photos_dir: &Path,
    manifest_path: &Path,
    base_path: &str,
) -> Result<BuildOutcome, SyncError> {
    let previous = load_previous_hashes(manifest_path);

    let mut hashes = BTreeMap::new();
    let mut photos = Vec::new();
    let mut changed = 0usize;

    let base = base_path.trim_end_matches('/');
    for entry in WalkDir::new(photos_dir)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || !is_image(path) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();

        let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
        let digest = hex::encode(Sha256::digest(&bytes));
        if previous.get(&name) != Some(&digest) {
            changed += 1;
        }

        photos.push(if base.is_empty() {
            name.clone()
        } else {
            format!("{base}/{name}")
        });
        hashes.insert(name, digest);
    }
    photos.sort();

    let removed = previous.keys().filter(|name| !hashes.contains_key(*name)).count();

    let payload = ManifestPayload {
        updated_at: Utc::now().timestamp(),
        count: photos.len(),
        photos: &photos,
        hashes: &hashes,
    };

    write_manifest(manifest_path, &payload)?;
    tracing::info!(
        "manifest built: {} ({} photos, {} changed, {} removed)",
        manifest_path.display(),
        photos.len(),
        changed,
        removed,
    );

    Ok(BuildOutcome {
        manifest_path: manifest_path.to_path_buf(),
        photo_count: photos.len(),
        changed,
        removed,
    })
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Previous `hashes` map, tolerantly: a missing or unparseable manifest
/// yields an empty map, never an error.
fn load_previous_hashes(manifest_path: &Path) -> BTreeMap<String, String> {
    let Ok(contents) = std::fs::read_to_string(manifest_path) else {
        return BTreeMap::new();
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&contents) else {
        return BTreeMap::new();
    };
    value
        .get("hashes")
        .and_then(serde_json::Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

fn write_manifest(path: &Path, payload: &ManifestPayload<'_>) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let json = serde_json::to_string_pretty(payload)?;
    let tmp = PathBuf::from(format!("{}.photogrid.tmp", path.display()));
    std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
    Ok(())
}
