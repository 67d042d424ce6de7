//! Atomic writer and refresh orchestration.
//!
//! ## `atomic_write` — 7-step protocol
//!
//! 1. Render content (already done by caller).
//! 2. SHA-256 hash the rendered content.
//! 3. Load the state store.
//! 4. Compare with stored hash → skip if identical.
//! 5. Write to `<path>.photogrid.tmp`.
//! 6. Rename to final path (atomic on POSIX).
//! 7. Update state-store entry + save store.
//!
//! ## Refresh cycle
//!
//! `refresh_gallery` walks the Loading → {Loaded | Empty | Error} machine:
//! fetch, shuffle, render, write. Fetch and parse failures never cross this
//! boundary — they become `SyncStatus::Error` in the returned report and the
//! previously rendered site files are left exactly as they were.

use std::path::{Path, PathBuf};

use chrono::Utc;
use sha2::{Digest, Sha256};

use photogrid_core::{
    registry,
    shuffle::{shuffle, ShuffleRng},
    types::{Gallery, GalleryName, Manifest, SyncStatus},
};
use photogrid_fetcher::{FetchError, ManifestFetcher};
use photogrid_renderer::{PageContext, Renderer, SiteFile};

use crate::error::{io_err, SyncError};
use crate::state_store::{self, FileHashes, StateFile};

// ---------------------------------------------------------------------------
// Write result
// ---------------------------------------------------------------------------

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// File was skipped — rendered content matches the stored hash.
    Unchanged { path: PathBuf },
    /// `--dry-run` mode: the file *would* have been written.
    WouldWrite { path: PathBuf },
}

// ---------------------------------------------------------------------------
// atomic_write
// ---------------------------------------------------------------------------

/// Atomically write a single rendered file and update the hash map.
///
/// The state store is loaded before the call; the caller is responsible for
/// saving it after all files for a gallery are processed.
///
/// Returns [`WriteResult`] indicating whether the file was written or skipped.
pub(crate) fn atomic_write(
    path: &Path,
    content: &str,
    hashes: &mut FileHashes,
    dry_run: bool,
) -> Result<WriteResult, SyncError> {
    let tmp = PathBuf::from(format!("{}.photogrid.tmp", path.display()));
    atomic_write_with_tmp(path, content, hashes, dry_run, &tmp)
}

fn atomic_write_with_tmp(
    path: &Path,
    content: &str,
    hashes: &mut FileHashes,
    dry_run: bool,
    tmp: &Path,
) -> Result<WriteResult, SyncError> {
    // Normalise line endings to LF before hashing and writing.
    let normalized = content.replace("\r\n", "\n");
    let content = normalized.as_str();

    // Step 2: hash the normalised content.
    let digest = {
        let mut h = Sha256::new();
        h.update(content.as_bytes());
        hex::encode(h.finalize())
    };

    // Step 4: compare with stored hash.
    let key = path.to_string_lossy().to_string();
    if let Some(stored) = hashes.get(&key) {
        if stored == &digest {
            tracing::debug!("unchanged: {}", path.display());
            return Ok(WriteResult::Unchanged {
                path: path.to_path_buf(),
            });
        }
    }

    if dry_run {
        tracing::info!("[dry-run] would write: {}", path.display());
        return Ok(WriteResult::WouldWrite {
            path: path.to_path_buf(),
        });
    }

    // Step 5: ensure parent directory exists, write to .tmp.
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    if let Some(tmp_parent) = tmp.parent() {
        std::fs::create_dir_all(tmp_parent).map_err(|e| io_err(tmp_parent, e))?;
    }
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;

    // Step 6: atomic rename to final path.
    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    // Step 7: update hash entry (caller saves the store).
    hashes.insert(key, digest);

    tracing::info!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// refresh_gallery
// ---------------------------------------------------------------------------

/// Outcome of refreshing a single gallery.
#[derive(Debug)]
pub struct RefreshReport {
    pub gallery_name: String,
    /// Presentation state the cycle ended in.
    pub status: SyncStatus,
    pub writes: Vec<WriteResult>,
}

fn fetch_manifest(gallery: &Gallery) -> Result<Manifest, FetchError> {
    ManifestFetcher::new(&gallery.manifest_url)?.fetch()
}

fn user_template_dir(home: &Path) -> PathBuf {
    home.join(".photogrid").join("templates")
}

/// Run one refresh cycle for the named gallery.
///
/// Fetches the manifest, shuffles a fresh display order, renders the site,
/// and writes with hash-gated atomic writes. On any fetch/parse failure the
/// cycle ends in `SyncStatus::Error` and the error is recorded in the state
/// store — the failure is a report, not an `Err`. An existing site survives
/// a failed cycle untouched; only a gallery that has never rendered gets an
/// error page in place of nothing.
pub fn refresh_gallery(
    gallery_name: &str,
    home: &Path,
    dry_run: bool,
) -> Result<RefreshReport, SyncError> {
    let refresh_started_at = Utc::now();
    let gallery = registry::load_gallery_at(home, &GalleryName::from(gallery_name))?;

    tracing::debug!("refresh started: {gallery_name}");
    let mut state = state_store::load_at(home, gallery_name)?
        .unwrap_or_else(|| StateFile::new(refresh_started_at));

    let manifest = match fetch_manifest(&gallery) {
        Ok(manifest) => manifest,
        Err(err) => {
            let status = SyncStatus::Error {
                message: err.to_string(),
            };
            tracing::warn!("refresh failed for '{gallery_name}', keeping previous site: {err}");

            // First cycle only: render the error surface so the site dir is
            // not empty. A previously rendered grid is never overwritten.
            let mut writes = Vec::new();
            if !SiteFile::Index.output_path(&gallery.site_dir).exists() {
                let renderer = Renderer::with_user_templates(&user_template_dir(home))?;
                let ctx = PageContext::from_parts(&gallery, &status, &[], None);
                for (path, content) in renderer.render_site(&ctx, &gallery.site_dir)? {
                    writes.push(atomic_write(&path, &content, &mut state.files, dry_run)?);
                }
            }

            if !dry_run {
                state.last_status = status.clone();
                state_store::save_at(home, gallery_name, &state)?;
            }
            return Ok(RefreshReport {
                gallery_name: gallery_name.to_string(),
                status,
                writes,
            });
        }
    };

    let status = if manifest.is_empty() {
        SyncStatus::Empty
    } else {
        SyncStatus::Loaded {
            count: manifest.photos.len(),
            updated_at: manifest.updated_at,
        }
    };

    // Fresh display order every cycle.
    let mut display_order = manifest.photos.clone();
    shuffle(&mut display_order, &mut ShuffleRng::from_entropy());

    let renderer = Renderer::with_user_templates(&user_template_dir(home))?;
    let ctx = PageContext::from_parts(&gallery, &status, &display_order, manifest.updated_at);
    let outputs = renderer.render_site(&ctx, &gallery.site_dir)?;

    let mut writes = Vec::new();
    for (path, content) in outputs {
        writes.push(atomic_write(&path, &content, &mut state.files, dry_run)?);
    }

    // Save the updated state (skip in dry-run — no filesystem changes).
    if !dry_run {
        state.refreshed_at = refresh_started_at;
        state.last_status = status.clone();
        state.photos = manifest.photos;
        state_store::save_at(home, gallery_name, &state)?;
    }

    tracing::info!("refresh finished: {gallery_name} ({status})");
    Ok(RefreshReport {
        gallery_name: gallery_name.to_string(),
        status,
        writes,
    })
}

// ---------------------------------------------------------------------------
// refresh_all
// ---------------------------------------------------------------------------

/// Refresh all registered galleries.
pub fn refresh_all(home: &Path, dry_run: bool) -> Result<Vec<RefreshReport>, SyncError> {
    let galleries = registry::list_galleries_at(home)?;
    let mut reports = Vec::new();
    for gallery in galleries {
        let report = refresh_gallery(&gallery.name.0, home, dry_run)?;
        reports.push(report);
    }
    Ok(reports)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
