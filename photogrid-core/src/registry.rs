//! Per-gallery YAML registry.
//!
//! # Storage layout
//!
//! ```text
//! ~/.photogrid/
//!   galleries/
//!     <gallery_name>.yaml   (one file per gallery — mode 0600)
//! ```
//!
//! # API pattern
//!
//! Every mutating function has two forms:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::RegistryError;
use crate::types::{Gallery, GalleryName, DEFAULT_PREFETCH_COUNT, DEFAULT_REFRESH_INTERVAL_SECS};

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.photogrid/galleries/`
///
/// Creates the directory (mode `0700`) if it does not yet exist.
pub fn galleries_dir_at(home: &Path) -> Result<PathBuf, RegistryError> {
    let dir = home.join(".photogrid").join("galleries");
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
        set_dir_permissions(&dir)?;
    }
    Ok(dir)
}

/// `<home>/.photogrid/galleries/<gallery>.yaml` — pure, no I/O.
pub fn gallery_path_at(home: &Path, gallery: &GalleryName) -> PathBuf {
    home.join(".photogrid")
        .join("galleries")
        .join(format!("{}.yaml", gallery.0))
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load a single gallery from `<home>/.photogrid/galleries/<gallery>.yaml`.
///
/// Returns `RegistryError::GalleryNotFound` if absent,
/// `RegistryError::Parse` (with path + line context) if malformed YAML.
pub fn load_gallery_at(home: &Path, gallery: &GalleryName) -> Result<Gallery, RegistryError> {
    let path = gallery_path_at(home, gallery);
    if !path.exists() {
        return Err(RegistryError::GalleryNotFound { path });
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|e| RegistryError::Parse { path, source: e })
}

/// `load_gallery_at` convenience wrapper.
pub fn load_gallery(gallery: &GalleryName) -> Result<Gallery, RegistryError> {
    load_gallery_at(&home()?, gallery)
}

/// List every registered gallery, sorted by name.
pub fn list_galleries_at(home: &Path) -> Result<Vec<Gallery>, RegistryError> {
    let dir = home.join(".photogrid").join("galleries");
    if !dir.exists() {
        return Ok(vec![]);
    }

    let mut entries: Vec<_> = std::fs::read_dir(&dir)?.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.file_name());

    let mut galleries = Vec::new();
    for entry in entries {
        let fname = entry.file_name();
        let name = fname.to_string_lossy();
        if !name.ends_with(".yaml") || name.ends_with(".yaml.tmp") {
            continue;
        }
        let contents = std::fs::read_to_string(entry.path())?;
        let gallery: Gallery = serde_yaml::from_str(&contents).map_err(|e| {
            RegistryError::Parse { path: entry.path(), source: e }
        })?;
        galleries.push(gallery);
    }
    Ok(galleries)
}

/// `list_galleries_at` convenience wrapper.
pub fn list_galleries() -> Result<Vec<Gallery>, RegistryError> {
    list_galleries_at(&home()?)
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save a gallery to `<home>/.photogrid/galleries/<gallery>.yaml`.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
/// `.tmp` is always in the same directory as the target (same filesystem — no EXDEV on macOS).
pub fn save_gallery_at(home: &Path, gallery: &Gallery) -> Result<(), RegistryError> {
    galleries_dir_at(home)?; // create dir + 0700 if absent
    let path = gallery_path_at(home, &gallery.name);
    let tmp_path = path.with_file_name(format!("{}.yaml.tmp", gallery.name.0));

    let yaml = serde_yaml::to_string(gallery)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(())
}

/// `save_gallery_at` convenience wrapper.
pub fn save_gallery(gallery: &Gallery) -> Result<(), RegistryError> {
    save_gallery_at(&home()?, gallery)
}

// ---------------------------------------------------------------------------
// 4. Init
// ---------------------------------------------------------------------------

/// Register a gallery that fetches `manifest_url` and renders into `site_dir`.
///
/// Creates `<home>/.photogrid/galleries/<name>.yaml`.
/// Idempotent: if the file already exists, loads and returns it unchanged.
pub fn init_at(
    home: &Path,
    name: GalleryName,
    manifest_url: String,
    site_dir: PathBuf,
    refresh_interval_secs: Option<u64>,
    prefetch_count: Option<usize>,
) -> Result<Gallery, RegistryError> {
    let yaml_path = gallery_path_at(home, &name);
    if yaml_path.exists() {
        return load_gallery_at(home, &name);
    }

    let now = Utc::now();
    let gallery = Gallery {
        name,
        manifest_url,
        site_dir,
        refresh_interval_secs: refresh_interval_secs.unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS),
        prefetch_count: prefetch_count.unwrap_or(DEFAULT_PREFETCH_COUNT),
        created_at: now,
        updated_at: now,
    };

    save_gallery_at(home, &gallery)?;
    Ok(gallery)
}

/// `init_at` convenience wrapper.
pub fn init(
    name: GalleryName,
    manifest_url: String,
    site_dir: PathBuf,
    refresh_interval_secs: Option<u64>,
    prefetch_count: Option<usize>,
) -> Result<Gallery, RegistryError> {
    init_at(&home()?, name, manifest_url, site_dir, refresh_interval_secs, prefetch_count)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, RegistryError> {
    dirs::home_dir().ok_or(RegistryError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
