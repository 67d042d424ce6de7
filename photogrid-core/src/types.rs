//! Domain types for the photogrid gallery registry.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! Registry types are serializable/deserializable via serde + serde_yaml.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default refresh cadence in seconds (ten minutes).
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 600;

/// Default number of leading display-order photos to emit preload hints for.
pub const DEFAULT_PREFETCH_COUNT: usize = 8;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a registered gallery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GalleryName(pub String);

impl fmt::Display for GalleryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for GalleryName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for GalleryName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Registry structs
// ---------------------------------------------------------------------------

/// A gallery managed by photogrid.
///
/// One YAML file per gallery under `~/.photogrid/galleries/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gallery {
    pub name: GalleryName,
    /// URL of the manifest JSON document describing the gallery's photos.
    pub manifest_url: String,
    /// Directory the rendered site files are written into.
    pub site_dir: PathBuf,
    /// Seconds between automatic refreshes when the daemon is running.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// Number of leading photos to emit `<link rel="preload">` hints for.
    #[serde(default = "default_prefetch_count")]
    pub prefetch_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_refresh_interval_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

fn default_prefetch_count() -> usize {
    DEFAULT_PREFETCH_COUNT
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// The remote manifest: photo paths plus an optional last-update timestamp.
///
/// Parsing is shape-tolerant by contract: a missing or malformed `photos`
/// field yields an empty list, non-string entries are skipped, unknown
/// fields are ignored. Only a body that is not valid JSON at all is an error
/// at the fetch layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub photos: Vec<String>,
    /// Epoch seconds of the last manifest update, if the publisher set one.
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl Manifest {
    /// Extract a manifest from an already-parsed JSON value.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let photos = value
            .get("photos")
            .and_then(serde_json::Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        let updated_at = value.get("updatedAt").and_then(serde_json::Value::as_i64);
        Manifest { photos, updated_at }
    }

    /// Parse a manifest from a JSON document body.
    ///
    /// Fails only when `body` is not valid JSON; shape problems degrade to
    /// an empty photo list instead.
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        Ok(Self::from_value(&value))
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SyncStatus
// ---------------------------------------------------------------------------

/// Presentation state of one refresh cycle.
///
/// Owned by the refresh pipeline; read by the renderer, the status command,
/// and the daemon. Idle is the absence of a recorded status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SyncStatus {
    Loading,
    Loaded {
        count: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        updated_at: Option<i64>,
    },
    Empty,
    Error {
        message: String,
    },
}

impl SyncStatus {
    /// Stable machine-readable key for JSON output.
    pub fn key(&self) -> &'static str {
        match self {
            SyncStatus::Loading => "loading",
            SyncStatus::Loaded { .. } => "loaded",
            SyncStatus::Empty => "empty",
            SyncStatus::Error { .. } => "error",
        }
    }

    /// The human-readable status line shown in the rendered page and the CLI.
    pub fn status_line(&self) -> String {
        match self {
            SyncStatus::Loading => "Loading…".to_string(),
            SyncStatus::Loaded { count, .. } => format!("{count} photo(s)"),
            SyncStatus::Empty => "No photos found.".to_string(),
            SyncStatus::Error { message } => format!("Error: {message}"),
        }
    }

    /// Whether the empty-state indicator should be visible for this status.
    pub fn shows_empty_state(&self) -> bool {
        matches!(self, SyncStatus::Empty | SyncStatus::Error { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SyncStatus::Error { .. })
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.status_line())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
