//! Page context — serializable rendering payload for one refresh cycle.

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

use photogrid_core::types::{Gallery, SyncStatus};

use crate::error::RenderError;

/// Rendering payload for the gallery page.
///
/// Built fresh each refresh from the gallery config, the cycle's
/// [`SyncStatus`], and the shuffled display order. Nothing here outlives the
/// cycle that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContext {
    pub gallery_name: String,
    /// Human-readable status line ("3 photo(s)", "No photos found.", …).
    pub status_line: String,
    /// "Updated: …" line, or empty when the manifest carried no timestamp.
    pub updated_line: String,
    /// Whether the empty-state indicator is visible.
    pub empty: bool,
    /// Display-order cards.
    pub photos: Vec<CardCtx>,
    /// Leading display-order paths to emit preload hints for.
    pub prefetch: Vec<String>,
    /// Drives the page's `<meta http-equiv="refresh">` cadence.
    pub refresh_interval_secs: u64,
    pub meta: MetaCtx,
}

/// One grid card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardCtx {
    pub src: String,
}

/// Build metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaCtx {
    pub version: String,
}

impl PageContext {
    /// Assemble the context for one refresh cycle.
    ///
    /// `display_order` is the already-shuffled photo list; `updated_at` is the
    /// manifest's epoch-seconds timestamp when present (shown regardless of
    /// whether the cycle found photos, matching the status surface contract).
    pub fn from_parts(
        gallery: &Gallery,
        status: &SyncStatus,
        display_order: &[String],
        updated_at: Option<i64>,
    ) -> Self {
        let photos = display_order
            .iter()
            .map(|src| CardCtx { src: src.clone() })
            .collect();
        let prefetch = display_order
            .iter()
            .take(gallery.prefetch_count)
            .cloned()
            .collect();

        PageContext {
            gallery_name: gallery.name.0.clone(),
            status_line: status.status_line(),
            updated_line: updated_at.map(updated_line).unwrap_or_default(),
            empty: status.shows_empty_state(),
            photos,
            prefetch,
            refresh_interval_secs: gallery.refresh_interval_secs,
            meta: MetaCtx {
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

/// Format the manifest's epoch-seconds timestamp for the status surface.
///
/// Out-of-range timestamps yield an empty line rather than an error.
pub fn updated_line(epoch_seconds: i64) -> String {
    match Utc.timestamp_opt(epoch_seconds, 0).single() {
        Some(ts) => format!("Updated: {}", ts.format("%Y-%m-%d %H:%M UTC")),
        None => String::new(),
    }
}
