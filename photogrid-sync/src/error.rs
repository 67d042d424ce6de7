//! Error types for photogrid-sync.
//!
//! Fetch and parse failures are deliberately absent from most of this surface:
//! the refresh path converts them into [`photogrid_core::SyncStatus::Error`]
//! instead of propagating. Only infrastructure failures (registry, rendering,
//! filesystem, state-store serialization) escape as [`SyncError`].

use std::path::PathBuf;

use thiserror::Error;

use photogrid_core::error::RegistryError;
use photogrid_fetcher::FetchError;
use photogrid_renderer::RenderError;

/// All errors that can arise from refresh, build, and diff operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the rendering engine.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// An error from the gallery registry.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (state store, manifest build).
    #[error("state JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Manifest retrieval failure. Raised only by query operations such as
    /// `diff`; the refresh path captures this into the cycle status instead.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
