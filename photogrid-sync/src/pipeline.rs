//! Shared refresh pipeline entrypoint used by CLI and daemon.

use std::path::Path;

use crate::{refresh_all, refresh_gallery, RefreshReport, SyncError};

/// Scope for a refresh pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshScope {
    /// Refresh every registered gallery.
    All,
    /// Refresh a single named gallery.
    Gallery(String),
}

/// Run the refresh pipeline for a scope.
///
/// This is the canonical refresh entrypoint for both `photogrid refresh` and
/// the daemon's timer- and socket-triggered jobs.
pub fn run(
    home: &Path,
    scope: RefreshScope,
    dry_run: bool,
) -> Result<Vec<RefreshReport>, SyncError> {
    match scope {
        RefreshScope::All => refresh_all(home, dry_run),
        RefreshScope::Gallery(name) => Ok(vec![refresh_gallery(&name, home, dry_run)?]),
    }
}
