//! Size-based log rotation for the daemon log file.
//!
//! Rotates `daemon.log` when it exceeds 10 MiB.
//! Keeps at most 5 rotated copies using the scheme:
//!   daemon.log → daemon.log.1 → daemon.log.2 → … → daemon.log.5

use std::fs;
use std::io;
use std::path::Path;

/// Maximum log file size before rotation (10 MiB).
pub const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

/// Maximum number of rotated backup files to keep.
pub const MAX_ROTATED_FILES: usize = 5;

/// Rotate `log_path` if its size exceeds `max_bytes`.
///
/// Rotation sequence (oldest first):
///   `<name>.<max_files>` deleted
///   `<name>.<n>` → `<name>.<n+1>` for n = max_files-1 … 1
///   `<name>` → `<name>.1`
///   Create fresh empty `<name>`.
///
/// Returns `true` if rotation occurred, `false` if the file was under the
/// threshold (or did not exist yet).
///
/// # Errors
/// Returns `io::Error` only on unexpected filesystem failures; missing files
/// are silently skipped.
pub fn rotate_if_needed(
    log_path: &Path,
    max_bytes: u64,
    max_files: usize,
) -> io::Result<bool> {
    let size = match fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };

    if size < max_bytes {
        return Ok(false);
    }

    // Remove the oldest file so we don't exceed max_files.
    let oldest = numbered_path(log_path, max_files);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }

    // Shift existing rotated files up by one.
    for n in (1..max_files).rev() {
        let src = numbered_path(log_path, n);
        let dst = numbered_path(log_path, n + 1);
        if src.exists() {
            fs::rename(&src, &dst)?;
        }
    }

    // Rename live log → .1
    fs::rename(log_path, numbered_path(log_path, 1))?;

    // Create fresh empty log file so the daemon always has a writable path.
    let _ = fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(log_path)?;

    Ok(true)
}

/// Rotate the daemon log under `home`.
///
/// Errors are logged as warnings; rotation never takes the daemon down.
pub fn rotate_logs(home: &Path) {
    let log = crate::paths::log_path(home);
    match rotate_if_needed(&log, MAX_LOG_BYTES, MAX_ROTATED_FILES) {
        Ok(true) => tracing::info!("log file rotated: {}", log.display()),
        Ok(false) => {}
        Err(err) => tracing::warn!("log rotation failed for {}: {err}", log.display()),
    }
}

/// Build the path for the `n`-th rotated copy of `base` (e.g. `daemon.log.2`).
fn numbered_path(base: &Path, n: usize) -> std::path::PathBuf {
    let name = base
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("daemon.log");
    base.with_file_name(format!("{name}.{n}"))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
