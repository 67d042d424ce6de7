//! Manifest diff support for `photogrid diff`.
//!
//! Compares the photo list the manifest currently serves against the list
//! recorded at the gallery's last completed refresh. Both sides are sorted
//! before diffing — display order is randomized per cycle and must not show
//! up as churn here.

use std::collections::BTreeSet;
use std::path::Path;

use similar::TextDiff;

use photogrid_core::{registry, types::GalleryName};
use photogrid_fetcher::ManifestFetcher;

use crate::{state_store, SyncError};

/// Photo-list difference between the remote manifest and the last refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestDiff {
    pub gallery_name: String,
    /// Unified diff of the sorted photo lists; `None` when identical.
    pub unified_diff: Option<String>,
    pub added: usize,
    pub removed: usize,
}

/// Fetch the manifest and diff its photo list against the last refresh.
///
/// No files are written. Unlike `refresh`, a fetch failure here is an error:
/// there is nothing useful to report without the remote list.
pub fn diff_gallery(gallery_name: &str, home: &Path) -> Result<ManifestDiff, SyncError> {
    let gallery = registry::load_gallery_at(home, &GalleryName::from(gallery_name))?;
    let manifest = ManifestFetcher::new(&gallery.manifest_url)?.fetch()?;

    let known: Vec<String> = state_store::load_at(home, gallery_name)?
        .map(|state| state.photos)
        .unwrap_or_default();

    let mut before: Vec<&str> = known.iter().map(String::as_str).collect();
    before.sort_unstable();
    let mut after: Vec<&str> = manifest.photos.iter().map(String::as_str).collect();
    after.sort_unstable();

    let before_set: BTreeSet<&str> = before.iter().copied().collect();
    let after_set: BTreeSet<&str> = after.iter().copied().collect();
    let added = after_set.difference(&before_set).count();
    let removed = before_set.difference(&after_set).count();

    let unified_diff = if before == after {
        None
    } else {
        let old_text = joined(&before);
        let new_text = joined(&after);
        Some(
            TextDiff::from_lines(&old_text, &new_text)
                .unified_diff()
                .header("a/photos", "b/photos")
                .context_radius(3)
                .to_string(),
        )
    };

    Ok(ManifestDiff {
        gallery_name: gallery_name.to_string(),
        unified_diff,
        added,
        removed,
    })
}

fn joined(lines: &[&str]) -> String {
    let mut text = lines.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::path::PathBuf;
    use std::thread;

    use chrono::Utc;
    use photogrid_core::registry;
    use tempfile::TempDir;

    use crate::state_store::StateFile;

    use super::*;

    fn serve_once(body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 8192];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/gallery.json")
    }

    fn setup_gallery(home: &Path, manifest_url: String) {
        registry::init_at(
            home,
            GalleryName::from("wall"),
            manifest_url,
            PathBuf::from("/srv/wall"),
            None,
            None,
        )
        .expect("init");
    }

    fn record_photos(home: &Path, photos: &[&str]) {
        let mut state = StateFile::new(Utc::now());
        state.photos = photos.iter().map(|p| p.to_string()).collect();
        state_store::save_at(home, "wall", &state).expect("save state");
    }

    #[test]
    fn never_refreshed_gallery_shows_everything_as_added() {
        let home = TempDir::new().unwrap();
        setup_gallery(home.path(), serve_once(r#"{"photos":["a.jpg","b.jpg"]}"#.into()));

        let diff = diff_gallery("wall", home.path()).expect("diff");
        assert_eq!(diff.added, 2);
        assert_eq!(diff.removed, 0);
        let unified = diff.unified_diff.expect("diff text");
        assert!(unified.contains("--- a/photos"));
        assert!(unified.contains("+++ b/photos"));
        assert!(unified.contains("+a.jpg"));
    }

    #[test]
    fn identical_photo_lists_produce_no_diff() {
        let home = TempDir::new().unwrap();
        setup_gallery(home.path(), serve_once(r#"{"photos":["b.jpg","a.jpg"]}"#.into()));
        record_photos(home.path(), &["a.jpg", "b.jpg"]);

        let diff = diff_gallery("wall", home.path()).expect("diff");
        assert!(diff.unified_diff.is_none(), "order differences must not count");
        assert_eq!(diff.added, 0);
        assert_eq!(diff.removed, 0);
    }

    #[test]
    fn added_and_removed_photos_are_counted() {
        let home = TempDir::new().unwrap();
        setup_gallery(home.path(), serve_once(r#"{"photos":["a.jpg","c.jpg"]}"#.into()));
        record_photos(home.path(), &["a.jpg", "b.jpg"]);

        let diff = diff_gallery("wall", home.path()).expect("diff");
        assert_eq!(diff.added, 1);
        assert_eq!(diff.removed, 1);
        let unified = diff.unified_diff.expect("diff text");
        assert!(unified.contains("+c.jpg"));
        assert!(unified.contains("-b.jpg"));
    }

    #[test]
    fn fetch_failure_is_an_error_for_diff() {
        let home = TempDir::new().unwrap();
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr")
        };
        setup_gallery(home.path(), format!("http://{addr}/gallery.json"));

        let err = diff_gallery("wall", home.path()).unwrap_err();
        assert!(matches!(err, SyncError::Fetch(_)), "got: {err}");
    }
}
