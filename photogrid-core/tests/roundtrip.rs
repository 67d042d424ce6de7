//! Roundtrip serialisation tests for `photogrid-core` types.
//!
//! Each `#[case]` is isolated — no shared state.

use chrono::Utc;
use photogrid_core::types::{Gallery, GalleryName, Manifest, SyncStatus};
use rstest::rstest;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn minimal_gallery() -> Gallery {
    let now = Utc::now();
    Gallery {
        name: GalleryName::from("wall"),
        manifest_url: "https://example.net/gallery.json".to_string(),
        site_dir: PathBuf::from("/srv/wall"),
        refresh_interval_secs: 600,
        prefetch_count: 8,
        created_at: now,
        updated_at: now,
    }
}

fn tuned_gallery() -> Gallery {
    let now = Utc::now();
    Gallery {
        name: GalleryName::from("lobby-screen"),
        manifest_url: "https://cdn.example.net/feeds/lobby.json?v=2".to_string(),
        site_dir: PathBuf::from("/var/www/lobby"),
        refresh_interval_secs: 45,
        prefetch_count: 0,
        created_at: now,
        updated_at: now,
    }
}

fn unicode_gallery() -> Gallery {
    let now = Utc::now();
    Gallery {
        name: GalleryName::from("ギャラリー-галерея"),
        manifest_url: "https://example.net/写真/gallery.json".to_string(),
        site_dir: PathBuf::from("/srv/写真"),
        refresh_interval_secs: 600,
        prefetch_count: 8,
        created_at: now,
        updated_at: now,
    }
}

// ---------------------------------------------------------------------------
// Parameterised gallery roundtrip
// ---------------------------------------------------------------------------

#[rstest]
#[case("minimal", minimal_gallery())]
#[case("tuned", tuned_gallery())]
#[case("unicode", unicode_gallery())]
fn gallery_roundtrip(#[case] label: &str, #[case] gallery: Gallery) {
    let yaml = serde_yaml::to_string(&gallery)
        .unwrap_or_else(|e| panic!("[{label}] serialize failed: {e}"));
    let back: Gallery = serde_yaml::from_str(&yaml)
        .unwrap_or_else(|e| panic!("[{label}] deserialize failed: {e}"));
    assert_eq!(gallery.name, back.name, "[{label}] name");
    assert_eq!(gallery.manifest_url, back.manifest_url, "[{label}] url");
    assert_eq!(gallery.site_dir, back.site_dir, "[{label}] site_dir");
    assert_eq!(
        gallery.refresh_interval_secs, back.refresh_interval_secs,
        "[{label}] interval"
    );
    assert_eq!(gallery.prefetch_count, back.prefetch_count, "[{label}] prefetch");
}

// ---------------------------------------------------------------------------
// Manifest shape tolerance
// ---------------------------------------------------------------------------

#[rstest]
#[case("full", r#"{"photos":["a.jpg","b.jpg"],"updatedAt":1700000000}"#, vec!["a.jpg","b.jpg"], Some(1700000000))]
#[case("no_timestamp", r#"{"photos":["x.png"]}"#, vec!["x.png"], None)]
#[case("missing_photos", r#"{"updatedAt":5}"#, vec![], Some(5))]
#[case("photos_not_array", r#"{"photos":{"nested":true}}"#, vec![], None)]
#[case("empty_object", r#"{}"#, vec![], None)]
#[case("extra_fields", r#"{"photos":["p.webp"],"count":1,"hashes":{"p.webp":"ff"}}"#, vec!["p.webp"], None)]
fn manifest_shape_cases(
    #[case] label: &str,
    #[case] body: &str,
    #[case] photos: Vec<&str>,
    #[case] updated_at: Option<i64>,
) {
    let manifest = Manifest::parse(body).unwrap_or_else(|e| panic!("[{label}] parse failed: {e}"));
    let expected: Vec<String> = photos.into_iter().map(str::to_owned).collect();
    assert_eq!(manifest.photos, expected, "[{label}] photos");
    assert_eq!(manifest.updated_at, updated_at, "[{label}] updatedAt");
}

// ---------------------------------------------------------------------------
// SyncStatus JSON roundtrip (state-store representation)
// ---------------------------------------------------------------------------

#[rstest]
#[case(SyncStatus::Loading)]
#[case(SyncStatus::Loaded { count: 12, updated_at: Some(1700000000) })]
#[case(SyncStatus::Loaded { count: 1, updated_at: None })]
#[case(SyncStatus::Empty)]
#[case(SyncStatus::Error { message: "failed to fetch manifest (HTTP 503)".into() })]
fn sync_status_roundtrip(#[case] status: SyncStatus) {
    let json = serde_json::to_string(&status).expect("serialize");
    let back: SyncStatus = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(status, back);
    assert!(json.contains(status.key()), "tagged key must appear in JSON: {json}");
}
