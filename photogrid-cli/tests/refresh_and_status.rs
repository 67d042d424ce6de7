//! End-to-end refresh + status reporting through the binary.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::thread;

use assert_cmd::Command;
use photogrid_core::{registry, types::GalleryName};
use predicates::prelude::predicate;
use tempfile::TempDir;

fn serve_once(body: &'static str) -> String {
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
    format!("http://{addr}/assets/gallery.json")
}

fn dead_url() -> String {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr")
    };
    format!("http://{addr}/gallery.json")
}

fn photogrid(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("photogrid").expect("binary");
    cmd.env("HOME", home).env("USERPROFILE", home);
    cmd
}

#[test]
fn refresh_writes_site_and_status_reports_loaded() {
    let home = TempDir::new().unwrap();
    let site = TempDir::new().unwrap();

    registry::init_at(
        home.path(),
        GalleryName::from("wall"),
        serve_once(r#"{"photos":["a.jpg","b.jpg"],"updatedAt":1700000000}"#),
        PathBuf::from(site.path()),
        None,
        None,
    )
    .expect("init");

    photogrid(home.path())
        .arg("refresh")
        .arg("wall")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 photo(s)"));

    let html = std::fs::read_to_string(site.path().join("index.html")).expect("index written");
    assert!(html.contains("src=\"a.jpg\""));
    assert!(html.contains("src=\"b.jpg\""));

    // Human-readable status table.
    photogrid(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("wall"))
        .stdout(predicate::str::contains("LOADED"));

    // Machine-readable status.
    let assert = photogrid(home.path())
        .arg("status")
        .arg("--json")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let payload: serde_json::Value = serde_json::from_str(&stdout).expect("status JSON");
    assert_eq!(payload["summary"]["galleries"], serde_json::json!(1));
    assert_eq!(payload["summary"]["errors"], serde_json::json!(0));
    assert_eq!(payload["galleries"][0]["status"], serde_json::json!("loaded"));
    assert_eq!(payload["galleries"][0]["photos"], serde_json::json!(2));
}

#[test]
fn failed_refresh_exits_zero_and_status_reports_error() {
    let home = TempDir::new().unwrap();
    let site = TempDir::new().unwrap();

    registry::init_at(
        home.path(),
        GalleryName::from("wall"),
        dead_url(),
        PathBuf::from(site.path()),
        None,
        None,
    )
    .expect("init");

    // The refresh cycle captures the failure; the command itself succeeds.
    photogrid(home.path())
        .arg("refresh")
        .arg("wall")
        .assert()
        .success()
        .stdout(predicate::str::contains("Error:"));

    // A first failed cycle renders the error surface in place of a grid.
    let html = std::fs::read_to_string(site.path().join("index.html")).expect("error page");
    assert!(html.contains("Error:"), "error status missing from page: {html}");

    photogrid(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("ERROR"));
}

#[test]
fn init_through_cli_registers_gallery() {
    let home = TempDir::new().unwrap();
    photogrid(home.path())
        .arg("init")
        .arg("wall")
        .arg("--url")
        .arg("https://example.net/assets/gallery.json")
        .arg("--site")
        .arg("/srv/wall")
        .arg("--interval")
        .arg("300")
        .assert()
        .success()
        .stdout(predicate::str::contains("Registered gallery 'wall'"));

    assert!(home
        .path()
        .join(".photogrid/galleries/wall.yaml")
        .exists());
    let gallery = registry::load_gallery_at(home.path(), &GalleryName::from("wall"))
        .expect("gallery readable");
    assert_eq!(gallery.refresh_interval_secs, 300);
}

#[test]
fn status_with_no_galleries_prints_hint() {
    let home = TempDir::new().unwrap();
    photogrid(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No galleries registered."));
}

#[test]
fn never_refreshed_gallery_shows_in_status() {
    let home = TempDir::new().unwrap();
    registry::init_at(
        home.path(),
        GalleryName::from("wall"),
        "https://example.net/gallery.json".to_string(),
        PathBuf::from("/srv/wall"),
        None,
        None,
    )
    .expect("init");

    photogrid(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("NEVER REFRESHED"))
        .stdout(predicate::str::contains("never"));
}

#[test]
fn gallery_list_shows_registration() {
    let home = TempDir::new().unwrap();
    registry::init_at(
        home.path(),
        GalleryName::from("wall"),
        "https://example.net/assets/gallery.json".to_string(),
        PathBuf::from("/srv/wall"),
        Some(120),
        None,
    )
    .expect("init");

    photogrid(home.path())
        .arg("gallery")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("wall"))
        .stdout(predicate::str::contains("https://example.net/assets/gallery.json"))
        .stdout(predicate::str::contains("every 120s"));
}
