//! `photogrid status` — last refresh outcome and visibility.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use photogrid_core::{registry, types::Gallery, SyncStatus};
use photogrid_sync::state_store;

/// Arguments for `photogrid status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;

        let galleries = registry::list_galleries_at(&home)
            .context("failed to load registry — run `photogrid init` first")?;

        let report = build_report(&home, &galleries)?;
        if self.json {
            print_json(report)?;
            return Ok(());
        }

        print_table(report);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct GalleryStatus {
    gallery: String,
    /// Last recorded refresh outcome; `None` = never refreshed.
    status: Option<SyncStatus>,
    detail: String,
    last_refresh_age: String,
    last_refresh_at: Option<String>,
    photos: usize,
}

#[derive(Debug, Clone)]
struct StatusReport {
    error_count: usize,
    galleries: Vec<GalleryStatus>,
}

#[derive(Serialize)]
struct StatusReportJson {
    summary: StatusSummaryJson,
    galleries: Vec<GalleryStatusJson>,
}

#[derive(Serialize)]
struct StatusSummaryJson {
    galleries: usize,
    errors: usize,
}

#[derive(Serialize)]
struct GalleryStatusJson {
    gallery: String,
    status: String,
    detail: String,
    last_refresh_age: String,
    last_refresh_at: Option<String>,
    photos: usize,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "gallery")]
    gallery: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "detail")]
    detail: String,
    #[tabled(rename = "last refresh")]
    last_refresh: String,
    #[tabled(rename = "photos")]
    photos: usize,
}

fn build_report(home: &Path, galleries: &[Gallery]) -> Result<StatusReport> {
    let mut rows = Vec::new();
    for gallery in galleries {
        let state = state_store::load_at(home, &gallery.name.0)
            .with_context(|| format!("failed to load state for '{}'", gallery.name))?;

        let row = match state {
            None => GalleryStatus {
                gallery: gallery.name.0.clone(),
                status: None,
                detail: "no refresh recorded".to_string(),
                last_refresh_age: "never".to_string(),
                last_refresh_at: None,
                photos: 0,
            },
            Some(state) => GalleryStatus {
                gallery: gallery.name.0.clone(),
                detail: state.last_status.status_line(),
                status: Some(state.last_status),
                last_refresh_age: format_datetime_age(state.refreshed_at),
                last_refresh_at: Some(state.refreshed_at.to_rfc3339()),
                photos: state.photos.len(),
            },
        };
        rows.push(row);
    }

    let error_count = rows
        .iter()
        .filter(|r| matches!(r.status, Some(SyncStatus::Error { .. })))
        .count();

    Ok(StatusReport {
        error_count,
        galleries: rows,
    })
}

/// Compact age from a refresh timestamp ("42s", "7m", "3h", "2d").
fn format_datetime_age(timestamp: DateTime<Utc>) -> String {
    let age = Utc::now()
        .signed_duration_since(timestamp)
        .num_seconds()
        .max(0) as u64;
    format_seconds(age)
}

fn format_seconds(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}

fn print_json(report: StatusReport) -> Result<()> {
    let payload = StatusReportJson {
        summary: StatusSummaryJson {
            galleries: report.galleries.len(),
            errors: report.error_count,
        },
        galleries: report
            .galleries
            .into_iter()
            .map(|row| GalleryStatusJson {
                gallery: row.gallery,
                status: status_key(row.status.as_ref()).to_string(),
                detail: row.detail,
                last_refresh_age: row.last_refresh_age,
                last_refresh_at: row.last_refresh_at,
                photos: row.photos,
            })
            .collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(report: StatusReport) {
    println!(
        "photogrid v{} | {} galleries | {} errors",
        env!("CARGO_PKG_VERSION"),
        report.galleries.len(),
        report.error_count,
    );

    if report.galleries.is_empty() {
        println!("No galleries registered.");
        return;
    }

    let separator = "■".repeat(67).bright_black().to_string();
    println!("{separator}");
    println!(
        "Indicators: {} LOADED  {} EMPTY  {} ERROR  {} NEVER REFRESHED",
        status_indicator(Some(&SyncStatus::Loaded { count: 0, updated_at: None })),
        status_indicator(Some(&SyncStatus::Empty)),
        status_indicator(Some(&SyncStatus::Error { message: String::new() })),
        status_indicator(None),
    );
    println!("{separator}");

    let table_rows: Vec<StatusTableRow> = report
        .galleries
        .into_iter()
        .map(|row| StatusTableRow {
            gallery: row.gallery,
            status: status_label(row.status.as_ref()).to_string(),
            detail: row.detail,
            last_refresh: row.last_refresh_age,
            photos: row.photos,
        })
        .collect();
    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");
    println!("{separator}");

    if report.error_count > 0 {
        println!("Run 'photogrid refresh --all' to retry failed galleries.");
    }
}

fn status_key(status: Option<&SyncStatus>) -> &'static str {
    match status {
        None => "never_refreshed",
        Some(status) => status.key(),
    }
}

fn status_label(status: Option<&SyncStatus>) -> &'static str {
    match status {
        None => "NEVER REFRESHED",
        Some(SyncStatus::Loading) => "LOADING",
        Some(SyncStatus::Loaded { .. }) => "LOADED",
        Some(SyncStatus::Empty) => "EMPTY",
        Some(SyncStatus::Error { .. }) => "ERROR",
    }
}

fn status_indicator(status: Option<&SyncStatus>) -> String {
    match status {
        None => "■".bright_black().bold().to_string(),
        Some(SyncStatus::Loading) => "■".blue().bold().to_string(),
        Some(SyncStatus::Loaded { .. }) => "■".green().bold().to_string(),
        Some(SyncStatus::Empty) => "■".yellow().bold().to_string(),
        Some(SyncStatus::Error { .. }) => "■".red().bold().to_string(),
    }
}
