//! `photogrid refresh` — fetch, shuffle, and render for one or all galleries.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use photogrid_sync::{
    pipeline::{self, RefreshScope},
    RefreshReport, WriteResult,
};

/// Arguments for `photogrid refresh`.
#[derive(Args, Debug)]
pub struct RefreshArgs {
    /// Name of the gallery to refresh (omit when using `--all`).
    pub gallery: Option<String>,

    /// Refresh every registered gallery.
    #[arg(long, conflicts_with = "gallery")]
    pub all: bool,

    /// Show what would be written without actually writing any files.
    #[arg(long)]
    pub dry_run: bool,
}

impl RefreshArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;

        if self.all {
            let reports = pipeline::run(&home, RefreshScope::All, self.dry_run)
                .context("refresh --all failed")?;
            for report in &reports {
                print_report(report, self.dry_run);
            }
            if reports.is_empty() {
                println!("No galleries registered. Run `photogrid init` first.");
            }
        } else {
            let name = self
                .gallery
                .clone()
                .context("provide a gallery name or use --all")?;
            let mut reports =
                pipeline::run(&home, RefreshScope::Gallery(name.clone()), self.dry_run)
                    .with_context(|| format!("refresh failed for '{name}'"))?;
            if let Some(report) = reports.pop() {
                print_report(&report, self.dry_run);
            }
        }

        Ok(())
    }
}

fn print_report(report: &RefreshReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };

    if report.status.is_error() {
        println!(
            "{prefix}{} '{}' — {}",
            "✗".red(),
            report.gallery_name,
            report.status
        );
        if report.writes.is_empty() {
            println!("  previous site contents kept");
        } else {
            print_writes(&report.writes);
        }
        return;
    }

    let written = report
        .writes
        .iter()
        .filter(|r| {
            matches!(
                r,
                WriteResult::Written { .. } | WriteResult::WouldWrite { .. }
            )
        })
        .count();
    let unchanged = report
        .writes
        .iter()
        .filter(|r| matches!(r, WriteResult::Unchanged { .. }))
        .count();

    println!(
        "{prefix}✓ '{}' — {} ({written} written, {unchanged} unchanged)",
        report.gallery_name, report.status,
    );
    print_writes(&report.writes);
}

fn print_writes(writes: &[WriteResult]) {
    for r in writes {
        match r {
            WriteResult::Written { path } => println!("  ✎  {}", path.display()),
            WriteResult::WouldWrite { path } => println!("  ~  {}", path.display()),
            WriteResult::Unchanged { path } => println!("  ·  {}", path.display()),
        }
    }
}
