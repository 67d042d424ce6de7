//! `photogrid gallery list`

use anyhow::{Context, Result};
use clap::Subcommand;

use photogrid_core::registry;

/// Inspect registered galleries.
#[derive(Subcommand, Debug)]
pub enum GalleryCommand {
    /// List all registered galleries.
    List,
}

pub fn run(cmd: GalleryCommand) -> Result<()> {
    match cmd {
        GalleryCommand::List => list(),
    }
}

fn list() -> Result<()> {
    let galleries = registry::list_galleries()
        .context("failed to load registry — run `photogrid init` first")?;

    if galleries.is_empty() {
        println!("No galleries registered.");
        println!("Run: photogrid init <name> --url <manifest-url> --site <dir>");
        return Ok(());
    }

    for gallery in &galleries {
        println!("{}", gallery.name);
        println!("  manifest: {}", gallery.manifest_url);
        println!("  site:     {}", gallery.site_dir.display());
        println!(
            "  refresh:  every {}s (prefetch {})",
            gallery.refresh_interval_secs, gallery.prefetch_count
        );
    }

    Ok(())
}
