//! `photogrid manifest build <photos-dir>` — publish a gallery.json.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use photogrid_sync::build_manifest;

/// Build a manifest from a local photo directory.
#[derive(Subcommand, Debug)]
pub enum ManifestCommand {
    /// Scan a photo directory and write the manifest JSON.
    Build(BuildArgs),
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Directory containing the photos (top level only).
    pub photos_dir: PathBuf,

    /// Manifest file to write (e.g. site/assets/gallery.json).
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// Path prefix for photo entries, as served relative to the page.
    #[arg(long, default_value = "./assets/photos")]
    pub base_path: String,
}

pub fn run(cmd: ManifestCommand) -> Result<()> {
    match cmd {
        ManifestCommand::Build(args) => build(args),
    }
}

fn build(args: BuildArgs) -> Result<()> {
    let outcome = build_manifest(&args.photos_dir, &args.output, &args.base_path)
        .with_context(|| {
            format!(
                "failed to build manifest from '{}'",
                args.photos_dir.display()
            )
        })?;

    println!(
        "✓ Wrote {} ({} photos, {} changed, {} removed)",
        outcome.manifest_path.display(),
        outcome.photo_count,
        outcome.changed,
        outcome.removed
    );
    Ok(())
}
