//! `photogrid init <name> --url <manifest-url> --site <dir>`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use photogrid_core::{registry, types::GalleryName};

/// Register a gallery in the photogrid registry.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Gallery name (e.g. "wall", "lobby").
    pub name: String,

    /// URL of the manifest JSON document (e.g.
    /// https://example.net/assets/gallery.json).
    #[arg(long)]
    pub url: String,

    /// Directory the rendered site is written into.
    #[arg(long = "site", value_name = "DIR")]
    pub site_dir: PathBuf,

    /// Seconds between automatic refreshes (default 600).
    #[arg(long)]
    pub interval: Option<u64>,

    /// Number of leading photos to emit preload hints for (default 8).
    #[arg(long)]
    pub prefetch: Option<usize>,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        // Store an absolute site path so the daemon's cwd never matters.
        let site_dir = if self.site_dir.is_absolute() {
            self.site_dir
        } else {
            std::env::current_dir()
                .context("cannot resolve current directory")?
                .join(self.site_dir)
        };

        let name = self.name.clone();
        let gallery = registry::init(
            GalleryName::from(self.name),
            self.url,
            site_dir,
            self.interval,
            self.prefetch,
        )
        .with_context(|| format!("failed to init gallery '{name}'"))?;

        println!("✓ Registered gallery '{}'", gallery.name);
        println!("  Manifest: {}", gallery.manifest_url);
        println!("  Site:     {}", gallery.site_dir.display());
        println!(
            "  Saved to: ~/.photogrid/galleries/{}.yaml",
            gallery.name
        );
        Ok(())
    }
}
