//! `photogrid diff <gallery>` — manifest photo-list changes since last refresh.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use photogrid_sync::diff_gallery;

/// Arguments for `photogrid diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Gallery name to diff.
    pub gallery: String,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;

        let result = diff_gallery(&self.gallery, &home)
            .with_context(|| format!("diff failed for '{}'", self.gallery))?;

        match result.unified_diff {
            None => println!("No manifest changes for '{}'.", result.gallery_name),
            Some(diff) => {
                println!(
                    "'{}' — {} added, {} removed",
                    result.gallery_name, result.added, result.removed
                );
                print!("{diff}");
                if !diff.ends_with('\n') {
                    println!();
                }
            }
        }

        Ok(())
    }
}
