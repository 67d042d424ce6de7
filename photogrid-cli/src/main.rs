//! Photogrid — gallery refresh CLI.
//!
//! # Usage
//!
//! ```text
//! photogrid init <name> --url <manifest-url> --site <dir> [--interval <secs>] [--prefetch <n>]
//! photogrid gallery list
//! photogrid refresh <gallery> [--dry-run]
//! photogrid refresh --all [--dry-run]
//! photogrid status [--json]
//! photogrid diff <gallery>
//! photogrid manifest build <photos-dir> --output <gallery.json> [--base-path <prefix>]
//! photogrid daemon start|stop|status|logs
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    daemon::DaemonCommand, diff::DiffArgs, gallery::GalleryCommand, init::InitArgs,
    manifest::ManifestCommand, refresh::RefreshArgs, status::StatusArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "photogrid",
    version,
    about = "Fetch photo manifests and render shuffled gallery pages",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register a gallery in the photogrid registry.
    Init(InitArgs),

    /// Inspect registered galleries.
    Gallery {
        #[command(subcommand)]
        command: GalleryCommand,
    },

    /// Fetch, shuffle, and render the site for one or all galleries.
    Refresh(RefreshArgs),

    /// Show last refresh outcome across registered galleries.
    Status(StatusArgs),

    /// Show how the remote photo list changed since the last refresh.
    Diff(DiffArgs),

    /// Build a manifest from a local photo directory.
    Manifest {
        #[command(subcommand)]
        command: ManifestCommand,
    },

    /// Manage the photogrid background daemon.
    Daemon {
        #[command(subcommand)]
        command: DaemonCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Gallery { command } => commands::gallery::run(command),
        Commands::Refresh(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Manifest { command } => commands::manifest::run(command),
        Commands::Daemon { command } => commands::daemon::run(command),
    }
}
