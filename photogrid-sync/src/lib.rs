//! # photogrid-sync
//!
//! Hash-gated atomic writer and refresh orchestration.
//!
//! Call [`refresh_gallery`] to run one fetch → shuffle → render → write cycle
//! for a single registered gallery, or [`refresh_all`] to process every
//! registered gallery. [`builder`] publishes a manifest from a local photo
//! directory; [`diff`] compares the remote photo list against the last
//! refresh.

pub mod builder;
pub mod diff;
pub mod error;
pub mod pipeline;
pub mod state_store;
pub mod writer;

pub use builder::{build_manifest, BuildOutcome};
pub use diff::{diff_gallery, ManifestDiff};
pub use error::SyncError;
pub use writer::{refresh_all, refresh_gallery, RefreshReport, WriteResult};
