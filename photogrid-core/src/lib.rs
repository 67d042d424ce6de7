//! Photogrid core library — domain types, gallery registry, shuffling, errors.
//!
//! Public API surface:
//! - [`types`] — newtypes, registry structs, [`types::Manifest`], [`types::SyncStatus`]
//! - [`error`] — [`RegistryError`]
//! - [`registry`] — load / save / list / init
//! - [`shuffle`] — uniform display-order permutation

pub mod error;
pub mod registry;
pub mod shuffle;
pub mod types;

pub use error::RegistryError;
pub use types::{Gallery, GalleryName, Manifest, SyncStatus};
