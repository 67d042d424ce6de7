//! # photogrid-renderer
//!
//! Tera-based template engine that renders a gallery's static site from one
//! refresh cycle's data.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use photogrid_renderer::{PageContext, Renderer};
//! use photogrid_core::types::{Gallery, SyncStatus};
//!
//! fn render(gallery: &Gallery, order: &[String]) {
//!     let status = SyncStatus::Loaded { count: order.len(), updated_at: None };
//!     let ctx = PageContext::from_parts(gallery, &status, order, None);
//!     if let Ok(renderer) = Renderer::new() {
//!         if let Ok(outputs) = renderer.render_site(&ctx, &gallery.site_dir) {
//!             for (path, content) in outputs {
//!                 println!("{}: {} bytes", path.display(), content.len());
//!             }
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::{updated_line, PageContext};
pub use engine::{Renderer, SiteFile, TemplateEngine};
pub use error::RenderError;
