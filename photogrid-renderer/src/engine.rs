//! Tera rendering engine — [`SiteFile`] enum and [`Renderer`].
//!
//! # Output mapping
//!
//! | Site file  | Output path (relative to the gallery's `site_dir`) |
//! |------------|----------------------------------------------------|
//! | Index      | `index.html`                                       |
//! | Stylesheet | `styles.css`                                       |

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tera::Tera;

use crate::context::PageContext;
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Embedded templates — baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    ("gallery/index.html.tera", include_str!("templates/index.html.tera")),
    ("gallery/styles.css.tera", include_str!("templates/styles.css.tera")),
];

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io { path: path.into(), source }
}

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .to_lowercase()
}

fn collect_template_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), RenderError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_template_files(&path, out)?;
        } else if meta.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn load_user_templates(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    collect_template_files(dir, &mut files)?;
    let mut templates = Vec::new();
    for path in files {
        if path.extension().and_then(|s| s.to_str()) != Some("tera") {
            continue;
        }
        let rel = path
            .strip_prefix(dir)
            .unwrap_or(path.as_path());
        let name = normalize_template_name(rel);
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        templates.push((name, contents));
    }
    Ok(templates)
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut templates: HashMap<String, String> = HashMap::new();
    for (name, content) in TPLS {
        templates.insert(
            normalize_template_name(Path::new(name)),
            (*content).to_string(),
        );
    }
    if let Some(dir) = user_template_dir {
        for (name, content) in load_user_templates(dir)? {
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    let items: Vec<(String, String)> = templates.into_iter().collect();
    tera.add_raw_templates(items)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// SiteFile
// ---------------------------------------------------------------------------

/// The rendered files that make up one gallery site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteFile {
    Index,
    Stylesheet,
}

impl SiteFile {
    /// All site files in a stable order.
    pub fn all() -> &'static [SiteFile] {
        &[SiteFile::Index, SiteFile::Stylesheet]
    }

    /// Template name to render for this file.
    pub fn template_name(&self) -> &'static str {
        match self {
            SiteFile::Index      => "gallery/index.html.tera",
            SiteFile::Stylesheet => "gallery/styles.css.tera",
        }
    }

    /// Output path for this file, relative to the gallery's site root.
    pub fn output_path(&self, site_dir: &Path) -> PathBuf {
        match self {
            SiteFile::Index      => site_dir.join("index.html"),
            SiteFile::Stylesheet => site_dir.join("styles.css"),
        }
    }
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera-based engine for rendering the site with optional user overrides.
///
/// `user_template_dir` may contain `.tera` files that override embedded
/// defaults (an override for the index page lives at
/// `<dir>/gallery/index.html.tera`). Template names are normalised to
/// lowercase relative paths.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Construct a new [`TemplateEngine`], loading embedded templates plus any
    /// overrides found in `user_template_dir`.
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        let tera = build_tera(user_template_dir)?;
        Ok(TemplateEngine { tera })
    }

    /// Render a single site file using the supplied context.
    pub fn render(
        &self,
        ctx: &PageContext,
        file: SiteFile,
        site_dir: &Path,
    ) -> Result<(PathBuf, String), RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        let content = self.tera.render(file.template_name(), &tera_ctx)?;
        Ok((file.output_path(site_dir), content))
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renders every site file for a refresh cycle.
///
/// Uses embedded templates only. Create once with [`Renderer::new`] and reuse.
pub struct Renderer {
    engine: TemplateEngine,
}

impl Renderer {
    /// Construct a new [`Renderer`] with embedded templates.
    pub fn new() -> Result<Self, RenderError> {
        Ok(Renderer { engine: TemplateEngine::new(None)? })
    }

    /// Construct a [`Renderer`] that honours overrides in `user_template_dir`.
    pub fn with_user_templates(user_template_dir: &Path) -> Result<Self, RenderError> {
        Ok(Renderer { engine: TemplateEngine::new(Some(user_template_dir))? })
    }

    /// Render all site files into `site_dir`-relative paths.
    ///
    /// Returns `Vec<(output_path, rendered_content)>` — one entry per file.
    pub fn render_site(
        &self,
        ctx: &PageContext,
        site_dir: &Path,
    ) -> Result<Vec<(PathBuf, String)>, RenderError> {
        let mut results = Vec::with_capacity(SiteFile::all().len());
        for file in SiteFile::all() {
            results.push(self.engine.render(ctx, *file, site_dir)?);
        }
        Ok(results)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
