//! The [`Renderer`] seam and the in-process [`TeraRenderer`].
//!
//! Everything the pipeline does to produce output bytes goes through
//! [`Renderer::render`]. Implementations write exactly one file at
//! `request.output` and touch nothing else.

use std::path::Path;

use tera::Tera;

use regen_core::{config::TeraConfig, Flag, RendererConfig};

use crate::command::CommandRenderer;
use crate::context::RenderContext;
use crate::error::{io_err, RenderError};

// ---------------------------------------------------------------------------
// Renderer trait
// ---------------------------------------------------------------------------

/// One render: template in, one output file out.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub template: &'a Path,
    pub output: &'a Path,
    pub flags: &'a [Flag],
    /// Embed source-location comments pointing back at the template.
    pub annotate: bool,
}

/// What a successful render reports back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOutput {
    /// Captured stdout + stderr of the tool, if any.
    pub output: String,
}

/// Template renderer collaborator.
///
/// Must be shareable across worker threads; each call is independent.
pub trait Renderer: Send + Sync {
    /// Render `request.template` into `request.output`.
    fn render(&self, request: &RenderRequest<'_>) -> Result<RenderOutput, RenderError>;

    /// Check up front that the renderer can run at all (executables present).
    fn preflight(&self) -> Result<(), RenderError> {
        Ok(())
    }

    /// The invocation `render` would perform, for verbose echo.
    fn describe(&self, request: &RenderRequest<'_>) -> String {
        format!("render {} -> {}", request.template.display(), request.output.display())
    }
}

/// Build the renderer selected in the configuration.
pub fn build(config: &RendererConfig) -> Box<dyn Renderer> {
    match config {
        RendererConfig::Command(cmd) => Box::new(CommandRenderer::new(cmd.clone())),
        RendererConfig::Tera(tera) => Box::new(TeraRenderer::new(tera.clone())),
    }
}

// ---------------------------------------------------------------------------
// TeraRenderer
// ---------------------------------------------------------------------------

/// Renders templates in-process with Tera.
///
/// Flags are exposed as template variables (see [`RenderContext`]). With
/// annotation on, the output starts with a `###sourceLocation` comment naming
/// the template.
pub struct TeraRenderer {
    config: TeraConfig,
}

impl TeraRenderer {
    pub fn new(config: TeraConfig) -> Self {
        TeraRenderer { config }
    }

    fn render_to_string(&self, request: &RenderRequest<'_>) -> Result<String, RenderError> {
        let source =
            std::fs::read_to_string(request.template).map_err(|e| io_err(request.template, e))?;
        let name = normalize_template_name(request.template);

        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_template(&name, &source)
            .map_err(|e| template_err(request.template, &e))?;

        let ctx = RenderContext::from_request(request).to_tera_context()?;
        let body = tera
            .render(&name, &ctx)
            .map_err(|e| template_err(request.template, &e))?;

        if !request.annotate {
            return Ok(body);
        }
        Ok(format!(
            "{} ###sourceLocation(file: \"{}\", line: 1)\n{}",
            self.config.comment_prefix,
            request.template.display(),
            body
        ))
    }
}

impl Renderer for TeraRenderer {
    fn render(&self, request: &RenderRequest<'_>) -> Result<RenderOutput, RenderError> {
        let rendered = self.render_to_string(request)?;
        if let Some(parent) = request.output.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        std::fs::write(request.output, rendered).map_err(|e| io_err(request.output, e))?;
        Ok(RenderOutput::default())
    }

    fn describe(&self, request: &RenderRequest<'_>) -> String {
        let flags: Vec<String> = request.flags.iter().map(Flag::to_string).collect();
        format!(
            "tera {} -o {} {}",
            request.template.display(),
            request.output.display(),
            flags.join(" ")
        )
        .trim_end()
        .to_string()
    }
}

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Tera's top-level error message rarely names the real problem; walk the chain.
fn template_err(path: &Path, err: &tera::Error) -> RenderError {
    let mut detail = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        detail.push_str(": ");
        detail.push_str(&inner.to_string());
        source = inner.source();
    }
    RenderError::Template {
        path: path.to_path_buf(),
        detail,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
