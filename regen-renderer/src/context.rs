//! Render context: serializable payload handed to the in-process engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::RenderRequest;
use crate::error::RenderError;

/// Variables visible to a template.
///
/// Flags are flattened to top-level variables so `-DEMIT_KIND=Decl` reads as
/// `{{ EMIT_KIND }}` inside the template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderContext {
    pub template_name: String,
    pub template_path: String,
    pub output_name: String,
    #[serde(flatten)]
    pub flags: BTreeMap<String, String>,
}

impl RenderContext {
    /// Build a [`RenderContext`] from a render request.
    pub fn from_request(request: &RenderRequest<'_>) -> Self {
        let file_name = |p: &std::path::Path| {
            p.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        };
        RenderContext {
            template_name: file_name(request.template),
            template_path: request.template.display().to_string(),
            output_name: file_name(request.output),
            flags: request
                .flags
                .iter()
                .map(|f| (f.name.clone(), f.value.clone()))
                .collect(),
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(|e| RenderError::Template {
            path: self.template_path.clone().into(),
            detail: e.to_string(),
        })
    }
}
