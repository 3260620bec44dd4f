// ABOUTME: Manifest rendering by variable substitution into template files.
// ABOUTME: Output paths are deterministic so re-renders overwrite, never accumulate.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use super::TemplateError;
use super::catalog::Facet;

/// A scalar or list value available to template substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CtxValue {
    Str(String),
    Int(i64),
    List(Vec<String>),
}

impl From<&str> for CtxValue {
    fn from(v: &str) -> Self {
        CtxValue::Str(v.to_string())
    }
}

impl From<String> for CtxValue {
    fn from(v: String) -> Self {
        CtxValue::Str(v)
    }
}

impl From<i64> for CtxValue {
    fn from(v: i64) -> Self {
        CtxValue::Int(v)
    }
}

impl From<u32> for CtxValue {
    fn from(v: u32) -> Self {
        CtxValue::Int(v as i64)
    }
}

impl From<Vec<String>> for CtxValue {
    fn from(v: Vec<String>) -> Self {
        CtxValue::List(v)
    }
}

impl CtxValue {
    fn render(&self) -> String {
        match self {
            CtxValue::Str(s) => s.clone(),
            CtxValue::Int(i) => i.to_string(),
            CtxValue::List(items) => {
                let mut out = String::from("[");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "\"{}\"", item);
                }
                out.push(']');
                out
            }
        }
    }
}

/// An insertion-ordered substitution context, built fresh for every render.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    vars: Vec<(String, CtxValue)>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable. Inserting an existing name replaces its value in
    /// place, preserving the original position.
    pub fn set(&mut self, name: &str, value: impl Into<CtxValue>) -> &mut Self {
        let value = value.into();
        match self.vars.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.vars.push((name.to_string(), value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&CtxValue> {
        self.vars.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CtxValue)> {
        self.vars.iter().map(|(n, v)| (n.as_str(), v))
    }
}

/// One rendered output file, handed straight to the external applier.
#[derive(Debug, Clone)]
pub struct RenderedArtifact {
    pub template: PathBuf,
    pub output: PathBuf,
    pub facet: Facet,
}

/// Substitutes a context into templates under a fixed root directory.
pub struct ManifestRenderer {
    templates_root: PathBuf,
}

impl ManifestRenderer {
    pub fn new(templates_root: impl Into<PathBuf>) -> Self {
        Self {
            templates_root: templates_root.into(),
        }
    }

    pub fn templates_root(&self) -> &Path {
        &self.templates_root
    }

    /// Render one template. The naming rule must be pure: same context, same
    /// output path, so repeated renders for the same logical deployment
    /// overwrite rather than accumulate. Truncates any existing file; no
    /// locking (concurrent same-variant renders are last-writer-wins).
    pub fn render(
        &self,
        template_rel: &str,
        ctx: &RenderContext,
        facet: Facet,
        naming_rule: impl Fn(&RenderContext) -> PathBuf,
    ) -> Result<RenderedArtifact, TemplateError> {
        let template_path = self.templates_root.join(template_rel);
        let body = std::fs::read_to_string(&template_path).map_err(|source| {
            TemplateError::TemplateNotFound {
                path: template_path.clone(),
                source,
            }
        })?;

        let rendered = substitute(&body, ctx, &template_path)?;

        let output = naming_rule(ctx);
        std::fs::write(&output, rendered).map_err(|source| TemplateError::Render {
            path: output.clone(),
            source,
        })?;

        tracing::debug!(template = %template_path.display(), output = %output.display(), "rendered");

        Ok(RenderedArtifact {
            template: template_path,
            output,
            facet,
        })
    }
}

/// Replace every `{{ NAME }}` placeholder with its context value. A
/// placeholder with no matching variable is an error: silently leaving
/// template syntax in a manifest produces confusing apply failures later.
fn substitute(body: &str, ctx: &RenderContext, template: &Path) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            // Unterminated braces pass through verbatim.
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let name = after[..end].trim();
        match ctx.get(name) {
            Some(value) => out.push_str(&value.render()),
            None => {
                return Err(TemplateError::UndefinedVariable {
                    name: name.to_string(),
                    template: template.to_path_buf(),
                });
            }
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);

    Ok(out)
}
