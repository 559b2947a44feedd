use super::TemplateRenderer;
use async_trait::async_trait;
use common::{DocResult, RenderError};
use domain::{NodeKind, NodeSnapshot, TemplateConfig, TemplateContext};
use minijinja::{Environment, Error, ErrorKind, UndefinedBehavior};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

const CLASS_TEMPLATE: &str = include_str!("../../templates/class.jinja");
const METHOD_TEMPLATE: &str = include_str!("../../templates/method.jinja");
const FIELD_TEMPLATE: &str = include_str!("../../templates/field.jinja");

fn builtin(name: &str) -> Option<&'static str> {
    match name {
        "class.jinja" => Some(CLASS_TEMPLATE),
        "method.jinja" => Some(METHOD_TEMPLATE),
        "field.jinja" => Some(FIELD_TEMPLATE),
        _ => None,
    }
}

fn load_from_dir(dir: &Path, name: &str) -> Result<Option<String>, Error> {
    if name.split(['/', '\\']).any(|segment| segment == "..") {
        return Ok(None);
    }
    match std::fs::read_to_string(dir.join(name)) {
        Ok(source) => Ok(Some(source)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("could not read template {}", name),
        )
        .with_source(e)),
    }
}

/// Deterministic renderer over a minijinja environment.
///
/// Templates resolve from the configured directory first and then from
/// the built-ins, so a user file named `method.jinja` shadows the
/// shipped one and any template can `{% include %}` another. Missing
/// values render as nothing: no errors on undefined names and no
/// literal `none`.
pub struct MacroTemplateRenderer {
    env: Environment<'static>,
}

impl Default for MacroTemplateRenderer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl MacroTemplateRenderer {
    pub fn new(directory: Option<PathBuf>) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_formatter(|out, state, value| {
            if value.is_none() || value.is_undefined() {
                return Ok(());
            }
            minijinja::escape_formatter(out, state, value)
        });
        env.set_loader(move |name| {
            if let Some(dir) = &directory {
                if let Some(source) = load_from_dir(dir, name)? {
                    return Ok(Some(source));
                }
            }
            Ok(builtin(name).map(str::to_string))
        });
        Self { env }
    }

    pub fn from_config(config: &TemplateConfig) -> Self {
        Self::new(config.directory.clone())
    }

    pub fn template_name(kind: NodeKind) -> &'static str {
        match kind {
            NodeKind::Class => "class.jinja",
            NodeKind::Method => "method.jinja",
            NodeKind::Field => "field.jinja",
        }
    }

    /// Template text for `kind`: the configured override, else the file
    /// found by the loader.
    pub fn template_text(&self, kind: NodeKind, overrides: &TemplateConfig) -> DocResult<String> {
        if let Some(text) = overrides.for_kind(kind).filter(|t| !t.trim().is_empty()) {
            return Ok(text.to_string());
        }

        let name = Self::template_name(kind);
        let template = self.env.get_template(name).map_err(|e| match e.kind() {
            ErrorKind::TemplateNotFound => RenderError::MissingTemplate(name.to_string()),
            _ => RenderError::Template {
                template: name.to_string(),
                message: e.to_string(),
            },
        })?;
        Ok(template.source().to_string())
    }

    pub fn render_text(
        &self,
        label: &str,
        template_text: &str,
        context: &TemplateContext,
    ) -> Result<String, RenderError> {
        self.env
            .render_str(template_text, context)
            .map_err(|e| RenderError::Template {
                template: label.to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl TemplateRenderer for MacroTemplateRenderer {
    fn name(&self) -> &'static str {
        "template"
    }

    async fn render(
        &self,
        template_text: &str,
        context: &TemplateContext,
        node: &NodeSnapshot,
    ) -> DocResult<String> {
        debug!(node = %node.name, "Rendering template");
        let label = format!("{} {}", node.host_kind, node.name);
        Ok(self.render_text(&label, template_text, context)?)
    }
}
