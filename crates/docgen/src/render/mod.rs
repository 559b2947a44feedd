//! Renderers turn a template and a context into comment text.

use async_trait::async_trait;
use common::DocResult;
use domain::{ConfigHandle, NodeSnapshot, TemplateContext};
use std::sync::Arc;

mod ai;
mod template;

pub use ai::AiPromptRenderer;
pub use template::MacroTemplateRenderer;

#[async_trait]
pub trait TemplateRenderer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn render(
        &self,
        template_text: &str,
        context: &TemplateContext,
        node: &NodeSnapshot,
    ) -> DocResult<String>;
}

/// How a node's comment gets produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Template,
    Ai,
}

/// Which renderer to use, decided per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPolicy {
    /// Follow the `ai.enabled` setting at the time of each render
    FromConfig,
    /// Always use the AI renderer
    ForceAi,
}

/// Picks a renderer for each request. The AI toggle is read on every
/// call, never cached.
pub struct RendererSelector {
    config: ConfigHandle,
    template: Arc<MacroTemplateRenderer>,
    ai: Arc<AiPromptRenderer>,
}

impl RendererSelector {
    pub fn new(
        config: ConfigHandle,
        template: Arc<MacroTemplateRenderer>,
        ai: Arc<AiPromptRenderer>,
    ) -> Self {
        Self {
            config,
            template,
            ai,
        }
    }

    pub fn mode(&self, policy: RenderPolicy) -> RenderMode {
        match policy {
            RenderPolicy::ForceAi => RenderMode::Ai,
            RenderPolicy::FromConfig if self.config.ai_enabled() => RenderMode::Ai,
            RenderPolicy::FromConfig => RenderMode::Template,
        }
    }

    pub fn select(&self, policy: RenderPolicy) -> (RenderMode, Arc<dyn TemplateRenderer>) {
        match self.mode(policy) {
            RenderMode::Ai => (RenderMode::Ai, self.ai.clone() as Arc<dyn TemplateRenderer>),
            RenderMode::Template => (
                RenderMode::Template,
                self.template.clone() as Arc<dyn TemplateRenderer>,
            ),
        }
    }

    pub fn templates(&self) -> &Arc<MacroTemplateRenderer> {
        &self.template
    }
}
