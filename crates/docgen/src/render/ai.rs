use super::{MacroTemplateRenderer, TemplateRenderer};
use crate::prompt::{PromptTemplate, DEFAULT_SYSTEM_PROMPT};
use async_trait::async_trait;
use common::{DocResult, ExtractionError};
use domain::{AiRequest, ConfigHandle, NodeSnapshot, TemplateContext};
use llm::ProviderSource;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Renders by asking a model.
///
/// The deterministic template is rendered first and handed to the
/// model as the expected shape. The returned text is the provider's raw
/// answer; callers pass it through [`crate::sanitizer::extract_comment`].
pub struct AiPromptRenderer {
    templates: Arc<MacroTemplateRenderer>,
    providers: Arc<dyn ProviderSource>,
    config: ConfigHandle,
}

impl AiPromptRenderer {
    pub fn new(
        templates: Arc<MacroTemplateRenderer>,
        providers: Arc<dyn ProviderSource>,
        config: ConfigHandle,
    ) -> Self {
        Self {
            templates,
            providers,
            config,
        }
    }

    /// Request that would be sent for this element.
    pub fn build_request(
        &self,
        template_text: &str,
        context: &TemplateContext,
        node: &NodeSnapshot,
    ) -> DocResult<AiRequest> {
        let kind = node
            .kind()
            .ok_or_else(|| ExtractionError::UnsupportedElementKind {
                kind: node.host_kind.clone(),
                name: node.name.clone(),
            })?;
        let ai = self.config.read(|c| c.ai.clone());

        let label = format!("{} {}", node.host_kind, node.name);
        let shape = self.templates.render_text(&label, template_text, context)?;
        let prompt = PromptTemplate::for_kind(kind, &ai.prompts).fill(&shape, context, &node.source_text);
        let system_prompt = ai
            .system_prompt
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_SYSTEM_PROMPT);

        Ok(AiRequest::from_config(&ai, prompt).with_system_prompt(system_prompt))
    }
}

#[async_trait]
impl TemplateRenderer for AiPromptRenderer {
    fn name(&self) -> &'static str {
        "ai"
    }

    async fn render(
        &self,
        template_text: &str,
        context: &TemplateContext,
        node: &NodeSnapshot,
    ) -> DocResult<String> {
        let request = self.build_request(template_text, context, node)?;
        let provider = self.config.read(|c| self.providers.provider(&c.ai))?;

        let start = Instant::now();
        info!(
            provider = provider.provider_name(),
            node = %node.name,
            model = %request.model,
            "Requesting generated comment"
        );
        let raw = provider.send_request(&request).await?;
        info!(
            provider = provider.provider_name(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Generated comment received"
        );
        Ok(raw)
    }
}
