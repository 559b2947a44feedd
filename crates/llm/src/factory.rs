use crate::providers::*;
use common::ProviderResult;
use domain::{AiConfig, WireShape};
use std::sync::Arc;
use tracing::debug;

/// Supplies a provider for the AI settings in effect at call time.
///
/// Callers resolve a provider per request rather than holding one, so a
/// settings change is picked up on the next call.
pub trait ProviderSource: Send + Sync {
    fn provider(&self, config: &AiConfig) -> ProviderResult<Arc<dyn AiProvider>>;
}

/// Factory for creating AI providers from configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct AiProviderFactory;

impl AiProviderFactory {
    pub fn create_provider(config: &AiConfig) -> ProviderResult<Arc<dyn AiProvider>> {
        let settings = ProviderSettings::from_config(config);
        debug!("Creating AI provider: {:?}", settings);

        match config.provider.wire_shape() {
            WireShape::ChatCompletions => Ok(Arc::new(ChatCompletionsProvider::new(settings)?)),
            WireShape::Generate => Ok(Arc::new(OllamaProvider::new(settings)?)),
        }
    }
}

impl ProviderSource for AiProviderFactory {
    fn provider(&self, config: &AiConfig) -> ProviderResult<Arc<dyn AiProvider>> {
        Self::create_provider(config)
    }
}
