//! Process-wide service object.
//!
//! Holds the state that lives for the whole process: the handler and
//! comparator registries, the token cache and the wiring between the
//! renderers. Create one at startup and hand out references.

use crate::extractor::HandlerRegistry;
use crate::merge::ComparatorRegistry;
use crate::orchestrator::DocGenerator;
use crate::parameters::TemplateParameterProvider;
use crate::render::{AiPromptRenderer, MacroTemplateRenderer, RendererSelector};
use crate::triggers::TriggerDispatcher;
use domain::ConfigHandle;
use infrastructure::{TokenCache, VersionResolver};
use llm::{AiProviderFactory, ProviderSource};
use std::sync::Arc;
use tracing::{debug, info};

pub struct DocService {
    config: ConfigHandle,
    handlers: Arc<HandlerRegistry>,
    comparators: Arc<ComparatorRegistry>,
    tokens: TokenCache,
    generator: Arc<DocGenerator>,
}

impl DocService {
    pub fn new(config: ConfigHandle) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: ConfigHandle) -> DocServiceBuilder {
        DocServiceBuilder::new(config)
    }

    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    pub fn generator(&self) -> Arc<DocGenerator> {
        self.generator.clone()
    }

    pub fn triggers(&self) -> TriggerDispatcher {
        TriggerDispatcher::new(self.config.clone(), self.generator.clone())
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn comparators(&self) -> &ComparatorRegistry {
        &self.comparators
    }

    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    /// Drop cached credentials before the process exits.
    pub fn shutdown(self) {
        self.tokens.clear();
        info!("Documentation service stopped");
    }
}

pub struct DocServiceBuilder {
    config: ConfigHandle,
    providers: Arc<dyn ProviderSource>,
    versions: VersionResolver,
    handlers: HandlerRegistry,
    comparators: ComparatorRegistry,
}

impl DocServiceBuilder {
    fn new(config: ConfigHandle) -> Self {
        Self {
            config,
            providers: Arc::new(AiProviderFactory),
            versions: VersionResolver::new(),
            handlers: HandlerRegistry::default(),
            comparators: ComparatorRegistry::default(),
        }
    }

    pub fn with_provider_source(mut self, providers: Arc<dyn ProviderSource>) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_version_resolver(mut self, versions: VersionResolver) -> Self {
        self.versions = versions;
        self
    }

    pub fn with_handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn with_comparators(mut self, comparators: ComparatorRegistry) -> Self {
        self.comparators = comparators;
        self
    }

    pub fn build(self) -> DocService {
        let template_config = self.config.read(|c| c.templates.clone());
        debug!(directory = ?template_config.directory, "Building template environment");

        let templates = Arc::new(MacroTemplateRenderer::from_config(&template_config));
        let ai = Arc::new(AiPromptRenderer::new(
            templates.clone(),
            self.providers,
            self.config.clone(),
        ));
        let renderers = Arc::new(RendererSelector::new(self.config.clone(), templates, ai));
        let parameters = Arc::new(
            TemplateParameterProvider::new(self.config.clone())
                .with_version_resolver(self.versions),
        );

        let handlers = Arc::new(self.handlers);
        let comparators = Arc::new(self.comparators);
        let generator = Arc::new(DocGenerator::new(
            self.config.clone(),
            handlers.clone(),
            parameters,
            renderers,
            comparators.clone(),
        ));

        DocService {
            config: self.config,
            handlers,
            comparators,
            tokens: TokenCache::new(),
            generator,
        }
    }
}
