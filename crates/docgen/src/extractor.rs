//! Element context extraction, one handler per node kind.

use common::ExtractionError;
use domain::{NodeKind, NodeSnapshot, StructuredParam, TemplateContext};
use std::collections::HashMap;
use tracing::debug;

/// Turns the facts of one kind of node into template parameters.
pub trait ElementHandler: Send + Sync {
    fn kind(&self) -> NodeKind;

    fn extract(&self, node: &NodeSnapshot) -> TemplateContext;
}

pub struct ClassHandler;

impl ElementHandler for ClassHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::Class
    }

    fn extract(&self, node: &NodeSnapshot) -> TemplateContext {
        let type_params: Vec<StructuredParam> = node
            .type_parameters
            .iter()
            .map(|name| StructuredParam::type_parameter(name))
            .collect();

        TemplateContext::new()
            .with("description", node.name.as_str())
            .with("name", node.name.as_str())
            .with("parameters", type_params)
    }
}

pub struct MethodHandler;

impl MethodHandler {
    /// Presentable return type, or empty for void and constructors.
    pub fn return_type(node: &NodeSnapshot) -> String {
        match node.return_type.as_deref().map(str::trim) {
            None | Some("void") | Some("Void") | Some("") => String::new(),
            Some(other) => other.to_string(),
        }
    }
}

impl ElementHandler for MethodHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::Method
    }

    fn extract(&self, node: &NodeSnapshot) -> TemplateContext {
        let parameters: Vec<StructuredParam> = node
            .type_parameters
            .iter()
            .map(|name| StructuredParam::type_parameter(name))
            .chain(
                node.parameters
                    .iter()
                    .map(|p| StructuredParam::value(p.name.as_str(), p.type_name.as_str())),
            )
            .collect();

        TemplateContext::new()
            .with("description", format!("{} method", node.name))
            .with("name", node.name.as_str())
            .with("returnType", Self::return_type(node))
            .with("parameters", parameters)
            .with("exceptions", node.thrown_types.clone())
    }
}

pub struct FieldHandler;

impl ElementHandler for FieldHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::Field
    }

    fn extract(&self, node: &NodeSnapshot) -> TemplateContext {
        TemplateContext::new()
            .with("name", node.name.as_str())
            .with("fieldType", node.field_type.clone().unwrap_or_default())
    }
}

/// Lookup table from node kind to its handler.
pub struct HandlerRegistry {
    handlers: HashMap<NodeKind, Box<dyn ElementHandler>>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(ClassHandler));
        registry.register(Box::new(MethodHandler));
        registry.register(Box::new(FieldHandler));
        registry
    }
}

impl HandlerRegistry {
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler, replacing any previous one for the same kind.
    pub fn register(&mut self, handler: Box<dyn ElementHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn extract(
        &self,
        node: &NodeSnapshot,
    ) -> Result<(NodeKind, TemplateContext), ExtractionError> {
        let unsupported = || ExtractionError::UnsupportedElementKind {
            kind: node.host_kind.clone(),
            name: node.name.clone(),
        };

        let kind = node.kind().ok_or_else(unsupported)?;
        let handler = self.handlers.get(&kind).ok_or_else(unsupported)?;

        debug!(node = %node.name, kind = %kind, "Extracting element context");
        Ok((kind, handler.extract(node)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{ContextValue, NodeId};

    #[test]
    fn test_class_type_parameters() {
        let node = NodeSnapshot::new(NodeId(1), "class", "Box")
            .with_type_parameter("T")
            .with_type_parameter("U");
        let ctx = ClassHandler.extract(&node);

        assert_eq!(ctx.text("description"), Some("Box"));
        match ctx.get("parameters") {
            Some(ContextValue::Params(params)) => {
                assert_eq!(params[0].name, "<T>");
                assert_eq!(params[0].role.as_deref(), Some("parameter"));
                assert_eq!(params[1].name, "<U>");
            }
            other => panic!("unexpected parameters: {:?}", other),
        }
    }

    #[test]
    fn test_method_context() {
        let node = NodeSnapshot::new(NodeId(1), "method", "find")
            .with_type_parameter("T")
            .with_parameter("id", "Long")
            .with_parameter("type", "Class<T>")
            .with_return_type("Optional<T>")
            .with_thrown_type("IOException")
            .with_thrown_type("IllegalStateException");
        let ctx = MethodHandler.extract(&node);

        assert_eq!(ctx.text("description"), Some("find method"));
        assert_eq!(ctx.text("returnType"), Some("Optional<T>"));
        match ctx.get("parameters") {
            Some(ContextValue::Params(params)) => {
                let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, vec!["<T>", "id", "type"]);
                assert_eq!(params[1].type_name.as_deref(), Some("Long"));
            }
            other => panic!("unexpected parameters: {:?}", other),
        }
        assert_eq!(
            ctx.get("exceptions"),
            Some(&ContextValue::Names(vec![
                "IOException".to_string(),
                "IllegalStateException".to_string()
            ]))
        );
    }

    #[test]
    fn test_void_return_type_is_empty() {
        let void = NodeSnapshot::new(NodeId(1), "method", "run").with_return_type("void");
        assert_eq!(MethodHandler.extract(&void).text("returnType"), Some(""));

        let ctor = NodeSnapshot::new(NodeId(2), "constructor", "Repo");
        assert_eq!(MethodHandler.extract(&ctor).text("returnType"), Some(""));
    }

    #[test]
    fn test_field_context_is_minimal() {
        let node = NodeSnapshot::new(NodeId(1), "field", "count").with_field_type("int");
        let ctx = FieldHandler.extract(&node);
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.text("fieldType"), Some("int"));
    }

    #[test]
    fn test_unsupported_kind() {
        let registry = HandlerRegistry::default();
        let node = NodeSnapshot::new(NodeId(1), "initializer", "static");
        match registry.extract(&node) {
            Err(ExtractionError::UnsupportedElementKind { kind, .. }) => {
                assert_eq!(kind, "initializer")
            }
            other => panic!("unexpected result: {:?}", other.map(|(k, _)| k)),
        }
    }
}
