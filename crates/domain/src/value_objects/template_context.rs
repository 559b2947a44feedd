use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A parameter-like entry in the template context: a value parameter,
/// or a generic type parameter presented as a pseudo-parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredParam {
    pub name: String,
    #[serde(rename = "typeName")]
    pub type_name: Option<String>,
    pub role: Option<String>,
}

impl StructuredParam {
    pub fn value(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: Some(type_name.into()),
            role: None,
        }
    }

    /// Generic type parameter `T` rendered as `<T>`.
    pub fn type_parameter(name: &str) -> Self {
        Self {
            name: format!("<{}>", name),
            type_name: None,
            role: Some("parameter".to_string()),
        }
    }

    fn describe(&self) -> String {
        match &self.type_name {
            Some(type_name) if !type_name.is_empty() => format!("{} {}", type_name, self.name),
            _ => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContextValue {
    Text(String),
    Params(Vec<StructuredParam>),
    Names(Vec<String>),
}

impl ContextValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContextValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Single-line rendering used when listing the context in prompts.
    pub fn display(&self) -> String {
        match self {
            ContextValue::Text(s) => s.clone(),
            ContextValue::Params(params) => params
                .iter()
                .map(StructuredParam::describe)
                .collect::<Vec<_>>()
                .join(", "),
            ContextValue::Names(names) => names.join(", "),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ContextValue::Text(s) => s.is_empty(),
            ContextValue::Params(p) => p.is_empty(),
            ContextValue::Names(n) => n.is_empty(),
        }
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Text(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Text(value.to_string())
    }
}

impl From<Vec<StructuredParam>> for ContextValue {
    fn from(value: Vec<StructuredParam>) -> Self {
        ContextValue::Params(value)
    }
}

impl From<Vec<String>> for ContextValue {
    fn from(value: Vec<String>) -> Self {
        ContextValue::Names(value)
    }
}

/// Name → value mapping consumed by renderers.
///
/// Keys are unique and keep first-insertion order; inserting an existing
/// key replaces its value (last writer wins).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TemplateContext {
    entries: IndexMap<String, ContextValue>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ContextValue>,
    ) -> Option<ContextValue> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Apply `other` on top of this context.
    pub fn extend(&mut self, other: TemplateContext) {
        for (key, value) in other.entries {
            self.entries.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.entries.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ContextValue::as_text)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ContextValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for TemplateContext
where
    K: Into<String>,
    V: Into<ContextValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = TemplateContext::new();
        for (key, value) in iter {
            context.insert(key, value);
        }
        context
    }
}
