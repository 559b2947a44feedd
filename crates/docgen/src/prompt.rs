//! Prompt text sent to the model for one element.

use domain::{NodeKind, PromptConfig, TemplateContext};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a Java documentation assistant. \
Answer with exactly one JavaDoc comment block (/** ... */) for the given element. \
Do not repeat the code, do not add explanations, do not use markdown fences.";

const CLASS_PROMPT: &str = "Write a JavaDoc comment for this Java type: {description}.
Describe its responsibility in one or two sentences.

Follow the shape of this template:
{template}

Known facts:
{context}

Code:
{code}";

const METHOD_PROMPT: &str = "Write a JavaDoc comment for this Java method: {description}.
Explain what it does, then document every parameter, the return value and each thrown exception.

Follow the shape of this template:
{template}

Known facts:
{context}

Code:
{code}";

const FIELD_PROMPT: &str = "Write a short JavaDoc comment for this Java field.

Follow the shape of this template:
{template}

Known facts:
{context}

Code:
{code}";

lazy_static! {
    static ref SLOT: Regex = Regex::new(r"\{(description|template|context|code)\}").unwrap();
}

/// Prompt text for one node kind with `{description}`, `{template}`,
/// `{context}` and `{code}` slots. Other braces are left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn builtin(kind: NodeKind) -> Self {
        Self::new(match kind {
            NodeKind::Class => CLASS_PROMPT,
            NodeKind::Method => METHOD_PROMPT,
            NodeKind::Field => FIELD_PROMPT,
        })
    }

    /// Configured prompt for `kind`, falling back to the built-in one.
    pub fn for_kind(kind: NodeKind, prompts: &PromptConfig) -> Self {
        match prompts.for_kind(kind) {
            Some(text) if !text.trim().is_empty() => Self::new(text),
            _ => Self::builtin(kind),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Fill every slot in one pass, so slot-like text inside a value is
    /// never expanded again.
    pub fn fill(&self, template: &str, context: &TemplateContext, code: &str) -> String {
        let description = context
            .text("description")
            .or_else(|| context.text("name"))
            .unwrap_or_default()
            .to_string();
        let facts = render_context(context);

        SLOT.replace_all(&self.text, |caps: &Captures| match &caps[1] {
            "description" => description.clone(),
            "template" => template.to_string(),
            "context" => facts.clone(),
            "code" => code.to_string(),
            other => format!("{{{}}}", other),
        })
        .into_owned()
    }
}

/// One `key: value` line per non-empty entry.
pub fn render_context(context: &TemplateContext) -> String {
    context
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{}: {}", key, value.display()))
        .collect::<Vec<_>>()
        .join("\n")
}
