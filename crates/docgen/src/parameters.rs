use chrono::format::{Item, StrftimeItems};
use chrono::{Local, NaiveDate};
use domain::{ConfigHandle, TemplateContext};
use infrastructure::VersionResolver;
use std::path::Path;

const FALLBACK_DATE_FORMAT: &str = "%Y-%m-%d";

/// Supplies the parameters every template sees before element facts.
///
/// Order matters: base parameters first, then custom ones from
/// configuration (which may shadow a base name), then whatever the
/// element handler produced.
pub struct TemplateParameterProvider {
    config: ConfigHandle,
    versions: VersionResolver,
}

impl TemplateParameterProvider {
    pub fn new(config: ConfigHandle) -> Self {
        Self {
            config,
            versions: VersionResolver::new(),
        }
    }

    pub fn with_version_resolver(mut self, versions: VersionResolver) -> Self {
        self.versions = versions;
        self
    }

    /// `author`, `version`, `since`, `date` for a file, dated today.
    pub fn base_parameters(&self, file: &Path) -> Vec<(String, String)> {
        self.base_parameters_on(file, Local::now().date_naive())
    }

    pub fn base_parameters_on(&self, file: &Path, today: NaiveDate) -> Vec<(String, String)> {
        let (author, date_format) =
            self.config
                .read(|c| (c.author.clone(), c.date_format.clone()));
        let version = self.versions.resolve(file);

        vec![
            ("author".to_string(), author),
            ("version".to_string(), version.clone()),
            ("since".to_string(), version),
            ("date".to_string(), format_date(today, &date_format)),
        ]
    }

    pub fn custom_parameters(&self) -> Vec<(String, String)> {
        self.config.read(|c| {
            c.custom_parameters
                .iter()
                .filter(|p| !p.name.trim().is_empty())
                .map(|p| (p.name.trim().to_string(), p.value.clone()))
                .collect()
        })
    }

    /// Base and custom parameters as one context, custom last.
    pub fn shared_context(&self, file: &Path) -> TemplateContext {
        self.base_parameters(file)
            .into_iter()
            .chain(self.custom_parameters())
            .collect()
    }

    /// Full context for one element: shared parameters, then element facts.
    pub fn build_context(&self, file: &Path, element: TemplateContext) -> TemplateContext {
        let mut context = self.shared_context(file);
        context.extend(element);
        context
    }
}

fn format_date(date: NaiveDate, format: &str) -> String {
    let valid = !format.trim().is_empty()
        && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error));
    let format = if valid { format } else { FALLBACK_DATE_FORMAT };
    date.format(format).to_string()
}
