use crate::config::types::Config;
use crate::crawler::Limits;
use crate::extract::FieldSet;
use crate::template::TemplateEngine;
use crate::url::UrlFilter;
use crate::ConfigError;
use std::time::Duration;

/// Configuration with every pattern, selector and template compiled
///
/// Built once at startup; a config that compiles cannot fail later on a
/// malformed pattern or selector. Template evaluation can still fail at
/// render time.
#[derive(Debug)]
pub struct CompiledConfig {
    pub config: Config,
    pub filter: UrlFilter,
    pub limits: Limits,
    pub templates: TemplateEngine,
    pub html_fields: FieldSet,
    pub pdf_fields: FieldSet,
}

impl Config {
    /// Compiles URL patterns, limit rules, selectors and templates
    ///
    /// # Returns
    ///
    /// * `Ok(CompiledConfig)` - Everything compiled
    /// * `Err(ConfigError)` - A pattern, selector or template is malformed
    pub fn compile(self) -> Result<CompiledConfig, ConfigError> {
        let filter = UrlFilter::new(
            &self.input.url_filters,
            &self.input.disallowed_url_filters,
        )?;

        let limits = Limits::from_config(&self.request);

        let mut templates = TemplateEngine::new();
        let html_fields = FieldSet::compile("html", &self.html.selectors, &mut templates)?;
        let pdf_fields = FieldSet::compile("pdf", &self.pdf.selectors, &mut templates)?;

        Ok(CompiledConfig {
            config: self,
            filter,
            limits,
            templates,
            html_fields,
            pdf_fields,
        })
    }
}

impl CompiledConfig {
    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.request.timeout_in_ms)
    }

    /// Whether PDF responses are extracted
    pub fn pdf_enabled(&self) -> bool {
        self.config.pdf.enabled
    }
}
