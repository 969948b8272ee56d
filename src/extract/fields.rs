//! Configured output fields, resolved once at startup

use super::html::{extract_field, SelectorSpec};
use crate::template::{is_template, TemplateContext, TemplateEngine};
use crate::{ConfigError, QuarryError};
use scraper::Html;
use std::collections::BTreeMap;

/// One output record: field name to value
///
/// Keys serialize in sorted order.
pub type ExtractedDocument = BTreeMap<String, String>;

/// How a field gets its value
#[derive(Debug, Clone)]
pub enum FieldSpec {
    /// CSS selector evaluated against the page
    Selector(SelectorSpec),

    /// Template compiled into the engine under `name`
    Template { name: String },
}

/// A named output field
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub spec: FieldSpec,
}

/// The fields of one content kind (HTML or PDF)
#[derive(Debug, Clone, Default)]
pub struct FieldSet {
    fields: Vec<Field>,
}

impl FieldSet {
    /// Resolves every configured field into a selector or a compiled template
    ///
    /// # Arguments
    ///
    /// * `scope` - Prefix for template names, keeping HTML and PDF fields apart
    /// * `selectors` - Field name to selector-or-template text
    /// * `templates` - Engine that receives the compiled templates
    ///
    /// # Returns
    ///
    /// * `Ok(FieldSet)` - Every field resolved
    /// * `Err(ConfigError)` - A selector or template is malformed
    pub fn compile(
        scope: &str,
        selectors: &BTreeMap<String, String>,
        templates: &mut TemplateEngine,
    ) -> Result<Self, ConfigError> {
        let mut fields = Vec::with_capacity(selectors.len());

        for (name, value) in selectors {
            let spec = if is_template(value) {
                let template_name = format!("{}.{}", scope, name);
                templates
                    .add(template_name.clone(), value.clone())
                    .map_err(|source| ConfigError::InvalidTemplate {
                        field: name.clone(),
                        source,
                    })?;
                FieldSpec::Template {
                    name: template_name,
                }
            } else {
                let selector =
                    SelectorSpec::parse(value).map_err(|message| ConfigError::InvalidSelector {
                        field: name.clone(),
                        selector: value.clone(),
                        message,
                    })?;
                FieldSpec::Selector(selector)
            };

            fields.push(Field {
                name: name.clone(),
                spec,
            });
        }

        Ok(Self { fields })
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are configured
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over the fields in name order
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Evaluates every field
    ///
    /// Selector fields read from `document`; without a document (PDF
    /// content) they produce an empty string. Template fields render against
    /// `context`.
    ///
    /// # Returns
    ///
    /// * `Ok(ExtractedDocument)` - One value per field
    /// * `Err(QuarryError::Template)` - A template failed to render; this is fatal
    pub fn evaluate(
        &self,
        document: Option<&Html>,
        templates: &TemplateEngine,
        context: &TemplateContext<'_>,
    ) -> Result<ExtractedDocument, QuarryError> {
        let mut record = ExtractedDocument::new();

        for field in &self.fields {
            let value = match &field.spec {
                FieldSpec::Selector(selector) => document
                    .map(|document| extract_field(document, selector))
                    .unwrap_or_default(),
                FieldSpec::Template { name } => {
                    templates
                        .render(name, context)
                        .map_err(|source| QuarryError::Template {
                            field: field.name.clone(),
                            source,
                        })?
                }
            };
            record.insert(field.name.clone(), value);
        }

        Ok(record)
    }
}
