//! Template rendering for computed fields
//!
//! A field value containing `{{` or `{%` is a template. Templates use the
//! minijinja (Jinja2) syntax with its built-in filters plus the helpers in
//! [`helpers`], and are evaluated against a [`TemplateContext`]:
//!
//! ```text
//! {{ request.url }}
//! {{ response.status }}
//! {{ meta.Title | default("untitled") | upper }}
//! {% if text | length > 200 %}{{ text | trunc(200) }}...{% else %}{{ text }}{% endif %}
//! ```
//!
//! Templates are compiled once when the configuration is compiled. A
//! template that fails to compile or to render aborts the crawl.

mod context;
pub mod helpers;

pub use context::{RequestInfo, ResponseInfo, TemplateContext};

use minijinja::{AutoEscape, Environment};
use serde::Serialize;

/// Returns true when a field value should be treated as a template
pub fn is_template(value: &str) -> bool {
    value.contains("{{") || value.contains("{%")
}

/// Holds every compiled field template of a run
#[derive(Debug)]
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Creates an engine with the helper functions registered
    pub fn new() -> Self {
        let mut env = Environment::new();
        // Output is JSON, not HTML
        env.set_auto_escape_callback(|_| AutoEscape::None);
        helpers::register(&mut env);
        Self { env }
    }

    /// Compiles a template under `name`
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The template parsed and is ready to render
    /// * `Err(minijinja::Error)` - Syntax error in `source`
    pub fn add(&mut self, name: String, source: String) -> Result<(), minijinja::Error> {
        self.env.add_template_owned(name, source)
    }

    /// Renders the template stored under `name`
    pub fn render<C: Serialize>(&self, name: &str, context: C) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(context)
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}
