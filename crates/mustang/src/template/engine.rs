//! Template engine abstraction.
//!
//! [`TemplateEngine`] is the seam a host application renders through when it
//! does not care which template language sits behind it. Data crosses the
//! seam as `serde_json::Value`. [`MustacheEngine`] is the implementation
//! backed by this crate; its registered templates double as the partials
//! every render can include.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::interpreter::Partials;
use super::token::Delimiters;
use super::{render_with_delimiters, validate};
use crate::error::{RenderError, Result};
use crate::value::Value;

/// A template engine that can render templates with data.
pub trait TemplateEngine: Send + Sync {
    /// Renders a template string with the given data.
    fn render_template(&self, template: &str, data: &serde_json::Value) -> Result<String>;

    /// Adds a named template to the engine.
    ///
    /// The template is checked for syntax errors before it is stored.
    fn add_template(&mut self, name: &str, source: &str) -> Result<()>;

    /// Renders a previously registered template.
    fn render_named(&self, name: &str, data: &serde_json::Value) -> Result<String>;

    /// Checks if a template with the given name exists.
    fn has_template(&self, name: &str) -> bool;

    /// Renders a template with additional top-level values merged in.
    ///
    /// On key conflicts, `data` takes precedence over `context`.
    fn render_with_context(
        &self,
        template: &str,
        data: &serde_json::Value,
        context: HashMap<String, serde_json::Value>,
    ) -> Result<String>;

    /// Whether templates can include other templates.
    fn supports_includes(&self) -> bool;

    /// Whether templates can branch and loop.
    fn supports_control_flow(&self) -> bool;
}

/// Mustache template engine.
///
/// # Example
///
/// ```rust
/// use mustang::{MustacheEngine, TemplateEngine};
/// use serde_json::json;
///
/// let mut engine = MustacheEngine::new();
/// engine.add_template("item", "<li>{{name}}</li>").unwrap();
///
/// let output = engine
///     .render_template("<ul>{{#items}}{{>item}}{{/items}}</ul>", &json!({
///         "items": [{"name": "a"}, {"name": "b"}]
///     }))
///     .unwrap();
/// assert_eq!(output, "<ul><li>a</li><li>b</li></ul>");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MustacheEngine {
    templates: Partials,
    delimiters: Delimiters,
}

impl MustacheEngine {
    /// Creates an engine with no templates and the default delimiters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the delimiters templates start with.
    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    /// Reads a template from disk and registers it under `name`.
    ///
    /// # Errors
    ///
    /// [`RenderError::Io`] when the file cannot be read, otherwise the same
    /// errors as [`TemplateEngine::add_template`].
    pub fn add_template_file(&mut self, name: &str, path: impl AsRef<Path>) -> Result<()> {
        let source = fs::read_to_string(path)?;
        self.add_template(name, &source)
    }

    /// The registered templates, by name.
    pub fn templates(&self) -> &Partials {
        &self.templates
    }

    fn render_value(&self, template: &str, data: Value) -> Result<String> {
        render_with_delimiters(template, &data, &self.templates, &self.delimiters)
    }
}

impl TemplateEngine for MustacheEngine {
    fn render_template(&self, template: &str, data: &serde_json::Value) -> Result<String> {
        self.render_value(template, Value::from(data))
    }

    fn add_template(&mut self, name: &str, source: &str) -> Result<()> {
        validate(source, &self.delimiters)?;
        self.templates.insert(name.to_string(), source.to_string());
        Ok(())
    }

    fn render_named(&self, name: &str, data: &serde_json::Value) -> Result<String> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| RenderError::TemplateNotFound(name.to_string()))?;
        self.render_value(template, Value::from(data))
    }

    fn has_template(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    fn render_with_context(
        &self,
        template: &str,
        data: &serde_json::Value,
        context: HashMap<String, serde_json::Value>,
    ) -> Result<String> {
        let mut combined: serde_json::Map<String, serde_json::Value> = context.into_iter().collect();
        if let serde_json::Value::Object(map) = data {
            for (key, value) in map {
                combined.insert(key.clone(), value.clone());
            }
        }
        self.render_value(template, Value::from(serde_json::Value::Object(combined)))
    }

    fn supports_includes(&self) -> bool {
        true
    }

    fn supports_control_flow(&self) -> bool {
        true
    }
}
