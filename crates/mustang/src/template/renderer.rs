//! Reusable renderer configuration.
//!
//! [`Renderer`] bundles the partials and starting delimiters that a series of
//! renders share, so call sites only pass the template and the data.
//! Custom delimiters apply to the rendered template only: partials always
//! start out with `{{ }}`.
//!
//! ```rust
//! use mustang::{Delimiters, Renderer, Value};
//! use serde_json::json;
//!
//! let renderer = Renderer::new()
//!     .with_partial("user", "{{name}} ({{age}})")
//!     .with_delimiters(Delimiters::new("<%", "%>"));
//!
//! let data = Value::from(json!({"users": [{"name": "Ann", "age": 31}]}));
//! let output = renderer.render("<%#users%><%>user%>;<%/users%>", &data).unwrap();
//! assert_eq!(output, "Ann (31);");
//! ```

use serde::Serialize;

use super::interpreter::{interpret, Partials};
use super::registry::{PartialRegistry, RegistryError};
use super::token::Delimiters;
use crate::context::ContextStack;
use crate::error::Result;
use crate::inspect::{inspect_template, Accessor};
use crate::value::Value;

/// A renderer with pre-registered partials.
///
/// Partials are plain template text, looked up by name when a `{{>name}}`
/// tag is expanded. A name with no partial expands to nothing.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    partials: Partials,
    delimiters: Delimiters,
}

impl Renderer {
    /// Creates a renderer with no partials and the default delimiters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one partial, replacing any earlier one with the same name.
    pub fn with_partial(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.partials.insert(name.into(), source.into());
        self
    }

    /// Adds several partials.
    pub fn with_partials<I, K, V>(mut self, partials: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.partials
            .extend(partials.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Adds every partial a registry resolves, reading files as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if a registered file cannot be read.
    pub fn with_registry(self, registry: &PartialRegistry) -> std::result::Result<Self, RegistryError> {
        Ok(self.with_partials(registry.to_partials()?))
    }

    /// Sets the delimiters every template starts with.
    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    /// The registered partials.
    pub fn partials(&self) -> &Partials {
        &self.partials
    }

    /// The starting delimiters.
    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    /// Renders `template` with `data` as the root context.
    pub fn render(&self, template: &str, data: &Value) -> Result<String> {
        let mut stack = ContextStack::new(data.clone());
        interpret(template, &mut stack, &self.partials, self.delimiters.clone())
    }

    /// Renders with any serializable data.
    pub fn render_serialize<T: Serialize + ?Sized>(&self, template: &str, data: &T) -> Result<String> {
        self.render(template, &Value::from_serialize(data)?)
    }

    /// Lists accessors for the tags of `template` that read `data`.
    pub fn inspect(&self, template: &str, data: &Value) -> Result<Vec<Accessor>> {
        inspect_template(template, data, &self.partials, &self.delimiters)
    }
}
