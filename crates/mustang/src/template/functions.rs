//! Free-standing render, inspect and validation functions.

use super::interpreter::{interpret, Partials};
use super::parser::Parser;
use super::token::Delimiters;
use crate::buffer::Buffer;
use crate::context::ContextStack;
use crate::error::Result;
use crate::inspect::{inspect_template, Accessor};
use crate::value::Value;

/// Renders a template with the default `{{`/`}}` delimiters.
///
/// `data` becomes the root of the context stack. Names that resolve to
/// nothing render as empty strings; unknown partials expand to nothing.
///
/// # Example
///
/// ```rust
/// use mustang::{render, Value};
/// use serde_json::json;
/// use std::collections::HashMap;
///
/// let data = Value::from(json!({"name": "Chris", "items": [1, 2, 3]}));
/// let output = render("Hello {{name}}: {{#items}}{{.}}{{/items}}", &data, &HashMap::new()).unwrap();
/// assert_eq!(output, "Hello Chris: 123");
/// ```
///
/// # Errors
///
/// Returns a syntax error for unbalanced sections, malformed set-delimiter
/// tags and unclosed tags.
pub fn render(template: &str, data: &Value, partials: &Partials) -> Result<String> {
    render_with_delimiters(template, data, partials, &Delimiters::default())
}

/// Renders a template that starts with `delimiters` instead of `{{`/`}}`.
///
/// Partials always start with the default delimiters.
pub fn render_with_delimiters(
    template: &str,
    data: &Value,
    partials: &Partials,
    delimiters: &Delimiters,
) -> Result<String> {
    let mut stack = ContextStack::new(data.clone());
    interpret(template, &mut stack, partials, delimiters.clone())
}

/// Lists an [`Accessor`] for every top-level tag of `template` that reads
/// from `data`.
pub fn inspect(template: &str, data: &Value, partials: &Partials) -> Result<Vec<Accessor>> {
    inspect_template(template, data, partials, &Delimiters::default())
}

/// [`inspect`] with custom starting delimiters.
pub fn inspect_with_delimiters(
    template: &str,
    data: &Value,
    partials: &Partials,
    delimiters: &Delimiters,
) -> Result<Vec<Accessor>> {
    inspect_template(template, data, partials, delimiters)
}

/// Checks a template for syntax errors without rendering it.
///
/// Section bodies are scanned for their close tags, so unbalanced or
/// unclosed sections and malformed tags anywhere in the template are found.
/// Partials are not followed.
///
/// ```rust
/// use mustang::{validate, Delimiters, RenderError};
///
/// assert!(validate("{{#a}}{{b}}{{/a}}", &Delimiters::default()).is_ok());
/// assert!(matches!(
///     validate("{{#a}}{{/b}}", &Delimiters::default()),
///     Err(RenderError::UnbalancedSection { .. })
/// ));
/// ```
pub fn validate(template: &str, delimiters: &Delimiters) -> Result<()> {
    let mut buffer = Buffer::new(template);
    let mut parser = Parser::new(&mut buffer);
    let mut delimiters = delimiters.clone();
    while let Some(token) = parser.next(&mut buffer, &mut delimiters)? {
        token.release(&mut buffer);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use serde_json::json;

    #[test]
    fn test_render_defaults() {
        let data = Value::from(json!({"a": "<x>"}));
        assert_eq!(render("{{a}}{{{a}}}", &data, &Partials::new()).unwrap(), "&lt;x&gt;<x>");
    }

    #[test]
    fn test_render_with_delimiters_partials_use_defaults() {
        let mut partials = Partials::new();
        partials.insert("p".to_string(), "{{a}}|<%a%>".to_string());
        let data = Value::from(json!({"a": 1}));
        let output =
            render_with_delimiters("<%a%> <%>p%>", &data, &partials, &Delimiters::new("<%", "%>"))
                .unwrap();
        assert_eq!(output, "1 1|<%a%>");
    }

    #[test]
    fn test_render_does_not_mutate_data() {
        let data = Value::from(json!({"list": [1, 2]}));
        let before = data.clone();
        render("{{#list}}{{.}}{{/list}}", &data, &Partials::new()).unwrap();
        assert_eq!(data, before);
    }

    #[test]
    fn test_validate_errors() {
        let defaults = Delimiters::default();
        assert!(validate("plain", &defaults).is_ok());
        assert!(matches!(
            validate("{{/a}}", &defaults),
            Err(RenderError::UnbalancedSection { .. })
        ));
        assert!(matches!(
            validate("{{#a}}", &defaults),
            Err(RenderError::UnclosedSection { .. })
        ));
        assert!(matches!(
            validate("{{=<%=}}", &defaults),
            Err(RenderError::InvalidDelimiters { .. })
        ));
        assert!(matches!(
            validate("x {{y", &defaults),
            Err(RenderError::UnclosedTag { .. })
        ));
    }

    #[test]
    fn test_inspect_with_delimiters() {
        let data = Value::from(json!({"a": 1}));
        let found =
            inspect_with_delimiters("<%a%>", &data, &Partials::new(), &Delimiters::new("<%", "%>"))
                .unwrap();
        assert_eq!(found.len(), 1);
        assert!(inspect("<%a%>", &data, &Partials::new()).unwrap().is_empty());
    }
}
