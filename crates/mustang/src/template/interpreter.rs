//! The recursive interpreter.
//!
//! Expansion happens in place. For each top-level token the interpreter
//! resolves what the tag stands for and writes it back over the tag in the
//! same [`Buffer`] the parser is reading. Partials, lambda output and section
//! bodies are expanded by calling [`interpret`] again on a fresh buffer that
//! shares the caller's context stack.
//!
//! Standalone tags (section tags, comments, set-delimiter tags and partials
//! alone on their line) take their line's indentation and line break with
//! them. The indentation removed before a partial becomes the partial's
//! indentation.

use std::collections::HashMap;

use super::parser::Parser;
use super::token::{Delimiters, Token, TokenKind};
use crate::buffer::{Buffer, Position};
use crate::context::ContextStack;
use crate::error::{RenderError, Result};
use crate::util::{count_line_breaks, escape_html, indent, is_blank, is_line_break};
use crate::value::{Shape, Value};

/// Named partial templates.
pub type Partials = HashMap<String, String>;

/// Expands `template` against `stack`.
///
/// The stack is used as is: no frame is pushed for the call, and every frame
/// pushed while expanding sections is popped again before returning.
pub fn interpret(
    template: &str,
    stack: &mut ContextStack,
    partials: &Partials,
    delimiters: Delimiters,
) -> Result<String> {
    debug!(len = template.len(), depth = stack.depth(), "interpreting template");

    let mut buffer = Buffer::new(template);
    let mut parser = Parser::new(&mut buffer);
    let mut delimiters = delimiters;

    loop {
        // sections render their body with the delimiters their opener was read with
        let opening = delimiters.clone();
        let Some(token) = parser.next(&mut buffer, &mut delimiters)? else {
            break;
        };
        trace!(kind = ?token.kind, name = %token.name, line = token.line, "dispatching token");

        match token.kind {
            TokenKind::Text => {}
            TokenKind::Comment | TokenKind::DelimiterSwitch => {
                trim_standalone(&mut buffer, &mut parser, &token);
                buffer.replace_range(token.start, token.end, "");
            }
            TokenKind::Interpolation | TokenKind::Implicit => {
                let text = interpolate(&token.name, stack)?;
                buffer.replace_range(token.start, token.end, &escape_html(&text));
            }
            TokenKind::UnescapedInterpolation => {
                let text = interpolate(&token.name, stack)?;
                buffer.replace_range(token.start, token.end, &text);
            }
            TokenKind::Partial => {
                let indentation = trim_standalone(&mut buffer, &mut parser, &token);
                let text = expand_partial(&token.name, indentation.as_deref(), stack, partials)?;
                buffer.replace_range(token.start, token.end, &text);
            }
            TokenKind::SectionBegin | TokenKind::InvertedSectionBegin => {
                let Some(end) = token.end_token() else {
                    return Err(unexpected(&token));
                };
                let text = expand_section(&mut buffer, &mut parser, &token, stack, partials, &opening)?;
                buffer.replace_range(token.start, end.end, &text);
            }
            TokenKind::SectionEnd => return Err(unexpected(&token)),
        }

        token.release(&mut buffer);
    }

    Ok(buffer.into_string())
}

fn unexpected(token: &Token) -> RenderError {
    RenderError::UnexpectedToken {
        tag: token.text.clone(),
        line: token.line,
    }
}

// =============================================================================
// Name resolution
// =============================================================================

/// Resolves a possibly dotted name.
///
/// Every segment but the last is looked up, converted (primitive conversion
/// first, otherwise lambdas are called) and becomes the only frame the next
/// segment is looked up in. The last segment is returned as stored. `"."` is
/// the innermost frame.
pub(crate) fn resolve(name: &str, stack: &ContextStack, section_text: Option<&str>) -> Option<Value> {
    if name == "." {
        return Some(stack.current().clone());
    }
    match name.rsplit_once('.') {
        None => stack.lookup(name),
        Some((prefix, last)) => {
            let scope = resolve_prefix(prefix, stack, section_text)?;
            ContextStack::new(scope).lookup(last)
        }
    }
}

/// Resolves the dotted prefix of a name to the value its last segment is
/// read from.
pub(crate) fn resolve_prefix(
    prefix: &str,
    stack: &ContextStack,
    section_text: Option<&str>,
) -> Option<Value> {
    let mut scope: Option<Value> = None;
    for segment in prefix.split('.') {
        let found = match &scope {
            None => stack.lookup(segment),
            Some(value) => ContextStack::new(value.clone()).lookup(segment),
        }?;
        scope = Some(descend(found, section_text));
    }
    scope
}

fn descend(value: Value, section_text: Option<&str>) -> Value {
    if let Some(converted) = value.to_primitive() {
        return converted;
    }
    if let Shape::Callable(lambda) = value.shape() {
        return match section_text {
            Some(text) => lambda.call_with_text(text),
            None => lambda.call(),
        };
    }
    value
}

fn convert(value: Value) -> Value {
    value.to_primitive().unwrap_or(value)
}

// =============================================================================
// Interpolation and partials
// =============================================================================

/// Produces the unescaped text for an interpolation tag.
///
/// A lambda is called with no arguments and its result is rendered with the
/// default delimiters and no partials.
fn interpolate(name: &str, stack: &mut ContextStack) -> Result<String> {
    let Some(value) = resolve(name, stack, None) else {
        trace!(name, "unresolved name");
        return Ok(String::new());
    };

    let value = convert(value);
    match value.shape() {
        Shape::Callable(lambda) => {
            let text = lambda.call().to_text();
            interpret(&text, stack, &Partials::new(), Delimiters::default())
        }
        _ => Ok(value.to_text()),
    }
}

fn expand_partial(
    name: &str,
    indentation: Option<&str>,
    stack: &mut ContextStack,
    partials: &Partials,
) -> Result<String> {
    let Some(text) = partials.get(name).filter(|text| !text.is_empty()) else {
        debug!(partial = name, "partial not found");
        return Ok(String::new());
    };

    debug!(partial = name, "expanding partial");
    let text = indent(text, indentation.unwrap_or_default());
    interpret(&text, stack, partials, Delimiters::default())
}

// =============================================================================
// Sections
// =============================================================================

/// Produces the text replacing a whole section, open tag to close tag.
fn expand_section(
    buffer: &mut Buffer,
    parser: &mut Parser,
    begin: &Token,
    stack: &mut ContextStack,
    partials: &Partials,
    delimiters: &Delimiters,
) -> Result<String> {
    let Some(end) = begin.end_token() else {
        return Err(unexpected(begin));
    };

    trim_standalone(buffer, parser, end);
    let standalone = trim_standalone(buffer, parser, begin).is_some();
    let inner = buffer.substring(begin.end, end.start).to_string();
    let value = resolve(&begin.name, stack, Some(&inner)).map(convert);

    let shape = value.as_ref().map(Value::shape);
    let items = if begin.kind == TokenKind::InvertedSectionBegin {
        let truthy = match shape {
            Some(Shape::Callable(_) | Shape::Mapping(_)) => true,
            Some(Shape::Sequence(items)) => !items.is_empty(),
            Some(Shape::Scalar(value)) => value.is_truthy(),
            None => false,
        };
        if truthy {
            Vec::new()
        } else {
            vec![Value::Bool(true)]
        }
    } else {
        match shape {
            None => Vec::new(),
            Some(Shape::Callable(lambda)) => match lambda.call_with_text(&inner) {
                Value::String(text) => {
                    debug!(section = %begin.name, "rendering lambda output");
                    return interpret(&text, stack, partials, delimiters.clone());
                }
                other => iterations(other.shape()),
            },
            Some(shape) => iterations(shape),
        }
    };

    debug!(section = %begin.name, iterations = items.len(), "rendering section");
    render_iterations(&inner, items, standalone, stack, partials, delimiters)
}

/// The frames a section body is rendered with: each item of a list, nothing
/// for a falsy scalar, otherwise the value itself once.
fn iterations(shape: Shape<'_>) -> Vec<Value> {
    match shape {
        Shape::Sequence(items) => items.to_vec(),
        Shape::Scalar(value) if !value.is_truthy() => Vec::new(),
        Shape::Scalar(value) => vec![value.clone()],
        Shape::Mapping(map) => vec![Value::Map(map.clone())],
        Shape::Callable(lambda) => vec![Value::Lambda(lambda.clone())],
    }
}

/// Renders a section body once per item.
///
/// The body is wrapped in `=` sentinels so its first and last tags are not
/// mistaken for standalone ones. The leading sentinel is left off when the
/// opening tag was standalone: the body then really starts a line.
fn render_iterations(
    inner: &str,
    items: Vec<Value>,
    standalone: bool,
    stack: &mut ContextStack,
    partials: &Partials,
    delimiters: &Delimiters,
) -> Result<String> {
    let body = if standalone {
        format!("{inner}=")
    } else {
        format!("={inner}=")
    };

    let mut output = String::new();
    for item in items {
        let mut pushed = 1;
        stack.push(item.clone());

        let mut frame = item;
        if let Some(converted) = frame.to_primitive() {
            stack.push(converted.clone());
            frame = converted;
            pushed += 1;
        }
        if let Shape::Callable(lambda) = frame.shape() {
            stack.push(lambda.call());
            pushed += 1;
        }

        let rendered = interpret(&body, stack, partials, delimiters.clone());
        for _ in 0..pushed {
            stack.pop();
        }

        let rendered = rendered?;
        let rendered = if standalone {
            rendered.as_str()
        } else {
            rendered.strip_prefix('=').unwrap_or(&rendered)
        };
        output.push_str(rendered.strip_suffix('=').unwrap_or(rendered));
    }

    Ok(output)
}

// =============================================================================
// Standalone lines
// =============================================================================

/// Removes the indentation and line break around a tag that is alone on its
/// line.
///
/// Returns the removed indentation when the tag is standalone, `None`
/// otherwise (the buffer is then untouched).
fn trim_standalone(buffer: &mut Buffer, parser: &mut Parser, token: &Token) -> Option<String> {
    let start = token.start.offset(buffer);
    let end = token.end.offset(buffer);

    let mut line_start = start;
    while let Some(c) = buffer.char_before(line_start) {
        if is_line_break(c) {
            break;
        }
        if !is_blank(c) {
            return None;
        }
        line_start -= c.len_utf8();
    }

    let mut line_end = end;
    loop {
        match buffer.char_at(line_end) {
            None => break,
            Some('\r') if buffer.char_at(line_end + 1) == Some('\n') => {
                line_end += 2;
                break;
            }
            Some(c) if is_line_break(c) => {
                line_end += 1;
                break;
            }
            Some(c) if is_blank(c) => line_end += c.len_utf8(),
            Some(_) => return None,
        }
    }

    // a line break the tokenizer has not read yet still counts
    if end >= parser.tokenizer().position(buffer) {
        let skipped = count_line_breaks(buffer.substring(end, line_end));
        parser.tokenizer_mut().add_lines(skipped);
    }

    let leading = buffer.substring(line_start, start).to_string();
    let trailing = buffer.mark(line_end);
    buffer.replace_range(line_start, start, "");
    buffer.replace_range(token.end, trailing, "");
    buffer.release(trailing);

    Some(leading)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Lambda, Map};
    use serde_json::json;

    fn run(template: &str, data: serde_json::Value) -> Result<String> {
        let mut stack = ContextStack::new(Value::from(data));
        interpret(template, &mut stack, &Partials::new(), Delimiters::default())
    }

    fn render(template: &str, data: serde_json::Value) -> String {
        run(template, data).unwrap()
    }

    // =========================================================================
    // Interpolation
    // =========================================================================

    mod interpolation {
        use super::*;

        #[test]
        fn escaped_and_raw() {
            let data = json!({"x": "A&B"});
            assert_eq!(render("{{x}}", data.clone()), "A&amp;B");
            assert_eq!(render("{{{x}}}", data.clone()), "A&B");
            assert_eq!(render("{{&x}}", data), "A&B");
        }

        #[test]
        fn missing_is_empty() {
            assert_eq!(render("[{{nope}}]", json!({})), "[]");
        }

        #[test]
        fn dotted_names() {
            assert_eq!(render("{{a.b}}", json!({"a": {"b": "x"}})), "x");
            assert_eq!(render("{{a.b}}", json!({})), "");
            assert_eq!(render("{{a.b.c}}", json!({"a": {"b": {}}})), "");
        }

        #[test]
        fn dotted_name_first_segment_searches_stack() {
            let data = json!({"a": {}, "b": {"c": "found"}});
            assert_eq!(render("{{#a}}{{b.c}}{{/a}}", data), "found");
            let data = json!({"a": {"b": {}}, "b": {"c": "ERROR"}});
            assert_eq!(render("{{#a}}{{b.c}}{{/a}}", data), "");
        }

        #[test]
        fn dotted_name_later_segments_do_not_fall_back() {
            let data = json!({"a": {"b": {}}, "c": "ERROR"});
            assert_eq!(render("{{a.b.c}}", data), "");
        }

        #[test]
        fn scalars_and_structures() {
            let data = json!({"n": 1.5, "t": true, "l": [1, 2], "z": 0});
            assert_eq!(render("{{n}} {{t}} {{l}} {{z}}", data), "1.5 true [1,2] 0");
        }

        #[test]
        fn output_is_not_rescanned() {
            assert_eq!(render("{{a}}{{b}}", json!({"a": "{{b}}", "b": "!"})), "{{b}}!");
        }

        #[test]
        fn lambda_result_is_rendered() {
            let data = Map::new();
            data.insert("planet", "world");
            data.insert("lambda", Lambda::new(|| "{{planet}}"));
            let mut stack = ContextStack::new(Value::from(data));
            let out = interpret("Hello, {{lambda}}!", &mut stack, &Partials::new(), Delimiters::default());
            assert_eq!(out.unwrap(), "Hello, world!");
        }
    }

    // =========================================================================
    // Sections
    // =========================================================================

    mod sections {
        use super::*;

        #[test]
        fn list_iteration_with_implicit() {
            assert_eq!(render("{{#a}}{{.}},{{/a}}", json!({"a": [1, 2, 3]})), "1,2,3,");
        }

        #[test]
        fn iterations_follow_shape() {
            let list = Value::from(json!([1, 2]));
            assert_eq!(iterations(list.shape()), vec![Value::from(1), Value::from(2)]);

            let map = Value::from(json!({}));
            assert_eq!(iterations(map.shape()).len(), 1);

            assert!(iterations(Value::from(0).shape()).is_empty());
            assert_eq!(iterations(Value::from("x").shape()), vec![Value::from("x")]);

            let lambda = Value::from(Lambda::new(|| "out"));
            assert!(matches!(iterations(lambda.shape()).as_slice(), [Value::Lambda(_)]));
        }

        #[test]
        fn inverted_empty_map_is_truthy() {
            assert_eq!(render("<{{^a}}shown{{/a}}>", json!({"a": {}})), "<>");
        }

        #[test]
        fn falsy_values_elide() {
            for falsy in [json!(false), json!(null), json!(""), json!(0), json!([])] {
                assert_eq!(render("[{{#a}}x{{/a}}]", json!({ "a": falsy })), "[]");
            }
        }

        #[test]
        fn map_becomes_frame() {
            let data = json!({"a": {"name": "inner"}, "name": "outer"});
            assert_eq!(render("{{#a}}{{name}}{{/a}}|{{name}}", data), "inner|outer");
        }

        #[test]
        fn inverted() {
            assert_eq!(render("{{^a}}empty{{/a}}", json!({"a": []})), "empty");
            assert_eq!(render("{{^a}}empty{{/a}}", json!({"a": [1]})), "");
            assert_eq!(render("{{^a}}missing{{/a}}", json!({})), "missing");
        }

        #[test]
        fn standalone_lines_are_removed() {
            let template = "| This Is\n{{#boolean}}\n|\n{{/boolean}}\n| A Line\n";
            assert_eq!(
                render(template, json!({"boolean": true})),
                "| This Is\n|\n| A Line\n"
            );
        }

        #[test]
        fn nested_standalone_sections() {
            let template = "{{#a}}\n{{#b}}\nx\n{{/b}}\n{{/a}}\n";
            assert_eq!(render(template, json!({"a": true, "b": true})), "x\n");
        }

        #[test]
        fn inline_tags_keep_whitespace() {
            assert_eq!(
                render(" {{#a}}YES{{/a}}\n {{#a}}GOOD{{/a}}\n", json!({"a": true})),
                " YES\n GOOD\n"
            );
        }

        #[test]
        fn section_lambda_gets_raw_text() {
            let data = Map::new();
            data.insert("name", "Willy");
            data.insert(
                "wrap",
                Lambda::section(|text| format!("<b>{text}</b>")),
            );
            let mut stack = ContextStack::new(Value::from(data));
            let out = interpret("{{#wrap}}{{name}} is awesome.{{/wrap}}", &mut stack, &Partials::new(), Delimiters::default());
            assert_eq!(out.unwrap(), "<b>Willy is awesome.</b>");
        }

        #[test]
        fn section_lambda_non_string_result_is_data() {
            let data = Map::new();
            data.insert("items", Lambda::new(|| vec![1, 2]));
            let mut stack = ContextStack::new(Value::from(data));
            let out = interpret("{{#items}}<{{.}}>{{/items}}", &mut stack, &Partials::new(), Delimiters::default());
            assert_eq!(out.unwrap(), "<1><2>");
        }

        #[test]
        fn inverted_lambda_is_truthy() {
            let data = Map::new();
            data.insert("f", Lambda::new(|| false));
            let mut stack = ContextStack::new(Value::from(data));
            let out = interpret("<{{^f}}shown{{/f}}>", &mut stack, &Partials::new(), Delimiters::default());
            assert_eq!(out.unwrap(), "<>");
        }

        #[test]
        fn stack_is_balanced_after_render() {
            let mut stack = ContextStack::new(Value::from(json!({"a": [{"b": 1}, {"b": 2}]})));
            interpret("{{#a}}{{b}}{{/a}}", &mut stack, &Partials::new(), Delimiters::default()).unwrap();
            assert_eq!(stack.depth(), 1);
        }
    }

    // =========================================================================
    // Partials and delimiters
    // =========================================================================

    mod partials {
        use super::*;

        fn with_partials(template: &str, data: serde_json::Value, partials: &[(&str, &str)]) -> String {
            let partials: Partials = partials
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            let mut stack = ContextStack::new(Value::from(data));
            interpret(template, &mut stack, &partials, Delimiters::default()).unwrap()
        }

        #[test]
        fn partial_sees_current_context() {
            let out = with_partials(
                "{{#a}}{{>row}}{{/a}}",
                json!({"a": [{"n": 1}, {"n": 2}]}),
                &[("row", "({{n}})")],
            );
            assert_eq!(out, "(1)(2)");
        }

        #[test]
        fn standalone_partial_is_indented() {
            let out = with_partials(
                "\\\n {{>partial}}\n/\n",
                json!({"content": "<\n->"}),
                &[("partial", "|\n{{{content}}}\n|\n")],
            );
            assert_eq!(out, "\\\n |\n <\n->\n |\n/\n");
        }

        #[test]
        fn missing_partial_is_empty() {
            assert_eq!(with_partials("[{{>nope}}]", json!({}), &[]), "[]");
        }

        #[test]
        fn partial_uses_default_delimiters() {
            let out = with_partials(
                "{{=<% %>=}}<%>p%>",
                json!({"x": "y"}),
                &[("p", "{{x}}")],
            );
            assert_eq!(out, "y");
        }

        #[test]
        fn switch_only_applies_after_tag() {
            assert_eq!(render("{{x}}{{=<% %>=}}<%x%>{{x}}", json!({"x": "y"})), "yy{{x}}");
        }

        #[test]
        fn standalone_comment() {
            assert_eq!(render("Begin.\n{{! Comment }}\nEnd.\n", json!({})), "Begin.\nEnd.\n");
        }
    }

    // =========================================================================
    // Errors
    // =========================================================================

    mod errors {
        use super::*;

        #[test]
        fn unclosed_section_names_opening_line() {
            let err = run("a\nb\n{{#a}}\n", json!({})).unwrap_err();
            assert!(matches!(err, RenderError::UnclosedSection { line: 3, .. }));
        }

        #[test]
        fn lines_survive_trimmed_tags() {
            let err = run("{{! one }}\n{{! two }}\n{{/x}}", json!({})).unwrap_err();
            assert_eq!(err.line(), Some(3));
        }

        #[test]
        fn lines_after_standalone_sections() {
            let err = run("{{#a}}\n{{/a}}\n{{/b}}", json!({"a": true})).unwrap_err();
            assert_eq!(err.line(), Some(3));
        }
    }
}
