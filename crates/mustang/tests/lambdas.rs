//! Lambdas, methods and primitive conversion.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use mustang::{render, Call, Lambda, Map, Value};

fn render_map(template: &str, data: &Map) -> String {
    render(template, &Value::from(data.clone()), &HashMap::new()).unwrap()
}

// =============================================================================
// Interpolation
// =============================================================================

#[test]
fn test_interpolation() {
    let data = Map::new();
    data.insert("lambda", Lambda::new(|| "world"));
    assert_eq!(render_map("Hello, {{lambda}}!", &data), "Hello, world!");
}

#[test]
fn test_interpolation_expansion() {
    let data = Map::new();
    data.insert("planet", "world");
    data.insert("lambda", Lambda::new(|| "{{planet}}"));
    assert_eq!(render_map("Hello, {{lambda}}!", &data), "Hello, world!");
}

#[test]
fn test_interpolation_alternate_delimiters() {
    let data = Map::new();
    data.insert("planet", "world");
    data.insert("lambda", Lambda::new(|| "|planet| => {{planet}}"));
    assert_eq!(
        render_map("{{= | | =}}\nHello, (|&lambda|)!", &data),
        "Hello, (|planet| => world)!"
    );
}

#[test]
fn test_interpolation_result_has_no_partials() {
    let data = Map::new();
    data.insert("lambda", Lambda::new(|| "{{>p}}"));
    let partials = HashMap::from([("p".to_string(), "partial text".to_string())]);

    let output = render("[{{lambda}}][{{>p}}]", &Value::from(data), &partials).unwrap();
    assert_eq!(output, "[][partial text]");
}

#[test]
fn test_interpolation_result_ignores_switched_delimiters() {
    let data = Map::new();
    data.insert("x", "value");
    data.insert("lambda", Lambda::new(|| "|x|"));
    assert_eq!(render_map("{{= | | =}}<|lambda|> <|x|>", &data), "<|x|> <value>");
}

#[test]
fn test_interpolation_multiple_calls() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let data = Map::new();
    data.insert(
        "lambda",
        Lambda::new(move || {
            counter.set(counter.get() + 1);
            counter.get()
        }),
    );
    assert_eq!(
        render_map("{{lambda}} == {{{lambda}}} == {{lambda}}", &data),
        "1 == 2 == 3"
    );
    assert_eq!(calls.get(), 3);
}

#[test]
fn test_escaping() {
    let data = Map::new();
    data.insert("lambda", Lambda::new(|| ">"));
    assert_eq!(render_map("<{{lambda}}{{{lambda}}}", &data), "<&gt;>");
}

// =============================================================================
// Sections
// =============================================================================

#[test]
fn test_section_receives_raw_text() {
    let data = Map::new();
    data.insert("x", "Error!");
    data.insert(
        "lambda",
        Lambda::section(|text| if text == "{{x}}" { "yes" } else { "no" }),
    );
    assert_eq!(render_map("<{{#lambda}}{{x}}{{/lambda}}>", &data), "<yes>");
}

#[test]
fn test_section_expansion() {
    let data = Map::new();
    data.insert("planet", "Earth");
    data.insert(
        "lambda",
        Lambda::section(|text| format!("{text}{{{{planet}}}}{text}")),
    );
    assert_eq!(render_map("<{{#lambda}}-{{/lambda}}>", &data), "<-Earth->");
}

#[test]
fn test_section_alternate_delimiters() {
    let data = Map::new();
    data.insert("planet", "Earth");
    data.insert(
        "lambda",
        Lambda::section(|text| format!("{text}{{{{planet}}}} => |planet|{text}")),
    );
    assert_eq!(
        render_map("{{= | | =}}<|#lambda|-|/lambda|>", &data),
        "<-{{planet}} => Earth->"
    );
}

#[test]
fn test_section_multiple_calls() {
    let data = Map::new();
    data.insert("lambda", Lambda::section(|text| format!("__{text}__")));
    assert_eq!(
        render_map("{{#lambda}}FILE{{/lambda}} != {{#lambda}}LINE{{/lambda}}", &data),
        "__FILE__ != __LINE__"
    );
}

#[test]
fn test_inverted_section() {
    let data = Map::new();
    data.insert("static", "static");
    data.insert("lambda", Lambda::new(|| false));
    assert_eq!(render_map("<{{^lambda}}{{static}}{{/lambda}}>", &data), "<>");
}

#[test]
fn test_section_result_used_as_data() {
    let data = Map::new();
    data.insert(
        "people",
        Lambda::new(|| {
            vec![
                Map::from_iter([("name", "Ann")]),
                Map::from_iter([("name", "Bo")]),
            ]
        }),
    );
    assert_eq!(render_map("{{#people}}<{{name}}>{{/people}}", &data), "<Ann><Bo>");
}

#[test]
fn test_lambda_items_are_called_when_iterated() {
    let data = Map::new();
    data.insert(
        "items",
        vec![
            Lambda::new(|| Map::from_iter([("name", "first")])),
            Lambda::new(|| Map::from_iter([("name", "second")])),
        ],
    );
    assert_eq!(render_map("{{#items}}{{name}};{{/items}}", &data), "first;second;");
}

// =============================================================================
// Receivers
// =============================================================================

#[test]
fn test_method_sees_owning_frame() {
    let person = Map::new();
    person.insert("first", "Ada");
    person.insert(
        "full",
        Lambda::method(|this| {
            let first = this.get("first").map(|v| v.to_text()).unwrap_or_default();
            format!("{first} Lovelace")
        }),
    );
    let data = Map::new();
    data.insert("person", person);

    assert_eq!(render_map("{{person.full}}", &data), "Ada Lovelace");
    assert_eq!(render_map("{{#person}}{{full}}{{/person}}", &data), "Ada Lovelace");
}

#[test]
fn test_method_bound_to_frame_found_in() {
    let data = Map::new();
    data.insert("label", "outer");
    data.insert(
        "describe",
        Lambda::method(|this| this.get("label").map(|v| v.to_text()).unwrap_or_default()),
    );
    data.insert("inner", Map::from_iter([("label", "inner")]));

    // found on the root, so the root is its receiver
    assert_eq!(render_map("{{#inner}}{{describe}}{{/inner}}", &data), "outer");
}

#[test]
fn test_from_fn_sees_text_and_receiver() {
    let data = Map::new();
    data.insert("tag", "em");
    data.insert(
        "wrap",
        Lambda::from_fn(|call: &Call<'_>| {
            let tag = call
                .receiver()
                .and_then(|this| this.get("tag"))
                .map(|v| v.to_text())
                .unwrap_or_default();
            format!("<{tag}>{}</{tag}>", call.text().unwrap_or_default())
        }),
    );
    assert_eq!(render_map("{{#wrap}}hi{{/wrap}}", &data), "<em>hi</em>");
}

// =============================================================================
// Primitive conversion
// =============================================================================

fn money(cents: i64) -> Map {
    let value = Map::new().with_primitive(Lambda::method(|this| {
        let cents = this
            .get("cents")
            .and_then(|v| v.to_json().as_i64())
            .unwrap_or(0);
        format!("${}.{:02}", cents / 100, cents % 100)
    }));
    value.insert("cents", cents);
    value
}

#[test]
fn test_primitive_conversion_interpolates() {
    let data = Map::new();
    data.insert("total", money(1999));
    assert_eq!(render_map("Total: {{total}}", &data), "Total: $19.99");
}

#[test]
fn test_primitive_conversion_in_sections() {
    let data = Map::new();
    data.insert("prices", vec![money(100), money(250)]);
    assert_eq!(
        render_map("{{#prices}}[{{.}} from {{cents}}]{{/prices}}", &data),
        "[$1.00 from 100][$2.50 from 250]"
    );
}

#[test]
fn test_primitive_conversion_in_dotted_names() {
    let converted = Map::new().with_primitive(Lambda::new(|| Map::from_iter([("shown", "yes")])));
    converted.insert("shown", "no");
    let data = Map::new();
    data.insert("item", converted);
    assert_eq!(render_map("{{item.shown}}", &data), "yes");
}
