//! End-to-end tests for the `mustang` binary.

use assert_cmd::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn mustang() -> Command {
    Command::new(cargo_bin!("mustang"))
}

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_help_lists_commands() {
    mustang()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("inspect"));
}

#[test]
fn test_render_with_json_data() {
    let dir = TempDir::new().unwrap();
    let template = write(dir.path(), "page.mustache", "Hello {{name}}!{{#items}} {{.}}{{/items}}\n");
    let data = write(dir.path(), "data.json", r#"{"name": "<World>", "items": [1, 2]}"#);

    mustang()
        .args(["render", &template, "--data", &data])
        .assert()
        .success()
        .stdout("Hello &lt;World&gt;! 1 2\n");
}

#[test]
fn test_render_with_yaml_data_and_partial_dir() {
    let dir = TempDir::new().unwrap();
    let template = write(dir.path(), "page.mustache", "{{#users}}\n{{>rows/user}}\n{{/users}}\n");
    let data = write(dir.path(), "data.yml", "users:\n  - name: Ann\n  - name: Bo\n");
    write(dir.path(), "parts/rows/user.mustache", "* {{name}}\n");
    let parts = dir.path().join("parts");

    mustang()
        .args(["render", &template, "--data", &data, "--partials"])
        .arg(&parts)
        .assert()
        .success()
        .stdout("* Ann\n* Bo\n");
}

#[test]
fn test_render_single_partial_and_delimiters() {
    let dir = TempDir::new().unwrap();
    let template = write(dir.path(), "page.txt", "[<%>box%>]");
    let partial = write(dir.path(), "box.txt", "{{x}}");
    let data = write(dir.path(), "data.json", r#"{"x": "in"}"#);

    mustang()
        .args(["render", &template, "--data", &data, "--delimiters", "<% %>"])
        .arg("--partial")
        .arg(format!("box={partial}"))
        .assert()
        .success()
        .stdout("[in]");
}

#[test]
fn test_render_from_stdin_to_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.txt");

    mustang()
        .args(["render", "-", "--output"])
        .arg(&out)
        .write_stdin("{{! nothing }}static")
        .assert()
        .success()
        .stdout("");

    assert_eq!(fs::read_to_string(out).unwrap(), "static");
}

#[test]
fn test_render_from_stdin_with_data() {
    let dir = TempDir::new().unwrap();
    let data = write(dir.path(), "data.json", r#"{"name": "stdin"}"#);

    mustang()
        .args(["render", "-", "--data", &data])
        .write_stdin("hello {{name}}")
        .assert()
        .success()
        .stdout("hello stdin");
}

#[test]
fn test_render_syntax_error_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let template = write(dir.path(), "bad.mustache", "line\n{{#open}}\n");

    mustang()
        .args(["render", &template])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing section end"))
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn test_missing_template_reports_path() {
    mustang()
        .args(["render", "does/not/exist.mustache"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does/not/exist.mustache"));
}

#[test]
fn test_unknown_data_extension() {
    let dir = TempDir::new().unwrap();
    let template = write(dir.path(), "t.mustache", "x");
    let data = write(dir.path(), "data.toml", "x = 1");

    mustang()
        .args(["render", &template, "--data", &data])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported data file"));
}

#[test]
fn test_inspect_prints_json_lines() {
    let dir = TempDir::new().unwrap();
    let template = write(dir.path(), "t.mustache", "{{user.name}}\n{{#tags}}{{.}}{{/tags}}");
    let data = write(dir.path(), "data.json", r#"{"user": {"name": "Ann"}, "tags": ["a"]}"#);

    mustang()
        .args(["inspect", &template, "--data", &data])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""name":"user.name""#))
        .stdout(predicate::str::contains(r#""value":"Ann""#))
        .stdout(predicate::str::contains(r#""kind":"SectionBegin""#))
        .stdout(predicate::str::contains(r#""value":["a"]"#))
        .stdout(predicate::str::contains("\n").count(2));
}
