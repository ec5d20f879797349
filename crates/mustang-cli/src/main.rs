//! `mustang` command-line tool.

mod cli;

use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use mustang::{Delimiters, PartialRegistry, Renderer, Value};
use tracing::Level;

use cli::{Cli, Command, Input};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Render { input, output } => {
            let (template, renderer, data) = load(&input)?;
            let rendered = renderer.render(&template, &data)?;
            match output {
                Some(path) => std::fs::write(&path, rendered)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => io::stdout().write_all(rendered.as_bytes())?,
            }
        }
        Command::Inspect { input } => {
            let (template, renderer, data) = load(&input)?;
            let mut stdout = io::stdout().lock();
            for accessor in renderer.inspect(&template, &data)? {
                let line = serde_json::json!({
                    "name": accessor.name(),
                    "kind": format!("{:?}", accessor.token().kind),
                    "line": accessor.token().line,
                    "value": accessor.get().to_json(),
                });
                writeln!(stdout, "{}", line)?;
            }
        }
    }
    Ok(())
}

fn load(input: &Input) -> Result<(String, Renderer, Value)> {
    let template = read_template(&input.template)?;

    let mut registry = PartialRegistry::new();
    for dir in &input.partial_dirs {
        registry
            .add_template_dir(dir)
            .with_context(|| format!("loading partials from {}", dir.display()))?;
    }
    for (name, path) in &input.partials {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading partial {}", path.display()))?;
        registry.add_inline(name.clone(), source);
    }
    tracing::debug!(partials = registry.len(), "partials loaded");

    let renderer = Renderer::new()
        .with_registry(&registry)?
        .with_delimiters(input.delimiters.clone().unwrap_or_else(Delimiters::default));

    let data = match &input.data {
        Some(path) => read_data(path)?,
        None => Value::Null,
    };

    Ok((template, renderer, data))
}

fn read_template(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("reading template from stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading template {}", path.display()))
}

fn read_data(path: &Path) -> Result<Value> {
    let source =
        std::fs::read_to_string(path).with_context(|| format!("reading data {}", path.display()))?;

    let json: serde_json::Value = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str(&source)
            .with_context(|| format!("parsing YAML in {}", path.display()))?,
        Some("json") => serde_json::from_str(&source)
            .with_context(|| format!("parsing JSON in {}", path.display()))?,
        _ => bail!(
            "unsupported data file {}: expected .json, .yaml or .yml",
            path.display()
        ),
    };
    Ok(Value::from(json))
}
