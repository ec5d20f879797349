//! # Mustang - Mustache Templates Rendered In Place
//!
//! `mustang` renders logic-less Mustache templates against dynamically typed
//! data. Templates are expanded inside a single mutable buffer: each tag is
//! replaced by its output where it stands, and positions that must survive
//! those edits are tracked as [`Mark`]s.
//!
//! ## Core Concepts
//!
//! - [`Value`]: The data model. [`Map`]s are shared, so writes made through
//!   [`inspect`] are visible to the caller.
//! - [`Lambda`]: Callable data, for computed values and section filters.
//! - [`render`]: Renders a template with a root value and named partials.
//! - [`inspect`]: Lists the data a template reads, with read/write access.
//! - [`Renderer`]: Partials and delimiters shared by many renders.
//! - [`TemplateEngine`]: The engine seam, implemented by [`MustacheEngine`].
//!
//! ## Quick Start
//!
//! ```rust
//! use mustang::{render, Value};
//! use serde_json::json;
//! use std::collections::HashMap;
//!
//! let data = Value::from(json!({
//!     "title": "Report",
//!     "rows": [{"name": "cpu", "load": 0.5}, {"name": "mem", "load": 0.25}],
//! }));
//!
//! let template = "\
//! {{title}}
//! {{#rows}}
//! - {{name}}: {{load}}
//! {{/rows}}
//! {{^rows}}
//! (empty)
//! {{/rows}}
//! ";
//!
//! let output = render(template, &data, &HashMap::new()).unwrap();
//! assert_eq!(output, "Report\n- cpu: 0.5\n- mem: 0.25\n");
//! ```
//!
//! ## Lambdas
//!
//! A lambda used as a section receives the raw section text. A string result
//! is rendered in place of the section:
//!
//! ```rust
//! use mustang::{render, Lambda, Map, Value};
//! use std::collections::HashMap;
//!
//! let data = Map::new();
//! data.insert("name", "Willy");
//! data.insert("bold", Lambda::section(|text: &str| format!("<b>{}</b>", text)));
//!
//! let output = render("{{#bold}}Hi {{name}}.{{/bold}}", &Value::from(data), &HashMap::new()).unwrap();
//! assert_eq!(output, "<b>Hi Willy.</b>");
//! ```
//!
//! ## Logging
//!
//! With the `tracing` feature enabled, tokenizing and rendering emit
//! `tracing` events at trace and debug level.

#[macro_use]
mod tracing_macros;

pub mod buffer;
pub mod context;
pub mod error;
pub mod inspect;
pub mod template;
pub mod util;
pub mod value;

pub use buffer::{Buffer, Mark, Position};
pub use context::ContextStack;
pub use error::{RenderError, Result};
pub use inspect::Accessor;
pub use template::{
    inspect, inspect_with_delimiters, interpret, render, render_with_delimiters, validate,
    walk_template_dir, Delimiters, MustacheEngine, PartialRegistry, Parser, Partials,
    RegistryError, Renderer, TemplateEngine, TemplateFile, Token, TokenKind, Tokenizer,
    TEMPLATE_EXTENSIONS,
};
pub use util::{escape_html, indent};
pub use value::{Call, Lambda, Map, Shape, Value};
