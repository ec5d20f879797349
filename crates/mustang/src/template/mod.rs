//! Mustache-style template rendering.
//!
//! A template is rendered by expanding it in place. The pipeline has four
//! layers, each usable on its own:
//!
//! - [`Tokenizer`] splits text into [`Token`]s under the current
//!   [`Delimiters`], tracking the line each token starts on.
//! - [`Parser`] pairs section open tags with their close tags and applies
//!   set-delimiter tags, yielding one top-level token at a time.
//! - [`interpret`] resolves each token against a
//!   [`ContextStack`](crate::ContextStack) and writes the result over the tag.
//! - [`render`], [`Renderer`] and [`MustacheEngine`] wrap the above for
//!   callers that only have a template and some data.
//!
//! ## Tags
//!
//! | Tag | Meaning |
//! |-----|---------|
//! | `{{name}}` | Escaped interpolation |
//! | `{{{name}}}`, `{{&name}}` | Unescaped interpolation |
//! | `{{.}}` | The current context |
//! | `{{#name}}...{{/name}}` | Section |
//! | `{{^name}}...{{/name}}` | Inverted section |
//! | `{{>name}}` | Partial |
//! | `{{! text}}` | Comment |
//! | `{{=<% %>=}}` | Set delimiters |
//!
//! ## Partials
//!
//! Partials are looked up by name in a [`Partials`] map. For file-based
//! partials, use [`PartialRegistry`]:
//!
//! ```rust,ignore
//! let mut registry = PartialRegistry::new();
//! registry.add_template_dir("./partials")?;
//! let partials = registry.to_partials()?;
//! ```

mod engine;
mod functions;
mod interpreter;
mod parser;
pub mod registry;
mod renderer;
mod token;
mod tokenizer;

pub use engine::{MustacheEngine, TemplateEngine};
pub use functions::{inspect, inspect_with_delimiters, render, render_with_delimiters, validate};
pub use interpreter::{interpret, Partials};
pub(crate) use interpreter::resolve_prefix;
pub use parser::Parser;
pub use registry::{walk_template_dir, PartialRegistry, RegistryError, TemplateFile, TEMPLATE_EXTENSIONS};
pub use renderer::Renderer;
pub use token::{Delimiters, Token, TokenKind};
pub use tokenizer::Tokenizer;
