//! Read/write access to the data a template touches.
//!
//! [`inspect`](crate::inspect) walks a template's top-level tokens without
//! rendering anything and returns one [`Accessor`] per tag that reads from the
//! context: interpolations, implicit tags, partials and sections. An accessor
//! remembers the context value owning its name, so tooling can read the value
//! a template would display and write a new one back into the caller's data.
//!
//! Writes go through [`Map`](crate::Map)'s shared storage, so they are visible
//! through every clone of the data passed in.
//!
//! # Example
//!
//! ```rust
//! use mustang::{inspect, Map, Value};
//! use std::collections::HashMap;
//!
//! let data = Map::new();
//! data.insert("user", Map::from_iter([("name", "Ann")]));
//!
//! let accessors = inspect("Hi {{user.name}}!", &Value::from(data.clone()), &HashMap::new()).unwrap();
//! assert_eq!(accessors[0].name(), "user.name");
//! assert_eq!(accessors[0].get(), Value::from("Ann"));
//!
//! accessors[0].set("Bo");
//! assert_eq!(data.get("user").unwrap().get("name"), Some(Value::from("Bo")));
//! ```

use crate::buffer::Buffer;
use crate::context::ContextStack;
use crate::error::Result;
use crate::template::{resolve_prefix, Delimiters, Parser, Partials, Token, TokenKind};
use crate::value::Value;

#[derive(Debug, Clone)]
enum Target {
    /// The owning frame itself (`{{.}}`).
    Frame,
    /// A key of the owning value.
    Key(String),
    /// A partial's template text.
    Partial(Option<String>),
}

/// Access to the value behind one tag.
#[derive(Debug, Clone)]
pub struct Accessor {
    token: Token,
    owner: Value,
    target: Target,
    section_text: Option<String>,
}

impl Accessor {
    fn new(
        token: Token,
        stack: &ContextStack,
        partials: &Partials,
        section_text: Option<String>,
    ) -> Self {
        let current = stack.current().clone();
        let (owner, target) = match token.kind {
            TokenKind::Partial => (current, Target::Partial(partials.get(&token.name).cloned())),
            TokenKind::Implicit => (current, Target::Frame),
            _ if token.name == "." => (current, Target::Frame),
            _ => match token.name.rsplit_once('.') {
                Some((prefix, last)) => (
                    resolve_prefix(prefix, stack, section_text.as_deref()).unwrap_or_default(),
                    Target::Key(last.to_string()),
                ),
                None => (
                    stack
                        .lookup_owner(&token.name)
                        .map_or(current, |(owner, _)| owner),
                    Target::Key(token.name.clone()),
                ),
            },
        };

        Self {
            token,
            owner,
            target,
            section_text,
        }
    }

    /// The full, possibly dotted, name in the tag.
    pub fn name(&self) -> &str {
        &self.token.name
    }

    /// The token this accessor was made for.
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// The context value the name is read from.
    ///
    /// For a dotted name this is what the prefix resolved to, otherwise the
    /// frame holding the key (the data root when no frame does). Null when a
    /// dotted prefix does not resolve.
    pub fn owner(&self) -> &Value {
        &self.owner
    }

    /// The stored value, without conversion.
    pub fn raw_get(&self) -> Value {
        match &self.target {
            Target::Frame => self.owner.clone(),
            Target::Key(key) => self.owner.get(key).unwrap_or_default(),
            Target::Partial(text) => Value::from(text.clone()),
        }
    }

    /// The value as rendering sees it.
    ///
    /// Maps with a primitive conversion are converted. Lambdas are called
    /// bound to their owner; section lambdas receive the raw section body.
    pub fn get(&self) -> Value {
        let raw = self.raw_get();
        if let Some(converted) = raw.to_primitive() {
            return converted;
        }

        let Value::Lambda(lambda) = raw else {
            return raw;
        };
        let lambda = match (&self.owner, lambda.receiver()) {
            (Value::Map(_), None) => lambda.bind(self.owner.clone()),
            _ => lambda,
        };
        match &self.section_text {
            Some(text) => lambda.call_with_text(text),
            None => lambda.call(),
        }
    }

    /// Writes a value back.
    ///
    /// A stored lambda with a setter receives the value. Otherwise the value
    /// is inserted into the owning map. Returns false when there is nowhere
    /// to write: the owner is not a map, or the tag is a partial.
    pub fn set(&self, value: impl Into<Value>) -> bool {
        let value = value.into();
        if let Value::Lambda(lambda) = self.raw_get() {
            if lambda.has_setter() {
                return lambda.assign(value);
            }
        }

        match (&self.target, &self.owner) {
            (Target::Key(key), Value::Map(map)) => {
                map.insert(key.clone(), value);
                true
            }
            _ => false,
        }
    }
}

/// Builds accessors for every top-level tag of `template` that reads from
/// the context.
///
/// Sections are paired and skipped as units, exactly as rendering does, so
/// syntax errors are reported the same way.
pub(crate) fn inspect_template(
    template: &str,
    data: &Value,
    partials: &Partials,
    delimiters: &Delimiters,
) -> Result<Vec<Accessor>> {
    let stack = ContextStack::new(data.clone());
    let mut buffer = Buffer::new(template);
    let mut parser = Parser::new(&mut buffer);
    let mut delimiters = delimiters.clone();
    let mut accessors = Vec::new();

    while let Some(token) = parser.next(&mut buffer, &mut delimiters)? {
        if !token.kind.reads_context() {
            continue;
        }
        let section_text = token
            .end_token()
            .map(|end| buffer.substring(token.end, end.start).to_string());
        accessors.push(Accessor::new(token, &stack, partials, section_text));
    }

    buffer.invalidate_marks();
    Ok(accessors)
}
