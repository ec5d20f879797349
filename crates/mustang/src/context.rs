//! The context stack names are resolved against.
//!
//! A render starts with the caller's data as the only frame. Sections push a
//! frame per iterated element and pop it when the iteration is done. Lookup
//! walks frames from the innermost outwards and the first frame holding the key
//! wins, so inner scopes shadow outer ones.

use crate::value::Value;

/// An ordered stack of data frames. The last frame is the innermost scope.
#[derive(Debug, Clone, Default)]
pub struct ContextStack {
    root: Value,
    frames: Vec<Value>,
}

impl ContextStack {
    /// Creates a stack with `root` as its only frame.
    pub fn new(root: Value) -> Self {
        Self {
            root,
            frames: Vec::new(),
        }
    }

    /// Pushes a new innermost frame.
    pub fn push(&mut self, frame: Value) {
        self.frames.push(frame);
    }

    /// Pops the innermost frame. The root frame is never popped.
    pub fn pop(&mut self) -> Option<Value> {
        self.frames.pop()
    }

    /// The innermost frame.
    pub fn current(&self) -> &Value {
        self.frames.last().unwrap_or(&self.root)
    }

    /// Number of frames, including the root.
    pub fn depth(&self) -> usize {
        self.frames.len() + 1
    }

    /// Resolves a single key.
    ///
    /// Lambdas come back bound to the frame they were found in, so they see
    /// that frame as their receiver when called.
    pub fn lookup(&self, key: &str) -> Option<Value> {
        self.lookup_owner(key).map(|(_, value)| value)
    }

    /// Resolves a single key, also returning the frame that holds it.
    pub fn lookup_owner(&self, key: &str) -> Option<(Value, Value)> {
        let mut frames = self.frames.iter().rev().chain(std::iter::once(&self.root));
        frames.find_map(|frame| {
            let value = frame.get(key)?;
            let value = match value {
                Value::Lambda(lambda) => Value::Lambda(lambda.bind(frame.clone())),
                other => other,
            };
            Some((frame.clone(), value))
        })
    }
}
