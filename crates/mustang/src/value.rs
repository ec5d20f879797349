//! Dynamic values rendered by templates.
//!
//! Templates read from a tree of [`Value`]s. Most data arrives through serde
//! ([`Value::from_serialize`]), the same path the rest of the crate uses for
//! JSON and YAML input. Two things serde cannot express are added here:
//!
//! - [`Lambda`]: a callable value. Interpolating a lambda calls it and renders
//!   the returned text; a section over a lambda hands it the raw section body.
//! - Primitive conversion: a [`Map`] can carry a lambda that produces the value
//!   the map stands for (see [`Map::with_primitive`]). Dotted-name descent and
//!   interpolation use the converted value, section iteration pushes both.
//!
//! [`Map`] is shared and interior-mutable: cloning a map aliases its entries.
//! That is what lets inspection accessors write back into the caller's data.
//!
//! # Example
//!
//! ```rust
//! use mustang::{Lambda, Map, Value};
//!
//! let data = Map::new();
//! data.insert("name", "Chris");
//! data.insert("shout", Lambda::section(|text| text.to_uppercase()));
//!
//! let value = Value::from(data.clone());
//! assert_eq!(value.get("name"), Some(Value::from("Chris")));
//!
//! // Clones share entries.
//! data.insert("age", 42);
//! assert!(value.get("age").is_some());
//! ```

use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Number;

use crate::error::RenderError;

/// A value in the render context.
#[derive(Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Value>),
    Map(Map),
    Lambda(Lambda),
}

/// How a value behaves when a template touches it.
///
/// Every resolved value is classified once and the interpreter dispatches on
/// the result instead of probing the value at each use site.
#[derive(Debug, Clone, Copy)]
pub enum Shape<'a> {
    /// Null, booleans, numbers and strings.
    Scalar(&'a Value),
    /// A list, iterated by sections.
    Sequence(&'a [Value]),
    /// A key/value table, pushed as a context frame.
    Mapping(&'a Map),
    /// A lambda.
    Callable(&'a Lambda),
}

impl Value {
    /// Converts any serializable value into a render value.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mustang::Value;
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// struct User { name: String, admin: bool }
    ///
    /// let value = Value::from_serialize(&User { name: "Ann".into(), admin: true }).unwrap();
    /// assert_eq!(value.get("admin"), Some(Value::Bool(true)));
    /// ```
    pub fn from_serialize<T: Serialize + ?Sized>(data: &T) -> Result<Value, RenderError> {
        Ok(Value::from(serde_json::to_value(data)?))
    }

    /// Classifies this value.
    pub fn shape(&self) -> Shape<'_> {
        match self {
            Value::List(items) => Shape::Sequence(items),
            Value::Map(map) => Shape::Mapping(map),
            Value::Lambda(lambda) => Shape::Callable(lambda),
            scalar => Shape::Scalar(scalar),
        }
    }

    /// Section truthiness.
    ///
    /// Null, `false`, the empty string, numeric zero and the empty list are
    /// falsy. Maps and lambdas are always truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(_) | Value::Lambda(_) => true,
        }
    }

    /// Returns true if this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the string slice if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the map if this is a map.
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the items if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the lambda if this is a lambda.
    pub fn as_lambda(&self) -> Option<&Lambda> {
        match self {
            Value::Lambda(lambda) => Some(lambda),
            _ => None,
        }
    }

    /// Looks up a key when this value is a map.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Applies the map's primitive conversion, if it has one.
    pub fn to_primitive(&self) -> Option<Value> {
        match self {
            Value::Map(map) => map.primitive().map(|convert| convert.bind(self.clone()).call()),
            _ => None,
        }
    }

    /// Renders this value as interpolation text.
    ///
    /// Null and lambdas produce nothing, numbers use JSON formatting
    /// (`1.210` becomes `1.21`), lists and maps use compact JSON.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null | Value::Lambda(_) => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            Value::List(_) | Value::Map(_) => serde_json::to_string(self).unwrap_or_default(),
        }
    }

    /// Converts to a JSON value. Lambdas become null.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Map(map) => fmt::Debug::fmt(map, f),
            Value::Lambda(lambda) => fmt::Debug::fmt(lambda, f),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null | Value::Lambda(_) => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let entries = map.entries();
                let mut out = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries.iter() {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}

// =============================================================================
// Map
// =============================================================================

/// A shared string-keyed table.
///
/// Clones alias the same entries. All mutation goes through `&self`.
#[derive(Clone, Default)]
pub struct Map {
    entries: Rc<RefCell<BTreeMap<String, Value>>>,
    primitive: Option<Lambda>,
}

impl Map {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a primitive conversion.
    ///
    /// The lambda is called with the map bound as its receiver whenever a
    /// template needs the map's primitive value.
    ///
    /// ```rust
    /// use mustang::{render, Lambda, Map, Value};
    /// use std::collections::HashMap;
    ///
    /// let price = Map::new().with_primitive(Lambda::method(|this| {
    ///     let cents = this.get("cents").and_then(|v| v.to_json().as_i64()).unwrap_or(0);
    ///     format!("{}.{:02}", cents / 100, cents % 100)
    /// }));
    /// price.insert("cents", 1250);
    ///
    /// let data = Map::new();
    /// data.insert("price", price);
    ///
    /// let out = render("{{price}}", &Value::from(data), &HashMap::new()).unwrap();
    /// assert_eq!(out, "12.50");
    /// ```
    pub fn with_primitive(mut self, convert: Lambda) -> Self {
        self.primitive = Some(convert);
        self
    }

    /// The primitive conversion, if any.
    pub fn primitive(&self) -> Option<&Lambda> {
        self.primitive.as_ref()
    }

    /// Inserts a value, returning the previous one.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.borrow_mut().insert(key.into(), value.into())
    }

    /// Returns a clone of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.borrow().get(key).cloned()
    }

    /// Returns true if the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// Removes a key, returning its value.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.entries.borrow_mut().remove(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Returns true if the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// The keys, in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    /// Borrows the underlying entries.
    ///
    /// Do not hold the borrow while calling back into user lambdas that may
    /// write to the same map.
    pub fn entries(&self) -> Ref<'_, BTreeMap<String, Value>> {
        self.entries.borrow()
    }

    /// Returns true if both handles alias the same entries.
    pub fn ptr_eq(&self, other: &Map) -> bool {
        Rc::ptr_eq(&self.entries, &other.entries)
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.entries.borrow() == *other.entries.borrow()
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.borrow().iter()).finish()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map = Map::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

// =============================================================================
// Lambda
// =============================================================================

/// The arguments a lambda is invoked with.
#[derive(Debug, Clone, Copy, Default)]
pub struct Call<'a> {
    receiver: Option<&'a Value>,
    text: Option<&'a str>,
}

impl<'a> Call<'a> {
    /// The context frame the lambda was found in, if it was resolved from
    /// the context stack.
    pub fn receiver(&self) -> Option<&'a Value> {
        self.receiver
    }

    /// The raw, unrendered section body when invoked for a section.
    pub fn text(&self) -> Option<&'a str> {
        self.text
    }
}

type LambdaFn = dyn Fn(&Call<'_>) -> Value;
type SetterFn = dyn Fn(Value);

/// A callable context value.
#[derive(Clone)]
pub struct Lambda {
    func: Rc<LambdaFn>,
    setter: Option<Rc<SetterFn>>,
    receiver: Option<Box<Value>>,
}

impl Lambda {
    /// A lambda taking no arguments.
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn() -> R + 'static,
        R: Into<Value>,
    {
        Self::from_fn(move |_: &Call<'_>| f())
    }

    /// A lambda receiving the raw section body (empty outside sections).
    pub fn section<F, R>(f: F) -> Self
    where
        F: Fn(&str) -> R + 'static,
        R: Into<Value>,
    {
        Self::from_fn(move |call: &Call<'_>| f(call.text().unwrap_or_default()))
    }

    /// A lambda receiving the context frame it was found in.
    pub fn method<F, R>(f: F) -> Self
    where
        F: Fn(&Value) -> R + 'static,
        R: Into<Value>,
    {
        Self::from_fn(move |call: &Call<'_>| f(call.receiver().unwrap_or(&Value::Null)))
    }

    /// A lambda receiving the full [`Call`].
    pub fn from_fn<F, R>(f: F) -> Self
    where
        F: Fn(&Call<'_>) -> R + 'static,
        R: Into<Value>,
    {
        Self {
            func: Rc::new(move |call: &Call<'_>| f(call).into()),
            setter: None,
            receiver: None,
        }
    }

    /// Attaches a setter, used by inspection accessors instead of overwriting
    /// the lambda.
    pub fn with_setter<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) + 'static,
    {
        self.setter = Some(Rc::new(f));
        self
    }

    /// Returns true if a setter is attached.
    pub fn has_setter(&self) -> bool {
        self.setter.is_some()
    }

    /// Returns a copy bound to `receiver`.
    pub fn bind(&self, receiver: Value) -> Lambda {
        Lambda {
            func: Rc::clone(&self.func),
            setter: self.setter.clone(),
            receiver: Some(Box::new(receiver)),
        }
    }

    /// The bound receiver, if any.
    pub fn receiver(&self) -> Option<&Value> {
        self.receiver.as_deref()
    }

    /// Invokes with no section text.
    pub fn call(&self) -> Value {
        (self.func)(&Call {
            receiver: self.receiver(),
            text: None,
        })
    }

    /// Invokes with the raw section body.
    pub fn call_with_text(&self, text: &str) -> Value {
        (self.func)(&Call {
            receiver: self.receiver(),
            text: Some(text),
        })
    }

    /// Calls the setter. Returns false when there is none.
    pub fn assign(&self, value: Value) -> bool {
        match &self.setter {
            Some(setter) => {
                setter(value);
                true
            }
            None => false,
        }
    }

    /// Returns true if both lambdas wrap the same function.
    pub fn ptr_eq(&self, other: &Lambda) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl PartialEq for Lambda {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lambda")
            .field("bound", &self.receiver.is_some())
            .field("setter", &self.setter.is_some())
            .finish()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(entries.into_iter().collect()),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        Value::from(value.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32, u64, isize, usize);

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Number::from_f64(f).map_or(Value::Null, Value::Number)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::from(f as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(map)
    }
}

impl From<Lambda> for Value {
    fn from(lambda: Lambda) -> Self {
        Value::Lambda(lambda)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<V: Into<Value>> From<HashMap<String, V>> for Value {
    fn from(entries: HashMap<String, V>) -> Self {
        Value::Map(entries.into_iter().collect())
    }
}

impl<V: Into<Value>> From<BTreeMap<String, V>> for Value {
    fn from(entries: BTreeMap<String, V>) -> Self {
        Value::Map(entries.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().collect())
    }
}
