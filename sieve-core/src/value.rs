//! Dynamically shaped data validated by the engine.
//!
//! [`Value`] is a closed tagged union: every shape the engine can meet is a
//! variant, so validators match exhaustively instead of probing types at
//! runtime. Maps keep insertion order so error output and re-serialization
//! stay stable.

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Ordered string-keyed map used for object values.
pub type Map = IndexMap<String, Value>;

/// A node of the data tree being validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Canonical form produced by date coercion
    Date(DateTime<Utc>),
    Sequence(Vec<Value>),
    Map(Map),
    /// Host-provided handle the engine never looks into (uploaded files, ...)
    Opaque(Opaque),
}

/// Broad category of a value, used to pick type-dependent messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Null,
    Bool,
    Numeric,
    String,
    Date,
    Array,
    Object,
    File,
}

impl Category {
    /// Suffix used in message keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Null => "null",
            Category::Bool => "bool",
            Category::Numeric => "numeric",
            Category::String => "string",
            Category::Date => "date",
            Category::Array => "array",
            Category::Object => "object",
            Category::File => "file",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::Sequence(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Integers and floats.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of integers and floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_sequence_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&Opaque> {
        match self {
            Value::Opaque(o) => Some(o),
            _ => None,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Value::Null => Category::Null,
            Value::Bool(_) => Category::Bool,
            Value::Int(_) | Value::Float(_) => Category::Numeric,
            Value::String(_) => Category::String,
            Value::Date(_) => Category::Date,
            Value::Sequence(_) => Category::Array,
            Value::Map(_) => Category::Object,
            Value::Opaque(_) => Category::File,
        }
    }

    /// Child addressed by one path segment.
    pub fn child(&self, segment: &Segment) -> Option<&Value> {
        match (self, segment) {
            (Value::Map(map), Segment::Key(key)) => map.get(key),
            (Value::Sequence(items), Segment::Index(i)) => {
                usize::try_from(*i).ok().and_then(|i| items.get(i))
            }
            _ => None,
        }
    }

    pub fn child_mut(&mut self, segment: &Segment) -> Option<&mut Value> {
        match (self, segment) {
            (Value::Map(map), Segment::Key(key)) => map.get_mut(key),
            (Value::Sequence(items), Segment::Index(i)) => {
                usize::try_from(*i).ok().and_then(move |i| items.get_mut(i))
            }
            _ => None,
        }
    }

    /// Follow a resolved path from this node.
    pub fn pointer(&self, path: &[Segment]) -> Option<&Value> {
        path.iter().try_fold(self, |node, segment| node.child(segment))
    }

    pub fn pointer_mut(&mut self, path: &[Segment]) -> Option<&mut Value> {
        path.iter()
            .try_fold(self, |node, segment| node.child_mut(segment))
    }

    /// Replace the value at `path`, inserting a new key when the parent is a
    /// map. Returns false when the parent does not exist or the index is out
    /// of bounds.
    pub fn set_pointer(&mut self, path: &[Segment], value: Value) -> bool {
        let Some((last, parent_path)) = path.split_last() else {
            *self = value;
            return true;
        };
        match (self.pointer_mut(parent_path), last) {
            (Some(Value::Map(map)), Segment::Key(key)) => {
                map.insert(key.clone(), value);
                true
            }
            (Some(Value::Sequence(items)), Segment::Index(i)) => {
                match usize::try_from(*i).ok().and_then(|i| items.get_mut(i)) {
                    Some(slot) => {
                        *slot = value;
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        }
    }

    /// Move the value at `path` out, leaving `Null` in its place.
    pub fn take_pointer(&mut self, path: &[Segment]) -> Option<Value> {
        self.pointer_mut(path).map(std::mem::take)
    }

    /// Remove a key from its parent map. Sequences are never shortened.
    pub fn remove_pointer(&mut self, path: &[Segment]) -> Option<Value> {
        let (last, parent_path) = path.split_last()?;
        match (self.pointer_mut(parent_path), last) {
            (Some(Value::Map(map)), Segment::Key(key)) => map.shift_remove(key),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => f.write_str(s),
            Value::Date(d) => f.write_str(&d.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Opaque(o) => write!(f, "<{}>", o.kind()),
            other => match serde_json::to_string(other) {
                Ok(json) => f.write_str(&json),
                Err(_) => Err(fmt::Error),
            },
        }
    }
}

/// Type-erased host value carried through validation untouched.
#[derive(Clone)]
pub struct Opaque {
    kind: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    pub fn new<T: Send + Sync + 'static>(kind: &'static str, value: T) -> Self {
        Self {
            kind,
            inner: Arc::new(value),
        }
    }

    /// Label such as `"file"`.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn downcast_ref<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opaque").field("kind", &self.kind).finish()
    }
}

/// One step of a resolved path: a map key or a sequence index.
///
/// Index `-1` stands for an element that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Key(String),
    Index(i64),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index as i64)
    }
}

/// Concrete location of one path match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResolvedPath(Vec<Segment>);

impl ResolvedPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, segment: Segment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) -> Option<Segment> {
        self.0.pop()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn last(&self) -> Option<&Segment> {
        self.0.last()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of the containing node; the root is its own parent.
    pub fn parent(&self) -> &[Segment] {
        match self.0.split_last() {
            Some((_, parent)) => parent,
            None => &self.0,
        }
    }

    /// Copy of this path extended by one segment.
    pub fn join(&self, segment: Segment) -> Self {
        let mut joined = self.clone();
        joined.push(segment);
        joined
    }

    /// Last map key on the path, used as the `:field` placeholder.
    pub fn field_name(&self) -> Option<&str> {
        self.0.iter().rev().find_map(|s| match s {
            Segment::Key(key) => Some(key.as_str()),
            Segment::Index(_) => None,
        })
    }
}

impl From<Vec<Segment>> for ResolvedPath {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

impl std::ops::Deref for ResolvedPath {
    type Target = [Segment];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) if i > 0 => write!(f, ".{}", key)?,
                other => write!(f, "{}", other)?,
            }
        }
        Ok(())
    }
}

// ============================================================================
// serde / serde_json interop
// ============================================================================

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null | Value::Opaque(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::from(i),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Date(d) => {
                serde_json::Value::String(d.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::Sequence(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Map(map) => {
                serde_json::Value::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null | Value::Opaque(_) => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Date(d) => {
                serializer.serialize_str(&d.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => Int,
    f64 => Float,
    String => String,
    &str => String,
    DateTime<Utc> => Date,
    Vec<Value> => Sequence,
    Map => Map,
}
