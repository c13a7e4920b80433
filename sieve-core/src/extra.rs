//! Call-scoped collaborators and flags handed to validators.
//!
//! Validators receive the extras of the call through their context. Typed
//! slots carry collaborators such as a lookup backend or the current user;
//! named slots carry plain values that conditional rules can test.
//!
//! ```
//! use sieve_core::{Extras, Value};
//!
//! struct Tenant(&'static str);
//!
//! let extras = Extras::new()
//!     .with(Tenant("acme"))
//!     .with_named("is_admin", true);
//!
//! assert_eq!(extras.get::<Tenant>().map(|t| t.0), Some("acme"));
//! assert_eq!(extras.named("is_admin"), Some(&Value::Bool(true)));
//! ```

use crate::value::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Extras container, cheap to clone.
#[derive(Clone, Default)]
pub struct Extras {
    typed: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    named: HashMap<String, Value>,
}

impl Extras {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Extras::insert`].
    pub fn with<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    /// Builder form of [`Extras::insert_named`].
    pub fn with_named(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert_named(key, value);
        self
    }

    /// Store a typed value, replacing any previous value of that type.
    #[inline]
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
        self.typed.insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Store an already shared value.
    #[inline]
    pub fn insert_arc<T: Send + Sync + 'static>(&mut self, value: Arc<T>) {
        self.typed.insert(TypeId::of::<T>(), value);
    }

    #[inline]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.typed
            .get(&TypeId::of::<T>())
            .and_then(|arc| arc.downcast_ref::<T>())
    }

    /// Shared handle to a typed value, for collaborators that outlive the
    /// borrow of the context (blocking tasks).
    #[inline]
    pub fn get_arc<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.typed
            .get(&TypeId::of::<T>())
            .and_then(|arc| arc.clone().downcast::<T>().ok())
    }

    #[inline]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.typed.contains_key(&TypeId::of::<T>())
    }

    /// Remove a typed value. Returns true if it existed.
    #[inline]
    pub fn remove<T: Send + Sync + 'static>(&mut self) -> bool {
        self.typed.remove(&TypeId::of::<T>()).is_some()
    }

    pub fn insert_named(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.named.insert(key.into(), value.into());
    }

    pub fn named(&self, key: &str) -> Option<&Value> {
        self.named.get(key)
    }

    /// Whether a named flag is set to `true`.
    pub fn flag(&self, key: &str) -> bool {
        self.named(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.typed.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.typed.is_empty() && self.named.is_empty()
    }

    /// Merge another container into this one; `other` wins on conflicts.
    pub fn extend(&mut self, other: Extras) {
        self.typed.extend(other.typed);
        self.named.extend(other.named);
    }
}

impl std::fmt::Debug for Extras {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extras")
            .field("typed", &self.typed.len())
            .field("named", &self.named.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_slots() {
        let mut extras = Extras::new();
        extras.insert(42i32);
        extras.insert(100i32);
        extras.insert("hello".to_string());

        assert_eq!(extras.get::<i32>(), Some(&100));
        assert_eq!(extras.get::<String>().map(String::as_str), Some("hello"));
        assert_eq!(extras.get::<f64>(), None);

        assert!(extras.remove::<i32>());
        assert!(!extras.contains::<i32>());
    }

    #[test]
    fn test_arc_roundtrip() {
        let shared = Arc::new(7u8);
        let extras = Extras::new();
        let mut extras = extras;
        extras.insert_arc(shared.clone());
        let back = extras.get_arc::<u8>().unwrap();
        assert!(Arc::ptr_eq(&shared, &back));
    }

    #[test]
    fn test_named_flags() {
        let extras = Extras::new()
            .with_named("is_admin", true)
            .with_named("role", "editor");
        assert!(extras.flag("is_admin"));
        assert!(!extras.flag("role"));
        assert!(!extras.flag("missing"));
        assert_eq!(extras.len(), 2);
    }

    #[test]
    fn test_extend_overrides() {
        let mut a = Extras::new().with(1u32).with_named("x", 1);
        let b = Extras::new().with(2u32);
        a.extend(b);
        assert_eq!(a.get::<u32>(), Some(&2));
        assert_eq!(a.named("x"), Some(&Value::Int(1)));
    }
}
