//! Structural validators the compiler and executor rely on.

use crate::validator::{Context, Validator};
use std::fmt;
use std::sync::Arc;

/// The field must be present.
#[derive(Debug, Clone, Copy, Default)]
pub struct Required;

impl Validator for Required {
    fn validate(&self, _ctx: &mut Context<'_>) -> bool {
        // Absence is handled before validators run
        true
    }

    fn name(&self) -> &'static str {
        "required"
    }

    fn requires(&self, _ctx: &Context<'_>) -> bool {
        true
    }
}

type Condition = Arc<dyn Fn(&Context<'_>) -> bool + Send + Sync>;

/// The field must be present when a condition holds for the occurrence.
#[derive(Clone)]
pub struct RequiredIf {
    condition: Condition,
}

impl RequiredIf {
    pub fn new<F>(condition: F) -> Self
    where
        F: Fn(&Context<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            condition: Arc::new(condition),
        }
    }

    /// Required when the named extra is set to `true`.
    pub fn flag(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(move |ctx| ctx.extra().flag(&key))
    }
}

impl fmt::Debug for RequiredIf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequiredIf").finish_non_exhaustive()
    }
}

impl Validator for RequiredIf {
    fn validate(&self, _ctx: &mut Context<'_>) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "required"
    }

    fn requires(&self, ctx: &Context<'_>) -> bool {
        (self.condition)(ctx)
    }
}

/// An explicit null is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nullable;

impl Validator for Nullable {
    fn validate(&self, _ctx: &mut Context<'_>) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "nullable"
    }

    fn is_nullable(&self) -> bool {
        true
    }
}

/// The value must be an array. Injected for undeclared array ancestors.
#[derive(Debug, Clone, Copy, Default)]
pub struct Array;

impl Validator for Array {
    fn validate(&self, ctx: &mut Context<'_>) -> bool {
        ctx.value.is_sequence()
    }

    fn name(&self) -> &'static str {
        "array"
    }

    fn is_array(&self) -> bool {
        true
    }
}

/// The value must be an object.
#[derive(Debug, Clone, Copy, Default)]
pub struct Object;

impl Validator for Object {
    fn validate(&self, ctx: &mut Context<'_>) -> bool {
        ctx.value.is_map()
    }

    fn name(&self) -> &'static str {
        "object"
    }

    fn is_object(&self) -> bool {
        true
    }
}
