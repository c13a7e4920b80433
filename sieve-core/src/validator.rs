// Validator capability and per-occurrence context

use crate::error::BoxError;
use crate::extra::Extras;
use crate::path::{self, PathStep};
use crate::rules::Field;
use crate::value::{ResolvedPath, Value};
use crate::walk::{self, Flow, WalkContext};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared handle to a validator.
pub type ValidatorRef = Arc<dyn Validator>;

/// A single validation rule.
///
/// Validators are built once, shared by every field and every concurrent
/// call that uses them, and must not keep per-call state.
pub trait Validator: Send + Sync {
    /// Check `ctx.value`. Converting validators may replace `ctx.value`.
    fn validate(&self, ctx: &mut Context<'_>) -> bool;

    /// Rule name, used to build message keys
    fn name(&self) -> &'static str;

    /// Whether a successful run may rewrite the value to a canonical type.
    fn is_type_converting(&self) -> bool {
        false
    }

    /// Whether the failure message depends on the value's category.
    fn is_type_dependent(&self) -> bool {
        false
    }

    /// Path of another field this validator reads, relative to the rule set
    /// it was declared in.
    fn depends_on(&self) -> Option<&str> {
        None
    }

    /// Whether the field must be present for this occurrence.
    fn requires(&self, _ctx: &Context<'_>) -> bool {
        false
    }

    /// Whether an explicit null is an accepted value.
    fn is_nullable(&self) -> bool {
        false
    }

    /// Whether this validator asserts the value is an array.
    fn is_array(&self) -> bool {
        false
    }

    /// Whether this validator asserts the value is an object.
    fn is_object(&self) -> bool {
        false
    }

    /// Extra placeholders for the failure message, besides `:field`.
    fn message_placeholders(&self, _ctx: &Context<'_>) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

impl std::fmt::Debug for dyn Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a validator may look at while checking one occurrence.
pub struct Context<'a> {
    /// Value under validation, replaced in place by converting validators
    pub value: Value,
    data: &'a Value,
    path: &'a ResolvedPath,
    field: &'a Field,
    now: DateTime<Utc>,
    extra: &'a Extras,
    deadline: Option<Instant>,
    lookup_timeout: Duration,
    invalid: bool,
    errors: Vec<BoxError>,
    element_errors: Vec<usize>,
}

/// Call-scoped inputs shared by every context of one validation call.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    pub data: &'a Value,
    pub now: DateTime<Utc>,
    pub extra: &'a Extras,
    pub deadline: Option<Instant>,
    pub lookup_timeout: Duration,
}

impl<'a> Context<'a> {
    /// Build a context for one occurrence of `field` at `path`.
    ///
    /// The executor creates contexts; this is public so validators can be
    /// exercised on their own.
    pub fn new(scope: Scope<'a>, field: &'a Field, path: &'a ResolvedPath, value: Value) -> Self {
        Self {
            value,
            data: scope.data,
            path,
            field,
            now: scope.now,
            extra: scope.extra,
            deadline: scope.deadline,
            lookup_timeout: scope.lookup_timeout,
            invalid: false,
            errors: Vec::new(),
            element_errors: Vec::new(),
        }
    }

    pub(crate) fn set_invalid(&mut self, invalid: bool) {
        self.invalid = invalid;
    }

    pub(crate) fn take_errors(&mut self) -> Vec<BoxError> {
        std::mem::take(&mut self.errors)
    }

    pub(crate) fn take_element_errors(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.element_errors)
    }

    /// The whole data tree. The value under validation is taken out of it
    /// while validators run and reads as null.
    pub fn data(&self) -> &'a Value {
        self.data
    }

    /// Container holding the value under validation, if any.
    pub fn parent(&self) -> Option<&'a Value> {
        if self.path.is_root() {
            return None;
        }
        self.data.pointer(self.path.parent())
    }

    /// Resolved location of this occurrence.
    pub fn path(&self) -> &'a ResolvedPath {
        self.path
    }

    /// Name used for the `:field` placeholder.
    pub fn field_name(&self) -> &'a str {
        self.path.field_name().unwrap_or_default()
    }

    pub fn field(&self) -> &'a Field {
        self.field
    }

    /// Reference time of the call, fixed for its whole duration.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn extra(&self) -> &'a Extras {
        self.extra
    }

    /// Whether an earlier validator already failed on this occurrence.
    ///
    /// Expensive validators can skip their work when this is true.
    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    /// Report a collaborator failure. The occurrence is counted as invalid
    /// and the error is returned to the caller next to the error tree.
    pub fn add_error(&mut self, err: impl Into<BoxError>) {
        self.errors.push(err.into());
    }

    /// Report a failure on one element of an array value rather than on
    /// the array itself.
    pub fn add_element_error(&mut self, index: usize) {
        self.element_errors.push(index);
    }

    /// Time a blocking collaborator may spend: the remaining part of the
    /// call deadline, capped by the configured lookup timeout.
    pub fn remaining_time(&self) -> Duration {
        match self.deadline {
            Some(deadline) => deadline
                .saturating_duration_since(Instant::now())
                .min(self.lookup_timeout),
            None => self.lookup_timeout,
        }
    }

    /// Whether the call deadline has already passed.
    pub fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Absolute form of a path relative to the rule set this field was
    /// declared in.
    pub fn resolve_path(&self, relative: &str) -> String {
        path::join(&self.field.prefix(), relative)
    }

    /// Walk another field's path over the data.
    pub fn walk_related<F>(&self, relative: &str, visit: F)
    where
        F: FnMut(WalkContext<'a>) -> Flow,
    {
        let data = self.data;
        match self.field.dependency(relative) {
            Some(absolute) => walk::walk(absolute, data, visit),
            None => {
                if let Ok(absolute) = PathStep::parse(&self.resolve_path(relative)) {
                    walk::walk(&absolute, data, visit);
                }
            }
        }
    }
}

/// Turns message keys into text.
pub trait Translator: Send + Sync {
    fn translate(&self, key: &str, placeholders: &[(&'static str, String)]) -> String;
}

/// Translator returning message keys unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageKeys;

impl Translator for MessageKeys {
    fn translate(&self, key: &str, _placeholders: &[(&'static str, String)]) -> String {
        key.to_string()
    }
}

/// Translator backed by a key → template table. Placeholders such as
/// `:field` are substituted; unknown keys fall back to the key itself.
#[derive(Debug, Clone, Default)]
pub struct MessageTable {
    templates: std::collections::HashMap<String, String>,
}

impl MessageTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.insert(key.into(), template.into());
        self
    }
}

impl Translator for MessageTable {
    fn translate(&self, key: &str, placeholders: &[(&'static str, String)]) -> String {
        let Some(template) = self.templates.get(key) else {
            return key.to_string();
        };
        // Longest names first so `:min` does not clobber `:minimum`
        let mut sorted: Vec<_> = placeholders.iter().collect();
        sorted.sort_by_key(|(name, _)| std::cmp::Reverse(name.len()));

        // One pass over the template; substituted text is never rescanned
        let mut out = String::with_capacity(template.len());
        let mut rest = template.as_str();
        while let Some(at) = rest.find(':') {
            out.push_str(&rest[..at]);
            rest = &rest[at..];
            match sorted.iter().find(|(name, _)| rest.starts_with(*name)) {
                Some((name, value)) => {
                    out.push_str(value);
                    rest = &rest[name.len()..];
                }
                None => {
                    out.push(':');
                    rest = &rest[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Message key for a failed validator:
/// `validation.rules.<name>[.<category>][.element]`.
pub fn message_key(validator: &dyn Validator, ctx: &Context<'_>) -> String {
    let mut key = format!("validation.rules.{}", validator.name());
    if validator.is_type_dependent() {
        key.push('.');
        key.push_str(ctx.value.category().as_str());
    }
    if matches!(ctx.path().last(), Some(crate::value::Segment::Index(_))) {
        key.push_str(".element");
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_table_substitutes_placeholders() {
        let table = MessageTable::new().with(
            "validation.rules.min.string",
            "The :field must be at least :min characters.",
        );
        let text = table.translate(
            "validation.rules.min.string",
            &[(":field", "name".to_string()), (":min", "3".to_string())],
        );
        assert_eq!(text, "The name must be at least 3 characters.");
        assert_eq!(table.translate("missing.key", &[]), "missing.key");
    }

    #[test]
    fn test_message_table_does_not_rescan_values() {
        let table = MessageTable::new().with(
            "validation.rules.between.string",
            "The :field must be between :min and :max: got :value.",
        );
        let text = table.translate(
            "validation.rules.between.string",
            &[
                (":field", "note :min".to_string()),
                (":min", "1".to_string()),
                (":max", "5".to_string()),
            ],
        );
        assert_eq!(text, "The note :min must be between 1 and 5: got :value.");
    }

    #[test]
    fn test_message_keys_passthrough() {
        assert_eq!(
            MessageKeys.translate("validation.rules.required", &[]),
            "validation.rules.required"
        );
    }
}
