//! Executor: applies compiled fields to live data.
//!
//! Each field's path is walked over the data. Every match is checked for
//! absence, coerced when the source is form-encoded, has its element field
//! run first, then goes through the field's validators. Converted values
//! are written back in place and failures land in an [`ErrorTree`] shaped
//! like the data.

use crate::config::EngineConfig;
use crate::error::{CollaboratorError, ExecuteError};
use crate::error_tree::ErrorTree;
use crate::extra::Extras;
use crate::path::PathStep;
use crate::rules::{CompiledRules, Field};
use crate::validator::{Context, MessageKeys, Scope, Translator, Validator, message_key};
use crate::value::{ResolvedPath, Segment, Value};
use crate::walk::{self, Found};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Message recorded at the root when the data is null.
pub const MALFORMED_INPUT: &str = "malformed input";

static NO_EXTRAS: Lazy<Extras> = Lazy::new(Extras::new);
static ELEMENTS: Lazy<PathStep> = Lazy::new(PathStep::elements);

/// Inputs of one validation call.
pub struct Options<'a> {
    data: &'a mut Value,
    rules: &'a CompiledRules,
    form_encoded: bool,
    now: DateTime<Utc>,
    extras: &'a Extras,
    deadline: Option<Instant>,
    lookup_timeout: Duration,
    translator: &'a dyn Translator,
    log_collaborator_errors: bool,
    trace_fields: bool,
}

impl<'a> Options<'a> {
    pub fn new(data: &'a mut Value, rules: &'a CompiledRules) -> Self {
        let defaults = EngineConfig::default();
        Self {
            data,
            rules,
            form_encoded: false,
            now: Utc::now(),
            extras: &NO_EXTRAS,
            deadline: None,
            lookup_timeout: defaults.lookup_timeout(),
            translator: &MessageKeys,
            log_collaborator_errors: defaults.log_collaborator_errors,
            trace_fields: defaults.trace_fields,
        }
    }

    /// Data came from a form-encoded body: lone scalars of root array
    /// fields are wrapped into one-element arrays.
    pub fn form_encoded(mut self, form_encoded: bool) -> Self {
        self.form_encoded = form_encoded;
        self
    }

    /// Reference time seen by every validator of the call.
    pub fn now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn extras(mut self, extras: &'a Extras) -> Self {
        self.extras = extras;
        self
    }

    /// Point in time blocking validators must finish by.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline relative to now. A timeout too large to represent means
    /// no deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    pub fn translator(mut self, translator: &'a dyn Translator) -> Self {
        self.translator = translator;
        self
    }

    /// Apply timeouts and logging switches from an engine configuration.
    pub fn config(mut self, config: &EngineConfig) -> Self {
        self.lookup_timeout = config.lookup_timeout();
        self.log_collaborator_errors = config.log_collaborator_errors;
        self.trace_fields = config.trace_fields;
        self
    }
}

/// Result of one validation call.
#[derive(Debug, Default)]
pub struct Outcome {
    /// `None` when no validator failed anywhere
    pub errors: Option<ErrorTree>,
    /// Failures of collaborators, each also counted as a validation failure
    pub collaborator_errors: Vec<CollaboratorError>,
}

impl Outcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_none() && self.collaborator_errors.is_empty()
    }
}

/// Validate and coerce `options.data` in place.
///
/// ```
/// use sieve_core::{rules, validate, Options, Required, RuleSet, Value};
///
/// let rules = RuleSet::new().field("name", rules![Required]).compile().unwrap();
/// let mut data = Value::from(serde_json::json!({}));
///
/// let outcome = validate(Options::new(&mut data, &rules));
/// let errors = outcome.errors.unwrap();
/// assert_eq!(
///     errors.field("name").unwrap().errors,
///     vec!["validation.rules.required".to_string()]
/// );
/// ```
pub fn validate(options: Options<'_>) -> Outcome {
    let Options {
        data,
        rules,
        form_encoded,
        now,
        extras,
        deadline,
        lookup_timeout,
        translator,
        log_collaborator_errors,
        trace_fields,
    } = options;

    let mut run = Run {
        tree: ErrorTree::new(),
        collaborator_errors: Vec::new(),
        form_encoded,
        now,
        extras,
        deadline,
        lookup_timeout,
        translator,
        log_collaborator_errors,
        trace_fields,
    };

    if data.is_null() {
        debug!("rejecting null input");
        run.tree.add(&[], MALFORMED_INPUT);
    } else {
        let root = ResolvedPath::root();
        for field in rules.fields() {
            run.field(field, field.path(), data, &root);
        }
    }

    let outcome = Outcome {
        errors: run.tree.into_option(),
        collaborator_errors: run.collaborator_errors,
    };
    debug!(
        fields = rules.len(),
        messages = outcome.errors.as_ref().map_or(0, ErrorTree::message_count),
        collaborator_errors = outcome.collaborator_errors.len(),
        "validation finished"
    );
    outcome
}

/// State of one call.
struct Run<'a> {
    tree: ErrorTree,
    collaborator_errors: Vec<CollaboratorError>,
    form_encoded: bool,
    now: DateTime<Utc>,
    extras: &'a Extras,
    deadline: Option<Instant>,
    lookup_timeout: Duration,
    translator: &'a dyn Translator,
    log_collaborator_errors: bool,
    trace_fields: bool,
}

impl<'a> Run<'a> {
    fn scope<'d>(&self, data: &'d Value) -> Scope<'d>
    where
        'a: 'd,
    {
        Scope {
            data,
            now: self.now,
            extra: self.extras,
            deadline: self.deadline,
            lookup_timeout: self.lookup_timeout,
        }
    }

    /// Run `field` over every match of `path` below `base`.
    fn field(&mut self, field: &Field, path: &PathStep, data: &mut Value, base: &ResolvedPath) {
        let matches = walk::matches(path, data, base);
        if self.trace_fields {
            trace!(path = %field.path_str(), matches = matches.len(), "validating field");
        }
        for (resolved, found) in matches {
            self.occurrence(field, data, resolved, found);
        }
    }

    fn occurrence(&mut self, field: &Field, data: &mut Value, resolved: ResolvedPath, found: Found) {
        let explicit_null = found == Found::Found && data.pointer(&resolved).is_some_and(Value::is_null);

        if explicit_null && field.is_nullable() {
            return;
        }

        let mut found = found;
        if explicit_null && matches!(data.pointer(resolved.parent()), Some(Value::Map(_))) {
            data.remove_pointer(&resolved);
            found = Found::ElementNotFound;
        }

        if found != Found::Found || explicit_null {
            self.absent(field, data, &resolved);
            return;
        }

        if self.form_encoded && field.is_array() && field.path().depth() == 1 && resolved.len() == 1 {
            if let Some(value) = data.pointer_mut(&resolved) {
                if !matches!(value, Value::Sequence(_) | Value::Map(_)) {
                    let scalar = std::mem::take(value);
                    *value = Value::Sequence(vec![scalar]);
                }
            }
        }

        if let Some(elements) = field.elements() {
            if data.pointer(&resolved).is_some_and(Value::is_sequence) {
                self.field(elements, &ELEMENTS, data, &resolved);
            }
        }

        let value = data.take_pointer(&resolved).unwrap_or_default();
        let value = self.run_validators(field, data, &resolved, value);
        data.set_pointer(&resolved, value);
    }

    /// Missing or null value: report it if the field is required here.
    fn absent(&mut self, field: &Field, data: &Value, resolved: &ResolvedPath) {
        let ctx = Context::new(self.scope(data), field, resolved, Value::Null);
        let Some(validator) = field.requiring_validator(&ctx) else {
            return;
        };
        let message = self.message(validator.as_ref(), &ctx);
        self.tree.add(resolved, message);
    }

    fn run_validators(
        &mut self,
        field: &Field,
        data: &Value,
        resolved: &ResolvedPath,
        value: Value,
    ) -> Value {
        let mut ctx = Context::new(self.scope(data), field, resolved, value);
        let mut invalid = false;

        for validator in field.validators() {
            ctx.set_invalid(invalid);
            let converting = validator.is_type_converting();
            let original = (!converting).then(|| ctx.value.clone());

            let valid = validator.validate(&mut ctx);
            let errors = ctx.take_errors();
            let element_errors = ctx.take_element_errors();

            let failed = !valid || !errors.is_empty();
            for source in errors {
                self.collaborator_error(validator.as_ref(), resolved, source);
            }
            if failed {
                invalid = true;
                let message = self.message(validator.as_ref(), &ctx);
                if element_errors.is_empty() {
                    self.tree.add(resolved, message);
                } else {
                    for index in element_errors {
                        let path = resolved.join(Segment::Index(index as i64));
                        self.tree.add(&path, message.clone());
                    }
                }
            }

            if let Some(original) = original {
                ctx.value = original;
            }
        }

        ctx.value
    }

    fn collaborator_error(
        &mut self,
        validator: &dyn Validator,
        resolved: &ResolvedPath,
        source: crate::error::BoxError,
    ) {
        let err = CollaboratorError {
            validator: validator.name().to_string(),
            path: resolved.to_string(),
            source,
        };
        if self.log_collaborator_errors {
            warn!(
                validator = %err.validator,
                path = %err.path,
                error = %err.source,
                "collaborator failed, counting value as invalid"
            );
        }
        self.collaborator_errors.push(err);
    }

    fn message(&self, validator: &dyn Validator, ctx: &Context<'_>) -> String {
        let key = message_key(validator, ctx);
        let mut placeholders = vec![(":field", ctx.field_name().to_string())];
        placeholders.extend(validator.message_placeholders(ctx));
        self.translator.translate(&key, &placeholders)
    }
}

/// Owned inputs of [`validate_async`].
#[derive(Clone)]
pub struct AsyncOptions {
    pub form_encoded: bool,
    pub now: Option<DateTime<Utc>>,
    pub extras: Extras,
    pub translator: Arc<dyn Translator>,
    pub config: EngineConfig,
}

impl Default for AsyncOptions {
    fn default() -> Self {
        Self {
            form_encoded: false,
            now: None,
            extras: Extras::new(),
            translator: Arc::new(MessageKeys),
            config: EngineConfig::default(),
        }
    }
}

impl AsyncOptions {
    pub fn from_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }
}

/// Run a validation call on the tokio blocking pool, bounded by the
/// configured execute timeout.
///
/// Returns the coerced data with the outcome. On timeout the blocking task
/// is left to finish in the background and its result is dropped.
pub async fn validate_async(
    data: Value,
    rules: Arc<CompiledRules>,
    options: AsyncOptions,
) -> Result<(Value, Outcome), ExecuteError> {
    let timeout = options.config.execute_timeout();
    let deadline = Instant::now().checked_add(timeout);

    let task = tokio::task::spawn_blocking(move || {
        let mut data = data;
        let AsyncOptions {
            form_encoded,
            now,
            extras,
            translator,
            config,
        } = options;
        let mut call = Options::new(&mut data, &rules)
            .form_encoded(form_encoded)
            .now(now.unwrap_or_else(Utc::now))
            .extras(&extras)
            .translator(translator.as_ref())
            .config(&config);
        call.deadline = deadline;
        let outcome = validate(call);
        (data, outcome)
    });

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(join)) => Err(ExecuteError::Join(join.to_string())),
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "validation timed out");
            Err(ExecuteError::Timeout(timeout))
        }
    }
}
