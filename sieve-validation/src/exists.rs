//! Rules backed by a [`Lookup`] collaborator.
//!
//! The lookup is taken from the call's extras as a [`Lookups`] handle.
//! Lookups get the time left before the call deadline and fail closed:
//! a timeout, a backend error or a missing handle count as a failure and
//! are surfaced as collaborator errors.

use sieve_core::{Context, Lookup, LookupError, Validator};
use std::sync::Arc;
use tracing::trace;

/// Lookup handle stored in the call extras.
#[derive(Clone)]
pub struct Lookups(pub Arc<dyn Lookup>);

impl Lookups {
    pub fn new<L: Lookup + 'static>(lookup: L) -> Self {
        Self(Arc::new(lookup))
    }
}

impl std::fmt::Debug for Lookups {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Lookups")
    }
}

/// Ask the lookup whether the value exists in `scope`.
///
/// `None` means the lookup could not answer; the cause was recorded.
fn lookup(ctx: &mut Context<'_>, scope: &str) -> Option<bool> {
    let Some(Lookups(lookup)) = ctx.extra().get::<Lookups>().cloned() else {
        ctx.add_error(LookupError::Unavailable("no lookup in extras".into()));
        return None;
    };
    if ctx.deadline_passed() {
        ctx.add_error(LookupError::Timeout(ctx.remaining_time()));
        return None;
    }

    let timeout = ctx.remaining_time();
    trace!(scope = scope, timeout_ms = timeout.as_millis() as u64, "running lookup");
    match lookup.exists(scope, &ctx.value, timeout) {
        Ok(found) => Some(found),
        Err(err) => {
            ctx.add_error(err);
            None
        }
    }
}

/// Value must exist in a lookup scope.
#[derive(Debug, Clone)]
pub struct Exists {
    scope: String,
}

impl Exists {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
        }
    }
}

impl Validator for Exists {
    fn validate(&self, ctx: &mut Context<'_>) -> bool {
        // Not worth a round trip once the value is known to be bad
        if ctx.is_invalid() {
            return true;
        }
        lookup(ctx, &self.scope).unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "exists"
    }
}

/// Value must not exist yet in a lookup scope.
#[derive(Debug, Clone)]
pub struct Unique {
    scope: String,
}

impl Unique {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
        }
    }
}

impl Validator for Unique {
    fn validate(&self, ctx: &mut Context<'_>) -> bool {
        if ctx.is_invalid() {
            return true;
        }
        lookup(ctx, &self.scope).is_some_and(|found| !found)
    }

    fn name(&self) -> &'static str {
        "unique"
    }
}
