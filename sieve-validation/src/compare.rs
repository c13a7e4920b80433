//! Rules comparing the value with another field.
//!
//! The other path is relative to the rule set the field is declared in, so
//! `"start"` inside a rule set composed under `"booking"` reads
//! `booking.start`. When the other path matches several values (it goes
//! through arrays), the comparison must hold against every one of them.

use crate::types::as_date;
use chrono::{DateTime, Utc};
use sieve_core::{Context, Flow, Found, Validator, Value};

/// Compare the value with every present value at `other`.
///
/// Stops walking at the first mismatch. Absent values are ignored.
fn holds_for_all<F>(ctx: &Context<'_>, other: &str, mut accept: F) -> bool
where
    F: FnMut(&Value) -> bool,
{
    let mut holds = true;
    ctx.walk_related(other, |matched| {
        let Some(value) = matched.value.filter(|_| matched.found == Found::Found) else {
            return Flow::Continue;
        };
        if accept(value) {
            Flow::Continue
        } else {
            holds = false;
            Flow::Break
        }
    });
    holds
}

fn compare_dates<F>(ctx: &Context<'_>, other: &str, ordering: F) -> bool
where
    F: Fn(&DateTime<Utc>, &DateTime<Utc>) -> bool,
{
    let Some(date) = as_date(&ctx.value) else {
        return false;
    };
    holds_for_all(ctx, other, |value| {
        as_date(value).is_some_and(|other| ordering(&date, &other))
    })
}

/// Date strictly after the date(s) at another path.
#[derive(Debug, Clone)]
pub struct After {
    other: String,
}

impl After {
    pub fn new(other: impl Into<String>) -> Self {
        Self {
            other: other.into(),
        }
    }
}

impl Validator for After {
    fn validate(&self, ctx: &mut Context<'_>) -> bool {
        compare_dates(ctx, &self.other, |value, other| value > other)
    }

    fn name(&self) -> &'static str {
        "after"
    }

    fn depends_on(&self) -> Option<&str> {
        Some(&self.other)
    }

    fn message_placeholders(&self, _ctx: &Context<'_>) -> Vec<(&'static str, String)> {
        vec![(":date", self.other.clone())]
    }
}

/// Date strictly before the date(s) at another path.
#[derive(Debug, Clone)]
pub struct Before {
    other: String,
}

impl Before {
    pub fn new(other: impl Into<String>) -> Self {
        Self {
            other: other.into(),
        }
    }
}

impl Validator for Before {
    fn validate(&self, ctx: &mut Context<'_>) -> bool {
        compare_dates(ctx, &self.other, |value, other| value < other)
    }

    fn name(&self) -> &'static str {
        "before"
    }

    fn depends_on(&self) -> Option<&str> {
        Some(&self.other)
    }

    fn message_placeholders(&self, _ctx: &Context<'_>) -> Vec<(&'static str, String)> {
        vec![(":date", self.other.clone())]
    }
}

/// Date strictly in the future relative to the call's reference time.
#[derive(Debug, Clone, Copy, Default)]
pub struct AfterNow;

impl Validator for AfterNow {
    fn validate(&self, ctx: &mut Context<'_>) -> bool {
        as_date(&ctx.value).is_some_and(|date| date > ctx.now())
    }

    fn name(&self) -> &'static str {
        "after_now"
    }
}

/// Value equal to the value(s) at another path, e.g. a confirmation field.
#[derive(Debug, Clone)]
pub struct Same {
    other: String,
}

impl Same {
    pub fn new(other: impl Into<String>) -> Self {
        Self {
            other: other.into(),
        }
    }
}

impl Validator for Same {
    fn validate(&self, ctx: &mut Context<'_>) -> bool {
        let value = ctx.value.clone();
        holds_for_all(ctx, &self.other, |other| *other == value)
    }

    fn name(&self) -> &'static str {
        "same"
    }

    fn depends_on(&self) -> Option<&str> {
        Some(&self.other)
    }

    fn message_placeholders(&self, _ctx: &Context<'_>) -> Vec<(&'static str, String)> {
        vec![(":other", self.other.clone())]
    }
}
