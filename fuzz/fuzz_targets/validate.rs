//! Fuzz target for the executor.
//!
//! Arbitrary JSON data against a fixed rule set: validation must never
//! panic and must leave the data tree well formed.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sieve_core::{Array, Nullable, Object, Options, Required, RuleSet, Value, rules, validate};

/// Arbitrary request body for fuzzing.
#[derive(Debug, Arbitrary)]
struct FuzzBody {
    /// Raw JSON text
    raw: String,
    /// Treat as a form-encoded body
    form_encoded: bool,
}

fuzz_target!(|body: FuzzBody| {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(&body.raw) else {
        return;
    };

    let Ok(compiled) = RuleSet::new()
        .field("id", rules![Required])
        .field("tags[]", rules![Required])
        .field("matrix[][]", rules![Nullable])
        .field("owner", rules![Nullable, Object])
        .field("owner.groups", rules![Array])
        .field("owner.groups[].name", rules![Required])
        .compile()
    else {
        return;
    };

    let mut data = Value::from(json);
    let outcome = validate(Options::new(&mut data, &compiled).form_encoded(body.form_encoded));

    if let Some(errors) = &outcome.errors {
        let _ = errors.to_json();
        let _ = errors.to_string();
    }
    let _ = serde_json::Value::from(data);
});
