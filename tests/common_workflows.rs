//! Integration tests for common sieve workflows.
//!
//! These tests go through the facade crate the way an application would:
//! rules declared as data, compiled once, run over request bodies.

use serde_json::json;
use sieve::validation::Lookups;
use sieve::*;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Fixtures
// =============================================================================

fn signup_rules() -> RuleSet {
    RuleSet::from_json(
        &json!({
            "email": ["required", "email", "unique:users"],
            "password": ["required", "string", "min:8"],
            "birthday": ["date", "before:signed_up_at"],
            "signed_up_at": ["required", "date"],
            "newsletter": ["bool"],
            "interests": ["array", "distinct", "max:3"],
            "interests[]": ["string", "in:rust,go,zig"],
            "address": {
                "": ["nullable", "object"],
                "street": ["required", "string"],
                "zip": ["required", "regex:^[0-9]{5}$"]
            }
        }),
        &registry(),
    )
    .expect("signup rules are valid")
}

static SIGNUP: LazyRules = LazyRules::new(signup_rules);

fn users() -> Extras {
    Extras::new().with(Lookups::new(MemoryLookup::new().with("users", "taken@example.com")))
}

// =============================================================================
// Synchronous workflows
// =============================================================================

#[test]
fn test_valid_signup_is_normalized() {
    let mut body = Value::from(json!({
        "email": "ada@example.com",
        "password": "correct horse",
        "birthday": "1990-05-17",
        "signed_up_at": "2024-01-01T09:30:00Z",
        "newsletter": "yes",
        "interests": ["rust", "zig"],
        "address": { "street": "1 Main St", "zip": "12345" }
    }));
    let extras = users();

    let outcome = validate(Options::new(&mut body, SIGNUP.get().unwrap()).extras(&extras));

    assert!(outcome.is_valid(), "{:?}", outcome.errors);
    assert_eq!(body.pointer(&["newsletter".into()]), Some(&Value::Bool(true)));
    assert!(matches!(body.pointer(&["birthday".into()]), Some(Value::Date(_))));
    assert_eq!(
        body.pointer(&["address".into(), "zip".into()]),
        Some(&Value::from("12345"))
    );
}

#[test]
fn test_invalid_signup_reports_every_field() {
    let mut body = Value::from(json!({
        "email": "taken@example.com",
        "password": "short",
        "birthday": "2030-01-01",
        "signed_up_at": "2024-01-01",
        "interests": ["rust", "cobol", "rust", "go"],
        "address": { "zip": "ABCDE" }
    }));
    let extras = users();

    let outcome = validate(Options::new(&mut body, SIGNUP.get().unwrap()).extras(&extras));
    let errors = outcome.errors.expect("signup is invalid");

    assert_eq!(
        errors.to_string(),
        [
            "address.street: validation.rules.required",
            "address.zip: validation.rules.regex",
            "birthday: validation.rules.before",
            "email: validation.rules.unique",
            "interests: validation.rules.max.array",
            "interests[1]: validation.rules.in.element",
            "interests[2]: validation.rules.distinct",
            "password: validation.rules.min.string",
        ]
        .map(|line| format!("{}\n", line))
        .concat()
    );
}

#[test]
fn test_null_parent_still_requires_children() {
    let mut body = Value::from(json!({
        "email": "ada@example.com",
        "password": "correct horse",
        "signed_up_at": "2024-01-01",
        "address": null
    }));
    let extras = users();

    let outcome = validate(Options::new(&mut body, SIGNUP.get().unwrap()).extras(&extras));
    let errors = outcome.errors.unwrap();

    // The null address itself is accepted
    let address = errors.field("address").unwrap();
    assert!(address.errors.is_empty());
    assert_eq!(
        address.field("street").unwrap().errors,
        vec!["validation.rules.required".to_string()]
    );
    assert!(address.field("zip").is_some());
}

#[test]
fn test_missing_body_is_malformed() {
    let mut body = Value::Null;
    let errors = validate(Options::new(&mut body, SIGNUP.get().unwrap()))
        .errors
        .unwrap();
    assert_eq!(errors.errors, vec![MALFORMED_INPUT.to_string()]);
}

#[test]
fn test_custom_messages() {
    let compiled = RuleSet::new()
        .field("age", rules![Required, validation::Integer, validation::Min(18.0)])
        .compile()
        .unwrap();
    let messages = MessageTable::new()
        .with("validation.rules.required", "The :field field is required.")
        .with("validation.rules.min.numeric", "The :field must be at least :min.");

    let mut young = Value::from(json!({ "age": "16" }));
    let outcome = validate(Options::new(&mut young, &compiled).translator(&messages));
    assert_eq!(
        outcome.errors.unwrap().to_string(),
        "age: The age must be at least 18.\n"
    );

    let mut empty = Value::from(json!({}));
    let outcome = validate(Options::new(&mut empty, &compiled).translator(&messages));
    assert_eq!(
        outcome.errors.unwrap().to_string(),
        "age: The age field is required.\n"
    );
}

#[test]
fn test_required_if_flag_from_extras() {
    let compiled = RuleSet::from_json(&json!({ "vat_id": ["required_if:business"] }), &registry())
        .unwrap()
        .compile()
        .unwrap();

    let mut body = Value::from(json!({}));
    assert!(validate(Options::new(&mut body, &compiled)).is_valid());

    let business = Extras::new().with_named("business", true);
    assert!(!validate(Options::new(&mut body, &compiled).extras(&business)).is_valid());
}

#[test]
fn test_unknown_rule_is_a_config_error() {
    let err = RuleSet::from_json(&json!({ "name": ["required", "shiny"] }), &registry()).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownValidator(ref name) if name == "shiny"));
}

// =============================================================================
// Async workflows
// =============================================================================

struct SlowUsers;

#[async_trait::async_trait]
impl AsyncLookup for SlowUsers {
    async fn exists(&self, _scope: &str, _value: &Value) -> Result<bool, LookupError> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(false)
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_async_signup_with_bridged_lookup() {
    let compiled = Arc::new(
        RuleSet::new()
            .field("email", rules![Required, validation::Unique::new("users")])
            .compile()
            .unwrap(),
    );
    let mut options =
        AsyncOptions::from_config(EngineConfig::new().with_lookup_timeout(Duration::from_millis(20)));
    options
        .extras
        .insert(Lookups::new(BlockingLookup::current(SlowUsers)));

    let (_, outcome) = validate_async(
        Value::from(json!({ "email": "ada@example.com" })),
        compiled,
        options,
    )
    .await
    .unwrap();

    // Timed out lookups fail closed
    assert!(!outcome.is_valid());
    assert_eq!(outcome.collaborator_errors.len(), 1);
    assert_eq!(outcome.collaborator_errors[0].validator, "unique");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sync_validate_inside_async_handler() {
    let compiled = RuleSet::new()
        .field("email", rules![Required, validation::Unique::new("users")])
        .compile()
        .unwrap();
    let extras = Extras::new().with(Lookups::new(BlockingLookup::current(
        MemoryLookup::new().with("users", "taken@example.com"),
    )));

    let mut taken = Value::from(json!({ "email": "taken@example.com" }));
    let outcome = validate(Options::new(&mut taken, &compiled).extras(&extras));
    assert!(outcome.collaborator_errors.is_empty());
    assert_eq!(
        outcome.errors.unwrap().to_string(),
        "email: validation.rules.unique\n"
    );

    let mut free = Value::from(json!({ "email": "ada@example.com" }));
    assert!(validate(Options::new(&mut free, &compiled).extras(&extras)).is_valid());
}

#[tokio::test]
async fn test_sync_validate_on_current_thread_runtime_fails_closed() {
    let compiled = RuleSet::new()
        .field("email", rules![Required, validation::Unique::new("users")])
        .compile()
        .unwrap();
    let extras = Extras::new().with(Lookups::new(BlockingLookup::current(MemoryLookup::new())));

    let mut body = Value::from(json!({ "email": "ada@example.com" }));
    let outcome = validate(Options::new(&mut body, &compiled).extras(&extras));

    assert!(!outcome.is_valid());
    assert_eq!(outcome.collaborator_errors.len(), 1);
    assert_eq!(outcome.collaborator_errors[0].validator, "unique");
}

#[tokio::test]
async fn test_async_call_times_out() {
    struct Sleepy;

    impl Validator for Sleepy {
        fn validate(&self, _ctx: &mut Context<'_>) -> bool {
            std::thread::sleep(Duration::from_millis(200));
            true
        }

        fn name(&self) -> &'static str {
            "sleepy"
        }
    }

    let compiled = Arc::new(RuleSet::new().field("x", rules![Sleepy]).compile().unwrap());
    let options =
        AsyncOptions::from_config(EngineConfig::new().with_execute_timeout(Duration::from_millis(10)));

    let result = validate_async(Value::from(json!({ "x": 1 })), compiled, options).await;
    assert!(matches!(result, Err(ExecuteError::Timeout(_))));
}
