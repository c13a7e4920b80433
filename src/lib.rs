// Sieve - validation and coercion of nested data
//
// This library compiles composable, path-addressed rule sets once and runs
// them over loosely typed data, converting values in place and reporting
// failures in the shape of the data.

// Re-export core functionality
pub use sieve_core::*;

// Re-export the standard validator library
#[cfg(feature = "validation")]
pub use sieve_validation as validation;

#[cfg(feature = "validation")]
pub use sieve_validation::registry;

/// Prelude for common imports.
///
/// ```
/// use sieve::prelude::*;
///
/// let compiled = RuleSet::new()
///     .field("name", rules![Required])
///     .compile()
///     .unwrap();
/// let mut data = Value::from(serde_json::json!({ "name": "Ada" }));
/// assert!(validate(Options::new(&mut data, &compiled)).is_valid());
/// ```
pub mod prelude {
    pub use sieve_core::{
        Array, CURRENT_ELEMENT, Compile, CompiledRules, ConfigError, Context, ErrorTree, Extras,
        LazyRules, Nullable, Object, Options, Outcome, Required, RequiredIf, RuleSet, Rules,
        Validator, Value, rules, validate,
    };

    #[cfg(feature = "validation")]
    pub use sieve_validation::registry;
}
