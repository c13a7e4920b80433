//! # Sieve Core
//!
//! Validation and coercion engine for loosely typed, nested data.
//!
//! ## Features
//!
//! - **Path language**: `object.array[].field` addresses every matching
//!   location in a data tree
//! - **Composable rule sets**: nested rule sets are flattened under their
//!   parent path, missing array containers are injected
//! - **Deterministic ordering**: dependent fields run after the fields they
//!   read, deeper array fields run first
//! - **In-place coercion**: converting validators rewrite values in the
//!   caller's data
//! - **Error trees**: failures are reported in the shape of the data
//!
//! ## Quick Start
//!
//! ```rust
//! use sieve_core::{rules, validate, Array, Context, Options, Required, RuleSet, Validator, Value};
//! use serde_json::json;
//!
//! struct Positive;
//!
//! impl Validator for Positive {
//!     fn validate(&self, ctx: &mut Context<'_>) -> bool {
//!         ctx.value.as_i64().is_some_and(|n| n > 0)
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "positive"
//!     }
//! }
//!
//! let rules = RuleSet::new()
//!     .field("ids", rules![Required, Array])
//!     .field("ids[]", rules![Positive])
//!     .compile()?;
//!
//! let mut data = Value::from(json!({ "ids": [3, -1] }));
//! let outcome = validate(Options::new(&mut data, &rules));
//!
//! let errors = outcome.errors.expect("one element is negative");
//! assert_eq!(errors.to_string(), "ids[1]: validation.rules.positive.element\n");
//! # Ok::<(), sieve_core::ConfigError>(())
//! ```

pub mod builtin;
pub mod compile;
pub mod config;
pub mod error;
pub mod error_tree;
pub mod execute;
pub mod extra;
pub mod lookup;
pub mod path;
pub mod registry;
pub mod rules;
pub mod schedule;
pub mod validator;
pub mod value;
pub mod walk;

pub use builtin::{Array, Nullable, Object, Required, RequiredIf};
pub use compile::compile;
pub use config::EngineConfig;
pub use error::{
    BoxError, CollaboratorError, ConfigError, ConfigResult, ExecuteError, LookupError, PathError,
};
pub use error_tree::ErrorTree;
pub use execute::{AsyncOptions, MALFORMED_INPUT, Options, Outcome, validate, validate_async};
pub use extra::Extras;
pub use lookup::{AsyncLookup, BlockingLookup, Lookup, MemoryLookup};
pub use path::{PathStep, StepKind};
pub use registry::Registry;
pub use rules::{CURRENT_ELEMENT, Compile, CompiledRules, Field, LazyRules, RuleEntry, RuleSet, Rules};
pub use validator::{
    Context, MessageKeys, MessageTable, Scope, Translator, Validator, ValidatorRef, message_key,
};
pub use value::{Category, Map, Opaque, ResolvedPath, Segment, Value};
pub use walk::{Flow, Found, WalkContext, walk};
