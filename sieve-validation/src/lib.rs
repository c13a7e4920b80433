//! Standard validators for the sieve engine
//!
//! Provides the everyday rules (types with coercion, sizes, formats, date
//! comparisons, lookups) and a [`registry`] that knows them all by name.
//!
//! # Examples
//!
//! ## Rules as values
//!
//! ```
//! use sieve_core::{rules, validate, Options, Required, RuleSet, Value};
//! use sieve_validation::{Integer, Min};
//! use serde_json::json;
//!
//! let compiled = RuleSet::new()
//!     .field("age", rules![Required, Integer, Min(18.0)])
//!     .compile()
//!     .unwrap();
//!
//! let mut data = Value::from(json!({ "age": "42" }));
//! assert!(validate(Options::new(&mut data, &compiled)).is_valid());
//!
//! // The string was converted in place
//! assert_eq!(data.pointer(&["age".into()]), Some(&Value::Int(42)));
//! ```
//!
//! ## Rules as data
//!
//! ```
//! use sieve_core::{validate, Options, RuleSet, Value};
//! use serde_json::json;
//!
//! let registry = sieve_validation::registry();
//! let compiled = RuleSet::from_json(
//!     &json!({
//!         "email": ["required", "email"],
//!         "tags": ["array", "distinct"],
//!         "tags[]": ["string", "between:2,10"]
//!     }),
//!     &registry,
//! )
//! .unwrap()
//! .compile()
//! .unwrap();
//!
//! let mut data = Value::from(json!({ "email": "a@b.io", "tags": ["rust", "x"] }));
//! let outcome = validate(Options::new(&mut data, &compiled));
//!
//! let errors = outcome.errors.unwrap();
//! assert_eq!(errors.to_string(), "tags[1]: validation.rules.between.string.element\n");
//! ```

pub mod args;
mod compare;
mod distinct;
mod exists;
mod format;
mod size;
mod types;

pub use compare::*;
pub use distinct::*;
pub use exists::*;
pub use format::*;
pub use size::*;
pub use types::*;

use sieve_core::{ConfigError, Registry, registry::no_arguments};
use std::sync::Arc;

/// Register a rule that takes no arguments.
macro_rules! plain {
    ($registry:ident, $name:literal, $rule:expr) => {
        $registry.register($name, |args| {
            no_arguments($name, args)?;
            Ok(Arc::new($rule))
        });
    };
}

/// Registry with the structural rules of [`Registry::new`] and every
/// validator of this crate.
///
/// | Declaration | Validator |
/// |---|---|
/// | `string`, `integer`, `numeric`, `bool` | [`StringRule`], [`Integer`], [`Numeric`], [`Boolean`] |
/// | `date` or `date:<format>` | [`Date`] |
/// | `after:<path>`, `before:<path>`, `same:<path>`, `after_now` | [`After`], [`Before`], [`Same`], [`AfterNow`] |
/// | `min:<n>`, `max:<n>`, `between:<a>,<b>` | [`Min`], [`Max`], [`Between`] |
/// | `email`, `url`, `uuid`, `alpha`, `alpha_num` | pattern rules |
/// | `regex:<pattern>`, `in:<a>,<b>,...` | [`Matches`], [`In`] |
/// | `distinct` | [`Distinct`] |
/// | `exists:<scope>`, `unique:<scope>` | [`Exists`], [`Unique`] |
pub fn registry() -> Registry {
    let mut registry = Registry::new();

    plain!(registry, "string", StringRule);
    plain!(registry, "integer", Integer);
    plain!(registry, "numeric", Numeric);
    plain!(registry, "bool", Boolean);
    registry.register("date", |args| match args {
        [] => Ok(Arc::new(Date::new())),
        _ => {
            // Formats may contain commas
            let format = args.join(",");
            if format.is_empty() {
                return Err(ConfigError::arguments("date", "format cannot be empty"));
            }
            Ok(Arc::new(Date::with_format(format)))
        }
    });

    registry.register("after", |args| {
        Ok(Arc::new(After::new(args::single("after", args)?)))
    });
    registry.register("before", |args| {
        Ok(Arc::new(Before::new(args::single("before", args)?)))
    });
    registry.register("same", |args| {
        Ok(Arc::new(Same::new(args::single("same", args)?)))
    });
    plain!(registry, "after_now", AfterNow);

    registry.register("min", |args| {
        let bound = args::number("min", args::single("min", args)?)?;
        Ok(Arc::new(Min(bound)))
    });
    registry.register("max", |args| {
        let bound = args::number("max", args::single("max", args)?)?;
        Ok(Arc::new(Max(bound)))
    });
    registry.register("between", |args| {
        args::expect_count("between", args, 2)?;
        let min = args::number("between", &args[0])?;
        let max = args::number("between", &args[1])?;
        if min > max {
            return Err(ConfigError::arguments(
                "between",
                format!("lower bound {} is above upper bound {}", min, max),
            ));
        }
        Ok(Arc::new(Between::new(min, max)))
    });

    plain!(registry, "email", Email);
    plain!(registry, "url", Url);
    plain!(registry, "uuid", Uuid);
    plain!(registry, "alpha", Alpha);
    plain!(registry, "alpha_num", AlphaNum);
    registry.register("regex", |args| {
        let pattern = args.join(",");
        if pattern.is_empty() {
            return Err(ConfigError::arguments("regex", "pattern cannot be empty"));
        }
        match Matches::new(&pattern) {
            Ok(rule) => Ok(Arc::new(rule)),
            Err(e) => Err(ConfigError::arguments("regex", e.to_string())),
        }
    });
    registry.register("in", |args| {
        Ok(Arc::new(In::new(args::non_empty_list("in", args)?)))
    });

    plain!(registry, "distinct", Distinct);
    registry.register("exists", |args| {
        Ok(Arc::new(Exists::new(args::single("exists", args)?)))
    });
    registry.register("unique", |args| {
        Ok(Arc::new(Unique::new(args::single("unique", args)?)))
    });

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_knows_every_rule() {
        let registry = registry();
        for name in [
            "required", "required_if", "nullable", "array", "object", "string", "integer",
            "numeric", "bool", "date", "after", "before", "same", "after_now", "min", "max",
            "between", "email", "url", "uuid", "alpha", "alpha_num", "regex", "in", "distinct",
            "exists", "unique",
        ] {
            assert!(registry.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_declarations_build_named_validators() {
        let registry = registry();
        assert_eq!(registry.build("min:3").unwrap().name(), "min");
        assert_eq!(registry.build("between:1,5").unwrap().name(), "between");
        assert_eq!(registry.build("date:%d/%m/%Y").unwrap().name(), "date");
        assert_eq!(registry.build("regex:^[a-z]{2,4}$").unwrap().name(), "regex");
        assert_eq!(registry.build("in:draft,published").unwrap().name(), "in");
        assert!(registry.build("integer").unwrap().is_type_converting());
        assert!(registry.build("max:10").unwrap().is_type_dependent());
        assert_eq!(
            registry.build("after:start").unwrap().depends_on(),
            Some("start")
        );
    }

    #[test]
    fn test_bad_arguments_are_config_errors() {
        let registry = registry();
        for declaration in [
            "min",
            "min:x",
            "between:5,1",
            "between:1",
            "after",
            "email:strict",
            "regex:(",
            "in",
            "exists",
        ] {
            assert!(
                matches!(
                    registry.build(declaration),
                    Err(ConfigError::InvalidArguments { .. })
                ),
                "{} should be rejected",
                declaration
            );
        }
    }
}
