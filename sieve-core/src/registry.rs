//! Named validator factories and declaration documents.
//!
//! A [`Registry`] maps rule names to factories so rule sets can be written
//! as data:
//!
//! ```
//! use sieve_core::{Registry, RuleSet};
//! use serde_json::json;
//!
//! let registry = Registry::new();
//! let set = RuleSet::from_json(
//!     &json!({
//!         "tags": ["required", "array"],
//!         "address": { "": ["nullable", "object"], "city": ["required"] }
//!     }),
//!     &registry,
//! )
//! .unwrap();
//!
//! let compiled = set.compile().unwrap();
//! assert!(compiled.get("address").unwrap().is_nullable());
//! assert!(compiled.get("address.city").is_some());
//! ```

use crate::builtin::{Array, Nullable, Object, Required, RequiredIf};
use crate::error::{ConfigError, ConfigResult};
use crate::rules::{RuleEntry, RuleSet, Rules};
use crate::validator::ValidatorRef;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

type Factory = Arc<dyn Fn(&[String]) -> ConfigResult<ValidatorRef> + Send + Sync>;

/// Rule name → validator factory table.
#[derive(Clone)]
pub struct Registry {
    factories: HashMap<String, Factory>,
}

impl Registry {
    /// Registry holding the structural rules: `required`, `required_if`,
    /// `nullable`, `array` and `object`.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("required", |args| {
            no_arguments("required", args)?;
            Ok(Arc::new(Required))
        });
        registry.register("required_if", |args| match args {
            [flag] => Ok(Arc::new(RequiredIf::flag(flag.clone()))),
            _ => Err(ConfigError::arguments(
                "required_if",
                "expected the name of one extra flag",
            )),
        });
        registry.register("nullable", |args| {
            no_arguments("nullable", args)?;
            Ok(Arc::new(Nullable))
        });
        registry.register("array", |args| {
            no_arguments("array", args)?;
            Ok(Arc::new(Array))
        });
        registry.register("object", |args| {
            no_arguments("object", args)?;
            Ok(Arc::new(Object))
        });
        registry
    }

    /// Registry without any rule.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Add or replace a rule.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&[String]) -> ConfigResult<ValidatorRef> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Builder form of [`Registry::register`].
    pub fn with<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&[String]) -> ConfigResult<ValidatorRef> + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered rule names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build a validator from `"name"` or `"name:arg1,arg2"`.
    pub fn build(&self, declaration: &str) -> ConfigResult<ValidatorRef> {
        let (name, args) = parse_declaration(declaration)?;
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ConfigError::UnknownValidator(name.to_string()))?;
        trace!(rule = name, args = args.len(), "building validator");
        factory(&args)
    }

    /// Build a list of validators from declarations.
    pub fn rules<S: AsRef<str>>(&self, declarations: &[S]) -> ConfigResult<Rules> {
        declarations
            .iter()
            .map(|d| self.build(d.as_ref()))
            .collect::<ConfigResult<Vec<_>>>()
            .map(Rules::from)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("rules", &self.names())
            .finish()
    }
}

/// Fail when a rule that takes no argument received some.
pub fn no_arguments(rule: &str, args: &[String]) -> ConfigResult<()> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::arguments(rule, "takes no arguments"))
    }
}

fn parse_declaration(declaration: &str) -> ConfigResult<(&str, Vec<String>)> {
    let declaration = declaration.trim();
    let (name, args) = match declaration.split_once(':') {
        Some((name, args)) => (
            name.trim(),
            args.split(',').map(|a| a.trim().to_string()).collect(),
        ),
        None => (declaration, Vec::new()),
    };
    if name.is_empty() {
        return Err(ConfigError::declaration(format!(
            "missing rule name in \"{}\"",
            declaration
        )));
    }
    Ok((name, args))
}

impl RuleSet {
    /// Build a rule set from a declaration document.
    ///
    /// The document is a JSON object whose keys are paths (or `""` for the
    /// current element) and whose values are arrays of rule declarations
    /// or nested objects.
    pub fn from_json(document: &serde_json::Value, registry: &Registry) -> ConfigResult<Self> {
        let serde_json::Value::Object(entries) = document else {
            return Err(ConfigError::declaration("rule set must be an object"));
        };

        let mut set = RuleSet::new();
        for (path, value) in entries {
            let entry = match value {
                serde_json::Value::Array(items) => {
                    let declarations = items
                        .iter()
                        .map(|item| {
                            item.as_str().ok_or_else(|| {
                                ConfigError::declaration(format!(
                                    "rules of \"{}\" must be strings",
                                    path
                                ))
                            })
                        })
                        .collect::<ConfigResult<Vec<_>>>()?;
                    RuleEntry::Rules(registry.rules(&declarations)?)
                }
                serde_json::Value::Object(_) => {
                    RuleEntry::Nested(RuleSet::from_json(value, registry)?)
                }
                _ => {
                    return Err(ConfigError::declaration(format!(
                        "\"{}\" must map to a list of rules or a nested rule set",
                        path
                    )));
                }
            };
            set.push(path.clone(), entry);
        }
        Ok(set)
    }

    /// Parse a JSON declaration document from text.
    pub fn from_json_str(document: &str, registry: &Registry) -> ConfigResult<Self> {
        let value: serde_json::Value = serde_json::from_str(document)
            .map_err(|e| ConfigError::declaration(format!("invalid JSON: {}", e)))?;
        Self::from_json(&value, registry)
    }
}
