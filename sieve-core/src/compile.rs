//! Rule set compiler.
//!
//! Compilation flattens nested rule sets into absolute paths, injects
//! undeclared array ancestors, rejects duplicate paths, links `P[]` fields
//! under `P` and finally hands the list to the scheduler.

use crate::builtin::Array;
use crate::error::{ConfigError, ConfigResult};
use crate::path::{self, ARRAY_MARKER, PathStep, StepKind};
use crate::rules::{CURRENT_ELEMENT, CompiledRules, Field, RuleEntry, RuleSet};
use crate::schedule;
use crate::validator::ValidatorRef;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// One flattened entry, before linking.
struct Declaration {
    path: PathStep,
    key: String,
    validators: Vec<ValidatorRef>,
    prefix_depth: usize,
}

/// Compile a rule set into ordered fields.
pub fn compile(set: &RuleSet) -> ConfigResult<CompiledRules> {
    let mut declarations = Vec::new();
    flatten(set, CURRENT_ELEMENT, 0, &mut declarations)?;

    let mut seen = HashSet::with_capacity(declarations.len());
    for declaration in &declarations {
        if !seen.insert(declaration.key.as_str()) {
            return Err(ConfigError::DuplicatePath(declaration.key.clone()));
        }
    }

    let declared = declarations.len();
    let declarations = inject_array_ancestors(declarations);
    let injected = declarations.len() - declared;

    let fields = link_elements(declarations)?;
    let fields = schedule::order(fields);

    debug!(
        declared = declared,
        injected = injected,
        fields = fields.len(),
        "compiled rule set"
    );
    Ok(CompiledRules::from_fields(fields))
}

fn parse_path(path: &str) -> ConfigResult<PathStep> {
    if path.is_empty() {
        return Ok(PathStep::root());
    }
    PathStep::parse(path).map_err(|source| ConfigError::InvalidPath {
        path: path.to_string(),
        source,
    })
}

fn flatten(
    set: &RuleSet,
    prefix: &str,
    prefix_depth: usize,
    out: &mut Vec<Declaration>,
) -> ConfigResult<()> {
    for (key, entry) in set.entries() {
        let full = if key == CURRENT_ELEMENT {
            prefix.to_string()
        } else {
            path::join(prefix, key)
        };

        match entry {
            RuleEntry::Rules(rules) => {
                out.push(declare(&full, rules.validators().to_vec(), prefix_depth)?);
            }
            RuleEntry::Scoped {
                prefix_depth: own,
                rules,
            } => {
                out.push(declare(
                    &full,
                    rules.validators().to_vec(),
                    prefix_depth + own,
                )?);
            }
            RuleEntry::Nested(child) => {
                let depth = if full.is_empty() {
                    0
                } else {
                    parse_path(&full)?.depth()
                };
                flatten(child, &full, depth, out)?;
            }
        }
    }
    Ok(())
}

fn declare(
    full: &str,
    validators: Vec<ValidatorRef>,
    prefix_depth: usize,
) -> ConfigResult<Declaration> {
    let path = parse_path(full)?;
    Ok(Declaration {
        key: path.to_string(),
        path,
        validators,
        prefix_depth,
    })
}

/// Insert a default array field for every array marker whose container is
/// not declared, right before the first declaration that needs it.
fn inject_array_ancestors(declarations: Vec<Declaration>) -> Vec<Declaration> {
    let mut known: HashSet<String> = declarations.iter().map(|d| d.key.clone()).collect();
    let mut out = Vec::with_capacity(declarations.len());

    for declaration in declarations {
        let ancestors: Vec<PathStep> = declaration
            .path
            .steps()
            .enumerate()
            .filter(|(_, step)| step.kind() == StepKind::Array)
            .map(|(i, _)| declaration.path.truncate(i + 1))
            .collect();

        for ancestor in ancestors {
            let key = ancestor.to_string();
            if known.insert(key.clone()) {
                trace!(path = %key, "injecting array ancestor");
                out.push(Declaration {
                    path: ancestor,
                    key,
                    validators: vec![Arc::new(Array)],
                    prefix_depth: 0,
                });
            }
        }
        out.push(declaration);
    }
    out
}

/// Move every `P[]` field under `P` as its element field.
fn link_elements(declarations: Vec<Declaration>) -> ConfigResult<Vec<Field>> {
    let mut fields: IndexMap<String, Field> = IndexMap::with_capacity(declarations.len());
    for declaration in declarations {
        let field = Field::new(
            declaration.path,
            declaration.validators,
            declaration.prefix_depth,
        )?;
        fields.insert(declaration.key, field);
    }

    // Deepest first so `P[][]` lands in `P[]` before `P[]` moves
    let mut element_keys: Vec<String> = fields
        .keys()
        .filter(|key| key.ends_with(ARRAY_MARKER))
        .cloned()
        .collect();
    element_keys.sort_by_key(|key| std::cmp::Reverse(key.len()));

    for key in element_keys {
        let parent_key = &key[..key.len() - ARRAY_MARKER.len()];
        let Some(element) = fields.shift_remove(&key) else {
            continue;
        };
        match fields.get_mut(parent_key) {
            Some(parent) => parent.set_elements(element),
            // Injection guarantees the parent; keep the field if it is gone
            None => {
                fields.insert(key, element);
            }
        }
    }

    Ok(fields.into_values().collect())
}
