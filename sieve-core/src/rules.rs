// Rule sets, compiled fields and lazy compilation

use crate::compile;
use crate::error::{ConfigError, ConfigResult};
use crate::path::{self, PathStep};
use crate::validator::{Context, Validator, ValidatorRef};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// Key denoting the object or array a nested rule set is composed into.
pub const CURRENT_ELEMENT: &str = "";

/// Ordered list of validators for one path.
#[derive(Clone, Default)]
pub struct Rules {
    validators: Vec<ValidatorRef>,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a validator
    #[allow(clippy::should_implement_trait)]
    pub fn add<V: Validator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Append an already shared validator
    pub fn add_shared(mut self, validator: ValidatorRef) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn validators(&self) -> &[ValidatorRef] {
        &self.validators
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl From<Vec<ValidatorRef>> for Rules {
    fn from(validators: Vec<ValidatorRef>) -> Self {
        Self { validators }
    }
}

impl fmt::Debug for Rules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.validators).finish()
    }
}

/// Build a [`Rules`] list from validator expressions.
///
/// ```
/// use sieve_core::{rules, Required, Nullable};
///
/// let rules = rules![Required, Nullable];
/// assert_eq!(rules.len(), 2);
/// ```
#[macro_export]
macro_rules! rules {
    () => {
        $crate::Rules::new()
    };
    ($($validator:expr),+ $(,)?) => {
        $crate::Rules::new()$(.add($validator))+
    };
}

/// Value of one rule set entry.
#[derive(Debug, Clone)]
pub enum RuleEntry {
    /// Validators for the entry's path
    Rules(Rules),
    /// A rule set composed under the entry's path
    Nested(RuleSet),
    /// Validators that keep the prefix they were composed under.
    /// Produced by [`CompiledRules::as_rule_set`].
    Scoped { prefix_depth: usize, rules: Rules },
}

/// Declarative, composable rule set: an ordered mapping from
/// path (or [`CURRENT_ELEMENT`]) to validators or to a nested rule set.
///
/// ```
/// use sieve_core::{rules, RuleSet, Required, Object, CURRENT_ELEMENT};
///
/// let address = RuleSet::new()
///     .field(CURRENT_ELEMENT, rules![Required, Object])
///     .field("city", rules![Required]);
///
/// let set = RuleSet::new()
///     .field("name", rules![Required])
///     .nested("address", address);
///
/// let compiled = set.compile().unwrap();
/// let paths: Vec<_> = compiled.fields().iter().map(|f| f.path_str()).collect();
/// assert_eq!(paths, vec!["name", "address", "address.city"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    entries: Vec<(String, RuleEntry)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare validators for a path.
    pub fn field(mut self, path: impl Into<String>, rules: impl Into<Rules>) -> Self {
        self.push(path, RuleEntry::Rules(rules.into()));
        self
    }

    /// Compose a nested rule set under a path.
    pub fn nested(mut self, path: impl Into<String>, set: RuleSet) -> Self {
        self.push(path, RuleEntry::Nested(set));
        self
    }

    pub fn push(&mut self, path: impl Into<String>, entry: RuleEntry) {
        self.entries.push((path.into(), entry));
    }

    pub fn entries(&self) -> &[(String, RuleEntry)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compile this rule set.
    pub fn compile(&self) -> ConfigResult<CompiledRules> {
        compile::compile(self)
    }
}

/// One resolved cross-field dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Dependency {
    relative: String,
    absolute: PathStep,
    absolute_str: String,
}

/// A compiled rule set entry.
#[derive(Clone)]
pub struct Field {
    path: PathStep,
    path_str: String,
    validators: Vec<ValidatorRef>,
    elements: Option<Box<Field>>,
    prefix_depth: usize,
    dependencies: Vec<Dependency>,
    nullable: bool,
    array: bool,
    object: bool,
}

impl Field {
    pub(crate) fn new(
        path: PathStep,
        validators: Vec<ValidatorRef>,
        prefix_depth: usize,
    ) -> ConfigResult<Self> {
        let path_str = path.to_string();
        let prefix = path.truncate(prefix_depth).to_string();
        let mut dependencies = Vec::new();
        for relative in validators.iter().filter_map(|v| v.depends_on()) {
            if dependencies.iter().any(|d: &Dependency| d.relative == relative) {
                continue;
            }
            let joined = path::join(&prefix, relative);
            let absolute = PathStep::parse(&joined).map_err(|source| ConfigError::InvalidPath {
                path: joined.clone(),
                source,
            })?;
            dependencies.push(Dependency {
                relative: relative.to_string(),
                absolute_str: absolute.to_string(),
                absolute,
            });
        }
        Ok(Self {
            nullable: validators.iter().any(|v| v.is_nullable()),
            array: validators.iter().any(|v| v.is_array()),
            object: validators.iter().any(|v| v.is_object()),
            path,
            path_str,
            validators,
            elements: None,
            prefix_depth,
            dependencies,
        })
    }

    pub(crate) fn set_elements(&mut self, elements: Field) {
        self.elements = Some(Box::new(elements));
    }

    pub fn path(&self) -> &PathStep {
        &self.path
    }

    /// Normalized path string; empty for the root.
    pub fn path_str(&self) -> &str {
        &self.path_str
    }

    pub fn validators(&self) -> &[ValidatorRef] {
        &self.validators
    }

    /// Field applied to each element when this field is an array.
    pub fn elements(&self) -> Option<&Field> {
        self.elements.as_deref()
    }

    /// Number of leading path steps that came from composition.
    pub fn prefix_depth(&self) -> usize {
        self.prefix_depth
    }

    /// Path of the rule set this field was declared in.
    pub fn prefix(&self) -> String {
        self.path.truncate(self.prefix_depth).to_string()
    }

    pub fn array_depth(&self) -> usize {
        self.path.array_depth()
    }

    /// Absolute path of a dependency given in relative form.
    pub fn dependency(&self, relative: &str) -> Option<&PathStep> {
        self.dependencies
            .iter()
            .find(|d| d.relative == relative)
            .map(|d| &d.absolute)
    }

    /// Normalized absolute paths this field's validators read.
    pub fn dependency_paths(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(|d| d.absolute_str.as_str())
    }

    /// Validator making the field required for this occurrence, if any.
    pub fn requiring_validator(&self, ctx: &Context<'_>) -> Option<&ValidatorRef> {
        self.validators.iter().find(|v| v.requires(ctx))
    }

    pub fn is_required(&self, ctx: &Context<'_>) -> bool {
        self.requiring_validator(ctx).is_some()
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_array(&self) -> bool {
        self.array
    }

    pub fn is_object(&self) -> bool {
        self.object
    }

    fn push_entries(&self, set: &mut RuleSet) {
        set.push(
            self.path_str.clone(),
            RuleEntry::Scoped {
                prefix_depth: self.prefix_depth,
                rules: Rules::from(self.validators.clone()),
            },
        );
        if let Some(elements) = &self.elements {
            elements.push_entries(set);
        }
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.path_str == other.path_str
            && self.prefix_depth == other.prefix_depth
            && self.validators.len() == other.validators.len()
            && self
                .validators
                .iter()
                .zip(&other.validators)
                .all(|(a, b)| Arc::ptr_eq(a, b))
            && self.elements == other.elements
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("path", &self.path_str)
            .field("validators", &self.validators)
            .field("prefix_depth", &self.prefix_depth)
            .field("elements", &self.elements)
            .finish()
    }
}

/// Flattened, ordered fields ready for execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledRules {
    fields: Vec<Field>,
}

impl CompiledRules {
    pub(crate) fn from_fields(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Fields in execution order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Find a field by normalized path, element fields included.
    pub fn get(&self, path: &str) -> Option<&Field> {
        fn find<'a>(field: &'a Field, path: &str) -> Option<&'a Field> {
            if field.path_str == path {
                return Some(field);
            }
            field.elements().and_then(|e| find(e, path))
        }
        self.fields.iter().find_map(|f| find(f, path))
    }

    /// Re-express this compiled set as a flat rule set.
    ///
    /// Compiling the result yields an equal `CompiledRules`.
    pub fn as_rule_set(&self) -> RuleSet {
        let mut set = RuleSet::new();
        for field in &self.fields {
            field.push_entries(&mut set);
        }
        set
    }
}

/// Anything that can be turned into compiled rules.
pub trait Compile {
    fn compile(self) -> ConfigResult<CompiledRules>;
}

impl Compile for RuleSet {
    fn compile(self) -> ConfigResult<CompiledRules> {
        compile::compile(&self)
    }
}

impl Compile for &RuleSet {
    fn compile(self) -> ConfigResult<CompiledRules> {
        compile::compile(self)
    }
}

impl Compile for CompiledRules {
    /// Already compiled: returned unchanged.
    fn compile(self) -> ConfigResult<CompiledRules> {
        Ok(self)
    }
}

/// Rule set compiled on first use, safely under concurrent callers.
///
/// ```
/// use sieve_core::{rules, LazyRules, RuleSet, Required};
///
/// static RULES: LazyRules = LazyRules::new(|| RuleSet::new().field("id", rules![Required]));
///
/// let compiled = RULES.get().unwrap();
/// assert_eq!(compiled.len(), 1);
/// ```
pub struct LazyRules {
    build: fn() -> RuleSet,
    cell: OnceCell<CompiledRules>,
}

impl LazyRules {
    pub const fn new(build: fn() -> RuleSet) -> Self {
        Self {
            build,
            cell: OnceCell::new(),
        }
    }

    /// Compiled rules, compiling them if this is the first call.
    ///
    /// A failed compilation is not cached; the error is returned to every
    /// caller that attempts it.
    pub fn get(&self) -> ConfigResult<&CompiledRules> {
        self.cell.get_or_try_init(|| {
            tracing::debug!("compiling lazy rule set");
            compile::compile(&(self.build)())
        })
    }

    pub fn is_compiled(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl fmt::Debug for LazyRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRules")
            .field("compiled", &self.is_compiled())
            .finish()
    }
}
