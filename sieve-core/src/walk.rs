//! Enumerate every match of a path against a data tree.
//!
//! The walker never fails: missing keys, missing arrays and values of the
//! wrong shape are reported to the visitor through [`Found`] so the caller
//! decides whether absence matters.

use crate::path::{PathStep, StepKind};
use crate::value::{ResolvedPath, Segment, Value};

/// Whether the visitor wants to keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Stop iterating the innermost array
    Break,
}

/// How a match was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Found {
    Found,
    /// The container exists but the key or element does not
    ElementNotFound,
    /// A container on the way is missing or has the wrong shape
    ParentNotFound,
}

/// One match of a path.
#[derive(Debug, Clone)]
pub struct WalkContext<'v> {
    pub value: Option<&'v Value>,
    pub parent: Option<&'v Value>,
    /// Key or index of the value in its parent; `None` for the root
    pub key: Option<Segment>,
    pub path: ResolvedPath,
    pub found: Found,
}

/// Where the value of a step comes from.
#[derive(Clone, Copy)]
enum Source<'v, 'k> {
    Root(&'v Value),
    Entry { parent: &'v Value, key: &'k Segment },
    /// Position inside a value that is present but not a container
    Misshapen { parent: &'v Value },
    Detached,
}

impl<'v> Source<'v, '_> {
    fn resolve(self) -> Option<&'v Value> {
        match self {
            Source::Root(value) => Some(value),
            Source::Entry { parent, key } => parent.child(key),
            Source::Misshapen { .. } | Source::Detached => None,
        }
    }

    fn found(self) -> Found {
        match self {
            Source::Root(_) => Found::Found,
            Source::Entry { parent, key } => match (parent, key) {
                (Value::Map(map), Segment::Key(k)) if map.contains_key(k) => Found::Found,
                (Value::Map(_), Segment::Key(_)) => Found::ElementNotFound,
                (Value::Sequence(_), Segment::Index(_)) => match parent.child(key) {
                    Some(_) => Found::Found,
                    None => Found::ElementNotFound,
                },
                _ => Found::ParentNotFound,
            },
            Source::Misshapen { .. } => Found::ElementNotFound,
            Source::Detached => Found::ParentNotFound,
        }
    }

    fn parent(self) -> Option<&'v Value> {
        match self {
            Source::Entry { parent, .. } | Source::Misshapen { parent } => Some(parent),
            _ => None,
        }
    }
}

/// Walk `path` over `root`, calling `visit` once per match.
pub fn walk<'v, F>(path: &PathStep, root: &'v Value, mut visit: F)
where
    F: FnMut(WalkContext<'v>) -> Flow,
{
    walk_at(path, root, &ResolvedPath::root(), &mut visit);
}

/// Walk `path` relative to the node at `base`.
///
/// Resolved paths handed to the visitor start with `base`. When `base` does
/// not exist every match is reported as [`Found::ParentNotFound`].
pub fn walk_at<'v, F>(path: &PathStep, root: &'v Value, base: &ResolvedPath, visit: &mut F)
where
    F: FnMut(WalkContext<'v>) -> Flow,
{
    let mut resolved = base.clone();
    let start = match root.pointer(base) {
        Some(node) => node,
        None => {
            step(path, Source::Detached, None, &mut resolved, visit);
            return;
        }
    };

    match path.name() {
        // Anonymous first step: the starting node itself
        None => {
            step(path, Source::Root(start), None, &mut resolved, visit);
        }
        Some(name) => {
            let key = Segment::Key(name.to_string());
            resolved.push(key.clone());
            step(
                path,
                Source::Entry {
                    parent: start,
                    key: &key,
                },
                Some(&key),
                &mut resolved,
                visit,
            );
        }
    }
}

/// Collect every match of `path` as `(resolved path, found)` pairs.
pub fn matches(path: &PathStep, root: &Value, base: &ResolvedPath) -> Vec<(ResolvedPath, Found)> {
    let mut out = Vec::new();
    walk_at(path, root, base, &mut |ctx: WalkContext<'_>| {
        out.push((ctx.path, ctx.found));
        Flow::Continue
    });
    out
}

fn step<'v, F>(
    step_def: &PathStep,
    source: Source<'v, '_>,
    key: Option<&Segment>,
    resolved: &mut ResolvedPath,
    visit: &mut F,
) -> Flow
where
    F: FnMut(WalkContext<'v>) -> Flow,
{
    match step_def.kind() {
        StepKind::Element => visit(WalkContext {
            value: source.resolve(),
            parent: source.parent(),
            key: key.cloned(),
            path: resolved.clone(),
            found: source.found(),
        }),
        StepKind::Object => {
            let Some(next) = step_def.next() else {
                return Flow::Continue;
            };
            let child = Segment::Key(next.name().unwrap_or_default().to_string());
            resolved.push(child.clone());
            let flow = match source.resolve() {
                Some(map) if map.is_map() => step(
                    next,
                    Source::Entry {
                        parent: map,
                        key: &child,
                    },
                    Some(&child),
                    resolved,
                    visit,
                ),
                _ => step(next, Source::Detached, Some(&child), resolved, visit),
            };
            resolved.pop();
            flow
        }
        StepKind::Array => {
            let Some(next) = step_def.next() else {
                return Flow::Continue;
            };
            let value = source.resolve();
            let list = value.filter(|v| v.is_sequence());
            let len = list.and_then(Value::as_sequence).map_or(0, Vec::len);
            match list {
                Some(list) if len > 0 => {
                    for i in 0..len {
                        let index = Segment::Index(i as i64);
                        resolved.push(index.clone());
                        let flow = step(
                            next,
                            Source::Entry {
                                parent: list,
                                key: &index,
                            },
                            Some(&index),
                            resolved,
                            visit,
                        );
                        resolved.pop();
                        if flow == Flow::Break {
                            break;
                        }
                    }
                }
                Some(list) => {
                    // Empty array: only a direct element is reported missing
                    if next.kind() == StepKind::Element {
                        let index = Segment::Index(-1);
                        resolved.push(index.clone());
                        step(
                            next,
                            Source::Entry {
                                parent: list,
                                key: &index,
                            },
                            Some(&index),
                            resolved,
                            visit,
                        );
                        resolved.pop();
                    }
                }
                None => {
                    // Present but not a sequence: the element is missing,
                    // not its parent
                    let element = match value {
                        Some(parent) => Source::Misshapen { parent },
                        None => Source::Detached,
                    };
                    let index = Segment::Index(-1);
                    resolved.push(index.clone());
                    step(next, element, Some(&index), resolved, visit);
                    resolved.pop();
                }
            }
            Flow::Continue
        }
    }
}
