//! Path mini-language.
//!
//! A path addresses one or more locations inside nested data:
//!
//! ```text
//! path    := segment (("." segment) | "[]")*
//! segment := name            (no '.', '[' or ']')
//! ```
//!
//! A leading `[]` means the root itself is an array. Parsing produces a
//! singly-linked chain of [`PathStep`]s that always ends in an
//! [`StepKind::Element`]:
//!
//! ```
//! use sieve_core::path::{PathStep, StepKind};
//!
//! let path = PathStep::parse("object.array[].field").unwrap();
//! let kinds: Vec<_> = path.steps().map(|s| (s.kind(), s.name())).collect();
//! assert_eq!(
//!     kinds,
//!     vec![
//!         (StepKind::Object, Some("object")),
//!         (StepKind::Array, Some("array")),
//!         (StepKind::Object, None),
//!         (StepKind::Element, Some("field")),
//!     ]
//! );
//! assert_eq!(path.to_string(), "object.array[].field");
//! ```

use crate::error::PathError;
use std::fmt;
use std::str::FromStr;

/// Marker appended to a path to address the elements of an array.
pub const ARRAY_MARKER: &str = "[]";

/// What the value at a step is expected to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// Leaf: the addressed value itself
    Element,
    /// Every element of a sequence
    Array,
    /// A named key inside a map
    Object,
}

/// One step of a compiled path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    kind: StepKind,
    name: Option<String>,
    next: Option<Box<PathStep>>,
}

/// Result of lexing: names with the number of `[]` markers trailing them.
#[derive(Debug)]
struct Lexeme {
    name: Option<String>,
    arrays: usize,
}

impl PathStep {
    /// Parse a path string.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let segments = lex(path)?;
        Ok(build(&segments))
    }

    /// The anonymous leaf addressing the root value itself.
    pub fn root() -> Self {
        Self {
            kind: StepKind::Element,
            name: None,
            next: None,
        }
    }

    /// `[]`: every element of the value the walk starts from.
    pub fn elements() -> Self {
        Self {
            kind: StepKind::Array,
            name: None,
            next: Some(Box::new(PathStep::root())),
        }
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn next(&self) -> Option<&PathStep> {
        self.next.as_deref()
    }

    /// Iterate over this step and all following ones.
    pub fn steps(&self) -> Steps<'_> {
        Steps {
            current: Some(self),
        }
    }

    /// Last step of the chain.
    pub fn tail(&self) -> &PathStep {
        let mut step = self;
        while let Some(next) = step.next() {
            step = next;
        }
        step
    }

    /// Number of steps in the chain.
    pub fn depth(&self) -> usize {
        self.steps().count()
    }

    /// Number of array markers in the chain.
    pub fn array_depth(&self) -> usize {
        self.steps().filter(|s| s.kind == StepKind::Array).count()
    }

    pub fn has_array(&self) -> bool {
        self.steps().any(|s| s.kind == StepKind::Array)
    }

    /// Whether this is the anonymous root element.
    pub fn is_root(&self) -> bool {
        self.kind == StepKind::Element && self.name.is_none()
    }

    /// Keep the first `depth` steps, turning the new last step into a leaf.
    ///
    /// A depth of zero yields the root element.
    pub fn truncate(&self, depth: usize) -> PathStep {
        if depth == 0 {
            return PathStep::root();
        }
        let next = match (&self.next, depth) {
            (Some(next), d) if d > 1 => Some(Box::new(next.truncate(d - 1))),
            _ => None,
        };
        let kind = if next.is_none() {
            StepKind::Element
        } else {
            self.kind
        };
        PathStep {
            kind,
            name: self.name.clone(),
            next,
        }
    }
}

impl FromStr for PathStep {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PathStep::parse(s)
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in self.steps() {
            if let Some(name) = &step.name {
                f.write_str(name)?;
            }
            match step.kind {
                StepKind::Array => f.write_str(ARRAY_MARKER)?,
                StepKind::Object => f.write_str(".")?,
                StepKind::Element => {}
            }
        }
        Ok(())
    }
}

/// Iterator over the steps of a chain.
pub struct Steps<'a> {
    current: Option<&'a PathStep>,
}

impl<'a> Iterator for Steps<'a> {
    type Item = &'a PathStep;

    fn next(&mut self) -> Option<Self::Item> {
        let step = self.current?;
        self.current = step.next();
        Some(step)
    }
}

/// Join a child key onto a parent path, the way nested rule sets compose.
///
/// Keys starting with `[]` attach directly; the empty string is the root.
pub fn join(parent: &str, child: &str) -> String {
    match (parent.is_empty(), child.is_empty()) {
        (true, _) => child.to_string(),
        (false, true) => parent.to_string(),
        (false, false) if child.starts_with('[') => format!("{}{}", parent, child),
        (false, false) => format!("{}.{}", parent, child),
    }
}

fn lex(path: &str) -> Result<Vec<Lexeme>, PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }

    let mut segments: Vec<Lexeme> = Vec::new();
    let mut name = String::new();
    // True right after a '.' and at the very start: a name (or, at the start
    // only, a bracket) must follow.
    let mut expect_name = true;
    let mut chars = path.char_indices();

    while let Some((pos, c)) = chars.next() {
        match c {
            '.' => {
                if segments.is_empty() && name.is_empty() {
                    return Err(PathError::LeadingDot);
                }
                if expect_name {
                    return Err(PathError::ConsecutiveDots { position: pos });
                }
                if !name.is_empty() {
                    flush(&mut segments, &mut name);
                }
                expect_name = true;
            }
            '[' => {
                if expect_name && !(segments.is_empty() && name.is_empty()) {
                    return Err(PathError::UnexpectedCharacter {
                        character: '[',
                        position: pos,
                    });
                }
                match chars.next() {
                    Some((_, ']')) => {}
                    Some(_) => {
                        return Err(if path[pos..].contains(']') {
                            PathError::NonEmptyBracket { position: pos }
                        } else {
                            PathError::UnclosedBracket { position: pos }
                        });
                    }
                    None => return Err(PathError::UnclosedBracket { position: pos }),
                }
                // `name[]` or a leading `[]` opens a segment; `[][]` extends one.
                if !name.is_empty() || segments.is_empty() {
                    flush(&mut segments, &mut name);
                }
                if let Some(last) = segments.last_mut() {
                    last.arrays += 1;
                }
                expect_name = false;
            }
            ']' => return Err(PathError::UnopenedBracket { position: pos }),
            c => {
                if !expect_name && name.is_empty() {
                    // A name glued to a closing bracket: `a[]b`
                    return Err(PathError::UnexpectedCharacter {
                        character: c,
                        position: pos,
                    });
                }
                name.push(c);
                expect_name = false;
            }
        }
    }

    if expect_name {
        return Err(PathError::TrailingDot);
    }
    if !name.is_empty() {
        flush(&mut segments, &mut name);
    }
    Ok(segments)
}

fn flush(segments: &mut Vec<Lexeme>, name: &mut String) {
    let name = std::mem::take(name);
    segments.push(Lexeme {
        name: (!name.is_empty()).then_some(name),
        arrays: 0,
    });
}

fn build(segments: &[Lexeme]) -> PathStep {
    let mut tail: Option<Box<PathStep>> = None;
    for (i, segment) in segments.iter().enumerate().rev() {
        let is_last = i + 1 == segments.len();
        // Innermost step first: what the value behind the last marker is.
        let mut step = PathStep {
            kind: if is_last {
                StepKind::Element
            } else {
                StepKind::Object
            },
            name: None,
            next: tail.take(),
        };
        for _ in 0..segment.arrays {
            step = PathStep {
                kind: StepKind::Array,
                name: None,
                next: Some(Box::new(step)),
            };
        }
        step.name = segment.name.clone();
        tail = Some(Box::new(step));
    }
    match tail {
        Some(step) => *step,
        None => PathStep::root(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(path: &str) -> Vec<(StepKind, Option<String>)> {
        PathStep::parse(path)
            .unwrap()
            .steps()
            .map(|s| (s.kind(), s.name().map(str::to_string)))
            .collect()
    }

    fn named(kind: StepKind, name: &str) -> (StepKind, Option<String>) {
        (kind, Some(name.to_string()))
    }

    #[test]
    fn test_parse_single_field() {
        assert_eq!(shape("field"), vec![named(StepKind::Element, "field")]);
    }

    #[test]
    fn test_parse_object_field() {
        assert_eq!(
            shape("object.field"),
            vec![
                named(StepKind::Object, "object"),
                named(StepKind::Element, "field")
            ]
        );
    }

    #[test]
    fn test_parse_arrays() {
        assert_eq!(
            shape("array[]"),
            vec![named(StepKind::Array, "array"), (StepKind::Element, None)]
        );
        assert_eq!(
            shape("array[][]"),
            vec![
                named(StepKind::Array, "array"),
                (StepKind::Array, None),
                (StepKind::Element, None)
            ]
        );
    }

    #[test]
    fn test_parse_object_in_array() {
        assert_eq!(
            shape("object.array[].field"),
            vec![
                named(StepKind::Object, "object"),
                named(StepKind::Array, "array"),
                (StepKind::Object, None),
                named(StepKind::Element, "field"),
            ]
        );
    }

    #[test]
    fn test_parse_root_array() {
        assert_eq!(
            shape("[]"),
            vec![(StepKind::Array, None), (StepKind::Element, None)]
        );
        assert_eq!(
            shape("[].field"),
            vec![
                (StepKind::Array, None),
                (StepKind::Object, None),
                named(StepKind::Element, "field"),
            ]
        );
    }

    #[test]
    fn test_display_normalizes() {
        for path in [
            "field",
            "object.field",
            "array[]",
            "array[][]",
            "object.array[].field",
            "[]",
            "[][].a",
            "a[].b[].c",
        ] {
            assert_eq!(PathStep::parse(path).unwrap().to_string(), path);
        }
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(PathStep::parse(""), Err(PathError::Empty));
        assert_eq!(PathStep::parse(".object"), Err(PathError::LeadingDot));
        assert_eq!(PathStep::parse("object."), Err(PathError::TrailingDot));
        assert!(matches!(
            PathStep::parse("object..field"),
            Err(PathError::ConsecutiveDots { position: 7 })
        ));
        assert!(matches!(
            PathStep::parse("array["),
            Err(PathError::UnclosedBracket { .. })
        ));
        assert!(matches!(
            PathStep::parse("array]"),
            Err(PathError::UnopenedBracket { .. })
        ));
        assert!(matches!(
            PathStep::parse("array[aa]"),
            Err(PathError::NonEmptyBracket { .. })
        ));
        assert!(matches!(
            PathStep::parse("array[]field"),
            Err(PathError::UnexpectedCharacter { character: 'f', .. })
        ));
        assert!(matches!(
            PathStep::parse("object.[]"),
            Err(PathError::UnexpectedCharacter { character: '[', .. })
        ));
    }

    #[test]
    fn test_error_messages() {
        assert!(
            PathStep::parse("array[")
                .unwrap_err()
                .to_string()
                .contains("unclosed bracket")
        );
        assert!(
            PathStep::parse("array[aa]")
                .unwrap_err()
                .to_string()
                .contains("non-empty bracket")
        );
    }

    #[test]
    fn test_depths() {
        let path = PathStep::parse("a.b[].c[][]").unwrap();
        assert_eq!(path.array_depth(), 3);
        assert_eq!(path.depth(), 6);
        assert!(path.has_array());
        assert!(!PathStep::parse("a.b").unwrap().has_array());
    }

    #[test]
    fn test_truncate() {
        let path = PathStep::parse("items[].name").unwrap();
        assert_eq!(path.truncate(2).to_string(), "items[]");
        assert_eq!(path.truncate(1).to_string(), "items");
        assert!(path.truncate(0).is_root());
        assert_eq!(path.truncate(10), path);
    }

    #[test]
    fn test_elements_matches_parsed_marker() {
        assert_eq!(PathStep::elements(), PathStep::parse("[]").unwrap());
        assert_eq!(PathStep::elements().to_string(), "[]");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("", "a"), "a");
        assert_eq!(join("a", ""), "a");
        assert_eq!(join("a", "b"), "a.b");
        assert_eq!(join("a", "[]"), "a[]");
        assert_eq!(join("a[]", "b"), "a[].b");
    }
}
