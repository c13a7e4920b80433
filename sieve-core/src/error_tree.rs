// Validation error tree

use crate::value::Segment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Validation messages arranged in the shape of the validated data.
///
/// Object nodes carry `fields`, array nodes carry `elements`. Index `-1`
/// holds messages about an array element that does not exist.
///
/// ```
/// use sieve_core::{ErrorTree, Segment};
///
/// let mut tree = ErrorTree::new();
/// tree.add(
///     &[Segment::Key("arr".into()), Segment::Index(2)],
///     "validation.rules.integer.element",
/// );
/// assert_eq!(tree.message_count(), 1);
/// assert_eq!(
///     serde_json::to_value(&tree).unwrap(),
///     serde_json::json!({
///         "fields": { "arr": { "elements": { "2": {
///             "errors": ["validation.rules.integer.element"]
///         } } } }
///     })
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorTree {
    /// Messages about the node itself
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,

    /// Children of an object node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, ErrorTree>>,

    /// Children of an array node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<BTreeMap<i64, ErrorTree>>,
}

impl ErrorTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` at `path`, creating intermediate nodes as needed.
    pub fn add(&mut self, path: &[Segment], message: impl Into<String>) {
        self.node_mut(path).errors.push(message.into());
    }

    /// Node at `path`, created on demand.
    pub fn node_mut(&mut self, path: &[Segment]) -> &mut ErrorTree {
        path.iter().fold(self, |node, segment| match segment {
            Segment::Key(key) => node
                .fields
                .get_or_insert_with(BTreeMap::new)
                .entry(key.clone())
                .or_default(),
            Segment::Index(i) => node
                .elements
                .get_or_insert_with(BTreeMap::new)
                .entry(*i)
                .or_default(),
        })
    }

    /// Node at `path` if it exists.
    pub fn get(&self, path: &[Segment]) -> Option<&ErrorTree> {
        path.iter().try_fold(self, |node, segment| match segment {
            Segment::Key(key) => node.fields.as_ref()?.get(key),
            Segment::Index(i) => node.elements.as_ref()?.get(i),
        })
    }

    /// Convenience lookup of a field child.
    pub fn field(&self, name: &str) -> Option<&ErrorTree> {
        self.fields.as_ref()?.get(name)
    }

    /// Convenience lookup of an element child.
    pub fn element(&self, index: i64) -> Option<&ErrorTree> {
        self.elements.as_ref()?.get(&index)
    }

    /// True when no message exists anywhere in the tree.
    pub fn is_empty(&self) -> bool {
        self.message_count() == 0
    }

    /// Total number of messages in the tree.
    pub fn message_count(&self) -> usize {
        let fields = self
            .fields
            .iter()
            .flat_map(|f| f.values())
            .map(ErrorTree::message_count);
        let elements = self
            .elements
            .iter()
            .flat_map(|e| e.values())
            .map(ErrorTree::message_count);
        self.errors.len() + fields.chain(elements).sum::<usize>()
    }

    /// Merge another tree into this one, appending messages node by node.
    pub fn merge(&mut self, other: ErrorTree) {
        self.errors.extend(other.errors);
        if let Some(fields) = other.fields {
            let own = self.fields.get_or_insert_with(BTreeMap::new);
            for (name, child) in fields {
                own.entry(name).or_default().merge(child);
            }
        }
        if let Some(elements) = other.elements {
            let own = self.elements.get_or_insert_with(BTreeMap::new);
            for (index, child) in elements {
                own.entry(index).or_default().merge(child);
            }
        }
    }

    /// `None` when the tree holds no message.
    pub fn into_option(self) -> Option<Self> {
        (!self.is_empty()).then_some(self)
    }

    /// Convert to JSON representation
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    fn write_flat(&self, prefix: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for message in &self.errors {
            if prefix.is_empty() {
                writeln!(f, "{}", message)?;
            } else {
                writeln!(f, "{}: {}", prefix, message)?;
            }
        }
        for (name, child) in self.fields.iter().flatten() {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", prefix, name)
            };
            child.write_flat(&path, f)?;
        }
        for (index, child) in self.elements.iter().flatten() {
            child.write_flat(&format!("{}[{}]", prefix, index), f)?;
        }
        Ok(())
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_flat("", f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(k: &str) -> Segment {
        Segment::Key(k.to_string())
    }

    #[test]
    fn test_add_creates_intermediate_nodes() {
        let mut tree = ErrorTree::new();
        tree.add(&[key("user"), key("tags"), Segment::Index(-1)], "required");

        let user = tree.field("user").unwrap();
        assert!(user.errors.is_empty());
        assert!(user.elements.is_none());
        let missing = user.field("tags").and_then(|t| t.element(-1)).unwrap();
        assert_eq!(missing.errors, vec!["required".to_string()]);
    }

    #[test]
    fn test_add_appends_in_order() {
        let mut tree = ErrorTree::new();
        tree.add(&[key("name")], "first");
        tree.add(&[key("name")], "second");
        assert_eq!(
            tree.get(&[key("name")]).unwrap().errors,
            vec!["first".to_string(), "second".to_string()]
        );
    }

    #[test]
    fn test_root_messages() {
        let mut tree = ErrorTree::new();
        tree.add(&[], "malformed input");
        assert_eq!(tree.errors, vec!["malformed input".to_string()]);
        assert_eq!(tree.to_json(), json!({ "errors": ["malformed input"] }));
    }

    #[test]
    fn test_empty_detection() {
        let mut tree = ErrorTree::new();
        assert!(tree.is_empty());
        // Nodes without messages still count as empty
        tree.node_mut(&[key("a"), key("b")]);
        assert!(tree.is_empty());
        assert!(tree.clone().into_option().is_none());
        tree.add(&[key("a")], "x");
        assert!(!tree.is_empty());
    }

    #[test]
    fn test_json_shape() {
        let mut tree = ErrorTree::new();
        tree.add(&[key("items"), Segment::Index(-1), key("id")], "required");
        tree.add(&[key("items")], "array");
        assert_eq!(
            tree.to_json(),
            json!({
                "fields": {
                    "items": {
                        "errors": ["array"],
                        "elements": {
                            "-1": { "fields": { "id": { "errors": ["required"] } } }
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_merge() {
        let mut a = ErrorTree::new();
        a.add(&[key("x")], "one");
        let mut b = ErrorTree::new();
        b.add(&[key("x")], "two");
        b.add(&[key("y"), Segment::Index(0)], "three");
        a.merge(b);
        assert_eq!(a.message_count(), 3);
        assert_eq!(a.field("x").unwrap().errors.len(), 2);
    }

    #[test]
    fn test_display_flattens() {
        let mut tree = ErrorTree::new();
        tree.add(&[key("arr"), Segment::Index(2)], "integer");
        tree.add(&[key("name")], "string");
        assert_eq!(tree.to_string(), "arr[2]: integer\nname: string\n");
    }
}
