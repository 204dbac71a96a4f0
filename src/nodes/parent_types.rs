//! Parent-type forest and connection queries
//!
//! Each known type points at the root of the first supertype chain it was
//! found to belong to among the registered nodes' types. Types without a
//! recorded parent are roots; the editor uses them as socket types. Whether
//! two ports may connect is a subtype question answered by
//! [`NodeRegistry::can_connect`](super::NodeRegistry::can_connect), since the
//! forest does not keep intermediate supertypes.

use indexmap::IndexMap;
use serde::Serialize;

/// Flat forest encoding: type string to parent type string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParentTypes {
    parents: IndexMap<String, String>,
}

impl ParentTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded parent of `type_name`
    pub fn get(&self, type_name: &str) -> Option<&str> {
        self.parents.get(type_name).map(String::as_str)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.parents.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Edges in discovery order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parents.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Follow the chain from `type_name` to its root
    ///
    /// A type with no recorded parent is its own root.
    pub fn root_of<'a>(&'a self, type_name: &'a str) -> &'a str {
        self.chain(type_name).last().unwrap_or(type_name)
    }

    /// `type_name` followed by each of its ancestors
    pub fn chain<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let limit = self.parents.len() + 1;
        std::iter::successors(Some(type_name), move |current| self.get(current)).take(limit)
    }

    /// Record `parent` as the parent of `child`, replacing any earlier edge
    pub(crate) fn insert(&mut self, child: String, parent: String) {
        self.parents.insert(child, parent);
    }

    pub fn into_inner(self) -> IndexMap<String, String> {
        self.parents
    }
}

impl<'a> IntoIterator for &'a ParentTypes {
    type Item = (&'a String, &'a String);
    type IntoIter = indexmap::map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.parents.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest(edges: &[(&str, &str)]) -> ParentTypes {
        let mut parents = ParentTypes::new();
        for (child, parent) in edges {
            parents.insert(child.to_string(), parent.to_string());
        }
        parents
    }

    #[test]
    fn test_root_of_follows_chain() {
        let parents = forest(&[("bool", "int"), ("int", "float")]);
        assert_eq!(parents.root_of("bool"), "float");
        assert_eq!(parents.root_of("float"), "float");
        assert_eq!(parents.root_of("str"), "str");
    }

    #[test]
    fn test_chain_lists_ancestors() {
        let parents = forest(&[("bool", "int"), ("int", "float")]);
        assert_eq!(parents.chain("bool").collect::<Vec<_>>(), vec!["bool", "int", "float"]);
        assert_eq!(parents.chain("str").collect::<Vec<_>>(), vec!["str"]);
    }

    #[test]
    fn test_chain_is_bounded() {
        let parents = forest(&[("a", "b"), ("b", "a")]);
        assert_eq!(parents.chain("a").count(), 3);
    }

    #[test]
    fn test_serializes_flat_object() {
        let parents = forest(&[("bool", "int")]);
        assert_eq!(serde_json::to_string(&parents).unwrap(), r#"{"bool":"int"}"#);
    }
}
