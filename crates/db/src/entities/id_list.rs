//! Ordered list of document IDs stored as a JSONB array.

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// A JSONB array of IDs with set-like helpers.
///
/// Insertion order is preserved; [`IdList::insert`] refuses duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct IdList(pub Vec<String>);

impl IdList {
    /// Create an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Whether `id` is present.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|x| x == id)
    }

    /// Append `id` unless present. Returns whether it was added.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        self.0.push(id.to_string());
        true
    }

    /// Remove every occurrence of `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|x| x != id);
        self.0.len() != before
    }

    /// Number of IDs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the IDs.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for IdList {
    fn from(ids: Vec<String>) -> Self {
        let mut list = Self::new();
        for id in &ids {
            list.insert(id);
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_unique() {
        let mut list = IdList::new();
        assert!(list.insert("a"));
        assert!(!list.insert("a"));
        assert!(list.insert("b"));
        assert_eq!(list.as_slice(), ["a", "b"]);
    }

    #[test]
    fn test_remove() {
        let mut list = IdList::from(vec!["a".to_string(), "b".to_string()]);
        assert!(list.remove("a"));
        assert!(!list.remove("a"));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_from_vec_dedups() {
        let list = IdList::from(vec!["a".to_string(), "a".to_string()]);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let list = IdList::from(vec!["a".to_string()]);
        assert_eq!(serde_json::to_string(&list).ok().as_deref(), Some(r#"["a"]"#));
    }
}
