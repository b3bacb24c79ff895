//! Directory client contract.
//!
//! The engine never talks a wire protocol itself; it consumes this trait.
//! Entries cross the boundary as a single uniform [`Entry`] value (DN plus a
//! multi-valued attribute map) so no component downstream ever has to sniff
//! the shape of what a client returned. Filters are a typed tree rendered to
//! protocol syntax only inside an adapter, which keeps value escaping at one
//! seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::DirectoryResult;

/// Search scope relative to the base DN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// The base entry only.
    Base,
    /// Direct children of the base entry.
    OneLevel,
    /// The base entry and all descendants at any depth.
    Subtree,
}

/// Typed search filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// All nested filters must match.
    And { filters: Vec<Filter> },
    /// At least one nested filter must match.
    Or { filters: Vec<Filter> },
    /// Attribute equals value.
    Equals { attribute: String, value: String },
    /// Attribute is present with any value.
    Present { attribute: String },
}

impl Filter {
    /// Create an AND filter.
    #[must_use]
    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And { filters }
    }

    /// Create an OR filter.
    #[must_use]
    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or { filters }
    }

    /// Create an equality filter.
    pub fn eq(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a presence filter.
    pub fn present(attribute: impl Into<String>) -> Self {
        Filter::Present {
            attribute: attribute.into(),
        }
    }
}

/// A directory entry: its DN and multi-valued attributes.
///
/// Attribute lookup is case-insensitive, matching directory semantics
/// (RFC 4512); the stored attribute names keep their original casing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    dn: String,
    attributes: HashMap<String, Vec<String>>,
}

impl Entry {
    /// Create an entry with no attributes.
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
        }
    }

    /// Create an entry from a DN and a prepared attribute map.
    #[must_use]
    pub fn from_parts(dn: String, attributes: HashMap<String, Vec<String>>) -> Self {
        Self { dn, attributes }
    }

    /// Add an attribute (builder style).
    #[must_use]
    pub fn with_attribute<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.attributes
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// The entry's distinguished name.
    #[must_use]
    pub fn dn(&self) -> &str {
        &self.dn
    }

    /// All attributes of the entry.
    #[must_use]
    pub fn attributes(&self) -> &HashMap<String, Vec<String>> {
        &self.attributes
    }

    /// All values of an attribute, looked up case-insensitively.
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&Vec<String>> {
        self.attributes
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
            .map(|(_, values)| values)
    }

    /// First value of an attribute, looked up case-insensitively.
    #[must_use]
    pub fn first(&self, attribute: &str) -> Option<&str> {
        self.get(attribute)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// The entry's object classes.
    #[must_use]
    pub fn object_classes(&self) -> Vec<String> {
        self.get("objectClass").cloned().unwrap_or_default()
    }
}

/// Contract the migration engine requires from a directory store.
///
/// `rename` and [`DirectoryClient::supports_native_rename`] expose the
/// server's ModRDN capability; a client that cannot rename reports `false`
/// and the relocation strategy falls back to copy-then-delete transparently.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Search under `base` for entries matching `filter`.
    ///
    /// Fails with [`DirectoryError::NotFound`](crate::error::DirectoryError)
    /// when the base itself does not exist.
    async fn search(
        &self,
        base: &str,
        filter: &Filter,
        attributes: &[&str],
        scope: SearchScope,
    ) -> DirectoryResult<Vec<Entry>>;

    /// Fetch a single entry by DN. Returns `Ok(None)` when it does not exist.
    async fn get_by_dn(&self, dn: &str, attributes: &[&str]) -> DirectoryResult<Option<Entry>>;

    /// Create an entry at `dn` with the given object classes and attributes.
    async fn add(
        &self,
        dn: &str,
        object_classes: &[String],
        attributes: &HashMap<String, Vec<String>>,
    ) -> DirectoryResult<()>;

    /// Delete the entry at `dn`.
    async fn delete(&self, dn: &str) -> DirectoryResult<()>;

    /// Atomically rename/move the entry at `dn` to `new_dn` (ModRDN).
    async fn rename(&self, dn: &str, new_dn: &str) -> DirectoryResult<()>;

    /// Whether this client is wired to a native rename primitive.
    fn supports_native_rename(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_builder() {
        let entry = Entry::new("uid=alice,ou=people,dc=example,dc=com")
            .with_attribute("objectClass", ["top", "inetOrgPerson"])
            .with_attribute("uid", ["alice"]);

        assert_eq!(entry.dn(), "uid=alice,ou=people,dc=example,dc=com");
        assert_eq!(entry.first("uid"), Some("alice"));
        assert_eq!(
            entry.object_classes(),
            vec!["top".to_string(), "inetOrgPerson".to_string()]
        );
    }

    #[test]
    fn test_entry_case_insensitive_lookup() {
        let entry = Entry::new("cn=x").with_attribute("objectClass", ["organizationalUnit"]);
        assert_eq!(entry.first("OBJECTCLASS"), Some("organizationalUnit"));
        assert_eq!(entry.first("objectclass"), Some("organizationalUnit"));
        assert!(entry.first("ou").is_none());
    }

    #[test]
    fn test_filter_constructors() {
        let filter = Filter::and(vec![
            Filter::or(vec![
                Filter::eq("objectClass", "organizationalUnit"),
                Filter::eq("objectClass", "container"),
            ]),
            Filter::eq("ou", "people"),
        ]);

        if let Filter::And { filters } = &filter {
            assert_eq!(filters.len(), 2);
        } else {
            panic!("expected And variant");
        }
    }
}
