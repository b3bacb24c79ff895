//! Entry relocation strategies.
//!
//! Both strategies compute the target DN with
//! [`dn::rewrite_rdn_segment`]; a DN that cannot be rewritten is a hard
//! failure for that single entry. Native rename delegates to the client's
//! ModRDN when the client is actually wired for it and falls back to
//! copy-then-delete transparently otherwise, so an optimistic capability
//! flag can never lose data.

use std::collections::HashMap;

use tracing::debug;

use super::MigrationEngine;
use crate::directory::{DirectoryClient, Entry};
use crate::dn;
use crate::error::{DirectoryError, MigrationError};
use crate::report::MigrationMode;

/// Server-computed attributes that must never be copied to a new entry.
const OPERATIONAL_ATTRIBUTES: [&str; 12] = [
    "createtimestamp",
    "modifytimestamp",
    "creatorsname",
    "modifiersname",
    "entryuuid",
    "entrycsn",
    "contextcsn",
    "entrydn",
    "structuralobjectclass",
    "subschemasubentry",
    "hassubordinates",
    "dn",
];

impl<D: DirectoryClient> MigrationEngine<D> {
    /// Move one entry from `entry_dn` to its location under the new RDN.
    pub(crate) async fn relocate_entry(
        &self,
        mode: MigrationMode,
        entry_dn: &str,
        old_rdn: &str,
        new_rdn: &str,
    ) -> Result<(), MigrationError> {
        let new_dn = dn::rewrite_rdn_segment(entry_dn, old_rdn, new_rdn)?;

        match mode {
            MigrationMode::NativeRename if self.directory().supports_native_rename() => {
                debug!(dn = %entry_dn, new_dn = %new_dn, "relocating entry via native rename");
                self.directory().rename(entry_dn, &new_dn).await?;
                Ok(())
            }
            _ => self.copy_then_delete(entry_dn, &new_dn).await,
        }
    }

    /// Re-create the entry under `new_dn`, then delete the original.
    ///
    /// The delete runs only after the create succeeded, so a failed create
    /// leaves the old entry untouched. If the delete itself fails the entry
    /// exists at both DNs; the failure carries the old DN so a retry can
    /// resolve it.
    async fn copy_then_delete(&self, old_dn: &str, new_dn: &str) -> Result<(), MigrationError> {
        debug!(dn = %old_dn, new_dn = %new_dn, "relocating entry via copy-then-delete");

        let entry = self
            .directory()
            .get_by_dn(old_dn, &["*"])
            .await?
            .ok_or_else(|| DirectoryError::not_found(old_dn))?;

        let (object_classes, attributes) = partition_attributes(&entry);

        self.directory().add(new_dn, &object_classes, &attributes).await?;
        self.directory().delete(old_dn).await?;
        Ok(())
    }
}

/// Split an entry's attributes for re-creation under a new DN: object
/// classes captured separately, operational attributes and the entry's own
/// naming attribute dropped.
fn partition_attributes(entry: &Entry) -> (Vec<String>, HashMap<String, Vec<String>>) {
    let naming_attribute = dn::split_rdn(dn::leading_rdn(entry.dn()))
        .map(|(attribute, _)| attribute.to_ascii_lowercase())
        .unwrap_or_default();

    let object_classes = entry.object_classes();

    let attributes = entry
        .attributes()
        .iter()
        .filter(|(name, _)| {
            let lower = name.to_ascii_lowercase();
            lower != "objectclass"
                && lower != naming_attribute
                && !OPERATIONAL_ATTRIBUTES.contains(&lower.as_str())
        })
        .map(|(name, values)| (name.clone(), values.clone()))
        .collect();

    (object_classes, attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_strips_operational_and_naming_attributes() {
        let entry = Entry::new("uid=alice,ou=people,dc=example,dc=com")
            .with_attribute("objectClass", ["top", "inetOrgPerson"])
            .with_attribute("uid", ["alice"])
            .with_attribute("cn", ["Alice Doe"])
            .with_attribute("mail", ["alice@example.com"])
            .with_attribute("entryUUID", ["0c5b..."])
            .with_attribute("createTimestamp", ["20200101000000Z"])
            .with_attribute("hasSubordinates", ["FALSE"]);

        let (object_classes, attributes) = partition_attributes(&entry);

        assert_eq!(
            object_classes,
            vec!["top".to_string(), "inetOrgPerson".to_string()]
        );
        assert!(attributes.contains_key("cn"));
        assert!(attributes.contains_key("mail"));
        assert!(!attributes.contains_key("uid"));
        assert!(!attributes.contains_key("entryUUID"));
        assert!(!attributes.contains_key("createTimestamp"));
        assert!(!attributes.contains_key("hasSubordinates"));
        assert!(!attributes.contains_key("objectClass"));
    }

    #[test]
    fn test_partition_keeps_plain_attributes_of_container() {
        let entry = Entry::new("ou=people,dc=example,dc=com")
            .with_attribute("objectClass", ["top", "organizationalUnit"])
            .with_attribute("ou", ["people"])
            .with_attribute("description", ["Staff container"]);

        let (object_classes, attributes) = partition_attributes(&entry);

        assert_eq!(object_classes.len(), 2);
        assert!(!attributes.contains_key("ou"));
        assert_eq!(
            attributes.get("description"),
            Some(&vec!["Staff container".to_string()])
        );
    }
}
