//! Migration execution: the actual data movement.

use std::collections::HashMap;

use tracing::{debug, info, instrument, warn};

use super::MigrationEngine;
use crate::directory::DirectoryClient;
use crate::dn;
use crate::error::MigrationError;
use crate::report::{FailedEntry, MigrationMode, MigrationResult};

impl<D: DirectoryClient> MigrationEngine<D> {
    /// Migrate every entry under every `old_rdn` container beneath `base_dn`
    /// to the corresponding `new_rdn` location.
    ///
    /// Strict at discovery: an unparseable `old_rdn` or an operational
    /// failure of the container discovery aborts the whole call, because
    /// without a valid pattern or the true scope no safe migration is
    /// possible. Past discovery, failures are isolated: a container that
    /// cannot be prepared is skipped with a warning, and a single failing
    /// entry is recorded in `failed_entries` without stopping the rest of
    /// the batch.
    ///
    /// When matching containers are nested inside each other, each entry is
    /// attributed to its innermost matching container and relocated exactly
    /// once; a nested container's own entry is never treated as a plain
    /// entry of its parent.
    #[instrument(skip(self))]
    pub async fn migrate_entries(
        &self,
        old_rdn: &str,
        new_rdn: &str,
        base_dn: &str,
        mode: Option<MigrationMode>,
        object_class_filter: Option<&str>,
        create_container: bool,
    ) -> MigrationResult {
        let mode = mode.unwrap_or_else(|| {
            if self.config().supports_native_rename() {
                MigrationMode::NativeRename
            } else {
                MigrationMode::CopyThenDelete
            }
        });

        if mode == MigrationMode::LeaveOrphaned {
            warn!(
                old_rdn = %old_rdn,
                new_rdn = %new_rdn,
                "leave_orphaned selected: entries under the old RDN will not be moved"
            );
            return MigrationResult::noop(
                mode,
                format!(
                    "leave_orphaned selected: entries under '{old_rdn}' were not moved and \
                     remain reachable only at their old location"
                ),
            );
        }

        let (attribute, value) = match dn::split_rdn(old_rdn) {
            Ok(parts) => parts,
            Err(e) => {
                return MigrationResult::aborted(mode, format!("cannot migrate: {e}"));
            }
        };

        let containers = match self.discover_containers(base_dn, attribute, value).await {
            Ok(containers) => containers,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => {
                warn!(error = %e, "container discovery failed; aborting migration");
                return MigrationResult::aborted(
                    mode,
                    format!("container discovery under '{base_dn}' failed: {e}"),
                );
            }
        };

        if containers.is_empty() {
            return MigrationResult::noop(
                mode,
                format!(
                    "no containers matching '{old_rdn}' found under '{base_dn}'; \
                     nothing to migrate"
                ),
            );
        }

        let filter = Self::entry_filter(object_class_filter);
        let container_dns: Vec<String> = containers
            .iter()
            .map(|container| container.dn().to_ascii_lowercase())
            .collect();
        let mut warnings: Vec<String> = Vec::new();
        let mut failed_entries: Vec<FailedEntry> = Vec::new();
        let mut entries_migrated = 0usize;

        for container in &containers {
            let new_container_dn =
                match dn::rewrite_rdn_segment(container.dn(), old_rdn, new_rdn) {
                    Ok(dn) => dn,
                    Err(e) => {
                        warnings.push(format!(
                            "cannot compute new DN for container '{}': {e}; skipping it",
                            container.dn()
                        ));
                        continue;
                    }
                };

            if create_container {
                if let Err(e) = self.ensure_container(&new_container_dn).await {
                    warnings.push(format!(
                        "failed to create container '{new_container_dn}': {e}; \
                         skipping entries under '{}'",
                        container.dn()
                    ));
                    continue;
                }
            }

            let entries = match self.entries_under(container.dn(), &filter).await {
                Ok(entries) => entries,
                Err(e) if e.is_not_found() => continue,
                Err(e) => {
                    warnings.push(format!(
                        "search beneath '{}' failed: {e}; skipping this container",
                        container.dn()
                    ));
                    continue;
                }
            };

            for entry in &entries {
                if owned_by_nested_container(entry.dn(), container.dn(), &container_dns) {
                    debug!(
                        dn = %entry.dn(),
                        container = %container.dn(),
                        "entry belongs to a nested matching container; deferring"
                    );
                    continue;
                }
                match self.relocate_entry(mode, entry.dn(), old_rdn, new_rdn).await {
                    Ok(()) => entries_migrated += 1,
                    Err(e) => {
                        warn!(dn = %entry.dn(), error = %e, "entry migration failed");
                        failed_entries.push(FailedEntry {
                            dn: entry.dn().to_string(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        let entries_failed = failed_entries.len();
        info!(
            entries_migrated,
            entries_failed,
            containers = containers.len(),
            mode = %mode,
            "RDN migration complete"
        );

        MigrationResult {
            success: failed_entries.is_empty(),
            mode,
            entries_migrated,
            entries_failed,
            failed_entries,
            warnings,
        }
    }

    /// Make sure a container exists at `dn`, creating it if absent.
    ///
    /// The container's object class is derived from its own naming
    /// attribute; an attribute with no known container convention is a hard
    /// failure for this call.
    pub(crate) async fn ensure_container(&self, dn: &str) -> Result<(), MigrationError> {
        if self
            .directory()
            .get_by_dn(dn, &["objectClass"])
            .await?
            .is_some()
        {
            debug!(dn = %dn, "container already exists");
            return Ok(());
        }

        let (attribute, value) = dn::split_rdn(dn::leading_rdn(dn))?;
        let object_classes: Vec<String> = match attribute.to_ascii_lowercase().as_str() {
            "ou" => vec!["top", "organizationalUnit"],
            "cn" => vec!["top", "container"],
            "o" => vec!["top", "organization"],
            _ => {
                return Err(MigrationError::UnknownNamingAttribute {
                    attribute: attribute.to_string(),
                })
            }
        }
        .into_iter()
        .map(String::from)
        .collect();

        let mut attributes = HashMap::new();
        attributes.insert(attribute.to_string(), vec![value.to_string()]);

        self.directory().add(dn, &object_classes, &attributes).await?;
        info!(dn = %dn, "container created");
        Ok(())
    }
}

/// True when `entry_dn` belongs to a matching container nested strictly
/// inside `container_dn`. The innermost matching container owns the entry,
/// so an outer container's subtree pass leaves it alone.
fn owned_by_nested_container(entry_dn: &str, container_dn: &str, container_dns: &[String]) -> bool {
    let entry = entry_dn.to_ascii_lowercase();
    let container = container_dn.to_ascii_lowercase();
    container_dns.iter().any(|other| {
        *other != container
            && other.ends_with(&format!(",{container}"))
            && (entry == *other || entry.ends_with(&format!(",{other}")))
    })
}
