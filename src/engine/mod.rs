//! RDN migration engine orchestrator.
//!
//! [`MigrationEngine`] exposes the two entry points of this subsystem:
//! advisory impact analysis ([`MigrationEngine::check_rdn_change`]) and the
//! actual data movement ([`MigrationEngine::migrate_entries`]). Both share
//! the directory-wide container discovery below and the DN utilities.
//!
//! The two entry points deliberately carry different error-handling
//! policies: analysis is lenient (every failure degrades to a warning, a
//! report is always produced), execution is strict at discovery (a bad RDN
//! or a failed discovery search aborts the batch) and isolating per entry
//! afterwards.

mod check;
mod migrate;
mod relocate;

use std::sync::Arc;

use crate::config::MigrationConfig;
use crate::directory::{DirectoryClient, Entry, Filter, SearchScope};
use crate::error::DirectoryResult;

/// Object classes that mark an entry as a container.
const CONTAINER_CLASSES: [&str; 2] = ["organizationalUnit", "container"];

/// Stateless orchestrator for RDN migrations.
///
/// Holds no directory data itself: every analysis or execution call
/// discovers afresh, so re-running a partially failed migration retries
/// exactly the entries still in place under the old RDN.
pub struct MigrationEngine<D> {
    directory: Arc<D>,
    config: MigrationConfig,
}

impl<D: DirectoryClient> MigrationEngine<D> {
    /// Create an engine with default configuration.
    pub fn new(directory: Arc<D>) -> Self {
        Self {
            directory,
            config: MigrationConfig::default(),
        }
    }

    /// Create an engine with explicit configuration.
    pub fn with_config(directory: Arc<D>, config: MigrationConfig) -> Self {
        Self { directory, config }
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    pub(crate) fn directory(&self) -> &D {
        &self.directory
    }

    /// Filter matching containers whose RDN is `attribute=value`, anywhere.
    fn container_filter(attribute: &str, value: &str) -> Filter {
        Filter::and(vec![
            Filter::or(
                CONTAINER_CLASSES
                    .iter()
                    .map(|class| Filter::eq("objectClass", *class))
                    .collect(),
            ),
            Filter::eq(attribute, value),
        ])
    }

    /// Filter for the entries to migrate beneath a container.
    fn entry_filter(object_class: Option<&str>) -> Filter {
        match object_class {
            Some(class) => Filter::eq("objectClass", class),
            None => Filter::present("objectClass"),
        }
    }

    /// Discover every container matching `attribute=value` under `base_dn`,
    /// at any depth and under any parent lineage.
    async fn discover_containers(
        &self,
        base_dn: &str,
        attribute: &str,
        value: &str,
    ) -> DirectoryResult<Vec<Entry>> {
        self.directory
            .search(
                base_dn,
                &Self::container_filter(attribute, value),
                &["objectClass"],
                SearchScope::Subtree,
            )
            .await
    }

    /// All entries beneath `container_dn` matching `filter`, excluding the
    /// container's own entry.
    async fn entries_under(
        &self,
        container_dn: &str,
        filter: &Filter,
    ) -> DirectoryResult<Vec<Entry>> {
        let entries = self
            .directory
            .search(container_dn, filter, &["objectClass"], SearchScope::Subtree)
            .await?;

        Ok(entries
            .into_iter()
            .filter(|entry| !entry.dn().eq_ignore_ascii_case(container_dn))
            .collect())
    }
}
